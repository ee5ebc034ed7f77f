//! DOM controller: owns the state machine, the audio element, and the
//! event wiring. Everything here is thin glue; the transitions live in
//! [`crate::state`].

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, EventTarget, HtmlAudioElement, HtmlInputElement};

use crate::api;
use crate::state::{Action, Effect, PlayerState};

/// Element handles grabbed once at mount.
struct Dom {
    document: Document,
    song_list: Element,
    song_title: Element,
    play_pause: Element,
    prev: Element,
    next: Element,
    shuffle: Element,
    loop_btn: Element,
    banner: Element,
    search: HtmlInputElement,
    file_input: HtmlInputElement,
    upload_btn: Element,
    audio: HtmlAudioElement,
}

/// The player application.
pub struct App {
    state: PlayerState,
    rng: SmallRng,
    dom: Dom,
}

fn element(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

fn cast<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    element(document, id)?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has unexpected type")))
}

impl App {
    /// Grab the page elements and wire the event handlers.
    pub fn mount() -> Result<Rc<RefCell<App>>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let dom = Dom {
            song_list: element(&document, "songList")?,
            song_title: element(&document, "songTitle")?,
            play_pause: element(&document, "playPauseBtn")?,
            prev: element(&document, "prevBtn")?,
            next: element(&document, "nextBtn")?,
            shuffle: element(&document, "shuffleBtn")?,
            loop_btn: element(&document, "loopBtn")?,
            banner: element(&document, "errorBanner")?,
            search: cast::<HtmlInputElement>(&document, "searchInput")?,
            file_input: cast::<HtmlInputElement>(&document, "fileInput")?,
            upload_btn: element(&document, "uploadBtn")?,
            audio: cast::<HtmlAudioElement>(&document, "audioPlayer")?,
            document,
        };

        let app = Rc::new(RefCell::new(App {
            state: PlayerState::new(),
            rng: SmallRng::from_entropy(),
            dom,
        }));

        wire_events(&app)?;
        app.borrow().render();
        Ok(app)
    }

    /// Redraw the list, controls, and title from the current state.
    fn render(&self) {
        self.clear_error();
        self.render_list();

        self.dom
            .play_pause
            .set_text_content(Some(if self.state.playing { "⏸" } else { "⏵" }));
        let _ = self
            .dom
            .shuffle
            .class_list()
            .toggle_with_force("active", self.state.shuffling);
        let _ = self
            .dom
            .loop_btn
            .class_list()
            .toggle_with_force("active", self.state.looping);

        if self.state.current.is_none() {
            self.dom.song_title.set_text_content(Some("Nothing playing"));
        }
    }

    fn render_list(&self) {
        let list = &self.dom.song_list;
        list.set_inner_html("");

        if self.state.filtered.is_empty() {
            if let Ok(li) = self.dom.document.create_element("li") {
                li.set_text_content(Some("Not found"));
                li.set_class_name("placeholder");
                let _ = list.append_child(&li);
            }
            return;
        }

        for (index, song) in self.state.filtered.iter().enumerate() {
            let Ok(li) = self.dom.document.create_element("li") else {
                continue;
            };
            li.set_text_content(Some(song));
            li.set_class_name(if self.state.current == Some(index) {
                "song-item selected"
            } else {
                "song-item"
            });
            let _ = li.set_attribute("data-index", &index.to_string());
            let _ = list.append_child(&li);
        }
    }

    fn show_error(&self, message: &str) {
        self.dom.banner.set_text_content(Some(message));
        let _ = self.dom.banner.class_list().toggle_with_force("hidden", false);
    }

    fn clear_error(&self) {
        let _ = self.dom.banner.class_list().toggle_with_force("hidden", true);
    }
}

/// Apply an action to the state, re-render, then carry out the effects.
pub fn dispatch(app: &Rc<RefCell<App>>, action: Action) {
    let effects = {
        let mut inner = app.borrow_mut();
        let App { state, rng, .. } = &mut *inner;
        let effects = state.apply(action, rng);
        inner.render();
        effects
    };

    for effect in effects {
        perform(app, effect);
    }
}

fn perform(app: &Rc<RefCell<App>>, effect: Effect) {
    match effect {
        Effect::SetSource { filename } => {
            let inner = app.borrow();
            inner.dom.audio.set_src(&api::song_url(&filename));
            inner.dom.song_title.set_text_content(Some(&filename));
        }
        Effect::Play => {
            let _ = app.borrow().dom.audio.play();
        }
        Effect::Pause => {
            let _ = app.borrow().dom.audio.pause();
        }
        Effect::SetLoop(looping) => {
            app.borrow().dom.audio.set_loop(looping);
        }
        Effect::FetchLibrary { seq } => {
            let app = Rc::clone(app);
            spawn_local(async move {
                match api::fetch_songs().await {
                    Ok(songs) => dispatch(&app, Action::LibraryLoaded { seq, songs }),
                    Err(message) => {
                        tracing::error!(%message, "Failed to fetch songs");
                        app.borrow().show_error(&message);
                    }
                }
            });
        }
    }
}

fn on_click(app: &Rc<RefCell<App>>, target: &EventTarget, action: Action) -> Result<(), JsValue> {
    let app = Rc::clone(app);
    let closure = Closure::<dyn FnMut()>::new(move || dispatch(&app, action.clone()));
    target.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn wire_events(app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let (play_pause, prev, next, shuffle, loop_btn, search, song_list, upload_btn, audio) = {
        let inner = app.borrow();
        (
            inner.dom.play_pause.clone(),
            inner.dom.prev.clone(),
            inner.dom.next.clone(),
            inner.dom.shuffle.clone(),
            inner.dom.loop_btn.clone(),
            inner.dom.search.clone(),
            inner.dom.song_list.clone(),
            inner.dom.upload_btn.clone(),
            inner.dom.audio.clone(),
        )
    };

    on_click(app, &play_pause, Action::TogglePlayPause)?;
    on_click(app, &prev, Action::Previous)?;
    on_click(app, &next, Action::Next)?;
    on_click(app, &shuffle, Action::ToggleShuffle)?;
    on_click(app, &loop_btn, Action::ToggleLoop)?;

    // Search box: refilter on every input event.
    {
        let app = Rc::clone(app);
        let closure = Closure::<dyn FnMut()>::new(move || {
            let query = app.borrow().dom.search.value();
            dispatch(&app, Action::Search(query));
        });
        search.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Song list: one delegated click handler; rows carry their index.
    {
        let app = Rc::clone(app);
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(target) = event.target() else { return };
            let Ok(element) = target.dyn_into::<Element>() else { return };
            let Some(index) = element
                .get_attribute("data-index")
                .and_then(|v| v.parse().ok())
            else {
                return;
            };
            dispatch(&app, Action::Play(index));
        });
        song_list.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // End-of-track auto-advance.
    {
        let app = Rc::clone(app);
        let closure = Closure::<dyn FnMut()>::new(move || dispatch(&app, Action::TrackEnded));
        audio.add_event_listener_with_callback("ended", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Upload: read the chosen file, post it, refetch the listing on success.
    {
        let app = Rc::clone(app);
        let closure = Closure::<dyn FnMut()>::new(move || {
            let file = app
                .borrow()
                .dom
                .file_input
                .files()
                .and_then(|files| files.get(0));
            let Some(file) = file else {
                app.borrow().show_error("Choose a file first");
                return;
            };

            let app = Rc::clone(&app);
            spawn_local(async move {
                match read_file(&file).await {
                    Ok(bytes) => {
                        match api::upload_song(&file.name(), &file.type_(), bytes).await {
                            Ok(()) => {
                                app.borrow().dom.file_input.set_value("");
                                dispatch(&app, Action::RefreshLibrary);
                            }
                            Err(message) => {
                                tracing::error!(%message, "Upload failed");
                                app.borrow().show_error(&message);
                            }
                        }
                    }
                    Err(message) => app.borrow().show_error(&message),
                }
            });
        });
        upload_btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

async fn read_file(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| "Failed to read the chosen file".to_string())?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
