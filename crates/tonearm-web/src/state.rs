//! Player state and command dispatch.
//!
//! All playlist navigation lives here as pure transitions over a single
//! [`PlayerState`] value: every user gesture becomes an [`Action`], and
//! applying an action yields the [`Effect`]s the controller must perform on
//! the audio element or the network. Nothing in this module touches the DOM,
//! so the whole state machine is testable natively.

use rand::Rng;

/// A user gesture or async completion, dispatched against the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Request a fresh library listing (startup and after upload).
    RefreshLibrary,
    /// A listing response arrived, tagged with its request sequence number.
    LibraryLoaded { seq: u64, songs: Vec<String> },
    /// Search text changed.
    Search(String),
    /// A list row was clicked.
    Play(usize),
    TogglePlayPause,
    Next,
    Previous,
    /// The audio element reached end-of-track.
    TrackEnded,
    ToggleShuffle,
    ToggleLoop,
}

/// Side effect the controller must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Point the audio element at a song and update the title display.
    SetSource { filename: String },
    Play,
    Pause,
    SetLoop(bool),
    /// Issue a `GET /songs`, tagged so stale responses can be dropped.
    FetchLibrary { seq: u64 },
}

/// The whole client-side player state.
///
/// `current` indexes `filtered` and is only meaningful while `filtered` is
/// non-empty; a refetch or a search change may shift or clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub all_songs: Vec<String>,
    pub filtered: Vec<String>,
    pub query: String,
    pub current: Option<usize>,
    pub playing: bool,
    pub shuffling: bool,
    pub looping: bool,
    issued_seq: u64,
    applied_seq: u64,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action, returning the effects to perform.
    ///
    /// Randomness is injected so shuffle transitions stay deterministic under
    /// test.
    pub fn apply<R: Rng>(&mut self, action: Action, rng: &mut R) -> Vec<Effect> {
        match action {
            Action::RefreshLibrary => {
                self.issued_seq += 1;
                vec![Effect::FetchLibrary {
                    seq: self.issued_seq,
                }]
            }
            Action::LibraryLoaded { seq, songs } => {
                // Guard against a stale in-flight response overwriting a
                // newer listing.
                if seq <= self.applied_seq {
                    tracing::debug!(seq, applied = self.applied_seq, "Discarded stale listing");
                    return Vec::new();
                }
                self.applied_seq = seq;
                self.all_songs = songs;
                self.refilter();
                Vec::new()
            }
            Action::Search(query) => {
                self.query = query;
                self.refilter();
                Vec::new()
            }
            Action::Play(index) => self.play(index),
            Action::TogglePlayPause => {
                if self.current.is_none() {
                    return Vec::new();
                }
                self.playing = !self.playing;
                if self.playing {
                    vec![Effect::Play]
                } else {
                    vec![Effect::Pause]
                }
            }
            Action::Previous => {
                let len = self.filtered.len();
                if len == 0 {
                    return Vec::new();
                }
                let index = match self.current {
                    Some(i) if i > 0 => i - 1,
                    _ => len - 1,
                };
                self.play(index)
            }
            Action::Next => {
                let len = self.filtered.len();
                if len == 0 {
                    return Vec::new();
                }
                let index = if self.shuffling {
                    rng.gen_range(0..len)
                } else {
                    match self.current {
                        Some(i) => (i + 1) % len,
                        None => 0,
                    }
                };
                self.play(index)
            }
            Action::TrackEnded => {
                // With loop on the element repeats natively and this event
                // never fires; treat it as a no-op either way.
                if self.looping {
                    return Vec::new();
                }
                self.apply(Action::Next, rng)
            }
            Action::ToggleShuffle => {
                self.shuffling = !self.shuffling;
                Vec::new()
            }
            Action::ToggleLoop => {
                self.looping = !self.looping;
                vec![Effect::SetLoop(self.looping)]
            }
        }
    }

    fn play(&mut self, index: usize) -> Vec<Effect> {
        let Some(filename) = self.filtered.get(index).cloned() else {
            return Vec::new();
        };
        self.current = Some(index);
        self.playing = true;
        vec![Effect::SetSource { filename }, Effect::Play]
    }

    /// Recompute `filtered` from `all_songs` and the current query.
    ///
    /// Case-insensitive substring match, original order preserved. `current`
    /// is cleared when it no longer points inside the filtered list.
    fn refilter(&mut self) {
        let query = self.query.to_lowercase();
        self.filtered = self
            .all_songs
            .iter()
            .filter(|song| song.to_lowercase().contains(&query))
            .cloned()
            .collect();

        match self.current {
            Some(i) if i < self.filtered.len() => {}
            _ => self.current = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn loaded(songs: &[&str]) -> PlayerState {
        let mut state = PlayerState::new();
        state.apply(Action::RefreshLibrary, &mut rng());
        state.apply(
            Action::LibraryLoaded {
                seq: 1,
                songs: songs.iter().map(|s| s.to_string()).collect(),
            },
            &mut rng(),
        );
        state
    }

    #[test]
    fn search_filters_case_insensitively_preserving_order() {
        let mut state = loaded(&["Alpha.mp3", "beta.mp3", "Alpha2.m4a"]);
        state.apply(Action::Search("alpha".to_string()), &mut rng());

        assert_eq!(state.filtered, vec!["Alpha.mp3", "Alpha2.m4a"]);
    }

    #[test]
    fn empty_search_result_clears_current() {
        let mut state = loaded(&["Alpha.mp3", "beta.mp3"]);
        state.apply(Action::Play(1), &mut rng());
        assert_eq!(state.current, Some(1));

        state.apply(Action::Search("zzz".to_string()), &mut rng());
        assert!(state.filtered.is_empty());
        assert_eq!(state.current, None);
    }

    #[test]
    fn play_emits_source_and_play_effects() {
        let mut state = loaded(&["Alpha.mp3", "beta.mp3"]);
        let effects = state.apply(Action::Play(1), &mut rng());

        assert_eq!(
            effects,
            vec![
                Effect::SetSource {
                    filename: "beta.mp3".to_string()
                },
                Effect::Play,
            ]
        );
        assert_eq!(state.current, Some(1));
        assert!(state.playing);
    }

    #[test]
    fn play_out_of_range_is_noop() {
        let mut state = loaded(&["Alpha.mp3"]);
        let effects = state.apply(Action::Play(5), &mut rng());

        assert!(effects.is_empty());
        assert_eq!(state.current, None);
    }

    #[test]
    fn previous_wraps_to_last() {
        let mut state = loaded(&["a.mp3", "b.mp3", "c.mp3"]);
        state.apply(Action::Play(0), &mut rng());

        state.apply(Action::Previous, &mut rng());
        assert_eq!(state.current, Some(2));
    }

    #[test]
    fn next_wraps_to_first() {
        let mut state = loaded(&["a.mp3", "b.mp3", "c.mp3"]);
        state.apply(Action::Play(2), &mut rng());

        state.apply(Action::Next, &mut rng());
        assert_eq!(state.current, Some(0));
    }

    #[test]
    fn shuffle_next_stays_in_bounds() {
        let mut state = loaded(&["a.mp3", "b.mp3", "c.mp3"]);
        state.apply(Action::ToggleShuffle, &mut rng());
        let mut rng = rng();

        for _ in 0..100 {
            state.apply(Action::Next, &mut rng);
            assert!(state.current.unwrap() < 3);
        }
    }

    #[test]
    fn shuffle_next_with_one_song_always_picks_it() {
        let mut state = loaded(&["only.mp3"]);
        state.apply(Action::ToggleShuffle, &mut rng());
        let mut rng = rng();

        for _ in 0..10 {
            state.apply(Action::Next, &mut rng);
            assert_eq!(state.current, Some(0));
        }
    }

    #[test]
    fn navigation_is_noop_on_empty_list() {
        let mut state = PlayerState::new();

        assert!(state.apply(Action::Next, &mut rng()).is_empty());
        assert!(state.apply(Action::Previous, &mut rng()).is_empty());
        assert!(state.apply(Action::Play(0), &mut rng()).is_empty());
        assert_eq!(state, PlayerState::new());
    }

    #[test]
    fn toggle_play_pause_alternates_effects() {
        let mut state = loaded(&["a.mp3"]);
        state.apply(Action::Play(0), &mut rng());

        assert_eq!(
            state.apply(Action::TogglePlayPause, &mut rng()),
            vec![Effect::Pause]
        );
        assert_eq!(
            state.apply(Action::TogglePlayPause, &mut rng()),
            vec![Effect::Play]
        );
    }

    #[test]
    fn toggle_play_pause_without_track_is_noop() {
        let mut state = loaded(&["a.mp3"]);
        assert!(state.apply(Action::TogglePlayPause, &mut rng()).is_empty());
    }

    #[test]
    fn ended_advances_when_not_looping() {
        let mut state = loaded(&["a.mp3", "b.mp3"]);
        state.apply(Action::Play(0), &mut rng());

        let effects = state.apply(Action::TrackEnded, &mut rng());
        assert_eq!(state.current, Some(1));
        assert!(effects.contains(&Effect::Play));
    }

    #[test]
    fn ended_is_noop_when_looping() {
        let mut state = loaded(&["a.mp3", "b.mp3"]);
        state.apply(Action::Play(0), &mut rng());
        state.apply(Action::ToggleLoop, &mut rng());

        assert!(state.apply(Action::TrackEnded, &mut rng()).is_empty());
        assert_eq!(state.current, Some(0));
    }

    #[test]
    fn toggle_loop_emits_native_flag_effect() {
        let mut state = PlayerState::new();

        assert_eq!(
            state.apply(Action::ToggleLoop, &mut rng()),
            vec![Effect::SetLoop(true)]
        );
        assert_eq!(
            state.apply(Action::ToggleLoop, &mut rng()),
            vec![Effect::SetLoop(false)]
        );
    }

    #[test]
    fn refresh_tags_requests_with_increasing_seq() {
        let mut state = PlayerState::new();

        assert_eq!(
            state.apply(Action::RefreshLibrary, &mut rng()),
            vec![Effect::FetchLibrary { seq: 1 }]
        );
        assert_eq!(
            state.apply(Action::RefreshLibrary, &mut rng()),
            vec![Effect::FetchLibrary { seq: 2 }]
        );
    }

    #[test]
    fn stale_listing_response_is_discarded() {
        let mut state = PlayerState::new();
        state.apply(Action::RefreshLibrary, &mut rng());
        state.apply(Action::RefreshLibrary, &mut rng());

        state.apply(
            Action::LibraryLoaded {
                seq: 2,
                songs: vec!["fresh.mp3".to_string()],
            },
            &mut rng(),
        );
        state.apply(
            Action::LibraryLoaded {
                seq: 1,
                songs: vec!["stale.mp3".to_string()],
            },
            &mut rng(),
        );

        assert_eq!(state.all_songs, vec!["fresh.mp3"]);
    }

    #[test]
    fn refetch_clears_out_of_range_current() {
        let mut state = loaded(&["a.mp3", "b.mp3", "c.mp3"]);
        state.apply(Action::Play(2), &mut rng());

        state.apply(Action::RefreshLibrary, &mut rng());
        state.apply(
            Action::LibraryLoaded {
                seq: 2,
                songs: vec!["a.mp3".to_string()],
            },
            &mut rng(),
        );

        assert_eq!(state.current, None);
    }
}
