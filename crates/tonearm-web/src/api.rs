//! HTTP calls against the library service.

use serde::Deserialize;

/// `GET /songs` response body.
#[derive(Debug, Deserialize)]
struct SongsResponse {
    songs: Vec<String>,
}

/// Error body shape shared by every service endpoint.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[allow(dead_code)]
    error: String,
    message: String,
}

/// Origin of the page the app is served from.
fn base_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// Stream URL for a song, with the filename percent-encoded.
pub fn song_url(filename: &str) -> String {
    let encoded: String = js_sys::encode_uri_component(filename).into();
    format!("{}/music/{}", base_url(), encoded)
}

/// Pull the server's error message out of a failed response body.
async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => body.message,
        Err(_) => format!("Server error: {}", status),
    }
}

/// Fetch the current song listing.
pub async fn fetch_songs() -> Result<Vec<String>, String> {
    let url = format!("{}/songs", base_url());
    let resp = reqwest::get(&url)
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.status().is_success() {
        return Err(error_message(resp).await);
    }

    let body: SongsResponse = resp.json().await.map_err(|e| format!("Parse error: {e}"))?;
    Ok(body.songs)
}

/// Upload one file as the multipart `file` field.
pub async fn upload_song(filename: &str, mime: &str, bytes: Vec<u8>) -> Result<(), String> {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(mime)
        .map_err(|e| format!("Invalid file type: {e}"))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let url = format!("{}/upload", base_url());
    let resp = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.status().is_success() {
        return Err(error_message(resp).await);
    }

    Ok(())
}
