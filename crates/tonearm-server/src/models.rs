use serde::{Deserialize, Serialize};

use crate::library::Library;

#[derive(Clone)]
pub struct AppState {
    pub library: Library,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongsResponse {
    pub songs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}
