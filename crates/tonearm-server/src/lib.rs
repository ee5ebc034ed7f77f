//! Tonearm library service.
//!
//! An HTTP service owning a directory of audio files: list, stream-by-name,
//! and single-file upload. The directory is the database; the built web
//! client is served alongside the API.

pub mod api;
pub mod config;
pub mod error;
pub mod library;
pub mod models;
