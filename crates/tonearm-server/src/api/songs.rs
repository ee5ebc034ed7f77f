//! Song API endpoints: listing, streaming, upload.

use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;

use crate::error::{AppError, AppResult};
use crate::library::{sanitize_filename, AudioFormat, StagedUpload};
use crate::models::{AppState, SongsResponse, UploadResponse};

/// Map a multipart parse error to a client error.
fn bad_multipart(e: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {}", e))
}

/// List the songs currently in the library.
///
/// GET /songs
#[get("/songs")]
pub async fn list_songs(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let songs = data.library.list()?;
    Ok(HttpResponse::Ok().json(SongsResponse { songs }))
}

/// Stream a song's bytes.
///
/// GET /music/{filename}
///
/// Supports range requests for seeking.
#[get("/music/{filename}")]
pub async fn stream_song(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let full_path = data.library.resolve(&path)?;
    let file = NamedFile::open(&full_path)?;
    Ok(file.into_response(&req))
}

/// Accept a single-file upload into the library.
///
/// POST /upload (multipart, field `file`)
///
/// The declared content type and the filename extension must both identify an
/// accepted audio format. Bytes are staged to a temp file and promoted with an
/// atomic no-clobber rename; a name collision returns a conflict and leaves
/// the existing song untouched.
#[post("/upload")]
pub async fn upload_song(
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        if field.name() != "file" {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation("Upload is missing a filename".to_string()))?;
        sanitize_filename(&filename)?;

        let format = field
            .content_type()
            .and_then(|mime| AudioFormat::from_mime(mime.essence_str()))
            .ok_or_else(AppError::unsupported_type)?;

        match AudioFormat::from_filename(&filename) {
            Some(f) if f == format => {}
            _ => {
                return Err(AppError::Validation(
                    "File extension does not match the uploaded content type".to_string(),
                ))
            }
        }

        let mut staged = data.library.stage()?;
        while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
            staged = write_chunk_blocking(staged, chunk).await?;
        }

        tracing::info!(
            filename = %filename,
            size = staged.written(),
            "Received upload"
        );

        let library = data.library.clone();
        let stored = filename.clone();
        web::block(move || staged.persist(&library, &stored))
            .await
            .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))??;

        return Ok(HttpResponse::Ok().json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            filename,
        }));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}

/// Append one chunk to the staged upload on the blocking thread pool.
async fn write_chunk_blocking(
    mut staged: StagedUpload,
    chunk: web::Bytes,
) -> AppResult<StagedUpload> {
    web::block(move || {
        staged.write_chunk(&chunk)?;
        Ok::<_, AppError>(staged)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Configure song routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_songs)
        .service(stream_song)
        .service(upload_song);
}
