//! Admin image upload.
//!
//! # Data Flow
//! ```text
//! multipart field `image`
//!     → streamed to a temp file (size counted, capped)
//!     → UploadDescriptor
//!     → UploadValidator::validate + store (blocking pool)
//!     → 201 {filename} / 4xx {error}
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::http::server::AppState;
use crate::observability::{metrics, Severity};
use crate::security::upload::{UploadErrorCode, ValidatedUpload};
use crate::security::{UploadDescriptor, UploadRejection};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub size: u64,
    pub mime: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadErrorResponse {
    pub error: String,
}

fn failed_descriptor(code: UploadErrorCode) -> UploadDescriptor {
    UploadDescriptor {
        name: Some(String::new()),
        size: Some(0),
        temp_path: Some(PathBuf::new()),
        error: Some(code),
    }
}

fn transfer_error(e: &MultipartError) -> UploadErrorCode {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadErrorCode::IniSize
    } else {
        UploadErrorCode::Partial
    }
}

async fn discard(path: &PathBuf) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp upload");
        }
    }
}

/// Stream one field to a fresh temp file.
async fn spool(mut field: Field<'_>, max_size_bytes: u64) -> UploadDescriptor {
    let name = field.file_name().unwrap_or_default().to_string();
    if name.is_empty() {
        return failed_descriptor(UploadErrorCode::NoFile);
    }

    let temp_path = std::env::temp_dir().join(format!("site-upload-{}", Uuid::new_v4().simple()));
    let mut file = match tokio::fs::File::create(&temp_path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = %temp_path.display(), error = %e, "Failed to create temp upload");
            return failed_descriptor(UploadErrorCode::CantWrite);
        }
    };

    let mut size: u64 = 0;
    let mut code = UploadErrorCode::Ok;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                size += chunk.len() as u64;
                if size > max_size_bytes {
                    code = UploadErrorCode::FormSize;
                    break;
                }
                if let Err(e) = file.write_all(&chunk).await {
                    tracing::error!(path = %temp_path.display(), error = %e, "Failed to write temp upload");
                    code = UploadErrorCode::CantWrite;
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Upload interrupted");
                code = transfer_error(&e);
                break;
            }
        }
    }

    if let Err(e) = file.flush().await {
        tracing::error!(path = %temp_path.display(), error = %e, "Failed to flush temp upload");
        code = UploadErrorCode::CantWrite;
    }

    UploadDescriptor {
        name: Some(name),
        size: Some(size),
        temp_path: Some(temp_path),
        error: Some(code),
    }
}

/// Find the image field; other fields are ignored.
async fn receive_image(multipart: &mut Multipart, max_size_bytes: u64) -> UploadDescriptor {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(IMAGE_FIELD) => {
                return spool(field, max_size_bytes).await;
            }
            Ok(Some(_)) => continue,
            Ok(None) => return failed_descriptor(UploadErrorCode::NoFile),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed upload body");
                return failed_descriptor(transfer_error(&e));
            }
        }
    }
}

fn rejection_status(rejection: &UploadRejection) -> StatusCode {
    match rejection {
        UploadRejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadRejection::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut multipart: Multipart,
) -> Response {
    let descriptor = receive_image(&mut multipart, state.uploads.max_size_bytes()).await;
    let temp_path = descriptor.temp_path.clone().filter(|p| !p.as_os_str().is_empty());

    let uploads = state.uploads.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let upload: ValidatedUpload = uploads.validate(&descriptor)?;
        uploads.store(&upload)?;
        Ok::<_, UploadRejection>(upload)
    })
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Upload task failed");
            Err(UploadRejection::Failed)
        }
    };

    match result {
        Ok(upload) => {
            tracing::info!(filename = %upload.filename, size = upload.size, "Image uploaded");
            metrics::record_upload("stored");
            state
                .audit
                .record(
                    Severity::Info,
                    peer.ip(),
                    &format!("Image uploaded as {}", upload.filename),
                )
                .await;
            (
                StatusCode::CREATED,
                Json(UploadResponse {
                    filename: upload.filename,
                    size: upload.size,
                    mime: upload.image_type.mime(),
                }),
            )
                .into_response()
        }
        Err(rejection) => {
            if let Some(path) = &temp_path {
                discard(path).await;
            }
            tracing::warn!(reason = %rejection, "Image upload rejected");
            metrics::record_upload("rejected");
            state
                .audit
                .record(
                    Severity::Warning,
                    peer.ip(),
                    &format!("Image upload rejected: {rejection}"),
                )
                .await;
            (
                rejection_status(&rejection),
                Json(UploadErrorResponse {
                    error: rejection.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_mapping() {
        assert_eq!(
            rejection_status(&UploadRejection::TooLarge { max_bytes: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(rejection_status(&UploadRejection::Storage), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            rejection_status(&UploadRejection::UnsupportedContent),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_failed_descriptor_is_complete() {
        let descriptor = failed_descriptor(UploadErrorCode::NoFile);
        assert!(descriptor.name.is_some());
        assert!(descriptor.temp_path.is_some());
        assert_eq!(descriptor.error, Some(UploadErrorCode::NoFile));
    }
}
