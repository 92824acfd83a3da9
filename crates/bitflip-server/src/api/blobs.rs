//! Local blob API: upload, download, list and delete files.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};

use crate::blob::{BlobError, format_size};
use crate::dto::{DeleteResponse, Envelope, FileListResponse, UploadResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// POST /upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Envelope<UploadResponse>>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        tracing::debug!(filename = %original, "Receiving upload");

        let data = field.bytes().await?;
        let blob = state.blobs.store(&original, &data).await?;

        return Ok(Json(Envelope::ok(UploadResponse {
            message: "File uploaded successfully".to_string(),
            size_formatted: format_size(blob.size),
            download_url: format!("/download/{}", blob.filename),
            blob,
        })));
    }

    Err(BlobError::MissingFile.into())
}

/// GET /download/{filename}
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let (name, bytes) = state.blobs.read(&filename).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response())
}

/// GET /files
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Envelope<FileListResponse>>> {
    let files = state.blobs.list().await?;
    Ok(Json(Envelope::ok(FileListResponse {
        count: files.len(),
        files,
    })))
}

/// DELETE /delete/{filename}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Json<Envelope<DeleteResponse>>> {
    let filename = state.blobs.delete(&filename).await?;
    Ok(Json(Envelope::ok(DeleteResponse {
        message: "File deleted successfully".to_string(),
        filename,
    })))
}
