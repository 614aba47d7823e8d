//! Serves stored uploads over HTTP so the UI can preview them.
//!
//! A small Axum router mounted by the host web layer, e.g. at `/uploads`:
//!   GET /uploads/:filename  serves a stored file

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::{path::PathBuf, sync::Arc};
use tokio::fs;
use tracing::{debug, warn};

use crate::mime_detect::{detect_mime_type, is_inline_safe};

#[derive(Clone)]
struct FileServerState {
    upload_dir: Arc<PathBuf>,
}

/// Build the upload file-serving router.
pub fn upload_router(upload_dir: PathBuf) -> Router {
    let state = FileServerState {
        upload_dir: Arc::new(upload_dir),
    };
    Router::new()
        .route("/:filename", get(serve_upload))
        .with_state(state)
}

/// GET /:filename: stream a stored upload.
async fn serve_upload(
    Path(filename): Path<String>,
    State(state): State<FileServerState>,
) -> Response {
    // Basic path sanitization: reject traversal.
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        warn!(filename = %filename, "Rejected suspicious upload path");
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.upload_dir.join(&filename);
    debug!(path = %path.display(), "Serving upload");

    match fs::read(&path).await {
        Ok(bytes) => {
            let mime = detect_mime_type(&path);
            let disposition = if is_inline_safe(mime) {
                format!("inline; filename=\"{filename}\"")
            } else {
                format!("attachment; filename=\"{filename}\"")
            };

            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, mime.parse().unwrap());
            headers.insert(header::CONTENT_DISPOSITION, disposition.parse().unwrap());
            headers.insert(
                header::CONTENT_LENGTH,
                bytes.len().to_string().parse().unwrap(),
            );

            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Upload not found").into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read upload");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read upload").into_response()
        }
    }
}
