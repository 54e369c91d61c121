use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use std::io;

use crate::{handlers::MAX_FILE_SIZE, records::StoredObject, records::UploadResult};

/// Failure of one step of the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing required fields")]
    MissingFields,

    #[error("File size must be less than {}MB", MAX_FILE_SIZE / 1024 / 1024)]
    FileTooLarge,

    #[error("malformed multipart body: {0}")]
    Parse(String),

    #[error("failed to spool upload: {0}")]
    Spool(#[from] io::Error),

    #[error("storage upload failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("spreadsheet append failed: {source:#}")]
    Append {
        stored: StoredObject,
        source: anyhow::Error,
    },
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingFields | Self::FileTooLarge => StatusCode::BAD_REQUEST,
            Self::Parse(_) | Self::Spool(_) | Self::Storage(_) | Self::Append { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn log(&self) {
        match self {
            Self::MethodNotAllowed | Self::MissingFields | Self::FileTooLarge => {
                warn!("Upload rejected: {}", self)
            }
            Self::Append { stored, .. } => error!(
                "Upload orphaned: file {} stored at {} but not recorded: {}",
                stored.id, stored.web_view_link, self
            ),
            _ => error!("Upload error: {}", self),
        }
    }

    fn body(&self) -> UploadResult {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                UploadResult::failed("Upload failed", Some(self.to_string()))
            }
            _ => UploadResult::failed(self.to_string(), None),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
