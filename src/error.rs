//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info, warn};

use crate::item::GeneratedItem;
use crate::services::{SynthesisError, UploadError};

/// Why a single generation did not produce an item.
#[derive(Debug)]
pub enum GenerationError {
    /// Another generation is already in flight; nothing was started.
    Busy,
    /// The image service is unreachable or overloaded.
    SynthesisUnavailable(String),
    /// The image service failed for any other reason.
    SynthesisFailed(String),
    /// The image was synthesized but could not be stored.
    UploadFailed(String),
    /// The requested collection does not exist for this owner.
    CollectionNotFound(i32),
    /// Recording the item failed.
    Persistence(sea_orm::DbErr),
}

impl GenerationError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Busy => {
                "A generation is already in progress. Please wait for it to finish.".to_string()
            }
            GenerationError::SynthesisUnavailable(_) => {
                "The image service is temporarily unavailable. Please try again in a moment."
                    .to_string()
            }
            GenerationError::SynthesisFailed(_) => {
                "Image generation failed. Please try again.".to_string()
            }
            GenerationError::UploadFailed(_) => {
                "Upload failed: the generated image could not be saved.".to_string()
            }
            GenerationError::CollectionNotFound(id) => format!("Collection {id} was not found."),
            GenerationError::Persistence(_) => {
                "The generated item could not be saved.".to_string()
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GenerationError::Busy => StatusCode::CONFLICT,
            GenerationError::SynthesisUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::SynthesisFailed(_) | GenerationError::UploadFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            GenerationError::CollectionNotFound(_) => StatusCode::NOT_FOUND,
            GenerationError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            GenerationError::Busy => info!("Generation rejected: already in progress"),
            GenerationError::CollectionNotFound(id) => info!("Unknown collection {id}"),
            other => error!("Generation failed: {other}"),
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "generation already in progress"),
            Self::SynthesisUnavailable(reason) => write!(f, "synthesis unavailable: {reason}"),
            Self::SynthesisFailed(reason) => write!(f, "synthesis failed: {reason}"),
            Self::UploadFailed(reason) => write!(f, "upload failed: {reason}"),
            Self::CollectionNotFound(id) => write!(f, "collection {id} not found"),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<SynthesisError> for GenerationError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Unavailable(reason) => GenerationError::SynthesisUnavailable(reason),
            SynthesisError::Failed(reason) => GenerationError::SynthesisFailed(reason),
        }
    }
}

impl From<UploadError> for GenerationError {
    fn from(err: UploadError) -> Self {
        GenerationError::UploadFailed(err.to_string())
    }
}

impl From<sea_orm::DbErr> for GenerationError {
    fn from(err: sea_orm::DbErr) -> Self {
        GenerationError::Persistence(err)
    }
}

/// A batch stopped early. Items finished before the failure are kept.
#[derive(Debug)]
pub struct BatchError {
    /// Items completed before the failure
    pub completed: Vec<GeneratedItem>,
    /// Units the batch was asked to run
    pub total: usize,
    /// What stopped the batch
    pub cause: GenerationError,
}

impl BatchError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self.cause {
            GenerationError::Busy => self.cause.user_message(),
            _ => format!(
                "Batch generation failed after {} of {} items. Completed items were kept.",
                self.completed.len(),
                self.total
            ),
        }
    }
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "batch failed after {} of {} units: {}",
            self.completed.len(),
            self.total,
            self.cause
        )
    }
}

impl std::error::Error for BatchError {}

/// Errors surfaced by the HTTP API.
#[derive(Debug)]
pub enum MintError {
    /// When you didn't do the right thing
    BadRequest(String),
    /// Missing or malformed owner identity
    Unauthorized,
    /// When DB operations fail
    DatabaseError(sea_orm::DbErr),
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
    /// A single generation failed
    Generation(GenerationError),
    /// A batch stopped early
    Batch(BatchError),
}

impl From<sea_orm::DbErr> for MintError {
    fn from(err: sea_orm::DbErr) -> Self {
        MintError::DatabaseError(err)
    }
}

impl From<std::io::Error> for MintError {
    fn from(err: std::io::Error) -> Self {
        MintError::InternalServerError(err.to_string())
    }
}

impl From<GenerationError> for MintError {
    fn from(err: GenerationError) -> Self {
        MintError::Generation(err)
    }
}

impl From<BatchError> for MintError {
    fn from(err: BatchError) -> Self {
        MintError::Batch(err)
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for MintError {
    fn into_response(self) -> Response {
        match self {
            MintError::BadRequest(message) => {
                info!("Bad request received: {message}");
                error_body(StatusCode::BAD_REQUEST, &message)
            }
            MintError::Unauthorized => {
                info!("Unauthorized request received");
                error_body(
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized: missing or invalid owner identity.",
                )
            }
            MintError::DatabaseError(err) => {
                error!("Database error: {}", err);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            MintError::NotFound(what) => {
                info!("404 {what}");
                error_body(StatusCode::NOT_FOUND, "Not Found")
            }
            MintError::InternalServerError(message) => {
                error!("Internal server error: {}", message);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            MintError::Generation(err) => {
                err.log();
                error_body(err.status(), &err.user_message())
            }
            MintError::Batch(err) => {
                let status = match err.cause {
                    GenerationError::Busy => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                warn!("{err}");
                (
                    status,
                    Json(json!({
                        "error": err.user_message(),
                        "items": err.completed,
                    })),
                )
                    .into_response()
            }
        }
    }
}
