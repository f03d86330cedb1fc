//! Core transport trait and error types.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::model::Modality;

/// Errors that can occur while encoding, sending or recording a request.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Attachment not found: {}", .0.display())]
    AttachmentNotFound(PathBuf),

    #[error("Could not decode image {}: {source}", .path.display())]
    AttachmentDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unknown modality: {0:?}")]
    InvalidModality(String),

    #[error("Model {model:?} is not available for {modality} requests")]
    InvalidModel { modality: Modality, model: String },

    #[error("Modality mismatch: conversation is {active} but request is {requested}")]
    ModalityMismatch {
        active: Modality,
        requested: Modality,
    },

    #[error("Transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Response parse error: {0}")]
    ResponseParse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Narrow interface to whatever performs the network call.
///
/// Implementations post a JSON body to `url` with the given headers and hand
/// back the decoded JSON body of a successful response. Non-success statuses
/// and connection failures are reported as [`ClientError::Transport`], bodies
/// that are not JSON as [`ClientError::ResponseParse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> Result<Value, ClientError>;
}
