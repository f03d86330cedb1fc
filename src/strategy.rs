//! Request strategies: one per modality, each owning its credential,
//! endpoint and transport.

use std::path::Path;

use tracing::debug;

use crate::api::mistral::{chat_completions_url, parse_completion, ChatRequest};
use crate::attachment;
use crate::client::{ClientError, Transport};
use crate::model::{Credential, Message, Modality};
use crate::options::ModelOptions;

/// Connection details shared by both strategies.
#[derive(Debug, Clone)]
struct Endpoint<T> {
    credential: Credential,
    base_url: String,
    options: ModelOptions,
    transport: T,
}

impl<T: Transport> Endpoint<T> {
    async fn complete(&self, request: ChatRequest) -> Result<Message, ClientError> {
        let url = chat_completions_url(&self.base_url);
        let headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.credential.expose()),
        )];

        let body = self.transport.post(&url, &headers, &request.to_value()?).await?;
        parse_completion(body)
    }
}

/// Sends single-turn text requests.
#[derive(Debug, Clone)]
pub struct TextRequest<T> {
    endpoint: Endpoint<T>,
}

impl<T: Transport> TextRequest<T> {
    pub fn new(
        credential: Credential,
        base_url: impl Into<String>,
        options: ModelOptions,
        transport: T,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                credential,
                base_url: base_url.into(),
                options,
                transport,
            },
        }
    }

    /// Send `text` as one user turn and return the assistant's reply.
    pub async fn send(&self, text: &str, model: &str) -> Result<Message, ClientError> {
        debug!("Sending text request to {}", model);
        let request = ChatRequest::text(model, text, &self.endpoint.options);
        self.endpoint.complete(request).await
    }
}

/// Sends single-turn text + image requests.
#[derive(Debug, Clone)]
pub struct ImageRequest<T> {
    endpoint: Endpoint<T>,
}

impl<T: Transport> ImageRequest<T> {
    pub fn new(
        credential: Credential,
        base_url: impl Into<String>,
        options: ModelOptions,
        transport: T,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                credential,
                base_url: base_url.into(),
                options,
                transport,
            },
        }
    }

    /// Encode the image at `image_path` and send it with `text`.
    ///
    /// Encoding happens first; if it fails nothing is sent.
    pub async fn send(
        &self,
        text: &str,
        image_path: &Path,
        model: &str,
    ) -> Result<Message, ClientError> {
        let image = attachment::encode(image_path)?;
        debug!(
            "Sending image request to {} ({} base64 bytes)",
            model,
            image.base64().len()
        );
        let request = ChatRequest::image(model, text, &image, &self.endpoint.options);
        self.endpoint.complete(request).await
    }
}

/// The strategy bound to a conversation, fixed for its lifetime.
#[derive(Debug, Clone)]
pub enum RequestStrategy<T> {
    Text(TextRequest<T>),
    Image(ImageRequest<T>),
}

impl<T: Transport> RequestStrategy<T> {
    pub fn new(
        modality: Modality,
        credential: Credential,
        base_url: impl Into<String>,
        options: ModelOptions,
        transport: T,
    ) -> Self {
        match modality {
            Modality::Text => {
                RequestStrategy::Text(TextRequest::new(credential, base_url, options, transport))
            }
            Modality::Image => {
                RequestStrategy::Image(ImageRequest::new(credential, base_url, options, transport))
            }
        }
    }

    pub fn modality(&self) -> Modality {
        match self {
            RequestStrategy::Text(_) => Modality::Text,
            RequestStrategy::Image(_) => Modality::Image,
        }
    }

    /// Route a request to the active strategy.
    ///
    /// Text strategies take no attachment and image strategies require one;
    /// anything else is a [`ClientError::ModalityMismatch`] raised before any
    /// encoding or network traffic.
    pub async fn send(
        &self,
        text: &str,
        attachment: Option<&Path>,
        model: &str,
    ) -> Result<Message, ClientError> {
        match (self, attachment) {
            (RequestStrategy::Text(request), None) => request.send(text, model).await,
            (RequestStrategy::Image(request), Some(path)) => request.send(text, path, model).await,
            (_, attachment) => Err(ClientError::ModalityMismatch {
                active: self.modality(),
                requested: if attachment.is_some() {
                    Modality::Image
                } else {
                    Modality::Text
                },
            }),
        }
    }
}
