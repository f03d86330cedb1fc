//! Conversation data model: roles, messages, modalities and the model catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::ClientError;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single exchanged message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Whether a request carries only text or text plus an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" | "multimodal" => Ok(Modality::Image),
            _ => Err(ClientError::InvalidModality(s.to_string())),
        }
    }
}

/// API key handed to the provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Permitted model identifiers per modality.
///
/// The first model registered for a modality is its default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: BTreeMap<Modality, BTreeSet<String>>,
    defaults: BTreeMap<Modality, String>,
}

impl ModelCatalog {
    /// An empty catalog. Use [`ModelCatalog::mistral`] for the stock model list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mistral's chat and vision models.
    pub fn mistral() -> Self {
        Self::new()
            .with_model(Modality::Text, "mistral-large-latest")
            .with_model(Modality::Text, "mistral-medium-latest")
            .with_model(Modality::Text, "mistral-small-latest")
            .with_model(Modality::Text, "open-mistral-nemo")
            .with_model(Modality::Text, "codestral-latest")
            .with_model(Modality::Image, "pixtral-12b-2409")
            .with_model(Modality::Image, "pixtral-large-latest")
    }

    /// Register a model for a modality.
    pub fn with_model(mut self, modality: Modality, model: impl Into<String>) -> Self {
        let model = model.into();
        self.defaults
            .entry(modality)
            .or_insert_with(|| model.clone());
        self.models.entry(modality).or_default().insert(model);
        self
    }

    pub fn contains(&self, modality: Modality, model: &str) -> bool {
        self.models
            .get(&modality)
            .is_some_and(|set| set.contains(model))
    }

    pub fn models(&self, modality: Modality) -> impl Iterator<Item = &str> {
        self.models
            .get(&modality)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn default_model(&self, modality: Modality) -> Option<&str> {
        self.defaults.get(&modality).map(String::as_str)
    }

    /// Check that `model` is permitted for `modality`.
    pub fn validate(&self, modality: Modality, model: &str) -> Result<(), ClientError> {
        if self.contains(modality, model) {
            Ok(())
        } else {
            Err(ClientError::InvalidModel {
                modality,
                model: model.to_string(),
            })
        }
    }
}
