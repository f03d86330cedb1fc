//! Conversation facade: one strategy, one model, an ordered history.

use std::path::Path;

use tracing::{info, warn};

use crate::api::mistral::MISTRAL_API_BASE;
use crate::client::{ClientError, Transport};
use crate::http::HttpTransport;
use crate::model::{Credential, Message, Modality, ModelCatalog};
use crate::options::{ModelOptions, TransportOptions};
use crate::strategy::RequestStrategy;

/// Single entry point for a chat session.
///
/// The modality and model are validated and fixed at construction. Every
/// successful [`ask`](Conversation::ask) appends the user message and the
/// assistant reply to the history, in that order; failed calls leave the
/// history untouched.
///
/// `ask` takes `&mut self`, so a conversation never has two requests in
/// flight. Share one across tasks behind a `tokio::sync::Mutex`.
///
/// # Example
/// ```no_run
/// use parley::Conversation;
///
/// #[tokio::main]
/// async fn main() -> Result<(), parley::ClientError> {
///     let mut conversation = Conversation::new("api-key", "text", "mistral-large-latest")?;
///     let reply = conversation.ask("Bonjour", None).await?;
///     println!("{}", reply.content());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Conversation<T = HttpTransport> {
    strategy: RequestStrategy<T>,
    model: String,
    history: Vec<Message>,
}

impl Conversation<HttpTransport> {
    /// Create a conversation against the Mistral API with default options.
    pub fn new(
        credential: impl Into<Credential>,
        modality: &str,
        model: &str,
    ) -> Result<Self, ClientError> {
        Self::builder(credential).modality(modality).model(model).build()
    }

    pub fn builder(credential: impl Into<Credential>) -> ConversationBuilder {
        ConversationBuilder::new(credential.into())
    }
}

impl<T: Transport> Conversation<T> {
    /// Send `text`, with an image attachment on image conversations.
    pub async fn ask(
        &mut self,
        text: &str,
        attachment: Option<&Path>,
    ) -> Result<Message, ClientError> {
        info!(
            "Asking {} ({} request, {} messages so far)",
            self.model,
            self.strategy.modality(),
            self.history.len()
        );

        let reply = match self.strategy.send(text, attachment, &self.model).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Request to {} failed: {}", self.model, e);
                return Err(e);
            }
        };

        self.history.push(Message::user(text));
        self.history.push(reply.clone());
        Ok(reply)
    }

    /// Messages exchanged so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Forget all messages. The modality and model stay as they are.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn modality(&self) -> Modality {
        self.strategy.modality()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Builder for [`Conversation`].
///
/// Modality defaults to text and the model to the catalog's default for the
/// chosen modality.
#[derive(Debug, Clone)]
pub struct ConversationBuilder {
    credential: Credential,
    modality: Option<String>,
    model: Option<String>,
    catalog: ModelCatalog,
    base_url: String,
    model_options: ModelOptions,
    transport_options: TransportOptions,
}

impl ConversationBuilder {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            modality: None,
            model: None,
            catalog: ModelCatalog::mistral(),
            base_url: MISTRAL_API_BASE.to_string(),
            model_options: ModelOptions::default(),
            transport_options: TransportOptions::default(),
        }
    }

    /// Modality tag, parsed when the conversation is built.
    pub fn modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replace the set of permitted models.
    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// API base URL; the chat completions path is appended to it.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model_options(mut self, options: ModelOptions) -> Self {
        self.model_options = options;
        self
    }

    pub fn transport_options(mut self, options: TransportOptions) -> Self {
        self.transport_options = options;
        self
    }

    /// Build over an HTTP transport configured from the transport options.
    pub fn build(self) -> Result<Conversation<HttpTransport>, ClientError> {
        let (modality, model) = self.resolve()?;
        let transport = HttpTransport::new(self.transport_options.clone())?;
        Ok(self.assemble(modality, model, transport))
    }

    /// Build over a caller-supplied transport. Transport options are ignored.
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<Conversation<T>, ClientError> {
        let (modality, model) = self.resolve()?;
        Ok(self.assemble(modality, model, transport))
    }

    fn resolve(&self) -> Result<(Modality, String), ClientError> {
        let modality = match &self.modality {
            Some(tag) => tag.parse()?,
            None => Modality::Text,
        };

        let model = match &self.model {
            Some(model) => model.clone(),
            None => self
                .catalog
                .default_model(modality)
                .ok_or_else(|| ClientError::InvalidModel {
                    modality,
                    model: String::new(),
                })?
                .to_string(),
        };

        self.catalog.validate(modality, &model)?;
        Ok((modality, model))
    }

    fn assemble<T: Transport>(
        self,
        modality: Modality,
        model: String,
        transport: T,
    ) -> Conversation<T> {
        Conversation {
            strategy: RequestStrategy::new(
                modality,
                self.credential,
                self.base_url,
                self.model_options,
                transport,
            ),
            model,
            history: Vec::new(),
        }
    }
}
