//! # parley - conversation facade for chat completion APIs
//!
//! A small async client for sending text and text+image ("multimodal") chat
//! requests to a Mistral-style API while keeping a linear conversation
//! history.
//!
//! ## Architecture
//!
//! 1. **Attachments** decode local images and re-encode them as base64 JPEG.
//! 2. **Strategies** (`TextRequest`, `ImageRequest`) build the payload for
//!    one modality and post it through a `Transport`.
//! 3. **Conversation** binds one strategy and one validated model for its
//!    lifetime and records every successful exchange.
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use parley::{Conversation, ModelOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("MISTRAL_API_KEY")?;
//!
//!     let mut conversation = Conversation::builder(api_key)
//!         .modality("image")
//!         .model("pixtral-12b-2409")
//!         .model_options(ModelOptions::new().with_max_tokens(256))
//!         .build()?;
//!
//!     let reply = conversation
//!         .ask("What is in this picture?", Some(Path::new("photo.png")))
//!         .await?;
//!     println!("{}", reply.content());
//!     assert_eq!(conversation.history().len(), 2);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod attachment;
pub mod client;
pub mod conversation;
pub mod http;
pub mod model;
pub mod options;
pub mod strategy;

pub use attachment::EncodedImage;
pub use client::{ClientError, Transport};
pub use conversation::{Conversation, ConversationBuilder};
pub use http::HttpTransport;
pub use model::{Credential, Message, Modality, ModelCatalog, Role};
pub use options::{ModelOptions, TransportOptions};
pub use strategy::{ImageRequest, RequestStrategy, TextRequest};
