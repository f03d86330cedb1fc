//! Provider wire formats.

pub mod mistral;
