//! Generative model seam: request/message types, the `ChatModel` trait
//! implemented by concrete providers, and the clean/validate/retry loop
//! shared by every generator in the crate.

pub mod generate;
pub mod model;
pub mod types;

pub use generate::{clean_model_payload, generate_with_retry, DEFAULT_MAX_ATTEMPTS};
pub use model::ChatModel;
pub use types::{ChatMessage, ChatRequest, ImageAttachment};
