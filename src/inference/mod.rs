//! Vision-inference capability
//!
//! The session core only sees the [`InferenceClient`] trait. One concrete
//! client is built at startup and shared read-only through an
//! [`InferenceHandle`].

mod client;
mod error;
mod preprocess;
mod openai;

pub use self::client::{InferenceClient, InferenceHandle};
pub use self::error::InferenceError;
pub use self::preprocess::{prepare_image, ImageOptions};
pub use self::openai::{OpenAiVisionClient, ANALYSIS_PROMPT, SYSTEM_PROMPT};
