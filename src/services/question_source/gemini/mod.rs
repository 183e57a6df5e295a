mod config;
mod error;
mod prompts;
mod source;

pub use config::GeminiConfig;
pub use error::{GeminiError, GeminiResult};
pub use source::GeminiQuestionSource;
