// Completion client and advisory prompt construction.

pub mod client;
pub mod prompt;

pub use client::{ChatCompletion, ChatMessage, LlmClient, LlmError, OpenAiClient, Role};
