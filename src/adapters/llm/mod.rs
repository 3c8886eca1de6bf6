//! Text-generation adapters.

pub mod openai;

pub use openai::OpenAiChatGenerator;
