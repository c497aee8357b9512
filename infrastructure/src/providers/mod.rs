//! AI backend adapters implementing the `AiBackend` port

mod openai;

pub use openai::OpenAiBackend;
