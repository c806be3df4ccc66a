//! Gemini `generateContent` client with Google Search grounding.
//!
//! Implements [`urlgenie_chat::ModelClient`] over the Generative Language REST
//! API. The model is asked to answer about the target URL and the search tool
//! supplies the citations.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::GeminiClient;
pub use error::GeminiError;
