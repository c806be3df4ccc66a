//! UrlGenie API crate - axum HTTP server exposing the chat session as JSON.
//!
//! The routes mirror the presentation intents: read the session, send a
//! message, set or clear the context URL, and drive voice input.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
