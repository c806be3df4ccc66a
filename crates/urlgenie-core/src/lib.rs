pub mod config;
pub mod error;
pub mod types;

pub use config::UrlGenieConfig;
pub use error::{Result, UrlGenieError};
pub use types::*;
