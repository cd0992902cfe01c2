//! AI capability
//!
//! ```text
//! src/ai/
//! ├── mod.rs       - Module exports
//! ├── config.rs    - API key detection and provider settings
//! └── providers.rs - ChatClient trait and the OpenAI-compatible client
//! ```

pub mod config;
pub mod providers;

pub use config::{detect_api_key, ProviderConfig};
pub use providers::{ChatClient, OpenAiProvider};
