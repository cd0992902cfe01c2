//! Configuration module - Application settings and user preferences
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.ai-hub/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Settings struct definitions
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_BUFFER_SIZE, DEFAULT_PROMPT_HOTSTRINGS, DEFAULT_PROMPT_SHORTCUTS};

pub use types::{
    AiSettings, HotkeySettings, HotstringSettings, InjectMethod, InjectorSettings, PathSettings,
    PromptHotstring, PromptShortcut, Settings, SnippetConfig,
};

pub use loader::{config_path, load_config, load_config_from};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
