//! Hotstrings: typed abbreviations replaced as soon as they are completed
//!
//! # Module Structure
//!
//! - `buffer` - bounded FIFO of recently typed characters
//! - `triggers` - trigger table with longest-suffix lookup
//! - `matcher` - incremental matching, including held matches
//! - `provider` - static and async expansion providers
//! - `engine` - [`HotstringEngine`], subscription and dispatch
//! - `ai` - producers that run a prompt on the current selection

mod ai;
mod buffer;
mod engine;
mod matcher;
mod provider;
mod triggers;

pub use ai::AiHotstrings;
pub use buffer::RollingBuffer;
pub use engine::HotstringEngine;
pub use matcher::{Expansion, HotstringMatcher};
pub use provider::{ExpansionProvider, Producer, StaticText};
pub use triggers::TriggerTable;

use chrono::Local;

use crate::config::SnippetConfig;
use crate::error::HubError;

pub const SIGNATURE_TRIGGER: &str = ";sig";
pub const SIGNATURE_TEXT: &str = "Best regards,\nYour Name";
pub const DATE_TRIGGER: &str = ";date";
pub const TIME_TRIGGER: &str = ";time";

/// Built-in snippets followed by the user's configured ones.
///
/// Stops at the first rejected trigger; earlier ones stay registered.
pub fn register_snippets(
    engine: &HotstringEngine,
    snippets: &[SnippetConfig],
) -> Result<(), HubError> {
    engine.register_text(SIGNATURE_TRIGGER, SIGNATURE_TEXT)?;
    engine.register_text(
        DATE_TRIGGER,
        StaticText::computed(|| Ok(Local::now().format("%Y-%m-%d").to_string())),
    )?;
    engine.register_text(
        TIME_TRIGGER,
        StaticText::computed(|| Ok(Local::now().format("%H:%M").to_string())),
    )?;

    for snippet in snippets {
        engine.register_text(&snippet.trigger, snippet.text.as_str())?;
    }
    Ok(())
}
