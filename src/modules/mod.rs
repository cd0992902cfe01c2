//! Built-in Feature Modules
//!
//! Each module contributes hotkeys and hotstrings during the init phase,
//! before the hub activates the registry. Modules are compiled in and run
//! in ascending `order`.
//!
//! # Module Structure
//!
//! - `prompts` - prompt hotstrings and quick prompt shortcuts
//! - `spelling` - spelling-fix hotkey

mod prompts;
mod spelling;

use tracing::debug;

use crate::config::Settings;
use crate::error::HubError;
use crate::hotkeys::HotkeyRegistry;
use crate::hotstrings::{AiHotstrings, HotstringEngine};
use crate::runner::PromptRunner;

/// Services handed to a module's init hook.
pub struct ModuleApi<'a> {
    pub settings: &'a Settings,
    pub hotkeys: &'a HotkeyRegistry,
    pub hotstrings: &'a HotstringEngine,
    pub runner: &'a PromptRunner,
    pub ai_hotstrings: &'a AiHotstrings,
}

pub type InitHook = fn(&ModuleApi<'_>) -> Result<(), HubError>;

/// A feature contributed to the hub
#[derive(Debug, Clone)]
pub struct HubModule {
    pub id: &'static str,
    pub title: &'static str,
    pub order: i32,
    pub on_init: Option<InitHook>,
}

/// Every built-in module, sorted by `order`.
pub fn builtin_modules() -> Vec<HubModule> {
    let mut modules = vec![spelling::module(), prompts::module()];
    modules.sort_by_key(|m| m.order);
    debug!(count = modules.len(), "Loaded built-in modules");
    modules
}
