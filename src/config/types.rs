//! Configuration type definitions
//!
//! This module contains all the struct and enum definitions for configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

// ============================================
// HOTKEYS
// ============================================

/// Application-level hotkeys (combo strings such as `ctrl+alt+h`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeySettings {
    /// Toggle hotstring matching on/off (default: ctrl+alt+h)
    #[serde(default = "default_toggle_hotstrings")]
    pub toggle_hotstrings: String,
    /// Fix spelling of the current selection (default: ctrl+alt+s)
    #[serde(default = "default_spelling")]
    pub spelling: String,
    /// Quit the hub (default: ctrl+alt+q)
    #[serde(default = "default_quit")]
    pub quit: String,
}

fn default_toggle_hotstrings() -> String {
    DEFAULT_TOGGLE_HOTSTRINGS_HOTKEY.to_string()
}
fn default_spelling() -> String {
    DEFAULT_SPELLING_HOTKEY.to_string()
}
fn default_quit() -> String {
    DEFAULT_QUIT_HOTKEY.to_string()
}

impl Default for HotkeySettings {
    fn default() -> Self {
        HotkeySettings {
            toggle_hotstrings: default_toggle_hotstrings(),
            spelling: default_spelling(),
            quit: default_quit(),
        }
    }
}

// ============================================
// HOTSTRINGS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotstringSettings {
    /// Number of recently typed characters kept for matching (default: 32)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Whether matching is on at startup (default: true)
    #[serde(default = "default_hotstrings_enabled")]
    pub enabled_by_default: bool,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}
fn default_hotstrings_enabled() -> bool {
    DEFAULT_HOTSTRINGS_ENABLED
}

impl Default for HotstringSettings {
    fn default() -> Self {
        HotstringSettings {
            buffer_size: DEFAULT_BUFFER_SIZE,
            enabled_by_default: DEFAULT_HOTSTRINGS_ENABLED,
        }
    }
}

// ============================================
// AI
// ============================================

/// Chat-completion client settings. The API key is read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Custom endpoint base (e.g. a proxy); `/chat/completions` is appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}
fn default_ai_timeout_secs() -> u64 {
    DEFAULT_AI_TIMEOUT_SECS
}

impl Default for AiSettings {
    fn default() -> Self {
        AiSettings {
            model: default_ai_model(),
            base_url: None,
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

// ============================================
// PATHS
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSettings {
    /// On-disk prompt catalog (JSON). Built-in catalog when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<String>,
}

impl PathSettings {
    /// Prompt catalog path with `~` expanded.
    pub fn prompts_path(&self) -> Option<PathBuf> {
        self.prompts
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    }
}

// ============================================
// TEXT INJECTION
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectMethod {
    /// Set the clipboard and send the paste shortcut
    #[default]
    Paste,
    /// Synthesize each character
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectorSettings {
    #[serde(default)]
    pub method: InjectMethod,
    /// Pause between synthesized keys (default: 5)
    #[serde(default = "default_key_delay_ms")]
    pub key_delay_ms: u64,
    /// Pause after a paste before the clipboard is restored (default: 50)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_restore_clipboard")]
    pub restore_clipboard: bool,
}

fn default_key_delay_ms() -> u64 {
    DEFAULT_KEY_DELAY_MS
}
fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}
fn default_restore_clipboard() -> bool {
    DEFAULT_RESTORE_CLIPBOARD
}

impl Default for InjectorSettings {
    fn default() -> Self {
        InjectorSettings {
            method: InjectMethod::default(),
            key_delay_ms: DEFAULT_KEY_DELAY_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            restore_clipboard: DEFAULT_RESTORE_CLIPBOARD,
        }
    }
}

// ============================================
// MAPPINGS
// ============================================

/// A literal hotstring from the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetConfig {
    pub trigger: String,
    pub text: String,
}

/// A hotstring that runs a prompt on the current selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptHotstring {
    pub trigger: String,
    pub slug: String,
}

/// A hotkey that runs a prompt on the current selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptShortcut {
    pub combo: String,
    pub slug: String,
}

fn default_prompt_hotstrings() -> Vec<PromptHotstring> {
    DEFAULT_PROMPT_HOTSTRINGS
        .iter()
        .map(|(trigger, slug)| PromptHotstring {
            trigger: trigger.to_string(),
            slug: slug.to_string(),
        })
        .collect()
}

fn default_prompt_shortcuts() -> Vec<PromptShortcut> {
    DEFAULT_PROMPT_SHORTCUTS
        .iter()
        .map(|(combo, slug)| PromptShortcut {
            combo: combo.to_string(),
            slug: slug.to_string(),
        })
        .collect()
}

// ============================================
// SETTINGS
// ============================================

/// Top-level settings, loaded from `~/.ai-hub/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub hotkeys: HotkeySettings,
    #[serde(default)]
    pub hotstrings: HotstringSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub injector: InjectorSettings,
    /// Extra literal hotstrings on top of the built-ins
    #[serde(default)]
    pub snippets: Vec<SnippetConfig>,
    #[serde(default = "default_prompt_hotstrings")]
    pub prompt_hotstrings: Vec<PromptHotstring>,
    #[serde(default = "default_prompt_shortcuts")]
    pub prompt_shortcuts: Vec<PromptShortcut>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hotkeys: HotkeySettings::default(),
            hotstrings: HotstringSettings::default(),
            ai: AiSettings::default(),
            paths: PathSettings::default(),
            injector: InjectorSettings::default(),
            snippets: Vec::new(),
            prompt_hotstrings: default_prompt_hotstrings(),
            prompt_shortcuts: default_prompt_shortcuts(),
        }
    }
}
