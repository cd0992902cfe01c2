//! Hotkey combo strings.
//!
//! This module provides:
//! - `Shortcut` - A parsed combo (modifiers + key) such as `ctrl+alt+1`
//! - `ShortcutParseError` - Detailed parse errors for user feedback
//! - Canonical identity used to detect duplicate bindings
//!
//! # Example
//!
//! ```ignore
//! use ai_hub::shortcuts::Shortcut;
//!
//! let shortcut = Shortcut::parse("Alt+Ctrl+1")?;
//! assert_eq!(shortcut.to_canonical_string(), "alt+ctrl+1");
//! ```

mod types;

pub use types::{canonicalize_key, is_known_key, Modifiers, Shortcut, ShortcutParseError};
