//! Selected text operations on the focused application
//!
//! - `get_selection()`: uses the `get-selected-text` crate (accessibility API
//!   first, copy-shortcut fallback)
//! - `replace_selection()`: clipboard paste through the [`TextInjector`]
//!
//! On macOS both need Accessibility permission.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use get_selected_text::get_selected_text as get_selected_text_impl;
use tracing::{debug, info, instrument, warn};

use crate::text_injector::TextInjector;

/// Text currently highlighted in the focused application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub text: String,
}

impl Selection {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Read/replace capability over the current selection.
pub trait SelectionAccess: Send + Sync {
    fn get_selection(&self) -> Result<Selection>;
    fn replace_selection(&self, text: &str) -> Result<()>;
}

/// OS-backed selection access.
pub struct SystemSelection {
    injector: Arc<TextInjector>,
}

impl SystemSelection {
    pub fn new(injector: Arc<TextInjector>) -> Self {
        Self { injector }
    }
}

impl SelectionAccess for SystemSelection {
    #[instrument(skip_all)]
    fn get_selection(&self) -> Result<Selection> {
        // The fallback path synthesizes a copy shortcut
        let _token = self.injector.guard().hold();

        match get_selected_text_impl() {
            Ok(text) => {
                if text.is_empty() {
                    debug!("No text selected (empty result)");
                } else {
                    info!(text_len = text.len(), "Got selected text");
                }
                Ok(Selection { text })
            }
            Err(e) => {
                warn!(error = %e, "Failed to get selected text");
                Err(anyhow!("Failed to get selected text: {}", e))
            }
        }
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn replace_selection(&self, text: &str) -> Result<()> {
        self.injector.paste(text)?;
        info!("Replaced selected text via clipboard");
        Ok(())
    }
}
