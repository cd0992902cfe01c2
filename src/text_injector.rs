//! Foreground text mutation: erase typed characters, inject replacement text.
//!
//! Injection targets whatever currently has input focus. Nothing verifies
//! that focus is unchanged since a trigger fired, so an async expansion
//! that completes after the user switched windows lands in the new window.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::{debug, instrument, warn};

use crate::config::{InjectMethod, InjectorSettings};

/// Erase/inject capability over the focused application.
pub trait TextMutator: Send + Sync {
    /// Send `count` backspaces.
    fn erase(&self, count: usize) -> Result<()>;
    /// Insert `text` at the caret (replacing any selection).
    fn inject(&self, text: &str) -> Result<()>;
}

/// Counts in-progress synthetic input so the keystroke listener can ignore
/// the events we generate ourselves.
#[derive(Debug, Clone, Default)]
pub struct InjectionGuard {
    depth: Arc<AtomicUsize>,
}

impl InjectionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark synthetic input as in progress until the token is dropped.
    pub fn hold(&self) -> InjectionToken {
        self.depth.fetch_add(1, Ordering::SeqCst);
        InjectionToken {
            depth: Arc::clone(&self.depth),
        }
    }

    pub fn is_active(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

pub struct InjectionToken {
    depth: Arc<AtomicUsize>,
}

impl Drop for InjectionToken {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct InjectorConfig {
    pub method: InjectMethod,
    pub key_delay: Duration,
    pub settle_delay: Duration,
    pub restore_clipboard: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        InjectorConfig::from(&InjectorSettings::default())
    }
}

impl From<&InjectorSettings> for InjectorConfig {
    fn from(settings: &InjectorSettings) -> Self {
        InjectorConfig {
            method: settings.method,
            key_delay: Duration::from_millis(settings.key_delay_ms),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            restore_clipboard: settings.restore_clipboard,
        }
    }
}

/// Platform paste modifier
#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Key = Key::Control;

/// enigo + arboard implementation of [`TextMutator`].
pub struct TextInjector {
    config: InjectorConfig,
    guard: InjectionGuard,
}

impl TextInjector {
    pub fn new(config: InjectorConfig, guard: InjectionGuard) -> Self {
        Self { config, guard }
    }

    pub fn guard(&self) -> &InjectionGuard {
        &self.guard
    }

    fn enigo() -> Result<Enigo> {
        Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("Failed to create input synthesizer: {e}"))
    }

    fn click(enigo: &mut Enigo, key: Key) -> Result<()> {
        enigo
            .key(key, Direction::Click)
            .map_err(|e| anyhow!("Failed to send key {key:?}: {e}"))
    }

    /// Send the platform paste shortcut.
    fn send_paste(enigo: &mut Enigo) -> Result<()> {
        enigo
            .key(PASTE_MODIFIER, Direction::Press)
            .map_err(|e| anyhow!("Failed to press paste modifier: {e}"))?;
        let pasted = Self::click(enigo, Key::Unicode('v'));
        // Always release the modifier, even if the V press failed
        let released = enigo
            .key(PASTE_MODIFIER, Direction::Release)
            .map_err(|e| anyhow!("Failed to release paste modifier: {e}"));
        pasted.and(released)
    }

    /// Clipboard round trip: save, set, paste, restore.
    pub fn paste(&self, text: &str) -> Result<()> {
        let _token = self.guard.hold();
        let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;

        let original = if self.config.restore_clipboard {
            clipboard.get_text().ok()
        } else {
            None
        };
        debug!(had_original = original.is_some(), "Saved original clipboard");

        clipboard
            .set_text(text)
            .context("Failed to set clipboard text")?;
        thread::sleep(self.config.key_delay);

        let mut enigo = Self::enigo()?;
        Self::send_paste(&mut enigo)?;

        thread::sleep(self.config.settle_delay);

        if let Some(original_text) = original {
            if let Err(e) = clipboard.set_text(&original_text) {
                warn!(error = %e, "Failed to restore original clipboard");
            } else {
                debug!("Restored original clipboard");
            }
        }
        Ok(())
    }

    /// Synthesize each character.
    pub fn type_text(&self, text: &str) -> Result<()> {
        let _token = self.guard.hold();
        let mut enigo = Self::enigo()?;
        let mut buf = [0u8; 4];
        for c in text.chars() {
            enigo
                .text(c.encode_utf8(&mut buf))
                .map_err(|e| anyhow!("Failed to type text: {e}"))?;
            if !self.config.key_delay.is_zero() {
                thread::sleep(self.config.key_delay);
            }
        }
        Ok(())
    }
}

impl TextMutator for TextInjector {
    #[instrument(skip(self))]
    fn erase(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let _token = self.guard.hold();
        let mut enigo = Self::enigo()?;
        for _ in 0..count {
            Self::click(&mut enigo, Key::Backspace)?;
            if !self.config.key_delay.is_zero() {
                thread::sleep(self.config.key_delay);
            }
        }
        debug!(count, "Erased characters");
        Ok(())
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn inject(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        match self.config.method {
            InjectMethod::Paste => self.paste(text),
            InjectMethod::Type => self.type_text(text),
        }
    }
}
