//! OS input hook layer
//!
//! Two capabilities sit at this seam:
//! - [`InputHook`] installs hotkey bindings
//! - [`KeystrokeSource`] streams typed characters to subscribers
//!
//! Delivery threads never run user callbacks. They push a [`HookEvent`] onto
//! a channel and a single dispatcher thread invokes the callback.
//!
//! # Module Structure
//!
//! - `global` - consuming hotkeys through `global-hotkey`
//! - `listener` - passive `rdev` listener (keystroke stream + pass-through hotkeys)
//! - `system` - [`SystemHook`], which combines both behind one dispatcher

mod global;
mod listener;
mod system;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{panic_message, HubError};
use crate::shortcuts::Shortcut;

pub use system::SystemHook;

/// Zero-argument hotkey action
pub type HotkeyCallback = Arc<dyn Fn() + Send + Sync>;

/// A combo bound to an action. Immutable once created.
#[derive(Clone)]
pub struct HotkeyBinding {
    /// The combo as written by whoever registered it
    pub combo: String,
    pub shortcut: Shortcut,
    pub callback: HotkeyCallback,
    /// Consume the keystroke so the foreground app never sees it
    pub suppress: bool,
    /// Fire on key-up instead of key-down
    pub trigger_on_release: bool,
}

impl HotkeyBinding {
    pub fn new(
        combo: &str,
        callback: HotkeyCallback,
        suppress: bool,
        trigger_on_release: bool,
    ) -> Result<Self, HubError> {
        let shortcut = Shortcut::parse(combo).map_err(|source| HubError::InvalidCombo {
            combo: combo.to_string(),
            source,
        })?;
        Ok(Self {
            combo: combo.to_string(),
            shortcut,
            callback,
            suppress,
            trigger_on_release,
        })
    }

    /// Identity used for duplicate detection and dispatch lookup
    pub fn canonical(&self) -> String {
        self.shortcut.to_canonical_string()
    }

    /// Run the callback, containing any panic.
    pub fn invoke(&self) {
        invoke_callback(&self.combo, &self.callback);
    }
}

impl fmt::Debug for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyBinding")
            .field("combo", &self.combo)
            .field("suppress", &self.suppress)
            .field("trigger_on_release", &self.trigger_on_release)
            .finish()
    }
}

pub(crate) fn invoke_callback(combo: &str, callback: &HotkeyCallback) {
    debug!(combo, "Hotkey fired");
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback())) {
        error!(
            combo,
            panic = %panic_message(payload.as_ref()),
            "Hotkey callback panicked"
        );
    }
}

/// One event from the keystroke stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystrokeEvent {
    /// A printable character was typed
    Char(char),
    /// The last typed character was deleted
    Backspace,
    /// The caret moved (navigation key, Enter, click): typed history is stale
    Reset,
}

/// Event pushed by a delivery thread for the hotkey dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// The binding with this canonical combo reached its firing edge
    HotkeyFired(String),
}

/// Receiving end of a keystroke stream.
pub struct KeystrokeSubscription {
    pub id: u64,
    pub events: async_channel::Receiver<KeystrokeEvent>,
}

/// Installs hotkey bindings with the OS.
pub trait InputHook: Send + Sync {
    fn add_binding(&self, binding: &HotkeyBinding) -> Result<(), HubError>;
}

/// Streams typed characters from the whole system.
pub trait KeystrokeSource: Send + Sync {
    fn subscribe(&self) -> Result<KeystrokeSubscription, HubError>;
    /// Stop delivery; the subscription's channel closes.
    fn unsubscribe(&self, id: u64);
}
