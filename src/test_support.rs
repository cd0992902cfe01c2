//! In-process fakes for every capability trait.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;

use crate::ai::ChatClient;
use crate::error::HubError;
use crate::hook::{HotkeyBinding, InputHook, KeystrokeEvent, KeystrokeSource, KeystrokeSubscription};
use crate::runner::ResultSink;
use crate::selected_text::{Selection, SelectionAccess};
use crate::shortcuts::Shortcut;
use crate::text_injector::TextMutator;

/// Records installs and lets tests "press" combos.
#[derive(Default)]
pub struct FakeHook {
    installed: Mutex<Vec<HotkeyBinding>>,
    rejected: Mutex<HashSet<String>>,
}

impl FakeHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_count(&self) -> usize {
        self.installed.lock().len()
    }

    pub fn installed(&self) -> Vec<HotkeyBinding> {
        self.installed.lock().clone()
    }

    /// Fire every installed binding matching `combo`.
    pub fn press(&self, combo: &str) {
        let canonical = canonical(combo);
        let matching: Vec<HotkeyBinding> = self
            .installed
            .lock()
            .iter()
            .filter(|b| b.canonical() == canonical)
            .cloned()
            .collect();
        for binding in matching {
            binding.invoke();
        }
    }

    /// Make installs of `combo` fail.
    pub fn reject(&self, combo: &str) {
        self.rejected.lock().insert(canonical(combo));
    }

    pub fn accept_all(&self) {
        self.rejected.lock().clear();
    }
}

fn canonical(combo: &str) -> String {
    Shortcut::parse(combo)
        .map(|s| s.to_canonical_string())
        .unwrap_or_else(|_| combo.to_string())
}

impl InputHook for FakeHook {
    fn add_binding(&self, binding: &HotkeyBinding) -> Result<(), HubError> {
        if self.rejected.lock().contains(&binding.canonical()) {
            return Err(HubError::Hook(format!("{} is taken", binding.combo)));
        }
        self.installed.lock().push(binding.clone());
        Ok(())
    }
}

/// Keystroke source driven by the test.
#[derive(Default)]
pub struct FakeKeystrokes {
    next_id: AtomicU64,
    subscribes: AtomicUsize,
    subscribers: Mutex<HashMap<u64, async_channel::Sender<KeystrokeEvent>>>,
    unavailable: AtomicBool,
}

impl FakeKeystrokes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `subscribe` fail like a listener that could not start.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn active_subscribers(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn send(&self, event: KeystrokeEvent) {
        for tx in self.subscribers.lock().values() {
            let _ = tx.try_send(event);
        }
    }

    pub fn send_text(&self, text: &str) {
        for c in text.chars() {
            self.send(KeystrokeEvent::Char(c));
        }
    }
}

impl KeystrokeSource for FakeKeystrokes {
    fn subscribe(&self) -> Result<KeystrokeSubscription, HubError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HubError::Hook("input listener unavailable".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = async_channel::unbounded();
        self.subscribers.lock().insert(id, tx);
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        Ok(KeystrokeSubscription { id, events: rx })
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().remove(&id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutatorOp {
    Erase(usize),
    Inject(String),
}

/// Records erase/inject calls in order.
#[derive(Default)]
pub struct RecordingMutator {
    ops: Mutex<Vec<MutatorOp>>,
}

impl RecordingMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<MutatorOp> {
        self.ops.lock().clone()
    }
}

impl TextMutator for RecordingMutator {
    fn erase(&self, count: usize) -> Result<()> {
        self.ops.lock().push(MutatorOp::Erase(count));
        Ok(())
    }

    fn inject(&self, text: &str) -> Result<()> {
        self.ops.lock().push(MutatorOp::Inject(text.to_string()));
        Ok(())
    }
}

/// Selection with fixed text; counts reads and records replacements.
pub struct FakeSelection {
    text: Option<String>,
    reads: AtomicUsize,
    replaced: Mutex<Vec<String>>,
}

impl FakeSelection {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            reads: AtomicUsize::new(0),
            replaced: Mutex::new(Vec::new()),
        }
    }

    /// Every read fails.
    pub fn failing() -> Self {
        Self {
            text: None,
            reads: AtomicUsize::new(0),
            replaced: Mutex::new(Vec::new()),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn replaced(&self) -> Vec<String> {
        self.replaced.lock().clone()
    }
}

impl SelectionAccess for FakeSelection {
    fn get_selection(&self) -> Result<Selection> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.text
            .as_deref()
            .map(Selection::new)
            .ok_or_else(|| anyhow!("selection unavailable"))
    }

    fn replace_selection(&self, text: &str) -> Result<()> {
        self.replaced.lock().push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCall {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
}

/// Chat client with a canned reply.
pub struct FakeChat {
    reply: Result<String, String>,
    calls: Mutex<Vec<ChatCall>>,
}

impl FakeChat {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().clone()
    }
}

impl ChatClient for FakeChat {
    fn chat(&self, system: Option<&str>, user: &str, temperature: f32) -> Result<String> {
        self.calls.lock().push(ChatCall {
            system: system.map(str::to_string),
            user: user.to_string(),
            temperature,
        });
        self.reply.clone().map_err(|e| anyhow!(e))
    }
}

/// Records `(title, text)` pairs.
#[derive(Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().clone()
    }
}

impl ResultSink for RecordingSink {
    fn show_text(&self, title: &str, text: &str) {
        self.shown
            .lock()
            .push((title.to_string(), text.to_string()));
    }
}
