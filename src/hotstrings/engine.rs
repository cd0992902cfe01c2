//! Hotstring engine: keystroke subscription, matching and dispatch.
//!
//! `Stopped -> Listening(enabled)`. [`HotstringEngine::start`] subscribes to
//! the keystroke source once and runs the `hotstring-dispatch` thread.
//! Static expansions run inline on that thread; async ones go to the task
//! spawner. Provider failures and panics are logged and never escape.
//!
//! When a held trigger fires on an async provider, the characters typed
//! after it are put back before the worker runs, so `;s.` ends up as `.`
//! followed by the expansion. The mutator only erases backwards from the
//! caret, so the trigger cannot be removed while keeping what follows it.
//! The result lands wherever focus is when the worker finishes.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::matcher::{Expansion, HotstringMatcher};
use super::provider::{ExpansionProvider, StaticText};
use super::triggers::TriggerTable;
use crate::error::{panic_message, HubError};
use crate::hook::{KeystrokeEvent, KeystrokeSource};
use crate::tasks::{TaskHandle, TaskSpawner};
use crate::text_injector::TextMutator;

struct Listening {
    subscription_id: u64,
    dispatcher: JoinHandle<()>,
}

struct EngineInner {
    triggers: RwLock<TriggerTable>,
    matcher: Mutex<HotstringMatcher>,
    enabled: AtomicBool,
    buffer_size: usize,
    source: Arc<dyn KeystrokeSource>,
    mutator: Arc<dyn TextMutator>,
    spawner: TaskSpawner,
    listening: Mutex<Option<Listening>>,
}

/// Cheap-to-clone handle; clones share one engine.
#[derive(Clone)]
pub struct HotstringEngine {
    inner: Arc<EngineInner>,
}

impl HotstringEngine {
    pub fn new(
        buffer_size: usize,
        enabled: bool,
        source: Arc<dyn KeystrokeSource>,
        mutator: Arc<dyn TextMutator>,
        spawner: TaskSpawner,
    ) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            inner: Arc::new(EngineInner {
                triggers: RwLock::new(TriggerTable::new()),
                matcher: Mutex::new(HotstringMatcher::new(buffer_size)),
                enabled: AtomicBool::new(enabled),
                buffer_size,
                source,
                mutator,
                spawner,
                listening: Mutex::new(None),
            }),
        }
    }

    /// Register a literal or computed expansion. Safe before or after `start`.
    pub fn register_text(
        &self,
        trigger: &str,
        value: impl Into<StaticText>,
    ) -> Result<(), HubError> {
        self.register(trigger, ExpansionProvider::Static(value.into()))
    }

    /// Register a producer that may block. It always runs on a worker.
    pub fn register_ai<F>(&self, trigger: &str, handler: F) -> Result<(), HubError>
    where
        F: Fn() -> Result<String> + Send + Sync + 'static,
    {
        self.register(trigger, ExpansionProvider::Async(Arc::new(handler)))
    }

    pub fn register(&self, trigger: &str, provider: ExpansionProvider) -> Result<(), HubError> {
        let len = trigger.chars().count();
        if len > self.inner.buffer_size {
            return Err(HubError::Config(format!(
                "hotstring trigger '{}' is longer than the {}-character buffer",
                trigger, self.inner.buffer_size
            )));
        }
        let kind = provider.kind();
        self.inner.triggers.write().insert(trigger, provider)?;
        debug!(trigger, kind, "Registered hotstring");
        Ok(())
    }

    /// Subscribe to the keystroke stream. Calling again is a no-op.
    pub fn start(&self) -> Result<(), HubError> {
        let mut listening = self.inner.listening.lock();
        if listening.is_some() {
            debug!("Hotstring engine already listening");
            return Ok(());
        }

        let subscription = self.inner.source.subscribe()?;
        let subscription_id = subscription.id;
        let engine = self.clone();
        let spawned = thread::Builder::new()
            .name("hotstring-dispatch".to_string())
            .spawn(move || {
                while let Ok(event) = subscription.events.recv_blocking() {
                    engine.handle_event(event);
                }
                debug!("Hotstring dispatcher exiting");
            });

        let dispatcher = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.inner.source.unsubscribe(subscription_id);
                return Err(HubError::Hook(format!(
                    "failed to spawn hotstring dispatcher: {}",
                    e
                )));
            }
        };

        *listening = Some(Listening {
            subscription_id,
            dispatcher,
        });
        info!(
            triggers = self.trigger_count(),
            enabled = self.enabled(),
            "Hotstring engine listening"
        );
        Ok(())
    }

    /// Unsubscribe and wait for the dispatcher thread to finish.
    pub fn shutdown(&self) {
        let listening = self.inner.listening.lock().take();
        if let Some(listening) = listening {
            self.inner.source.unsubscribe(listening.subscription_id);
            if listening.dispatcher.thread().id() != thread::current().id()
                && listening.dispatcher.join().is_err()
            {
                warn!("Hotstring dispatcher panicked");
            }
            info!("Hotstring engine stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.inner.listening.lock().is_some()
    }

    /// Toggle matching. Either way the buffer starts over.
    pub fn set_enabled(&self, enabled: bool) {
        let mut matcher = self.inner.matcher.lock();
        matcher.reset();
        self.inner.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "Hotstrings toggled");
    }

    pub fn enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn trigger_count(&self) -> usize {
        self.inner.triggers.read().len()
    }

    /// `(trigger, provider kind)` sorted by trigger.
    pub fn list_triggers(&self) -> Vec<(String, &'static str)> {
        self.inner.triggers.read().list()
    }

    pub fn buffer_contents(&self) -> String {
        self.inner.matcher.lock().contents()
    }

    /// Feed one keystroke event through matching and dispatch.
    ///
    /// Returns the worker handle when an async expansion was spawned.
    pub fn handle_event(&self, event: KeystrokeEvent) -> Option<TaskHandle> {
        let expansion = {
            let mut matcher = self.inner.matcher.lock();
            if !self.enabled() {
                return None;
            }
            let triggers = self.inner.triggers.read();
            matcher.process(event, &triggers)?
        };
        self.dispatch(expansion)
    }

    fn dispatch(&self, expansion: Expansion) -> Option<TaskHandle> {
        info!(trigger = %expansion.trigger, kind = expansion.provider.kind(), "Hotstring matched");
        let mutator = &self.inner.mutator;

        if let Err(e) = mutator.erase(expansion.erase) {
            error!(trigger = %expansion.trigger, error = %e, "Failed to erase trigger");
            return None;
        }

        match expansion.provider {
            ExpansionProvider::Static(text) => {
                let produced = run_producer(&expansion.trigger, || text.produce());
                let mut out = produced.unwrap_or_default();
                out.push_str(&expansion.retype);
                if !out.is_empty() {
                    if let Err(e) = mutator.inject(&out) {
                        error!(trigger = %expansion.trigger, error = %e, "Failed to inject expansion");
                    }
                }
                None
            }
            ExpansionProvider::Async(producer) => {
                // Put back what was typed after a held trigger right away;
                // the expansion follows it
                if !expansion.retype.is_empty() {
                    if let Err(e) = mutator.inject(&expansion.retype) {
                        error!(trigger = %expansion.trigger, error = %e, "Failed to retype");
                    }
                }

                let mutator = Arc::clone(mutator);
                let trigger = expansion.trigger;
                self.inner.spawner.spawn(&format!("hotstring{}", trigger), move |token| {
                    let Some(text) = run_producer(&trigger, || producer()) else {
                        return Ok(());
                    };
                    if token.is_cancelled() {
                        debug!(trigger = %trigger, "Shutting down, dropping expansion");
                        return Ok(());
                    }
                    // Lands wherever focus is now
                    mutator.inject(&text)?;
                    info!(trigger = %trigger, text_len = text.len(), "Async expansion injected");
                    Ok(())
                })
            }
        }
    }
}

/// Run a provider, containing errors and panics. `None` means nothing to
/// inject: failure or blank output.
fn run_producer<F>(trigger: &str, produce: F) -> Option<String>
where
    F: FnOnce() -> Result<String>,
{
    let failure = match catch_unwind(AssertUnwindSafe(produce)) {
        Ok(Ok(text)) if text.trim().is_empty() => {
            debug!(trigger, "Provider returned blank text");
            return None;
        }
        Ok(Ok(text)) => return Some(text),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };
    let err = HubError::ProviderFailure {
        trigger: trigger.to_string(),
        message: failure,
    };
    warn!(error = %err, "Expansion provider failed");
    None
}
