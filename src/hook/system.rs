//! [`SystemHook`]: the production input hook.
//!
//! Bindings with `suppress = true` go to `global-hotkey` so the OS consumes
//! the keystroke. Everything else, and the keystroke stream, is served by
//! the passive `rdev` listener. Both push [`HookEvent`]s onto one channel;
//! the `hotkey-dispatch` thread turns them into callback invocations.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::global::{ensure_consuming_supported, GlobalBackend, CONSUMING_SUPPORTED};
use super::listener::PassiveListener;
use super::{
    invoke_callback, HookEvent, HotkeyBinding, HotkeyCallback, InputHook, KeystrokeSource,
    KeystrokeSubscription,
};
use crate::error::HubError;
use crate::text_injector::InjectionGuard;

pub struct SystemHook {
    callbacks: Arc<Mutex<HashMap<String, HotkeyCallback>>>,
    events: async_channel::Sender<HookEvent>,
    stop_tx: async_channel::Sender<()>,
    stop_rx: async_channel::Receiver<()>,
    /// Started on the first consuming binding
    global: Mutex<Option<GlobalBackend>>,
    listener: PassiveListener,
}

impl SystemHook {
    pub fn new(guard: InjectionGuard) -> Result<Self, HubError> {
        let (events, events_rx) = async_channel::unbounded::<HookEvent>();
        let (stop_tx, stop_rx) = async_channel::bounded::<()>(1);
        let callbacks: Arc<Mutex<HashMap<String, HotkeyCallback>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let dispatch_callbacks = Arc::clone(&callbacks);
        thread::Builder::new()
            .name("hotkey-dispatch".to_string())
            .spawn(move || run_dispatcher(events_rx, dispatch_callbacks))
            .map_err(|e| HubError::Hook(format!("failed to spawn hotkey dispatcher: {}", e)))?;

        Ok(Self {
            callbacks,
            listener: PassiveListener::new(guard, events.clone()),
            events,
            stop_tx,
            stop_rx,
            global: Mutex::new(None),
        })
    }

    fn register_global(&self, binding: &HotkeyBinding) -> Result<(), HubError> {
        ensure_consuming_supported(binding, CONSUMING_SUPPORTED)?;
        let mut global = self.global.lock();
        if global.is_none() {
            *global = Some(GlobalBackend::start(
                self.events.clone(),
                self.stop_rx.clone(),
            )?);
        }
        match global.as_ref() {
            Some(backend) => backend.register(binding),
            None => Err(HubError::Hook("hotkey backend unavailable".to_string())),
        }
    }

    /// Stop dispatching. Installed bindings become inert.
    pub fn shutdown(&self) {
        if self.events.close() {
            info!("Input hook shut down");
        }
        self.stop_tx.close();
    }
}

impl Drop for SystemHook {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl InputHook for SystemHook {
    fn add_binding(&self, binding: &HotkeyBinding) -> Result<(), HubError> {
        let canonical = binding.canonical();
        self.callbacks
            .lock()
            .insert(canonical.clone(), Arc::clone(&binding.callback));

        let result = if binding.suppress {
            self.register_global(binding)
        } else {
            self.listener.add_binding(binding)
        };

        if result.is_err() {
            self.callbacks.lock().remove(&canonical);
        }
        result
    }
}

impl KeystrokeSource for SystemHook {
    fn subscribe(&self) -> Result<KeystrokeSubscription, HubError> {
        self.listener.subscribe()
    }

    fn unsubscribe(&self, id: u64) {
        self.listener.unsubscribe(id);
    }
}

fn run_dispatcher(
    events: async_channel::Receiver<HookEvent>,
    callbacks: Arc<Mutex<HashMap<String, HotkeyCallback>>>,
) {
    while let Ok(event) = events.recv_blocking() {
        match event {
            HookEvent::HotkeyFired(combo) => {
                // Clone out so the lock is not held while the callback runs
                let callback = callbacks.lock().get(&combo).cloned();
                match callback {
                    Some(callback) => invoke_callback(&combo, &callback),
                    None => debug!(combo = %combo, "No callback for fired hotkey"),
                }
            }
        }
    }
    debug!("Hotkey dispatcher exiting");
}
