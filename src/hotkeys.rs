//! Hotkey registry: register many, then activate once.
//!
//! Before [`HotkeyRegistry::activate`] bindings are only queued. Activation
//! installs them in registration order; bindings registered afterwards are
//! installed immediately with the same parameters.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::HubError;
use crate::hook::{HotkeyBinding, InputHook};

#[derive(Default)]
struct RegistryState {
    active: bool,
    pending: Vec<HotkeyBinding>,
    installed: Vec<HotkeyBinding>,
    /// Canonical combos of every pending or installed binding
    combos: HashSet<String>,
}

pub struct HotkeyRegistry {
    hook: Arc<dyn InputHook>,
    state: Mutex<RegistryState>,
}

impl HotkeyRegistry {
    pub fn new(hook: Arc<dyn InputHook>) -> Self {
        Self {
            hook,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Register with the usual options: pass-through, fire on release.
    pub fn register<F>(&self, combo: &str, callback: F) -> Result<(), HubError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register_with(combo, callback, false, true)
    }

    pub fn register_with<F>(
        &self,
        combo: &str,
        callback: F,
        suppress: bool,
        trigger_on_release: bool,
    ) -> Result<(), HubError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let binding = HotkeyBinding::new(combo, Arc::new(callback), suppress, trigger_on_release)?;
        let canonical = binding.canonical();

        let mut state = self.state.lock();
        if state.combos.contains(&canonical) {
            return Err(HubError::DuplicateBinding(canonical));
        }

        if !state.active {
            debug!(combo, "Queued hotkey until activation");
            state.combos.insert(canonical);
            state.pending.push(binding);
            return Ok(());
        }

        self.hook.add_binding(&binding)?;
        info!(combo, "Installed hotkey");
        state.combos.insert(canonical);
        state.installed.push(binding);
        Ok(())
    }

    /// Install every pending binding. Idempotent.
    ///
    /// The registry is active afterwards even if some installs failed; the
    /// failures are returned together.
    pub fn activate(&self) -> Result<(), HubError> {
        let mut state = self.state.lock();
        if state.active {
            return Ok(());
        }
        state.active = true;

        let pending = std::mem::take(&mut state.pending);
        let mut failures = Vec::new();
        for binding in pending {
            match self.hook.add_binding(&binding) {
                Ok(()) => state.installed.push(binding),
                Err(e) => {
                    warn!(combo = %binding.combo, error = %e, "Failed to install hotkey");
                    state.combos.remove(&binding.canonical());
                    failures.push((binding.combo.clone(), e.to_string()));
                }
            }
        }

        info!(
            installed = state.installed.len(),
            failed = failures.len(),
            "Hotkey registry activated"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HubError::Activation(failures))
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Combos as registered, in install order.
    pub fn installed_combos(&self) -> Vec<String> {
        self.state
            .lock()
            .installed
            .iter()
            .map(|b| b.combo.clone())
            .collect()
    }
}
