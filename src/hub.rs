//! Hub orchestrator
//!
//! Owns every service and runs the lifecycle:
//!
//! 1. [`Hub::new`] builds the catalog, spawner, registry, engine and runner
//! 2. [`Hub::init`] registers snippets, module contributions and the quit hotkey
//! 3. [`Hub::start`] starts the engine and activates the registry once
//! 4. [`Hub::shutdown`] stops the engine and refuses new jobs
//!
//! Nothing here is a process-wide singleton; the binary owns one `Hub`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ai::{ChatClient, OpenAiProvider, ProviderConfig};
use crate::config::Settings;
use crate::error::{HubError, ResultExt};
use crate::hook::{InputHook, KeystrokeSource, SystemHook};
use crate::hotkeys::HotkeyRegistry;
use crate::hotstrings::{register_snippets, AiHotstrings, HotstringEngine};
use crate::modules::{builtin_modules, ModuleApi};
use crate::prompts::PromptCatalog;
use crate::runner::{ConsoleResultSink, PromptRunner, ResultSink};
use crate::selected_text::{SelectionAccess, SystemSelection};
use crate::tasks::TaskSpawner;
use crate::text_injector::{InjectionGuard, InjectorConfig, TextInjector, TextMutator};

const TOGGLE_TITLE: &str = "Hotstrings";

/// External capabilities the hub is wired against.
#[derive(Clone)]
pub struct HubServices {
    pub hook: Arc<dyn InputHook>,
    pub keystrokes: Arc<dyn KeystrokeSource>,
    pub mutator: Arc<dyn TextMutator>,
    pub selection: Arc<dyn SelectionAccess>,
    pub client: Arc<dyn ChatClient>,
    pub sink: Arc<dyn ResultSink>,
}

impl HubServices {
    /// OS-backed services. The returned [`SystemHook`] should be shut down
    /// after the hub.
    pub fn system(settings: &Settings) -> Result<(Self, Arc<SystemHook>), HubError> {
        let guard = InjectionGuard::new();
        let hook = Arc::new(SystemHook::new(guard.clone())?);
        let injector = Arc::new(TextInjector::new(
            InjectorConfig::from(&settings.injector),
            guard,
        ));

        let provider_config = ProviderConfig::from_environment(&settings.ai);
        if !provider_config.has_valid_key() {
            warn!("No OpenAI API key found; AI prompts will fail until one is set");
        }

        let services = Self {
            hook: hook.clone(),
            keystrokes: hook.clone(),
            mutator: injector.clone(),
            selection: Arc::new(SystemSelection::new(injector)),
            client: Arc::new(OpenAiProvider::new(provider_config)),
            sink: Arc::new(ConsoleResultSink),
        };
        Ok((services, hook))
    }
}

pub struct Hub {
    settings: Settings,
    catalog: Arc<PromptCatalog>,
    spawner: TaskSpawner,
    registry: HotkeyRegistry,
    engine: HotstringEngine,
    runner: PromptRunner,
    ai_hotstrings: AiHotstrings,
    sink: Arc<dyn ResultSink>,
    quit_tx: async_channel::Sender<()>,
    quit_rx: async_channel::Receiver<()>,
    started: AtomicBool,
}

impl Hub {
    pub fn new(settings: Settings, services: HubServices) -> Result<Self, HubError> {
        let catalog = Arc::new(PromptCatalog::from_path(
            settings.paths.prompts_path().as_deref(),
        )?);
        let spawner = TaskSpawner::new();
        let engine = HotstringEngine::new(
            settings.hotstrings.buffer_size,
            settings.hotstrings.enabled_by_default,
            services.keystrokes,
            services.mutator,
            spawner.clone(),
        );
        let runner = PromptRunner::new(
            Arc::clone(&services.client),
            Arc::clone(&catalog),
            Arc::clone(&services.selection),
            Arc::clone(&services.sink),
            spawner.clone(),
        );
        let ai_hotstrings = AiHotstrings::new(
            services.client,
            Arc::clone(&catalog),
            services.selection,
        );
        let (quit_tx, quit_rx) = async_channel::bounded(1);

        info!(prompts = catalog.len(), "Hub created");
        Ok(Self {
            settings,
            catalog,
            spawner,
            registry: HotkeyRegistry::new(services.hook),
            engine,
            runner,
            ai_hotstrings,
            sink: services.sink,
            quit_tx,
            quit_rx,
            started: AtomicBool::new(false),
        })
    }

    /// Register everything that should exist before activation.
    ///
    /// A failing snippet or module is logged and skipped. Only a quit hotkey
    /// that cannot be registered is an error, since the hub could not be
    /// stopped otherwise.
    pub fn init(&self) -> Result<(), HubError> {
        register_snippets(&self.engine, &self.settings.snippets).warn_on_err();

        let api = ModuleApi {
            settings: &self.settings,
            hotkeys: &self.registry,
            hotstrings: &self.engine,
            runner: &self.runner,
            ai_hotstrings: &self.ai_hotstrings,
        };
        for module in builtin_modules() {
            let Some(on_init) = module.on_init else {
                continue;
            };
            match on_init(&api) {
                Ok(()) => debug!(module = module.id, "Module initialized"),
                Err(e) => warn!(module = module.id, error = %e, "Module init failed"),
            }
        }

        let quit_tx = self.quit_tx.clone();
        self.registry.register(&self.settings.hotkeys.quit, move || {
            let _ = quit_tx.try_send(());
        })?;

        info!(
            hotstrings = self.engine.trigger_count(),
            hotkeys = self.registry.pending_count(),
            "Hub initialized"
        );
        Ok(())
    }

    /// Start listening and activate hotkeys. Calling again after a
    /// successful start is a no-op.
    ///
    /// A [`HubError::Hook`] from the keystroke listener leaves the hub
    /// unstarted, so `start` may be retried. Activation failures are returned
    /// after everything else is running; the bindings that did install stay
    /// live.
    pub fn start(&self) -> Result<(), HubError> {
        if self.started.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.engine.start()?;
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let activation = self.registry.activate();

        let engine = self.engine.clone();
        let sink = Arc::clone(&self.sink);
        self.registry
            .register(&self.settings.hotkeys.toggle_hotstrings, move || {
                toggle(&engine, sink.as_ref());
            })?;

        info!(hotkeys = ?self.registry.installed_combos(), "Hub started");
        activation
    }

    /// Flip hotstring matching and report the new state.
    pub fn toggle_hotstrings(&self) -> bool {
        toggle(&self.engine, self.sink.as_ref())
    }

    /// Ask [`Hub::wait_for_quit`] to return.
    pub fn request_quit(&self) {
        let _ = self.quit_tx.try_send(());
    }

    /// Block until the quit hotkey fires or [`Hub::request_quit`] is called.
    pub fn wait_for_quit(&self) {
        let _ = self.quit_rx.recv_blocking();
        info!("Quit requested");
    }

    /// Stop the engine and refuse new jobs. Running workers are abandoned.
    pub fn shutdown(&self) {
        self.engine.shutdown();
        self.spawner.shutdown();
        info!(in_flight = self.spawner.in_flight(), "Hub shut down");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &HotstringEngine {
        &self.engine
    }

    pub fn registry(&self) -> &HotkeyRegistry {
        &self.registry
    }

    pub fn runner(&self) -> &PromptRunner {
        &self.runner
    }
}

fn toggle(engine: &HotstringEngine, sink: &dyn ResultSink) -> bool {
    let enabled = !engine.enabled();
    engine.set_enabled(enabled);
    sink.show_text(TOGGLE_TITLE, if enabled { "Enabled" } else { "Disabled" });
    enabled
}
