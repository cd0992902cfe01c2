//! Consuming hotkeys through `global-hotkey`.
//!
//! The manager lives on its own thread (`hotkey-manager`) and takes
//! registration requests over a channel. A second thread (`hotkey-events`)
//! drains `GlobalHotKeyEvent::receiver()` and forwards firing edges to the
//! dispatcher as [`HookEvent`]s.
//!
//! On macOS and Windows `global-hotkey` only delivers events to a thread that
//! runs the platform event loop (main run loop, Win32 message pump). The
//! manager thread runs neither, so consuming hotkeys are refused there with
//! [`HubError::Hook`] instead of grabbing a key that would never fire.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers as HotkeyModifiers},
    Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::{HookEvent, HotkeyBinding};
use crate::error::HubError;
use crate::shortcuts::Shortcut;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Whether events reach `GlobalHotKeyEvent::receiver()` without a native event loop
pub(super) const CONSUMING_SUPPORTED: bool =
    !cfg!(any(target_os = "macos", target_os = "windows"));

struct Registered {
    canonical: String,
    trigger_on_release: bool,
}

struct RegisterRequest {
    hotkey: HotKey,
    display: String,
    reply: async_channel::Sender<Result<(), String>>,
}

/// Handle to the manager and event threads.
pub(super) struct GlobalBackend {
    requests: async_channel::Sender<RegisterRequest>,
    registered: Arc<Mutex<HashMap<u32, Registered>>>,
}

impl GlobalBackend {
    /// Spawn the manager and event threads.
    pub(super) fn start(
        events: async_channel::Sender<HookEvent>,
        stop: async_channel::Receiver<()>,
    ) -> Result<Self, HubError> {
        let (requests, request_rx) = async_channel::unbounded::<RegisterRequest>();
        let (ready_tx, ready_rx) = async_channel::bounded::<Result<(), String>>(1);

        thread::Builder::new()
            .name("hotkey-manager".to_string())
            .spawn(move || run_manager(request_rx, ready_tx))
            .map_err(|e| HubError::Hook(format!("failed to spawn hotkey manager: {}", e)))?;

        ready_rx
            .recv_blocking()
            .map_err(|_| HubError::Hook("hotkey manager exited during startup".to_string()))?
            .map_err(HubError::Hook)?;

        let registered: Arc<Mutex<HashMap<u32, Registered>>> = Arc::new(Mutex::new(HashMap::new()));
        let lookup = Arc::clone(&registered);
        thread::Builder::new()
            .name("hotkey-events".to_string())
            .spawn(move || run_event_loop(lookup, events, stop))
            .map_err(|e| HubError::Hook(format!("failed to spawn hotkey event thread: {}", e)))?;

        Ok(Self {
            requests,
            registered,
        })
    }

    /// Register a binding with the OS. Blocks until the manager answers.
    pub(super) fn register(&self, binding: &HotkeyBinding) -> Result<(), HubError> {
        let hotkey = to_hotkey(&binding.shortcut).ok_or_else(|| {
            HubError::Hook(format!(
                "key '{}' cannot be registered as a global hotkey",
                binding.shortcut.key
            ))
        })?;
        let id = hotkey.id();

        // Record before registering so an immediate press is not lost
        self.registered.lock().insert(
            id,
            Registered {
                canonical: binding.canonical(),
                trigger_on_release: binding.trigger_on_release,
            },
        );

        let (reply, reply_rx) = async_channel::bounded(1);
        let request = RegisterRequest {
            hotkey,
            display: binding.combo.clone(),
            reply,
        };

        let outcome = match self.requests.send_blocking(request) {
            Ok(()) => reply_rx
                .recv_blocking()
                .unwrap_or_else(|_| Err("hotkey manager stopped".to_string())),
            Err(_) => Err("hotkey manager stopped".to_string()),
        };

        if let Err(message) = outcome {
            self.registered.lock().remove(&id);
            return Err(HubError::Hook(message));
        }
        Ok(())
    }
}

pub(super) fn ensure_consuming_supported(
    binding: &HotkeyBinding,
    supported: bool,
) -> Result<(), HubError> {
    if supported {
        return Ok(());
    }
    Err(HubError::Hook(format!(
        "hotkey '{}' asks to consume the keystroke, which is not supported on this platform; \
         set suppress = false",
        binding.combo
    )))
}

fn run_manager(
    requests: async_channel::Receiver<RegisterRequest>,
    ready: async_channel::Sender<Result<(), String>>,
) {
    let manager = match GlobalHotKeyManager::new() {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "Failed to create hotkey manager");
            let _ = ready.send_blocking(Err(format!("failed to create hotkey manager: {}", e)));
            return;
        }
    };
    let _ = ready.send_blocking(Ok(()));

    // Exits once every GlobalBackend handle is dropped
    while let Ok(request) = requests.recv_blocking() {
        let result = match manager.register(request.hotkey) {
            Ok(()) => {
                info!(
                    combo = %request.display,
                    id = request.hotkey.id(),
                    "Registered global hotkey"
                );
                Ok(())
            }
            Err(e) => {
                let message = format_hotkey_error(&e, &request.display);
                warn!(combo = %request.display, "{}", message);
                Err(message)
            }
        };
        let _ = request.reply.send_blocking(result);
    }
    debug!("Hotkey manager thread exiting");
}

fn run_event_loop(
    registered: Arc<Mutex<HashMap<u32, Registered>>>,
    events: async_channel::Sender<HookEvent>,
    stop: async_channel::Receiver<()>,
) {
    let receiver = GlobalHotKeyEvent::receiver();
    loop {
        // stop is closed (not sent to) on shutdown
        if stop.is_closed() {
            break;
        }
        let Ok(event) = receiver.recv_timeout(EVENT_POLL_INTERVAL) else {
            continue;
        };

        let canonical = {
            let map = registered.lock();
            let Some(entry) = map.get(&event.id) else {
                continue;
            };
            let wanted = if entry.trigger_on_release {
                HotKeyState::Released
            } else {
                HotKeyState::Pressed
            };
            if event.state != wanted {
                continue;
            }
            entry.canonical.clone()
        };

        if events.try_send(HookEvent::HotkeyFired(canonical)).is_err() {
            warn!("Hotkey dispatcher is gone, dropping event");
        }
    }
    debug!("Hotkey event thread exiting");
}

/// Format a hotkey registration error with helpful context
pub(super) fn format_hotkey_error(e: &HotkeyError, shortcut_display: &str) -> String {
    match e {
        HotkeyError::AlreadyRegistered(hk) => {
            format!(
                "Hotkey '{}' is already registered by another application (ID: {}). \
                 Try a different combo or close the conflicting app.",
                shortcut_display,
                hk.id()
            )
        }
        HotkeyError::FailedToRegister(msg) => {
            format!(
                "System rejected hotkey '{}': {}. The combo may be reserved by the OS.",
                shortcut_display, msg
            )
        }
        HotkeyError::OsError(os_err) => {
            format!(
                "OS error registering '{}': {}. Check system hotkey settings.",
                shortcut_display, os_err
            )
        }
        other => format!(
            "Failed to register hotkey '{}': {}",
            shortcut_display, other
        ),
    }
}

pub(super) fn to_hotkey(shortcut: &Shortcut) -> Option<HotKey> {
    let code = code_for_key(&shortcut.key)?;
    let mut mods = HotkeyModifiers::empty();
    if shortcut.modifiers.cmd {
        mods |= HotkeyModifiers::META;
    }
    if shortcut.modifiers.ctrl {
        mods |= HotkeyModifiers::CONTROL;
    }
    if shortcut.modifiers.alt {
        mods |= HotkeyModifiers::ALT;
    }
    if shortcut.modifiers.shift {
        mods |= HotkeyModifiers::SHIFT;
    }
    let mods = if mods.is_empty() { None } else { Some(mods) };
    Some(HotKey::new(mods, code))
}

/// Canonical key name to a physical key code
pub(super) fn code_for_key(key: &str) -> Option<Code> {
    let code = match key {
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "space" => Code::Space,
        "enter" => Code::Enter,
        "tab" => Code::Tab,
        "escape" => Code::Escape,
        "backspace" => Code::Backspace,
        "delete" => Code::Delete,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" => Code::PageUp,
        "pagedown" => Code::PageDown,
        "semicolon" => Code::Semicolon,
        "quote" => Code::Quote,
        "comma" => Code::Comma,
        "period" => Code::Period,
        "slash" => Code::Slash,
        "backslash" => Code::Backslash,
        "bracketleft" => Code::BracketLeft,
        "bracketright" => Code::BracketRight,
        "minus" => Code::Minus,
        "equal" => Code::Equal,
        "backquote" => Code::Backquote,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::is_known_key;

    #[test]
    fn every_known_key_has_a_code() {
        let keys = [
            "a", "z", "0", "9", "f1", "f12", "space", "enter", "tab", "escape", "backspace",
            "delete", "up", "down", "left", "right", "home", "end", "pageup", "pagedown",
            "semicolon", "quote", "comma", "period", "slash", "backslash", "bracketleft",
            "bracketright", "minus", "equal", "backquote",
        ];
        for key in keys {
            assert!(is_known_key(key), "{key} should be known");
            assert!(code_for_key(key).is_some(), "{key} should map to a code");
        }
        assert!(code_for_key("f13").is_none());
    }

    #[test]
    fn hotkey_ids_match_for_equivalent_combos() {
        let a = to_hotkey(&Shortcut::parse("ctrl+alt+h").unwrap()).unwrap();
        let b = to_hotkey(&Shortcut::parse("Alt+Control+H").unwrap()).unwrap();
        assert_eq!(a.id(), b.id());

        let c = to_hotkey(&Shortcut::parse("ctrl+alt+shift+h").unwrap()).unwrap();
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn bare_key_has_no_modifiers() {
        let hotkey = to_hotkey(&Shortcut::parse("f9").unwrap()).unwrap();
        assert_eq!(hotkey, HotKey::new(None, Code::F9));
    }

    #[test]
    fn consuming_binding_is_refused_without_event_loop() {
        let binding = HotkeyBinding::new("ctrl+alt+1", Arc::new(|| {}), true, false).unwrap();
        assert!(ensure_consuming_supported(&binding, true).is_ok());

        let err = ensure_consuming_supported(&binding, false).unwrap_err();
        assert!(matches!(err, HubError::Hook(ref m) if m.contains("ctrl+alt+1")));
    }

    #[test]
    fn consuming_support_follows_platform() {
        let expected = !(cfg!(target_os = "macos") || cfg!(target_os = "windows"));
        assert_eq!(CONSUMING_SUPPORTED, expected);
    }

    #[test]
    fn format_error_names_the_combo() {
        let msg = format_hotkey_error(&HotkeyError::FailedToRegister("busy".into()), "ctrl+alt+1");
        assert!(msg.contains("ctrl+alt+1"));
        assert!(msg.contains("busy"));
    }
}
