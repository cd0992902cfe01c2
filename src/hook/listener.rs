//! Passive system-wide listener on top of `rdev`.
//!
//! `rdev::listen` blocks its thread forever, so the listener runs on a
//! dedicated `input-listener` thread started on first use and never stopped.
//! It serves two things: the keystroke stream, and hotkeys that must still
//! reach the foreground app (`suppress = false`). Events are ignored while
//! an [`InjectionGuard`] is held so our own synthetic input is not re-read.
//!
//! If `rdev::listen` returns (no display, missing accessibility permission)
//! the failure is recorded and every later `subscribe`/`add_binding` fails
//! with [`HubError::Hook`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rdev::{EventType, Key};
use tracing::{debug, error, info, warn};

use super::{HookEvent, HotkeyBinding, KeystrokeEvent, KeystrokeSubscription};
use crate::error::HubError;
use crate::shortcuts::{Modifiers, Shortcut};
use crate::text_injector::InjectionGuard;

/// How long the first caller waits for `rdev::listen` to fail fast
const STARTUP_GRACE: Duration = Duration::from_millis(250);
const STARTUP_POLL: Duration = Duration::from_millis(10);

/// Blocks for the life of the listener; returns only on failure.
type ListenFn = fn(Arc<Shared>) -> Result<(), String>;

#[derive(Debug, Clone)]
pub(super) struct PassiveBinding {
    canonical: String,
    shortcut: Shortcut,
    trigger_on_release: bool,
}

impl From<&HotkeyBinding> for PassiveBinding {
    fn from(binding: &HotkeyBinding) -> Self {
        Self {
            canonical: binding.canonical(),
            shortcut: binding.shortcut.clone(),
            trigger_on_release: binding.trigger_on_release,
        }
    }
}

struct Shared {
    bindings: RwLock<Vec<PassiveBinding>>,
    subscribers: Mutex<Vec<(u64, async_channel::Sender<KeystrokeEvent>)>>,
    next_id: AtomicU64,
    guard: InjectionGuard,
    events: async_channel::Sender<HookEvent>,
    failure: Mutex<Option<String>>,
}

pub(super) struct PassiveListener {
    shared: Arc<Shared>,
    started: AtomicBool,
    listen: ListenFn,
}

impl PassiveListener {
    pub(super) fn new(guard: InjectionGuard, events: async_channel::Sender<HookEvent>) -> Self {
        Self::with_listen(guard, events, listen_rdev)
    }

    fn with_listen(
        guard: InjectionGuard,
        events: async_channel::Sender<HookEvent>,
        listen: ListenFn,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                bindings: RwLock::new(Vec::new()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                guard,
                events,
                failure: Mutex::new(None),
            }),
            started: AtomicBool::new(false),
            listen,
        }
    }

    fn ensure_started(&self) -> Result<(), HubError> {
        if !self.started.swap(true, Ordering::SeqCst) {
            let shared = Arc::clone(&self.shared);
            let listen = self.listen;
            let spawned = thread::Builder::new()
                .name("input-listener".to_string())
                .spawn(move || {
                    info!("Starting passive input listener");
                    let message = match listen(Arc::clone(&shared)) {
                        Ok(()) => "listener stopped".to_string(),
                        Err(message) => message,
                    };
                    error!(error = %message, "Passive input listener failed");
                    *shared.failure.lock() = Some(message);
                });

            if let Err(e) = spawned {
                self.started.store(false, Ordering::SeqCst);
                return Err(HubError::Hook(format!(
                    "failed to spawn input listener: {}",
                    e
                )));
            }
            self.await_startup();
        }
        self.check_alive()
    }

    fn await_startup(&self) {
        let deadline = Instant::now() + STARTUP_GRACE;
        while Instant::now() < deadline && self.shared.failure.lock().is_none() {
            thread::sleep(STARTUP_POLL);
        }
    }

    fn check_alive(&self) -> Result<(), HubError> {
        match self.shared.failure.lock().as_ref() {
            Some(message) => Err(HubError::Hook(format!(
                "input listener unavailable: {}",
                message
            ))),
            None => Ok(()),
        }
    }

    pub(super) fn add_binding(&self, binding: &HotkeyBinding) -> Result<(), HubError> {
        self.ensure_started()?;
        self.shared.bindings.write().push(PassiveBinding::from(binding));
        info!(combo = %binding.combo, "Registered pass-through hotkey");
        Ok(())
    }

    pub(super) fn subscribe(&self) -> Result<KeystrokeSubscription, HubError> {
        self.ensure_started()?;
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = async_channel::unbounded();
        self.shared.subscribers.lock().push((id, tx));
        debug!(subscription = id, "Keystroke subscriber added");
        Ok(KeystrokeSubscription { id, events: rx })
    }

    pub(super) fn unsubscribe(&self, id: u64) {
        let mut subscribers = self.shared.subscribers.lock();
        let before = subscribers.len();
        // Dropping the sender closes the subscriber's channel
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        if subscribers.len() != before {
            debug!(subscription = id, "Keystroke subscriber removed");
        }
    }
}

impl Shared {
    fn deliver(&self, output: ListenerOutput) {
        for combo in output.fired {
            if self.events.try_send(HookEvent::HotkeyFired(combo)).is_err() {
                warn!("Hotkey dispatcher is gone, dropping event");
            }
        }
        if output.keystrokes.is_empty() {
            return;
        }
        let subscribers = self.subscribers.lock();
        for event in output.keystrokes {
            for (_, tx) in subscribers.iter() {
                let _ = tx.try_send(event);
            }
        }
    }
}

fn listen_rdev(shared: Arc<Shared>) -> Result<(), String> {
    let mut state = ListenerState::default();
    rdev::listen(move |event| {
        let injecting = shared.guard.is_active();
        let output = {
            let bindings = shared.bindings.read();
            state.handle(
                &event.event_type,
                event.name.as_deref(),
                injecting,
                &bindings,
            )
        };
        shared.deliver(output);
    })
    .map_err(|e| format!("{:?}", e))
}

#[derive(Debug, Default, PartialEq)]
struct ListenerOutput {
    keystrokes: Vec<KeystrokeEvent>,
    fired: Vec<String>,
}

/// Modifier and armed-binding state carried between raw events.
#[derive(Debug, Default)]
struct ListenerState {
    modifiers: Modifiers,
    /// Release-edge bindings whose press was seen
    armed: HashSet<String>,
}

impl ListenerState {
    fn handle(
        &mut self,
        event_type: &EventType,
        name: Option<&str>,
        injecting: bool,
        bindings: &[PassiveBinding],
    ) -> ListenerOutput {
        let mut output = ListenerOutput::default();
        match event_type {
            EventType::KeyPress(key) => {
                if self.update_modifier(key, true) || injecting {
                    return output;
                }
                if let Some(key_name) = rdev_key_name(key) {
                    for binding in bindings {
                        if binding.shortcut.key != key_name
                            || binding.shortcut.modifiers != self.modifiers
                        {
                            continue;
                        }
                        if binding.trigger_on_release {
                            self.armed.insert(binding.canonical.clone());
                        } else {
                            output.fired.push(binding.canonical.clone());
                        }
                    }
                }
                output.keystrokes = translate_press(key, name, &self.modifiers);
            }
            EventType::KeyRelease(key) => {
                if self.update_modifier(key, false) || injecting {
                    return output;
                }
                if let Some(key_name) = rdev_key_name(key) {
                    for binding in bindings {
                        if binding.shortcut.key == key_name && self.armed.remove(&binding.canonical)
                        {
                            output.fired.push(binding.canonical.clone());
                        }
                    }
                }
            }
            EventType::ButtonPress(_) => {
                if !injecting {
                    output.keystrokes.push(KeystrokeEvent::Reset);
                }
            }
            _ => {}
        }
        output
    }

    /// Track modifier keys; returns true if `key` was one.
    fn update_modifier(&mut self, key: &Key, down: bool) -> bool {
        match key {
            Key::ControlLeft | Key::ControlRight => self.modifiers.ctrl = down,
            Key::Alt | Key::AltGr => self.modifiers.alt = down,
            Key::ShiftLeft | Key::ShiftRight => self.modifiers.shift = down,
            Key::MetaLeft | Key::MetaRight => self.modifiers.cmd = down,
            _ => return false,
        }
        true
    }
}

/// Keystroke events produced by one non-modifier key press.
fn translate_press(key: &Key, name: Option<&str>, modifiers: &Modifiers) -> Vec<KeystrokeEvent> {
    match key {
        Key::Backspace => return vec![KeystrokeEvent::Backspace],
        Key::Return
        | Key::KpReturn
        | Key::Escape
        | Key::Tab
        | Key::UpArrow
        | Key::DownArrow
        | Key::LeftArrow
        | Key::RightArrow
        | Key::Home
        | Key::End
        | Key::PageUp
        | Key::PageDown
        | Key::Delete
        | Key::Insert => return vec![KeystrokeEvent::Reset],
        _ => {}
    }

    // Shortcuts may move the caret or change the selection
    if modifiers.ctrl || modifiers.alt || modifiers.cmd {
        return vec![KeystrokeEvent::Reset];
    }

    name.map(|s| {
        s.chars()
            .filter(|c| !c.is_control())
            .map(KeystrokeEvent::Char)
            .collect()
    })
    .unwrap_or_default()
}

/// rdev key to the canonical key name used by [`Shortcut`]
fn rdev_key_name(key: &Key) -> Option<&'static str> {
    let name = match key {
        Key::KeyA => "a",
        Key::KeyB => "b",
        Key::KeyC => "c",
        Key::KeyD => "d",
        Key::KeyE => "e",
        Key::KeyF => "f",
        Key::KeyG => "g",
        Key::KeyH => "h",
        Key::KeyI => "i",
        Key::KeyJ => "j",
        Key::KeyK => "k",
        Key::KeyL => "l",
        Key::KeyM => "m",
        Key::KeyN => "n",
        Key::KeyO => "o",
        Key::KeyP => "p",
        Key::KeyQ => "q",
        Key::KeyR => "r",
        Key::KeyS => "s",
        Key::KeyT => "t",
        Key::KeyU => "u",
        Key::KeyV => "v",
        Key::KeyW => "w",
        Key::KeyX => "x",
        Key::KeyY => "y",
        Key::KeyZ => "z",
        Key::Num0 => "0",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",
        Key::F1 => "f1",
        Key::F2 => "f2",
        Key::F3 => "f3",
        Key::F4 => "f4",
        Key::F5 => "f5",
        Key::F6 => "f6",
        Key::F7 => "f7",
        Key::F8 => "f8",
        Key::F9 => "f9",
        Key::F10 => "f10",
        Key::F11 => "f11",
        Key::F12 => "f12",
        Key::Space => "space",
        Key::Return => "enter",
        Key::Tab => "tab",
        Key::Escape => "escape",
        Key::Backspace => "backspace",
        Key::Delete => "delete",
        Key::UpArrow => "up",
        Key::DownArrow => "down",
        Key::LeftArrow => "left",
        Key::RightArrow => "right",
        Key::Home => "home",
        Key::End => "end",
        Key::PageUp => "pageup",
        Key::PageDown => "pagedown",
        Key::SemiColon => "semicolon",
        Key::Quote => "quote",
        Key::Comma => "comma",
        Key::Dot => "period",
        Key::Slash => "slash",
        Key::BackSlash => "backslash",
        Key::LeftBracket => "bracketleft",
        Key::RightBracket => "bracketright",
        Key::Minus => "minus",
        Key::Equal => "equal",
        Key::BackQuote => "backquote",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdev::Button;

    fn binding(combo: &str, trigger_on_release: bool) -> PassiveBinding {
        let hotkey =
            HotkeyBinding::new(combo, Arc::new(|| {}), false, trigger_on_release).unwrap();
        PassiveBinding::from(&hotkey)
    }

    fn press(
        state: &mut ListenerState,
        key: Key,
        name: Option<&str>,
        b: &[PassiveBinding],
    ) -> ListenerOutput {
        state.handle(&EventType::KeyPress(key), name, false, b)
    }

    fn release(state: &mut ListenerState, key: Key, b: &[PassiveBinding]) -> ListenerOutput {
        state.handle(&EventType::KeyRelease(key), None, false, b)
    }

    #[test]
    fn printable_keys_become_chars() {
        let mut state = ListenerState::default();
        let out = press(&mut state, Key::SemiColon, Some(";"), &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Char(';')]);
        let out = press(&mut state, Key::Space, Some(" "), &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Char(' ')]);
    }

    #[test]
    fn shift_does_not_block_characters() {
        let mut state = ListenerState::default();
        assert_eq!(press(&mut state, Key::ShiftLeft, None, &[]), ListenerOutput::default());
        let out = press(&mut state, Key::KeyA, Some("A"), &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Char('A')]);
    }

    #[test]
    fn navigation_and_clicks_reset() {
        let mut state = ListenerState::default();
        assert_eq!(
            press(&mut state, Key::LeftArrow, None, &[]).keystrokes,
            vec![KeystrokeEvent::Reset]
        );
        assert_eq!(
            press(&mut state, Key::Return, Some("\r"), &[]).keystrokes,
            vec![KeystrokeEvent::Reset]
        );
        let out = state.handle(&EventType::ButtonPress(Button::Left), None, false, &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Reset]);
    }

    #[test]
    fn backspace_is_its_own_event() {
        let mut state = ListenerState::default();
        let out = press(&mut state, Key::Backspace, Some("\u{8}"), &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Backspace]);
    }

    #[test]
    fn modified_keys_are_not_characters() {
        let mut state = ListenerState::default();
        press(&mut state, Key::ControlLeft, None, &[]);
        let out = press(&mut state, Key::KeyV, Some("\u{16}"), &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Reset]);
        release(&mut state, Key::ControlLeft, &[]);
        let out = press(&mut state, Key::KeyV, Some("v"), &[]);
        assert_eq!(out.keystrokes, vec![KeystrokeEvent::Char('v')]);
    }

    #[test]
    fn release_edge_binding_fires_once_on_key_up() {
        let bindings = vec![binding("ctrl+alt+1", true)];
        let mut state = ListenerState::default();
        press(&mut state, Key::ControlLeft, None, &bindings);
        press(&mut state, Key::Alt, None, &bindings);

        let down = press(&mut state, Key::Num1, Some("1"), &bindings);
        assert!(down.fired.is_empty());

        let up = release(&mut state, Key::Num1, &bindings);
        assert_eq!(up.fired, vec!["alt+ctrl+1".to_string()]);

        // A second release without a press does nothing
        assert!(release(&mut state, Key::Num1, &bindings).fired.is_empty());
    }

    #[test]
    fn press_edge_binding_fires_on_key_down() {
        let bindings = vec![binding("ctrl+alt+2", false)];
        let mut state = ListenerState::default();
        press(&mut state, Key::ControlRight, None, &bindings);
        press(&mut state, Key::AltGr, None, &bindings);
        let down = press(&mut state, Key::Num2, Some("2"), &bindings);
        assert_eq!(down.fired, vec!["alt+ctrl+2".to_string()]);
        assert!(release(&mut state, Key::Num2, &bindings).fired.is_empty());
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let bindings = vec![binding("ctrl+alt+1", false)];
        let mut state = ListenerState::default();
        press(&mut state, Key::ControlLeft, None, &bindings);
        let out = press(&mut state, Key::Num1, Some("1"), &bindings);
        assert!(out.fired.is_empty());
    }

    #[test]
    fn synthetic_input_is_ignored() {
        let bindings = vec![binding("ctrl+alt+1", false)];
        let mut state = ListenerState::default();
        let out = state.handle(&EventType::KeyPress(Key::KeyX), Some("x"), true, &bindings);
        assert_eq!(out, ListenerOutput::default());

        // Modifier state is still tracked while injecting
        state.handle(&EventType::KeyPress(Key::ControlLeft), None, true, &bindings);
        assert!(state.modifiers.ctrl);
        state.handle(&EventType::KeyRelease(Key::ControlLeft), None, true, &bindings);
        assert!(!state.modifiers.ctrl);
    }

    fn listen_fails(_: Arc<Shared>) -> Result<(), String> {
        Err("no display".to_string())
    }

    fn listen_blocks(_: Arc<Shared>) -> Result<(), String> {
        thread::sleep(Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn failed_listener_is_reported_to_callers() {
        let (events, _rx) = async_channel::unbounded();
        let listener = PassiveListener::with_listen(InjectionGuard::new(), events, listen_fails);

        let err = listener.subscribe().err().unwrap();
        assert!(matches!(err, HubError::Hook(ref m) if m.contains("no display")));

        let hotkey = HotkeyBinding::new("ctrl+alt+q", Arc::new(|| {}), false, true).unwrap();
        assert!(matches!(listener.add_binding(&hotkey), Err(HubError::Hook(_))));
        assert!(listener.shared.bindings.read().is_empty());
    }

    #[test]
    fn running_listener_accepts_subscribers() {
        let (events, _rx) = async_channel::unbounded();
        let listener = PassiveListener::with_listen(InjectionGuard::new(), events, listen_blocks);
        let first = listener.subscribe().unwrap();
        let second = listener.subscribe().unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn key_names_match_shortcut_names() {
        for (key, combo) in [
            (Key::SemiColon, "ctrl+;"),
            (Key::Dot, "ctrl+."),
            (Key::F9, "f9"),
            (Key::Return, "ctrl+enter"),
        ] {
            let shortcut = Shortcut::parse(combo).unwrap();
            assert_eq!(rdev_key_name(&key), Some(shortcut.key.as_str()));
        }
        assert_eq!(rdev_key_name(&Key::CapsLock), None);
    }
}
