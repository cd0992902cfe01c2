//! Incremental hotstring matching over the keystroke stream.
//!
//! A matched trigger that is also the start of a longer trigger is *held*
//! instead of fired. The next characters either complete the longer
//! trigger (which then replaces the held one) or break it, at which point
//! the held trigger fires. Firing a held trigger erases the trigger plus
//! everything typed after it, then re-types those trailing characters.
//!
//! A held trigger only fires on a later typed character. `Reset` (Enter,
//! navigation, click), `Backspace` and disabling the engine drop it unfired,
//! so `;s` followed by Enter never expands when `;sig` is registered.

use super::buffer::RollingBuffer;
use super::provider::ExpansionProvider;
use super::triggers::TriggerTable;
use crate::hook::KeystrokeEvent;

/// What the engine must do for one fired trigger.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub trigger: String,
    pub provider: ExpansionProvider,
    /// Characters to erase before the caret
    pub erase: usize,
    /// Characters to type back after the expansion
    pub retype: String,
}

#[derive(Debug, Clone)]
struct HeldMatch {
    trigger: String,
    trigger_len: usize,
    provider: ExpansionProvider,
    trailing: String,
}

impl HeldMatch {
    fn span_len(&self) -> usize {
        self.trigger_len + self.trailing.chars().count()
    }

    fn into_expansion(self) -> Expansion {
        Expansion {
            erase: self.span_len(),
            trigger: self.trigger,
            provider: self.provider,
            retype: self.trailing,
        }
    }
}

#[derive(Debug)]
pub struct HotstringMatcher {
    buffer: RollingBuffer,
    held: Option<HeldMatch>,
}

impl HotstringMatcher {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer: RollingBuffer::new(buffer_size),
            held: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn contents(&self) -> String {
        self.buffer.contents()
    }

    pub fn has_held_match(&self) -> bool {
        self.held.is_some()
    }

    /// Drop typed history and any held match.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.held = None;
    }

    pub fn process(
        &mut self,
        event: KeystrokeEvent,
        triggers: &TriggerTable,
    ) -> Option<Expansion> {
        match event {
            KeystrokeEvent::Char(c) => self.process_char(c, triggers),
            KeystrokeEvent::Backspace => {
                self.buffer.pop();
                self.held = None;
                None
            }
            KeystrokeEvent::Reset => {
                self.reset();
                None
            }
        }
    }

    fn process_char(&mut self, c: char, triggers: &TriggerTable) -> Option<Expansion> {
        self.buffer.push(c);
        let current = triggers.longest_match(&self.buffer);

        if let Some(mut held) = self.held.take() {
            held.trailing.push(c);
            let span = held.span_len();

            match current {
                // A trigger covering the whole held span supersedes it
                Some((trigger, provider)) if trigger.chars().count() >= span => {
                    return self.consider(trigger, provider, triggers);
                }
                _ => {}
            }

            if triggers.could_extend(&self.buffer, span) {
                self.held = Some(held);
                return None;
            }

            // The longer trigger can no longer complete
            self.buffer.clear();
            for t in held.trailing.chars() {
                self.buffer.push(t);
            }
            return Some(held.into_expansion());
        }

        let (trigger, provider) = current?;
        self.consider(trigger, provider, triggers)
    }

    /// Fire `trigger` now, or hold it while a longer trigger could complete.
    fn consider(
        &mut self,
        trigger: String,
        provider: ExpansionProvider,
        triggers: &TriggerTable,
    ) -> Option<Expansion> {
        let trigger_len = trigger.chars().count();
        if triggers.could_extend(&self.buffer, trigger_len) {
            self.held = Some(HeldMatch {
                trigger,
                trigger_len,
                provider,
                trailing: String::new(),
            });
            return None;
        }

        self.buffer.clear();
        Some(Expansion {
            trigger,
            provider,
            erase: trigger_len,
            retype: String::new(),
        })
    }
}
