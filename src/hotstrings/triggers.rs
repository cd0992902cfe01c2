//! Trigger table with longest-suffix lookup.

use std::collections::HashMap;

use super::buffer::RollingBuffer;
use super::provider::ExpansionProvider;
use crate::error::HubError;

#[derive(Debug, Clone)]
struct TriggerEntry {
    chars: Vec<char>,
    provider: ExpansionProvider,
}

#[derive(Debug, Default)]
pub struct TriggerTable {
    entries: HashMap<String, TriggerEntry>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger. Duplicates are rejected rather than overwritten.
    pub fn insert(&mut self, trigger: &str, provider: ExpansionProvider) -> Result<(), HubError> {
        if trigger.is_empty() {
            return Err(HubError::EmptyTrigger);
        }
        if self.entries.contains_key(trigger) {
            return Err(HubError::DuplicateTrigger(trigger.to_string()));
        }
        self.entries.insert(
            trigger.to_string(),
            TriggerEntry {
                chars: trigger.chars().collect(),
                provider,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, trigger: &str) -> Option<&ExpansionProvider> {
        self.entries.get(trigger).map(|e| &e.provider)
    }

    /// `(trigger, provider kind)` sorted by trigger.
    pub fn list(&self) -> Vec<(String, &'static str)> {
        let mut out: Vec<(String, &'static str)> = self
            .entries
            .iter()
            .map(|(trigger, entry)| (trigger.clone(), entry.provider.kind()))
            .collect();
        out.sort();
        out
    }

    /// The longest trigger that is a suffix of the buffer.
    ///
    /// Two distinct triggers of equal length cannot both be suffixes of the
    /// same buffer, so the result is unique.
    pub fn longest_match(&self, buffer: &RollingBuffer) -> Option<(String, ExpansionProvider)> {
        self.entries
            .iter()
            .filter(|(_, entry)| buffer.ends_with(&entry.chars))
            .max_by_key(|(_, entry)| entry.chars.len())
            .map(|(trigger, entry)| (trigger.clone(), entry.provider.clone()))
    }

    /// Whether the buffer ends with a proper prefix of some trigger, that
    /// prefix being at least `min_len` characters long. Such a trigger could
    /// still complete with more typing.
    pub fn could_extend(&self, buffer: &RollingBuffer, min_len: usize) -> bool {
        self.entries.values().any(|entry| {
            let len = entry.chars.len();
            (min_len.max(1)..len).any(|k| buffer.ends_with(&entry.chars[..k]))
        })
    }
}
