use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Slot of a name's characters inside a registry's display text buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSlot {
    /// Character offset into the display buffer.
    pub offset: u32,
    /// Number of characters.
    pub length: u32,
}

/// Append-only buffer of display text. Renderers upload this wholesale and
/// address individual names through their [`TextSlot`]s, so existing slots
/// stay valid forever; re-registering a name appends a fresh slot.
#[derive(Debug, Default)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn push(&mut self, s: &str) -> TextSlot {
        let slot = TextSlot {
            offset: self.text.chars().count() as u32,
            length: s.chars().count() as u32,
        };
        self.text.push_str(s);
        slot
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A hash-keyed name. Identity (the hash) is stable from first sight; the
/// string starts as a placeholder and is upgraded in place once the peer
/// resolves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name {
    pub hash: u32,
    string: String,
    resolved: bool,
    slot: TextSlot,
}

impl Name {
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Whether an authoritative string has arrived, as opposed to the
    /// decimal-hash placeholder synthesized on first sight.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn slot(&self) -> TextSlot {
        self.slot
    }
}

/// Hash → name registry with deferred resolution.
///
/// `get` never fails: an unseen hash registers a placeholder whose string is
/// the decimal hash, and the caller learns from the `existed` flag that a
/// resolution request should go out over the wire. `set` is the only path
/// that changes a name's string.
#[derive(Debug, Default)]
pub struct NameMap {
    names: HashMap<u32, Name>,
    text: TextBuffer,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a hash, registering a placeholder if it is new.
    /// Returns `(existed, name)`.
    pub fn get(&mut self, hash: u32) -> (bool, &Name) {
        let mut existed = true;
        let text = &mut self.text;
        let name = self.names.entry(hash).or_insert_with(|| {
            existed = false;
            let string = hash.to_string();
            let slot = text.push(&string);
            Name {
                hash,
                string,
                resolved: false,
                slot,
            }
        });
        (existed, name)
    }

    /// Create or update a name with its authoritative string.
    pub fn set(&mut self, hash: u32, string: &str) {
        let slot = self.text.push(string);
        let name = Name {
            hash,
            string: string.to_string(),
            resolved: true,
            slot,
        };
        self.names.insert(hash, name);
    }

    pub fn lookup(&self, hash: u32) -> Option<&Name> {
        self.names.get(&hash)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The display text buffer all slots index into.
    pub fn display_text(&self) -> &str {
        self.text.text()
    }
}
