//! Per-user fridge inventory.
//!
//! Entries are keyed by [`NormalizedToken`] and keep the spelling the user
//! first typed, including cut and variety qualifiers ("marbled beef short-rib"
//! is stored as-is, never generalized to "beef").

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, NormalizedToken};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    token: NormalizedToken,
    display: String,
}

/// Ordered mapping of normalized ingredient -> display string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FridgeInventory {
    entries: Vec<Entry>,
}

impl FridgeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert items not already present. Returns the items actually inserted,
    /// trimmed but otherwise in the caller's spelling.
    pub fn add<S: AsRef<str>>(&mut self, items: &[S]) -> Vec<String> {
        let mut added = Vec::new();
        for item in items {
            let display = item.as_ref().trim();
            let token = normalize(display);
            if token.is_empty() || self.contains_token(&token) {
                continue;
            }
            self.entries.push(Entry {
                token,
                display: display.to_string(),
            });
            added.push(display.to_string());
        }
        added
    }

    /// Remove one entry per target, fuzzily.
    ///
    /// An entry matches a target when their tokens are equal or either
    /// contains the other. The first matching entry in insertion order is
    /// removed; targets that match nothing are skipped.
    pub fn remove<S: AsRef<str>>(&mut self, targets: &[S]) -> Vec<String> {
        let mut removed = Vec::new();
        for target in targets {
            let token = normalize(target.as_ref());
            if token.is_empty() {
                continue;
            }
            if let Some(pos) = self.entries.iter().position(|e| e.token.overlaps(&token)) {
                removed.push(self.entries.remove(pos).display);
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Display strings in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.display.clone()).collect()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &NormalizedToken> {
        self.entries.iter().map(|e| &e.token)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.contains_token(&normalize(item))
    }

    fn contains_token(&self, token: &NormalizedToken) -> bool {
        self.entries.iter().any(|e| &e.token == token)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
