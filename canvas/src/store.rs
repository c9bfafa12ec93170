//! Worker-side item store: the per-type collection of item records.
//!
//! Records are keyed by their caller-supplied [`ItemId`]. An update for an
//! unknown id inserts the payload verbatim; an update for a known id is a
//! shallow merge where incoming keys win and every other key persists.
//! Iteration follows insertion order so redraws are deterministic.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use frames::{ItemId, ItemPayload};

/// What an update did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The id was new; the payload was stored as is.
    Inserted,
    /// The payload was merged into an existing record.
    Merged,
}

/// In-memory store of item records owned by one worker.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: HashMap<ItemId, ItemPayload>,
    order: Vec<ItemId>,
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or shallow-merge, returning the resulting record.
    pub fn apply_update(&mut self, payload: ItemPayload) -> (MergeOutcome, &ItemPayload) {
        let id = payload.id().clone();
        match self.items.entry(id) {
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.merge(payload);
                (MergeOutcome::Merged, record)
            }
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                (MergeOutcome::Inserted, entry.insert(payload))
            }
        }
    }

    /// Remove a record, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<ItemPayload> {
        let removed = self.items.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&ItemPayload> {
        self.items.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemPayload> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
