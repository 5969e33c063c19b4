//! Two-pool (available/selected) collection used by every selection step.

use std::collections::HashSet;

use shared::{
    domain::{ControllerRef, ModuleCandidate, PointCandidate},
    protocol::DatasetEntry,
};

/// Identity used to keep the pools disjoint. Records answer with their name,
/// plain strings with themselves.
pub trait SelectionKey {
    fn selection_key(&self) -> &str;
}

impl SelectionKey for str {
    fn selection_key(&self) -> &str {
        self
    }
}

impl SelectionKey for String {
    fn selection_key(&self) -> &str {
        self
    }
}

impl SelectionKey for ControllerRef {
    fn selection_key(&self) -> &str {
        &self.name
    }
}

impl SelectionKey for PointCandidate {
    fn selection_key(&self) -> &str {
        &self.name
    }
}

impl SelectionKey for ModuleCandidate {
    fn selection_key(&self) -> &str {
        &self.name
    }
}

impl SelectionKey for DatasetEntry {
    fn selection_key(&self) -> &str {
        self.name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<T> {
    available: Vec<T>,
    selected: Vec<T>,
    // Keys in the order they were last seeded; removed items go back to
    // their catalog slot.
    catalog: Vec<String>,
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self {
            available: Vec::new(),
            selected: Vec::new(),
            catalog: Vec::new(),
        }
    }
}

impl<T: SelectionKey + Clone> SelectionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_available(items: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        set.seed(items);
        set
    }

    /// Replaces the available pool with a freshly loaded dataset. Duplicate
    /// keys keep their first occurrence and already selected keys are skipped.
    pub fn seed(&mut self, items: impl IntoIterator<Item = T>) {
        let mut seen = HashSet::new();
        self.available.clear();
        self.catalog.clear();

        for item in items {
            let key = item.selection_key().to_owned();
            if !seen.insert(key.clone()) {
                continue;
            }
            self.catalog.push(key.clone());
            if !self.is_selected(&key) {
                self.available.push(item);
            }
        }
    }

    pub fn available(&self) -> &[T] {
        &self.available
    }

    pub fn selected(&self) -> &[T] {
        &self.selected
    }

    pub fn selected_keys(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(SelectionKey::selection_key)
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.iter().any(|item| item.selection_key() == key)
    }

    pub fn is_available(&self, key: &str) -> bool {
        self.available.iter().any(|item| item.selection_key() == key)
    }

    pub fn find_available(&self, key: &str) -> Option<&T> {
        self.available.iter().find(|item| item.selection_key() == key)
    }

    pub fn find_selected(&self, key: &str) -> Option<&T> {
        self.selected.iter().find(|item| item.selection_key() == key)
    }

    /// Moves `item` into the selected pool. Returns `false` when an element
    /// with the same key is already selected.
    pub fn add(&mut self, item: T) -> bool {
        if self.is_selected(item.selection_key()) {
            return false;
        }
        let key = item.selection_key().to_owned();
        self.available.retain(|candidate| candidate.selection_key() != key);
        self.selected.push(item);
        true
    }

    /// Moves the selected element with `item`'s key back to the available
    /// pool. Returns `false` when nothing with that key is selected.
    pub fn remove<K>(&mut self, item: &K) -> bool
    where
        K: SelectionKey + ?Sized,
    {
        let key = item.selection_key();
        let Some(position) = self
            .selected
            .iter()
            .position(|candidate| candidate.selection_key() == key)
        else {
            return false;
        };

        let removed = self.selected.remove(position);
        if !self.is_available(key) {
            let index = self.insertion_index(key);
            self.available.insert(index, removed);
        }
        true
    }

    /// Returns every selected element to the available pool.
    pub fn clear_selected(&mut self) -> usize {
        let keys: Vec<String> = self.selected_keys().map(str::to_owned).collect();
        for key in &keys {
            self.remove(key.as_str());
        }
        keys.len()
    }

    fn catalog_rank(&self, key: &str) -> Option<usize> {
        self.catalog.iter().position(|known| known == key)
    }

    fn insertion_index(&self, key: &str) -> usize {
        let Some(rank) = self.catalog_rank(key) else {
            return self.available.len();
        };
        self.available
            .iter()
            .position(|candidate| {
                self.catalog_rank(candidate.selection_key())
                    .map_or(true, |other| other > rank)
            })
            .unwrap_or(self.available.len())
    }
}
