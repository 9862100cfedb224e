//! Shared vocabulary sets that bias enrichment of later rows.
//!
//! Every worker reads a snapshot of what earlier rows produced and appends
//! what it learned, so the model converges on a consistent naming scheme
//! across the run. The sets live for one pipeline run and are never
//! persisted.

use std::collections::BTreeSet;
use std::sync::Mutex;

/// Thread-safe, deduplicated set of non-empty strings.
///
/// `add` and `snapshot` are atomic with respect to each other: no reader
/// observes a partially inserted item and no concurrent write is lost. The
/// set only ever grows.
#[derive(Debug, Default)]
pub struct VocabularySet {
    items: Mutex<BTreeSet<String>>,
}

impl VocabularySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. Empty strings are ignored; re-adding is a no-op.
    pub fn add(&self, item: &str) {
        if item.is_empty() {
            tracing::debug!("skipped empty vocabulary item");
            return;
        }
        let mut items = self.items.lock().expect("vocabulary lock poisoned");
        if items.insert(item.to_string()) {
            tracing::debug!(item, "added vocabulary item");
        }
    }

    /// Point-in-time membership test.
    #[allow(dead_code)]
    pub fn contains(&self, item: &str) -> bool {
        let items = self.items.lock().expect("vocabulary lock poisoned");
        items.contains(item)
    }

    /// Copy of the current contents, in sorted order. Safe to read after the
    /// call returns even while the set keeps growing.
    pub fn snapshot(&self) -> Vec<String> {
        let items = self.items.lock().expect("vocabulary lock poisoned");
        items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let items = self.items.lock().expect("vocabulary lock poisoned");
        items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The three independent vocabularies accumulated over one run.
#[derive(Debug, Default)]
pub struct Vocabularies {
    pub categories: VocabularySet,
    pub payees: VocabularySet,
    pub notes: VocabularySet,
}

/// Owned copies of all three sets, taken at a single point per row so the
/// prompt builder never touches shared state.
#[derive(Debug, Clone)]
pub struct VocabularySnapshot {
    pub categories: Vec<String>,
    pub payees: Vec<String>,
    pub notes: Vec<String>,
}

impl Vocabularies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> VocabularySnapshot {
        VocabularySnapshot {
            categories: self.categories.snapshot(),
            payees: self.payees.snapshot(),
            notes: self.notes.snapshot(),
        }
    }
}
