use crate::types::CandidateIdentifier;
use std::collections::HashSet;

/// Identifiers that already produced an alert.
///
/// Grows for the lifetime of the process and is never persisted. Owned by the
/// scheduler, so reads and writes happen on the single aggregation/dispatch
/// path and never overlap with network calls.
#[derive(Debug, Default)]
pub struct DedupStore {
    alerted: HashSet<CandidateIdentifier>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.alerted.contains(id)
    }

    /// Returns `true` if the identifier was not yet marked.
    pub fn mark_alerted(&mut self, id: &str) -> bool {
        if self.alerted.contains(id) {
            return false;
        }
        self.alerted.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.alerted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerted.is_empty()
    }
}
