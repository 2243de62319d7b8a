use crate::deduplication::DedupStore;
use crate::sources::CandidateSource;
use crate::types::CandidateIdentifier;
use futures_util::future::join_all;
use std::collections::HashSet;
use tracing::debug;

/// Runs every configured source and unions their identifiers.
pub struct Discovery {
    adapters: Vec<Box<dyn CandidateSource>>,
}

impl Discovery {
    pub fn new(adapters: Vec<Box<dyn CandidateSource>>) -> Self {
        Self { adapters }
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    /// Adapters run concurrently; the dedup store is consulted only after
    /// every result has been collected.
    pub async fn discover(&self, dedup: &DedupStore) -> Vec<CandidateIdentifier> {
        let results = join_all(self.adapters.iter().map(|adapter| adapter.fetch())).await;
        let raw: usize = results.iter().map(Vec::len).sum();
        let merged = merge_candidates(results, dedup);
        debug!(
            "[Discovery] {} source(s), {} raw identifier(s), {} new",
            self.adapters.len(),
            raw,
            merged.len()
        );
        merged
    }
}

/// Union in order of first appearance (adapter order, then position), minus
/// anything already alerted.
pub fn merge_candidates(
    results: Vec<Vec<CandidateIdentifier>>,
    dedup: &DedupStore,
) -> Vec<CandidateIdentifier> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .flatten()
        .filter(|id| !dedup.contains(id) && seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<CandidateIdentifier> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn merge_is_ordered_and_excludes_alerted() {
        let mut dedup = DedupStore::new();
        dedup.mark_alerted("B");

        let merged = merge_candidates(
            vec![ids(&["A", "B", "C"]), ids(&[]), ids(&["C", "D", "A", "B"])],
            &dedup,
        );
        assert_eq!(merged, ids(&["A", "C", "D"]));
    }

    #[test]
    fn alerted_identifiers_never_survive_merge() {
        let mut dedup = DedupStore::new();
        for id in ["X", "Y", "Z"] {
            dedup.mark_alerted(id);
        }
        let merged = merge_candidates(vec![ids(&["X", "Y"]), ids(&["Z", "Z", "X"])], &dedup);
        assert!(merged.is_empty());
    }
}
