use crate::core::field::evaluator::FieldTarget;
use crate::core::field::grid::ScalarField;
use std::collections::HashMap;
use std::sync::Arc;

/// Cache key of one generated field: what was sampled, at which resolution,
/// from which model revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub target: FieldTarget,
    pub resolution: [usize; 3],
    pub revision: u64,
}

/// Cache of generated scalar fields.
///
/// Keys carry the model revision, so a mutated model can never be served a
/// stale grid; entries from older revisions are dropped eagerly by
/// [`FieldCache::purge_stale`].
#[derive(Debug, Clone, Default)]
pub struct FieldCache {
    entries: HashMap<FieldKey, Arc<ScalarField>>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FieldKey) -> Option<Arc<ScalarField>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: FieldKey, field: Arc<ScalarField>) {
        self.entries.insert(key, field);
    }

    /// Drops every entry generated from a revision other than `revision`.
    pub fn purge_stale(&mut self, revision: u64) {
        self.entries.retain(|key, _| key.revision == revision);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn key(revision: u64) -> FieldKey {
        FieldKey {
            target: FieldTarget::Orbital(0),
            resolution: [4, 4, 4],
            revision,
        }
    }

    fn field() -> Arc<ScalarField> {
        Arc::new(ScalarField::zeroed(
            Point3::origin(),
            Vector3::new(1.0, 1.0, 1.0),
            [4, 4, 4],
        ))
    }

    #[test]
    fn entries_round_trip_by_key() {
        let mut cache = FieldCache::new();
        cache.insert(key(1), field());
        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_none());

        let other = FieldKey {
            target: FieldTarget::Density,
            ..key(1)
        };
        assert!(cache.get(&other).is_none());
    }

    #[test]
    fn purge_drops_entries_from_other_revisions() {
        let mut cache = FieldCache::new();
        cache.insert(key(1), field());
        cache.insert(key(2), field());
        cache.purge_stale(2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = FieldCache::new();
        cache.insert(key(1), field());
        cache.clear();
        assert!(cache.is_empty());
    }
}
