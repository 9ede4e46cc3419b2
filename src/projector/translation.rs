use crate::destination::{DestinationId, EntityKind};
use std::collections::HashMap;
use tracing::warn;

/// Run-scoped map from legacy numeric ID to destination identifier, per kind.
///
/// Append-only: once a legacy ID is mapped it keeps that mapping for the rest
/// of the run.
#[derive(Debug, Default)]
pub struct TranslationMap {
    entries: HashMap<EntityKind, HashMap<i64, DestinationId>>,
}

impl TranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping and return the one in effect, which is the earlier
    /// mapping if this legacy ID was already translated.
    pub fn record(
        &mut self,
        kind: EntityKind,
        legacy_id: i64,
        id: DestinationId,
    ) -> &DestinationId {
        let mapped = self
            .entries
            .entry(kind)
            .or_default()
            .entry(legacy_id)
            .or_insert_with(|| id.clone());
        if *mapped != id {
            warn!(
                kind = %kind,
                legacy_id,
                kept = %mapped,
                ignored = %id,
                "legacy id already translated"
            );
        }
        mapped
    }

    pub fn resolve(&self, kind: EntityKind, legacy_id: i64) -> Option<&DestinationId> {
        self.entries.get(&kind)?.get(&legacy_id)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.entries.get(&kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_never_replaced() {
        let mut map = TranslationMap::new();
        let first = DestinationId::new("a");
        assert_eq!(map.record(EntityKind::Project, 7, first.clone()), &first);
        assert_eq!(map.record(EntityKind::Project, 7, DestinationId::new("b")), &first);
        assert_eq!(map.resolve(EntityKind::Project, 7), Some(&first));
        assert_eq!(map.len(EntityKind::Project), 1);
    }

    #[test]
    fn test_kinds_are_separate() {
        let mut map = TranslationMap::new();
        map.record(EntityKind::Project, 1, DestinationId::new("p"));
        assert_eq!(map.resolve(EntityKind::Property, 1), None);
        assert!(!map.is_empty());
    }
}
