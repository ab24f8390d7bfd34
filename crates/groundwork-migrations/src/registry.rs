//! The migration registry.
//!
//! A [`MigrationRegistry`] holds the statically registered units for one
//! target kind and hands them out in ascending [`MigrationId`] order. The
//! original deployment scripts relied on filesystem listing order; here the
//! total order is explicit and duplicate ids are rejected at registration
//! time, so a broken deployment never partially migrates.

use std::sync::Arc;

use groundwork_core::{GroundworkError, GroundworkResult};

use crate::migration::{MigrationId, MigrationUnit, TargetKind};

/// An ordered collection of migration units for one target kind.
///
/// Units are kept sorted ascending by id on insertion; [`list`](Self::list)
/// is a plain slice access with no side effects.
pub struct MigrationRegistry<A: ?Sized> {
    kind: TargetKind,
    units: Vec<Arc<dyn MigrationUnit<A>>>,
}

impl<A: ?Sized> MigrationRegistry<A> {
    /// Creates an empty registry for the given target kind.
    pub const fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            units: Vec::new(),
        }
    }

    /// Registers a unit.
    ///
    /// Fails with [`GroundworkError::DuplicateId`] if a unit with the same
    /// id is already registered for this target kind.
    pub fn register(&mut self, unit: Arc<dyn MigrationUnit<A>>) -> GroundworkResult<()> {
        match self
            .units
            .binary_search_by(|existing| existing.id().cmp(unit.id()))
        {
            Ok(_) => Err(GroundworkError::DuplicateId(format!(
                "{} ({})",
                unit.id(),
                self.kind
            ))),
            Err(pos) => {
                self.units.insert(pos, unit);
                Ok(())
            }
        }
    }

    /// Returns all units in ascending id order.
    pub fn list(&self) -> &[Arc<dyn MigrationUnit<A>>] {
        &self.units
    }

    /// Returns the unit with the given id, if registered.
    pub fn get(&self, id: &MigrationId) -> Option<&Arc<dyn MigrationUnit<A>>> {
        self.units
            .binary_search_by(|existing| existing.id().cmp(id))
            .ok()
            .map(|pos| &self.units[pos])
    }

    /// Returns whether a unit with the given id is registered.
    pub fn contains(&self, id: &MigrationId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the target kind this registry serves.
    pub const fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns the number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoopUnit {
        id: MigrationId,
    }

    impl NoopUnit {
        fn boxed(stamp: i64, slug: &str) -> Arc<dyn MigrationUnit<()>> {
            Arc::new(Self {
                id: MigrationId::new(stamp, slug),
            })
        }
    }

    #[async_trait]
    impl MigrationUnit<()> for NoopUnit {
        fn id(&self) -> &MigrationId {
            &self.id
        }

        fn describe(&self) -> String {
            format!("noop {}", self.id)
        }

        async fn up(&self, _adapter: &()) -> GroundworkResult<()> {
            Ok(())
        }

        async fn down(&self, _adapter: &()) -> GroundworkResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_new() {
        let registry: MigrationRegistry<()> = MigrationRegistry::new(TargetKind::DocumentStore);
        assert!(registry.is_empty());
        assert_eq!(registry.kind(), TargetKind::DocumentStore);
    }

    #[test]
    fn test_registry_orders_by_id() {
        let mut registry = MigrationRegistry::new(TargetKind::DocumentStore);
        registry.register(NoopUnit::boxed(3, "third")).unwrap();
        registry.register(NoopUnit::boxed(1, "first")).unwrap();
        registry.register(NoopUnit::boxed(2, "second")).unwrap();

        let stamps: Vec<i64> = registry.list().iter().map(|u| u.id().stamp()).collect();
        assert_eq!(stamps, vec![1, 2, 3]);
    }

    #[test]
    fn test_registry_rejects_duplicate_id() {
        let mut registry = MigrationRegistry::new(TargetKind::DocumentStore);
        registry.register(NoopUnit::boxed(1, "one")).unwrap();
        let result = registry.register(NoopUnit::boxed(1, "one"));
        assert!(matches!(result, Err(GroundworkError::DuplicateId(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_same_stamp_different_slug_allowed() {
        let mut registry = MigrationRegistry::new(TargetKind::DocumentStore);
        registry.register(NoopUnit::boxed(1, "aa")).unwrap();
        registry.register(NoopUnit::boxed(1, "bb")).unwrap();

        let slugs: Vec<String> = registry
            .list()
            .iter()
            .map(|u| u.id().slug().to_string())
            .collect();
        assert_eq!(slugs, vec!["aa", "bb"]);
    }

    #[test]
    fn test_registry_get_and_contains() {
        let mut registry = MigrationRegistry::new(TargetKind::DocumentStore);
        registry.register(NoopUnit::boxed(7, "seven")).unwrap();

        let id = MigrationId::new(7, "seven");
        assert!(registry.contains(&id));
        assert_eq!(registry.get(&id).unwrap().id(), &id);
        assert!(!registry.contains(&MigrationId::new(8, "eight")));
    }
}
