//! Item registry
//!
//! Stores every item replica, keyed by logical id. One id can own several
//! replicas (one per category); the registry keeps their checked state and
//! their dependency lists identical.
//!
//! Replicas live in a flat arena in registration order. The category tree
//! refers to them by [`ReplicaId`] instead of holding references, so there is
//! no ownership cycle between tree and registry.

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::item::Item;

/// Errors raised by registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The id has no registered replica
    #[error("Unknown item id '{id}'")]
    UnknownItem { id: String },

    /// A new replica disagrees with existing replicas on its dependencies
    #[error("Item '{id}' declares dependencies {found:?} but existing replicas declare {expected:?}")]
    ConflictingDependencies {
        id: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Position of a replica in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicaId(usize);

/// Keyed collection of item replicas
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    replicas: Vec<Item>,
    by_id: HashMap<String, Vec<ReplicaId>>,
    /// Logical ids in first-registration order
    order: Vec<String>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a replica under its id.
    ///
    /// The replica adopts the checked state of any replicas already stored
    /// under the same id.
    ///
    /// # Errors
    ///
    /// - `ConflictingDependencies` if its `depends` differs from the
    ///   existing replicas'
    pub fn register(&mut self, mut item: Item) -> Result<ReplicaId, RegistryError> {
        if let Some(existing) = self.first(&item.id) {
            if existing.depends != item.depends {
                return Err(RegistryError::ConflictingDependencies {
                    id: item.id.clone(),
                    expected: existing.depends.clone(),
                    found: item.depends.clone(),
                });
            }
            item.checked = existing.checked;
            item.depended_by = existing.depended_by.clone();
        }

        let replica = ReplicaId(self.replicas.len());
        match self.by_id.get_mut(&item.id) {
            Some(list) => list.push(replica),
            None => {
                self.order.push(item.id.clone());
                self.by_id.insert(item.id.clone(), vec![replica]);
            }
        }
        debug!("Registered '{}' in category '{}'", item.id, item.category);
        self.replicas.push(item);
        Ok(replica)
    }

    /// Set the checked state of every replica of `id`.
    ///
    /// # Errors
    ///
    /// - `UnknownItem` if nothing is registered under `id`
    pub fn set_checked(&mut self, id: &str, value: bool) -> Result<(), RegistryError> {
        let replicas = self.by_id.get(id).ok_or_else(|| unknown(id))?;
        for replica in replicas {
            self.replicas[replica.0].checked = value;
        }
        Ok(())
    }

    /// Checked state shared by the replicas of `id`
    pub fn is_checked(&self, id: &str) -> Result<bool, RegistryError> {
        self.first(id)
            .map(|item| item.checked)
            .ok_or_else(|| unknown(id))
    }

    /// Every id reachable from `id` through `depends`, transitively.
    ///
    /// `id` itself is only part of the result when a dependency cycle leads
    /// back to it. Dependency ids that are not registered are included but
    /// not followed.
    pub fn dependency_closure(&self, id: &str) -> Result<BTreeSet<String>, RegistryError> {
        let root = self.first(id).ok_or_else(|| unknown(id))?;

        let mut closure = BTreeSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = root.depends.iter().rev().map(String::as_str).collect();

        while let Some(dep) = stack.pop() {
            if !visited.insert(dep) {
                continue;
            }
            closure.insert(dep.to_string());
            if let Some(item) = self.first(dep) {
                stack.extend(item.depends.iter().rev().map(String::as_str));
            }
        }

        Ok(closure)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All replicas of `id` in registration order (empty for unknown ids)
    pub fn replicas<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Item> + use<'a> {
        self.by_id
            .get(id)
            .into_iter()
            .flatten()
            .map(|r| &self.replicas[r.0])
    }

    /// Any replica of `id`; all of them agree on everything but category
    pub fn first(&self, id: &str) -> Option<&Item> {
        self.by_id
            .get(id)
            .and_then(|list| list.first())
            .map(|r| &self.replicas[r.0])
    }

    pub fn replica(&self, replica: ReplicaId) -> &Item {
        &self.replicas[replica.0]
    }

    /// Every replica with its handle, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (ReplicaId, &Item)> {
        self.replicas
            .iter()
            .enumerate()
            .map(|(i, item)| (ReplicaId(i), item))
    }

    /// Logical ids in first-registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Logical ids currently checked, in registration order
    pub fn checked_ids(&self) -> Vec<&str> {
        self.ids()
            .filter(|id| self.first(id).is_some_and(|item| item.checked))
            .collect()
    }

    /// Number of logical ids
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Record that `dependent` depends on `id`, on every replica of `id`.
    /// Returns `false` if `id` is not registered.
    pub(crate) fn add_dependent(&mut self, id: &str, dependent: &str) -> bool {
        let Some(replicas) = self.by_id.get(id) else {
            return false;
        };
        for replica in replicas {
            let item = &mut self.replicas[replica.0];
            if !item.depended_by.iter().any(|d| d == dependent) {
                item.depended_by.push(dependent.to_string());
            }
        }
        true
    }
}

fn unknown(id: &str) -> RegistryError {
    RegistryError::UnknownItem { id: id.to_string() }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::item::Commands;
    use crate::types::CheckKind;
    use std::path::PathBuf;

    /// Minimal replica for registry-level tests
    pub(crate) fn item(id: &str, category: &str, depends: &[&str]) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_uppercase(),
            summary: String::new(),
            tooltip: String::new(),
            helptext: String::new(),
            cwd: PathBuf::from("/defs"),
            commands: Commands::new(),
            check_kind: CheckKind::Checkbox,
            depends: depends.iter().map(|d| d.to_string()).collect(),
            category: category.to_string(),
            checked: false,
            depended_by: Vec::new(),
        }
    }

    #[test]
    fn test_register_groups_replicas_by_id() {
        let mut registry = ItemRegistry::new();
        registry.register(item("x", "Tools", &[])).unwrap();
        registry.register(item("x", "Utils", &[])).unwrap();
        registry.register(item("y", "Tools", &[])).unwrap();

        assert_eq!(registry.len(), 2);
        let categories: Vec<&str> = registry.replicas("x").map(|i| i.category.as_str()).collect();
        assert_eq!(categories, vec!["Tools", "Utils"]);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_set_checked_fans_out_to_replicas() {
        let mut registry = ItemRegistry::new();
        registry.register(item("x", "Tools", &[])).unwrap();
        registry.register(item("x", "Utils", &[])).unwrap();

        registry.set_checked("x", true).unwrap();
        assert!(registry.replicas("x").all(|i| i.is_checked()));
        assert!(registry.is_checked("x").unwrap());

        registry.set_checked("x", false).unwrap();
        assert!(registry.replicas("x").all(|i| !i.is_checked()));
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let mut registry = ItemRegistry::new();
        let expected = RegistryError::UnknownItem {
            id: "ghost".to_string(),
        };
        assert_eq!(registry.set_checked("ghost", true), Err(expected.clone()));
        assert_eq!(registry.is_checked("ghost"), Err(expected.clone()));
        assert_eq!(registry.dependency_closure("ghost"), Err(expected));
    }

    #[test]
    fn test_late_replica_adopts_checked_state() {
        let mut registry = ItemRegistry::new();
        registry.register(item("x", "Tools", &[])).unwrap();
        registry.set_checked("x", true).unwrap();
        registry.register(item("x", "Utils", &[])).unwrap();
        assert!(registry.replicas("x").all(|i| i.is_checked()));
    }

    #[test]
    fn test_conflicting_dependencies_rejected() {
        let mut registry = ItemRegistry::new();
        registry.register(item("x", "Tools", &["a"])).unwrap();
        let err = registry.register(item("x", "Utils", &["b"])).unwrap_err();
        assert!(matches!(err, RegistryError::ConflictingDependencies { .. }));
        assert_eq!(registry.replicas("x").count(), 1);
    }

    #[test]
    fn test_dependency_closure_is_transitive() {
        let mut registry = ItemRegistry::new();
        registry.register(item("app", "A", &["lib", "fonts"])).unwrap();
        registry.register(item("lib", "A", &["runtime"])).unwrap();
        registry.register(item("runtime", "A", &[])).unwrap();
        registry.register(item("fonts", "A", &[])).unwrap();

        let closure = registry.dependency_closure("app").unwrap();
        let expected: BTreeSet<String> = ["lib", "fonts", "runtime"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(closure, expected);
        assert!(registry.dependency_closure("runtime").unwrap().is_empty());
    }

    #[test]
    fn test_dependency_closure_terminates_on_cycle() {
        let mut registry = ItemRegistry::new();
        registry.register(item("a", "C", &["b"])).unwrap();
        registry.register(item("b", "C", &["a"])).unwrap();

        let closure = registry.dependency_closure("a").unwrap();
        assert!(closure.contains("a"));
        assert!(closure.contains("b"));
        assert_eq!(closure.len(), 2);
    }

    #[test]
    fn test_dependency_closure_includes_missing_ids() {
        let mut registry = ItemRegistry::new();
        registry.register(item("a", "C", &["ghost"])).unwrap();
        let closure = registry.dependency_closure("a").unwrap();
        assert!(closure.contains("ghost"));
    }

    #[test]
    fn test_add_dependent_updates_all_replicas_once() {
        let mut registry = ItemRegistry::new();
        registry.register(item("lib", "A", &[])).unwrap();
        registry.register(item("lib", "B", &[])).unwrap();

        assert!(registry.add_dependent("lib", "app"));
        assert!(registry.add_dependent("lib", "app"));
        assert!(!registry.add_dependent("ghost", "app"));

        for replica in registry.replicas("lib") {
            assert_eq!(replica.depended_by(), ["app".to_string()]);
        }
    }

    #[test]
    fn test_checked_ids_in_registration_order() {
        let mut registry = ItemRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register(item(id, "X", &[])).unwrap();
        }
        registry.set_checked("b", true).unwrap();
        registry.set_checked("c", true).unwrap();
        assert_eq!(registry.checked_ids(), vec!["c", "b"]);
    }
}
