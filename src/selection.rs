//! Selection State Machine
//!
//! Every user-driven change to an item's checked state goes through here.
//! A request either applies, or comes back with a [`Decision`] describing
//! what the caller has to resolve first. Nothing is written unless the whole
//! transition, including any cascade, is legal.
//!
//! # Rules
//!
//! Checking an item:
//! 1. All of its dependencies must exist, otherwise `MissingDependencies`.
//! 2. Unchecked dependencies need a resolution: accept checks them first
//!    (recursively, same policy), ignore leaves them off, decline aborts.
//! 3. A radio item forces every other member of its radio groups off.
//!
//! Unchecking an item:
//! 1. Checked dependents need a resolution: accept unchecks them first
//!    (recursively, same policy), ignore leaves them on, decline aborts.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::registry::{ItemRegistry, RegistryError};
use crate::tree::CategoryTree;
use crate::types::{CheckKind, CheckState, Resolution};

/// Errors that make a request invalid regardless of resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The item (or one it would cascade to) has check kind `None`
    #[error("Item '{id}' cannot be selected")]
    NotSelectable { id: String },
}

/// Answers supplied up front for the confirmations a request may need.
///
/// `None` means "ask me": the request returns a `Needs...Confirm` decision
/// instead of resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionPolicy {
    /// Applied to unchecked dependencies when checking
    pub dependencies: Option<Resolution>,
    /// Applied to checked dependents when unchecking
    pub dependents: Option<Resolution>,
}

impl ResolutionPolicy {
    /// Resolve nothing; every ambiguity is returned to the caller
    pub fn ask() -> Self {
        Self::default()
    }

    /// Resolve both kinds of ambiguity the same way
    pub fn always(resolution: Resolution) -> Self {
        Self {
            dependencies: Some(resolution),
            dependents: Some(resolution),
        }
    }

    pub fn with_dependencies(mut self, resolution: Resolution) -> Self {
        self.dependencies = Some(resolution);
        self
    }

    pub fn with_dependents(mut self, resolution: Resolution) -> Self {
        self.dependents = Some(resolution);
        self
    }
}

/// Outcome of a selection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// State changed as requested (plus any cascade)
    Applied,
    /// The item already had the requested state
    Unchanged,
    /// The supplied policy declined the cascade; nothing changed
    Declined,
    /// These dependency ids do not exist; nothing changed
    MissingDependencies(Vec<String>),
    /// These dependencies are unchecked and no resolution was supplied
    NeedsDependencyConfirm(Vec<String>),
    /// These dependents are checked and no resolution was supplied
    NeedsDependentConfirm(Vec<String>),
}

impl Decision {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Whether the caller can retry with a resolution
    #[inline]
    pub fn needs_confirmation(&self) -> bool {
        matches!(
            self,
            Self::NeedsDependencyConfirm(_) | Self::NeedsDependentConfirm(_)
        )
    }
}

/// Guarded access to the checked flags of a registry.
///
/// Borrows the registry mutably for its lifetime, so no other code can
/// write checked state while a transition runs.
pub struct SelectionMachine<'a> {
    registry: &'a mut ItemRegistry,
    tree: &'a CategoryTree,
}

impl<'a> SelectionMachine<'a> {
    pub fn new(registry: &'a mut ItemRegistry, tree: &'a CategoryTree) -> Self {
        Self { registry, tree }
    }

    /// Request that `id` becomes `state`.
    ///
    /// # Errors
    ///
    /// - `Registry(UnknownItem)` if `id` is not registered
    /// - `NotSelectable` if `id`, or an item an accepted cascade would
    ///   check, has check kind `None`
    pub fn request(
        &mut self,
        id: &str,
        state: CheckState,
        policy: ResolutionPolicy,
    ) -> Result<Decision, SelectionError> {
        let item = self
            .registry
            .first(id)
            .ok_or_else(|| RegistryError::UnknownItem { id: id.to_string() })?;
        if !item.check_kind.is_selectable() {
            return Err(SelectionError::NotSelectable { id: id.to_string() });
        }
        if item.is_checked() == state.is_checked() {
            return Ok(Decision::Unchanged);
        }

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let blocked = match state {
            CheckState::Checked => self.plan_check(id, policy, &mut order, &mut visited)?,
            CheckState::Unchecked => self.plan_uncheck(id, policy, &mut order, &mut visited)?,
        };
        if let Some(decision) = blocked {
            debug!("Request to set '{}' {} stopped: {:?}", id, state, decision);
            return Ok(decision);
        }

        for target in &order {
            match state {
                CheckState::Checked => self.apply_check(target)?,
                CheckState::Unchecked => self.registry.set_checked(target, false)?,
            }
        }
        info!("Set '{}' {} ({} item(s) changed)", id, state, order.len());
        Ok(Decision::Applied)
    }

    /// Shortcut for `request(id, Checked, policy)`
    pub fn check(&mut self, id: &str, policy: ResolutionPolicy) -> Result<Decision, SelectionError> {
        self.request(id, CheckState::Checked, policy)
    }

    /// Shortcut for `request(id, Unchecked, policy)`
    pub fn uncheck(
        &mut self,
        id: &str,
        policy: ResolutionPolicy,
    ) -> Result<Decision, SelectionError> {
        self.request(id, CheckState::Unchecked, policy)
    }

    /// Collect, dependencies first, every id that checking `id` will check.
    /// Returns a decision when the request cannot proceed.
    fn plan_check(
        &self,
        id: &str,
        policy: ResolutionPolicy,
        order: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> Result<Option<Decision>, SelectionError> {
        if !visited.insert(id.to_string()) {
            return Ok(None);
        }
        let item = self
            .registry
            .first(id)
            .ok_or_else(|| RegistryError::UnknownItem { id: id.to_string() })?;
        if item.check_kind == CheckKind::None {
            return Err(SelectionError::NotSelectable { id: id.to_string() });
        }

        let missing: Vec<String> = item
            .depends
            .iter()
            .filter(|dep| !self.registry.contains(dep))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Ok(Some(Decision::MissingDependencies(missing)));
        }

        let unchecked: Vec<String> = item
            .depends
            .iter()
            .filter(|dep| matches!(self.registry.is_checked(dep), Ok(false)))
            .cloned()
            .collect();
        if !unchecked.is_empty() {
            match policy.dependencies {
                None => return Ok(Some(Decision::NeedsDependencyConfirm(unchecked))),
                Some(Resolution::Decline) => return Ok(Some(Decision::Declined)),
                Some(Resolution::Ignore) => {}
                Some(Resolution::Accept) => {
                    for dep in &unchecked {
                        if let Some(decision) = self.plan_check(dep, policy, order, visited)? {
                            return Ok(Some(decision));
                        }
                    }
                }
            }
        }

        order.push(id.to_string());
        Ok(None)
    }

    /// Collect, dependents first, every id that unchecking `id` will uncheck
    fn plan_uncheck(
        &self,
        id: &str,
        policy: ResolutionPolicy,
        order: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> Result<Option<Decision>, SelectionError> {
        if !visited.insert(id.to_string()) {
            return Ok(None);
        }
        let item = self
            .registry
            .first(id)
            .ok_or_else(|| RegistryError::UnknownItem { id: id.to_string() })?;

        let checked: Vec<String> = item
            .depended_by()
            .iter()
            .filter(|dependent| matches!(self.registry.is_checked(dependent), Ok(true)))
            .cloned()
            .collect();
        if !checked.is_empty() {
            match policy.dependents {
                None => return Ok(Some(Decision::NeedsDependentConfirm(checked))),
                Some(Resolution::Decline) => return Ok(Some(Decision::Declined)),
                Some(Resolution::Ignore) => {}
                Some(Resolution::Accept) => {
                    for dependent in &checked {
                        if let Some(decision) =
                            self.plan_uncheck(dependent, policy, order, visited)?
                        {
                            return Ok(Some(decision));
                        }
                    }
                }
            }
        }

        order.push(id.to_string());
        Ok(None)
    }

    /// Check one item, first forcing its radio siblings off
    fn apply_check(&mut self, id: &str) -> Result<(), RegistryError> {
        self.tree.check_exclusive(self.registry, id).map(|_| ())
    }
}
