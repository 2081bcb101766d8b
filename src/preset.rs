//! Presets: named bundles of items to check and uncheck in one go.
//!
//! A preset definition uses the same `[Core]` section convention as items:
//!
//! ```text
//! [Core]
//! id = developer
//! name = Developer workstation
//! includes = git, editor, compilers
//! excludes = games
//! ```
//!
//! Applying a preset writes the checked flags directly. It does not go
//! through the selection machine, so no dependency checks or confirmations
//! are involved. Radio groups stay exclusive: an included radio item clears
//! its siblings, so of two included siblings the later one wins. Items that
//! are not selectable (check kind `None`) are left alone.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::item::CORE_SECTION;
use crate::record::{split_list, DefinitionRecord};
use crate::registry::{ItemRegistry, RegistryError};
use crate::tree::CategoryTree;

/// Errors raised when looking up or applying presets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("Unknown preset '{id}'")]
    UnknownPreset { id: String },

    /// The preset names items that are not registered; nothing was applied
    #[error("Preset '{preset}' references unknown items: {}", .ids.join(", "))]
    UnknownItems { preset: String, ids: Vec<String> },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub id: String,
    pub name: String,
    /// Ids checked when the preset is applied, in order
    pub includes: Vec<String>,
    /// Ids unchecked when the preset is applied, in order
    pub excludes: Vec<String>,
}

impl Preset {
    /// Parse preset text; `None` for unparsable or incomplete records
    pub fn parse(text: &str) -> Option<Self> {
        match DefinitionRecord::parse(text) {
            Ok(record) => Self::from_record(&record),
            Err(e) => {
                debug!("Skipping unparsable preset record: {}", e);
                None
            }
        }
    }

    /// Build a preset from a parsed record; requires `[Core]` id and name
    pub fn from_record(record: &DefinitionRecord) -> Option<Self> {
        let core = record.section(CORE_SECTION)?;
        let (Some(id), Some(name)) = (core.get("id"), core.get("name")) else {
            debug!("Skipping preset record without both id and name");
            return None;
        };

        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            includes: core.get("includes").map(split_list).unwrap_or_default(),
            excludes: core.get("excludes").map(split_list).unwrap_or_default(),
        })
    }
}

/// What applying a preset changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetReport {
    pub checked: Vec<String>,
    pub unchecked: Vec<String>,
    /// Radio items forced off by an included sibling
    pub cleared: Vec<String>,
    /// Listed items with check kind `None`; their state was not touched
    pub skipped: Vec<String>,
}

/// Presets keyed by id, in registration order
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: Vec<Preset>,
    index: HashMap<String, usize>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preset. The first preset registered under an id wins; later
    /// ones are dropped and `false` is returned.
    pub fn register(&mut self, preset: Preset) -> bool {
        if self.index.contains_key(&preset.id) {
            debug!("Dropping duplicate preset '{}'", preset.id);
            return false;
        }
        self.index.insert(preset.id.clone(), self.presets.len());
        self.presets.push(preset);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.index.get(id).map(|&i| &self.presets[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Apply preset `id` to `items`: includes are checked first, then
    /// excludes are unchecked, so an id in both lists ends up unchecked.
    ///
    /// # Errors
    ///
    /// - `UnknownPreset` if no preset has this id
    /// - `UnknownItems` if any include or exclude is not registered; no
    ///   item is changed in that case
    pub fn apply(
        &self,
        id: &str,
        items: &mut ItemRegistry,
        tree: &CategoryTree,
    ) -> Result<PresetReport, PresetError> {
        let preset = self.get(id).ok_or_else(|| PresetError::UnknownPreset { id: id.to_string() })?;

        let mut unknown: Vec<String> = Vec::new();
        for item in preset.includes.iter().chain(&preset.excludes) {
            if !items.contains(item) && !unknown.contains(item) {
                unknown.push(item.clone());
            }
        }
        if !unknown.is_empty() {
            return Err(PresetError::UnknownItems {
                preset: preset.id.clone(),
                ids: unknown,
            });
        }

        let mut report = PresetReport::default();
        for item in preset.includes.iter().chain(&preset.excludes) {
            let selectable = items
                .first(item)
                .is_some_and(|found| found.check_kind.is_selectable());
            if !selectable && !report.skipped.contains(item) {
                debug!("Preset '{}' skips unselectable item '{}'", preset.id, item);
                report.skipped.push(item.clone());
            }
        }

        for item in &preset.includes {
            if report.skipped.contains(item) {
                continue;
            }
            let cleared = tree.check_exclusive(items, item)?;
            report.cleared.extend(cleared);
            report.checked.push(item.clone());
        }
        for item in &preset.excludes {
            if report.skipped.contains(item) {
                continue;
            }
            items.set_checked(item, false)?;
            report.unchecked.push(item.clone());
        }

        info!(
            "Applied preset '{}': {} checked, {} unchecked, {} skipped",
            preset.id,
            report.checked.len(),
            report.unchecked.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
