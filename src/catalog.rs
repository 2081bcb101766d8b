//! Catalog: the loaded item registry, category tree and presets.
//!
//! A [`Catalog`] only exists once a load pass has finished (parse, register,
//! build tree, cross-link), so selection queries can never see a partially
//! built registry. [`Catalog::reload`] builds a complete replacement before
//! swapping it in; if the new load fails the old catalog is left untouched.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::discovery::{discover, DefinitionSource};
use crate::error::{CatalogError, Result};
use crate::item::{Commands, ItemDefinition};
use crate::preset::{Preset, PresetRegistry, PresetReport};
use crate::registry::ItemRegistry;
use crate::selection::{Decision, ResolutionPolicy, SelectionMachine};
use crate::tree::CategoryTree;
use crate::types::CheckState;

/// Collects definitions before the tree is built
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: ItemRegistry,
    presets: PresetRegistry,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item definition; returns the number of replicas registered
    /// (0 if the text was skipped as unparsable or incomplete).
    ///
    /// # Errors
    ///
    /// - `Definition(DuplicateCommand)` for a repeated command name
    /// - `Registry(ConflictingDependencies)` if an earlier definition with
    ///   the same id declares different dependencies
    pub fn add_item_text(&mut self, text: &str, cwd: &Path) -> Result<usize> {
        let Some(definition) = ItemDefinition::parse(text)? else {
            return Ok(0);
        };
        let replicas = definition.into_replicas(cwd);
        let count = replicas.len();
        for replica in replicas {
            self.items.register(replica)?;
        }
        Ok(count)
    }

    /// Read and add one discovered item file. Unreadable files are skipped.
    pub fn add_item_source(&mut self, source: &DefinitionSource) -> Result<usize> {
        let text = match std::fs::read_to_string(&source.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unreadable item file {:?}: {}", source.path, e);
                return Ok(0);
            }
        };
        self.add_item_text(&text, &source.dir).inspect_err(|e| {
            warn!("Failed to load item file {:?}: {}", source.path, e);
        })
    }

    /// Add a preset definition; `false` if skipped or a duplicate id
    pub fn add_preset_text(&mut self, text: &str) -> bool {
        Preset::parse(text).is_some_and(|preset| self.presets.register(preset))
    }

    /// Read and add one discovered preset file
    pub fn add_preset_source(&mut self, source: &DefinitionSource) -> bool {
        match std::fs::read_to_string(&source.path) {
            Ok(text) => self.add_preset_text(&text),
            Err(e) => {
                warn!("Skipping unreadable preset file {:?}: {}", source.path, e);
                false
            }
        }
    }

    /// Build the category tree and cross-link dependents
    pub fn build(mut self) -> Catalog {
        let tree = CategoryTree::build(&mut self.items);
        Catalog {
            items: self.items,
            tree,
            presets: self.presets,
            config: None,
        }
    }
}

/// One checked item in the install plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub cwd: &'a Path,
    pub commands: &'a Commands,
}

/// A fully loaded set of items and presets
#[derive(Debug, Clone)]
pub struct Catalog {
    items: ItemRegistry,
    tree: CategoryTree,
    presets: PresetRegistry,
    config: Option<CatalogConfig>,
}

impl Catalog {
    /// Discover, parse and assemble everything `config` points at, then
    /// apply the default preset if one is configured and present.
    pub fn load(config: &CatalogConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CatalogError::config(e.to_string()))?;

        let mut builder = CatalogBuilder::new();

        let item_sources = discover(&config.items_dir, &config.item_extension);
        let mut replicas = 0;
        for source in &item_sources {
            replicas += builder.add_item_source(source)?;
        }

        for source in discover(&config.presets_dir, &config.preset_extension) {
            builder.add_preset_source(&source);
        }

        let mut catalog = builder.build();
        catalog.config = Some(config.clone());
        info!(
            "Loaded {} item(s) ({} replicas from {} file(s)), {} categories, {} preset(s)",
            catalog.items.len(),
            replicas,
            item_sources.len(),
            catalog.tree.category_count(),
            catalog.presets.len()
        );

        if let Some(default) = &config.default_preset {
            if catalog.presets.contains(default) {
                match catalog.apply_preset(default) {
                    Ok(_) => debug!("Default preset '{}' applied", default),
                    Err(e) => warn!("Default preset not applied: {}", e),
                }
            }
        }

        Ok(catalog)
    }

    /// Replace this catalog with a fresh load of the same configuration.
    ///
    /// On error the current catalog is kept as it was.
    pub fn reload(&mut self) -> Result<()> {
        let config = self.config.as_ref().ok_or_else(|| {
            CatalogError::config("catalog was not loaded from a configuration")
        })?;
        let fresh = Self::load(config)?;
        *self = fresh;
        Ok(())
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn config(&self) -> Option<&CatalogConfig> {
        self.config.as_ref()
    }

    /// Guarded access to the checked state
    pub fn selection(&mut self) -> SelectionMachine<'_> {
        SelectionMachine::new(&mut self.items, &self.tree)
    }

    /// Shortcut for `selection().request(..)`
    pub fn request(
        &mut self,
        id: &str,
        state: CheckState,
        policy: ResolutionPolicy,
    ) -> Result<Decision> {
        Ok(self.selection().request(id, state, policy)?)
    }

    /// Apply a preset by id (direct writes, no confirmations; radio groups
    /// stay exclusive)
    pub fn apply_preset(&mut self, id: &str) -> Result<PresetReport> {
        Ok(self.presets.apply(id, &mut self.items, &self.tree)?)
    }

    /// Checked items in registration order with what would be run for them
    pub fn install_plan(&self) -> Vec<PlannedItem<'_>> {
        self.items
            .checked_ids()
            .into_iter()
            .filter_map(|id| self.items.first(id))
            .map(|item| PlannedItem {
                id: &item.id,
                name: &item.name,
                cwd: &item.cwd,
                commands: &item.commands,
            })
            .collect()
    }
}
