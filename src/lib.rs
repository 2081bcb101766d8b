//! installkit library
//!
//! Loads installable item and preset definitions, arranges items in a
//! category tree and keeps their selection consistent with dependencies and
//! radio groups.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod item;
pub mod preset;
pub mod record;
pub mod registry;
pub mod selection;
pub mod tree;
pub mod types;

// Re-export main types for convenience
pub use catalog::{Catalog, CatalogBuilder, PlannedItem};
pub use config::CatalogConfig;
pub use discovery::{discover, DefinitionSource};
pub use error::{CatalogError, Result};
pub use item::{Commands, DefinitionError, Item, ItemDefinition};
pub use preset::{Preset, PresetError, PresetRegistry, PresetReport};
pub use record::{DefinitionRecord, RecordError};
pub use registry::{ItemRegistry, RegistryError, ReplicaId};
pub use selection::{Decision, ResolutionPolicy, SelectionError, SelectionMachine};
pub use tree::{CategoryNode, CategoryTree, TreeEntry};
pub use types::{CheckKind, CheckState, Resolution};
