//! Installable items and their definition records.
//!
//! An item definition lives in a `[Core]` section (identity, texts, check
//! kind, dependencies, categories) and an optional `[Commands]` section of
//! command-name to command-string pairs. One definition produces one
//! [`Item`] replica per category it lists.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::record::{split_list, DefinitionRecord};
use crate::types::CheckKind;

/// Section holding identity and metadata
pub const CORE_SECTION: &str = "Core";

/// Section holding command-name to command-string pairs
pub const COMMANDS_SECTION: &str = "Commands";

/// Category used when a definition lists none
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Help text used when a definition has none
pub const HELPTEXT_PLACEHOLDER: &str = "<i>No information is available for this item</i>";

/// Errors that abort construction of an item definition.
///
/// Missing or malformed data is not an error (the record is skipped); these
/// are definitions that parse but would misbehave at install time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The `[Commands]` section names the same command twice
    #[error("Command '{command}' for item with id '{item}' already exists")]
    DuplicateCommand { item: String, command: String },
}

/// Ordered command-name to command-string mapping with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commands {
    entries: Vec<(String, String)>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; returns `false` and leaves the mapping untouched if
    /// the name is already present
    pub fn insert(&mut self, name: impl Into<String>, command: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, command.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Iterate `(name, command)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One per-category replica of an installable item.
///
/// The selection state (`checked`) and the reverse dependency list
/// (`depended_by`) are owned by the registry and only change through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub tooltip: String,
    pub helptext: String,
    /// Directory the definition file was found in; commands run from here
    pub cwd: PathBuf,
    pub commands: Commands,
    pub check_kind: CheckKind,
    pub depends: Vec<String>,
    /// Slash-delimited category path of this replica
    pub category: String,
    pub(crate) checked: bool,
    pub(crate) depended_by: Vec<String>,
}

impl Item {
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Ids of items that declare this one in their `depends`
    pub fn depended_by(&self) -> &[String] {
        &self.depended_by
    }
}

/// A parsed item definition, before it is split into per-category replicas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub tooltip: String,
    pub helptext: String,
    pub check_kind: CheckKind,
    pub commands: Commands,
    pub depends: Vec<String>,
    pub categories: Vec<String>,
}

impl ItemDefinition {
    /// Parse definition text.
    ///
    /// Returns `Ok(None)` for text that is unparsable or lacks the required
    /// `[Core]` fields.
    pub fn parse(text: &str) -> Result<Option<Self>, DefinitionError> {
        match DefinitionRecord::parse(text) {
            Ok(record) => Self::from_record(&record),
            Err(e) => {
                debug!("Skipping unparsable item record: {}", e);
                Ok(None)
            }
        }
    }

    /// Build a definition from an already parsed record.
    ///
    /// # Errors
    ///
    /// - `DuplicateCommand` if `[Commands]` repeats a command name
    pub fn from_record(record: &DefinitionRecord) -> Result<Option<Self>, DefinitionError> {
        let Some(core) = record.section(CORE_SECTION) else {
            debug!("Skipping item record without [{}] section", CORE_SECTION);
            return Ok(None);
        };
        let (Some(id), Some(name)) = (core.get("id"), core.get("name")) else {
            debug!("Skipping item record without both id and name");
            return Ok(None);
        };

        let check_kind = match core.get("checktype") {
            None => CheckKind::default(),
            Some(raw) => match raw.parse::<i64>().ok().and_then(CheckKind::from_code) {
                Some(kind) => kind,
                None => {
                    debug!("Skipping item '{}': invalid checktype '{}'", id, raw);
                    return Ok(None);
                }
            },
        };

        let mut commands = Commands::new();
        if let Some(section) = record.section(COMMANDS_SECTION) {
            for (command, value) in section.entries() {
                if !commands.insert(command.clone(), value.clone()) {
                    return Err(DefinitionError::DuplicateCommand {
                        item: id.to_string(),
                        command: command.clone(),
                    });
                }
            }
        }

        let mut categories = Vec::new();
        for category in split_list(core.get("categories").unwrap_or(DEFAULT_CATEGORY)) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        if categories.is_empty() {
            categories.push(DEFAULT_CATEGORY.to_string());
        }

        Ok(Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            summary: core.get("summary").unwrap_or_default().to_string(),
            tooltip: core.get("tooltip").unwrap_or_default().to_string(),
            helptext: core
                .get("helptext")
                .unwrap_or(HELPTEXT_PLACEHOLDER)
                .to_string(),
            check_kind,
            commands,
            depends: core.get("depends").map(split_list).unwrap_or_default(),
            categories,
        }))
    }

    /// Produce one replica per category, all unchecked
    pub fn into_replicas(self, cwd: &Path) -> Vec<Item> {
        self.categories
            .iter()
            .map(|category| Item {
                id: self.id.clone(),
                name: self.name.clone(),
                summary: self.summary.clone(),
                tooltip: self.tooltip.clone(),
                helptext: self.helptext.clone(),
                cwd: cwd.to_path_buf(),
                commands: self.commands.clone(),
                check_kind: self.check_kind,
                depends: self.depends.clone(),
                category: category.clone(),
                checked: false,
                depended_by: Vec::new(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
[Core]
id = editor
name = Text Editor
summary = Edits text
tooltip = A small editor
helptext = Long help
checktype = 2
depends = runtime , fonts
categories = Tools/Editors, Office

[Commands]
install = setup.exe /quiet
configure = cfg.exe
";

    #[test]
    fn test_parse_full_definition() {
        let def = ItemDefinition::parse(FULL).unwrap().unwrap();
        assert_eq!(def.id, "editor");
        assert_eq!(def.name, "Text Editor");
        assert_eq!(def.summary, "Edits text");
        assert_eq!(def.tooltip, "A small editor");
        assert_eq!(def.helptext, "Long help");
        assert_eq!(def.check_kind, CheckKind::Radio);
        assert_eq!(def.depends, vec!["runtime", "fonts"]);
        assert_eq!(def.categories, vec!["Tools/Editors", "Office"]);

        let names: Vec<&str> = def.commands.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["install", "configure"]);
        assert_eq!(def.commands.get("install"), Some("setup.exe /quiet"));
    }

    #[test]
    fn test_defaults_applied() {
        let def = ItemDefinition::parse("[Core]\nid = a\nname = A\n")
            .unwrap()
            .unwrap();
        assert_eq!(def.summary, "");
        assert_eq!(def.tooltip, "");
        assert_eq!(def.helptext, HELPTEXT_PLACEHOLDER);
        assert_eq!(def.check_kind, CheckKind::Checkbox);
        assert_eq!(def.categories, vec![DEFAULT_CATEGORY]);
        assert!(def.depends.is_empty());
        assert!(def.commands.is_empty());
    }

    #[test]
    fn test_empty_lists() {
        let def = ItemDefinition::parse("[Core]\nid = a\nname = A\ndepends =\ncategories =\n")
            .unwrap()
            .unwrap();
        assert!(def.depends.is_empty());
        assert_eq!(def.categories, vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn test_rejects_incomplete_records() {
        assert_eq!(ItemDefinition::parse("[Other]\nid = a\nname = A\n"), Ok(None));
        assert_eq!(ItemDefinition::parse("[Core]\nname = A\n"), Ok(None));
        assert_eq!(ItemDefinition::parse("[Core]\nid = a\n"), Ok(None));
        assert_eq!(ItemDefinition::parse("not a record at all"), Ok(None));
        assert_eq!(ItemDefinition::parse(""), Ok(None));
    }

    #[test]
    fn test_invalid_checktype_rejected() {
        assert_eq!(
            ItemDefinition::parse("[Core]\nid = a\nname = A\nchecktype = radio\n"),
            Ok(None)
        );
        assert_eq!(
            ItemDefinition::parse("[Core]\nid = a\nname = A\nchecktype = 7\n"),
            Ok(None)
        );
    }

    #[test]
    fn test_checktype_zero_is_none() {
        let def = ItemDefinition::parse("[Core]\nid = h\nname = Header\nchecktype = 0\n")
            .unwrap()
            .unwrap();
        assert_eq!(def.check_kind, CheckKind::None);
    }

    #[test]
    fn test_duplicate_command_is_fatal() {
        let text = "[Core]\nid = x\nname = X\n[Commands]\ninstall = a\ninstall = b\n";
        let err = ItemDefinition::parse(text).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateCommand {
                item: "x".to_string(),
                command: "install".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_command_names_are_case_insensitive() {
        let text = "[Core]\nid = x\nname = X\n[Commands]\nInstall = a\ninstall = b\n";
        assert!(ItemDefinition::parse(text).is_err());
    }

    #[test]
    fn test_one_replica_per_category() {
        let def = ItemDefinition::parse(FULL).unwrap().unwrap();
        let replicas = def.into_replicas(Path::new("/defs/editor"));

        assert_eq!(replicas.len(), 2);
        assert_eq!(replicas[0].category, "Tools/Editors");
        assert_eq!(replicas[1].category, "Office");
        for replica in &replicas {
            assert_eq!(replica.id, "editor");
            assert_eq!(replica.cwd, Path::new("/defs/editor"));
            assert_eq!(replica.commands.len(), 2);
            assert!(!replica.is_checked());
            assert!(replica.depended_by().is_empty());
        }
    }

    #[test]
    fn test_repeated_category_yields_single_replica() {
        let def = ItemDefinition::parse("[Core]\nid = a\nname = A\ncategories = Tools, Tools\n")
            .unwrap()
            .unwrap();
        assert_eq!(def.into_replicas(Path::new("/")).len(), 1);
    }

    #[test]
    fn test_commands_insert_rejects_duplicates() {
        let mut commands = Commands::new();
        assert!(commands.insert("install", "a"));
        assert!(!commands.insert("install", "b"));
        assert_eq!(commands.get("install"), Some("a"));
        assert_eq!(commands.len(), 1);
    }
}
