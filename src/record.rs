//! Definition record format
//!
//! Item and preset definitions are plain text made of named sections holding
//! flat key/value entries:
//!
//! ```text
//! [Core]
//! id = editor
//! name = Text Editor
//! depends = runtime, fonts
//!
//! [Commands]
//! install = setup.exe /quiet
//! ```
//!
//! - `key = value` and `key: value` are both accepted; keys are lower-cased.
//! - `#` and `;` start comment lines.
//! - An indented line continues the value of the entry above it.
//! - A header repeated later in the file extends the earlier section.
//!
//! Entries keep their file order and repeats are not collapsed here; callers
//! decide whether a repeated key means "last wins" or is an error.

use std::path::Path;
use thiserror::Error;

/// Errors that make a record unparsable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The file could not be read
    #[error("Failed to read record: {reason}")]
    Io { reason: String },

    /// A key/value entry appeared before any section header
    #[error("Line {line}: entry outside of any section")]
    EntryOutsideSection { line: usize },

    /// A `[` line without a closing `]` or with an empty name
    #[error("Line {line}: malformed section header")]
    MalformedHeader { line: usize },

    /// A line that is neither header, entry, continuation nor comment
    #[error("Line {line}: expected 'key = value'")]
    MalformedLine { line: usize },
}

impl From<std::io::Error> for RecordError {
    fn from(err: std::io::Error) -> Self {
        RecordError::Io {
            reason: err.to_string(),
        }
    }
}

/// One named section and its entries in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of `key`; when the key is repeated the last occurrence wins
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All entries in file order, repeats included
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// A parsed definition file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionRecord {
    sections: Vec<Section>,
}

impl DefinitionRecord {
    /// Parse a record from text
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let mut record = Self::default();
        // Index into `record.sections` of the section being filled
        let mut current: Option<usize> = None;
        let mut can_continue = false;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                can_continue = false;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw.starts_with(|c: char| c.is_whitespace());
            if indented && can_continue {
                if let Some(section) = current.map(|i| &mut record.sections[i]) {
                    if let Some((_, value)) = section.entries.last_mut() {
                        value.push('\n');
                        value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if trimmed.starts_with('[') {
                let name = trimmed
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or(RecordError::MalformedHeader { line })?;
                current = Some(record.section_index_or_insert(name));
                can_continue = false;
                continue;
            }

            let split_at = trimmed
                .find(['=', ':'])
                .ok_or(RecordError::MalformedLine { line })?;
            let key = trimmed[..split_at].trim();
            if key.is_empty() {
                return Err(RecordError::MalformedLine { line });
            }
            let value = trimmed[split_at + 1..].trim();

            let section = current.ok_or(RecordError::EntryOutsideSection { line })?;
            record.sections[section]
                .entries
                .push((key.to_ascii_lowercase(), value.to_string()));
            can_continue = true;
        }

        Ok(record)
    }

    /// Read and parse a record file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Section names are matched exactly
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Shortcut for `section(section)?.get(key)`
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }
}

/// Split a comma-separated field into trimmed, non-empty elements
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_entries() {
        let record = DefinitionRecord::parse(
            "[Core]\nid = editor\nName: Text Editor\n\n[Commands]\ninstall = setup /q\n",
        )
        .unwrap();

        assert_eq!(record.get("Core", "id"), Some("editor"));
        // Keys are case-insensitive
        assert_eq!(record.get("Core", "name"), Some("Text Editor"));
        assert_eq!(record.get("Commands", "install"), Some("setup /q"));
        assert!(!record.has_section("core"));
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let record =
            DefinitionRecord::parse("# leading comment\n\n[Core]\n; note\nid = a\n").unwrap();
        assert_eq!(record.section("Core").unwrap().entries().len(), 1);
    }

    #[test]
    fn test_value_may_contain_separators() {
        let record =
            DefinitionRecord::parse("[Commands]\nfetch = curl https://example.com/a=b\n").unwrap();
        assert_eq!(
            record.get("Commands", "fetch"),
            Some("curl https://example.com/a=b")
        );
    }

    #[test]
    fn test_continuation_lines_join_with_newline() {
        let record =
            DefinitionRecord::parse("[Core]\nhelptext = first line\n  second line\nid = x\n")
                .unwrap();
        assert_eq!(
            record.get("Core", "helptext"),
            Some("first line\nsecond line")
        );
        assert_eq!(record.get("Core", "id"), Some("x"));
    }

    #[test]
    fn test_repeated_keys_are_kept_and_last_wins() {
        let record = DefinitionRecord::parse("[Core]\nid = a\nid = b\n").unwrap();
        let core = record.section("Core").unwrap();
        assert_eq!(core.entries().len(), 2);
        assert_eq!(core.get("id"), Some("b"));
    }

    #[test]
    fn test_repeated_header_extends_section() {
        let record = DefinitionRecord::parse("[Core]\nid = a\n[Other]\nx = 1\n[Core]\nname = A\n")
            .unwrap();
        assert_eq!(record.get("Core", "id"), Some("a"));
        assert_eq!(record.get("Core", "name"), Some("A"));
    }

    #[test]
    fn test_entry_before_section_is_error() {
        let err = DefinitionRecord::parse("id = a\n[Core]\n").unwrap_err();
        assert_eq!(err, RecordError::EntryOutsideSection { line: 1 });
    }

    #[test]
    fn test_malformed_header_is_error() {
        assert_eq!(
            DefinitionRecord::parse("[Core\nid = a\n").unwrap_err(),
            RecordError::MalformedHeader { line: 1 }
        );
        assert_eq!(
            DefinitionRecord::parse("[ ]\n").unwrap_err(),
            RecordError::MalformedHeader { line: 1 }
        );
    }

    #[test]
    fn test_line_without_separator_is_error() {
        let err = DefinitionRecord::parse("[Core]\njust some words\n").unwrap_err();
        assert_eq!(err, RecordError::MalformedLine { line: 2 });
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(split_list(" a , b,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let err = DefinitionRecord::from_file("/nonexistent/item.info").unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
    }
}
