//! Error handling module for installkit
//!
//! Provides the crate-level error type. Each concern (record parsing, item
//! construction, registry lookups, selection, presets) has its own error enum
//! next to the code that raises it; they all convert into [`CatalogError`].

use thiserror::Error;

use crate::item::DefinitionError;
use crate::preset::PresetError;
use crate::registry::RegistryError;
use crate::selection::SelectionError;

/// Main error type for installkit
#[derive(Error, Debug)]
pub enum CatalogError {
    /// IO errors (reading definitions, walking directories)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A definition record that parsed but cannot be turned into items
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Registry lookups and registration
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Selection state machine failures
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Preset lookup and application failures
    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::config("item extension must start with '.'");
        assert_eq!(
            err.to_string(),
            "Configuration error: item extension must start with '.'"
        );

        let err: CatalogError = RegistryError::UnknownItem {
            id: "ghost".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Registry error: Unknown item id 'ghost'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CatalogError = io_err.into();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[test]
    fn test_definition_error_conversion() {
        let err: CatalogError = DefinitionError::DuplicateCommand {
            item: "editor".to_string(),
            command: "install".to_string(),
        }
        .into();
        assert!(matches!(err, CatalogError::Definition(_)));
        assert!(err.to_string().contains("install"));
    }
}
