//! Definition file discovery
//!
//! Walks a directory tree and yields every file whose name ends with a given
//! extension, paired with the directory it was found in.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// A definition file and the directory that contains it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DefinitionSource {
    pub path: PathBuf,
    /// Working directory for items defined in `path`
    pub dir: PathBuf,
}

/// Every file under `root` whose name ends with `extension`, sorted by path.
///
/// A missing root yields nothing. Entries that cannot be read (permissions,
/// broken links) are skipped.
pub fn discover(root: &Path, extension: &str) -> Vec<DefinitionSource> {
    if !root.is_dir() {
        debug!("Definition directory {:?} does not exist", root);
        return Vec::new();
    }
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let mut sources: Vec<DefinitionSource> = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", root, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(extension))
        .map(|entry| {
            let path = entry.into_path();
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            DefinitionSource { path, dir }
        })
        .collect();

    sources.sort();
    debug!(
        "Found {} '{}' file(s) under {:?}",
        sources.len(),
        extension,
        root
    );
    sources
}
