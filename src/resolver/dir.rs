//! Resolver backed by a directory of compiled classes.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use walkdir::WalkDir;

use crate::classfile::read_class;
use crate::common::Result;
use crate::resolver::{Resolution, Resolver};

/// Lazily reads `.class` files under a root directory.
///
/// The directory is walked once at open to build the name index; file
/// contents are read and parsed on first lookup. The internal name of a
/// class is its path relative to the root, so `root/com/example/A.class`
/// resolves `com/example/A`.
pub struct DirResolver {
    root: PathBuf,
    /// Internal name to file path. BTreeMap keeps enumeration ordered.
    index: BTreeMap<String, PathBuf>,
    closed: bool,
}

impl DirResolver {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut index = BTreeMap::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("class") {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&root) else {
                continue;
            };
            let name = relative
                .with_extension("")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            if name.ends_with("module-info") {
                continue;
            }
            index.insert(name, path.to_path_buf());
        }
        debug!(root = %root.display(), classes = index.len(), "opened directory resolver");
        Ok(DirResolver {
            root,
            index,
            closed: false,
        })
    }
}

impl Resolver for DirResolver {
    fn find(&mut self, name: &str) -> Resolution {
        if self.closed {
            return Resolution::NotFound;
        }
        let Some(path) = self.index.get(name) else {
            return Resolution::NotFound;
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return Resolution::FailedToRead(format!("{}: {e}", path.display())),
        };
        match read_class(&bytes) {
            Ok(node) => Resolution::Found(Arc::new(node)),
            Err(e) => Resolution::Invalid(e.to_string()),
        }
    }

    fn contains(&mut self, name: &str) -> bool {
        !self.closed && self.index.contains_key(name)
    }

    fn all_class_names(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    fn class_path(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
