//! Resolver backed by a single jar archive.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use zip::ZipArchive;

use crate::classfile::read_class;
use crate::common::{Error, Result};
use crate::resolver::{Resolution, Resolver};

/// Lazily reads `.class` entries out of one jar.
///
/// The entry listing is taken eagerly at open so that `contains` and
/// enumeration never touch the archive again; class bytes are read and
/// parsed on first lookup.
pub struct JarResolver {
    path: PathBuf,
    archive: Option<ZipArchive<File>>,
    /// Internal class names present in the archive, sorted.
    entries: Vec<String>,
}

impl JarResolver {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let archive = ZipArchive::new(file)
            .map_err(|e| Error::archive(format!("{}: {e}", path.display())))?;

        let mut entries: Vec<String> = archive
            .file_names()
            .filter(|name| name.ends_with(".class") && !name.ends_with("module-info.class"))
            .map(|name| name.trim_end_matches(".class").to_string())
            .collect();
        entries.sort();
        entries.dedup();
        debug!(jar = %path.display(), classes = entries.len(), "opened jar resolver");

        Ok(JarResolver {
            path,
            archive: Some(archive),
            entries,
        })
    }
}

impl Resolver for JarResolver {
    fn find(&mut self, name: &str) -> Resolution {
        if self.entries.binary_search_by(|e| e.as_str().cmp(name)).is_err() {
            return Resolution::NotFound;
        }
        let Some(archive) = self.archive.as_mut() else {
            return Resolution::NotFound;
        };

        let entry_name = format!("{name}.class");
        let mut entry = match archive.by_name(&entry_name) {
            Ok(entry) => entry,
            Err(e) => return Resolution::FailedToRead(format!("{entry_name}: {e}")),
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        if let Err(e) = entry.read_to_end(&mut bytes) {
            return Resolution::FailedToRead(format!("{entry_name}: {e}"));
        }
        match read_class(&bytes) {
            Ok(node) => Resolution::Found(Arc::new(node)),
            Err(e) => Resolution::Invalid(e.to_string()),
        }
    }

    fn contains(&mut self, name: &str) -> bool {
        self.entries.binary_search_by(|e| e.as_str().cmp(name)).is_ok()
    }

    fn all_class_names(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn class_path(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }

    fn close(&mut self) {
        self.archive = None;
    }
}
