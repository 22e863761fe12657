//! In-memory resolver over pre-built class nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::classfile::ClassNode;
use crate::resolver::{Resolution, Resolver};

/// Resolver over a fixed set of classes held in memory.
///
/// Backs dependency pools assembled programmatically and is the primary
/// fixture vehicle in tests. Entries may also be seeded with non-`Found`
/// resolutions to model broken storage.
#[derive(Default)]
pub struct FixedResolver {
    entries: BTreeMap<String, Resolution>,
    closed: bool,
}

impl FixedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classes(nodes: impl IntoIterator<Item = ClassNode>) -> Self {
        let mut resolver = Self::new();
        for node in nodes {
            resolver.add(node);
        }
        resolver
    }

    pub fn add(&mut self, node: ClassNode) {
        self.entries
            .insert(node.name.clone(), Resolution::Found(Arc::new(node)));
    }

    pub fn add_shared(&mut self, node: Arc<ClassNode>) {
        self.entries
            .insert(node.name.clone(), Resolution::Found(node));
    }

    /// Seed a name with a fixed non-`Found` resolution.
    pub fn add_resolution(&mut self, name: impl Into<String>, resolution: Resolution) {
        self.entries.insert(name.into(), resolution);
    }
}

impl Resolver for FixedResolver {
    fn find(&mut self, name: &str) -> Resolution {
        if self.closed {
            return Resolution::NotFound;
        }
        self.entries
            .get(name)
            .cloned()
            .unwrap_or(Resolution::NotFound)
    }

    fn contains(&mut self, name: &str) -> bool {
        !self.closed && self.entries.contains_key(name)
    }

    fn all_class_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
