//! Shared fixtures: assemble verification jobs over in-memory class pools.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use plugin_verifier::classfile::ClassNode;
use plugin_verifier::deps::{DependencyFinder, FindResult};
use plugin_verifier::resolver::{FixedResolver, Resolution, Resolver};
use plugin_verifier::testutil::java_lang_object;
use plugin_verifier::{
    CancellationToken, IdeDescriptor, PluginDetails, VerificationResult, VerifierParameters,
};

/// IDE fixture backed by an in-memory pool; always includes
/// java/lang/Object as its bundled JDK surface.
pub fn ide_with(classes: Vec<ClassNode>) -> IdeDescriptor {
    let mut resolver = FixedResolver::with_classes(classes);
    resolver.add(java_lang_object());
    IdeDescriptor {
        version: "IU-231.1".to_string(),
        resolver: Box::new(resolver),
        jdk: None,
    }
}

/// Plugin fixture: all given classes are checked.
pub fn plugin_with(id: &str, classes: Vec<ClassNode>) -> PluginDetails {
    let classes_to_check: BTreeSet<String> = classes.iter().map(|c| c.name.clone()).collect();
    PluginDetails {
        plugin_id: id.to_string(),
        version: "1.0.0".to_string(),
        declared_dependencies: Vec::new(),
        resolver: Box::new(FixedResolver::with_classes(classes)),
        classes_to_check,
    }
}

/// Finder with no repository behind it.
pub struct EmptyFinder;

impl DependencyFinder for EmptyFinder {
    fn find(&mut self, plugin_id: &str) -> FindResult {
        FindResult::NotFound(format!("{plugin_id} is not in the repository"))
    }
}

pub fn verify(
    ide: IdeDescriptor,
    plugin: PluginDetails,
    params: &VerifierParameters,
) -> VerificationResult {
    let cancel = CancellationToken::new();
    plugin_verifier::run_verification(ide, plugin, &mut EmptyFinder, params, &cancel)
        .expect("verification job")
}

/// Resolver wrapper counting close calls, for close-safety assertions.
pub struct CountingResolver {
    inner: FixedResolver,
    closes: Arc<AtomicUsize>,
}

impl CountingResolver {
    pub fn new(inner: FixedResolver) -> (Self, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        (
            CountingResolver {
                inner,
                closes: Arc::clone(&closes),
            },
            closes,
        )
    }
}

impl Resolver for CountingResolver {
    fn find(&mut self, name: &str) -> Resolution {
        self.inner.find(name)
    }

    fn all_class_names(&self) -> Vec<String> {
        self.inner.all_class_names()
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}
