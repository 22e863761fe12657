//! Mutable state of one verification job.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::classfile::ClassNode;
use crate::problems::{ApiUsage, Location, Problem, ProblemRegistrar, SymbolicReference};
use crate::resolver::{Resolution, Resolver};
use crate::VerifierParameters;

/// Everything the verifiers mutate while walking one plugin: the layered
/// resolver, the problem sink and the API-usage records. One context per
/// job; never shared across jobs.
pub struct VerificationContext<'a> {
    resolver: &'a mut dyn Resolver,
    pub params: &'a VerifierParameters,
    pub problems: ProblemRegistrar,
    usages: Vec<ApiUsage>,
    usage_seen: HashSet<ApiUsage>,
    /// Class names whose read failure was already attached to its first
    /// reference site.
    reported_read_failures: HashSet<String>,
}

impl<'a> VerificationContext<'a> {
    pub fn new(resolver: &'a mut dyn Resolver, params: &'a VerifierParameters) -> Self {
        VerificationContext {
            resolver,
            params,
            problems: ProblemRegistrar::new(params.problem_filters.clone()),
            usages: Vec::new(),
            usage_seen: HashSet::new(),
            reported_read_failures: HashSet::new(),
        }
    }

    pub fn register(&mut self, problem: Problem) {
        self.problems.register(problem);
    }

    pub fn register_usage(&mut self, usage: ApiUsage) {
        if !self.params.find_deprecated_api_usages {
            return;
        }
        if self.usage_seen.insert(usage.clone()) {
            self.usages.push(usage);
        }
    }

    /// A class whose absence must be tolerated because the user declared
    /// its package prefix external.
    pub fn is_external(&self, name: &str) -> bool {
        self.params
            .external_class_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Resolve `name` for a reference at `location`, registering the
    /// appropriate problem when the class is unusable.
    ///
    /// `None` means the reference cannot be analyzed further: the class is
    /// missing (reported, unless external), unreadable or malformed
    /// (reported once per class per run).
    pub fn resolve_or_report(&mut self, name: &str, location: &Location) -> Option<Arc<ClassNode>> {
        if self.is_external(name) {
            return None;
        }
        match self.resolver.find(name) {
            Resolution::Found(node) => {
                if node.is_deprecated {
                    self.register_usage(ApiUsage::Deprecated {
                        reference: SymbolicReference::Class(name.to_string()),
                        location: location.clone(),
                    });
                }
                if node.is_experimental {
                    self.register_usage(ApiUsage::Experimental {
                        reference: SymbolicReference::Class(name.to_string()),
                        location: location.clone(),
                    });
                }
                if node.is_internal_api {
                    self.register_usage(ApiUsage::InternalApi {
                        reference: SymbolicReference::Class(name.to_string()),
                        location: location.clone(),
                    });
                }
                Some(node)
            }
            Resolution::NotFound => {
                debug!(class = name, at = %location, "unresolved class reference");
                self.register(Problem::ClassNotFound {
                    class: name.to_string(),
                    location: location.clone(),
                });
                None
            }
            Resolution::FailedToRead(reason) => {
                if self.reported_read_failures.insert(name.to_string()) {
                    self.register(Problem::FailedToReadClassFile {
                        class: name.to_string(),
                        reason,
                        location: location.clone(),
                    });
                }
                None
            }
            Resolution::Invalid(reason) => {
                if self.reported_read_failures.insert(name.to_string()) {
                    self.register(Problem::InvalidClassFile {
                        class: name.to_string(),
                        reason,
                        location: location.clone(),
                    });
                }
                None
            }
        }
    }

    /// Resolve without reporting; the walker uses this for parents it can
    /// tolerate missing.
    pub fn resolve_quietly(&mut self, name: &str) -> Option<Arc<ClassNode>> {
        match self.resolver.find(name) {
            Resolution::Found(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_outputs(self) -> (ProblemRegistrar, Vec<ApiUsage>) {
        (self.problems, self.usages)
    }
}
