//! Binary-compatibility verifier for JVM plugins.
//!
//! Given a compiled plugin and a target IDE build, the engine statically
//! analyzes every bytecode reference the plugin makes into the host, the
//! JDK and its declared dependencies, and reports every reference that
//! would break at load, link or invocation time.
//!
//! ## Architecture
//!
//! - **classfile**: the class-file AST (nodes, descriptors, access flags)
//!   and the reader producing it from raw bytes
//! - **resolver**: class lookup over jars, directories and in-memory
//!   pools, composed into the layered verification classpath
//! - **problems**: the closed set of reportable defects, plus the
//!   deduplicating registrar
//! - **verify**: hierarchy walks, JVMS §5.4.3.x resolution and the
//!   class/method/field/instruction verifiers
//! - **deps**: transitive dependency graph over a finder collaborator
//! - **bin**: command-line interface
//!
//! ## Verification flow
//!
//! ```text
//! plugin + IDE → layered resolver → dependency graph → per-class verifiers → VerificationResult
//! ```

pub mod classfile;
pub mod common;
pub mod consts;
pub mod deps;
pub mod problems;
pub mod resolver;
pub mod verify;

#[doc(hidden)]
pub mod testutil;

pub use common::{CancellationToken, Error, Result, SharedCache};
pub use deps::{DependencyFinder, DependencyGraph, MissingDependency, PluginDependency};
pub use problems::{ApiUsage, IgnoredProblem, Problem, ProblemFilter};

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, info};

use resolver::{CacheResolver, JarResolver, Resolver, UnionResolver};
use verify::VerificationContext;

/// The JDK the target IDE runs on: version string plus a resolver over its
/// core classes.
pub struct JdkDescriptor {
    pub version: String,
    pub resolver: Box<dyn Resolver>,
}

/// Opaque handle to the target IDE build.
pub struct IdeDescriptor {
    pub version: String,
    pub resolver: Box<dyn Resolver>,
    pub jdk: Option<JdkDescriptor>,
}

/// The plugin under verification, as produced by the plugin-structure
/// collaborator.
pub struct PluginDetails {
    pub plugin_id: String,
    pub version: String,
    pub declared_dependencies: Vec<PluginDependency>,
    pub resolver: Box<dyn Resolver>,
    /// Internal names of the classes to verify. Ordered so runs are
    /// deterministic.
    pub classes_to_check: BTreeSet<String>,
}

/// Job configuration.
#[derive(Clone, Debug, Default)]
pub struct VerifierParameters {
    /// Package prefixes whose classes are external: their absence from
    /// every resolver is tolerated silently.
    pub external_class_prefixes: Vec<String>,
    /// Jars appended as the last classpath layer.
    pub external_classpath: Vec<PathBuf>,
    /// Record usages of deprecated/experimental/internal API.
    pub find_deprecated_api_usages: bool,
    /// Suppression rules; matching problems land in the ignored set.
    pub problem_filters: Vec<ProblemFilter>,
}

/// Everything a finished job reports.
pub struct VerificationVerdict {
    pub plugin_id: String,
    pub plugin_version: String,
    pub ide_version: String,
    pub resolved_dependencies: Vec<String>,
    pub missing_dependencies: Vec<MissingDependency>,
    pub structure_warnings: Vec<String>,
    pub problems: Vec<Problem>,
    pub usages: Vec<ApiUsage>,
    pub ignored_problems: Vec<IgnoredProblem>,
}

/// Outcome of one verification job.
pub enum VerificationResult {
    Ok(VerificationVerdict),
    StructureWarnings(VerificationVerdict),
    MissingDependencies(VerificationVerdict),
    CompatibilityProblems(VerificationVerdict),
    InvalidPlugin { reason: String },
    NotFound { reason: String },
    FailedToDownload { reason: String },
    Cancelled,
}

impl VerificationResult {
    pub fn verdict(&self) -> Option<&VerificationVerdict> {
        match self {
            VerificationResult::Ok(v)
            | VerificationResult::StructureWarnings(v)
            | VerificationResult::MissingDependencies(v)
            | VerificationResult::CompatibilityProblems(v) => Some(v),
            _ => None,
        }
    }
}

/// Run one verification job: plugin against IDE.
///
/// The job takes ownership of every resolver it is handed (plugin, IDE,
/// JDK, resolved dependencies, external jars) and closes all of them on
/// every exit path, including cancellation.
pub fn run_verification(
    ide: IdeDescriptor,
    plugin: PluginDetails,
    finder: &mut dyn DependencyFinder,
    params: &VerifierParameters,
    cancel: &CancellationToken,
) -> Result<VerificationResult> {
    info!(plugin = %plugin.plugin_id, ide = %ide.version, "starting verification");

    let mut graph = DependencyGraph::build(&plugin.plugin_id, &plugin.declared_dependencies, finder);
    let resolved_dependencies = graph.resolved_ids();
    let missing_dependencies = graph.missing.clone();
    let structure_warnings = graph.warnings.clone();

    // Classpath layering is a correctness requirement: the plugin must not
    // shadow the JDK, and dependencies must not shadow the IDE.
    let mut layers: Vec<Box<dyn Resolver>> = Vec::new();
    layers.push(plugin.resolver);
    let ide_version = ide.version;
    if let Some(jdk) = ide.jdk {
        layers.push(jdk.resolver);
    }
    layers.push(ide.resolver);
    layers.extend(graph.take_resolvers());
    for jar in &params.external_classpath {
        match JarResolver::open(jar) {
            Ok(resolver) => layers.push(Box::new(resolver)),
            Err(e) => {
                // Partial acquisition: release what is already open.
                let mut acquired = UnionResolver::new(layers);
                acquired.close();
                return Err(e);
            }
        }
    }
    let mut classpath = CacheResolver::new(Box::new(UnionResolver::new(layers)));

    let classes_to_check: Vec<String> = plugin.classes_to_check.iter().cloned().collect();
    let mut ctx = VerificationContext::new(&mut classpath, params);
    let walk = verify::verify_classes(&mut ctx, &classes_to_check, cancel);

    let (registrar, usages) = ctx.into_outputs();
    classpath.close();

    match walk {
        Err(Error::Cancelled) => {
            debug!(plugin = %plugin.plugin_id, "verification cancelled");
            return Ok(VerificationResult::Cancelled);
        }
        Err(other) => return Err(other),
        Ok(()) => {}
    }

    let (problems, ignored_problems) = registrar.finish();
    let verdict = VerificationVerdict {
        plugin_id: plugin.plugin_id,
        plugin_version: plugin.version,
        ide_version,
        resolved_dependencies,
        missing_dependencies,
        structure_warnings,
        problems,
        usages,
        ignored_problems,
    };

    info!(
        plugin = %verdict.plugin_id,
        problems = verdict.problems.len(),
        usages = verdict.usages.len(),
        "verification finished"
    );

    Ok(if !verdict.missing_dependencies.is_empty() {
        VerificationResult::MissingDependencies(verdict)
    } else if !verdict.problems.is_empty() {
        VerificationResult::CompatibilityProblems(verdict)
    } else if !verdict.structure_warnings.is_empty() {
        VerificationResult::StructureWarnings(verdict)
    } else {
        VerificationResult::Ok(verdict)
    })
}
