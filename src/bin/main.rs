use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plugin_verifier::deps::{DependencyFinder, DependencyPlugin, FindResult};
use plugin_verifier::resolver::{DirResolver, JarResolver, Resolver};
use plugin_verifier::{
    CancellationToken, IdeDescriptor, JdkDescriptor, PluginDependency, PluginDetails,
    ProblemFilter, VerificationResult, VerifierParameters,
};

#[derive(Parser)]
#[command(name = "plugin-verifier")]
#[command(about = "Static binary-compatibility verifier for JVM plugins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a plugin against an IDE build
    CheckPlugin {
        /// Plugin jar or classes directory
        #[arg(value_name = "PLUGIN")]
        plugin: PathBuf,

        /// IDE jar or classes directory
        #[arg(value_name = "IDE")]
        ide: PathBuf,

        /// JDK classes jar or directory
        #[arg(long, value_name = "PATH")]
        jdk: Option<PathBuf>,

        /// Directory of dependency plugin jars, looked up as <id>.jar
        #[arg(long, value_name = "DIR")]
        plugins_dir: Option<PathBuf>,

        /// Declared dependency id; suffix with ':optional' as needed
        #[arg(long = "depends", value_name = "ID")]
        depends: Vec<String>,

        /// Package prefix treated as external (no ClassNotFound)
        #[arg(long = "external-prefix", value_name = "PREFIX")]
        external_prefixes: Vec<String>,

        /// Extra jar appended as the last classpath layer
        #[arg(long = "external-jar", value_name = "JAR")]
        external_jars: Vec<PathBuf>,

        /// Suppress problems located under this package prefix
        #[arg(long = "ignore-package", value_name = "PREFIX")]
        ignored_packages: Vec<String>,

        /// Also report deprecated/experimental/internal API usages
        #[arg(long)]
        deprecated_usages: bool,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::CheckPlugin {
            plugin,
            ide,
            jdk,
            plugins_dir,
            depends,
            external_prefixes,
            external_jars,
            ignored_packages,
            deprecated_usages,
        } => check_plugin(
            &plugin,
            &ide,
            jdk.as_deref(),
            plugins_dir,
            &depends,
            external_prefixes,
            external_jars,
            ignored_packages,
            deprecated_usages,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn check_plugin(
    plugin_path: &Path,
    ide_path: &Path,
    jdk_path: Option<&Path>,
    plugins_dir: Option<PathBuf>,
    depends: &[String],
    external_prefixes: Vec<String>,
    external_jars: Vec<PathBuf>,
    ignored_packages: Vec<String>,
    deprecated_usages: bool,
) -> Result<ExitCode> {
    let plugin_resolver = open_resolver(plugin_path)
        .with_context(|| format!("failed to open plugin {}", plugin_path.display()))?;
    let ide_resolver = open_resolver(ide_path)
        .with_context(|| format!("failed to open IDE {}", ide_path.display()))?;
    let jdk = match jdk_path {
        Some(path) => Some(JdkDescriptor {
            version: path.display().to_string(),
            resolver: open_resolver(path)
                .with_context(|| format!("failed to open JDK {}", path.display()))?,
        }),
        None => None,
    };

    let classes_to_check: BTreeSet<String> =
        plugin_resolver.all_class_names().into_iter().collect();
    let plugin_id = plugin_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "plugin".to_string());

    let plugin = PluginDetails {
        plugin_id,
        version: "unknown".to_string(),
        declared_dependencies: depends.iter().map(|spec| parse_dependency(spec)).collect(),
        resolver: plugin_resolver,
        classes_to_check,
    };
    let ide = IdeDescriptor {
        version: ide_path.display().to_string(),
        resolver: ide_resolver,
        jdk,
    };
    let params = VerifierParameters {
        external_class_prefixes: external_prefixes,
        external_classpath: external_jars,
        find_deprecated_api_usages: deprecated_usages,
        problem_filters: ignored_packages
            .into_iter()
            .map(ProblemFilter::PackagePrefix)
            .collect(),
    };

    let mut finder = DirectoryFinder { root: plugins_dir };
    let cancel = CancellationToken::new();
    let result = plugin_verifier::run_verification(ide, plugin, &mut finder, &params, &cancel)?;
    report(&result)
}

fn report(result: &VerificationResult) -> Result<ExitCode> {
    match result {
        VerificationResult::Cancelled => {
            println!("verification cancelled");
            Ok(ExitCode::FAILURE)
        }
        VerificationResult::InvalidPlugin { reason } => {
            println!("invalid plugin: {reason}");
            Ok(ExitCode::FAILURE)
        }
        VerificationResult::NotFound { reason } => {
            println!("plugin not found: {reason}");
            Ok(ExitCode::FAILURE)
        }
        VerificationResult::FailedToDownload { reason } => {
            println!("failed to download plugin: {reason}");
            Ok(ExitCode::FAILURE)
        }
        other => {
            let verdict = other.verdict().expect("verdict-carrying result");
            println!(
                "verified {} {} against {}",
                verdict.plugin_id, verdict.plugin_version, verdict.ide_version
            );
            for warning in &verdict.structure_warnings {
                println!("warning: {warning}");
            }
            for missing in &verdict.missing_dependencies {
                println!(
                    "missing dependency: {} ({})",
                    missing.dependency.id, missing.reason
                );
            }
            for problem in &verdict.problems {
                println!("problem: {}", problem.full_description());
            }
            for usage in &verdict.usages {
                println!("usage: {usage}");
            }
            for ignored in &verdict.ignored_problems {
                println!(
                    "ignored: {} ({})",
                    ignored.problem.short_description(),
                    ignored.reason
                );
            }
            if verdict.problems.is_empty() && verdict.missing_dependencies.is_empty() {
                println!("no compatibility problems");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn open_resolver(path: &Path) -> plugin_verifier::Result<Box<dyn Resolver>> {
    if path.is_dir() {
        Ok(Box::new(DirResolver::open(path)?))
    } else {
        Ok(Box::new(JarResolver::open(path)?))
    }
}

fn parse_dependency(spec: &str) -> PluginDependency {
    match spec.strip_suffix(":optional") {
        Some(id) => PluginDependency::optional(id),
        None => PluginDependency::mandatory(spec),
    }
}

/// Finder over a flat directory of dependency jars named `<id>.jar`.
struct DirectoryFinder {
    root: Option<PathBuf>,
}

impl DependencyFinder for DirectoryFinder {
    fn find(&mut self, plugin_id: &str) -> FindResult {
        let Some(root) = &self.root else {
            return FindResult::NotFound("no plugins directory configured".to_string());
        };
        let jar = root.join(format!("{plugin_id}.jar"));
        if !jar.is_file() {
            return FindResult::NotFound(format!("{} does not exist", jar.display()));
        }
        match JarResolver::open(&jar) {
            Ok(resolver) => FindResult::FoundPlugin(DependencyPlugin {
                plugin_id: plugin_id.to_string(),
                // Transitive declarations live in the descriptor, which the
                // CLI does not parse; dependencies must be passed explicitly.
                dependencies: Vec::new(),
                resolver: Box::new(resolver),
            }),
            Err(e) => FindResult::Failed(e.to_string()),
        }
    }
}
