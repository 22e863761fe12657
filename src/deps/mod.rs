//! Transitive dependency resolution for the verified plugin.
//!
//! The graph builder runs BFS from the plugin's declared dependencies
//! through a [`DependencyFinder`] collaborator. Vertices live in an index
//! arena (`Vec` positions are the ids); edges reference positions, so
//! cyclic plugin graphs need no back-pointers. The graph owns the class
//! resolvers of resolved dependencies until they are handed to the
//! verification classpath.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::consts::DEPENDENCY_MAX_VERTICES;
use crate::resolver::Resolver;

/// One declared dependency edge, as parsed out of the plugin descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginDependency {
    pub id: String,
    pub optional: bool,
}

impl PluginDependency {
    pub fn mandatory(id: impl Into<String>) -> Self {
        PluginDependency {
            id: id.into(),
            optional: false,
        }
    }

    pub fn optional(id: impl Into<String>) -> Self {
        PluginDependency {
            id: id.into(),
            optional: true,
        }
    }
}

/// A dependency the finder resolved: its identity, its own declared
/// dependencies and its class pool.
pub struct DependencyPlugin {
    pub plugin_id: String,
    pub dependencies: Vec<PluginDependency>,
    pub resolver: Box<dyn Resolver>,
}

/// Outcome of one finder query.
pub enum FindResult {
    FoundPlugin(DependencyPlugin),
    NotFound(String),
    Failed(String),
}

/// External collaborator that locates plugins by id (local repository,
/// marketplace client, test fixture).
pub trait DependencyFinder {
    fn find(&mut self, plugin_id: &str) -> FindResult;
}

/// A mandatory dependency that could not be resolved.
#[derive(Clone, Debug)]
pub struct MissingDependency {
    pub dependency: PluginDependency,
    pub reason: String,
}

struct Vertex {
    plugin_id: String,
    resolver: Option<Box<dyn Resolver>>,
}

/// Dependency graph rooted at the verified plugin (vertex 0, which holds
/// no resolver of its own).
pub struct DependencyGraph {
    vertices: Vec<Vertex>,
    /// Edges as (from, to) vertex indices, in discovery order.
    edges: Vec<(usize, usize)>,
    pub missing: Vec<MissingDependency>,
    pub warnings: Vec<String>,
}

impl DependencyGraph {
    /// Resolve the transitive closure of `declared` starting from the
    /// plugin `root_id`.
    pub fn build(
        root_id: &str,
        declared: &[PluginDependency],
        finder: &mut dyn DependencyFinder,
    ) -> DependencyGraph {
        let mut graph = DependencyGraph {
            vertices: vec![Vertex {
                plugin_id: root_id.to_string(),
                resolver: None,
            }],
            edges: Vec::new(),
            missing: Vec::new(),
            warnings: Vec::new(),
        };
        let mut index_of: HashMap<String, usize> = HashMap::new();
        index_of.insert(root_id.to_string(), 0);

        // BFS worklist of (dependent vertex, declared dependency).
        let mut worklist: std::collections::VecDeque<(usize, PluginDependency)> =
            declared.iter().map(|d| (0, d.clone())).collect();

        while let Some((from, dependency)) = worklist.pop_front() {
            if let Some(&to) = index_of.get(&dependency.id) {
                graph.edges.push((from, to));
                continue;
            }
            if graph.vertices.len() >= DEPENDENCY_MAX_VERTICES {
                graph
                    .warnings
                    .push("dependency graph truncated: too many plugins".to_string());
                break;
            }
            match finder.find(&dependency.id) {
                FindResult::FoundPlugin(found) => {
                    debug!(plugin = %dependency.id, "resolved dependency");
                    let to = graph.vertices.len();
                    graph.vertices.push(Vertex {
                        plugin_id: found.plugin_id,
                        resolver: Some(found.resolver),
                    });
                    index_of.insert(dependency.id.clone(), to);
                    graph.edges.push((from, to));
                    for transitive in found.dependencies {
                        worklist.push_back((to, transitive));
                    }
                }
                FindResult::NotFound(reason) | FindResult::Failed(reason) => {
                    if dependency.optional {
                        warn!(plugin = %dependency.id, reason, "optional dependency unresolved");
                        graph.warnings.push(format!(
                            "optional dependency {} is not resolved: {reason}",
                            dependency.id
                        ));
                    } else {
                        graph.missing.push(MissingDependency { dependency, reason });
                    }
                }
            }
        }

        for component in graph.cycle_components() {
            let ids: Vec<&str> = component
                .iter()
                .map(|&v| graph.vertices[v].plugin_id.as_str())
                .collect();
            graph
                .warnings
                .push(format!("dependency cycle between plugins: {}", ids.join(", ")));
        }

        graph
    }

    pub fn resolved_ids(&self) -> Vec<String> {
        self.vertices[1..]
            .iter()
            .map(|v| v.plugin_id.clone())
            .collect()
    }

    /// Hand the resolved dependencies' class pools to the caller, in
    /// discovery order. The caller takes over closing them.
    pub fn take_resolvers(&mut self) -> Vec<Box<dyn Resolver>> {
        self.vertices
            .iter_mut()
            .filter_map(|v| v.resolver.take())
            .collect()
    }

    /// Close any resolver still owned by the graph.
    pub fn close(&mut self) {
        for vertex in &mut self.vertices {
            if let Some(resolver) = vertex.resolver.as_mut() {
                resolver.close();
            }
        }
    }

    /// Strongly connected components with more than one vertex, by
    /// iterative Tarjan over the index arena.
    fn cycle_components(&self) -> Vec<Vec<usize>> {
        let n = self.vertices.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &(from, to) in &self.edges {
            successors[from].push(to);
        }

        let mut index = 0usize;
        let mut indices: Vec<Option<usize>> = vec![None; n];
        let mut lowlink: Vec<usize> = vec![0; n];
        let mut on_stack: Vec<bool> = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut components: Vec<Vec<usize>> = Vec::new();

        // (vertex, next successor position) call frames.
        let mut frames: Vec<(usize, usize)> = Vec::new();
        for start in 0..n {
            if indices[start].is_some() {
                continue;
            }
            frames.push((start, 0));
            indices[start] = Some(index);
            lowlink[start] = index;
            index += 1;
            stack.push(start);
            on_stack[start] = true;

            while let Some(&(v, next)) = frames.last() {
                if next < successors[v].len() {
                    frames.last_mut().expect("frame just read").1 += 1;
                    let w = successors[v][next];
                    match indices[w] {
                        None => {
                            indices[w] = Some(index);
                            lowlink[w] = index;
                            index += 1;
                            stack.push(w);
                            on_stack[w] = true;
                            frames.push((w, 0));
                        }
                        Some(w_index) => {
                            if on_stack[w] {
                                lowlink[v] = lowlink[v].min(w_index);
                            }
                        }
                    }
                } else {
                    frames.pop();
                    if let Some(&(parent, _)) = frames.last() {
                        lowlink[parent] = lowlink[parent].min(lowlink[v]);
                    }
                    if Some(lowlink[v]) == indices[v] {
                        let mut component = Vec::new();
                        loop {
                            let w = stack.pop().expect("tarjan stack underflow");
                            on_stack[w] = false;
                            component.push(w);
                            if w == v {
                                break;
                            }
                        }
                        if component.len() > 1 {
                            component.sort_unstable();
                            components.push(component);
                        }
                    }
                }
            }
        }
        components.sort();
        components
    }
}

impl Drop for DependencyGraph {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FixedResolver;
    use std::collections::HashMap;

    struct MapFinder {
        plugins: HashMap<String, Vec<PluginDependency>>,
    }

    impl MapFinder {
        fn new(entries: &[(&str, &[PluginDependency])]) -> Self {
            MapFinder {
                plugins: entries
                    .iter()
                    .map(|(id, deps)| (id.to_string(), deps.to_vec()))
                    .collect(),
            }
        }
    }

    impl DependencyFinder for MapFinder {
        fn find(&mut self, plugin_id: &str) -> FindResult {
            match self.plugins.get(plugin_id) {
                Some(deps) => FindResult::FoundPlugin(DependencyPlugin {
                    plugin_id: plugin_id.to_string(),
                    dependencies: deps.clone(),
                    resolver: Box::new(FixedResolver::new()),
                }),
                None => FindResult::NotFound(format!("plugin {plugin_id} is not in the repository")),
            }
        }
    }

    #[test]
    fn resolves_transitively() {
        let mut finder = MapFinder::new(&[
            ("lib-a", &[PluginDependency::mandatory("lib-b")]),
            ("lib-b", &[]),
        ]);
        let graph = DependencyGraph::build(
            "root",
            &[PluginDependency::mandatory("lib-a")],
            &mut finder,
        );
        assert_eq!(graph.resolved_ids(), vec!["lib-a", "lib-b"]);
        assert!(graph.missing.is_empty());
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn optional_miss_is_a_warning_mandatory_miss_is_missing() {
        let mut finder = MapFinder::new(&[]);
        let graph = DependencyGraph::build(
            "root",
            &[
                PluginDependency::optional("maybe"),
                PluginDependency::mandatory("required"),
            ],
            &mut finder,
        );
        assert_eq!(graph.warnings.len(), 1);
        assert_eq!(graph.missing.len(), 1);
        assert_eq!(graph.missing[0].dependency.id, "required");
    }

    #[test]
    fn cycles_warn_once_per_component() {
        let mut finder = MapFinder::new(&[
            ("lib-a", &[PluginDependency::mandatory("lib-b")]),
            ("lib-b", &[PluginDependency::mandatory("lib-a")]),
        ]);
        let graph = DependencyGraph::build(
            "root",
            &[PluginDependency::mandatory("lib-a")],
            &mut finder,
        );
        let cycle_warnings: Vec<&String> = graph
            .warnings
            .iter()
            .filter(|w| w.contains("cycle"))
            .collect();
        assert_eq!(cycle_warnings.len(), 1);
        assert!(cycle_warnings[0].contains("lib-a"));
        assert!(cycle_warnings[0].contains("lib-b"));
    }
}
