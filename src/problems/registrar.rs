//! Collection, deduplication and filtering of problems.

use std::collections::HashSet;

use crate::classfile::flags;
use crate::consts::PACKAGE_ROLLUP_THRESHOLD;
use crate::problems::Problem;

/// User-supplied suppression rule, matched against a problem's enclosing
/// class before the problem is stored.
#[derive(Clone, Debug)]
pub enum ProblemFilter {
    /// Internal class name starts with the prefix.
    ClassPrefix(String),
    /// Package of the enclosing class starts with the prefix.
    PackagePrefix(String),
}

impl ProblemFilter {
    pub fn matches(&self, problem: &Problem) -> bool {
        let Some(location) = problem.location() else {
            return false;
        };
        let class = location.class_name();
        match self {
            ProblemFilter::ClassPrefix(prefix) => class.starts_with(prefix.as_str()),
            ProblemFilter::PackagePrefix(prefix) => {
                flags::package_of(class).starts_with(prefix.as_str())
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            ProblemFilter::ClassPrefix(prefix) => format!("class name matches '{prefix}*'"),
            ProblemFilter::PackagePrefix(prefix) => format!("package matches '{prefix}*'"),
        }
    }
}

/// A problem suppressed by a filter, kept for the report's ignored section.
#[derive(Clone, Debug)]
pub struct IgnoredProblem {
    pub problem: Problem,
    pub reason: String,
}

/// Insertion-ordered, deduplicating problem sink.
///
/// A problem is stored at most once per canonical value; filters are
/// applied before storage. [`ProblemRegistrar::finish`] applies the
/// package-not-found rollup and yields the final ordered sets.
#[derive(Default)]
pub struct ProblemRegistrar {
    filters: Vec<ProblemFilter>,
    seen: HashSet<Problem>,
    problems: Vec<Problem>,
    ignored: Vec<IgnoredProblem>,
}

impl ProblemRegistrar {
    pub fn new(filters: Vec<ProblemFilter>) -> Self {
        ProblemRegistrar {
            filters,
            ..Default::default()
        }
    }

    /// Record a problem. Returns `true` when the problem was stored (not
    /// filtered, not a duplicate).
    pub fn register(&mut self, problem: Problem) -> bool {
        if let Some(filter) = self.filters.iter().find(|f| f.matches(&problem)) {
            let reason = format!("ignored: {}", filter.description());
            if self.seen.insert(problem.clone()) {
                self.ignored.push(IgnoredProblem { problem, reason });
            }
            return false;
        }
        if !self.seen.insert(problem.clone()) {
            return false;
        }
        self.problems.push(problem);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Apply the package rollup and return `(problems, ignored)`.
    pub fn finish(self) -> (Vec<Problem>, Vec<IgnoredProblem>) {
        (rollup_missing_packages(self.problems), self.ignored)
    }
}

/// Collapse batches of `ClassNotFound` under a common package prefix into a
/// single `PackageNotFound` retaining the originals as children.
///
/// Classes are grouped by their top package segment; a group of at least
/// [`PACKAGE_ROLLUP_THRESHOLD`] collapses at the deepest package prefix
/// common to the whole group, positioned where its first member was.
/// Classes in the default package never roll up.
fn rollup_missing_packages(problems: Vec<Problem>) -> Vec<Problem> {
    use std::collections::BTreeMap;

    // Top package segment -> indices of ClassNotFound problems.
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, problem) in problems.iter().enumerate() {
        if let Problem::ClassNotFound { class, .. } = problem {
            let package = flags::package_of(class);
            if package.is_empty() {
                continue;
            }
            let top = package.split('/').next().unwrap_or(package);
            groups.entry(top).or_default().push(index);
        }
    }

    let mut rollups: Vec<(usize, Problem)> = Vec::new();
    let mut rolled: HashSet<usize> = HashSet::new();
    for indices in groups.values() {
        if indices.len() < PACKAGE_ROLLUP_THRESHOLD {
            continue;
        }
        let packages: Vec<&str> = indices
            .iter()
            .map(|&i| match &problems[i] {
                Problem::ClassNotFound { class, .. } => flags::package_of(class),
                _ => unreachable!("group holds only ClassNotFound indices"),
            })
            .collect();
        let prefix = common_package_prefix(&packages);
        let children: Vec<Problem> = indices.iter().map(|&i| problems[i].clone()).collect();
        rollups.push((
            indices[0],
            Problem::PackageNotFound {
                package: prefix.to_string(),
                children,
            },
        ));
        rolled.extend(indices.iter().copied());
    }

    let mut result = Vec::with_capacity(problems.len());
    for (index, problem) in problems.into_iter().enumerate() {
        if let Some(pos) = rollups.iter().position(|(first, _)| *first == index) {
            result.push(rollups[pos].1.clone());
        } else if !rolled.contains(&index) {
            result.push(problem);
        }
    }
    result
}

/// Deepest `/`-segmented prefix shared by all packages. The input packages
/// share at least their first segment.
fn common_package_prefix<'a>(packages: &[&'a str]) -> &'a str {
    let first = packages[0];
    let mut prefix_len = first.len();
    for other in &packages[1..] {
        let shared = first[..prefix_len]
            .split('/')
            .scan(0usize, |acc, segment| {
                let start = *acc;
                *acc += segment.len() + 1;
                Some((start, segment))
            })
            .take_while(|(start, segment)| {
                let end = start + segment.len();
                other.len() >= end
                    && &other[*start..end] == *segment
                    && (other.len() == end || other.as_bytes()[end] == b'/')
            })
            .last()
            .map(|(start, segment)| start + segment.len())
            .unwrap_or(0);
        prefix_len = prefix_len.min(shared);
    }
    first[..prefix_len].trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::Location;

    fn class_not_found(class: &str, at: &str) -> Problem {
        Problem::ClassNotFound {
            class: class.to_string(),
            location: Location::class(at),
        }
    }

    #[test]
    fn deduplicates_by_value() {
        let mut registrar = ProblemRegistrar::default();
        assert!(registrar.register(class_not_found("p/A", "q/B")));
        assert!(!registrar.register(class_not_found("p/A", "q/B")));
        assert!(registrar.register(class_not_found("p/A", "q/C")));
        let (problems, _) = registrar.finish();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn filters_move_problems_to_ignored() {
        let mut registrar =
            ProblemRegistrar::new(vec![ProblemFilter::PackagePrefix("q/generated".into())]);
        assert!(!registrar.register(class_not_found("p/A", "q/generated/B")));
        assert!(registrar.register(class_not_found("p/A", "q/app/C")));
        let (problems, ignored) = registrar.finish();
        assert_eq!(problems.len(), 1);
        assert_eq!(ignored.len(), 1);
        assert!(ignored[0].reason.contains("q/generated"));
    }

    #[test]
    fn rolls_up_missing_package() {
        let mut registrar = ProblemRegistrar::default();
        for i in 0..PACKAGE_ROLLUP_THRESHOLD {
            registrar.register(class_not_found(&format!("removed/pkg/C{i}"), "q/User"));
        }
        registrar.register(class_not_found("present/lib/Only", "q/User"));
        let (problems, _) = registrar.finish();
        assert_eq!(problems.len(), 2);
        match &problems[0] {
            Problem::PackageNotFound { package, children } => {
                assert_eq!(package, "removed/pkg");
                assert_eq!(children.len(), PACKAGE_ROLLUP_THRESHOLD);
            }
            other => panic!("expected PackageNotFound first, got {other:?}"),
        }
        assert!(matches!(&problems[1], Problem::ClassNotFound { class, .. } if class == "present/lib/Only"));
    }

    #[test]
    fn small_batches_stay_individual() {
        let mut registrar = ProblemRegistrar::default();
        registrar.register(class_not_found("removed/pkg/A", "q/User"));
        registrar.register(class_not_found("removed/pkg/B", "q/User"));
        let (problems, _) = registrar.finish();
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().all(|p| matches!(p, Problem::ClassNotFound { .. })));
    }

    #[test]
    fn prefix_of_diverging_subpackages() {
        assert_eq!(
            common_package_prefix(&["removed/pkg/a", "removed/pkg/b", "removed/pkg"]),
            "removed/pkg"
        );
        assert_eq!(common_package_prefix(&["removed/pkg", "removed/pkgother"]), "removed");
    }
}
