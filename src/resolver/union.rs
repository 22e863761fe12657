//! Ordered union of resolvers.

use std::path::PathBuf;

use crate::resolver::{Resolution, Resolver};

/// Ordered fallback over child resolvers.
///
/// Resolution answers with the first child that finds the class. A child
/// answering `FailedToRead` or `Invalid` short-circuits: the error is the
/// answer and later children are not consulted, so broken storage is
/// reported instead of silently shadowed.
pub struct UnionResolver {
    children: Vec<Box<dyn Resolver>>,
}

impl UnionResolver {
    pub fn new(children: Vec<Box<dyn Resolver>>) -> Self {
        UnionResolver { children }
    }

    pub fn push(&mut self, child: Box<dyn Resolver>) {
        self.children.push(child);
    }
}

impl Resolver for UnionResolver {
    fn find(&mut self, name: &str) -> Resolution {
        for child in &mut self.children {
            match child.find(name) {
                Resolution::NotFound => continue,
                answer => return answer,
            }
        }
        Resolution::NotFound
    }

    fn contains(&mut self, name: &str) -> bool {
        self.children.iter_mut().any(|child| child.contains(name))
    }

    fn all_class_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for child in &self.children {
            for name in child.all_class_names() {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn class_path(&self) -> Vec<PathBuf> {
        self.children
            .iter()
            .flat_map(|child| child.class_path())
            .collect()
    }

    fn close(&mut self) {
        for child in &mut self.children {
            child.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FixedResolver;
    use crate::testutil::class;

    #[test]
    fn first_found_wins() {
        let mut first = FixedResolver::new();
        first.add(class("p/A").build());
        let mut second = FixedResolver::new();
        let mut shadowed = class("p/A").build();
        shadowed.access |= crate::classfile::flags::access_flags::ACC_FINAL;
        second.add(shadowed);
        second.add(class("p/B").build());

        let mut union = UnionResolver::new(vec![Box::new(first), Box::new(second)]);
        match union.find("p/A") {
            Resolution::Found(node) => {
                assert!(!crate::classfile::flags::is_final(node.access))
            }
            other => panic!("expected Found, got {other:?}"),
        }
        assert!(union.contains("p/B"));
        assert_eq!(union.all_class_names(), vec!["p/A", "p/B"]);
    }

    #[test]
    fn read_errors_short_circuit() {
        let mut first = FixedResolver::new();
        first.add_resolution("p/A", Resolution::FailedToRead("disk gone".into()));
        let mut second = FixedResolver::new();
        second.add(class("p/A").build());

        let mut union = UnionResolver::new(vec![Box::new(first), Box::new(second)]);
        assert!(matches!(union.find("p/A"), Resolution::FailedToRead(_)));
    }
}
