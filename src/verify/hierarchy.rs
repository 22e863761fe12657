//! Cycle-safe walks over the class hierarchy.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::classfile::ClassNode;
use crate::consts::{HIERARCHY_MAX_BFS_STEPS, JAVA_LANG_OBJECT};
use crate::problems::Location;
use crate::verify::context::VerificationContext;

/// Is `child` the same class as `parent`, or a subtype of it through any
/// chain of superclass/superinterface edges?
///
/// BFS with a visited set; cycles in malformed hierarchies terminate the
/// walk with a negative answer. A parent that fails to resolve registers a
/// `ClassNotFound` at `location` and the walk continues past the other
/// edges, still returning a defined boolean.
pub fn is_subclass_or_self(
    ctx: &mut VerificationContext<'_>,
    child: &ClassNode,
    parent: &str,
    location: &Location,
) -> bool {
    if child.name == parent {
        return true;
    }
    is_subclass(ctx, child, parent, location)
}

/// Strict subtype check: `child != parent` and `parent` is reachable from
/// `child`'s direct parents.
pub fn is_subclass(
    ctx: &mut VerificationContext<'_>,
    child: &ClassNode,
    parent: &str,
    location: &Location,
) -> bool {
    // Everything except Object itself extends java/lang/Object.
    if parent == JAVA_LANG_OBJECT {
        return child.name != JAVA_LANG_OBJECT;
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(child.name.clone());
    let mut queue: VecDeque<String> = child.parents().map(str::to_string).collect();
    let mut steps = 0usize;

    while let Some(name) = queue.pop_front() {
        if name == parent {
            return true;
        }
        if !visited.insert(name.clone()) {
            continue;
        }
        steps += 1;
        if steps > HIERARCHY_MAX_BFS_STEPS {
            return false;
        }
        let Some(node) = ctx.resolve_or_report(&name, location) else {
            // Walk cannot continue past this node.
            continue;
        };
        for next in node.parents() {
            if !visited.contains(next) {
                queue.push_back(next.to_string());
            }
        }
    }
    false
}

/// Every supertype of `start` (excluding `start` itself), resolved and in
/// BFS order: superclass chain and interface closure interleaved.
/// Unresolvable parents are reported at `location` and skipped.
pub fn supertypes(
    ctx: &mut VerificationContext<'_>,
    start: &ClassNode,
    location: &Location,
) -> Vec<Arc<ClassNode>> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.name.clone());
    let mut queue: VecDeque<String> = start.parents().map(str::to_string).collect();
    let mut result = Vec::new();
    let mut steps = 0usize;

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        steps += 1;
        if steps > HIERARCHY_MAX_BFS_STEPS {
            break;
        }
        let Some(node) = ctx.resolve_or_report(&name, location) else {
            continue;
        };
        for next in node.parents() {
            if !visited.contains(next) {
                queue.push_back(next.to_string());
            }
        }
        result.push(node);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::Problem;
    use crate::resolver::{FixedResolver, Resolver};
    use crate::testutil::{class, java_lang_object};
    use crate::VerifierParameters;

    fn resolver_with(classes: Vec<crate::classfile::ClassNode>) -> FixedResolver {
        let mut resolver = FixedResolver::with_classes(classes);
        resolver.add(java_lang_object());
        resolver
    }

    #[test]
    fn walks_through_interfaces_and_superclasses() {
        let mut resolver = resolver_with(vec![
            class("p/Base").build(),
            class("p/Iface").interface().build(),
            class("p/Mid").extends("p/Base").implements("p/Iface").build(),
        ]);
        let child = class("p/Leaf").extends("p/Mid").build();
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("p/Leaf");

        assert!(is_subclass_or_self(&mut ctx, &child, "p/Leaf", &at));
        assert!(is_subclass(&mut ctx, &child, "p/Base", &at));
        assert!(is_subclass(&mut ctx, &child, "p/Iface", &at));
        assert!(is_subclass(&mut ctx, &child, "java/lang/Object", &at));
        assert!(!is_subclass(&mut ctx, &child, "p/Unrelated", &at));
    }

    #[test]
    fn terminates_on_cyclic_hierarchies() {
        let mut resolver = resolver_with(vec![
            class("cycle/A").extends("cycle/B").build(),
            class("cycle/B").extends("cycle/A").build(),
        ]);
        let child = class("cycle/A").extends("cycle/B").build();
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("cycle/A");

        assert!(!is_subclass(&mut ctx, &child, "missing/Parent", &at));
    }

    #[test]
    fn missing_parent_is_reported_and_walk_completes() {
        let mut resolver = resolver_with(vec![class("p/Child")
            .extends("gone/Super")
            .implements("p/Iface")
            .build(),
            class("p/Iface").interface().build()]);
        let child = class("p/Child").extends("gone/Super").implements("p/Iface").build();
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("p/Child");

        assert!(is_subclass(&mut ctx, &child, "p/Iface", &at));
        assert!(!is_subclass(&mut ctx, &child, "other/Thing", &at));
        let (registrar, _) = ctx.into_outputs();
        let (problems, _) = registrar.finish();
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::ClassNotFound { class, .. } if class == "gone/Super")));
    }
}
