//! Method-level verifier: overriding a final ancestor method.

use std::collections::{HashSet, VecDeque};

use crate::classfile::{flags, ClassNode, MethodNode};
use crate::consts::HIERARCHY_MAX_BFS_STEPS;
use crate::problems::{Location, MethodReference, Problem};
use crate::verify::context::VerificationContext;

/// Report `OverridingFinalMethod` when a non-private instance method
/// redeclares the signature of a final, non-abstract ancestor method.
///
/// Parents that fail to resolve are skipped quietly; the class-level
/// verifier already reported them.
pub fn verify_method_overrides(
    ctx: &mut VerificationContext<'_>,
    node: &ClassNode,
    method: &MethodNode,
) {
    if flags::is_private(method.access)
        || flags::is_static(method.access)
        || method.is_constructor()
    {
        return;
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(node.name.clone());
    let mut queue: VecDeque<String> = node.parents().map(str::to_string).collect();
    let mut steps = 0usize;

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        steps += 1;
        if steps > HIERARCHY_MAX_BFS_STEPS {
            return;
        }
        let Some(ancestor) = ctx.resolve_quietly(&name) else {
            continue;
        };
        if let Some(ancestor_method) = ancestor.find_method(&method.name, &method.descriptor) {
            let inherited = !flags::is_private(ancestor_method.access)
                && !flags::is_static(ancestor_method.access);
            if inherited
                && flags::is_final(ancestor_method.access)
                && !flags::is_abstract(ancestor_method.access)
            {
                ctx.register(Problem::OverridingFinalMethod {
                    method: MethodReference::new(
                        ancestor.name.clone(),
                        method.name.clone(),
                        method.descriptor.clone(),
                    ),
                    location: Location::method(node.name.clone(), method.signature()),
                });
                return;
            }
        }
        for parent in ancestor.parents() {
            if !visited.contains(parent) {
                queue.push_back(parent.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::flags::access_flags::*;
    use crate::resolver::{FixedResolver, Resolver};
    use crate::testutil::{class, java_lang_object, method};
    use crate::VerifierParameters;

    fn run_overrides(classes: Vec<ClassNode>, target: &ClassNode) -> Vec<Problem> {
        let mut resolver = FixedResolver::with_classes(classes);
        resolver.add(java_lang_object());
        resolver.add(target.clone());
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        for m in &target.methods {
            verify_method_overrides(&mut ctx, target, m);
        }
        let (registrar, _) = ctx.into_outputs();
        registrar.finish().0
    }

    #[test]
    fn overriding_final_method_is_reported() {
        let base = class("p/A")
            .method(method("m", "()V").add_access(ACC_FINAL))
            .build();
        let target = class("q/B").extends("p/A").method(method("m", "()V")).build();
        let problems = run_overrides(vec![base], &target);
        match problems.as_slice() {
            [Problem::OverridingFinalMethod { method, location }] => {
                assert_eq!(method.owner, "p/A");
                assert_eq!(location.class_name(), "q/B");
            }
            other => panic!("expected OverridingFinalMethod, got {other:?}"),
        }
    }

    #[test]
    fn final_method_deep_in_the_chain() {
        let root = class("p/Root")
            .method(method("m", "()V").add_access(ACC_FINAL))
            .build();
        let mid = class("p/Mid").extends("p/Root").build();
        let target = class("q/B").extends("p/Mid").method(method("m", "()V")).build();
        let problems = run_overrides(vec![root, mid], &target);
        assert!(matches!(
            problems.as_slice(),
            [Problem::OverridingFinalMethod { method, .. }] if method.owner == "p/Root"
        ));
    }

    #[test]
    fn non_final_and_private_ancestors_are_fine() {
        let base = class("p/A")
            .method(method("m", "()V"))
            .method(method("hidden", "()V").access(ACC_PRIVATE | ACC_FINAL))
            .build();
        let target = class("q/B")
            .extends("p/A")
            .method(method("m", "()V"))
            .method(method("hidden", "()V"))
            .build();
        let problems = run_overrides(vec![base], &target);
        assert!(problems.is_empty(), "unexpected problems: {problems:?}");
    }
}
