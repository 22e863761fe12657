//! Field resolution, following JVMS §5.4.3.2.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::classfile::{ClassNode, FieldNode};
use crate::consts::HIERARCHY_MAX_BFS_STEPS;
use crate::problems::Location;
use crate::verify::context::VerificationContext;

/// A field found in a resolved class.
#[derive(Clone)]
pub struct ResolvedField {
    pub class: Arc<ClassNode>,
    pub index: usize,
}

impl ResolvedField {
    pub fn field(&self) -> &FieldNode {
        &self.class.fields[self.index]
    }
}

pub enum FieldLookup {
    Found(ResolvedField),
    NotFound,
    /// A prerequisite class resolution raised a problem.
    Abort,
}

/// Resolve `(name, desc)` starting at `owner`: the class itself first,
/// then its superinterfaces in BFS order, then the superclass.
pub fn resolve_field(
    ctx: &mut VerificationContext<'_>,
    owner: &Arc<ClassNode>,
    name: &str,
    desc: &str,
    location: &Location,
) -> FieldLookup {
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = Some(Arc::clone(owner));

    while let Some(node) = current {
        if !visited.insert(node.name.clone()) {
            break;
        }
        if let Some(index) = field_index(&node, name, desc) {
            return FieldLookup::Found(ResolvedField { class: node, index });
        }
        match interface_field_lookup(ctx, &node, name, desc, location, &mut visited) {
            FieldLookup::NotFound => {}
            answer => return answer,
        }
        current = match node.super_name.as_deref() {
            None => None,
            Some(super_name) => match ctx.resolve_or_report(super_name, location) {
                Some(super_node) => Some(super_node),
                None => return FieldLookup::Abort,
            },
        };
    }

    FieldLookup::NotFound
}

/// Level-by-level walk over `node`'s superinterface lattice: every direct
/// superinterface is checked for its own declaration before any of their
/// superinterfaces is descended into.
fn interface_field_lookup(
    ctx: &mut VerificationContext<'_>,
    node: &ClassNode,
    name: &str,
    desc: &str,
    location: &Location,
    visited: &mut HashSet<String>,
) -> FieldLookup {
    let mut queue: VecDeque<String> = node.interfaces.iter().cloned().collect();
    let mut steps = 0usize;

    while let Some(next) = queue.pop_front() {
        if !visited.insert(next.clone()) {
            continue;
        }
        steps += 1;
        if steps > HIERARCHY_MAX_BFS_STEPS {
            break;
        }
        let Some(interface_node) = ctx.resolve_or_report(&next, location) else {
            return FieldLookup::Abort;
        };
        if let Some(index) = field_index(&interface_node, name, desc) {
            return FieldLookup::Found(ResolvedField {
                class: interface_node,
                index,
            });
        }
        for parent in &interface_node.interfaces {
            if !visited.contains(parent) {
                queue.push_back(parent.clone());
            }
        }
    }

    FieldLookup::NotFound
}

fn field_index(node: &ClassNode, name: &str, desc: &str) -> Option<usize> {
    node.fields
        .iter()
        .position(|f| f.name == name && f.descriptor == desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{FixedResolver, Resolver};
    use crate::testutil::{class, field, java_lang_object};
    use crate::VerifierParameters;

    #[test]
    fn interface_constants_take_precedence_over_superclass() {
        let mut resolver = FixedResolver::with_classes(vec![
            java_lang_object(),
            class("p/Constants")
                .interface()
                .field(field("LIMIT", "I"))
                .build(),
            class("p/Base").field(field("LIMIT", "I")).build(),
            class("p/Sub")
                .extends("p/Base")
                .implements("p/Constants")
                .build(),
        ]);
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("q/User");
        let owner = ctx.resolve_or_report("p/Sub", &at).unwrap();

        match resolve_field(&mut ctx, &owner, "LIMIT", "I", &at) {
            FieldLookup::Found(found) => assert_eq!(found.class.name, "p/Constants"),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn direct_superinterface_beats_deeper_one() {
        // I1 inherits X from I3; I2 declares X itself. BFS checks the
        // direct superinterfaces I1 and I2 for their own declarations
        // before descending into I3, so I2's field wins regardless of
        // declaration order.
        let mut resolver = FixedResolver::with_classes(vec![
            java_lang_object(),
            class("p/I3").interface().field(field("X", "I")).build(),
            class("p/I1").interface().implements("p/I3").build(),
            class("p/I2").interface().field(field("X", "I")).build(),
            class("p/C").implements("p/I1").implements("p/I2").build(),
        ]);
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("q/User");
        let owner = ctx.resolve_or_report("p/C", &at).unwrap();

        match resolve_field(&mut ctx, &owner, "X", "I", &at) {
            FieldLookup::Found(found) => assert_eq!(found.class.name, "p/I2"),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn missing_field_is_not_found() {
        let mut resolver = FixedResolver::with_classes(vec![
            java_lang_object(),
            class("p/Holder").field(field("present", "I")).build(),
        ]);
        let params = VerifierParameters::default();
        let mut ctx = VerificationContext::new(&mut resolver as &mut dyn Resolver, &params);
        let at = Location::class("q/User");
        let owner = ctx.resolve_or_report("p/Holder", &at).unwrap();

        assert!(matches!(
            resolve_field(&mut ctx, &owner, "absent", "I", &at),
            FieldLookup::NotFound
        ));
    }
}
