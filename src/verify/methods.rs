//! Method resolution, following JVMS §5.4.3.3 (class methods) and
//! §5.4.3.4 (interface methods).

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::classfile::{descriptor, flags, ClassNode, MethodNode};
use crate::consts::{HIERARCHY_MAX_BFS_STEPS, JAVA_LANG_OBJECT, SIGNATURE_POLYMORPHIC_OWNERS};
use crate::problems::{Location, Problem};
use crate::verify::context::VerificationContext;

/// A method found in a resolved class.
#[derive(Clone)]
pub struct ResolvedMethod {
    pub class: Arc<ClassNode>,
    pub index: usize,
}

impl ResolvedMethod {
    pub fn method(&self) -> &MethodNode {
        &self.class.methods[self.index]
    }
}

/// Outcome of a lookup.
pub enum MethodLookup {
    Found(ResolvedMethod),
    NotFound,
    /// A prerequisite class resolution raised a problem; the invocation is
    /// abandoned without a `MethodNotFound`.
    Abort,
}

/// Class-method resolution (JVMS §5.4.3.3), starting at `owner`.
///
/// `owner` must not be an interface; callers report the class/interface
/// mismatch with the problem kind appropriate to their opcode before
/// calling.
pub fn resolve_class_method(
    ctx: &mut VerificationContext<'_>,
    owner: &Arc<ClassNode>,
    name: &str,
    desc: &str,
    location: &Location,
) -> MethodLookup {
    // Walk the superclass chain.
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = Some(Arc::clone(owner));
    while let Some(node) = current {
        if !visited.insert(node.name.clone()) {
            break;
        }
        if let Some(index) = signature_polymorphic_index(&node, name) {
            return MethodLookup::Found(ResolvedMethod { class: node, index });
        }
        if let Some(index) = method_index(&node, name, desc) {
            return MethodLookup::Found(ResolvedMethod { class: node, index });
        }
        current = match node.super_name.as_deref() {
            None => None,
            Some(super_name) => match ctx.resolve_or_report(super_name, location) {
                Some(super_node) => Some(super_node),
                None => return MethodLookup::Abort,
            },
        };
    }

    superinterface_lookup(ctx, owner, name, desc, location)
}

/// Interface-method resolution (JVMS §5.4.3.4), starting at interface
/// `owner`.
///
/// Emits `IncompatibleInterfaceToClassChange` and aborts when `owner`
/// turned into a regular class.
pub fn resolve_interface_method(
    ctx: &mut VerificationContext<'_>,
    owner: &Arc<ClassNode>,
    name: &str,
    desc: &str,
    location: &Location,
) -> MethodLookup {
    if !owner.is_interface() {
        ctx.register(Problem::IncompatibleInterfaceToClassChange {
            class: owner.name.clone(),
            location: location.clone(),
        });
        return MethodLookup::Abort;
    }

    if let Some(index) = method_index(owner, name, desc) {
        return MethodLookup::Found(ResolvedMethod {
            class: Arc::clone(owner),
            index,
        });
    }

    // A public non-static match on java/lang/Object resolves for any
    // interface (toString() and friends).
    if let Some(object) = ctx.resolve_or_report(JAVA_LANG_OBJECT, location) {
        if let Some(index) = method_index(&object, name, desc) {
            let method = &object.methods[index];
            if flags::is_public(method.access) && !flags::is_static(method.access) {
                return MethodLookup::Found(ResolvedMethod {
                    class: object,
                    index,
                });
            }
        }
    }

    superinterface_lookup(ctx, owner, name, desc, location)
}

/// Steps 3 and 4 shared by both resolution forms: prefer the unique
/// non-abstract maximally-specific superinterface method, fall back to any
/// non-private non-static superinterface match.
fn superinterface_lookup(
    ctx: &mut VerificationContext<'_>,
    start: &Arc<ClassNode>,
    name: &str,
    desc: &str,
    location: &Location,
) -> MethodLookup {
    let matches = superinterface_matches(ctx, start, name, desc, location);
    let maximal = maximally_specific(ctx, &matches);

    let non_abstract: Vec<&ResolvedMethod> = maximal
        .iter()
        .filter(|m| !flags::is_abstract(m.method().access))
        .collect();
    if non_abstract.len() == 1 {
        return MethodLookup::Found(non_abstract[0].clone());
    }

    // The matches already exclude private and static methods; the first
    // one in BFS order keeps the choice deterministic.
    match matches.into_iter().next() {
        Some(found) => MethodLookup::Found(found),
        None => MethodLookup::NotFound,
    }
}

/// Every method matching `(name, desc)` that is neither private nor
/// static, declared in any superinterface reachable from `start` (through
/// superclasses as well), in BFS order.
pub fn superinterface_matches(
    ctx: &mut VerificationContext<'_>,
    start: &ClassNode,
    name: &str,
    desc: &str,
    location: &Location,
) -> Vec<ResolvedMethod> {
    let mut matches = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.name.clone());
    let mut queue: VecDeque<String> = start.parents().map(str::to_string).collect();
    let mut steps = 0usize;

    while let Some(next) = queue.pop_front() {
        if !visited.insert(next.clone()) {
            continue;
        }
        steps += 1;
        if steps > HIERARCHY_MAX_BFS_STEPS {
            break;
        }
        let Some(node) = ctx.resolve_quietly(&next) else {
            continue;
        };
        if node.is_interface() {
            if let Some(index) = method_index(&node, name, desc) {
                let access = node.methods[index].access;
                if !flags::is_private(access) && !flags::is_static(access) {
                    matches.push(ResolvedMethod {
                        class: Arc::clone(&node),
                        index,
                    });
                }
            }
        }
        for parent in node.parents() {
            if !visited.contains(parent) {
                queue.push_back(parent.to_string());
            }
        }
    }
    matches
}

/// Filter `matches` down to the maximally-specific ones: keep a method
/// declared in interface `I` iff no other match is declared in a strict
/// subinterface of `I`. Ties are retained.
pub fn maximally_specific(
    ctx: &mut VerificationContext<'_>,
    matches: &[ResolvedMethod],
) -> Vec<ResolvedMethod> {
    // Superinterface closure of each declaring interface, by name.
    let mut closures: HashMap<String, HashSet<String>> = HashMap::new();
    for m in matches {
        closures
            .entry(m.class.name.clone())
            .or_insert_with(|| interface_closure(ctx, &m.class));
    }

    matches
        .iter()
        .filter(|m| {
            !matches.iter().any(|other| {
                other.class.name != m.class.name
                    && closures
                        .get(&other.class.name)
                        .is_some_and(|closure| closure.contains(&m.class.name))
            })
        })
        .cloned()
        .collect()
}

/// Names of all superinterfaces reachable from `start`, excluding `start`.
fn interface_closure(ctx: &mut VerificationContext<'_>, start: &ClassNode) -> HashSet<String> {
    let mut closure = HashSet::new();
    let mut queue: VecDeque<String> = start.interfaces.clone().into();
    let mut steps = 0usize;
    while let Some(next) = queue.pop_front() {
        if !closure.insert(next.clone()) {
            continue;
        }
        steps += 1;
        if steps > HIERARCHY_MAX_BFS_STEPS {
            break;
        }
        if let Some(node) = ctx.resolve_quietly(&next) {
            for parent in &node.interfaces {
                if !closure.contains(parent) {
                    queue.push_back(parent.clone());
                }
            }
        }
    }
    closure
}

fn method_index(node: &ClassNode, name: &str, desc: &str) -> Option<usize> {
    node.methods
        .iter()
        .position(|m| m.name == name && m.descriptor == desc)
}

/// Signature-polymorphic match (JVMS §2.9.3): the owner is
/// `java/lang/invoke/MethodHandle` or `VarHandle`, exactly one declared
/// method has the referenced name, and that method is native, varargs and
/// takes a single `Object[]` parameter. The descriptor is deliberately not
/// compared.
fn signature_polymorphic_index(node: &ClassNode, name: &str) -> Option<usize> {
    if !SIGNATURE_POLYMORPHIC_OWNERS.contains(&node.name.as_str()) {
        return None;
    }
    let mut named = node.methods.iter().enumerate().filter(|(_, m)| m.name == name);
    let (index, method) = named.next()?;
    if named.next().is_some() {
        return None;
    }
    let polymorphic = flags::is_native(method.access)
        && flags::is_varargs(method.access)
        && descriptor::parameter_types(&method.descriptor)
            .is_some_and(|params| params == ["[Ljava/lang/Object;"]);
    polymorphic.then_some(index)
}
