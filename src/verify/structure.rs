//! Class-level structural verifiers: hierarchy shape changes, inherited
//! contracts, field types.

use std::collections::HashSet;

use crate::classfile::{descriptor, flags, ClassNode, FieldNode, MethodNode};
use crate::problems::{Location, MethodReference, Problem};
use crate::verify::context::VerificationContext;
use crate::verify::{hierarchy, methods};

pub fn verify_class_structure(ctx: &mut VerificationContext<'_>, node: &ClassNode) {
    let location = Location::class(node.name.clone());

    if let Some(super_name) = node.super_name.as_deref() {
        if let Some(super_node) = ctx.resolve_or_report(super_name, &location) {
            if super_node.is_interface() {
                ctx.register(Problem::SuperClassBecameInterface {
                    class: super_name.to_string(),
                    location: location.clone(),
                });
            } else if flags::is_final(super_node.access) {
                ctx.register(Problem::InheritFromFinalClass {
                    class: super_name.to_string(),
                    location: location.clone(),
                });
            }
        }
    }

    for interface in &node.interfaces {
        if let Some(interface_node) = ctx.resolve_or_report(interface, &location) {
            if !interface_node.is_interface() {
                ctx.register(Problem::SuperInterfaceBecameClass {
                    interface: interface.clone(),
                    location: location.clone(),
                });
            }
        }
    }

    if !node.is_interface() && !flags::is_abstract(node.access) {
        verify_inherited_contracts(ctx, node, &location);
    }
}

/// A concrete class must implement every abstract method it inherits, and
/// must not inherit the same default method from unrelated interfaces
/// without overriding it.
fn verify_inherited_contracts(
    ctx: &mut VerificationContext<'_>,
    node: &ClassNode,
    location: &Location,
) {
    let supertypes = hierarchy::supertypes(ctx, node, location);

    // Signatures with any concrete implementation (own methods, superclass
    // methods, interface defaults), and inheritable abstract declarations.
    let mut implemented: HashSet<(String, String)> = HashSet::new();
    let mut class_implemented: HashSet<(String, String)> = HashSet::new();
    let mut abstract_methods: Vec<MethodReference> = Vec::new();
    let mut abstract_seen: HashSet<(String, String)> = HashSet::new();

    for method in &node.methods {
        implemented.insert((method.name.clone(), method.descriptor.clone()));
        class_implemented.insert((method.name.clone(), method.descriptor.clone()));
    }
    for supertype in &supertypes {
        for method in &supertype.methods {
            if flags::is_private(method.access) || flags::is_static(method.access) {
                continue;
            }
            let signature = (method.name.clone(), method.descriptor.clone());
            if flags::is_abstract(method.access) {
                if abstract_seen.insert(signature) {
                    abstract_methods.push(MethodReference::new(
                        supertype.name.clone(),
                        method.name.clone(),
                        method.descriptor.clone(),
                    ));
                }
            } else {
                if !supertype.is_interface() {
                    class_implemented.insert(signature.clone());
                }
                implemented.insert(signature);
            }
        }
    }

    for reference in &abstract_methods {
        let signature = (reference.name.clone(), reference.descriptor.clone());
        if !implemented.contains(&signature) {
            ctx.register(Problem::MethodNotImplemented {
                method: reference.clone(),
                location: location.clone(),
            });
        }
    }

    // Default methods inherited from unrelated interfaces with no override
    // anywhere in the class chain.
    let mut default_signatures: Vec<(String, String)> = Vec::new();
    let mut default_seen: HashSet<(String, String)> = HashSet::new();
    for supertype in &supertypes {
        if !supertype.is_interface() {
            continue;
        }
        for method in &supertype.methods {
            if flags::is_abstract(method.access)
                || flags::is_static(method.access)
                || flags::is_private(method.access)
            {
                continue;
            }
            let signature = (method.name.clone(), method.descriptor.clone());
            if default_seen.insert(signature.clone()) {
                default_signatures.push(signature);
            }
        }
    }
    for (name, desc) in default_signatures {
        if class_implemented.contains(&(name.clone(), desc.clone())) {
            continue;
        }
        let matches = methods::superinterface_matches(ctx, node, &name, &desc, location);
        let maximal = methods::maximally_specific(ctx, &matches);
        let default_count = maximal
            .iter()
            .filter(|m| !flags::is_abstract(m.method().access))
            .count();
        if default_count > 1 {
            ctx.register(Problem::MultipleDefaultImplementations {
                method: MethodReference::new(node.name.clone(), name, desc),
                location: location.clone(),
            });
        }
    }
}

/// The class referenced by a field's type descriptor must exist.
pub fn verify_field_type(
    ctx: &mut VerificationContext<'_>,
    node: &ClassNode,
    field: &FieldNode,
) {
    if let Some(class_name) = descriptor::extract_class_name(&field.descriptor) {
        let location = Location::field(node.name.clone(), field.name.clone());
        ctx.resolve_or_report(class_name, &location);
    }
}

/// Every class mentioned in a method's parameter and return types must
/// exist.
pub fn verify_method_descriptor_types(
    ctx: &mut VerificationContext<'_>,
    node: &ClassNode,
    method: &MethodNode,
) {
    let referenced = descriptor::referenced_classes(&method.descriptor);
    if referenced.is_empty() {
        return;
    }
    let location = Location::method(node.name.clone(), method.signature());
    for class_name in referenced {
        ctx.resolve_or_report(class_name, &location);
    }
}
