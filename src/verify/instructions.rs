//! Per-instruction verifiers: method invocations, field accesses, type
//! operations and class-literal loads.

use crate::classfile::{
    descriptor, flags, ClassNode, FieldAccessKind, Instruction, InstructionKind, InvokeKind,
    MethodNode, TypeOpKind,
};
use crate::problems::{ApiUsage, FieldReference, Location, MethodReference, Problem, SymbolicReference};
use crate::verify::access;
use crate::verify::context::VerificationContext;
use crate::verify::fields::{resolve_field, FieldLookup};
use crate::verify::methods::{resolve_class_method, resolve_interface_method, MethodLookup};

pub fn verify_instruction(
    ctx: &mut VerificationContext<'_>,
    class: &ClassNode,
    method: &MethodNode,
    instruction: &Instruction,
) {
    let location = Location::method(class.name.clone(), method.signature());
    match &instruction.kind {
        InstructionKind::Invoke {
            kind,
            owner,
            name,
            descriptor,
            interface_call,
        } => verify_invoke(
            ctx,
            class,
            method,
            instruction.offset,
            *kind,
            owner,
            name,
            descriptor,
            *interface_call,
            &location,
        ),
        InstructionKind::FieldAccess {
            kind,
            owner,
            name,
            descriptor,
        } => verify_field_access(
            ctx,
            class,
            method,
            instruction.offset,
            *kind,
            owner,
            name,
            descriptor,
            &location,
        ),
        InstructionKind::TypeOp { kind, type_name } => {
            verify_type_op(ctx, class, *kind, type_name, &location)
        }
        InstructionKind::LdcClass { type_name } => {
            if let Some(element) = descriptor::extract_class_name(type_name) {
                ctx.resolve_or_report(element, &location);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn verify_invoke(
    ctx: &mut VerificationContext<'_>,
    class: &ClassNode,
    method: &MethodNode,
    offset: u32,
    kind: InvokeKind,
    owner: &str,
    name: &str,
    desc: &str,
    interface_call: bool,
    location: &Location,
) {
    // Array receivers (e.g. `clone()` on `[Lp/C;`) borrow their methods
    // from java/lang/Object; only the element type's presence matters.
    if owner.starts_with('[') {
        if let Some(element) = descriptor::extract_class_name(owner) {
            ctx.resolve_or_report(element, location);
        }
        return;
    }

    let Some(owner_node) = ctx.resolve_or_report(owner, location) else {
        return;
    };
    if let Some(level) = access::class_access_violation(ctx, owner_node.as_ref(), class, location) {
        ctx.register(Problem::IllegalClassAccess {
            class: owner_node.name.clone(),
            level,
            location: location.clone(),
        });
        return;
    }

    let lookup = match kind {
        InvokeKind::Virtual => {
            if owner_node.is_interface() {
                ctx.register(Problem::InvokeClassMethodOnInterface {
                    class: owner_node.name.clone(),
                    location: location.clone(),
                });
                return;
            }
            resolve_class_method(ctx, &owner_node, name, desc, location)
        }
        InvokeKind::Special | InvokeKind::Static => {
            if interface_call {
                resolve_interface_method(ctx, &owner_node, name, desc, location)
            } else if owner_node.is_interface() {
                ctx.register(Problem::IncompatibleClassToInterfaceChange {
                    class: owner_node.name.clone(),
                    location: location.clone(),
                });
                return;
            } else {
                resolve_class_method(ctx, &owner_node, name, desc, location)
            }
        }
        InvokeKind::Interface => resolve_interface_method(ctx, &owner_node, name, desc, location),
    };

    let resolved = match lookup {
        MethodLookup::Found(resolved) => resolved,
        MethodLookup::NotFound => {
            ctx.register(Problem::MethodNotFound {
                method: MethodReference::new(owner, name, desc),
                location: location.clone(),
            });
            return;
        }
        MethodLookup::Abort => return,
    };

    let resolved_access = resolved.method().access;
    let resolved_ref = MethodReference::new(
        resolved.class.name.clone(),
        resolved.method().name.clone(),
        resolved.method().descriptor.clone(),
    );

    // Static/instance dichotomy per opcode.
    let dichotomy = match kind {
        InvokeKind::Virtual if flags::is_static(resolved_access) => {
            Some(Problem::InvokeVirtualOnStaticMethod {
                method: resolved_ref.clone(),
                location: location.clone(),
            })
        }
        InvokeKind::Special if flags::is_static(resolved_access) => {
            Some(Problem::InvokeSpecialOnStaticMethod {
                method: resolved_ref.clone(),
                location: location.clone(),
            })
        }
        InvokeKind::Interface if flags::is_static(resolved_access) => {
            Some(Problem::InvokeInterfaceOnStaticMethod {
                method: resolved_ref.clone(),
                location: location.clone(),
            })
        }
        InvokeKind::Interface if flags::is_private(resolved_access) => {
            Some(Problem::InvokeInterfaceOnPrivateMethod {
                method: resolved_ref.clone(),
                location: location.clone(),
            })
        }
        InvokeKind::Static if !flags::is_static(resolved_access) => {
            Some(Problem::InvokeStaticOnInstanceMethod {
                method: resolved_ref.clone(),
                location: location.clone(),
            })
        }
        _ => None,
    };
    if let Some(problem) = dichotomy {
        ctx.register(problem);
        return;
    }

    if let Some(level) = access::member_access_violation(
        ctx,
        resolved_access,
        resolved.class.as_ref(),
        owner_node.as_ref(),
        class,
        flags::is_static(resolved_access),
        location,
    ) {
        ctx.register(Problem::IllegalMethodAccess {
            method: resolved_ref,
            level,
            location: location.clone(),
        });
        return;
    }

    if kind == InvokeKind::Special && flags::is_abstract(resolved_access) {
        ctx.register(Problem::AbstractMethodInvocation {
            method: resolved_ref.clone(),
            location: location.clone(),
        });
        return;
    }

    if resolved.method().is_deprecated {
        ctx.register_usage(ApiUsage::Deprecated {
            reference: SymbolicReference::Method(resolved_ref),
            location: Location::instruction(class.name.clone(), method.signature(), offset),
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn verify_field_access(
    ctx: &mut VerificationContext<'_>,
    class: &ClassNode,
    method: &MethodNode,
    offset: u32,
    kind: FieldAccessKind,
    owner: &str,
    name: &str,
    desc: &str,
    location: &Location,
) {
    if owner.starts_with('[') {
        if let Some(element) = descriptor::extract_class_name(owner) {
            ctx.resolve_or_report(element, location);
        }
        return;
    }

    let Some(owner_node) = ctx.resolve_or_report(owner, location) else {
        return;
    };
    if let Some(level) = access::class_access_violation(ctx, owner_node.as_ref(), class, location) {
        ctx.register(Problem::IllegalClassAccess {
            class: owner_node.name.clone(),
            level,
            location: location.clone(),
        });
        return;
    }

    let resolved = match resolve_field(ctx, &owner_node, name, desc, location) {
        FieldLookup::Found(resolved) => resolved,
        FieldLookup::NotFound => {
            ctx.register(Problem::FieldNotFound {
                field: FieldReference::new(owner, name, desc),
                location: location.clone(),
            });
            return;
        }
        FieldLookup::Abort => return,
    };

    let field_access = resolved.field().access;
    let resolved_ref = FieldReference::new(resolved.class.name.clone(), name, desc);

    if let Some(level) = access::member_access_violation(
        ctx,
        field_access,
        resolved.class.as_ref(),
        owner_node.as_ref(),
        class,
        flags::is_static(field_access),
        location,
    ) {
        ctx.register(Problem::IllegalFieldAccess {
            field: resolved_ref,
            level,
            location: location.clone(),
        });
        return;
    }

    if kind.is_static_access() && !flags::is_static(field_access) {
        ctx.register(Problem::StaticAccessOfInstanceField {
            field: resolved_ref,
            location: location.clone(),
        });
        return;
    }
    if !kind.is_static_access() && flags::is_static(field_access) {
        ctx.register(Problem::InstanceAccessOfStaticField {
            field: resolved_ref,
            location: location.clone(),
        });
        return;
    }

    // A final field may only be written by <init>/<clinit> of its own
    // declaring class.
    if kind.is_write() && flags::is_final(field_access) {
        let same_class = resolved.class.name == class.name;
        if !same_class || !method.is_constructor() {
            ctx.register(Problem::ChangeFinalField {
                field: resolved_ref.clone(),
                location: location.clone(),
            });
            return;
        }
    }

    if resolved.field().is_deprecated {
        ctx.register_usage(ApiUsage::Deprecated {
            reference: SymbolicReference::Field(resolved_ref),
            location: Location::instruction(class.name.clone(), method.signature(), offset),
        });
    }
}

fn verify_type_op(
    ctx: &mut VerificationContext<'_>,
    class: &ClassNode,
    kind: TypeOpKind,
    type_name: &str,
    location: &Location,
) {
    // Primitive array operands reference no class.
    let Some(element) = descriptor::extract_class_name(type_name) else {
        return;
    };
    let Some(node) = ctx.resolve_or_report(element, location) else {
        return;
    };
    if let Some(level) = access::class_access_violation(ctx, node.as_ref(), class, location) {
        ctx.register(Problem::IllegalClassAccess {
            class: node.name.clone(),
            level,
            location: location.clone(),
        });
        return;
    }

    if kind == TypeOpKind::New {
        if node.is_interface() {
            ctx.register(Problem::InterfaceInstantiation {
                interface: node.name.clone(),
                location: location.clone(),
            });
        } else if flags::is_abstract(node.access) {
            ctx.register(Problem::AbstractClassInstantiation {
                class: node.name.clone(),
                location: location.clone(),
            });
        }
    }
}
