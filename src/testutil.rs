//! Fixture builders for tests: synthetic class nodes without class files.
//!
//! Kept in the library (hidden from docs) so both unit tests and the
//! integration suite build hierarchies the same way.

use crate::classfile::flags::access_flags::*;
use crate::classfile::{
    ClassNode, FieldAccessKind, FieldNode, Instruction, InstructionKind, InvokeKind, MethodNode,
    TypeOpKind,
};

/// Start a class fixture. Defaults: public, version 52, extends
/// `java/lang/Object`.
pub fn class(name: &str) -> ClassBuilder {
    ClassBuilder {
        node: ClassNode {
            name: name.to_string(),
            access: ACC_PUBLIC,
            major_version: 52,
            super_name: Some(crate::consts::JAVA_LANG_OBJECT.to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            is_deprecated: false,
            is_experimental: false,
            is_internal_api: false,
        },
    }
}

/// `java/lang/Object` with the handful of public methods lookups rely on.
pub fn java_lang_object() -> ClassNode {
    let mut builder = class(crate::consts::JAVA_LANG_OBJECT).super_name(None);
    for (name, descriptor) in [
        ("<init>", "()V"),
        ("equals", "(Ljava/lang/Object;)Z"),
        ("hashCode", "()I"),
        ("toString", "()Ljava/lang/String;"),
        ("getClass", "()Ljava/lang/Class;"),
    ] {
        builder = builder.method(method(name, descriptor).access(ACC_PUBLIC));
    }
    builder.build()
}

pub struct ClassBuilder {
    node: ClassNode,
}

impl ClassBuilder {
    pub fn access(mut self, access: u16) -> Self {
        self.node.access = access;
        self
    }

    pub fn add_access(mut self, bits: u16) -> Self {
        self.node.access |= bits;
        self
    }

    pub fn interface(mut self) -> Self {
        self.node.access |= ACC_INTERFACE | ACC_ABSTRACT;
        self.node.super_name = Some(crate::consts::JAVA_LANG_OBJECT.to_string());
        self
    }

    pub fn super_name(mut self, super_name: Option<&str>) -> Self {
        self.node.super_name = super_name.map(str::to_string);
        self
    }

    pub fn extends(mut self, super_name: &str) -> Self {
        self.node.super_name = Some(super_name.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.node.interfaces.push(interface.to_string());
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.node.methods.push(method.build());
        self
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.node.fields.push(field.build());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.node.is_deprecated = true;
        self
    }

    pub fn build(self) -> ClassNode {
        self.node
    }
}

/// Start a method fixture. Default access: public.
pub fn method(name: &str, descriptor: &str) -> MethodBuilder {
    MethodBuilder {
        node: MethodNode {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: ACC_PUBLIC,
            instructions: Vec::new(),
            is_deprecated: false,
        },
    }
}

pub struct MethodBuilder {
    node: MethodNode,
}

impl MethodBuilder {
    pub fn access(mut self, access: u16) -> Self {
        self.node.access = access;
        self
    }

    pub fn add_access(mut self, bits: u16) -> Self {
        self.node.access |= bits;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.node.is_deprecated = true;
        self
    }

    pub fn invoke(self, kind: InvokeKind, owner: &str, name: &str, descriptor: &str) -> Self {
        let interface_call = kind == InvokeKind::Interface;
        self.invoke_itf(kind, owner, name, descriptor, interface_call)
    }

    pub fn invoke_itf(
        mut self,
        kind: InvokeKind,
        owner: &str,
        name: &str,
        descriptor: &str,
        interface_call: bool,
    ) -> Self {
        let offset = self.next_offset();
        self.node.instructions.push(Instruction {
            offset,
            kind: InstructionKind::Invoke {
                kind,
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                interface_call,
            },
        });
        self
    }

    pub fn field_access(
        mut self,
        kind: FieldAccessKind,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Self {
        let offset = self.next_offset();
        self.node.instructions.push(Instruction {
            offset,
            kind: InstructionKind::FieldAccess {
                kind,
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            },
        });
        self
    }

    pub fn type_op(mut self, kind: TypeOpKind, type_name: &str) -> Self {
        let offset = self.next_offset();
        self.node.instructions.push(Instruction {
            offset,
            kind: InstructionKind::TypeOp {
                kind,
                type_name: type_name.to_string(),
            },
        });
        self
    }

    fn next_offset(&self) -> u32 {
        self.node.instructions.len() as u32 * 3
    }

    pub fn build(self) -> MethodNode {
        self.node
    }
}

/// Start a field fixture. Default access: public.
pub fn field(name: &str, descriptor: &str) -> FieldBuilder {
    FieldBuilder {
        node: FieldNode {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: ACC_PUBLIC,
            constant_value: None,
            is_deprecated: false,
        },
    }
}

pub struct FieldBuilder {
    node: FieldNode,
}

impl FieldBuilder {
    pub fn access(mut self, access: u16) -> Self {
        self.node.access = access;
        self
    }

    pub fn add_access(mut self, bits: u16) -> Self {
        self.node.access |= bits;
        self
    }

    pub fn build(self) -> FieldNode {
        self.node
    }
}
