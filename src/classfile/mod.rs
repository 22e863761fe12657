//! Class-file AST consumed by the verification engine.
//!
//! A [`ClassNode`] is an immutable view of one loaded class: its access
//! flags, superclass, interfaces, members and the member-reference
//! instructions of each method body. Nodes are produced by the class-file
//! reader, owned by the resolver that read them and shared as
//! `Arc<ClassNode>` for the lifetime of a verification run.

pub mod descriptor;
pub mod flags;
pub mod opcodes;
pub mod reader;

pub use reader::{read_class, ClassReadError};

/// One loaded class.
#[derive(Debug, Clone)]
pub struct ClassNode {
    /// Internal name, e.g. `com/example/Main`.
    pub name: String,
    pub access: u16,
    pub major_version: u16,
    /// Absent only for `java/lang/Object` and module-info.
    pub super_name: Option<String>,
    /// Direct superinterfaces, in declaration order.
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    pub is_deprecated: bool,
    pub is_experimental: bool,
    pub is_internal_api: bool,
}

impl ClassNode {
    pub fn is_interface(&self) -> bool {
        flags::is_interface(self.access)
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodNode> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn find_field(&self, name: &str, descriptor: &str) -> Option<&FieldNode> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.descriptor == descriptor)
    }

    /// Direct parents: superclass (if any) followed by superinterfaces.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.super_name
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone)]
pub struct MethodNode {
    pub name: String,
    pub descriptor: String,
    pub access: u16,
    pub instructions: Vec<Instruction>,
    pub is_deprecated: bool,
}

impl MethodNode {
    /// Signature string used in reports, e.g. `run()V`.
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }
}

#[derive(Debug, Clone)]
pub struct FieldNode {
    pub name: String,
    pub descriptor: String,
    pub access: u16,
    pub constant_value: Option<ConstantValue>,
    pub is_deprecated: bool,
}

/// Value of a field's `ConstantValue` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// A member-reference instruction extracted from a method body.
///
/// Only the opcode families the analysis inspects are materialized;
/// arithmetic, stack and control-flow instructions are skipped during
/// reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Bytecode offset within the owning method's code array.
    pub offset: u32,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    Invoke {
        kind: InvokeKind,
        owner: String,
        name: String,
        descriptor: String,
        /// `true` when the owner was referenced through an
        /// `InterfaceMethodref` constant.
        interface_call: bool,
    },
    FieldAccess {
        kind: FieldAccessKind,
        owner: String,
        name: String,
        descriptor: String,
    },
    TypeOp {
        kind: TypeOpKind,
        /// Internal name or array descriptor, exactly as referenced.
        type_name: String,
    },
    LdcClass {
        type_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAccessKind {
    GetStatic,
    PutStatic,
    GetField,
    PutField,
}

impl FieldAccessKind {
    /// `getstatic` / `putstatic`.
    pub fn is_static_access(self) -> bool {
        matches!(self, FieldAccessKind::GetStatic | FieldAccessKind::PutStatic)
    }

    /// `putfield` / `putstatic`.
    pub fn is_write(self) -> bool {
        matches!(self, FieldAccessKind::PutField | FieldAccessKind::PutStatic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOpKind {
    New,
    ANewArray,
    CheckCast,
    InstanceOf,
    MultiANewArray,
}
