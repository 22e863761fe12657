//! The compatibility-problem model.
//!
//! Every defect the engine can report is one variant of [`Problem`]; the
//! enumeration is the public contract of the verifier. Each variant carries
//! exactly the references and locations its report needs, and the rendering
//! below pattern-matches on the tag.

pub mod location;
pub mod reference;
pub mod registrar;
pub mod usage;

pub use location::Location;
pub use reference::{FieldReference, MethodReference, SymbolicReference};
pub use registrar::{IgnoredProblem, ProblemFilter, ProblemRegistrar};
pub use usage::ApiUsage;

use std::fmt;

/// Visibility level that blocked an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    Private,
    Protected,
    PackagePrivate,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Private => write!(f, "private"),
            AccessLevel::Protected => write!(f, "protected"),
            AccessLevel::PackagePrivate => write!(f, "package-private"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Problem {
    ClassNotFound {
        class: String,
        location: Location,
    },
    /// Rollup of [`Problem::ClassNotFound`]s sharing a package prefix.
    /// Replaces its children in top-level listings; children are retained
    /// for detail views.
    PackageNotFound {
        package: String,
        children: Vec<Problem>,
    },
    InvalidClassFile {
        class: String,
        reason: String,
        location: Location,
    },
    FailedToReadClassFile {
        class: String,
        reason: String,
        location: Location,
    },
    IllegalClassAccess {
        class: String,
        level: AccessLevel,
        location: Location,
    },
    MethodNotFound {
        method: MethodReference,
        location: Location,
    },
    IllegalMethodAccess {
        method: MethodReference,
        level: AccessLevel,
        location: Location,
    },
    AbstractMethodInvocation {
        method: MethodReference,
        location: Location,
    },
    OverridingFinalMethod {
        method: MethodReference,
        location: Location,
    },
    MethodNotImplemented {
        method: MethodReference,
        location: Location,
    },
    MultipleDefaultImplementations {
        method: MethodReference,
        location: Location,
    },
    InvokeVirtualOnStaticMethod {
        method: MethodReference,
        location: Location,
    },
    InvokeSpecialOnStaticMethod {
        method: MethodReference,
        location: Location,
    },
    InvokeInterfaceOnStaticMethod {
        method: MethodReference,
        location: Location,
    },
    InvokeStaticOnInstanceMethod {
        method: MethodReference,
        location: Location,
    },
    InvokeInterfaceOnPrivateMethod {
        method: MethodReference,
        location: Location,
    },
    InvokeClassMethodOnInterface {
        class: String,
        location: Location,
    },
    IncompatibleClassToInterfaceChange {
        class: String,
        location: Location,
    },
    IncompatibleInterfaceToClassChange {
        class: String,
        location: Location,
    },
    InheritFromFinalClass {
        class: String,
        location: Location,
    },
    SuperClassBecameInterface {
        class: String,
        location: Location,
    },
    SuperInterfaceBecameClass {
        interface: String,
        location: Location,
    },
    InterfaceInstantiation {
        interface: String,
        location: Location,
    },
    AbstractClassInstantiation {
        class: String,
        location: Location,
    },
    FieldNotFound {
        field: FieldReference,
        location: Location,
    },
    IllegalFieldAccess {
        field: FieldReference,
        level: AccessLevel,
        location: Location,
    },
    StaticAccessOfInstanceField {
        field: FieldReference,
        location: Location,
    },
    InstanceAccessOfStaticField {
        field: FieldReference,
        location: Location,
    },
    ChangeFinalField {
        field: FieldReference,
        location: Location,
    },
}

impl Problem {
    /// Enclosing location, absent only for rollups.
    pub fn location(&self) -> Option<&Location> {
        use Problem::*;
        match self {
            PackageNotFound { .. } => None,
            ClassNotFound { location, .. }
            | InvalidClassFile { location, .. }
            | FailedToReadClassFile { location, .. }
            | IllegalClassAccess { location, .. }
            | MethodNotFound { location, .. }
            | IllegalMethodAccess { location, .. }
            | AbstractMethodInvocation { location, .. }
            | OverridingFinalMethod { location, .. }
            | MethodNotImplemented { location, .. }
            | MultipleDefaultImplementations { location, .. }
            | InvokeVirtualOnStaticMethod { location, .. }
            | InvokeSpecialOnStaticMethod { location, .. }
            | InvokeInterfaceOnStaticMethod { location, .. }
            | InvokeStaticOnInstanceMethod { location, .. }
            | InvokeInterfaceOnPrivateMethod { location, .. }
            | InvokeClassMethodOnInterface { location, .. }
            | IncompatibleClassToInterfaceChange { location, .. }
            | IncompatibleInterfaceToClassChange { location, .. }
            | InheritFromFinalClass { location, .. }
            | SuperClassBecameInterface { location, .. }
            | SuperInterfaceBecameClass { location, .. }
            | InterfaceInstantiation { location, .. }
            | AbstractClassInstantiation { location, .. }
            | FieldNotFound { location, .. }
            | IllegalFieldAccess { location, .. }
            | StaticAccessOfInstanceField { location, .. }
            | InstanceAccessOfStaticField { location, .. }
            | ChangeFinalField { location, .. } => Some(location),
        }
    }

    pub fn short_description(&self) -> String {
        use Problem::*;
        match self {
            ClassNotFound { class, .. } => format!("access to unresolved class {class}"),
            PackageNotFound { package, .. } => format!("package {package} is not found"),
            InvalidClassFile { class, .. } => format!("invalid class file {class}"),
            FailedToReadClassFile { class, .. } => format!("failed to read class file {class}"),
            IllegalClassAccess { class, level, .. } => {
                format!("illegal access to {level} class {class}")
            }
            MethodNotFound { method, .. } => format!("invocation of unresolved method {method}"),
            IllegalMethodAccess { method, level, .. } => {
                format!("illegal invocation of {level} method {method}")
            }
            AbstractMethodInvocation { method, .. } => {
                format!("invocation of abstract method {method}")
            }
            OverridingFinalMethod { method, .. } => format!("overriding final method {method}"),
            MethodNotImplemented { method, .. } => {
                format!("abstract method {method} is not implemented")
            }
            MultipleDefaultImplementations { method, .. } => {
                format!("multiple default implementations of {method}")
            }
            InvokeVirtualOnStaticMethod { method, .. } => {
                format!("invokevirtual on static method {method}")
            }
            InvokeSpecialOnStaticMethod { method, .. } => {
                format!("invokespecial on static method {method}")
            }
            InvokeInterfaceOnStaticMethod { method, .. } => {
                format!("invokeinterface on static method {method}")
            }
            InvokeStaticOnInstanceMethod { method, .. } => {
                format!("invokestatic on instance method {method}")
            }
            InvokeInterfaceOnPrivateMethod { method, .. } => {
                format!("invokeinterface on private method {method}")
            }
            InvokeClassMethodOnInterface { class, .. } => {
                format!("invoking a class method on interface {class}")
            }
            IncompatibleClassToInterfaceChange { class, .. } => {
                format!("incompatible change of class {class} to interface")
            }
            IncompatibleInterfaceToClassChange { class, .. } => {
                format!("incompatible change of interface {class} to class")
            }
            InheritFromFinalClass { class, .. } => format!("inheritance from final class {class}"),
            SuperClassBecameInterface { class, .. } => {
                format!("superclass {class} became an interface")
            }
            SuperInterfaceBecameClass { interface, .. } => {
                format!("superinterface {interface} became a class")
            }
            InterfaceInstantiation { interface, .. } => {
                format!("instantiation of interface {interface}")
            }
            AbstractClassInstantiation { class, .. } => {
                format!("instantiation of abstract class {class}")
            }
            FieldNotFound { field, .. } => format!("access to unresolved field {field}"),
            IllegalFieldAccess { field, level, .. } => {
                format!("illegal access to {level} field {field}")
            }
            StaticAccessOfInstanceField { field, .. } => {
                format!("static access to instance field {field}")
            }
            InstanceAccessOfStaticField { field, .. } => {
                format!("instance access to static field {field}")
            }
            ChangeFinalField { field, .. } => format!("write to final field {field}"),
        }
    }

    pub fn full_description(&self) -> String {
        match self.location() {
            Some(location) => format!("{} at {location}", self.short_description()),
            None => match self {
                Problem::PackageNotFound { package, children } => format!(
                    "package {package} is not found: {} unresolved class references",
                    children.len()
                ),
                _ => self.short_description(),
            },
        }
    }
}
