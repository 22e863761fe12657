//! Access flag constants and predicates over raw flag words.

pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;
}

use access_flags::*;

pub fn is_public(access: u16) -> bool {
    access & ACC_PUBLIC != 0
}

pub fn is_private(access: u16) -> bool {
    access & ACC_PRIVATE != 0
}

pub fn is_protected(access: u16) -> bool {
    access & ACC_PROTECTED != 0
}

/// Package-private: none of public, protected, private.
pub fn is_default_access(access: u16) -> bool {
    access & (ACC_PUBLIC | ACC_PRIVATE | ACC_PROTECTED) == 0
}

pub fn is_static(access: u16) -> bool {
    access & ACC_STATIC != 0
}

pub fn is_final(access: u16) -> bool {
    access & ACC_FINAL != 0
}

pub fn is_abstract(access: u16) -> bool {
    access & ACC_ABSTRACT != 0
}

pub fn is_interface(access: u16) -> bool {
    access & ACC_INTERFACE != 0
}

pub fn is_synthetic(access: u16) -> bool {
    access & ACC_SYNTHETIC != 0
}

pub fn is_bridge(access: u16) -> bool {
    access & ACC_BRIDGE != 0
}

pub fn is_varargs(access: u16) -> bool {
    access & ACC_VARARGS != 0
}

pub fn is_native(access: u16) -> bool {
    access & ACC_NATIVE != 0
}

/// Compare the package segments of two internal names.
///
/// The package is everything up to the last `/`; classes in the default
/// package compare equal to each other.
pub fn same_package(a: &str, b: &str) -> bool {
    package_of(a) == package_of(b)
}

pub fn package_of(internal_name: &str) -> &str {
    match internal_name.rfind('/') {
        Some(idx) => &internal_name[..idx],
        None => "",
    }
}
