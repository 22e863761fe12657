//! Symbolic references: names out of the constant pool, prior to
//! resolution.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodReference {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodReference {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        MethodReference {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for MethodReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldReference {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl FieldReference {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        FieldReference {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} : {}", self.owner, self.name, self.descriptor)
    }
}

/// A reference of any of the three kinds, for records that are generic
/// over what was referenced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolicReference {
    Class(String),
    Method(MethodReference),
    Field(FieldReference),
}

impl fmt::Display for SymbolicReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolicReference::Class(name) => write!(f, "{name}"),
            SymbolicReference::Method(m) => write!(f, "{m}"),
            SymbolicReference::Field(fd) => write!(f, "{fd}"),
        }
    }
}
