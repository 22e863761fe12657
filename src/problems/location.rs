//! Concrete locations of findings inside the verified plugin.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Class(String),
    Method {
        class: String,
        /// Name plus descriptor, e.g. `run()V`.
        signature: String,
    },
    Field {
        class: String,
        name: String,
    },
    Instruction {
        class: String,
        method_signature: String,
        offset: u32,
    },
}

impl Location {
    pub fn class(name: impl Into<String>) -> Self {
        Location::Class(name.into())
    }

    pub fn method(class: impl Into<String>, signature: impl Into<String>) -> Self {
        Location::Method {
            class: class.into(),
            signature: signature.into(),
        }
    }

    pub fn field(class: impl Into<String>, name: impl Into<String>) -> Self {
        Location::Field {
            class: class.into(),
            name: name.into(),
        }
    }

    pub fn instruction(
        class: impl Into<String>,
        method_signature: impl Into<String>,
        offset: u32,
    ) -> Self {
        Location::Instruction {
            class: class.into(),
            method_signature: method_signature.into(),
            offset,
        }
    }

    /// Internal name of the enclosing class.
    pub fn class_name(&self) -> &str {
        match self {
            Location::Class(name) => name,
            Location::Method { class, .. } => class,
            Location::Field { class, .. } => class,
            Location::Instruction { class, .. } => class,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Class(name) => write!(f, "{name}"),
            Location::Method { class, signature } => write!(f, "{class}.{signature}"),
            Location::Field { class, name } => write!(f, "{class}.{name}"),
            Location::Instruction {
                class,
                method_signature,
                offset,
            } => write!(f, "{class}.{method_signature} at offset {offset}"),
        }
    }
}
