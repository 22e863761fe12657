//! Usage records for unstable API surfaces.
//!
//! Produced only when the job opts in via
//! `VerifierParameters::find_deprecated_api_usages`. These are informational
//! records, not problems: the referenced element resolved fine, it is just
//! marked deprecated, experimental or internal by its owner.

use std::fmt;

use crate::problems::{Location, SymbolicReference};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiUsage {
    Deprecated {
        reference: SymbolicReference,
        location: Location,
    },
    Experimental {
        reference: SymbolicReference,
        location: Location,
    },
    InternalApi {
        reference: SymbolicReference,
        location: Location,
    },
}

impl ApiUsage {
    pub fn reference(&self) -> &SymbolicReference {
        match self {
            ApiUsage::Deprecated { reference, .. }
            | ApiUsage::Experimental { reference, .. }
            | ApiUsage::InternalApi { reference, .. } => reference,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            ApiUsage::Deprecated { location, .. }
            | ApiUsage::Experimental { location, .. }
            | ApiUsage::InternalApi { location, .. } => location,
        }
    }
}

impl fmt::Display for ApiUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiUsage::Deprecated { reference, location } => {
                write!(f, "deprecated API {reference} used at {location}")
            }
            ApiUsage::Experimental { reference, location } => {
                write!(f, "experimental API {reference} used at {location}")
            }
            ApiUsage::InternalApi { reference, location } => {
                write!(f, "internal API {reference} used at {location}")
            }
        }
    }
}
