//! Class lookup over jars, directories and in-memory pools.
//!
//! A [`Resolver`] maps internal class names to [`ClassNode`]s. Concrete
//! resolvers are layered with [`UnionResolver`] (ordered fallback) and
//! [`CacheResolver`] (memoization) into the verification classpath; the
//! layering order is a correctness requirement, see
//! [`crate::verify`].

pub mod cache;
pub mod dir;
pub mod fixed;
pub mod jar;
pub mod union;

pub use cache::CacheResolver;
pub use dir::DirResolver;
pub use fixed::FixedResolver;
pub use jar::JarResolver;
pub use union::UnionResolver;

use std::path::PathBuf;
use std::sync::Arc;

use crate::classfile::ClassNode;

/// Outcome of a class lookup.
///
/// A resolver is a total function over names: every query ends in exactly
/// one of these, never a transient ambiguity. `FailedToRead` and `Invalid`
/// are real answers that must surface as problems, not be skipped over.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Arc<ClassNode>),
    NotFound,
    /// The backing storage failed while producing the entry's bytes.
    FailedToRead(String),
    /// The bytes were read but are not a well-formed class file.
    Invalid(String),
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// One source of classes.
///
/// Resolvers are created at job start and closed at job end; closing is
/// idempotent and propagates through composite resolvers. Lookups after
/// close answer `NotFound`.
pub trait Resolver {
    fn find(&mut self, name: &str) -> Resolution;

    fn contains(&mut self, name: &str) -> bool {
        self.find(name).is_found()
    }

    /// Names of every class this resolver can produce, in a deterministic
    /// order.
    fn all_class_names(&self) -> Vec<String>;

    /// Files backing this resolver, if any.
    fn class_path(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn close(&mut self);
}
