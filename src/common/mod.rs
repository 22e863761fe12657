//! Shared infrastructure: fatal error taxonomy, cancellation, cross-job caches.

pub mod cache;
pub mod cancel;
pub mod error;

pub use cache::SharedCache;
pub use cancel::CancellationToken;
pub use error::{Error, Result};
