//! Memoizing wrapper around a resolver.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::resolver::{Resolution, Resolver};

/// Memoizes every resolution of the wrapped resolver by class name.
///
/// Error resolutions are memoized with the same identity as the first
/// answer, so a class whose storage is broken yields one `FailedToRead`
/// per run no matter how many references hit it.
pub struct CacheResolver {
    inner: Box<dyn Resolver>,
    memo: HashMap<String, Resolution>,
}

impl CacheResolver {
    pub fn new(inner: Box<dyn Resolver>) -> Self {
        CacheResolver {
            inner,
            memo: HashMap::new(),
        }
    }
}

impl Resolver for CacheResolver {
    fn find(&mut self, name: &str) -> Resolution {
        if let Some(answer) = self.memo.get(name) {
            return answer.clone();
        }
        let answer = self.inner.find(name);
        self.memo.insert(name.to_string(), answer.clone());
        answer
    }

    fn contains(&mut self, name: &str) -> bool {
        match self.memo.get(name) {
            Some(answer) => answer.is_found(),
            None => self.find(name).is_found(),
        }
    }

    fn all_class_names(&self) -> Vec<String> {
        self.inner.all_class_names()
    }

    fn class_path(&self) -> Vec<PathBuf> {
        self.inner.class_path()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FixedResolver;
    use crate::testutil::class;

    #[test]
    fn caches_found_and_not_found() {
        let mut fixed = FixedResolver::new();
        fixed.add(class("p/A").build());
        let mut cache = CacheResolver::new(Box::new(fixed));

        let first = cache.find("p/A");
        let second = cache.find("p/A");
        match (first, second) {
            (Resolution::Found(a), Resolution::Found(b)) => {
                assert!(std::sync::Arc::ptr_eq(&a, &b))
            }
            other => panic!("expected Found twice, got {other:?}"),
        }
        assert!(!cache.contains("p/Missing"));
        assert!(!cache.find("p/Missing").is_found());
    }

    #[test]
    fn lookups_after_close_stay_memoized() {
        let mut fixed = FixedResolver::new();
        fixed.add(class("p/A").build());
        let mut cache = CacheResolver::new(Box::new(fixed));
        assert!(cache.find("p/A").is_found());
        cache.close();
        // The memo still answers; the backing resolver no longer does.
        assert!(cache.find("p/A").is_found());
        assert!(!cache.find("p/B").is_found());
    }
}
