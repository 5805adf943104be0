use super::cache::*;

use std::collections::*;

/// Name of the default cache.
pub const DEFAULT_CACHE_NAME: &str = "default";

//
// Caches
//

/// Named caches.
///
/// [Settings](super::Settings) select a cache from here by name.
#[derive(Clone, Debug)]
pub struct Caches<CacheT>
where
    CacheT: Cache,
{
    caches: BTreeMap<String, CacheT>,
}

impl<CacheT> Caches<CacheT>
where
    CacheT: Cache,
{
    /// Constructor.
    pub fn new() -> Self {
        Self { caches: Default::default() }
    }

    /// With a single cache registered as [DEFAULT_CACHE_NAME].
    pub fn single(cache: CacheT) -> Self {
        Self::new().with(DEFAULT_CACHE_NAME, cache)
    }

    /// Register a cache.
    pub fn with(mut self, name: impl Into<String>, cache: CacheT) -> Self {
        self.insert(name, cache);
        self
    }

    /// Register a cache.
    pub fn insert(&mut self, name: impl Into<String>, cache: CacheT) {
        self.caches.insert(name.into(), cache);
    }

    /// Get a cache.
    pub fn get(&self, name: &str) -> Option<&CacheT> {
        self.caches.get(name)
    }

    /// Registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }
}

impl<CacheT> Default for Caches<CacheT>
where
    CacheT: Cache,
{
    fn default() -> Self {
        Self::new()
    }
}
