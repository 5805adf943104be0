use super::super::{cache::*, key::*, response::*};

//
// DummyCache
//

/// Cache that never stores anything.
///
/// Every request is a miss. Useful for disabling caching without removing layers, and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummyCache;

impl Cache for DummyCache {
    async fn get(&self, _key: &CacheKey) -> Option<CachedResponseRef> {
        None
    }

    async fn set(&self, _key: CacheKey, _cached_response: CachedResponseRef) {}
}
