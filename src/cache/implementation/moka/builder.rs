use super::{
    super::super::{key::*, response::*, weight::*},
    expiry::*,
};

/// Moka builder for a view cache.
pub type ViewCacheBuilder = moka::future::CacheBuilder<
    CacheKey,
    CachedResponseRef,
    moka::future::Cache<CacheKey, CachedResponseRef>,
>;

//
// ForViewCache
//

/// Weigh entries by [CacheWeight] and expire them after their [CachedResponse::timeout].
pub trait ForViewCache
where
    Self: Sized,
{
    /// Weigh entries by [CacheWeight] and expire them after their [CachedResponse::timeout].
    ///
    /// Set [max_capacity](moka::future::CacheBuilder::max_capacity) as a limit on the total
    /// weight.
    fn for_view_cache(self) -> Self;
}

impl ForViewCache for ViewCacheBuilder {
    fn for_view_cache(self) -> Self {
        self.weigher(weigh_entry).expire_after(CachedResponseExpiry)
    }
}

/// Weight of a cache entry, saturating at [u32::MAX].
pub fn weigh_entry(cache_key: &CacheKey, cached_response: &CachedResponseRef) -> u32 {
    let weight = cache_key.cache_weight() + cached_response.cache_weight();
    weight.try_into().unwrap_or(u32::MAX)
}
