use super::super::super::{key::*, response::*};

use {duration_str::*, moka::*, std::time::*};

//
// CachedResponseExpiry
//

/// Moka [Expiry] for [CachedResponse].
///
/// Entries without a timeout never expire.
pub struct CachedResponseExpiry;

impl Expiry<CacheKey, CachedResponseRef> for CachedResponseExpiry {
    fn expire_after_create(
        &self,
        _cache_key: &CacheKey,
        cached_response: &CachedResponseRef,
        _created_at: Instant,
    ) -> Option<Duration> {
        if let Some(timeout) = cached_response.timeout {
            tracing::debug!("storing with timeout: {}", timeout.human_format());
        }

        cached_response.timeout
    }

    fn expire_after_update(
        &self,
        _cache_key: &CacheKey,
        cached_response: &CachedResponseRef,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        cached_response.timeout
    }
}
