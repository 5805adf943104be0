use super::super::super::{cache::*, key::*, response::*};

use std::{ops::*, sync::*};

//
// MokaCacheImplementation
//

/// Moka cache implementation.
///
/// Entries expire after their [CachedResponse::timeout] (see
/// [CachedResponseExpiry](super::CachedResponseExpiry)). We know when each entry expires, so
/// the capability is [CacheCapability::Expiry].
pub type MokaCacheImplementation = Arc<moka::future::Cache<CacheKey, CachedResponseRef>>;

impl Cache for MokaCacheImplementation {
    async fn get(&self, key: &CacheKey) -> Option<CachedResponseRef> {
        self.deref().get(key).await
    }

    async fn set(&self, key: CacheKey, cached_response: CachedResponseRef) {
        self.deref().insert(key, cached_response).await
    }

    fn capability(&self) -> CacheCapability {
        CacheCapability::Expiry
    }

    async fn probe(&self, _key: &CacheKey, cached_response: &CachedResponse) -> CacheProbe {
        match cached_response.expires_at() {
            Some(expires_at) => CacheProbe::ExpiresAt(expires_at),
            None => CacheProbe::Absent,
        }
    }
}
