use super::{key::*, response::*};

use std::time::*;

//
// CacheCapability
//

/// What a [Cache] can tell us about the freshness of its entries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CacheCapability {
    /// Can be asked for the remaining time-to-live of an entry.
    Ttl,

    /// Keeps the absolute expiry of each entry.
    Expiry,

    /// Cannot tell.
    #[default]
    None,
}

//
// CacheProbe
//

/// Answer of [Cache::probe].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheProbe {
    /// Remaining time-to-live.
    Ttl(Duration),

    /// Absolute expiry.
    ExpiresAt(SystemTime),

    /// No answer (entry gone, never expires, or not supported).
    Absent,
}

//
// Cache
//

/// Cache.
///
/// Implementations should ensure that cloning is cheap and clones always refer to the same shared
/// state.
///
/// Caching is best effort: implementations should log their failures and behave as if the entry
/// were missing (for [get](Self::get)) or as if it were stored (for [set](Self::set)).
#[allow(async_fn_in_trait)]
pub trait Cache
where
    Self: 'static + Clone + Send + Sync,
{
    /// Get an entry from the cache.
    ///
    /// Note that this is an `async` function written in longer form in order to include the `Send`
    /// constraint. Implementations can simply use `async fn get`.
    fn get(&self, key: &CacheKey) -> impl Future<Output = Option<CachedResponseRef>> + Send;

    /// Put an entry in the cache.
    ///
    /// The cache should expire the entry after its [CachedResponse::timeout], if it has one.
    ///
    /// Note that this is an `async` function written in longer form in order to include the `Send`
    /// constraint. Implementations can simply use `async fn set`.
    fn set(
        &self,
        key: CacheKey,
        cached_response: CachedResponseRef,
    ) -> impl Future<Output = ()> + Send;

    /// Freshness capability.
    ///
    /// The default is [CacheCapability::None].
    fn capability(&self) -> CacheCapability {
        CacheCapability::None
    }

    /// Probe the freshness of an entry that was just returned by [get](Self::get).
    ///
    /// The default is [CacheProbe::Absent].
    fn probe(
        &self,
        _key: &CacheKey,
        _cached_response: &CachedResponse,
    ) -> impl Future<Output = CacheProbe> + Send {
        async { CacheProbe::Absent }
    }
}
