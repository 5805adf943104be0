use super::super::{freshness::*, headers::*, key::*};

use std::{panic::Location, sync::*, time::*};

//
// MiddlewareCachingConfiguration
//

/// Middleware caching configuration.
///
/// Resolved and validated once by [CacheView](crate::CacheView), then shared by all clones of
/// the service.
#[derive(Clone, Debug)]
pub struct MiddlewareCachingConfiguration<CacheT> {
    /// Cache.
    pub cache: CacheT,

    /// Cache name (for logging).
    pub cache_name: String,

    /// View identifier.
    ///
    /// [None] means the wrapped service's type name plus [call_site](Self::call_site).
    pub view_id: Option<String>,

    /// Timeout ([None] means never expire).
    pub timeout: Option<Duration>,

    /// Headers the cache may write.
    pub headers: CacheHeaders,

    /// Key composer.
    pub composer: Arc<KeyComposer>,

    /// Freshness deriver.
    pub freshness: FreshnessDeriverRef,

    /// Whether to rewrite header values in HTML debug pages on hits.
    pub rewrite_debug_markup: bool,

    /// Where the [CacheView](crate::CacheView) was created.
    pub call_site: &'static Location<'static>,
}
