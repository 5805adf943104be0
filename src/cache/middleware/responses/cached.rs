use super::super::{
    super::{cache::*, headers::*, key::*, markup::*, response::*},
    configuration::*,
};

use {bytes::*, http::*, std::time::*};

//
// ToHitResponse
//

/// To a response for a cache hit.
#[allow(async_fn_in_trait)]
pub trait ToHitResponse {
    /// To a response for a cache hit.
    ///
    /// Probes the cache for freshness, stamps the `HIT` headers, and rewrites HTML debug pages
    /// accordingly.
    async fn to_hit_response<ResponseBodyT, CacheT>(
        &self,
        key: &CacheKey,
        configuration: &MiddlewareCachingConfiguration<CacheT>,
    ) -> Response<ResponseBodyT>
    where
        ResponseBodyT: From<Bytes>,
        CacheT: Cache;
}

impl ToHitResponse for CachedResponseRef {
    async fn to_hit_response<ResponseBodyT, CacheT>(
        &self,
        key: &CacheKey,
        configuration: &MiddlewareCachingConfiguration<CacheT>,
    ) -> Response<ResponseBodyT>
    where
        ResponseBodyT: From<Bytes>,
        CacheT: Cache,
    {
        let probe = configuration.cache.probe(key, self).await;
        let freshness =
            configuration.freshness.derive(&probe, self.timeout, self.stored_at, SystemTime::now());

        let mut headers = self.headers.clone();
        HeaderStamp::hit(key, freshness.age, freshness.expires, self.timeout)
            .apply(&mut headers, &configuration.headers);

        let body = if configuration.rewrite_debug_markup && self.is_html() {
            match rewrite_debug_markup(&self.body, &headers, &configuration.headers) {
                Some(body) => {
                    tracing::debug!("rewrote debug markup");
                    body
                }

                None => self.body.clone(),
            }
        } else {
            self.body.clone()
        };

        self.to_response_with(headers, body)
    }
}
