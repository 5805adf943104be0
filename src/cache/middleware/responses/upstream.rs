use super::super::{
    super::{cache::*, headers::*, key::*, response::*},
    configuration::*,
};

use {
    bytes::*,
    http::*,
    http_body::*,
    http_body_util::BodyExt,
    std::{fmt, sync::*},
};

//
// UpstreamResponse
//

/// Response from the wrapped service.
#[allow(async_fn_in_trait)]
pub trait UpstreamResponse<ResponseBodyT>
where
    Self: Sized,
{
    /// Check if we should skip the cache.
    ///
    /// Error responses (status >= 400) are never stored.
    fn should_skip_cache(&self) -> bool;

    /// Stamp the `MISS` headers, store, and rebuild the response.
    ///
    /// If the body cannot be read we return a response with
    /// [StatusCode::INTERNAL_SERVER_ERROR] and store nothing.
    async fn store<CacheT>(
        self,
        key: CacheKey,
        configuration: &MiddlewareCachingConfiguration<CacheT>,
    ) -> Response<ResponseBodyT>
    where
        CacheT: Cache;
}

impl<ResponseBodyT> UpstreamResponse<ResponseBodyT> for Response<ResponseBodyT>
where
    ResponseBodyT: Body + From<Bytes> + Send,
    ResponseBodyT::Data: Send,
    ResponseBodyT::Error: fmt::Display,
{
    fn should_skip_cache(&self) -> bool {
        let status = self.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::debug!("skip (status={})", status.as_u16());
            true
        } else {
            false
        }
    }

    async fn store<CacheT>(
        self,
        key: CacheKey,
        configuration: &MiddlewareCachingConfiguration<CacheT>,
    ) -> Response<ResponseBodyT>
    where
        CacheT: Cache,
    {
        let (mut parts, body) = self.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(error) => {
                tracing::error!("could not read response body: {} {}", key, error);
                let mut response = Response::new(ResponseBodyT::from(Bytes::new()));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                return response;
            }
        };

        HeaderStamp::miss(&key, configuration.timeout)
            .apply(&mut parts.headers, &configuration.headers);

        let cached_response = CachedResponse::new(&parts, body.clone(), configuration.timeout);
        configuration.cache.set(key, Arc::new(cached_response)).await;
        tracing::debug!("store");

        Response::from_parts(parts, ResponseBodyT::from(body))
    }
}
