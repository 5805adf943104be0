use super::cache::{middleware::*, *};

use {
    bytes::*,
    http::{request::*, response::*},
    http_body::*,
    kutil::std::future::*,
    std::{fmt, mem, result::Result, sync::*, task::*},
    tower::*,
};

//
// CacheViewService
//

/// Per-view HTTP response caching service.
///
/// You will often be using [CacheViewLayer](super::CacheViewLayer) rather than this service
/// directly, thus this service's functionality is documented in [CacheView](super::CacheView).
pub struct CacheViewService<InnerServiceT, CacheT>
where
    CacheT: Cache,
{
    inner_service: InnerServiceT,
    caching: MiddlewareCachingConfiguration<CacheT>,
    view_id: Arc<str>,
}

impl<InnerServiceT, CacheT> CacheViewService<InnerServiceT, CacheT>
where
    CacheT: Cache,
{
    /// Constructor.
    pub fn new(
        inner_service: InnerServiceT,
        caching: MiddlewareCachingConfiguration<CacheT>,
        view_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            inner_service,
            caching,
            view_id: view_id.into(),
        }
    }

    /// View ID.
    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    // Clone while keeping `inner_service`.
    //
    // See: https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
    fn clone_and_keep_inner_service(&mut self) -> Self
    where
        InnerServiceT: Clone,
    {
        let mut clone = self.clone();
        clone.inner_service = mem::replace(&mut self.inner_service, clone.inner_service);
        clone
    }

    // Routers often wrap every handler in the same service type, so without an explicit view ID
    // the matched route is part of it.
    fn view_id_for(&self, parts: &http::request::Parts) -> Arc<str> {
        if self.caching.view_id.is_none()
            && let Some(route) = parts.route()
        {
            return format!("{}@{}", self.view_id, route).into();
        }

        self.view_id.clone()
    }

    // Handle request.
    async fn handle<RequestBodyT, ResponseBodyT>(
        mut self,
        request: Request<RequestBodyT>,
    ) -> Result<Response<ResponseBodyT>, InnerServiceT::Error>
    where
        InnerServiceT: Service<Request<RequestBodyT>, Response = Response<ResponseBodyT>>,
        ResponseBodyT: Body + From<Bytes> + Send,
        ResponseBodyT::Data: Send,
        ResponseBodyT::Error: fmt::Display,
    {
        let (mut parts, body) = request.into_parts();

        if !parts.is_cacheable_method() {
            tracing::debug!("skip (method={})", parts.method);
            return self.inner_service.call(Request::from_parts(parts, body)).await;
        }

        let view_id = self.view_id_for(&parts);
        let path_params = parts.path_params().await;
        let key = match self.caching.composer.compose(&view_id, &parts, &path_params).await {
            Ok(key) => key,
            Err(error) => {
                tracing::error!("could not compose cache key for {}: {}", view_id, error);
                return Ok(key_failure_response(error));
            }
        };

        match self.caching.cache.get(&key).await {
            Some(cached_response) => {
                tracing::debug!("hit");
                Ok(cached_response.to_hit_response(&key, &self.caching).await)
            }

            None => {
                tracing::debug!("miss");
                let upstream_response =
                    self.inner_service.call(Request::from_parts(parts, body)).await?;

                Ok(if upstream_response.should_skip_cache() {
                    upstream_response
                } else {
                    upstream_response.store(key, &self.caching).await
                })
            }
        }
    }
}

impl<InnerServiceT, CacheT> Clone for CacheViewService<InnerServiceT, CacheT>
where
    InnerServiceT: Clone,
    CacheT: Cache,
{
    fn clone(&self) -> Self {
        Self {
            inner_service: self.inner_service.clone(),
            caching: self.caching.clone(),
            view_id: self.view_id.clone(),
        }
    }
}

impl<InnerServiceT, RequestBodyT, ResponseBodyT, ErrorT, CacheT> Service<Request<RequestBodyT>>
    for CacheViewService<InnerServiceT, CacheT>
where
    InnerServiceT: 'static
        + Service<Request<RequestBodyT>, Response = Response<ResponseBodyT>, Error = ErrorT>
        + Clone
        + Send,
    InnerServiceT::Future: Send,
    RequestBodyT: 'static + Send,
    ResponseBodyT: 'static + Body + From<Bytes> + Send,
    ResponseBodyT::Data: Send,
    ResponseBodyT::Error: fmt::Display,
    CacheT: Cache,
{
    type Response = Response<ResponseBodyT>;
    type Error = InnerServiceT::Error;
    type Future = CapturedFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, context: &mut Context) -> Poll<Result<(), Self::Error>> {
        // On a hit we won't call the inner service, but Tower gives us no way to know that here
        self.inner_service.poll_ready(context)
    }

    fn call(&mut self, request: Request<RequestBodyT>) -> Self::Future {
        let cloned_self = self.clone_and_keep_inner_service();
        capture_async! { cloned_self.handle(request).await }
    }
}
