use super::super::headers::*;

use {
    ::axum::{
        http::header::*,
        response::{IntoResponse, Response},
    },
    std::time::*,
};

//
// ViewCacheHeaders
//

/// Set headers that the view cache will respect.
///
/// The cache never overwrites a `Cache-Control` or an `X-Cache` (other than `MISS`) that the
/// view has already set.
pub trait ViewCacheHeaders
where
    Self: Sized,
{
    /// Set `X-Cache`.
    fn with_x_cache(self, value: &'static str) -> Response;

    /// Set `Cache-Control` to `max-age`.
    fn with_max_age(self, max_age: Duration) -> Response;
}

impl<IntoResponseT> ViewCacheHeaders for IntoResponseT
where
    IntoResponseT: IntoResponse,
{
    fn with_x_cache(self, value: &'static str) -> Response {
        let mut response = self.into_response();
        response.headers_mut().insert(X_CACHE, HeaderValue::from_static(value));
        response
    }

    fn with_max_age(self, max_age: Duration) -> Response {
        let mut response = self.into_response();
        let value = HeaderValue::from_str(&format!("max-age={}", max_age.as_secs()))
            .expect("max-age in HTTP header");
        response.headers_mut().insert(CACHE_CONTROL, value);
        response
    }
}
