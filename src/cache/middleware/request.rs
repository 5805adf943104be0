use super::super::key::*;

use http::{request::*, *};

//
// CacheableRequest
//

/// Cacheable request.
#[allow(async_fn_in_trait)]
pub trait CacheableRequest {
    /// Only `GET` requests are cached.
    fn is_cacheable_method(&self) -> bool;

    /// Path parameters.
    ///
    /// A [PathParams] extension takes precedence. Otherwise, with the `axum` feature, the
    /// parameters captured by the axum router are used.
    async fn path_params(&mut self) -> PathParams;

    /// Route matched by the router, if known.
    fn route(&self) -> Option<&str>;
}

impl CacheableRequest for Parts {
    fn is_cacheable_method(&self) -> bool {
        self.method == Method::GET
    }

    async fn path_params(&mut self) -> PathParams {
        if let Some(path_params) = self.extensions.get::<PathParams>() {
            return path_params.clone();
        }

        #[cfg(feature = "axum")]
        if let Some(path_params) = super::super::axum::axum_path_params(self).await {
            return path_params;
        }

        PathParams::default()
    }

    fn route(&self) -> Option<&str> {
        #[cfg(feature = "axum")]
        return super::super::axum::axum_matched_route(self);

        #[cfg(not(feature = "axum"))]
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(method: Method) -> Parts {
        Request::builder().method(method).uri("/items/1").body(()).unwrap().into_parts().0
    }

    #[test]
    fn only_get_is_cacheable() {
        assert!(parts(Method::GET).is_cacheable_method());
        assert!(!parts(Method::HEAD).is_cacheable_method());
        assert!(!parts(Method::POST).is_cacheable_method());
    }

    #[tokio::test]
    async fn path_params_extension() {
        let mut parts = parts(Method::GET);
        assert!(parts.path_params().await.is_empty());

        parts.extensions.insert([("id", "1")].into_iter().collect::<PathParams>());
        assert_eq!(parts.path_params().await.get("id"), Some("1"));
    }
}
