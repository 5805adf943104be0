use super::super::key::*;

use ::axum::{extract::*, http::request::*};

/// Path parameters captured by the axum router.
///
/// Available only when the layer is applied to a route (e.g. via
/// [MethodRouter::layer](::axum::routing::MethodRouter::layer)), because that's where axum
/// stores them. Returns [None] if there are none.
pub async fn axum_path_params(parts: &mut Parts) -> Option<PathParams> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(raw_path_params) => {
            let path_params: PathParams = raw_path_params.iter().collect();
            (!path_params.is_empty()).then_some(path_params)
        }

        Err(_) => None,
    }
}

/// Route matched by the axum router, e.g. `/articles/{id}`.
pub fn axum_matched_route(parts: &Parts) -> Option<&str> {
    parts.extensions.get::<MatchedPath>().map(MatchedPath::as_str)
}
