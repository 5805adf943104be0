use super::super::super::error::*;

use {
    bytes::*,
    http::*,
    std::{ops::*, sync::*},
};

//
// CacheKeyFailure
//

/// Response extension attached when the cache key could not be composed.
///
/// The response status is [StatusCode::INTERNAL_SERVER_ERROR].
#[derive(Clone, Debug)]
pub struct CacheKeyFailure(pub Arc<KeyError>);

impl Deref for CacheKeyFailure {
    type Target = KeyError;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Response for a [KeyError].
pub fn key_failure_response<ResponseBodyT>(error: KeyError) -> Response<ResponseBodyT>
where
    ResponseBodyT: From<Bytes>,
{
    let mut response = Response::new(ResponseBodyT::from(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.extensions_mut().insert(CacheKeyFailure(Arc::new(error)));
    response
}
