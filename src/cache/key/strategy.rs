use super::{super::error::*, view::*};

use {
    async_trait::*,
    http::request::*,
    serde_json::Value,
    std::{fmt, sync::*},
};

/// Common reference type for [KeyStrategy].
pub type KeyStrategyRef = Arc<dyn KeyStrategy>;

//
// KeyStrategy
//

/// Cache key strategy.
///
/// Extracts named facets from a request. The facets of all strategies are combined into the
/// request's [Fingerprint](super::Fingerprint).
#[async_trait]
pub trait KeyStrategy
where
    Self: Send + Sync,
{
    /// Strategy name.
    ///
    /// Strategies with the same name accumulate their facets into the same bucket.
    fn name(&self) -> &str;

    /// Whether this strategy needs a [View].
    fn requires_view(&self) -> bool {
        false
    }

    /// Extract facets.
    ///
    /// Must return a JSON object.
    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError>;
}

impl fmt::Debug for dyn KeyStrategy {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "KeyStrategy({})", self.name())
    }
}

//
// KeyContext
//

/// Context for [KeyStrategy::facets].
pub struct KeyContext<'this> {
    /// View identifier.
    pub view_id: &'this str,

    /// Negotiated response format.
    pub format: &'this str,

    /// Request.
    pub request: &'this Parts,

    /// Path parameters.
    pub path_params: &'this PathParams,

    /// View.
    pub view: Option<&'this dyn View>,
}

impl<'this> KeyContext<'this> {
    /// Constructor.
    pub fn new(
        view_id: &'this str,
        format: &'this str,
        request: &'this Parts,
        path_params: &'this PathParams,
        view: Option<&'this dyn View>,
    ) -> Self {
        Self {
            view_id,
            format,
            request,
            path_params,
            view,
        }
    }

    /// The view, or [KeyError::ViewRequired].
    pub fn require_view(&self, strategy: &str) -> Result<&'this dyn View, KeyError> {
        self.view.ok_or_else(|| KeyError::ViewRequired(strategy.into()))
    }

    /// The requesting user.
    pub fn user(&self) -> Option<&'this RequestUser> {
        self.request.extensions.get::<RequestUser>()
    }
}

/// Function for [FnKey].
pub type FnKeyFunction = Box<dyn Fn(&KeyContext<'_>) -> Value + Send + Sync>;

//
// FnKey
//

/// [KeyStrategy] backed by a function.
///
/// For application-specific facets that don't warrant their own type.
pub struct FnKey {
    name: String,
    function: FnKeyFunction,
}

impl FnKey {
    /// Constructor.
    pub fn new(
        name: impl Into<String>,
        function: impl Fn(&KeyContext<'_>) -> Value + 'static + Send + Sync,
    ) -> Self {
        Self {
            name: name.into(),
            function: Box::new(function),
        }
    }
}

#[async_trait]
impl KeyStrategy for FnKey {
    fn name(&self) -> &str {
        &self.name
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        Ok((self.function)(context))
    }
}
