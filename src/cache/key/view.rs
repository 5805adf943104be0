use super::{super::error::*, key::*, pagination::*, strategy::*};

use {
    async_trait::*,
    serde_json::Value,
    std::{collections::*, fmt, sync::*},
};

/// Common reference type for [View].
pub type ViewRef = Arc<dyn View>;

//
// View
//

/// The application-side view wrapped by the cache.
///
/// Key strategies such as [ObjectKey](super::ObjectKey) and [QuerysetKey](super::QuerysetKey)
/// consult it *before* the wrapped service is called, so it should load exactly the state the
/// service would render.
///
/// All data methods default to an error, so implement only the ones your strategies need.
#[async_trait]
pub trait View
where
    Self: Send + Sync,
{
    /// Name of the path parameter that identifies the object.
    ///
    /// The default is "pk".
    fn lookup_field(&self) -> &str {
        "pk"
    }

    /// Pagination used by the view.
    fn paginator(&self) -> Option<&Paginator> {
        None
    }

    /// Fields of the object the request refers to.
    ///
    /// Return [None] if there is no such object (the view will presumably respond with 404,
    /// which is never cached).
    async fn object(&self, _context: &KeyContext<'_>) -> Result<Option<Facets>, ViewError> {
        Err("view does not provide an object".into())
    }

    /// Rows of the (filtered) queryset.
    async fn queryset(&self, _context: &KeyContext<'_>) -> Result<Vec<Value>, ViewError> {
        Err("view does not provide a queryset".into())
    }

    /// Rows of each (filtered) queryset in a querylist.
    async fn querylist(&self, _context: &KeyContext<'_>) -> Result<Vec<Vec<Value>>, ViewError> {
        Err("view does not provide a querylist".into())
    }
}

impl fmt::Debug for dyn View {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "View(lookup_field={})", self.lookup_field())
    }
}

//
// PathParams
//

/// Path parameters captured by the router.
///
/// Can be inserted into the request extensions by any router. With the `axum` feature they are
/// otherwise read from axum's own path parameters.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    /// Get a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Insert a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<NameT, ValueT> FromIterator<(NameT, ValueT)> for PathParams
where
    NameT: Into<String>,
    ValueT: Into<String>,
{
    fn from_iter<IteratorT>(iterator: IteratorT) -> Self
    where
        IteratorT: IntoIterator<Item = (NameT, ValueT)>,
    {
        Self(
            iterator
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

//
// RequestUser
//

/// Identity of the user making the request.
///
/// Should be inserted into the request extensions by authentication middleware. A missing
/// extension is treated as anonymous.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestUser {
    /// User ID ([None] for anonymous).
    pub id: Option<Value>,
}

impl RequestUser {
    /// Authenticated user.
    pub fn authenticated(id: impl Into<Value>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Anonymous user.
    pub fn anonymous() -> Self {
        Self { id: None }
    }
}
