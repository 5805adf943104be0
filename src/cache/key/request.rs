use super::{super::error::*, strategy::*};

use {
    async_trait::*,
    http::{header::*, *},
    serde_json::{Map, Value},
    std::result::Result,
};

//
// QueryParams
//

/// Decoded query parameters, in request order.
#[derive(Clone, Debug, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Decode from a URI.
    pub fn from_uri(uri: &Uri) -> Self {
        Self(
            uri.query()
                .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        )
    }

    /// All values of a parameter.
    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Last value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn validate_fields<FieldT>(
    fields: impl IntoIterator<Item = FieldT>,
) -> Result<Vec<String>, ConfigurationError>
where
    FieldT: Into<String>,
{
    fields
        .into_iter()
        .map(|field| {
            let field = field.into();
            if field.is_empty() {
                Err(ConfigurationError::invalid_argument("field must be a non-empty string"))
            } else {
                Ok(field)
            }
        })
        .collect()
}

fn optional_string(value: Option<&str>) -> Value {
    value.map(|value| Value::String(value.into())).unwrap_or(Value::Null)
}

//
// HeadersKey
//

/// [KeyStrategy] for request headers.
///
/// Facets: `{header: value or null}`.
#[derive(Clone, Debug)]
pub struct HeadersKey {
    fields: Vec<HeaderName>,
}

impl HeadersKey {
    /// Constructor.
    pub fn new<FieldT>(fields: impl IntoIterator<Item = FieldT>) -> Result<Self, ConfigurationError>
    where
        FieldT: Into<String>,
    {
        let fields = validate_fields(fields)?
            .into_iter()
            .map(|field| {
                HeaderName::from_bytes(field.to_lowercase().as_bytes()).map_err(|_| {
                    ConfigurationError::invalid_argument(format!("invalid header name: {}", field))
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { fields })
    }
}

#[async_trait]
impl KeyStrategy for HeadersKey {
    fn name(&self) -> &str {
        "HeadersKey"
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let headers = &context.request.headers;
        let mut facets = Map::new();
        for field in &self.fields {
            let value = headers
                .get(field)
                .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into()))
                .unwrap_or(Value::Null);
            facets.insert(field.as_str().into(), value);
        }
        Ok(Value::Object(facets))
    }
}

//
// PathParamsKey
//

/// [KeyStrategy] for path parameters.
///
/// Facets: `{param: value or null}`.
#[derive(Clone, Debug)]
pub struct PathParamsKey {
    fields: Vec<String>,
}

impl PathParamsKey {
    /// Constructor.
    pub fn new<FieldT>(fields: impl IntoIterator<Item = FieldT>) -> Result<Self, ConfigurationError>
    where
        FieldT: Into<String>,
    {
        Ok(Self {
            fields: validate_fields(fields)?,
        })
    }
}

#[async_trait]
impl KeyStrategy for PathParamsKey {
    fn name(&self) -> &str {
        "PathParamsKey"
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let facets = self
            .fields
            .iter()
            .map(|field| (field.clone(), optional_string(context.path_params.get(field))))
            .collect();
        Ok(Value::Object(facets))
    }
}

//
// QueryParamsKey
//

/// [KeyStrategy] for query parameters.
///
/// Facets: `{param: [values]}`, keeping repeated values in request order.
#[derive(Clone, Debug)]
pub struct QueryParamsKey {
    fields: Vec<String>,
}

impl QueryParamsKey {
    /// Constructor.
    pub fn new<FieldT>(fields: impl IntoIterator<Item = FieldT>) -> Result<Self, ConfigurationError>
    where
        FieldT: Into<String>,
    {
        Ok(Self {
            fields: validate_fields(fields)?,
        })
    }
}

#[async_trait]
impl KeyStrategy for QueryParamsKey {
    fn name(&self) -> &str {
        "QueryParamsKey"
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let query = QueryParams::from_uri(&context.request.uri);
        let facets = self
            .fields
            .iter()
            .map(|field| {
                let values = query.get_all(field).into_iter().map(Value::String).collect();
                (field.clone(), Value::Array(values))
            })
            .collect();
        Ok(Value::Object(facets))
    }
}

//
// UserKey
//

/// [KeyStrategy] for the requesting user.
///
/// Facets: `{"user": id or null}`. See [RequestUser](super::RequestUser).
#[derive(Clone, Copy, Debug, Default)]
pub struct UserKey;

#[async_trait]
impl KeyStrategy for UserKey {
    fn name(&self) -> &str {
        "UserKey"
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let id = context
            .user()
            .and_then(|user| user.id.clone())
            .unwrap_or(Value::Null);

        let mut facets = Map::new();
        facets.insert("user".into(), id);
        Ok(Value::Object(facets))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{super::view::*, *},
        serde_json::json,
    };

    fn parts(uri: &str, headers: &[(&'static str, &'static str)]) -> request::Parts {
        let mut builder = Request::get(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn facets(
        strategy: &dyn KeyStrategy,
        parts: &request::Parts,
        params: &PathParams,
    ) -> Value {
        let context = KeyContext::new("v", "json", parts, params, None);
        strategy.facets(&context).await.unwrap()
    }

    #[test]
    fn query_params_keep_order_and_repeats() {
        let query = QueryParams::from_uri(&"/?b=2&a=1&b=3&c=%20x".parse().unwrap());
        assert_eq!(query.get_all("b"), ["2", "3"]);
        assert_eq!(query.get("b"), Some("3"));
        assert_eq!(query.get("c"), Some(" x"));
        assert_eq!(query.get("d"), None);
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            QueryParamsKey::new([""]),
            Err(ConfigurationError::InvalidArgument(_))
        ));
        assert!(matches!(
            HeadersKey::new(["bad header"]),
            Err(ConfigurationError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn headers_key() {
        let strategy = HeadersKey::new(["Accept-Language", "x-missing"]).unwrap();
        let parts = parts("/", &[("accept-language", "en")]);
        assert_eq!(
            facets(&strategy, &parts, &PathParams::default()).await,
            json!({"accept-language": "en", "x-missing": null})
        );
    }

    #[tokio::test]
    async fn query_params_key() {
        let strategy = QueryParamsKey::new(["page", "tag"]).unwrap();
        let parts = parts("/items?tag=a&page=2&tag=b&other=1", &[]);
        assert_eq!(
            facets(&strategy, &parts, &PathParams::default()).await,
            json!({"page": ["2"], "tag": ["a", "b"]})
        );
    }

    #[tokio::test]
    async fn path_params_key() {
        let strategy = PathParamsKey::new(["id", "slug"]).unwrap();
        let parts = parts("/items/5", &[]);
        let params = [("id", "5")].into_iter().collect();
        assert_eq!(facets(&strategy, &parts, &params).await, json!({"id": "5", "slug": null}));
    }

    #[tokio::test]
    async fn user_key() {
        let mut parts = parts("/", &[]);
        assert_eq!(
            facets(&UserKey, &parts, &PathParams::default()).await,
            json!({"user": null})
        );

        parts.extensions.insert(RequestUser::authenticated(42));
        assert_eq!(
            facets(&UserKey, &parts, &PathParams::default()).await,
            json!({"user": 42})
        );
    }
}
