use super::{super::error::*, strategy::*};

use {
    async_trait::*,
    serde_json::{Map, Value},
};

//
// ObjectKey
//

/// [KeyStrategy] for the fields of the view's object.
///
/// Facets: the object's fields, or nothing if there is no object.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectKey;

#[async_trait]
impl KeyStrategy for ObjectKey {
    fn name(&self) -> &str {
        "ObjectKey"
    }

    fn requires_view(&self) -> bool {
        true
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let view = context.require_view(self.name())?;
        let object = view
            .object(context)
            .await
            .map_err(|error| KeyError::view(self.name(), error))?;
        Ok(Value::Object(object.unwrap_or_default()))
    }
}

//
// QuerysetKey
//

/// [KeyStrategy] for the rows of the view's queryset.
///
/// Facets: `{"queryset": [rows]}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuerysetKey;

#[async_trait]
impl KeyStrategy for QuerysetKey {
    fn name(&self) -> &str {
        "QuerysetKey"
    }

    fn requires_view(&self) -> bool {
        true
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let view = context.require_view(self.name())?;
        let rows = view
            .queryset(context)
            .await
            .map_err(|error| KeyError::view(self.name(), error))?;

        let mut facets = Map::new();
        facets.insert("queryset".into(), Value::Array(rows));
        Ok(Value::Object(facets))
    }
}

//
// QuerylistKey
//

/// [KeyStrategy] for the rows of each queryset in the view's querylist.
///
/// Facets: `{"querylist": [[rows], ...]}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuerylistKey;

#[async_trait]
impl KeyStrategy for QuerylistKey {
    fn name(&self) -> &str {
        "QuerylistKey"
    }

    fn requires_view(&self) -> bool {
        true
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let view = context.require_view(self.name())?;
        let querylist = view
            .querylist(context)
            .await
            .map_err(|error| KeyError::view(self.name(), error))?;

        let mut facets = Map::new();
        facets.insert(
            "querylist".into(),
            Value::Array(querylist.into_iter().map(Value::Array).collect()),
        );
        Ok(Value::Object(facets))
    }
}

//
// LookupFieldKey
//

/// [KeyStrategy] for the path parameter named by the view's lookup field.
///
/// Facets: `{"lookup_field": value or null}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LookupFieldKey;

#[async_trait]
impl KeyStrategy for LookupFieldKey {
    fn name(&self) -> &str {
        "LookupFieldKey"
    }

    fn requires_view(&self) -> bool {
        true
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let view = context.require_view(self.name())?;
        let value = context
            .path_params
            .get(view.lookup_field())
            .map(|value| Value::String(value.into()))
            .unwrap_or(Value::Null);

        let mut facets = Map::new();
        facets.insert("lookup_field".into(), value);
        Ok(Value::Object(facets))
    }
}
