use super::{super::error::*, format::*, key::*, strategy::*, view::*};

use {http::request::*, serde_json::Value};

//
// KeyComposer
//

/// Composes a [CacheKey] from the facets of a list of [KeyStrategy].
#[derive(Clone, Debug, Default)]
pub struct KeyComposer {
    /// Strategies, in order.
    pub keys: Vec<KeyStrategyRef>,

    /// View.
    pub view: Option<ViewRef>,

    /// Renderers available for format negotiation.
    pub renderers: Vec<Renderer>,

    /// Whether facet values must be strings, nulls, or arrays of strings.
    pub strict_facets: bool,
}

impl KeyComposer {
    /// Constructor.
    pub fn new(
        keys: Vec<KeyStrategyRef>,
        view: Option<ViewRef>,
        renderers: Vec<Renderer>,
        strict_facets: bool,
    ) -> Self {
        Self {
            keys,
            view,
            renderers,
            strict_facets,
        }
    }

    /// Names of strategies that require a view when there is none.
    pub fn missing_view(&self) -> Vec<String> {
        if self.view.is_some() {
            return Default::default();
        }

        self.keys
            .iter()
            .filter(|key| key.requires_view())
            .map(|key| key.name().into())
            .collect()
    }

    /// Build the [Fingerprint] for a request.
    pub async fn fingerprint(
        &self,
        view_id: &str,
        request: &Parts,
        path_params: &PathParams,
    ) -> Result<Fingerprint, KeyError> {
        let format = negotiate(&self.renderers, request)
            .map(|renderer| renderer.format.as_str())
            .unwrap_or_default();

        let context = KeyContext::new(view_id, format, request, path_params, self.view.as_deref());

        let mut fingerprint = Fingerprint::new(view_id, format);
        for key in &self.keys {
            let facets = key.facets(&context).await?;
            let facets = self.validate(key.name(), facets)?;
            fingerprint.merge(key.name(), facets);
        }

        Ok(fingerprint)
    }

    /// Compose the [CacheKey] for a request.
    pub async fn compose(
        &self,
        view_id: &str,
        request: &Parts,
        path_params: &PathParams,
    ) -> Result<CacheKey, KeyError> {
        self.fingerprint(view_id, request, path_params).await?.digest()
    }

    fn validate(&self, strategy: &str, facets: Value) -> Result<Facets, KeyError> {
        let invalid = |data| KeyError::InvalidData {
            strategy: strategy.into(),
            data,
        };

        let facets = match facets {
            Value::Object(facets) => facets,
            data => return Err(invalid(data)),
        };

        if self.strict_facets
            && let Some((_, value)) = facets.iter().find(|(_, value)| !is_strict_value(value))
        {
            return Err(invalid(value.clone()));
        }

        Ok(facets)
    }
}

fn is_strict_value(value: &Value) -> bool {
    match value {
        Value::String(_) | Value::Null => true,
        Value::Array(values) => values.iter().all(Value::is_string),
        _ => false,
    }
}
