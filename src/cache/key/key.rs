use super::super::error::*;

use {
    http::header::*,
    serde::*,
    serde_json::{Map, Value},
    sha2::{Digest, Sha256},
    std::{collections::*, fmt},
};

/// Facets extracted by a single [KeyStrategy](super::KeyStrategy).
pub type Facets = Map<String, Value>;

//
// CacheKey
//

/// Cache key.
///
/// The hex-encoded SHA-256 digest of a [Fingerprint]. Also used as the `ETag`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CacheKey(String);

impl CacheKey {
    /// Constructor.
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// As string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// As a (strong) `ETag` header value.
    pub fn etag(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!("\"{}\"", self.0))
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

//
// Fingerprint
//

/// Everything that identifies a cached response.
///
/// Facets are accumulated per strategy name, so that several strategies sharing a name (e.g.
/// two [QueryParamsKey](super::QueryParamsKey) instances) merge into one map rather than
/// replacing each other.
///
/// Fields are declared in sorted order and all maps are sorted, so that the serialized form
/// is stable.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Fingerprint {
    /// Negotiated response format.
    pub format: String,

    /// Facets by strategy name.
    pub keys: BTreeMap<String, BTreeMap<String, Value>>,

    /// View identifier.
    pub view_id: String,
}

impl Fingerprint {
    /// Constructor.
    pub fn new(view_id: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            keys: Default::default(),
            view_id: view_id.into(),
        }
    }

    /// Merge facets into the bucket for a strategy.
    pub fn merge(&mut self, strategy: &str, facets: Facets) {
        let bucket = self.keys.entry(strategy.into()).or_default();
        for (name, value) in facets {
            bucket.insert(name, value);
        }
    }

    /// Stable JSON representation.
    pub fn to_json(&self) -> Result<String, KeyError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Digest.
    pub fn digest(&self) -> Result<CacheKey, KeyError> {
        let json = self.to_json()?;
        Ok(CacheKey(hex::encode(Sha256::digest(json.as_bytes()))))
    }
}
