use super::headers::*;

use {serde_json::Value, std::error, thiserror::Error};

/// Error returned by a [View](super::key::View) collaborator.
pub type ViewError = Box<dyn error::Error + Send + Sync>;

//
// ConfigurationError
//

/// Configuration error.
///
/// Always raised while building a [CacheViewLayer](crate::CacheViewLayer), never while
/// handling a request.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Settings are missing.
    #[error("view cache settings are missing")]
    MissingSettings,

    /// Settings are invalid.
    #[error("view cache settings are invalid: {0}")]
    InvalidSettings(String),

    /// Cache is not registered.
    #[error("cache `{0}` is not configured")]
    CacheNotFound(String),

    /// Header cannot be derived for the cache.
    #[error("cache `{cache}` does not support the `{header}` header")]
    HeaderNotSupported {
        /// Cache name.
        cache: String,

        /// Header.
        header: CacheHeader,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ConfigurationError {
    /// Invalid settings.
    pub fn invalid_settings(reason: impl ToString) -> Self {
        Self::InvalidSettings(reason.to_string())
    }

    /// Invalid argument.
    pub fn invalid_argument(reason: impl ToString) -> Self {
        Self::InvalidArgument(reason.to_string())
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        match error {
            config::ConfigError::NotFound(_) => Self::MissingSettings,
            error => Self::invalid_settings(error),
        }
    }
}

//
// KeyError
//

/// Cache key error.
///
/// Raised while composing the cache key for a request.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Facets are not a map, or in strict mode contain non-string values.
    #[error("invalid data from `{strategy}`: {data}")]
    InvalidData {
        /// Strategy name.
        strategy: String,

        /// Offending data.
        data: Value,
    },

    /// Pagination style is not supported.
    #[error("unsupported paginator: {0}")]
    UnsupportedPaginator(String),

    /// Strategy needs a view but none was provided.
    #[error("`{0}` requires a view")]
    ViewRequired(String),

    /// View failed.
    #[error("view failed in `{strategy}`: {source}")]
    View {
        /// Strategy name.
        strategy: String,

        /// Source.
        #[source]
        source: ViewError,
    },

    /// Fingerprint could not be serialized.
    #[error("could not serialize fingerprint: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KeyError {
    /// View failed.
    pub fn view(strategy: impl ToString, source: ViewError) -> Self {
        Self::View {
            strategy: strategy.to_string(),
            source,
        }
    }
}
