use super::{caches::*, error::*, headers::*};

use {
    config::{Config, Environment, File},
    serde::*,
    std::{path::*, time::*},
};

/// Prefix for environment variables.
pub const ENVIRONMENT_PREFIX: &str = "VIEW_CACHE";

//
// Settings
//

/// View cache settings.
///
/// Shared by all [CacheView](crate::CacheView) layers of an application.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Name of the cache in [Caches].
    ///
    /// The default is "default".
    #[serde(default = "Settings::default_cache")]
    pub cache: String,

    /// Default timeout in seconds.
    ///
    /// Layers that inherit their timeout require it.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Headers the cache may write.
    ///
    /// [None] means all of them.
    #[serde(default)]
    pub headers: Option<Vec<String>>,
}

impl Settings {
    /// Read from a section of a [Config].
    pub fn from_config(config: &Config, section: &str) -> Result<Self, ConfigurationError> {
        let settings: Self = config.get(section)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from an optional file and `VIEW_CACHE_*` environment variables.
    ///
    /// Environment variables override the file. `VIEW_CACHE_HEADERS` is a comma-separated list.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        Self::load_with(path, Self::environment())
    }

    /// Environment source used by [load](Self::load).
    pub fn environment() -> Environment {
        Environment::with_prefix(ENVIRONMENT_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("headers")
    }

    /// Load from an optional file and an environment source.
    pub fn load_with(
        path: Option<&Path>,
        environment: Environment,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder.add_source(environment).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cache.is_empty() {
            return Err(ConfigurationError::invalid_settings("cache name must not be empty"));
        }

        if let Some(timeout) = self.timeout
            && timeout < 1
        {
            return Err(ConfigurationError::invalid_settings("timeout must be >= 1"));
        }

        self.allowed_headers()?;
        Ok(())
    }

    /// Default timeout.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Headers the cache may write.
    pub fn allowed_headers(&self) -> Result<CacheHeaders, ConfigurationError> {
        parse_cache_headers(self.headers.as_deref())
    }

    fn default_cache() -> String {
        DEFAULT_CACHE_NAME.into()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache: Self::default_cache(),
            timeout: None,
            headers: None,
        }
    }
}
