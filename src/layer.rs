use super::{
    cache::{middleware::*, *},
    service::*,
};

use {
    duration_str::*,
    std::{any::*, panic::Location, sync::*, time::*},
    tower::*,
};

//
// Timeout
//

/// Cache timeout of a [CacheView].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Timeout {
    /// Use the default in [Settings].
    ///
    /// It is an error if the settings have no default.
    #[default]
    Inherit,

    /// Expire after a duration (at least 1 second).
    After(Duration),

    /// Never expire.
    Never,
}

impl Timeout {
    /// Expire after seconds.
    pub fn seconds(seconds: u64) -> Self {
        Self::After(Duration::from_secs(seconds))
    }

    /// Resolve against settings.
    pub fn resolve(&self, settings: &Settings) -> Result<Option<Duration>, ConfigurationError> {
        match self {
            Self::Inherit => match settings.default_timeout() {
                Some(timeout) => Ok(Some(timeout)),
                None => Err(ConfigurationError::invalid_argument(
                    "timeout must be either defined in the settings or given explicitly",
                )),
            },

            Self::After(timeout) => {
                if timeout.as_secs() < 1 {
                    Err(ConfigurationError::invalid_argument("timeout must be >= 1 second"))
                } else {
                    Ok(Some(*timeout))
                }
            }

            Self::Never => Ok(None),
        }
    }
}

//
// CacheView
//

/// Per-view HTTP response caching.
///
/// A builder for [CacheViewLayer]. Configure it with the key strategies that identify a
/// response, then build the layer with [layer](Self::layer), which validates everything against
/// the [Settings] and the registered [Caches]. All configuration errors happen there, never while
/// handling requests.
///
/// The layer is meant to wrap a single view, e.g. a single axum route via
/// [MethodRouter::layer](https://docs.rs/axum/latest/axum/routing/method_routing/struct.MethodRouter.html#method.layer).
/// A layer reused for several views outside a router needs an explicit [view_id](Self::view_id).
///
/// Requirements
/// ============
///
/// The response body type must implement [From]\<[Bytes](bytes::Bytes)\>. (This is the case
/// with [axum](https://github.com/tokio-rs/axum).)
///
/// Request handling
/// ================
///
/// 1. Non-`GET` requests are passed through untouched.
///
/// 2. The cache key is composed from the view ID, the negotiated format, and the facets of
///    every key strategy, in order. Strategies with the same name accumulate into the same
///    bucket. If composition fails the response is a 500 with a [CacheKeyFailure] extension.
///
/// 3. On a hit, the cache is probed for the entry's freshness and the response is returned with
///    fresh `Age`, `Expires`, and `X-Cache: HIT` headers. HTML debug pages have their header
///    lines rewritten to match.
///
/// 4. On a miss, the wrapped service is called. Error responses (status >= 400) are returned as
///    is. Otherwise the response is stamped with `Age: 0`, `Cache-Control`, `ETag`, and
///    `X-Cache: MISS`, then stored with the timeout.
///
/// Headers the view sets itself (`Cache-Control`, `ETag`, and `X-Cache` other than `MISS`) are
/// never overwritten.
///
/// Concurrent misses for the same key each call the wrapped service.
#[derive(Clone, Debug)]
pub struct CacheView {
    view_id: Option<String>,
    timeout: Timeout,
    keys: Vec<KeyStrategyRef>,
    view: Option<ViewRef>,
    renderers: Vec<Renderer>,
    strict_facets: bool,
    rewrite_debug_markup: bool,
    call_site: &'static Location<'static>,
}

impl CacheView {
    /// Constructor.
    #[track_caller]
    pub fn new() -> Self {
        Self::default()
    }

    /// View ID.
    ///
    /// The default is the type name of the wrapped service, the source location where this
    /// builder was created, and the route matched by the router (with the `axum` feature). It is
    /// thus stable across processes sharing a remote cache as long as they run the same build.
    pub fn view_id(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    /// Timeout.
    ///
    /// The default is [Timeout::Inherit].
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a key strategy.
    pub fn key(mut self, key: impl KeyStrategy + 'static) -> Self {
        self.keys.push(Arc::new(key));
        self
    }

    /// Add key strategies.
    pub fn keys(mut self, keys: impl IntoIterator<Item = KeyStrategyRef>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// View consulted by key strategies.
    pub fn view(mut self, view: impl View + 'static) -> Self {
        self.view = Some(Arc::new(view));
        self
    }

    /// View consulted by key strategies.
    pub fn view_ref(mut self, view: ViewRef) -> Self {
        self.view = Some(view);
        self
    }

    /// Renderers for format negotiation, in order of preference.
    ///
    /// The default is [Renderer::defaults].
    pub fn renderers(mut self, renderers: Vec<Renderer>) -> Self {
        self.renderers = renderers;
        self
    }

    /// Require facet values to be strings, nulls, or arrays of strings.
    ///
    /// The default is false.
    pub fn strict_facets(mut self, strict_facets: bool) -> Self {
        self.strict_facets = strict_facets;
        self
    }

    /// Rewrite header values in HTML debug pages served from the cache.
    ///
    /// The default is true.
    pub fn rewrite_debug_markup(mut self, rewrite_debug_markup: bool) -> Self {
        self.rewrite_debug_markup = rewrite_debug_markup;
        self
    }

    /// Build the layer.
    ///
    /// Validates, in order: the settings, that the cache exists, that the cache supports the
    /// allowed headers, the timeout, that key strategies needing a view have one, and that there
    /// are renderers.
    pub fn layer<CacheT>(
        &self,
        settings: &Settings,
        caches: &Caches<CacheT>,
    ) -> Result<CacheViewLayer<CacheT>, ConfigurationError>
    where
        CacheT: Cache,
    {
        settings.validate()?;

        let cache = caches
            .get(&settings.cache)
            .ok_or_else(|| ConfigurationError::CacheNotFound(settings.cache.clone()))?
            .clone();

        let freshness = freshness_deriver(cache.capability());
        let headers = match &settings.headers {
            Some(_) => {
                let headers = settings.allowed_headers()?;
                if let Some(header) = headers.iter().find(|header| !freshness.supports(**header)) {
                    return Err(ConfigurationError::HeaderNotSupported {
                        cache: settings.cache.clone(),
                        header: *header,
                    });
                }
                headers
            }

            // All that the cache supports
            None => CacheHeader::ALL
                .iter()
                .copied()
                .filter(|header| freshness.supports(*header))
                .collect(),
        };

        let timeout = self.timeout.resolve(settings)?;

        let composer = KeyComposer::new(
            self.keys.clone(),
            self.view.clone(),
            self.renderers.clone(),
            self.strict_facets,
        );

        let missing_view = composer.missing_view();
        if !missing_view.is_empty() {
            return Err(ConfigurationError::invalid_argument(format!(
                "key strategies require a view: {}",
                missing_view.join(", ")
            )));
        }

        if composer.renderers.is_empty() {
            return Err(ConfigurationError::invalid_argument("renderers must not be empty"));
        }

        match timeout {
            Some(timeout) => tracing::debug!(
                "cache view: cache={} timeout={}",
                settings.cache,
                timeout.human_format()
            ),
            None => tracing::debug!("cache view: cache={} timeout=never", settings.cache),
        }

        Ok(CacheViewLayer {
            caching: MiddlewareCachingConfiguration {
                cache,
                cache_name: settings.cache.clone(),
                view_id: self.view_id.clone(),
                timeout,
                headers,
                composer: Arc::new(composer),
                freshness,
                rewrite_debug_markup: self.rewrite_debug_markup,
                call_site: self.call_site,
            },
        })
    }
}

impl Default for CacheView {
    #[track_caller]
    fn default() -> Self {
        Self {
            view_id: None,
            timeout: Timeout::default(),
            keys: Vec::new(),
            view: None,
            renderers: Renderer::defaults(),
            strict_facets: false,
            rewrite_debug_markup: true,
            call_site: Location::caller(),
        }
    }
}

//
// CacheViewLayer
//

/// Per-view HTTP response caching layer.
///
/// This layer installs a [CacheViewService]. Build it with [CacheView].
#[derive(Clone, Debug)]
pub struct CacheViewLayer<CacheT>
where
    CacheT: Cache,
{
    caching: MiddlewareCachingConfiguration<CacheT>,
}

impl<CacheT> CacheViewLayer<CacheT>
where
    CacheT: Cache,
{
    /// Configuration.
    pub fn configuration(&self) -> &MiddlewareCachingConfiguration<CacheT> {
        &self.caching
    }
}

impl<InnerServiceT, CacheT> Layer<InnerServiceT> for CacheViewLayer<CacheT>
where
    CacheT: Cache,
{
    type Service = CacheViewService<InnerServiceT, CacheT>;

    fn layer(&self, inner_service: InnerServiceT) -> Self::Service {
        let view_id = match &self.caching.view_id {
            Some(view_id) => view_id.clone(),
            None => format!("{}@{}", type_name::<InnerServiceT>(), self.caching.call_site),
        };

        CacheViewService::new(inner_service, self.caching.clone(), view_id)
    }
}
