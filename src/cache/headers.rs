use super::{error::*, key::*};

use {
    chrono::{DateTime, Utc},
    http::header::*,
    std::{collections::*, fmt, str::*, time::*},
};

/// `X-Cache` header.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// HTTP-date format used for `Expires`.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

//
// CacheHeader
//

/// Response header that can be written by the cache.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CacheHeader {
    /// `Age`.
    Age,

    /// `Cache-Control`.
    CacheControl,

    /// `ETag`.
    ETag,

    /// `Expires`.
    Expires,

    /// `X-Cache`.
    XCache,
}

impl CacheHeader {
    /// All headers.
    pub const ALL: &[Self] = &[
        Self::Age,
        Self::CacheControl,
        Self::ETag,
        Self::Expires,
        Self::XCache,
    ];

    /// Header name.
    pub fn header_name(&self) -> HeaderName {
        match self {
            Self::Age => AGE,
            Self::CacheControl => CACHE_CONTROL,
            Self::ETag => ETAG,
            Self::Expires => EXPIRES,
            Self::XCache => X_CACHE,
        }
    }

    /// Name as displayed in HTML debug pages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::CacheControl => "Cache-Control",
            Self::ETag => "ETag",
            Self::Expires => "Expires",
            Self::XCache => "X-Cache",
        }
    }

    /// Normalized name (lowercase, with underscores).
    pub fn normalized_name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::CacheControl => "cache_control",
            Self::ETag => "etag",
            Self::Expires => "expires",
            Self::XCache => "x_cache",
        }
    }

    /// Normalize a header name: lowercase, with hyphens replaced by underscores.
    pub fn normalize(name: &str) -> String {
        name.trim().to_lowercase().replace('-', "_")
    }
}

impl FromStr for CacheHeader {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = Self::normalize(name);
        Self::ALL
            .iter()
            .find(|header| header.normalized_name() == normalized)
            .copied()
            .ok_or_else(|| {
                ConfigurationError::invalid_settings(format!("unknown header: {}", name))
            })
    }
}

impl fmt::Display for CacheHeader {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.display_name(), formatter)
    }
}

/// Allow-list of headers the cache is permitted to write.
pub type CacheHeaders = BTreeSet<CacheHeader>;

/// Parse an allow-list. [None] means all headers.
pub fn parse_cache_headers<NameT>(
    names: Option<&[NameT]>,
) -> Result<CacheHeaders, ConfigurationError>
where
    NameT: AsRef<str>,
{
    match names {
        Some(names) => names.iter().map(|name| name.as_ref().parse()).collect(),
        None => Ok(CacheHeader::ALL.iter().copied().collect()),
    }
}

//
// XCache
//

/// `X-Cache` header value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum XCache {
    /// Served from the cache.
    Hit,

    /// Freshly computed.
    Miss,
}

impl XCache {
    /// As string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

impl fmt::Display for XCache {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), formatter)
    }
}

//
// HeaderStamp
//

/// Values to stamp onto a response.
#[derive(Clone, Debug)]
pub struct HeaderStamp<'this> {
    /// `X-Cache`.
    pub x_cache: XCache,

    /// Age in seconds.
    pub age: Option<u64>,

    /// Cache key (for `ETag`).
    pub cache_key: &'this CacheKey,

    /// Absolute expiry.
    pub expires: Option<SystemTime>,

    /// Timeout (for `Cache-Control`).
    pub timeout: Option<Duration>,
}

impl<'this> HeaderStamp<'this> {
    /// For a freshly computed response.
    ///
    /// The age is always 0 and `Expires` is not written.
    pub fn miss(cache_key: &'this CacheKey, timeout: Option<Duration>) -> Self {
        Self {
            x_cache: XCache::Miss,
            age: Some(0),
            cache_key,
            expires: None,
            timeout,
        }
    }

    /// For a response served from the cache.
    pub fn hit(
        cache_key: &'this CacheKey,
        age: Option<u64>,
        expires: Option<SystemTime>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            x_cache: XCache::Hit,
            age,
            cache_key,
            expires,
            timeout,
        }
    }

    /// Write the allowed headers.
    ///
    /// Headers already supplied by the view are kept, with one exception: an `X-Cache: MISS`
    /// (stored together with the response on a miss) becomes `HIT` when replayed.
    pub fn apply(&self, headers: &mut HeaderMap, allowed: &CacheHeaders) {
        if allowed.contains(&CacheHeader::Age) {
            match self.age {
                Some(age) => {
                    headers.insert(AGE, HeaderValue::from(age));
                }

                // Never replay the age stored on a miss
                None if self.x_cache == XCache::Hit => {
                    headers.remove(AGE);
                }

                None => {}
            }
        }

        if allowed.contains(&CacheHeader::CacheControl)
            && !headers.contains_key(CACHE_CONTROL)
            && let Some(timeout) = self.timeout
            && let Ok(value) = HeaderValue::from_str(&format!("max-age={}", timeout.as_secs()))
        {
            headers.insert(CACHE_CONTROL, value);
        }

        if allowed.contains(&CacheHeader::ETag)
            && !headers.contains_key(ETAG)
            && let Ok(value) = self.cache_key.etag()
        {
            headers.insert(ETAG, value);
        }

        if self.x_cache == XCache::Hit
            && allowed.contains(&CacheHeader::Expires)
            && let Some(expires) = self.expires
            && let Ok(value) = HeaderValue::from_str(&http_date(expires))
        {
            headers.insert(EXPIRES, value);
        }

        if allowed.contains(&CacheHeader::XCache) {
            let overwrite = match headers.get(X_CACHE) {
                Some(existing) => existing
                    .to_str()
                    .map(|existing| existing.eq_ignore_ascii_case(XCache::Miss.as_str()))
                    .unwrap_or_default(),
                None => true,
            };

            if overwrite {
                headers.insert(X_CACHE, HeaderValue::from_static(self.x_cache.as_str()));
            }
        }
    }
}

/// Format as an HTTP-date.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}
