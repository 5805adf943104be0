use super::weight::*;

use {
    base64::{Engine, engine::general_purpose::STANDARD as BASE64},
    bytes::*,
    http::{header::*, response::*, *},
    kutil::http::{HeaderValues, MediaType},
    serde::*,
    std::{result::Result, sync::*, time::*},
    thiserror::Error,
};

/// Common reference type for [CachedResponse].
pub type CachedResponseRef = Arc<CachedResponse>;

//
// CachedResponse
//

/// Cached HTTP response.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    /// Status.
    pub status: StatusCode,

    /// Version.
    pub version: Version,

    /// Headers (as stamped on the miss).
    pub headers: HeaderMap,

    /// Body.
    pub body: Bytes,

    /// Timeout ([None] means never expire).
    pub timeout: Option<Duration>,

    /// When the entry was stored.
    pub stored_at: SystemTime,
}

impl CachedResponse {
    /// Constructor.
    ///
    /// The entry is considered stored now.
    pub fn new(parts: &Parts, body: Bytes, timeout: Option<Duration>) -> Self {
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers.clone(),
            body,
            timeout,
            stored_at: SystemTime::now(),
        }
    }

    /// When the entry expires.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.timeout.and_then(|timeout| self.stored_at.checked_add(timeout))
    }

    /// Media type from `Content-Type`, without parameters.
    pub fn media_type(&self) -> Option<MediaType> {
        let media_type = self.headers.content_type()?;
        Some(match media_type.subtype.as_ref().split_once(';') {
            Some((subtype, _)) => {
                MediaType::new_owned(media_type.main.to_string(), subtype.trim().into())
            }
            None => media_type,
        })
    }

    /// True if the media type is `text/html` (case-insensitive).
    pub fn is_html(&self) -> bool {
        self.media_type().is_some_and(|media_type| {
            media_type.main.as_ref().eq_ignore_ascii_case("text")
                && media_type.subtype.as_ref().eq_ignore_ascii_case("html")
        })
    }

    /// Create a response.
    ///
    /// `Content-Length` is set to the body size.
    pub fn to_response<BodyT>(&self) -> Response<BodyT>
    where
        BodyT: From<Bytes>,
    {
        self.to_response_with(self.headers.clone(), self.body.clone())
    }

    /// Create a response with our status and version but other headers and body.
    ///
    /// `Content-Length` is set to the body size.
    pub fn to_response_with<BodyT>(&self, mut headers: HeaderMap, body: Bytes) -> Response<BodyT>
    where
        BodyT: From<Bytes>,
    {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        let mut response = Response::new(BodyT::from(body));
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = headers;
        response
    }

    /// Serialize to JSON.
    ///
    /// The body is base64-encoded. All header values must be visible ASCII.
    pub fn to_json(&self) -> Result<String, CachedResponseError> {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| -> Result<_, CachedResponseError> {
                Ok((name.as_str().into(), value.to_str()?.into()))
            })
            .collect::<Result<Vec<(String, String)>, _>>()?;

        let serialized = SerializedResponse {
            status: self.status.as_u16(),
            version: version_to_str(self.version).into(),
            headers,
            body: BASE64.encode(&self.body),
            timeout_ms: self.timeout.map(|timeout| timeout.as_millis() as u64),
            stored_at_ms: self
                .stored_at
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        };

        Ok(serde_json::to_string(&serialized)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, CachedResponseError> {
        let serialized: SerializedResponse = serde_json::from_str(json)?;

        let mut headers = HeaderMap::with_capacity(serialized.headers.len());
        for (name, value) in serialized.headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }

        Ok(Self {
            status: StatusCode::from_u16(serialized.status)?,
            version: version_from_str(&serialized.version)?,
            headers,
            body: BASE64.decode(serialized.body)?.into(),
            timeout: serialized.timeout_ms.map(Duration::from_millis),
            stored_at: UNIX_EPOCH + Duration::from_millis(serialized.stored_at_ms),
        })
    }
}

impl CacheWeight for CachedResponse {
    fn cache_weight(&self) -> usize {
        const SELF_SIZE: usize = size_of::<CachedResponse>();
        let mut size = SELF_SIZE + self.body.len();
        for (name, value) in &self.headers {
            size += name.as_str().len() + value.len();
        }
        size
    }
}

//
// CachedResponseError
//

/// [CachedResponse] serialization error.
#[derive(Debug, Error)]
pub enum CachedResponseError {
    /// JSON.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64.
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Status.
    #[error("status: {0}")]
    Status(#[from] status::InvalidStatusCode),

    /// Header name.
    #[error("header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    /// Header value.
    #[error("header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    /// Header value is not visible ASCII.
    #[error("header value: {0}")]
    HeaderValueNotText(#[from] ToStrError),

    /// Version.
    #[error("unsupported HTTP version: {0}")]
    Version(String),
}

#[derive(Deserialize, Serialize)]
struct SerializedResponse {
    status: u16,
    version: String,
    headers: Vec<(String, String)>,
    body: String,
    timeout_ms: Option<u64>,
    stored_at_ms: u64,
}

fn version_to_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn version_from_str(version: &str) -> Result<Version, CachedResponseError> {
    match version {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3.0" => Ok(Version::HTTP_3),
        _ => Err(CachedResponseError::Version(version.into())),
    }
}
