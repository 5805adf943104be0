use super::request::*;

use {
    http::request::*,
    kutil::http::{HeaderValues, MediaType, MediaTypeSelector, Selector, Weight},
};

//
// Renderer
//

/// A response format the view can render.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Renderer {
    /// Format name, as used in `?format=`.
    pub format: String,

    /// Media type, as matched against `Accept`.
    pub media_type: MediaType,
}

impl Renderer {
    /// Constructor.
    pub fn new(format: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            format: format.into(),
            media_type,
        }
    }

    /// JSON.
    pub fn json() -> Self {
        Self::new("json", MediaType::new_fostered("application", "json"))
    }

    /// Browsable HTML.
    pub fn api() -> Self {
        Self::new("api", MediaType::new_fostered("text", "html"))
    }

    /// Default renderers: [json](Self::json) then [api](Self::api).
    pub fn defaults() -> Vec<Self> {
        vec![Self::json(), Self::api()]
    }

    /// True if this renderer satisfies the media range.
    ///
    /// Segments compare case-insensitively. Either can be `*`.
    pub fn matches(&self, media_range: &MediaTypeSelector) -> bool {
        fn segment_matches<SegmentT>(selector: &Selector<SegmentT>, segment: &SegmentT) -> bool
        where
            SegmentT: AsRef<str>,
        {
            match selector {
                Selector::Any => true,
                Selector::Specific(selection) => {
                    selection.as_ref().eq_ignore_ascii_case(segment.as_ref())
                }
            }
        }

        segment_matches(&media_range.main, &self.media_type.main)
            && segment_matches(&media_range.subtype, &self.media_type.subtype)
    }
}

/// Select the renderer for a request.
///
/// A `?format=` parameter naming a renderer wins. Otherwise the `Accept` media ranges are
/// tried by descending weight (ties keep header order, `q=0` is ignored). Falls back to the
/// first renderer.
///
/// Returns [None] only if there are no renderers.
pub fn negotiate<'renderers>(
    renderers: &'renderers [Renderer],
    request: &Parts,
) -> Option<&'renderers Renderer> {
    if let Some(format) = QueryParams::from_uri(&request.uri).get("format")
        && let Some(renderer) = renderers.iter().find(|renderer| renderer.format == format)
    {
        return Some(renderer);
    }

    // Sorted by weight
    for preference in request.headers.accept().0 {
        if preference.weight == Weight::new(0) {
            continue;
        }

        let renderer = match &preference.selector {
            Selector::Any => renderers.first(),
            Selector::Specific(media_range) => {
                renderers.iter().find(|renderer| renderer.matches(media_range))
            }
        };

        if renderer.is_some() {
            return renderer;
        }
    }

    renderers.first()
}
