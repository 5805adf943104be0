use super::{super::error::*, request::*, strategy::*};

use {
    async_trait::*,
    serde_json::{Map, Value},
};

//
// Paginator
//

/// Pagination style of a view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Paginator {
    /// `?page=N&page_size=M`.
    PageNumber {
        /// Page query parameter.
        page_query_param: String,

        /// Page size query parameter, if clients may choose the page size.
        page_size_query_param: Option<String>,
    },

    /// `?limit=N&offset=M`.
    LimitOffset {
        /// Limit query parameter.
        limit_query_param: String,

        /// Offset query parameter.
        offset_query_param: String,
    },

    /// `?cursor=C&page_size=M`.
    Cursor {
        /// Cursor query parameter.
        cursor_query_param: String,

        /// Page size query parameter, if clients may choose the page size.
        page_size_query_param: Option<String>,
    },

    /// Any other style (not supported by [PaginationKey]).
    Custom(String),
}

impl Paginator {
    /// Page-number pagination with the conventional parameter names.
    pub fn page_number() -> Self {
        Self::PageNumber {
            page_query_param: "page".into(),
            page_size_query_param: None,
        }
    }

    /// Limit-offset pagination with the conventional parameter names.
    pub fn limit_offset() -> Self {
        Self::LimitOffset {
            limit_query_param: "limit".into(),
            offset_query_param: "offset".into(),
        }
    }

    /// Cursor pagination with the conventional parameter names.
    pub fn cursor() -> Self {
        Self::Cursor {
            cursor_query_param: "cursor".into(),
            page_size_query_param: None,
        }
    }

    /// Extract pagination facets from query parameters.
    pub fn facets(&self, query: &QueryParams) -> Result<Map<String, Value>, KeyError> {
        let get = |name: Option<&String>| {
            name.and_then(|name| query.get(name))
                .map(|value| Value::String(value.into()))
                .unwrap_or(Value::Null)
        };

        let mut facets = Map::new();
        match self {
            Self::PageNumber {
                page_query_param,
                page_size_query_param,
            } => {
                facets.insert("page".into(), get(Some(page_query_param)));
                facets.insert("page_size".into(), get(page_size_query_param.as_ref()));
            }

            Self::LimitOffset {
                limit_query_param,
                offset_query_param,
            } => {
                facets.insert("limit".into(), get(Some(limit_query_param)));
                facets.insert("offset".into(), get(Some(offset_query_param)));
            }

            Self::Cursor {
                cursor_query_param,
                page_size_query_param,
            } => {
                facets.insert("cursor".into(), get(Some(cursor_query_param)));
                facets.insert("page_size".into(), get(page_size_query_param.as_ref()));
            }

            Self::Custom(name) => return Err(KeyError::UnsupportedPaginator(name.clone())),
        }

        Ok(facets)
    }
}

//
// PaginationKey
//

/// [KeyStrategy] for pagination query parameters.
///
/// Uses its own [Paginator] if given one, otherwise the view's.
#[derive(Clone, Debug, Default)]
pub struct PaginationKey {
    paginator: Option<Paginator>,
}

impl PaginationKey {
    /// Use the view's paginator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific paginator.
    pub fn for_paginator(paginator: Paginator) -> Self {
        Self {
            paginator: Some(paginator),
        }
    }
}

#[async_trait]
impl KeyStrategy for PaginationKey {
    fn name(&self) -> &str {
        "PaginationKey"
    }

    fn requires_view(&self) -> bool {
        self.paginator.is_none()
    }

    async fn facets(&self, context: &KeyContext<'_>) -> Result<Value, KeyError> {
        let paginator = match &self.paginator {
            Some(paginator) => paginator,
            None => context
                .require_view(self.name())?
                .paginator()
                .ok_or_else(|| KeyError::UnsupportedPaginator("none".into()))?,
        };

        let query = QueryParams::from_uri(&context.request.uri);
        Ok(Value::Object(paginator.facets(&query)?))
    }
}
