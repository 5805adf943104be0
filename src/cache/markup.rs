use super::headers::*;

use {
    bytes::*,
    http::header::*,
    regex::{Captures, Regex, escape},
    std::{borrow::*, sync::*},
};

// Header lines as rendered by browsable API pages:
//
//   <b>X-Cache:</b> <span class="lit">MISS</span>
static HEADER_MARKUP: LazyLock<Vec<(CacheHeader, Regex)>> = LazyLock::new(|| {
    CacheHeader::ALL
        .iter()
        .map(|header| {
            let pattern = format!(
                r#"(<b>(?i:{}):</b> <span class="lit">).*?(</span>)"#,
                escape(header.display_name())
            );
            (*header, Regex::new(&pattern).expect("header markup regex"))
        })
        .collect()
});

/// Rewrite the header values shown in an HTML debug page.
///
/// For each allowed header present in `headers`, the first line showing that header in the
/// body gets the current value. This keeps pages served from the cache consistent with their
/// actual headers.
///
/// Returns [None] if the body is not UTF-8 or nothing was rewritten.
pub fn rewrite_debug_markup(
    body: &[u8],
    headers: &HeaderMap,
    allowed: &CacheHeaders,
) -> Option<Bytes> {
    let mut content = Cow::Borrowed(str::from_utf8(body).ok()?);
    let mut rewritten = false;

    for (header, regex) in HEADER_MARKUP.iter() {
        if !allowed.contains(header) {
            continue;
        }

        let Some(value) = headers
            .get(header.header_name())
            .and_then(|value| value.to_str().ok())
        else {
            continue;
        };

        let value = escape_html(value);
        let replaced = regex.replacen(&content, 1, |captures: &Captures| {
            format!("{}{}{}", &captures[1], value, &captures[2])
        });

        if let Cow::Owned(replaced) = replaced {
            content = Cow::Owned(replaced);
            rewritten = true;
        }
    }

    rewritten.then(|| Bytes::from(content.into_owned()))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
