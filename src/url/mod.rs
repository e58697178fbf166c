//! URL handling for board listings and article links
//!
//! Listing pages live at `/bbs/{board}/index{N}.html`; the board root
//! `/bbs/{board}/index.html` always shows the newest page.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Builds the URL of a board's listing root
///
/// # Examples
///
/// ```
/// use ptt_harvest::url::board_index_url;
///
/// assert_eq!(
///     board_index_url("https://www.ptt.cc", "NBA"),
///     "https://www.ptt.cc/bbs/NBA/index.html"
/// );
/// ```
pub fn board_index_url(base_url: &str, board: &str) -> String {
    format!("{}/bbs/{}/index.html", base_url.trim_end_matches('/'), board)
}

/// Builds the URL of listing page `page` of a board
pub fn board_page_url(base_url: &str, board: &str, page: u32) -> String {
    format!(
        "{}/bbs/{}/index{}.html",
        base_url.trim_end_matches('/'),
        board,
        page
    )
}

/// Resolves an href found on a page to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only links, non-HTTP schemes and
/// anything the base cannot join.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(href).ok()?;

    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

/// Extracts the numeric page index from a listing href like `/bbs/NBA/index6498.html`
pub fn parse_page_index(href: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"index(\d+)\.html").expect("valid page index regex"));

    re.captures(href)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
