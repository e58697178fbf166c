//! Newest-page discovery
//!
//! The board root always renders the newest listing page, and its
//! "previous page" link points at the page just before it. The newest
//! index is therefore the previous link's index plus one.

use crate::crawler::fetcher::fetch_page;
use crate::url::{board_index_url, parse_page_index};
use crate::HarvestError;
use reqwest::Client;
use scraper::{Html, Selector};

/// Label of the "previous page" navigation anchor
pub const PREVIOUS_PAGE_LABEL: &str = "‹ 上頁";

/// Finds the newest listing page index of a board
///
/// Every failure is logged and reported as `None`; callers skip the board
/// for this cycle.
pub async fn latest_page(client: &Client, base_url: &str, board: &str) -> Option<u32> {
    let url = board_index_url(base_url, board);

    let html = match fetch_page(client, &url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!("[{}] Error getting latest page: {}", board, e);
            return None;
        }
    };

    match latest_page_from_html(&html) {
        Ok(page) => {
            tracing::info!("[{}] Latest page determined: {}", board, page);
            Some(page)
        }
        Err(e) => {
            tracing::error!("[{}] Could not determine latest page: {}", board, e);
            None
        }
    }
}

/// Computes the newest page index from a board root page
///
/// # Errors
///
/// `ParseAbsence` if the previous-page anchor is missing, its href does not
/// contain `index{N}.html`, or `N + 1` overflows.
pub fn latest_page_from_html(html: &str) -> Result<u32, HarvestError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]")
        .map_err(|e| HarvestError::ParseAbsence(format!("anchor selector: {:?}", e)))?;

    let href = document
        .select(&selector)
        .find(|a| a.text().collect::<String>().trim() == PREVIOUS_PAGE_LABEL)
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| HarvestError::ParseAbsence("previous page link".to_string()))?;

    let previous = parse_page_index(href).ok_or_else(|| {
        HarvestError::ParseAbsence(format!("page index in previous page link '{}'", href))
    })?;

    previous
        .checked_add(1)
        .ok_or_else(|| HarvestError::ParseAbsence(format!("page index overflow in '{}'", href)))
}
