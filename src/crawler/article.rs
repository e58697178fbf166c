//! Article fetching and decomposition
//!
//! An article page is split into its publication time, its body text with
//! the metadata header lines removed, and its push comments. Every piece is
//! optional on the page; missing pieces become empty values, never errors.

use crate::crawler::fetcher::fetch_page;
use crate::crawler::time::{resolve_time, ResolvedTime};
use crate::storage::NewComment;
use crate::HarvestError;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};

/// Class fragment shared by all metadata header lines
const METALINE_CLASS: &str = "article-metaline";

/// An article page broken into the parts that get stored
#[derive(Debug, Clone)]
pub struct FetchedArticle {
    pub time: ResolvedTime,
    pub content: String,
    pub comments: Vec<NewComment>,
}

/// Fetches an article page and decomposes it
///
/// # Errors
///
/// Returns a `Transport` fault for timeouts, refused connections and non-2xx
/// responses. The caller logs it and moves on; the request is not retried.
pub async fn fetch_article(client: &Client, link: &str) -> Result<FetchedArticle, HarvestError> {
    let body = fetch_page(client, link).await?;
    Ok(parse_article(&body))
}

/// Decomposes article HTML into time, body text and comments
pub fn parse_article(html: &str) -> FetchedArticle {
    let document = Html::parse_document(html);

    FetchedArticle {
        time: resolve_time(&document),
        content: extract_content(&document),
        comments: extract_comments(&document),
    }
}

/// Text of `#main-content` without the metadata header lines
fn extract_content(document: &Html) -> String {
    let Ok(selector) = Selector::parse("#main-content") else {
        return String::new();
    };

    match document.select(&selector).next() {
        Some(main) => {
            let mut text = String::new();
            collect_text(main, &mut text);
            text.trim().to_string()
        }
        None => String::new(),
    }
}

/// Appends the text below `element`, skipping metadata line subtrees
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    if !is_metaline(child_element) {
                        collect_text(child_element, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_metaline(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "div" && value.classes().any(|c| c.contains(METALINE_CLASS))
}

/// Extracts every push comment in page order
fn extract_comments(document: &Html) -> Vec<NewComment> {
    let (Ok(push), Ok(tag), Ok(user_id), Ok(content), Ok(time)) = (
        Selector::parse("div.push"),
        Selector::parse("span.push-tag"),
        Selector::parse("span.push-userid"),
        Selector::parse("span.push-content"),
        Selector::parse("span.push-ipdatetime"),
    ) else {
        return Vec::new();
    };

    document
        .select(&push)
        .map(|block| NewComment {
            tag: field_text(block, &tag),
            user_id: field_text(block, &user_id),
            content: strip_separator(&field_text(block, &content)),
            raw_time: field_text(block, &time),
        })
        .collect()
}

/// Trimmed text of the first match, or an empty string
fn field_text(block: ElementRef<'_>, selector: &Selector) -> String {
    block
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Removes the leading colon the site puts before comment bodies
fn strip_separator(content: &str) -> String {
    content.trim_start_matches(':').trim().to_string()
}
