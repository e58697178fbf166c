//! Publication time resolution for article documents
//!
//! Resolution never fails. Candidates are tried in order:
//! 1. the metadata header line labelled `時間`
//! 2. the first date-time shaped substring anywhere in the document text
//! 3. the current local time, truncated to whole seconds

use chrono::{Local, NaiveDateTime, Timelike};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Label of the metadata line that carries the publication time
pub const TIME_LABEL: &str = "時間";

/// Display format after the weekday token, e.g. `Mar 9 21:15:02 2024`
pub const BOARD_TIME_FORMAT: &str = "%b %d %H:%M:%S %Y";

/// Where a resolved timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    Metadata,
    TextScan,
    Fallback,
}

/// A publication timestamp and the strategy that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime {
    pub timestamp: NaiveDateTime,
    pub source: TimeSource,
}

/// Resolves the publication time of a parsed article document
pub fn resolve_time(document: &Html) -> ResolvedTime {
    let candidate = match metadata_time(document) {
        Some(text) => Some((text, TimeSource::Metadata)),
        None => {
            let full_text: String = document.root_element().text().collect();
            scan_time(&full_text).map(|text| (text, TimeSource::TextScan))
        }
    };

    let Some((text, source)) = candidate else {
        tracing::debug!("No publication time found, using current time");
        return fallback();
    };

    match parse_board_time(&text) {
        Some(timestamp) => ResolvedTime { timestamp, source },
        None => {
            tracing::warn!("Time parsing failed: {:?}, using current time", text);
            fallback()
        }
    }
}

/// Parses a time string like `Sat Mar  9 21:15:02 2024`
///
/// Runs of whitespace are collapsed first; the site pads single-digit days
/// with an extra space. The leading weekday is ignored, so a weekday that
/// disagrees with the date does not reject the timestamp.
pub fn parse_board_time(text: &str) -> Option<NaiveDateTime> {
    let mut tokens = text.split_whitespace();
    tokens.next()?;
    let normalized = tokens.collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, BOARD_TIME_FORMAT).ok()
}

/// Finds the value of the first metadata line whose label contains `時間`
fn metadata_time(document: &Html) -> Option<String> {
    let line_selector =
        Selector::parse("div.article-metaline, div.article-metaline-right").ok()?;
    let tag_selector = Selector::parse("span.article-meta-tag").ok()?;
    let value_selector = Selector::parse("span.article-meta-value").ok()?;

    document.select(&line_selector).find_map(|line| {
        let tag = first_text(line, &tag_selector)?;
        let value = first_text(line, &value_selector)?;
        (tag.contains(TIME_LABEL) && !value.is_empty()).then_some(value)
    })
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

/// Finds the first date-time shaped substring in free text
fn scan_time(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"[A-Z][a-z]{2}\s[A-Z][a-z]{2}\s{1,2}\d{1,2}\s\d{2}:\d{2}:\d{2}\s\d{4}")
            .expect("valid time regex")
    });

    re.find(text).map(|m| m.as_str().trim().to_string())
}

fn fallback() -> ResolvedTime {
    let now = Local::now().naive_local();
    ResolvedTime {
        timestamp: now.with_nanosecond(0).unwrap_or(now),
        source: TimeSource::Fallback,
    }
}
