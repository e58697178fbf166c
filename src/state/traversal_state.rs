/// Traversal state definitions for the crawl-to-persist cycle
///
/// Every traversal mode drives the same cycle; they differ only in how the
/// next page is chosen and when the cycle ends.
use std::fmt;

/// Represents the phase the traversal controller is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalState {
    /// Nothing in flight
    Idle,

    /// Asking the board root for its newest page index
    LocatingPage,

    /// Downloading and parsing a listing page
    FetchingListing,

    /// Downloading and parsing one article
    FetchingArticle,

    /// Writing one article and its comments
    Persisting,

    /// A page is finished; choosing the next unit of work
    Advancing,

    /// Waiting out the page delay or the poll interval
    Sleeping,

    /// The current traversal has ended
    Done,
}

impl TraversalState {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: TraversalState) -> bool {
        use TraversalState::*;

        match (self, next) {
            (Idle, LocatingPage | FetchingListing | Done) => true,
            // a board without a locatable page is skipped
            (LocatingPage, FetchingListing | LocatingPage | Sleeping | Done) => true,
            (FetchingListing, FetchingArticle | Advancing | Done) => true,
            (FetchingArticle, Persisting | FetchingArticle | Advancing) => true,
            (Persisting, FetchingArticle | Advancing) => true,
            (Advancing, FetchingListing | LocatingPage | Sleeping | Done) => true,
            (Sleeping, FetchingListing | LocatingPage | Done) => true,
            (Done, Idle) => true,
            _ => false,
        }
    }

    /// Returns a short name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LocatingPage => "locating_page",
            Self::FetchingListing => "fetching_listing",
            Self::FetchingArticle => "fetching_article",
            Self::Persisting => "persisting",
            Self::Advancing => "advancing",
            Self::Sleeping => "sleeping",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::Idle
    }
}
