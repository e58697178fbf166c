//! Persistence gateway: deduplicated, two-phase article storage
//!
//! An article is written and committed first; its comments follow in a second
//! transaction. A failed comment batch is rolled back on its own and never
//! retracts the committed article, so an article with zero comments is a
//! normal end state.

use crate::storage::traits::Storage;
use crate::storage::{NewArticle, NewComment};
use crate::{FaultKind, HarvestError};

/// Why an article was not stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The link was already stored
    Duplicate,
    /// The article insert failed for another reason
    Failed,
}

/// Outcome of one `store` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored {
        article_id: i64,
        /// Comments written; 0 if the batch was rolled back
        comments_saved: usize,
    },
    Skipped(SkipReason),
}

/// Writes harvested articles and their comments through a storage backend
pub struct PersistenceGateway<S: Storage> {
    storage: S,
}

impl<S: Storage> PersistenceGateway<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stores an article and then its comments
    ///
    /// A link that is already stored returns `Skipped(Duplicate)` without
    /// touching comments. Storage faults are logged here and never returned:
    /// the caller only needs to know whether the article landed.
    pub fn store(&mut self, article: &NewArticle, comments: &[NewComment]) -> StoreOutcome {
        let article_id = match self.storage.insert_article(article) {
            Ok(id) => id,
            Err(e) => {
                let err = HarvestError::from(e);
                if err.kind() == FaultKind::DuplicateKey {
                    tracing::debug!("Duplicate article, skipping: {}", article.link);
                    return StoreOutcome::Skipped(SkipReason::Duplicate);
                }
                tracing::error!("Inserting article {} failed: {}", article.link, err);
                return StoreOutcome::Skipped(SkipReason::Failed);
            }
        };

        if comments.is_empty() {
            return StoreOutcome::Stored {
                article_id,
                comments_saved: 0,
            };
        }

        let comments_saved = match self.storage.insert_comments(article_id, comments) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(
                    "Inserting {} comments for article {} failed, batch rolled back: {}",
                    comments.len(),
                    article_id,
                    e
                );
                0
            }
        };

        StoreOutcome::Stored {
            article_id,
            comments_saved,
        }
    }

    /// Gets the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gets the underlying storage mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
