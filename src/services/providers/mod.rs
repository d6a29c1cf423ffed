//! Display metadata providers
//!
//! The recommendation core never depends on these. A provider hands back
//! placeholder values whenever the upstream lookup fails.

use crate::models::{AnimeId, AnimeInfo};

pub mod jikan;

/// Source of display metadata (cover image, trailer, detail page) for a
/// catalog entry
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnimeInfoProvider: Send + Sync {
    /// Looks up display metadata for an entry
    ///
    /// Never fails: any error or timeout yields `AnimeInfo::fallback(id)`.
    async fn lookup(&self, id: AnimeId, name: &str) -> AnimeInfo;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
