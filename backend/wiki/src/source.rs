use async_trait::async_trait;

use crate::{article::ArticleRef, error::Result};

/// Read access to the live article graph.
///
/// `outgoing_links` must be exhaustive and unfiltered: every page of upstream
/// results is collected before returning, and title-based filtering is left to
/// the caller.
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn random_article(&self) -> Result<ArticleRef>;

    async fn outgoing_links(&self, article: &ArticleRef) -> Result<Vec<ArticleRef>>;
}
