use serde::{Deserialize, Serialize};

use crate::article::ArticleRef;

/// Win condition of one game. Never mutated after the walker produces it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSpec {
    pub start: ArticleRef,
    pub end: ArticleRef,
    pub min_steps: u32,
}

/// Articles a client claims to have visited, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathClaim(Vec<ArticleRef>);

impl PathClaim {
    pub fn new(articles: Vec<ArticleRef>) -> Self {
        Self(articles)
    }

    pub fn articles(&self) -> &[ArticleRef] {
        &self.0
    }

    pub fn first(&self) -> Option<&ArticleRef> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&ArticleRef> {
        self.0.last()
    }

    pub fn hops(&self) -> impl Iterator<Item = (&ArticleRef, &ArticleRef)> {
        self.0.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ArticleRef>> for PathClaim {
    fn from(articles: Vec<ArticleRef>) -> Self {
        Self(articles)
    }
}

impl FromIterator<ArticleRef> for PathClaim {
    fn from_iter<I: IntoIterator<Item = ArticleRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
