//! Win validation.
//!
//! A claim is checked in order: start, end, then every hop against the live link
//! graph. The first failure wins and nothing is retried: an upstream glitch must
//! surface as an error rather than silently grant or deny a win.
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    article::ArticleRef,
    error::Result,
    game::{GameSpec, PathClaim},
    source::LinkSource,
};

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    #[error("start mismatch")]
    StartMismatch,

    #[error("end mismatch")]
    EndMismatch,

    #[error("illegal navigation from {from} to {to}")]
    IllegalNavigation { from: ArticleRef, to: ArticleRef },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

pub struct PathValidator {
    source: Arc<dyn LinkSource>,
}

impl PathValidator {
    pub fn new(source: Arc<dyn LinkSource>) -> Self {
        Self { source }
    }

    pub async fn validate(&self, claim: &PathClaim, spec: &GameSpec) -> Result<Verdict> {
        let Some(first) = claim.first() else {
            return Ok(Verdict::Rejected(Rejection::StartMismatch));
        };
        if !first.same_article(&spec.start)? {
            return Ok(Verdict::Rejected(Rejection::StartMismatch));
        }

        if let Some(last) = claim.last() {
            if !last.same_article(&spec.end)? {
                return Ok(Verdict::Rejected(Rejection::EndMismatch));
            }
        }

        for (from, to) in claim.hops() {
            if !self.check_hop(from, to).await? {
                return Ok(Verdict::Rejected(Rejection::IllegalNavigation {
                    from: from.clone(),
                    to: to.clone(),
                }));
            }
        }

        debug!("Claim of {} articles accepted", claim.len());

        Ok(Verdict::Valid)
    }

    /// Whether `from` links to `to`, compared by normalized title.
    pub async fn check_hop(&self, from: &ArticleRef, to: &ArticleRef) -> Result<bool> {
        let target = to.normalized()?;
        let links = self.source.outgoing_links(from).await?;

        Ok(links
            .iter()
            .any(|link| link.normalized().is_ok_and(|title| title == target)))
    }
}
