//! # Article References
//!
//! Articles travel through the system as URLs, exactly as the browser saw them
//! (`https://en.wikipedia.org/wiki/Albert_Einstein`). Logically an article is only
//! its title, so every comparison goes through [`normalize`]:
//!
//! 1. Everything up to and including `/wiki/` is dropped
//! 2. A raw `?query` or `#fragment` suffix is dropped
//! 3. The title segment is percent-decoded
//! 4. Underscores become spaces, then the title is trimmed and lower-cased
//!
//! `.../wiki/Foo_Bar`, `.../wiki/foo%20bar` and `.../wiki/FOO_BAR#History` all
//! denote the same article.
use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WikiError};

pub const WIKI_MARKER: &str = "/wiki/";
pub const DEFAULT_ARTICLE_BASE: &str = "https://en.wikipedia.org";

// `/` stays raw, the way Wikipedia renders `AC/DC`.
const TITLE_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleRef(String);

impl ArticleRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn from_title(base: &str, title: &str) -> Self {
        let segment = utf8_percent_encode(&title.trim().replace(' ', "_"), TITLE_SEGMENT).to_string();

        Self(format!("{}{WIKI_MARKER}{segment}", base.trim_end_matches('/')))
    }

    pub fn wikipedia(title: &str) -> Self {
        Self::from_title(DEFAULT_ARTICLE_BASE, title)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decoded display title, original casing preserved.
    pub fn title(&self) -> Result<String> {
        title_of(&self.0)
    }

    pub fn normalized(&self) -> Result<String> {
        normalize(&self.0)
    }

    pub fn same_article(&self, other: &ArticleRef) -> Result<bool> {
        Ok(self.normalized()? == other.normalized()?)
    }
}

impl fmt::Display for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArticleRef {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for ArticleRef {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

pub fn normalize(reference: &str) -> Result<String> {
    title_of(reference).map(|title| title.to_lowercase())
}

fn title_of(reference: &str) -> Result<String> {
    let malformed = || WikiError::MalformedReference(reference.to_string());

    let (_, segment) = reference.split_once(WIKI_MARKER).ok_or_else(malformed)?;
    let segment = segment.split(['?', '#']).next().unwrap_or_default();

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| malformed())?;

    let title = decoded.replace('_', " ").trim().to_string();
    if title.is_empty() {
        return Err(malformed());
    }

    Ok(title)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_case_and_underscore_insensitive() {
        assert_eq!(
            normalize("https://en.wikipedia.org/wiki/Foo_Bar").unwrap(),
            normalize("https://en.wikipedia.org/wiki/foo%20bar").unwrap()
        );
    }

    #[test]
    fn test_decodes_and_trims() {
        assert_eq!(
            normalize("https://en.wikipedia.org/wiki/Caf%C3%A9_").unwrap(),
            "café"
        );
        assert_eq!(normalize("/wiki/AC/DC").unwrap(), "ac/dc");
    }

    #[test]
    fn test_drops_fragment_and_query() {
        assert_eq!(
            normalize("https://en.wikipedia.org/wiki/Photon#History").unwrap(),
            "photon"
        );
        assert_eq!(
            normalize("https://en.wikipedia.org/wiki/Photon?oldid=1").unwrap(),
            "photon"
        );
        assert_eq!(
            normalize("https://en.wikipedia.org/wiki/What%3F").unwrap(),
            "what?"
        );
    }

    #[test]
    fn test_rejects_missing_title() {
        assert!(matches!(
            normalize("https://en.wikipedia.org/w/index.php"),
            Err(WikiError::MalformedReference(_))
        ));
        assert!(matches!(
            normalize("https://en.wikipedia.org/wiki/"),
            Err(WikiError::MalformedReference(_))
        ));
        assert!(matches!(
            normalize("https://en.wikipedia.org/wiki/__"),
            Err(WikiError::MalformedReference(_))
        ));
        assert!(normalize("Albert Einstein").is_err());
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        assert!(normalize("https://en.wikipedia.org/wiki/%FF%FE").is_err());
    }

    #[test]
    fn test_from_title_round_trips() {
        let article = ArticleRef::wikipedia("Quantum mechanics");

        assert_eq!(
            article.as_str(),
            "https://en.wikipedia.org/wiki/Quantum_mechanics"
        );
        assert_eq!(article.title().unwrap(), "Quantum mechanics");

        let odd = ArticleRef::from_title("https://en.wikipedia.org/", "100% #1?");
        assert_eq!(odd.title().unwrap(), "100% #1?");
    }

    #[test]
    fn test_same_article() {
        let a = ArticleRef::new("https://en.wikipedia.org/wiki/Albert_Einstein");
        let b = ArticleRef::new("https://en.m.wikipedia.org/wiki/albert%20einstein");
        let c = ArticleRef::new("https://en.wikipedia.org/wiki/Photon");

        assert!(a.same_article(&b).unwrap());
        assert!(!a.same_article(&c).unwrap());
    }

    proptest! {
        #[test]
        fn normalize_is_reflexive(title in "[A-Za-z][A-Za-z0-9 ]{0,24}") {
            let article = ArticleRef::wikipedia(&title);
            prop_assert_eq!(article.normalized().unwrap(), article.normalized().unwrap());
            prop_assert_eq!(article.normalized().unwrap(), title.trim().to_lowercase());
        }

        #[test]
        fn normalize_ignores_surface_form(title in "[A-Za-z][A-Za-z0-9 ]{0,24}") {
            let underscored = format!("https://en.wikipedia.org/wiki/{}", title.to_uppercase().replace(' ', "_"));
            let encoded = format!("https://en.wikipedia.org/wiki/{}", title.to_lowercase().replace(' ', "%20"));
            prop_assert_eq!(normalize(&underscored).unwrap(), normalize(&encoded).unwrap());
        }
    }
}
