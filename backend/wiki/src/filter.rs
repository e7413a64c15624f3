//! Title predicates that keep administrative pages out of generated games.
//!
//! Defaults exclude list articles (`List of ...`) and anything namespaced
//! (`Category:`, `Help:`, `Template:` all carry a colon).
use regex::Regex;

use crate::article::ArticleRef;

pub const DEFAULT_EXCLUSIONS: [&str; 2] = [r"^List of", ":"];

#[derive(Clone, Debug)]
pub struct LinkFilter {
    excluded: Vec<Regex>,
}

impl LinkFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<_, _>>()?;

        Ok(Self { excluded })
    }

    pub fn allow_all() -> Self {
        Self {
            excluded: Vec::new(),
        }
    }

    pub fn allows_title(&self, title: &str) -> bool {
        !self.excluded.iter().any(|pattern| pattern.is_match(title))
    }

    /// Unreadable references are never allowed.
    pub fn allows(&self, article: &ArticleRef) -> bool {
        article
            .title()
            .map(|title| self.allows_title(&title))
            .unwrap_or(false)
    }
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS).expect("default exclusions are valid patterns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exclusions() {
        let filter = LinkFilter::default();

        assert!(filter.allows_title("Photon"));
        assert!(filter.allows_title("Lists are fun"));
        assert!(!filter.allows_title("List of physicists"));
        assert!(!filter.allows_title("Category:Physics"));
        assert!(!filter.allows_title("Help:Contents"));
    }

    #[test]
    fn test_allows_decodes_reference() {
        let filter = LinkFilter::default();

        assert!(filter.allows(&ArticleRef::wikipedia("Quantum mechanics")));
        assert!(!filter.allows(&ArticleRef::new(
            "https://en.wikipedia.org/wiki/Template%3AInfobox"
        )));
        assert!(!filter.allows(&ArticleRef::new("https://en.wikipedia.org/")));
    }

    #[test]
    fn test_custom_patterns() {
        let filter = LinkFilter::new(["(?i)disambiguation"]).unwrap();

        assert!(filter.allows_title("List of physicists"));
        assert!(!filter.allows_title("Mercury (Disambiguation)"));
        assert!(LinkFilter::new(["("]).is_err());
        assert!(LinkFilter::allow_all().allows_title("Category:Physics"));
    }
}
