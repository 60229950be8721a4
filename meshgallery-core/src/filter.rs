/// Search filtering with literal, case-insensitive, in-order character matching
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// A compiled search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyQuery {
    pattern: String,
}

impl FuzzyQuery {
    pub fn compile(text: &str) -> Self {
        Self {
            pattern: text.to_lowercase(),
        }
    }

    /// The empty query matches everything
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let matcher = SkimMatcherV2::default().ignore_case();
        matcher.fuzzy_match(&name.to_lowercase(), &self.pattern).is_some()
    }
}
