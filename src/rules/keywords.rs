// src/rules/keywords.rs

use regex::{Regex, RegexBuilder};

/// Case-insensitive "text contains any of these words" matcher.
///
/// Keywords are literal substrings (no word boundaries), so `"+"` and
/// `"提交"` work the same way as `"submit"`. An empty set never matches.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    words: Vec<String>,
    matcher: Option<Regex>,
}

impl KeywordSet {
    pub fn new<I, S>(words: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        let matcher = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                RegexBuilder::new(&alternation)
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self { words, matcher })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
