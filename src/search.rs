//! Literal, case-insensitive title search.

use regex::{Regex, RegexBuilder};

use crate::{
    error::StoreResult,
    feed::newest_first,
    models::{FieldError, Question},
    repository::{QuestionFilter, RepositoryState},
};

/// Characters that carry meaning in a regular expression and are escaped before
/// a search term is turned into a pattern. ASCII whitespace is escaped as well.
/// Longest accepted search term, in characters. Longer terms are rejected before
/// any pattern is built.
pub const MAX_TERM_CHARS: usize = 200;

const METACHARACTERS: &[char] = &[
    '-', '[', ']', '{', '}', '(', ')', '*', '+', '?', '.', ',', '\\', '^', '$', '|', '#',
];

/// escape_pattern
///
/// Prefixes every metacharacter and ASCII whitespace character in `raw` with a
/// backslash. The result, used as a regular expression, matches `raw` literally
/// both in the `regex` crate and in PostgreSQL's `~*` operator.
pub fn escape_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() * 2);
    for c in raw.chars() {
        if METACHARACTERS.contains(&c) || (c.is_ascii() && c.is_whitespace()) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// TitlePattern
///
/// A non-empty search term together with its escaped regular-expression form.
/// Matching is unanchored and case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitlePattern {
    literal: String,
    escaped: String,
}

impl TitlePattern {
    /// Returns `None` for an empty term: an empty search is not "match everything".
    ///
    /// NUL characters are dropped first; Postgres text parameters cannot carry them.
    /// A term made only of NULs is therefore empty.
    pub fn literal(raw: &str) -> Option<Self> {
        let cleaned: String = raw.chars().filter(|c| *c != '\0').collect();
        if cleaned.is_empty() {
            return None;
        }
        Some(Self {
            escaped: escape_pattern(&cleaned),
            literal: cleaned,
        })
    }

    /// The term as searched (NULs removed).
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// The escaped pattern handed to a regular-expression engine.
    pub fn as_regex(&self) -> &str {
        &self.escaped
    }

    pub fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.escaped)
            .case_insensitive(true)
            .build()
    }
}

/// Result of a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// No term was supplied. No query ran; the caller shows the unfiltered home view.
    NoTerm,
    /// Questions whose title contains the term, newest-first. May be empty.
    Matches(Vec<Question>),
    /// The term was rejected before reaching the store.
    Invalid(Vec<FieldError>),
}

/// SearchService
///
/// Turns free-text input into a literal substring filter over question titles.
#[derive(Clone)]
pub struct SearchService {
    repo: RepositoryState,
}

impl SearchService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn search(&self, raw_term: &str) -> StoreResult<SearchOutcome> {
        let Some(pattern) = TitlePattern::literal(raw_term) else {
            tracing::debug!("empty search term, skipping query");
            return Ok(SearchOutcome::NoTerm);
        };

        if pattern.as_str().chars().count() > MAX_TERM_CHARS {
            tracing::debug!(chars = pattern.as_str().chars().count(), "search term too long");
            return Ok(SearchOutcome::Invalid(vec![FieldError::new(
                "search",
                &format!("Search term must be at most {MAX_TERM_CHARS} characters"),
            )]));
        }

        let mut questions = self
            .repo
            .find_questions(&QuestionFilter::title_matching(pattern))
            .await?;
        newest_first(&mut questions);

        tracing::debug!(term = %raw_term, matches = questions.len(), "title search");
        Ok(SearchOutcome::Matches(questions))
    }
}
