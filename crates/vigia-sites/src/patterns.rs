//! Page outcome classification from visible text.
//!
//! Each site carries plain substring lists. Classification is the same
//! generic check for every site, parameterized only by those lists.

use serde::Serialize;

/// Substring lists used to classify a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePatterns {
    /// Text shown when a search returned nothing
    pub no_results: Vec<String>,
    /// Text shown when the site demands a login
    pub login: Vec<String>,
    /// Text shown by captcha, bot-check or account-verification interstitials
    pub checkpoint: Vec<String>,
}

impl PagePatterns {
    /// Build from string slices.
    #[must_use]
    pub fn new(no_results: &[&str], login: &[&str], checkpoint: &[&str]) -> Self {
        let owned = |list: &[&str]| list.iter().map(ToString::to_string).collect();
        Self {
            no_results: owned(no_results),
            login: owned(login),
            checkpoint: owned(checkpoint),
        }
    }
}

/// Outcome of classifying a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageClass {
    /// The site asked for credentials
    LoginWall,
    /// Captcha or verification interstitial
    Checkpoint,
    /// The search ran and found nothing
    NoResults,
    /// Anything else
    Content,
}

impl PageClass {
    /// Whether the page means the credential in use is no longer accepted.
    #[must_use]
    pub fn blocks_session(&self) -> bool {
        matches!(self, Self::LoginWall | Self::Checkpoint)
    }
}

/// Case-insensitive check whether `text` contains any of `patterns`.
///
/// Empty patterns never match.
#[must_use]
pub fn contains_any<S: AsRef<str>>(text: &str, patterns: &[S]) -> bool {
    let haystack = text.to_lowercase();
    patterns
        .iter()
        .map(AsRef::as_ref)
        .filter(|pattern| !pattern.is_empty())
        .any(|pattern| haystack.contains(&pattern.to_lowercase()))
}

/// Classify page text. Login walls take priority over checkpoints, which
/// take priority over empty results.
#[must_use]
pub fn classify_page(text: &str, patterns: &PagePatterns) -> PageClass {
    if contains_any(text, &patterns.login) {
        PageClass::LoginWall
    } else if contains_any(text, &patterns.checkpoint) {
        PageClass::Checkpoint
    } else if contains_any(text, &patterns.no_results) {
        PageClass::NoResults
    } else {
        PageClass::Content
    }
}
