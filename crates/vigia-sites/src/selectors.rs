//! Ordered CSS selector fallback chains.
//!
//! Marketplaces ship markup changes without notice, so every field is
//! located through a list of selectors tried in order. The first selector
//! that matches wins; order is significant.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Ordered list of CSS selectors for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectorChain(Vec<String>);

impl SelectorChain {
    /// Build a chain from selectors in priority order.
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    /// Selectors in priority order.
    #[must_use]
    pub fn selectors(&self) -> &[String] {
        &self.0
    }

    /// Whether the chain has no selector at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that every selector parses.
    ///
    /// # Errors
    /// Returns the first offending selector and the parser message.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for raw in &self.0 {
            Selector::parse(raw).map_err(|e| format!("invalid selector '{raw}': {e}"))?;
        }
        Ok(())
    }

    fn parsed(&self) -> impl Iterator<Item = Selector> + '_ {
        self.0.iter().filter_map(|raw| match Selector::parse(raw) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!(selector = %raw, error = %e, "Skipping unparsable selector");
                None
            }
        })
    }

    /// First element in the document matched by the earliest selector that matches.
    #[must_use]
    pub fn first_match<'a>(&self, html: &'a Html) -> Option<ElementRef<'a>> {
        self.parsed()
            .find_map(|selector| html.select(&selector).next())
    }

    /// Like [`first_match`](Self::first_match), scoped to the descendants of `scope`.
    #[must_use]
    pub fn first_match_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.parsed()
            .find_map(|selector| scope.select(&selector).next())
    }

    /// Every element matched by the earliest selector that matches anything.
    #[must_use]
    pub fn all_matches<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        self.parsed()
            .map(|selector| html.select(&selector).collect::<Vec<_>>())
            .find(|matches| !matches.is_empty())
            .unwrap_or_default()
    }

    /// Trimmed text of the first match inside `scope`, skipping empty matches.
    #[must_use]
    pub fn text_in(&self, scope: ElementRef<'_>) -> Option<String> {
        self.parsed().find_map(|selector| {
            scope
                .select(&selector)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
    }

    /// Value of `attr` on the first match inside `scope` that carries it.
    #[must_use]
    pub fn attr_in(&self, scope: ElementRef<'_>, attr: &str) -> Option<String> {
        self.parsed().find_map(|selector| {
            scope
                .select(&selector)
                .find_map(|el| el.value().attr(attr))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string)
        })
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
