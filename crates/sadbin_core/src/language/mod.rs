//! Language hint resolution on top of the lexer catalog.

/// Language alias canonicalization.
pub mod canonical;
/// Lexer catalog and HTML rendering.
pub mod catalog;
mod heuristic;

pub use catalog::{Lexer, LexerCatalog};

use crate::constants::{LANGUAGE_NONE, LANGUAGE_NONE_LABEL};
use serde::Serialize;
use std::sync::Arc;

/// One entry of the language selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageChoice {
    pub id: String,
    pub label: String,
}

/// Whether a hint asks for guessing (`None`, empty or `"none"`).
pub fn is_guess_hint(hint: Option<&str>) -> bool {
    hint.map(str::trim)
        .map_or(true, |value| value.is_empty() || value.eq_ignore_ascii_case(LANGUAGE_NONE))
}

/// Maps language hints to lexers, guessing from content when asked to.
pub struct LanguageResolver {
    catalog: Arc<LexerCatalog>,
    choices: Vec<LanguageChoice>,
}

impl LanguageResolver {
    /// Build a resolver and precompute the selector catalog.
    pub fn new(catalog: Arc<LexerCatalog>) -> Self {
        let mut entries: Vec<LanguageChoice> = catalog
            .lexers()
            .iter()
            .map(|lexer| LanguageChoice {
                id: lexer.id.clone(),
                label: lexer.name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut choices = Vec::with_capacity(entries.len() + 1);
        choices.push(LanguageChoice {
            id: LANGUAGE_NONE.to_string(),
            label: LANGUAGE_NONE_LABEL.to_string(),
        });
        choices.extend(entries);
        Self { catalog, choices }
    }

    /// The underlying lexer catalog.
    pub fn catalog(&self) -> &LexerCatalog {
        &self.catalog
    }

    /// Language to store for a submission.
    ///
    /// A concrete hint passes through untouched (it is only checked against
    /// the catalog at render time). A guess hint is replaced by the guessed
    /// lexer's id so later views do not guess again.
    pub fn resolve(&self, hint: Option<&str>, content: &str) -> String {
        match hint.map(str::trim) {
            Some(value) if !is_guess_hint(Some(value)) => value.to_string(),
            _ => {
                let guessed = self.catalog.guess_lexer(content);
                tracing::debug!("Guessed language '{}' for submission", guessed.id);
                guessed.id.clone()
            }
        }
    }

    /// Lexer to highlight a stored paste with.
    ///
    /// Unknown ids (for example after the grammar set changed) and the guess
    /// sentinel fall back to guessing instead of failing.
    pub fn lexer_for_display(&self, stored: &str, content: &str) -> &Lexer {
        if !is_guess_hint(Some(stored)) {
            if let Some(lexer) = self.catalog.lexer_by_id(stored) {
                return lexer;
            }
            tracing::debug!("Stored language '{}' is not in the catalog; guessing", stored);
        }
        self.catalog.guess_lexer(content)
    }

    /// Highlight `content`, degrading to plain text when the grammar fails.
    pub fn render(&self, content: &str, lexer: &Lexer) -> String {
        match self.catalog.render(content, lexer) {
            Ok(markup) => markup,
            Err(err) => {
                tracing::warn!("{}; rendering as plain text", err);
                self.catalog
                    .render(content, self.catalog.plain_text())
                    .unwrap_or_default()
            }
        }
    }

    /// Selector entries: the guess sentinel first, then every lexer sorted
    /// case-insensitively by display name.
    pub fn list_languages(&self) -> &[LanguageChoice] {
        &self.choices
    }
}
