//! Highlighting engine: lexer catalog, lookup, guessing and HTML rendering.

use super::{canonical::canonicalize, heuristic};
use crate::constants::PLAIN_TEXT_LEXER;
use crate::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// A highlightable language known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexer {
    /// Short id stored on pastes (`python`, `rust`, `text`, ...).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// File extensions that also identify this lexer.
    pub aliases: Vec<String>,
    syntax: usize,
}

/// Lexers backed by a syntect [`SyntaxSet`].
pub struct LexerCatalog {
    syntaxes: SyntaxSet,
    lexers: Vec<Lexer>,
    by_id: HashMap<String, usize>,
    plain_text: usize,
}

/// Grammars that stand in for languages the bundled set does not ship.
fn fallback_candidates(canonical: &str) -> &'static [&'static str] {
    match canonical {
        "typescript" | "tsx" | "jsx" => &["javascript"],
        "powershell" | "dockerfile" | "fish" => &["shell"],
        "toml" | "ini" => &["Java Properties", "yaml"],
        "scss" | "sass" | "less" => &["css"],
        _ => &[],
    }
}

fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|ch: &char| {
                    ch.is_ascii_alphanumeric() || matches!(*ch, '+' | '#' | '-' | '.')
                })
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl LexerCatalog {
    /// Build a catalog over syntect's bundled grammars.
    pub fn load_defaults() -> Self {
        Self::from_syntaxes(SyntaxSet::load_defaults_newlines())
    }

    /// Process-wide catalog, loaded on first use.
    ///
    /// The bundled grammars never change at runtime, so every resolver in a
    /// process can share one instance.
    pub fn shared() -> Arc<Self> {
        static CATALOG: OnceLock<Arc<LexerCatalog>> = OnceLock::new();
        CATALOG
            .get_or_init(|| Arc::new(Self::load_defaults()))
            .clone()
    }

    /// Build a catalog over an arbitrary syntax set.
    ///
    /// Hidden grammars are skipped. Each lexer id is the canonical form of the
    /// grammar's first file extension, or a slug of its name when that id is
    /// taken or missing.
    pub fn from_syntaxes(syntaxes: SyntaxSet) -> Self {
        let plain_name = syntaxes.find_syntax_plain_text().name.clone();
        let mut lexers: Vec<Lexer> = Vec::new();
        let mut by_id = HashMap::new();

        for (index, syntax) in syntaxes.syntaxes().iter().enumerate() {
            let is_plain = syntax.name == plain_name;
            if syntax.hidden && !is_plain {
                continue;
            }
            let preferred = if is_plain {
                Some(PLAIN_TEXT_LEXER.to_string())
            } else {
                syntax
                    .file_extensions
                    .first()
                    .map(|ext| canonicalize(ext))
                    .filter(|id| !id.is_empty())
            };
            let id = match preferred {
                Some(id) if !by_id.contains_key(&id) => id,
                _ => slug(&syntax.name),
            };
            if id.is_empty() || by_id.contains_key(&id) {
                tracing::debug!("Skipping grammar '{}' with duplicate id '{}'", syntax.name, id);
                continue;
            }
            by_id.insert(id.clone(), lexers.len());
            lexers.push(Lexer {
                id,
                name: syntax.name.clone(),
                aliases: syntax
                    .file_extensions
                    .iter()
                    .map(|ext| ext.to_ascii_lowercase())
                    .collect(),
                syntax: index,
            });
        }

        let plain_text = by_id.get(PLAIN_TEXT_LEXER).copied().unwrap_or(0);
        Self {
            syntaxes,
            lexers,
            by_id,
            plain_text,
        }
    }

    /// Every lexer, in grammar-set order.
    pub fn lexers(&self) -> &[Lexer] {
        &self.lexers
    }

    /// The plain-text lexer used when nothing else fits.
    pub fn plain_text(&self) -> &Lexer {
        &self.lexers[self.plain_text]
    }

    fn find_direct(&self, candidate: &str) -> Option<&Lexer> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_ascii_lowercase();
        if let Some(&index) = self.by_id.get(&lowered) {
            return Some(&self.lexers[index]);
        }
        self.lexers
            .iter()
            .find(|lexer| {
                lexer
                    .aliases
                    .iter()
                    .any(|alias| *alias == lowered || canonicalize(alias) == lowered)
            })
            .or_else(|| {
                self.lexers
                    .iter()
                    .find(|lexer| lexer.name.eq_ignore_ascii_case(trimmed))
            })
    }

    /// Look up a lexer by id, alias, canonical alias or display name.
    ///
    /// # Returns
    /// `None` when nothing in the catalog matches.
    pub fn lexer_by_id(&self, id: &str) -> Option<&Lexer> {
        if let Some(lexer) = self.find_direct(id) {
            return Some(lexer);
        }
        let canonical = canonicalize(id);
        if canonical.is_empty() {
            return None;
        }
        self.find_direct(&canonical).or_else(|| {
            fallback_candidates(&canonical)
                .iter()
                .find_map(|candidate| self.find_direct(candidate))
        })
    }

    /// Guess the lexer for `content`, falling back to plain text.
    pub fn guess_lexer(&self, content: &str) -> &Lexer {
        if let Some(lexer) = heuristic::detect(content).and_then(|label| self.lexer_by_id(label)) {
            return lexer;
        }
        self.syntaxes
            .find_syntax_by_first_line(content)
            .and_then(|syntax| self.lexer_for_syntax(syntax))
            .unwrap_or_else(|| self.plain_text())
    }

    fn lexer_for_syntax(&self, syntax: &SyntaxReference) -> Option<&Lexer> {
        self.lexers
            .iter()
            .find(|lexer| self.syntaxes.syntaxes()[lexer.syntax].name == syntax.name)
    }

    /// Render `content` as class-annotated HTML spans for `lexer`.
    ///
    /// # Errors
    /// Returns an error when the grammar fails to tokenize a line.
    pub fn render(&self, content: &str, lexer: &Lexer) -> Result<String, AppError> {
        let syntax = self
            .syntaxes
            .syntaxes()
            .get(lexer.syntax)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown lexer '{}'", lexer.id)))?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(content) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|err| {
                    AppError::Highlight(format!("lexer '{}': {}", lexer.id, err))
                })?;
        }
        Ok(generator.finalize())
    }
}
