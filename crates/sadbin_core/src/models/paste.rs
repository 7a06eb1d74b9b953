//! Paste records, submissions and the views built from them.

use crate::constants::LANGUAGE_NONE;
use crate::expiry::{DurationChoice, Ttl};
use crate::language::LanguageChoice;
use crate::store::FieldMap;
use serde::{Deserialize, Serialize};

const FIELD_CONTENT: &str = "content";
const FIELD_LANGUAGE: &str = "language";
const FIELD_TITLE: &str = "title";
const FIELD_AUTHOR: &str = "author";

/// A stored paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    pub content: String,
    /// Lexer id chosen at creation. Only records without one (legacy or
    /// hand-written) carry the guess sentinel.
    pub language: String,
    pub title: String,
    pub author: String,
}

impl Paste {
    /// Hash fields written to the store.
    pub fn to_fields(&self) -> [(&'static str, &str); 4] {
        [
            (FIELD_CONTENT, self.content.as_str()),
            (FIELD_LANGUAGE, self.language.as_str()),
            (FIELD_TITLE, self.title.as_str()),
            (FIELD_AUTHOR, self.author.as_str()),
        ]
    }

    /// Rebuild a paste from its hash fields.
    ///
    /// # Returns
    /// `None` when the hash has no content field (missing or foreign key).
    pub fn from_fields(id: &str, mut fields: FieldMap) -> Option<Self> {
        let content = fields.remove(FIELD_CONTENT)?;
        let language = fields
            .remove(FIELD_LANGUAGE)
            .filter(|language| !language.trim().is_empty())
            .unwrap_or_else(|| LANGUAGE_NONE.to_string());
        let mut take = |name: &str| fields.remove(name).unwrap_or_default();
        Some(Self {
            id: id.to_string(),
            content,
            language,
            title: take(FIELD_TITLE),
            author: take(FIELD_AUTHOR),
        })
    }

    /// Read a record written as a bare content string with no metadata.
    ///
    /// Such records carry no language, so display falls back to guessing.
    pub fn from_legacy(id: &str, bytes: &[u8]) -> Self {
        Self {
            id: id.to_string(),
            content: String::from_utf8_lossy(bytes).into_owned(),
            language: LANGUAGE_NONE.to_string(),
            title: String::new(),
            author: String::new(),
        }
    }
}

/// Form fields of a paste submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub content: String,
    /// Lexer id, or empty/`"none"` to guess from the content.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Requested lifetime in seconds; `-1` never expires.
    #[serde(default)]
    pub duration: Option<i64>,
}

impl Submission {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Value of a named form field, for validation rules.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            FIELD_CONTENT => Some(self.content.as_str()),
            FIELD_LANGUAGE => self.language.as_deref(),
            FIELD_TITLE => self.title.as_deref(),
            FIELD_AUTHOR => self.author.as_deref(),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn author(&self) -> &str {
        self.author.as_deref().unwrap_or_default()
    }
}

/// Result of [`crate::PasteService::create_or_fetch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub id: String,
    /// `false` when an identical paste already lived at the requested id and
    /// was left untouched.
    pub stored: bool,
}

/// Everything needed to render a paste page, or the empty form.
#[derive(Debug, Clone, Serialize)]
pub struct PasteView {
    /// `None` for the new-paste template.
    pub id: Option<String>,
    pub content: String,
    /// Language as stored (or the guess sentinel for the template).
    pub language: String,
    /// Lexer actually used for highlighting.
    pub lexer: String,
    /// Class-annotated HTML of `content`.
    pub markup: String,
    pub title: String,
    pub author: String,
    /// Remaining lifetime; `None` for the template.
    pub expires: Option<Ttl>,
    pub languages: Vec<LanguageChoice>,
    pub durations: Vec<DurationChoice>,
    pub selected_duration: i64,
    pub temporary_choice_appended: bool,
    /// Whether this is the empty new-paste form.
    pub is_new: bool,
}
