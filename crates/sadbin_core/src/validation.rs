//! Declarative field rules applied to submissions before they reach the engine.

use crate::config::Config;
use crate::models::Submission;
use serde::Serialize;
use std::fmt;

/// A single constraint on a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Present and not just whitespace.
    Required,
    /// At most this many bytes of UTF-8.
    MaxBytes(usize),
    /// At most this many characters.
    MaxChars(usize),
}

impl FieldRule {
    fn check(self, value: Option<&str>) -> Option<String> {
        match (self, value) {
            (Self::Required, None) => Some("This field is required".to_string()),
            (Self::Required, Some(v)) if v.trim().is_empty() => {
                Some("This field is required".to_string())
            }
            (Self::MaxBytes(max), Some(v)) if v.len() > max => Some(format!(
                "Must be at most {} bytes (got {})",
                max,
                v.len()
            )),
            (Self::MaxChars(max), Some(v)) if v.chars().count() > max => {
                Some(format!("Must be at most {} characters", max))
            }
            _ => None,
        }
    }
}

/// Rules for one named field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub field: &'static str,
    pub rules: Vec<FieldRule>,
}

impl FieldSchema {
    pub fn new(field: &'static str, rules: impl Into<Vec<FieldRule>>) -> Self {
        Self {
            field,
            rules: rules.into(),
        }
    }
}

/// A failed rule on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field error found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Errors holding one message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded against `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |error| error.field == field)
            .map(|error| error.message.as_str())
    }

    fn push(&mut self, field: &str, message: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message,
        });
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Field rules for paste submissions.
#[derive(Debug, Clone)]
pub struct SubmissionSchema {
    fields: Vec<FieldSchema>,
}

impl SubmissionSchema {
    /// Build the schema from configured limits.
    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            FieldSchema::new(
                "content",
                [FieldRule::Required, FieldRule::MaxBytes(config.max_paste_size)],
            ),
            FieldSchema::new("title", [FieldRule::MaxChars(config.max_title_length)]),
            FieldSchema::new("author", [FieldRule::MaxChars(config.max_author_length)]),
        ])
    }

    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    /// Check `submission` against every rule.
    ///
    /// # Errors
    /// Returns all failing fields at once, in schema order.
    pub fn validate(&self, submission: &Submission) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for schema in &self.fields {
            let value = submission.field(schema.field);
            for rule in &schema.rules {
                if let Some(message) = rule.check(value) {
                    errors.push(schema.field, message);
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
