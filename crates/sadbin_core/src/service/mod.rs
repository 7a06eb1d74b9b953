//! The paste engine: create-or-fetch and display, on top of a [`PasteStore`].

#[cfg(test)]
mod tests;

use crate::address::{address_of, is_paste_id};
use crate::config::Config;
use crate::constants::{LANGUAGE_NONE, PASTE_KEY_PREFIX};
use crate::error::AppError;
use crate::expiry::{DurationChoice, ExpiryPolicy, Ttl};
use crate::language::{LanguageChoice, LanguageResolver};
use crate::models::{CreateOutcome, Paste, PasteView, Submission};
use crate::store::PasteStore;
use crate::validation::{SubmissionSchema, ValidationErrors};
use std::sync::Arc;

/// Store key holding the paste with `id`.
pub fn paste_key(id: &str) -> String {
    format!("{}{}", PASTE_KEY_PREFIX, id)
}

/// Creates, deduplicates and renders pastes.
pub struct PasteService {
    store: Arc<dyn PasteStore>,
    languages: Arc<LanguageResolver>,
    expiry: ExpiryPolicy,
    schema: SubmissionSchema,
}

impl PasteService {
    pub fn new(
        config: &Config,
        store: Arc<dyn PasteStore>,
        languages: Arc<LanguageResolver>,
    ) -> Self {
        Self {
            store,
            languages,
            expiry: ExpiryPolicy::new(config.default_ttl),
            schema: SubmissionSchema::from_config(config),
        }
    }

    pub fn expiry(&self) -> &ExpiryPolicy {
        &self.expiry
    }

    /// Selector entries for the language dropdown.
    pub fn list_languages(&self) -> &[LanguageChoice] {
        self.languages.list_languages()
    }

    /// Selector entries for the lifetime dropdown.
    pub fn list_durations(&self) -> &[DurationChoice] {
        self.expiry.list_durations()
    }

    /// Check a submission and resolve its lifetime.
    ///
    /// # Errors
    /// Returns every failing field, including an unknown duration.
    pub fn validate(&self, submission: &Submission) -> Result<Ttl, ValidationErrors> {
        let fields = self.schema.validate(submission);
        let lifetime = self.expiry.resolve_requested_duration(submission.duration);
        match (fields, lifetime) {
            (Ok(()), Ok(ttl)) => Ok(ttl),
            (Err(mut errors), Err(duration)) => {
                errors.errors.extend(duration.errors);
                Err(errors)
            }
            (Err(errors), Ok(_)) | (Ok(()), Err(errors)) => Err(errors),
        }
    }

    /// Store a submission under its content-derived id.
    ///
    /// When `requested_id` already equals that id and a record exists there,
    /// nothing is written and the existing lifetime is kept. Otherwise the
    /// record is (re)written with the requested lifetime.
    ///
    /// # Errors
    /// Returns a validation error for bad input, or a storage error when the
    /// write fails. Failed reads during the existence check count as absent.
    pub fn create_or_fetch(
        &self,
        requested_id: Option<&str>,
        submission: &Submission,
    ) -> Result<CreateOutcome, AppError> {
        let ttl = self.validate(submission)?;
        let id = address_of(
            submission.author(),
            submission.title(),
            submission.content.as_bytes(),
        );
        let key = paste_key(&id);
        let existing = self.load(&key, &id);

        if requested_id == Some(id.as_str()) && existing.is_some() {
            tracing::debug!("Paste {} unchanged; keeping existing record", id);
            return Ok(CreateOutcome { id, stored: false });
        }

        let paste = Paste {
            language: self
                .languages
                .resolve(submission.language.as_deref(), &submission.content),
            id,
            content: submission.content.clone(),
            title: submission.title().to_string(),
            author: submission.author().to_string(),
        };
        self.write(&key, &paste, ttl).map_err(|err| {
            tracing::error!("Failed to store paste {}: {}", paste.id, err);
            err
        })?;
        tracing::info!(
            "Stored paste {} ({} bytes, language '{}', ttl {:?})",
            paste.id,
            paste.content.len(),
            paste.language,
            ttl
        );
        Ok(CreateOutcome {
            id: paste.id,
            stored: true,
        })
    }

    /// View of the paste with `id`, or the empty new-paste form when there
    /// is no such paste (missing, expired or unreadable).
    pub fn fetch_for_display(&self, id: &str) -> PasteView {
        if !is_paste_id(id) {
            return self.new_paste_template();
        }
        let key = paste_key(id);
        let Some(paste) = self.load(&key, id) else {
            return self.new_paste_template();
        };
        let remaining = match self.store.get_ttl(&key) {
            Ok(ttl) => Ttl::from_key_ttl(ttl),
            Err(err) => {
                tracing::warn!("Failed to read lifetime of paste {}: {}", id, err);
                None
            }
        };
        self.build_view(
            Some(paste.id),
            paste.content,
            paste.language,
            paste.title,
            paste.author,
            remaining,
            false,
        )
    }

    /// The empty form shown for `/` and for unknown ids.
    pub fn new_paste_template(&self) -> PasteView {
        self.build_view(
            None,
            String::new(),
            LANGUAGE_NONE.to_string(),
            String::new(),
            String::new(),
            None,
            true,
        )
    }

    /// Render a submission as it would be shown, without storing it.
    ///
    /// # Errors
    /// Returns the same validation errors as [`Self::create_or_fetch`].
    pub fn preview(&self, submission: &Submission) -> Result<PasteView, AppError> {
        let ttl = self.validate(submission)?;
        let language = self
            .languages
            .resolve(submission.language.as_deref(), &submission.content);
        Ok(self.build_view(
            None,
            submission.content.clone(),
            language,
            submission.title().to_string(),
            submission.author().to_string(),
            Some(ttl),
            true,
        ))
    }

    /// Physically drop expired records from the store.
    ///
    /// # Errors
    /// Returns the store's error when the sweep fails.
    pub fn purge_expired(&self) -> Result<usize, AppError> {
        self.store.purge_expired()
    }

    fn load(&self, key: &str, id: &str) -> Option<Paste> {
        match self.store.hash_get_all(key) {
            Ok(fields) if fields.is_empty() => None,
            Ok(fields) => {
                let paste = Paste::from_fields(id, fields);
                if paste.is_none() {
                    tracing::warn!("Paste {} has no content field; treating as missing", id);
                }
                paste
            }
            Err(hash_err) => match self.store.get(key) {
                Ok(Some(bytes)) => {
                    tracing::debug!("Paste {} is a plain legacy record", id);
                    Some(Paste::from_legacy(id, &bytes))
                }
                Ok(None) => None,
                Err(err) => {
                    tracing::warn!("Failed to read paste {}: {}; {}", id, hash_err, err);
                    None
                }
            },
        }
    }

    /// Fields and lifetime land together; a legacy plain record is replaced
    /// only if the whole write succeeds.
    fn write(&self, key: &str, paste: &Paste, ttl: Ttl) -> Result<(), AppError> {
        let expire_after = match ttl {
            Ttl::Seconds(seconds) => Some(seconds),
            Ttl::Never => None,
        };
        self.store.hash_write(key, &paste.to_fields(), expire_after)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_view(
        &self,
        id: Option<String>,
        content: String,
        language: String,
        title: String,
        author: String,
        expires: Option<Ttl>,
        is_new: bool,
    ) -> PasteView {
        let lexer = self.languages.lexer_for_display(&language, &content);
        let markup = self.languages.render(&content, lexer);
        let durations = self
            .expiry
            .reconcile_for_display(expires.unwrap_or(self.expiry.default_ttl()));
        PasteView {
            id,
            lexer: lexer.id.clone(),
            markup,
            content,
            language,
            title,
            author,
            expires,
            languages: self.languages.list_languages().to_vec(),
            durations: durations.choices,
            selected_duration: durations.selected,
            temporary_choice_appended: durations.temporary_choice_appended,
            is_new,
        }
    }
}
