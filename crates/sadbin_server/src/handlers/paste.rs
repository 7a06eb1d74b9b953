//! Paste HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use sadbin_core::{
    expiry::DurationChoice,
    language::LanguageChoice,
    models::{PasteView, Submission},
    validation::ValidationErrors,
    AppError, PasteService,
};
use serde::Deserialize;

/// Fields of the paste form, as posted by a browser.
///
/// Every field is optional text so that an empty `duration` or a missing
/// `content` reaches validation instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PasteForm {
    pub content: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub duration: Option<String>,
}

impl TryFrom<PasteForm> for Submission {
    type Error = ValidationErrors;

    fn try_from(form: PasteForm) -> Result<Self, Self::Error> {
        let duration = match form.duration.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                ValidationErrors::single("duration", format!("'{}' is not a number", raw))
            })?),
        };
        Ok(Self {
            content: form.content.unwrap_or_default(),
            language: form.language,
            title: form.title,
            author: form.author,
            duration,
        })
    }
}

/// Run `work` against the service on the blocking pool.
async fn with_service<T, F>(state: &AppState, work: F) -> Result<T, HttpError>
where
    T: Send + 'static,
    F: FnOnce(&PasteService) -> T + Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .map_err(|err| {
            tracing::error!("Paste service task failed: {}", err);
            HttpError(AppError::Internal)
        })
}

async fn create_and_redirect(
    state: &AppState,
    requested_id: Option<String>,
    form: PasteForm,
) -> Result<Redirect, HttpError> {
    let submission = Submission::try_from(form)?;
    let outcome = with_service(state, move |service| {
        service.create_or_fetch(requested_id.as_deref(), &submission)
    })
    .await??;
    Ok(Redirect::to(&format!("/{}", outcome.id)))
}

/// Empty new-paste form.
pub async fn new_paste(State(state): State<AppState>) -> Result<Json<PasteView>, HttpError> {
    let view = with_service(&state, |service| service.new_paste_template()).await?;
    Ok(Json(view))
}

/// Submit a paste from the blank form.
///
/// # Returns
/// `303 See Other` to the paste's canonical URL.
///
/// # Errors
/// Returns 400 for invalid fields and 500 when the store write fails.
pub async fn submit_paste(
    State(state): State<AppState>,
    Form(form): Form<PasteForm>,
) -> Result<Redirect, HttpError> {
    create_and_redirect(&state, None, form).await
}

/// Submit a paste from the page of an existing one.
///
/// Unchanged content posted back to its own URL is left untouched.
pub async fn resubmit_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PasteForm>,
) -> Result<Redirect, HttpError> {
    create_and_redirect(&state, Some(id), form).await
}

/// Paste view for `id`, or the empty form when there is no such paste.
pub async fn show_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PasteView>, HttpError> {
    let view = with_service(&state, move |service| service.fetch_for_display(&id)).await?;
    Ok(Json(view))
}

/// Render an unsaved submission.
pub async fn preview_paste(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<Json<PasteView>, HttpError> {
    let view = with_service(&state, move |service| service.preview(&submission)).await??;
    Ok(Json(view))
}

pub async fn list_languages(State(state): State<AppState>) -> Json<Vec<LanguageChoice>> {
    Json(state.service.list_languages().to_vec())
}

pub async fn list_durations(State(state): State<AppState>) -> Json<Vec<DurationChoice>> {
    Json(state.service.list_durations().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_with_blank_duration_uses_default() {
        let form = PasteForm {
            content: Some("x".to_string()),
            duration: Some("  ".to_string()),
            ..PasteForm::default()
        };
        let submission = Submission::try_from(form).expect("valid form");
        assert_eq!(submission.duration, None);
        assert_eq!(submission.content, "x");
    }

    #[test]
    fn form_with_non_numeric_duration_is_a_field_error() {
        let form = PasteForm {
            duration: Some("soon".to_string()),
            ..PasteForm::default()
        };
        let err = Submission::try_from(form).expect_err("bad duration");
        assert_eq!(err.errors[0].field, "duration");
    }

    #[test]
    fn missing_content_becomes_empty_for_validation() {
        let form = PasteForm {
            duration: Some("-1".to_string()),
            ..PasteForm::default()
        };
        let submission = Submission::try_from(form).expect("parsed");
        assert_eq!(submission.content, "");
        assert_eq!(submission.duration, Some(-1));
    }
}
