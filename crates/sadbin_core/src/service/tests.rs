//! Engine behaviour over real stores.

use super::*;
use crate::constants::{NEVER_EXPIRE, PLAIN_TEXT_LEXER};
use crate::store::{KeyTtl, MemoryStore};
use crate::test_support::{service_over, setup_temp_store, FlakyStore};
use std::sync::atomic::Ordering;

const HELLO_ID: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

fn memory_service() -> (PasteService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (service_over(store.clone()), store)
}

fn submission(content: &str, duration: Option<i64>) -> Submission {
    Submission {
        duration,
        ..Submission::new(content)
    }
}

#[test]
fn create_then_display_round_trip() {
    let (service, _store) = memory_service();
    let outcome = service
        .create_or_fetch(None, &submission("hello", Some(3600)))
        .expect("create");
    assert_eq!(outcome.id, HELLO_ID);
    assert!(outcome.stored);

    let view = service.fetch_for_display(&outcome.id);
    assert!(!view.is_new);
    assert_eq!(view.id.as_deref(), Some(HELLO_ID));
    assert_eq!(view.content, "hello");
    assert_eq!(view.language, PLAIN_TEXT_LEXER);
    assert_eq!(view.lexer, PLAIN_TEXT_LEXER);
    assert_eq!(view.selected_duration, 3600);
    assert!(!view.temporary_choice_appended);
    assert_eq!(view.expires, Some(Ttl::Seconds(3600)));
}

#[test]
fn identity_fields_change_the_id() {
    let (service, _store) = memory_service();
    let plain = service
        .create_or_fetch(None, &submission("hello", None))
        .expect("plain");
    let titled = service
        .create_or_fetch(
            None,
            &Submission {
                title: Some("greeting".to_string()),
                ..submission("hello", None)
            },
        )
        .expect("titled");
    assert_ne!(plain.id, titled.id);
}

#[test]
fn resubmitting_to_canonical_id_keeps_lifetime() {
    let (service, store) = memory_service();
    let first = service
        .create_or_fetch(None, &submission("hello", Some(3600)))
        .expect("create");
    let key = paste_key(&first.id);
    store.set_expire(&key, 100).expect("shorten");

    let again = service
        .create_or_fetch(Some(&first.id), &submission("hello", Some(3600)))
        .expect("resubmit");
    assert_eq!(again.id, first.id);
    assert!(!again.stored);
    assert!(matches!(
        store.get_ttl(&key).expect("ttl"),
        KeyTtl::Expires(secs) if secs <= 100
    ));
}

#[test]
fn resubmitting_from_other_url_resets_lifetime() {
    let (service, store) = memory_service();
    let first = service
        .create_or_fetch(None, &submission("hello", Some(3600)))
        .expect("create");
    let key = paste_key(&first.id);
    store.set_expire(&key, 100).expect("shorten");

    let moved = service
        .create_or_fetch(Some("not-the-id"), &submission("hello", Some(3600)))
        .expect("resubmit");
    assert_eq!(moved.id, first.id);
    assert!(moved.stored);
    assert_eq!(store.get_ttl(&key).expect("ttl"), KeyTtl::Expires(3600));
}

#[test]
fn guessed_language_is_persisted() {
    let (service, store) = memory_service();
    let outcome = service
        .create_or_fetch(None, &submission("def f(): pass", None))
        .expect("create");
    let fields = store.hash_get_all(&paste_key(&outcome.id)).expect("fields");
    assert_eq!(fields.get("language").map(String::as_str), Some("python"));
}

#[test]
fn explicit_language_is_stored_as_given() {
    let (service, store) = memory_service();
    let outcome = service
        .create_or_fetch(
            None,
            &Submission {
                language: Some("rust".to_string()),
                ..submission("def f(): pass", None)
            },
        )
        .expect("create");
    let fields = store.hash_get_all(&paste_key(&outcome.id)).expect("fields");
    assert_eq!(fields.get("language").map(String::as_str), Some("rust"));
    assert_eq!(service.fetch_for_display(&outcome.id).lexer, "rust");
}

#[test]
fn never_expiring_paste_clears_previous_lifetime() {
    let (service, store) = memory_service();
    let first = service
        .create_or_fetch(None, &submission("keep me", Some(300)))
        .expect("create");
    let key = paste_key(&first.id);
    assert!(matches!(store.get_ttl(&key).expect("ttl"), KeyTtl::Expires(_)));

    service
        .create_or_fetch(None, &submission("keep me", Some(NEVER_EXPIRE)))
        .expect("resave forever");
    assert_eq!(store.get_ttl(&key).expect("ttl"), KeyTtl::Persistent);

    let view = service.fetch_for_display(&first.id);
    assert_eq!(view.selected_duration, NEVER_EXPIRE);
    assert_eq!(view.expires, Some(Ttl::Never));
    assert!(!view.temporary_choice_appended);
}

#[test]
fn long_remaining_lifetime_gets_one_off_choice() {
    let (service, store) = memory_service();
    let outcome = service
        .create_or_fetch(None, &submission("ancient", None))
        .expect("create");
    let ten_years = 10 * 365 * 24 * 60 * 60;
    store
        .set_expire(&paste_key(&outcome.id), ten_years)
        .expect("extend");

    let view = service.fetch_for_display(&outcome.id);
    assert!(view.temporary_choice_appended);
    assert_eq!(view.selected_duration, ten_years as i64);
    assert_eq!(
        view.durations.last().map(|c| c.label.as_str()),
        Some("10 years")
    );

    let other = service
        .create_or_fetch(None, &submission("fresh", Some(300)))
        .expect("create other");
    let other_view = service.fetch_for_display(&other.id);
    assert!(!other_view.temporary_choice_appended);
    assert_eq!(other_view.durations.len(), service.list_durations().len());
}

#[test]
fn unknown_or_malformed_ids_show_the_template() {
    let (service, _store) = memory_service();
    for id in [HELLO_ID, "nope", "../etc/passwd", ""] {
        let view = service.fetch_for_display(id);
        assert!(view.is_new, "id: {id}");
        assert_eq!(view.id, None);
        assert!(view.content.is_empty());
        assert_eq!(view.language, LANGUAGE_NONE);
    }
}

#[test]
fn template_preselects_default_lifetime() {
    let (service, _store) = memory_service();
    let view = service.new_paste_template();
    assert_eq!(
        view.selected_duration,
        service.expiry().default_ttl().as_selection()
    );
    assert_eq!(view.languages.first().map(|c| c.id.as_str()), Some(LANGUAGE_NONE));
}

#[test]
fn legacy_plain_records_are_displayed_and_upgraded() {
    let (service, store) = memory_service();
    store
        .set(&paste_key(HELLO_ID), b"hello")
        .expect("legacy write");

    let view = service.fetch_for_display(HELLO_ID);
    assert!(!view.is_new);
    assert_eq!(view.content, "hello");
    assert_eq!(view.lexer, PLAIN_TEXT_LEXER);
    assert_eq!(view.expires, Some(Ttl::Never));

    let outcome = service
        .create_or_fetch(None, &submission("hello", Some(3600)))
        .expect("upgrade");
    assert!(outcome.stored);
    let fields = store.hash_get_all(&paste_key(HELLO_ID)).expect("hash now");
    assert_eq!(fields.get("content").map(String::as_str), Some("hello"));
    assert_eq!(
        store.get_ttl(&paste_key(HELLO_ID)).expect("ttl"),
        KeyTtl::Expires(3600)
    );
}

#[test]
fn failed_upgrade_keeps_legacy_record() {
    let store = Arc::new(FlakyStore::default());
    let service = service_over(store.clone());
    store
        .inner
        .set(&paste_key(HELLO_ID), b"hello")
        .expect("legacy write");

    for flag in [&store.fail_writes, &store.fail_expiry] {
        flag.store(true, Ordering::SeqCst);
        let err = service
            .create_or_fetch(None, &submission("hello", Some(3600)))
            .expect_err("upgrade fails");
        assert!(err.is_storage(), "unexpected error: {err}");
        flag.store(false, Ordering::SeqCst);

        assert_eq!(
            store.inner.get(&paste_key(HELLO_ID)).expect("legacy read"),
            Some(b"hello".to_vec())
        );
    }
}

#[test]
fn invalid_submissions_report_every_field() {
    let (service, store) = memory_service();
    let err = service
        .create_or_fetch(None, &submission("   ", Some(42)))
        .expect_err("invalid");
    let errors = match err {
        AppError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    let fields: Vec<&str> = errors.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["content", "duration"]);
    assert!(!store.exists(&paste_key(HELLO_ID)).expect("exists"));
}

#[test]
fn write_failures_surface_as_storage_errors() {
    let store = Arc::new(FlakyStore::default());
    let service = service_over(store.clone());
    store.fail_writes.store(true, Ordering::SeqCst);

    let err = service
        .create_or_fetch(None, &submission("hello", None))
        .expect_err("write fails");
    assert!(err.is_storage(), "unexpected error: {err}");
}

#[test]
fn failed_expiry_leaves_no_record_behind() {
    let store = Arc::new(FlakyStore::default());
    let service = service_over(store.clone());
    store.fail_expiry.store(true, Ordering::SeqCst);

    let err = service
        .create_or_fetch(None, &submission("hello", Some(300)))
        .expect_err("expiry fails");
    assert!(err.is_storage(), "unexpected error: {err}");
    assert_eq!(
        store.inner.get_ttl(&paste_key(HELLO_ID)).expect("ttl"),
        KeyTtl::Missing
    );

    store.fail_expiry.store(false, Ordering::SeqCst);
    assert!(service.fetch_for_display(HELLO_ID).is_new);
}

#[test]
fn read_failures_count_as_absent() {
    let store = Arc::new(FlakyStore::default());
    let service = service_over(store.clone());
    service
        .create_or_fetch(None, &submission("hello", None))
        .expect("create");

    store.fail_reads.store(true, Ordering::SeqCst);
    assert!(service.fetch_for_display(HELLO_ID).is_new);
    let outcome = service
        .create_or_fetch(Some(HELLO_ID), &submission("hello", None))
        .expect("rewrite while reads fail");
    assert!(outcome.stored);
}

#[test]
fn preview_renders_without_storing() {
    let (service, store) = memory_service();
    let view = service
        .preview(&submission("def f(): pass", Some(300)))
        .expect("preview");
    assert!(view.is_new);
    assert_eq!(view.lexer, "python");
    assert!(view.markup.contains("<span"));
    assert_eq!(view.selected_duration, 300);
    let id = address_of("", "", b"def f(): pass");
    assert!(!store.exists(&paste_key(&id)).expect("exists"));
}

#[test]
fn redb_backed_service_round_trips() {
    let (store, _dir) = setup_temp_store();
    let service = service_over(Arc::new(store));
    let outcome = service
        .create_or_fetch(None, &submission("hello", Some(NEVER_EXPIRE)))
        .expect("create");
    let view = service.fetch_for_display(&outcome.id);
    assert_eq!(view.content, "hello");
    assert_eq!(view.selected_duration, NEVER_EXPIRE);
}
