use super::*;
use crate::code::message::{ResourceId, StringTable};
use crate::code::{ErrorCodeBuilder, ErrorCodeExt, Identifier};
use crate::config::{ConfigBuilder, DefaultConfig, UNKNOWN_ERROR};
use std::io;

fn code(short: &str, message: Option<&str>, fallback: bool) -> Code {
    let mut builder = ErrorCodeBuilder::new()
        .id_pair(short, format!("{short}.Test"))
        .fallback(fallback);
    if let Some(message) = message {
        builder = builder.message(message);
    }
    builder.build_with(&DefaultConfig).unwrap()
}

fn io_error(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message.to_string())
}

#[test]
fn test_custom_error_renders_its_message() {
    let err = Error::custom(code("NE", Some("No connection"), false));
    assert_eq!(err.text_with(&(), &DefaultConfig), "No connection");
    assert_eq!(err.id_with(&DefaultConfig), "NE");
    assert_eq!(err.log_with(&DefaultConfig), "No connection");
}

#[test]
fn test_no_error_renders_empty_text() {
    let config = ConfigBuilder::new().debug(true).add_error_id(true).build();
    assert_eq!(Error::NoError.text_with(&(), &config), "");
    assert!(Error::NoError.into_option().is_none());
    assert!(Error::UnknownError.into_option().is_some());
}

#[test]
fn test_unknown_error_falls_back_to_configured_text() {
    assert_eq!(Error::UnknownError.text_with(&(), &DefaultConfig), UNKNOWN_ERROR);
    let config = ConfigBuilder::new()
        .unknown_error(|_, _| "Something broke".to_string())
        .build();
    assert_eq!(Error::UnknownError.text_with(&(), &config), "Something broke");
}

#[test]
fn test_child_message_truth_table() {
    // (outer message, outer fallback, inner message, inner fallback, expected)
    let rows: [(Option<&str>, bool, Option<&str>, bool, Option<&str>); 10] = [
        (Some("outer"), false, Some("inner"), false, Some("inner")),
        (Some("outer"), true, Some("inner"), false, Some("inner")),
        (Some("outer"), false, Some("inner"), true, Some("outer")),
        (Some("outer"), true, Some("inner"), true, Some("outer")),
        (Some("outer"), false, None, false, Some("outer")),
        (Some("outer"), false, None, true, Some("outer")),
        (None, false, Some("inner"), false, Some("inner")),
        (None, false, Some("inner"), true, Some("inner")),
        (None, true, None, false, None),
        (Some("  "), false, Some("inner"), true, Some("inner")),
    ];
    for (outer, outer_fallback, inner, inner_fallback, expected) in rows {
        let cause = Error::custom(code("I", inner, inner_fallback));
        let err = Error::child(code("O", outer, outer_fallback), cause);
        assert_eq!(
            err.message_with(&()).as_deref(),
            expected,
            "outer={outer:?}/{outer_fallback} inner={inner:?}/{inner_fallback}"
        );
    }
}

#[test]
fn test_fallback_flag_propagates_through_chain() {
    // The middle link wins over a fallback root, and carries its own flag up.
    let root = Error::custom(code("R", Some("root"), true));
    let middle = Error::child(code("M", Some("middle"), true), root);
    let outer = Error::child(code("O", Some("outer"), false), middle);
    assert_eq!(outer.message_with(&()).as_deref(), Some("outer"));

    let root = Error::custom(code("R", Some("root"), false));
    let middle = Error::child(code("M", None, false), root);
    let outer = Error::child(code("O", Some("outer"), false), middle);
    assert_eq!(outer.message_with(&()).as_deref(), Some("root"));
}

#[test]
fn test_foreign_cause_has_no_message() {
    let err = Error::wrap(io_error("socket closed"), code("NE", Some("Offline"), true));
    assert_eq!(err.text_with(&(), &DefaultConfig), "Offline");
}

#[test]
fn test_child_ids_concatenate() {
    let root = Error::custom(code("IO", Some("disk"), false));
    let err = Error::child(code("NE3", None, false), root);
    assert_eq!(err.id_with(&DefaultConfig), "NE3-IO");

    let foreign = Error::wrap(io_error("gone"), code("NE3", None, false));
    assert_eq!(foreign.id_with(&DefaultConfig), "NE3-E");
}

#[test]
fn test_cast_wraps_foreign_errors_once() {
    let err = Error::cast(io_error("permission denied"));
    assert!(matches!(err, Error::Unexpected { .. }));
    assert_eq!(err.id_with(&DefaultConfig), "E");
    assert_eq!(err.log_with(&DefaultConfig), "permission denied");
    assert_eq!(err.message_with(&()), None);

    let again = Error::cast(err.clone());
    assert!(matches!(again, Error::Unexpected { .. }));
    assert_eq!(again.chain().count(), 2);
}

#[test]
fn test_materialize_is_idempotent() {
    let err = Error::materialize(io_error("bad header"));
    assert!(matches!(err, Error::Materialized { .. }));
    let again = Error::materialize(err);
    assert!(matches!(again, Error::Materialized { .. }));

    let custom = Error::custom(code("C", None, false));
    assert!(matches!(Error::materialize(custom), Error::Custom { .. }));
}

#[test]
fn test_boxed_errors_are_classified() {
    let boxed: Box<dyn StdError + Send + Sync> = Box::new(Error::custom(code("C", None, false)));
    assert!(matches!(Error::cast_boxed(boxed), Error::Custom { .. }));

    let boxed: Box<dyn StdError + Send + Sync> = "plain failure".into();
    let err = Error::cast_boxed(boxed);
    assert!(matches!(err, Error::Unexpected { .. }));
    assert_eq!(err.log_with(&DefaultConfig), "plain failure");
}

#[test]
fn test_wrap_always_produces_child() {
    let inner = Error::custom(code("I", None, false));
    let err = Error::wrap(inner, code("O", None, false));
    assert!(matches!(err, Error::Child { cause: Cause::Error(_), .. }));

    let err = Error::wrap(io_error("eof"), code("O", None, false));
    assert!(matches!(err, Error::Child { cause: Cause::Foreign(_), .. }));
}

#[test]
fn test_debug_mode_shows_original_message() {
    let err = Error::wrap(io_error("connection reset by peer"), code("NE", None, false));
    let debug = ConfigBuilder::new().debug(true).build();
    assert_eq!(err.text_with(&(), &debug), "connection reset by peer");
    assert_eq!(err.text_with(&(), &DefaultConfig), UNKNOWN_ERROR);
}

#[test]
fn test_error_id_annotation() {
    let err = Error::wrap(io_error("eof"), code("NE", Some("Offline"), false));
    let config = ConfigBuilder::new().add_error_id(true).build();
    assert_eq!(err.text_with(&(), &config), "NE-E:\nOffline");
}

#[test]
fn test_unknown_error_receives_root_cause() {
    let root = io_error("disk quota exceeded");
    let err = Error::child(code("S", None, false), Error::wrap(root, code("W", None, false)));
    let config = ConfigBuilder::new()
        .unknown_error(|_, root| {
            root.and_then(Link::as_foreign)
                .map(|foreign| format!("failed: {}", foreign.class_name()))
                .unwrap_or_default()
        })
        .build();
    assert_eq!(err.text_with(&(), &config), "failed: Error");
}

#[test]
fn test_resolver_drives_key_messages() {
    let key = ResourceId(21);
    let table = StringTable::new().with(key, "Please sign in again");
    let err = Error::custom((Identifier::new("A", "Auth"), key));
    assert_eq!(err.text_with(&table, &DefaultConfig), "Please sign in again");
    assert_eq!(err.text_with(&(), &DefaultConfig), UNKNOWN_ERROR);
}

#[test]
fn test_chain_queries_include_self() {
    let err = Error::child(
        code("O", None, false),
        Error::wrap(io_error("eof"), code("M", None, false)),
    );
    assert_eq!(err.chain().count(), 3);
    assert!(err.has_code(|c| c.id(&DefaultConfig).short() == "O"));
    assert!(err.has_code(|c| c.id(&DefaultConfig).short() == "M"));
    assert!(!err.has_code(|c| c.id(&DefaultConfig).short() == "X"));
    assert!(err.has_cause(|link| link.as_error().is_some_and(|e| e.kind() == "Child")));
    assert!(err.has_cause(|link| {
        link.as_foreign()
            .and_then(|f| f.downcast_ref::<io::Error>())
            .is_some()
    }));
    assert!(matches!(err.root_cause(), Some(Link::Foreign(_))));
}

#[test]
fn test_original_is_deepest_foreign_message() {
    let err = Error::child(
        code("O", None, false),
        Error::wrap(io_error("deep"), code("M", None, false)),
    );
    assert_eq!(err.original().as_deref(), Some("deep"));
    assert_eq!(Error::custom(code("C", None, false)).original(), None);
}

#[test]
fn test_source_follows_chain() {
    let err = Error::wrap(io_error("eof"), code("O", None, false));
    let source = err.source().map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("eof"));
    assert!(Error::NoError.source().is_none());
}

#[test]
fn test_stack_lists_every_link() {
    let err = Error::wrap(io_error("eof"), code("O", Some("Outer"), false));
    let stack = err.stack_with(&DefaultConfig);
    let lines: Vec<&str> = stack.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Child O (O.Test): Outer");
    assert!(lines[1].starts_with("caused by: Error ["));
    assert!(lines[1].ends_with("]: eof"));
}

#[test]
fn test_fallback_wrapper_on_outer_code() {
    let specific = Error::custom(code("S", Some("Quota exceeded"), false));
    let generic = code("G", Some("Something went wrong"), false).as_fallback();
    let err = Error::child(generic, specific);
    assert_eq!(err.text_with(&(), &DefaultConfig), "Quota exceeded");
}

#[test]
fn test_wrap_with_builder() {
    let builder = ErrorCodeBuilder::new()
        .id_pair("DE", "DiskError")
        .message("Disk unavailable");
    let err = Error::wrap_with(io_error("EIO"), builder).unwrap();
    assert!(matches!(err, Error::Child { .. }));
    assert_eq!(err.id_with(&DefaultConfig), "DE-E");
    assert_eq!(err.text_with(&(), &DefaultConfig), "Disk unavailable");
    assert_eq!(err.original().as_deref(), Some("EIO"));
}

#[test]
fn test_wrap_with_builder_without_identifier() {
    let builder = ErrorCodeBuilder::new().message("Disk unavailable");
    assert!(matches!(
        Error::wrap_with(io_error("EIO"), builder),
        Err(BuildError::MissingIdentifier)
    ));
}
