mod helpers;

use std::sync::Arc;

use hotpage::{Engine, ReloadError, Reloader, Store};

use crate::helpers::{init_tracing, template_dir};

fn setup() -> (Reloader, Store) {
    init_tracing();
    let store = Store::new();
    (Reloader::new(Arc::new(Engine::new()), store.clone()), store)
}

#[test]
fn reload_publishes_new_template() {
    let (reloader, store) = setup();
    reloader.reload("a", "one").unwrap();
    reloader.reload("a", "two").unwrap();
    assert_eq!(store.get("a").unwrap().source(), "two");
}

#[test]
fn reload_syntax_error_keeps_previous() {
    let (reloader, store) = setup();
    reloader.reload("a", "hi, {{Extra.name}}!").unwrap();
    let before = store.get("a").unwrap();

    let err = reloader
        .reload("a", "Hi {{ I'm template with errors.")
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid syntax: unexpected character");

    let after = store.get("a").unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn reload_syntax_error_on_new_name_publishes_nothing() {
    let (reloader, store) = setup();
    assert!(reloader.reload("a", "{{# a }}").is_err());
    assert!(!store.contains("a"));
}

#[tokio::test]
async fn reload_from_path() {
    let (reloader, store) = setup();
    let (_dir, paths) = template_dir(&[("a.html", "from {{ file }}")]);
    reloader.reload_from_path("a", &paths[0]).await.unwrap();
    assert_eq!(store.get("a").unwrap().source(), "from {{ file }}");
}

#[tokio::test]
async fn reload_from_path_missing_file() {
    let (reloader, store) = setup();
    let (dir, _) = template_dir(&[]);
    let err = reloader
        .reload_from_path("a", dir.path().join("missing.html"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReloadError::Read { .. }));
    assert!(store.get("a").is_none());
}

#[tokio::test]
async fn reload_from_path_compile_error() {
    let (reloader, store) = setup();
    reloader.reload("a", "ok").unwrap();
    let (_dir, paths) = template_dir(&[("a.html", "{{/ a }}")]);
    let err = reloader.reload_from_path("a", &paths[0]).await.unwrap_err();
    match err {
        ReloadError::Compile(err) => assert!(err.is_syntax()),
        err => panic!("unexpected error: {err}"),
    }
    assert_eq!(store.get("a").unwrap().source(), "ok");
}
