mod helpers;

use std::sync::Arc;
use std::thread;

use hotpage::{Engine, ErrorKind, Map, Page, PageRenderer, RenderError, Reloader, Store, Value};

use crate::helpers::Writer;

fn setup() -> (PageRenderer, Reloader) {
    let engine = Arc::new(Engine::new());
    let store = Store::new();
    (
        PageRenderer::new(engine.clone(), store.clone()),
        Reloader::new(engine, store),
    )
}

fn stranger_page() -> Page {
    Page::new("/a", "a")
        .with_layout("b")
        .with_extra(Value::from([("name", "stranger")]))
}

#[test]
fn page_render_content_into_layout() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi, {{Extra.name}}!").unwrap();
    reloader.reload("b", "-{{{content}}}-").unwrap();

    let body = renderer.render(&stranger_page(), &Map::new()).unwrap();
    assert_eq!(body, b"-hi, stranger!-");
}

#[test]
fn page_render_without_layout() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi, {{Extra.name}}!").unwrap();

    let page = Page::new("/a", "a").with_extra(Value::from([("name", "stranger")]));
    let body = renderer.render(&page, &Map::new()).unwrap();
    assert_eq!(body, b"hi, stranger!");
}

#[test]
fn page_render_layout_sees_request_and_extra() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "{{ Params.id }}").unwrap();
    reloader
        .reload("b", "<title>{{ Extra.name }}</title>{{{ content }}}")
        .unwrap();

    let mut request = Map::new();
    request.insert("Params".into(), Value::from([("id", "42")]));
    let body = renderer.render(&stranger_page(), &request).unwrap();
    assert_eq!(body, b"<title>stranger</title>42");
}

#[test]
fn page_render_content_is_escaped_unless_triple() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "<p>").unwrap();
    reloader.reload("b", "{{ content }}|{{{ content }}}").unwrap();

    let body = renderer.render(&stranger_page(), &Map::new()).unwrap();
    assert_eq!(body, b"&lt;p&gt;|<p>");
}

#[test]
fn page_render_not_found_before_loaded() {
    let (renderer, reloader) = setup();
    reloader.reload("b", "-{{{content}}}-").unwrap();

    let err = renderer.render(&stranger_page(), &Map::new()).unwrap_err();
    assert!(matches!(&err, RenderError::NotFound { name } if name == "a"));
    assert_eq!(err.to_string(), "template `a` not found");
}

#[test]
fn page_render_layout_not_found() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi").unwrap();

    let err = renderer.render(&stranger_page(), &Map::new()).unwrap_err();
    assert!(matches!(&err, RenderError::NotFound { name } if name == "b"));
}

#[test]
fn page_render_failure() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "{{ Extra.missing }}").unwrap();
    reloader.reload("b", "-{{{content}}}-").unwrap();

    let err = renderer.render(&stranger_page(), &Map::new()).unwrap_err();
    match err {
        RenderError::RenderFailure { name, source } => {
            assert_eq!(name, "a");
            assert_eq!(source.kind(), ErrorKind::Render);
            assert_eq!(source.name(), Some("a"));
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn page_render_failed_reload_keeps_previous() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi, {{Extra.name}}!").unwrap();
    reloader.reload("b", "-{{{content}}}-").unwrap();

    let err = reloader
        .reload("a", "Hi {{ I'm template with errors.")
        .unwrap_err();
    assert!(err.is_syntax());

    let body = renderer.render(&stranger_page(), &Map::new()).unwrap();
    assert_eq!(body, b"-hi, stranger!-");
}

#[test]
fn page_render_successful_reload_takes_effect() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi, {{Extra.name}}!").unwrap();
    reloader.reload("b", "-{{{content}}}-").unwrap();
    reloader
        .reload("a", "Hi {{Extra.name}}, I'm updated.")
        .unwrap();

    let body = renderer.render(&stranger_page(), &Map::new()).unwrap();
    assert_eq!(body, b"-Hi stranger, I'm updated.-");
}

#[test]
fn page_render_concurrent_with_reloads() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "old {{Extra.name}}").unwrap();
    reloader.reload("b", "-{{{content}}}-").unwrap();

    let writer = {
        let reloader = reloader.clone();
        thread::spawn(move || {
            for i in 0..200 {
                let source = if i % 2 == 0 {
                    "new {{Extra.name}}"
                } else {
                    "old {{Extra.name}}"
                };
                reloader.reload("a", source).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let renderer = renderer.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let body = renderer.render(&stranger_page(), &Map::new()).unwrap();
                    assert!(
                        body == b"-old stranger-" || body == b"-new stranger-",
                        "unexpected body: {}",
                        String::from_utf8_lossy(&body)
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn page_render_partial_is_resolved_once_per_render() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "{{# Extra.items }}{{> p }}{{/ Extra.items }}").unwrap();
    reloader.reload("p", "x").unwrap();

    let items: Vec<Value> = (0..2000i64).map(Value::from).collect();
    let page = Page::new("/a", "a").with_extra(Value::from([("items", items)]));

    let writer = {
        let reloader = reloader.clone();
        thread::spawn(move || {
            for i in 0..2000 {
                let source = if i % 2 == 0 { "y" } else { "x" };
                reloader.reload("p", source).unwrap();
            }
        })
    };

    for _ in 0..200 {
        let body = renderer.render(&page, &Map::new()).unwrap();
        assert_eq!(body.len(), 2000);
        assert!(
            body.iter().all(|&b| b == b'x') || body.iter().all(|&b| b == b'y'),
            "render mixed partial versions"
        );
    }

    writer.join().unwrap();
}

#[test]
fn page_render_content_failure_before_layout_lookup() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "{{ Extra.missing }}").unwrap();

    let err = renderer.render(&stranger_page(), &Map::new()).unwrap_err();
    assert!(matches!(&err, RenderError::RenderFailure { name, .. } if name == "a"));
}

#[test]
fn page_render_to_writer() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi, {{Extra.name}}!").unwrap();
    reloader.reload("b", "-{{{content}}}-").unwrap();

    let mut w = Writer::new();
    renderer
        .render_to_writer(&stranger_page(), &Map::new(), &mut w)
        .unwrap();
    assert_eq!(w.into_string(), "-hi, stranger!-");
}

#[test]
fn page_render_to_writer_io_error() {
    let (renderer, reloader) = setup();
    reloader.reload("a", "hi").unwrap();

    let page = Page::new("/a", "a");
    let err = renderer
        .render_to_writer(&page, &Map::new(), Writer::with_max(0))
        .unwrap_err();
    match err {
        RenderError::RenderFailure { source, .. } => assert_eq!(source.kind(), ErrorKind::Io),
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn page_deserialize_original_field_names() {
    let page: Page = serde_json::from_str(
        r#"{"URLPattern": "/a", "Layout": "b", "Template": "a", "Extra": {"name": "stranger"}}"#,
    )
    .unwrap();
    assert_eq!(page, stranger_page());
}
