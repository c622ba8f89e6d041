mod helpers;

use std::fmt::Write as _;
use std::sync::Arc;

use hotpage::{fmt, Engine, ErrorKind, Store, Value};
use serde::Serialize;

use crate::helpers::Writer;

#[test]
fn render_emit_bool() {
    let engine = Engine::new();
    let result = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", true)]))
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem true");
}

#[test]
fn render_emit_integer() {
    let engine = Engine::new();
    let result = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", 123_i64)]))
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem 123");
}

#[test]
fn render_emit_float() {
    let engine = Engine::new();
    let result = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", 123.4_f64)]))
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem 123.4");
}

#[test]
fn render_emit_none() {
    let engine = Engine::new();
    let result = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", ())]))
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem ");
}

#[test]
fn render_emit_escapes_html() {
    let engine = Engine::new();
    let result = engine
        .compile("{{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", r#"<a href="x">&'"#)]))
        .to_string()
        .unwrap();
    assert_eq!(result, "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
}

#[test]
fn render_emit_unescaped() {
    let engine = Engine::new();
    let result = engine
        .compile("{{{ ipsum }}} {{& ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", "<b>")]))
        .to_string()
        .unwrap();
    assert_eq!(result, "<b> <b>");
}

#[test]
fn render_emit_map_index() {
    let engine = Engine::new();
    let ctx = Value::from([("ipsum", Value::from([("dolor", "sit")]))]);
    let result = engine
        .compile("lorem {{ ipsum.dolor }}")
        .unwrap()
        .render_from(&engine, &ctx)
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem sit");
}

#[test]
fn render_emit_list_index() {
    let engine = Engine::new();
    let ctx = Value::from([("ipsum", vec!["dolor", "sit"])]);
    let result = engine
        .compile("lorem {{ ipsum.1 }}")
        .unwrap()
        .render_from(&engine, &ctx)
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem sit");
}

#[test]
fn render_emit_err_not_found_in_scope() {
    let engine = Engine::new();
    let err = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::Map(Default::default()))
        .to_string()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(
        format!("{err:#}"),
        "failed to render
  --> <anonymous>:1:10
   |
 1 | lorem {{ ipsum }}
   |          ^^^^^
   |
   = reason: not found in this scope
"
    );
}

#[test]
fn render_emit_err_with_name() {
    let engine = Engine::new();
    let err = engine
        .compile("lorem {{ ipsum.dolor }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", 1)]))
        .with_name("hello")
        .to_string()
        .unwrap_err();
    assert_eq!(err.name(), Some("hello"));
    assert_eq!(err.to_string(), "failed to render: cannot index into integer");
    assert!(format!("{err:#}").contains("--> hello:1:16"));
}

#[test]
fn render_emit_err_unformattable() {
    let engine = Engine::new();
    let err = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", vec![1, 2])]))
        .to_string()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(
        err.to_string(),
        "failed to format: expression evaluated to unformattable type list"
    );
}

#[test]
fn render_section_list() {
    let engine = Engine::new();
    let ctx = Value::from([("items", vec!["a", "b", "c"])]);
    let result = engine
        .compile("{{# items }}[{{ . }}]{{/ items }}")
        .unwrap()
        .render_from(&engine, &ctx)
        .to_string()
        .unwrap();
    assert_eq!(result, "[a][b][c]");
}

#[test]
fn render_section_list_of_maps_with_outer_scope() {
    let engine = Engine::new();
    let ctx = Value::from([
        ("sep", Value::from(", ")),
        (
            "users",
            Value::from(vec![
                Value::from([("name", "John")]),
                Value::from([("name", "Jane")]),
            ]),
        ),
    ]);
    let result = engine
        .compile("{{# users }}{{ name }}{{ sep }}{{/ users }}")
        .unwrap()
        .render_from(&engine, &ctx)
        .to_string()
        .unwrap();
    assert_eq!(result, "John, Jane, ");
}

#[test]
fn render_section_map_pushes_scope() {
    let engine = Engine::new();
    let ctx = Value::from([("user", Value::from([("name", "John")]))]);
    let result = engine
        .compile("{{# user }}Hello {{ name }}!{{/ user }}")
        .unwrap()
        .render_from(&engine, &ctx)
        .to_string()
        .unwrap();
    assert_eq!(result, "Hello John!");
}

#[test]
fn render_section_falsy_values_are_skipped() {
    let engine = Engine::new();
    let template = engine.compile("a{{# x }}b{{/ x }}c").unwrap();
    for x in [
        Value::None,
        Value::from(false),
        Value::from(""),
        Value::List(Vec::new()),
    ] {
        let ctx = Value::from([("x", x)]);
        let result = template.render_from(&engine, &ctx).to_string().unwrap();
        assert_eq!(result, "ac");
    }
}

#[test]
fn render_section_missing_is_falsy() {
    let engine = Engine::new();
    let result = engine
        .compile("a{{# x.y }}b{{/ x.y }}{{^ x.y }}c{{/ x.y }}")
        .unwrap()
        .render(&engine, Value::Map(Default::default()))
        .to_string()
        .unwrap();
    assert_eq!(result, "ac");
}

#[test]
fn render_inverted_section() {
    let engine = Engine::new();
    let template = engine
        .compile("{{^ items }}none{{/ items }}{{# items }}{{ . }}{{/ items }}")
        .unwrap();
    let empty = Value::from([("items", Vec::<Value>::new())]);
    let full = Value::from([("items", vec![1, 2])]);
    assert_eq!(template.render_from(&engine, &empty).to_string().unwrap(), "none");
    assert_eq!(template.render_from(&engine, &full).to_string().unwrap(), "12");
}

#[test]
fn render_nested_sections() {
    let engine = Engine::new();
    let ctx = Value::from([(
        "rows",
        Value::from(vec![vec![1, 2], vec![3]]),
    )]);
    let result = engine
        .compile("{{# rows }}({{# . }}{{ . }}{{/ . }}){{/ rows }}")
        .unwrap()
        .render_from(&engine, &ctx)
        .to_string()
        .unwrap();
    assert_eq!(result, "(12)(3)");
}

#[test]
fn render_comment() {
    let engine = Engine::new();
    let result = engine
        .compile("lorem {{! ipsum }}dolor")
        .unwrap()
        .render(&engine, ())
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem dolor");
}

#[test]
fn render_serde_struct() {
    #[derive(Serialize)]
    struct User {
        name: String,
        admin: bool,
    }

    let engine = Engine::new();
    let result = engine
        .compile("{{# admin }}[admin] {{/ admin }}{{ name }}")
        .unwrap()
        .render(
            &engine,
            User {
                name: "John".into(),
                admin: true,
            },
        )
        .to_string()
        .unwrap();
    assert_eq!(result, "[admin] John");
}

#[test]
fn render_partial() {
    let engine = Engine::new();
    let store = Store::new();
    store.set(
        "header",
        Arc::new(engine.compile("<h1>{{ title }}</h1>").unwrap()),
    );
    let result = engine
        .compile("{{> header }}body")
        .unwrap()
        .render(&engine, Value::from([("title", "T")]))
        .with_partials(&store)
        .to_string()
        .unwrap();
    assert_eq!(result, "<h1>T</h1>body");
}

#[test]
fn render_partial_sees_section_scope() {
    let engine = Engine::new();
    let store = Store::new();
    store.set("item", Arc::new(engine.compile("<li>{{ . }}</li>").unwrap()));
    let result = engine
        .compile("{{# items }}{{> item }}{{/ items }}")
        .unwrap()
        .render(&engine, Value::from([("items", vec!["a", "b"])]))
        .with_partials(&store)
        .to_string()
        .unwrap();
    assert_eq!(result, "<li>a</li><li>b</li>");
}

#[test]
fn render_partial_err_unknown() {
    let engine = Engine::new();
    let err = engine
        .compile("lorem {{> header }}")
        .unwrap()
        .render(&engine, ())
        .with_partials(&Store::new())
        .to_string()
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to render: unknown partial");
}

#[test]
fn render_partial_err_has_partial_name() {
    let engine = Engine::new();
    let store = Store::new();
    store.set("bad", Arc::new(engine.compile("{{ missing }}").unwrap()));
    let err = engine
        .compile("{{> bad }}")
        .unwrap()
        .render(&engine, Value::Map(Default::default()))
        .with_partials(&store)
        .with_name("root")
        .to_string()
        .unwrap_err();
    assert_eq!(err.name(), Some("bad"));
}

#[test]
fn render_partial_err_max_include_depth() {
    let engine = Engine::new();
    let store = Store::new();
    store.set("loop", Arc::new(engine.compile("x{{> loop }}").unwrap()));
    let err = store
        .get("loop")
        .unwrap()
        .render(&engine, ())
        .with_partials(&store)
        .to_string()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MaxIncludeDepth);
    assert_eq!(
        err.to_string(),
        "maximum partial depth exceeded: reached the maximum partial depth (64), this could be due to a recursive partial"
    );
}

#[test]
fn render_partial_custom_max_include_depth() {
    let mut engine = Engine::new();
    engine.set_max_include_depth(2);
    let store = Store::new();
    store.set("a", Arc::new(engine.compile("a{{> b }}").unwrap()));
    store.set("b", Arc::new(engine.compile("b").unwrap()));
    let template = engine.compile("{{> a }}").unwrap();
    let err = template
        .render(&engine, ())
        .with_partials(&store)
        .to_string()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MaxIncludeDepth);
    let result = store
        .get("a")
        .unwrap()
        .render(&engine, ())
        .with_partials(&store)
        .to_string()
        .unwrap();
    assert_eq!(result, "ab");
}

#[test]
fn render_custom_escape_formatter() {
    let mut engine = Engine::new();
    engine.set_escape_formatter(|f: &mut fmt::Formatter<'_>, v: &Value| -> fmt::Result {
        match v {
            Value::String(s) => {
                f.write_str(&s.to_uppercase())?;
                Ok(())
            }
            v => fmt::default(f, v),
        }
    });
    let result = engine
        .compile("{{ a }} {{{ a }}}")
        .unwrap()
        .render(&engine, Value::from([("a", "<x>")]))
        .to_string()
        .unwrap();
    assert_eq!(result, "<X> <x>");
}

#[test]
fn render_formatter_error_message() {
    let mut engine = Engine::new();
    engine.set_escape_formatter(|f: &mut fmt::Formatter<'_>, v: &Value| -> fmt::Result {
        match v {
            Value::None => Err(fmt::Error::from("unable to format None")),
            v => fmt::escape_html(f, v),
        }
    });
    let err = engine
        .compile("{{ a }}")
        .unwrap()
        .render(&engine, Value::from([("a", ())]))
        .to_string()
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to format: unable to format None");
}

#[test]
fn render_to_writer() {
    let engine = Engine::new();
    let mut w = Writer::new();
    engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", "dolor")]))
        .to_writer(&mut w)
        .unwrap();
    assert_eq!(w.into_string(), "lorem dolor");
}

#[test]
fn render_to_writer_err_io() {
    let engine = Engine::new();
    let mut w = Writer::with_max(1);
    let err = engine
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(&engine, Value::from([("ipsum", "dolor")]))
        .to_writer(&mut w)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
