#![no_main]

use std::collections::BTreeMap;
use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
#[serde(untagged)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, Vec<(&str, &str)>, Value)| {
    let (root, partials, value) = data;
    let engine = hotpage::Engine::new();
    let store = hotpage::Store::new();
    let Ok(template) = engine.compile(root) else {
        return;
    };
    for (name, source) in partials {
        if let Ok(partial) = engine.compile(source) {
            store.set(name, Arc::new(partial));
        }
    }
    let _ = template
        .render(&engine, &value)
        .with_partials(&store)
        .to_string();
});
