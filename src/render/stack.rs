use crate::types::ast;
use crate::{Error, Result, Value};

/// The context stack.
///
/// The bottom of the stack is the render context, every open section pushes
/// the value it is currently iterating over. Variables are resolved by
/// finding the first key of the path in the nearest scope that has it.
#[cfg_attr(test, derive(Debug))]
pub struct Stack<'render> {
    stack: Vec<State<'render>>,
}

#[cfg_attr(test, derive(Debug))]
pub enum State<'render> {
    /// An entire scope of variables
    Scope(&'render Value),

    /// The current state of a section
    Section(SectionState<'render>),
}

#[cfg_attr(test, derive(Debug))]
pub struct SectionState<'render> {
    /// The list being iterated, `None` if the section value is not a list
    list: Option<&'render [Value]>,
    /// The index of the current item
    index: usize,
    /// The current item
    current: &'render Value,
}

impl<'render> Stack<'render> {
    pub fn new(globals: &'render Value) -> Self {
        Self {
            stack: vec![State::Scope(globals)],
        }
    }

    /// Start a section over the given truthy value.
    ///
    /// A list pushes its first item, any other value pushes itself.
    pub fn push_section(&mut self, value: &'render Value) {
        let state = match value {
            Value::List(list) => SectionState {
                list: Some(list.as_slice()),
                index: 0,
                current: list.first().unwrap_or(value),
            },
            _ => SectionState {
                list: None,
                index: 0,
                current: value,
            },
        };
        self.stack.push(State::Section(state));
    }

    /// Advance the innermost section.
    ///
    /// Returns `true` if there is another item to render, otherwise the
    /// section is removed from the stack and `false` is returned.
    pub fn next_section(&mut self) -> bool {
        if let Some(State::Section(section)) = self.stack.last_mut() {
            if let Some(list) = section.list {
                if let Some(next) = list.get(section.index + 1) {
                    section.index += 1;
                    section.current = next;
                    return true;
                }
            }
            self.stack.pop();
        }
        false
    }

    /// Resolves a variable, failing if any part of the path is missing.
    pub fn lookup(&self, source: &str, var: &ast::Var) -> Result<&'render Value> {
        let Some((first, rest)) = var.path.split_first() else {
            return Ok(self.current());
        };
        let value = self.resolve_first(source, first).ok_or_else(|| {
            Error::render("not found in this scope", source, first.span())
        })?;
        rest.iter().try_fold(value, |v, key| index(source, v, key))
    }

    /// Resolves a variable, returning `None` if any part of the path is
    /// missing.
    pub fn lookup_maybe(&self, source: &str, var: &ast::Var) -> Option<&'render Value> {
        let Some((first, rest)) = var.path.split_first() else {
            return Some(self.current());
        };
        let value = self.resolve_first(source, first)?;
        rest.iter()
            .try_fold(value, |v, key| index(source, v, key).ok())
    }

    /// Returns the innermost scope value, the target of `{{ . }}`.
    fn current(&self) -> &'render Value {
        match self.stack.last() {
            Some(state) => state.value(),
            None => &Value::None,
        }
    }

    fn resolve_first(&self, source: &str, key: &ast::Key) -> Option<&'render Value> {
        self.stack
            .iter()
            .rev()
            .find_map(|state| index(source, state.value(), key).ok())
    }
}

impl<'render> State<'render> {
    fn value(&self) -> &'render Value {
        match self {
            State::Scope(value) => value,
            State::Section(section) => section.current,
        }
    }
}

/// Index into the value with the given path segment.
pub fn index<'render>(
    source: &str,
    value: &'render Value,
    key: &ast::Key,
) -> Result<&'render Value> {
    let span = key.span();
    match (value, key) {
        (Value::List(list), ast::Key::List(ast::Index { value: i, .. })) => list
            .get(*i)
            .ok_or_else(|| Error::render("index out of bounds", source, span)),
        (Value::List(_), ast::Key::Map(_)) => {
            Err(Error::render("cannot index list with string", source, span))
        }
        (Value::Map(map), _) => map
            .get(&source[span])
            .ok_or_else(|| Error::render("not found in map", source, span)),
        (value, _) => Err(Error::render(
            format!("cannot index into {}", value.human()),
            source,
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::span::Span;

    fn var(source: &str) -> ast::Var {
        let mut path = Vec::new();
        let mut m = 0;
        for segment in source.split('.') {
            let span = Span::from(m..m + segment.len());
            let key = match segment.parse() {
                Ok(value) => ast::Key::List(ast::Index { value, span }),
                Err(_) => ast::Key::Map(ast::Ident { span }),
            };
            path.push(key);
            m += segment.len() + 1;
        }
        ast::Var {
            path,
            span: Span::from(0..source.len()),
        }
    }

    #[test]
    fn stack_lookup_nested() {
        let ctx = Value::from([("Extra", Value::from([("name", "stranger")]))]);
        let stack = Stack::new(&ctx);
        let source = "Extra.name";
        assert_eq!(
            stack.lookup(source, &var(source)).unwrap(),
            &Value::from("stranger")
        );
    }

    #[test]
    fn stack_lookup_missing() {
        let ctx = Value::from([("Extra", Value::from([("name", "stranger")]))]);
        let stack = Stack::new(&ctx);
        let source = "Extra.age";
        let err = stack.lookup(source, &var(source)).unwrap_err();
        assert_eq!(err.to_string(), "failed to render: not found in map");
        assert!(stack.lookup_maybe(source, &var(source)).is_none());
    }

    #[test]
    fn stack_lookup_walks_outward() {
        let items = Value::from(vec![Value::from([("id", 1)]), Value::from([("id", 2)])]);
        let ctx = Value::from([("items", items), ("title", Value::from("t"))]);
        let mut stack = Stack::new(&ctx);
        stack.push_section(ctx.get("items").unwrap());
        assert_eq!(stack.lookup("id", &var("id")).unwrap(), &Value::from(1));
        assert_eq!(stack.lookup("title", &var("title")).unwrap(), &Value::from("t"));
        assert!(stack.next_section());
        assert_eq!(stack.lookup("id", &var("id")).unwrap(), &Value::from(2));
        assert!(!stack.next_section());
        assert!(stack.lookup("id", &var("id")).is_err());
    }
}
