//! AST representing a template.

use crate::types::span::Span;

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Template {
    pub scope: Scope,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Scope {
    pub stmts: Vec<Stmt>,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub enum Stmt {
    Raw(Span),
    Emit(Emit),
    Section(Section),
    Partial(Partial),
}

/// A variable tag, e.g. `{{ user.name }}` or `{{{ content }}}`.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Emit {
    pub var: Var,
    pub escape: bool,
}

/// A section `{{# var }} ... {{/ var }}` or an inverted section
/// `{{^ var }} ... {{/ var }}`.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Section {
    pub inverted: bool,
    pub var: Var,
    pub body: Scope,
}

/// A partial, e.g. `{{> header }}`.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Partial {
    pub name: Name,
}

/// The name of another template.
#[derive(Clone, Copy)]
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Name {
    pub span: Span,
}

/// A path into the context.
///
/// An empty path is the implicit iterator `.` which refers to the current
/// scope itself.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Var {
    pub path: Vec<Key>,
    pub span: Span,
}

#[derive(Clone, Copy)]
#[cfg_attr(internal_debug, derive(Debug))]
pub enum Key {
    List(Index),
    Map(Ident),
}

#[derive(Clone, Copy)]
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Index {
    pub value: usize,
    pub span: Span,
}

#[derive(Clone, Copy)]
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Ident {
    pub span: Span,
}

impl Scope {
    pub const fn new() -> Self {
        Self { stmts: Vec::new() }
    }
}

impl Key {
    pub const fn span(&self) -> Span {
        match self {
            Key::List(key) => key.span,
            Key::Map(key) => key.span,
        }
    }
}
