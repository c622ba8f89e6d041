#![allow(clippy::wrong_self_convention)]

mod core;
mod stack;

use std::io;
use std::sync::Arc;

use crate::fmt::{Formatter, Writer};
use crate::render::core::RendererImpl;
use crate::render::stack::Stack;
use crate::types::program::Template;
use crate::{Engine, Error, Result, Value};

/// A source of partial templates for `{{> name }}` tags.
///
/// Each name is looked up at most once per render and the returned template
/// is reused for every later tag with that name, so a render never mixes two
/// versions of a partial.
pub trait Partials: Send + Sync {
    /// Returns the compiled template registered under `name`.
    fn get_partial(&self, name: &str) -> Option<Arc<crate::Template>>;
}

fn to_string(
    engine: &Engine,
    template: &Template,
    globals: &Value,
    partials: Option<&dyn Partials>,
    name: Option<&str>,
) -> Result<String> {
    let mut s = String::with_capacity(template.source.len());
    let mut f = Formatter::with_string(&mut s);
    RendererImpl {
        engine,
        partials,
        stack: Stack::new(globals),
    }
    .render(&mut f, template, name)?;
    Ok(s)
}

fn to_writer<W>(
    engine: &Engine,
    template: &Template,
    globals: &Value,
    partials: Option<&dyn Partials>,
    name: Option<&str>,
    writer: W,
) -> Result<()>
where
    W: io::Write,
{
    let mut w = Writer::new(writer);
    let mut f = Formatter::with_writer(&mut w);
    RendererImpl {
        engine,
        partials,
        stack: Stack::new(globals),
    }
    .render(&mut f, template, name)
    .map_err(|err| w.take_err().map(Error::from).unwrap_or(err))
}

/// A renderer that interprets a compiled [`Template`][crate::Template].
///
/// This struct is created by one of the following functions:
/// - [`Template::render`][crate::Template::render]
/// - [`Template::render_from`][crate::Template::render_from]
#[must_use = "must call `.to_string()` or `.to_writer(..)` on the renderer"]
pub struct Renderer<'render> {
    engine: &'render Engine,
    template: &'render Template,
    globals: Globals<'render>,
    partials: Option<&'render dyn Partials>,
    name: Option<&'render str>,
}

enum Globals<'render> {
    Owned(Result<Value>),
    Borrowed(&'render Value),
}

impl<'render> Renderer<'render> {
    fn new(engine: &'render Engine, template: &'render Template, globals: Globals<'render>) -> Self {
        Self {
            engine,
            template,
            globals,
            partials: None,
            name: None,
        }
    }

    pub(crate) fn with_serde<S>(engine: &'render Engine, template: &'render Template, globals: S) -> Self
    where
        S: serde::Serialize,
    {
        Self::new(engine, template, Globals::Owned(crate::to_value(globals)))
    }

    pub(crate) fn with_value(
        engine: &'render Engine,
        template: &'render Template,
        globals: &'render Value,
    ) -> Self {
        Self::new(engine, template, Globals::Borrowed(globals))
    }

    /// Resolve `{{> name }}` tags using the given source.
    ///
    /// Without a partial source every partial tag fails to render.
    pub fn with_partials(mut self, partials: &'render dyn Partials) -> Self {
        self.partials = Some(partials);
        self
    }

    /// Set the name of the template, used in error messages.
    pub fn with_name(mut self, name: &'render str) -> Self {
        self.name = Some(name);
        self
    }

    /// Render the template to a string.
    pub fn to_string(self) -> Result<String> {
        match self.globals {
            Globals::Owned(result) => {
                let value = result?;
                to_string(self.engine, self.template, &value, self.partials, self.name)
            }
            Globals::Borrowed(value) => {
                to_string(self.engine, self.template, value, self.partials, self.name)
            }
        }
    }

    /// Render the template to the given writer.
    pub fn to_writer<W>(self, w: W) -> Result<()>
    where
        W: io::Write,
    {
        match self.globals {
            Globals::Owned(result) => {
                let value = result?;
                to_writer(self.engine, self.template, &value, self.partials, self.name, w)
            }
            Globals::Borrowed(value) => {
                to_writer(self.engine, self.template, value, self.partials, self.name, w)
            }
        }
    }
}
