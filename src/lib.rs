//! Hot reloadable HTML pages backed by a concurrent template store.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Escaped variables: `{{ user.name }}`
//! - Unescaped variables: `{{{ content }}}` or `{{& content }}`
//! - Sections: `{{# items }} ... {{/ items }}`
//! - Inverted sections: `{{^ items }} ... {{/ items }}`
//! - Partials: `{{> header }}`
//! - Comments: `{{! ignored }}`
//! - Configurable delimiters: `<? user.name ?>`
//!
//! ### Serving
//!
//! - A [`Store`] of compiled templates that many requests read while reloads
//!   replace entries underneath them
//! - A [`PageRenderer`] that composes a content template into a layout
//! - A [`Reloader`] that swaps in a new template source only if it compiles
//! - A [`Loader`] that populates the store in the background at startup
//!
//! # Getting started
//!
//! Your entry point for templates is the [`Engine`] struct. The engine stores
//! the syntax config and value formatters. Generally, you only need to
//! construct one engine during the lifetime of a program and share it.
//!
//! ```
//! let engine = hotpage::Engine::new();
//! let template = engine.compile("Hello {{ user.name }}!")?;
//! let result = template
//!     .render(&engine, hotpage::Value::from([(
//!         "user",
//!         hotpage::Value::from([("name", "John Smith")]),
//!     )]))
//!     .to_string()?;
//! assert_eq!(result, "Hello John Smith!");
//! # Ok::<(), hotpage::Error>(())
//! ```
//!
//! Compiled templates are published to a [`Store`] and rendered as pages
//! through a [`PageRenderer`].
//!
//! ```
//! use std::sync::Arc;
//! use hotpage::{Engine, Page, PageRenderer, Reloader, Store, Value};
//!
//! let engine = Arc::new(Engine::new());
//! let store = Store::new();
//! let reloader = Reloader::new(engine.clone(), store.clone());
//! reloader.reload("layout", "-{{{ content }}}-")?;
//! reloader.reload("a", "hi, {{ Extra.name }}!")?;
//!
//! let page = Page::new("/a", "a")
//!     .with_layout("layout")
//!     .with_extra(Value::from([("name", "stranger")]));
//! let renderer = PageRenderer::new(engine, store);
//! let body = renderer.render(&page, &Default::default()).unwrap();
//! assert_eq!(body, b"-hi, stranger!-");
//! # Ok::<(), hotpage::Error>(())
//! ```
//!
//! # Serialization
//!
//! Render contexts can be any [`serde::Serialize`] value, they are converted
//! into a [`Value`] using [`to_value`] before rendering.

mod compile;
mod config;
mod error;
pub mod fmt;
mod loader;
mod page;
mod reload;
mod render;
mod site;
mod store;
mod types;
mod value;

use std::fmt as std_fmt;

pub use crate::config::{Config, ConfigError};
pub use crate::error::{Error, ErrorKind};
pub use crate::loader::{LoadError, LoadReport, Loader};
pub use crate::page::{Page, PageRenderer, RenderError, CONTENT_KEY, EXTRA_KEY};
pub use crate::reload::{ReloadError, Reloader};
pub use crate::render::{Partials, Renderer};
pub use crate::site::{Response, Site, Status, DEFAULT_NOT_FOUND_BODY, PARAMS_KEY};
pub use crate::store::Store;
pub use crate::types::syntax::{Syntax, SyntaxBuilder};
pub use crate::value::{to_value, Map, Value};

/// The default maximum number of nested partials.
const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The compilation and rendering engine.
pub struct Engine {
    searcher: compile::Searcher,
    escape: Box<fmt::FormatFn>,
    raw: Box<fmt::FormatFn>,
    max_include_depth: usize,
}

/// A compiled template.
///
/// A template owns its source text and is immutable once compiled, stores
/// share it between renders as an `Arc<Template>`.
pub struct Template {
    template: types::program::Template,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Construct a new engine.
    #[inline]
    pub fn new() -> Self {
        Self::with_syntax(Syntax::default())
    }

    /// Construct a new engine with custom syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotpage::{Engine, Syntax};
    ///
    /// let syntax = Syntax::builder().tags("<?", "?>").build();
    /// let engine = Engine::with_syntax(syntax);
    /// ```
    #[inline]
    pub fn with_syntax(syntax: Syntax) -> Self {
        Self {
            searcher: compile::Searcher::new(syntax),
            escape: Box::new(fmt::escape_html),
            raw: Box::new(fmt::default),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Set the formatter used for `{{ var }}` tags.
    ///
    /// Defaults to [`fmt::escape_html`].
    #[inline]
    pub fn set_escape_formatter<F>(&mut self, f: F)
    where
        F: Fn(&mut fmt::Formatter<'_>, &Value) -> fmt::Result + Sync + Send + 'static,
    {
        self.escape = Box::new(f);
    }

    /// Set the formatter used for `{{{ var }}}` and `{{& var }}` tags.
    ///
    /// Defaults to [`fmt::default`].
    #[inline]
    pub fn set_raw_formatter<F>(&mut self, f: F)
    where
        F: Fn(&mut fmt::Formatter<'_>, &Value) -> fmt::Result + Sync + Send + 'static,
    {
        self.raw = Box::new(f);
    }

    /// Set the maximum number of nested partials, counted from the template
    /// being rendered.
    ///
    /// Defaults to 64.
    #[inline]
    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    /// Compile a template.
    ///
    /// The template source is owned by the returned template.
    #[inline]
    pub fn compile(&self, source: impl Into<String>) -> Result<Template> {
        let template = compile::template(self, source.into())?;
        Ok(Template { template })
    }
}

impl std_fmt::Debug for Engine {
    fn fmt(&self, f: &mut std_fmt::Formatter<'_>) -> std_fmt::Result {
        f.debug_struct("Engine")
            .field("max_include_depth", &self.max_include_depth)
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Render the template using the provided [`serde`] value.
    ///
    /// The returned [`Renderer`] can be used to attach partials and render to
    /// a string or writer.
    #[inline]
    pub fn render<'render, S>(&'render self, engine: &'render Engine, ctx: S) -> Renderer<'render>
    where
        S: serde::Serialize,
    {
        Renderer::with_serde(engine, &self.template, ctx)
    }

    /// Render the template using the provided value.
    #[inline]
    pub fn render_from<'render>(
        &'render self,
        engine: &'render Engine,
        ctx: &'render Value,
    ) -> Renderer<'render> {
        Renderer::with_value(engine, &self.template, ctx)
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &str {
        &self.template.source
    }
}

impl std_fmt::Debug for Template {
    fn fmt(&self, f: &mut std_fmt::Formatter<'_>) -> std_fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source())
            .finish_non_exhaustive()
    }
}
