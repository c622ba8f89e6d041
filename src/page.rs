//! Composing content templates into layouts.

use std::io;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::value::Map;
use crate::{Engine, Error, Store, Template, Value};

/// The context key that holds the page's extra data.
pub const EXTRA_KEY: &str = "Extra";

/// The context key that holds the rendered content when rendering a layout.
pub const CONTENT_KEY: &str = "content";

/// A page definition.
///
/// A page binds a URL pattern to a content template, an optional layout and
/// arbitrary extra data made available to both templates under `Extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    /// The URL pattern this page is served on, e.g. `/users/:id`.
    #[serde(alias = "URLPattern")]
    pub url_pattern: String,

    /// The name of the layout template, if any.
    #[serde(alias = "Layout", default)]
    pub layout: Option<String>,

    /// The name of the content template.
    #[serde(alias = "Template")]
    pub template: String,

    /// Extra data exposed to the templates under `Extra`.
    #[serde(alias = "Extra", default)]
    pub extra: Value,
}

impl Page {
    /// Construct a page without a layout or extra data.
    pub fn new(url_pattern: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            layout: None,
            template: template.into(),
            extra: Value::None,
        }
    }

    /// Render the content of this page inside the given layout.
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Set the extra data for this page.
    pub fn with_extra(mut self, extra: impl Into<Value>) -> Self {
        self.extra = extra.into();
        self
    }
}

/// An error that can occur while rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template is not in the store, either it is still loading or it
    /// failed to load.
    #[error("template `{name}` not found")]
    NotFound {
        /// The name of the missing template.
        name: String,
    },

    /// The template failed to render.
    #[error("failed to render template `{name}`: {source}")]
    RenderFailure {
        /// The name of the template that failed.
        name: String,
        /// The underlying engine error.
        #[source]
        source: Error,
    },
}

impl RenderError {
    /// Returns the name of the template that caused the error.
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { name } | Self::RenderFailure { name, .. } => name,
        }
    }
}

/// Renders pages from the templates in a [`Store`].
///
/// Each render looks up the templates it needs exactly once, so a render that
/// races a reload sees either the old or the new version of each template and
/// never waits for the store to be populated.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    engine: Arc<Engine>,
    store: Store,
}

impl PageRenderer {
    /// Construct a new page renderer.
    pub fn new(engine: Arc<Engine>, store: Store) -> Self {
        Self { engine, store }
    }

    /// Returns the store this renderer reads from.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Render the page.
    ///
    /// The content template is rendered with the request values and the
    /// page's extra data. If the page has a layout, the layout is then
    /// rendered with the same values plus the rendered content.
    pub fn render(&self, page: &Page, request: &Map<String, Value>) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::new();
        self.render_to_writer(page, request, &mut buf)?;
        Ok(buf)
    }

    /// Render the page to the given writer.
    ///
    /// Nothing is written if the content template fails.
    pub fn render_to_writer<W>(
        &self,
        page: &Page,
        request: &Map<String, Value>,
        mut writer: W,
    ) -> Result<(), RenderError>
    where
        W: io::Write,
    {
        let content_template = self.lookup(&page.template)?;

        let mut ctx = request.clone();
        ctx.insert(EXTRA_KEY.to_owned(), page.extra.clone());

        let content =
            self.render_template(&page.template, &content_template, &Value::Map(ctx.clone()))?;

        let Some(layout) = &page.layout else {
            return writer
                .write_all(content.as_bytes())
                .map_err(|err| failure(&page.template, Error::from(err)));
        };
        let layout_template = self.lookup(layout)?;

        ctx.insert(CONTENT_KEY.to_owned(), Value::String(content));
        layout_template
            .render_from(&self.engine, &Value::Map(ctx))
            .with_partials(&self.store)
            .with_name(layout)
            .to_writer(writer)
            .map_err(|source| failure(layout, source))
    }

    fn lookup(&self, name: &str) -> Result<Arc<Template>, RenderError> {
        self.store.get(name).ok_or_else(|| {
            debug!(name, "template not in store");
            RenderError::NotFound {
                name: name.to_owned(),
            }
        })
    }

    fn render_template(&self, name: &str, template: &Template, ctx: &Value) -> Result<String, RenderError> {
        template
            .render_from(&self.engine, ctx)
            .with_partials(&self.store)
            .with_name(name)
            .to_string()
            .map_err(|source| failure(name, source))
    }
}

fn failure(name: &str, source: Error) -> RenderError {
    debug!(name, error = %source, "template failed to render");
    RenderError::RenderFailure {
        name: name.to_owned(),
        source,
    }
}
