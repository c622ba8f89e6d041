//! Routing requests to pages and reload requests to the reloader.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::value::Map;
use crate::{Config, Engine, LoadReport, Loader, Page, PageRenderer, RenderError, Reloader, Store, Value};

/// The body served when no page matches or a page's template is missing.
pub const DEFAULT_NOT_FOUND_BODY: &str = "404 page not found";

/// The context key that holds the captured URL parameters.
pub const PARAMS_KEY: &str = "Params";

/// The status of a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The request succeeded.
    Ok,
    /// The request was malformed.
    BadRequest,
    /// No page or template was found.
    NotFound,
    /// The template failed to compile or render.
    InternalServerError,
}

impl Status {
    /// Returns the HTTP status code.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The result of handling a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The response status.
    pub status: Status,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    fn new(status: Status, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug)]
struct Route {
    segments: Vec<Segment>,
    page: Page,
}

/// Serves the pages of a [`Config`].
///
/// URL patterns are made of literal segments and `:name` segments, the
/// latter match any single path segment and are exposed to the templates
/// under `Params`.
#[derive(Debug)]
pub struct Site {
    routes: Vec<Route>,
    renderer: PageRenderer,
    reloader: Reloader,
    not_found_body: String,
}

impl Site {
    /// Construct a site serving the configured pages from the given store.
    ///
    /// The store is not populated, see [`Site::start`].
    pub fn new(config: &Config, engine: Arc<Engine>, store: Store) -> Self {
        let routes = config
            .pages
            .iter()
            .map(|page| Route {
                segments: parse_pattern(&page.url_pattern),
                page: page.clone(),
            })
            .collect();
        Self {
            routes,
            renderer: PageRenderer::new(engine.clone(), store.clone()),
            reloader: Reloader::new(engine, store),
            not_found_body: config
                .not_found_body
                .clone()
                .unwrap_or_else(|| DEFAULT_NOT_FOUND_BODY.to_owned()),
        }
    }

    /// Construct a site and start loading its templates in the background.
    ///
    /// This must be called from within a tokio runtime. The site serves
    /// requests immediately, pages whose templates are not loaded yet
    /// respond with `404`.
    pub fn start(config: &Config) -> (Self, JoinHandle<LoadReport>) {
        let engine = Arc::new(Engine::new());
        let store = Store::new();
        let handle = Loader::new(engine.clone(), store.clone()).spawn(config.sources());
        (Self::new(config, engine, store), handle)
    }

    /// Returns the store the site renders from.
    pub fn store(&self) -> &Store {
        self.renderer.store()
    }

    /// Render the page served at `path`.
    pub fn get(&self, path: &str) -> Response {
        let Some((page, params)) = self.route(path) else {
            debug!(path, "no page matches path");
            return self.not_found();
        };

        let mut ctx = Map::new();
        ctx.insert(PARAMS_KEY.to_owned(), Value::Map(params));

        match self.renderer.render(page, &ctx) {
            Ok(body) => Response::new(Status::Ok, body),
            Err(RenderError::NotFound { .. }) => self.not_found(),
            Err(err @ RenderError::RenderFailure { .. }) => {
                Response::new(Status::InternalServerError, err.to_string())
            }
        }
    }

    /// Replace the source of the template `name`.
    ///
    /// A missing source is a bad request, a source that fails to compile is
    /// reported as a server error and leaves the current template in place.
    pub fn put_template(&self, name: &str, source: Option<&str>) -> Response {
        let Some(source) = source else {
            return Response::new(Status::BadRequest, "missing template source");
        };
        match self.reloader.reload(name, source) {
            Ok(()) => Response::new(Status::Ok, Vec::new()),
            Err(err) => Response::new(Status::InternalServerError, err.to_string()),
        }
    }

    fn not_found(&self) -> Response {
        Response::new(Status::NotFound, self.not_found_body.as_bytes())
    }

    fn route(&self, path: &str) -> Option<(&Page, Map<String, Value>)> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let parts: Vec<_> = split_path(path).collect();
        self.routes.iter().find_map(|route| {
            let params = match_route(&route.segments, &parts)?;
            Some((&route.page, params))
        })
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    split_path(pattern)
        .map(|s| match s.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_owned()),
            None => Segment::Literal(s.to_owned()),
        })
        .collect()
}

fn match_route(segments: &[Segment], parts: &[&str]) -> Option<Map<String, Value>> {
    if segments.len() != parts.len() {
        return None;
    }
    let mut params = Map::new();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            Segment::Literal(lit) if lit == part => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), Value::from(*part));
            }
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pattern_segments() {
        assert_eq!(
            parse_pattern("/users/:id/"),
            vec![
                Segment::Literal("users".into()),
                Segment::Param("id".into())
            ]
        );
        assert!(parse_pattern("/").is_empty());
    }

    #[test]
    fn match_route_params() {
        let segments = parse_pattern("/users/:id");
        let params = match_route(&segments, &["users", "42"]).unwrap();
        assert_eq!(params.get("id"), Some(&Value::from("42")));
        assert!(match_route(&segments, &["posts", "42"]).is_none());
        assert!(match_route(&segments, &["users"]).is_none());
    }
}
