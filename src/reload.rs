//! Replacing templates at runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::{Engine, Error, Store};

/// An error that can occur while reloading a template from a file.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// The template file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The path that was read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The new source did not compile, the previous template is kept.
    #[error(transparent)]
    Compile(#[from] Error),
}

/// Compiles new template sources and publishes them to a [`Store`].
///
/// A source that fails to compile never reaches the store, whatever was
/// published under the name before keeps being served.
#[derive(Debug, Clone)]
pub struct Reloader {
    engine: Arc<Engine>,
    store: Store,
}

impl Reloader {
    /// Construct a new reloader.
    pub fn new(engine: Arc<Engine>, store: Store) -> Self {
        Self { engine, store }
    }

    /// Compile `source` and publish it under `name`.
    ///
    /// On a syntax error the store is left untouched and the compile error
    /// is returned as is.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use hotpage::{Engine, Reloader, Store};
    ///
    /// let store = Store::new();
    /// let reloader = Reloader::new(Arc::new(Engine::new()), store.clone());
    ///
    /// reloader.reload("a", "Hello {{ name }}").unwrap();
    /// let err = reloader.reload("a", "Hi {{ I'm broken").unwrap_err();
    /// assert!(err.is_syntax());
    /// assert_eq!(store.get("a").unwrap().source(), "Hello {{ name }}");
    /// ```
    pub fn reload(&self, name: &str, source: impl Into<String>) -> Result<(), Error> {
        match self.engine.compile(source) {
            Ok(template) => {
                let replaced = self.store.set(name, Arc::new(template)).is_some();
                info!(name, replaced, "template reloaded");
                Ok(())
            }
            Err(err) => {
                warn!(name, error = %err, "template reload rejected");
                Err(err)
            }
        }
    }

    /// Read the template source from `path` and publish it under `name`.
    pub async fn reload_from_path(&self, name: &str, path: impl AsRef<Path>) -> Result<(), ReloadError> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path).await.map_err(|source| {
            warn!(name, path = %path.display(), error = %source, "failed to read template");
            ReloadError::Read {
                path: path.to_owned(),
                source,
            }
        })?;
        self.reload(name, source)?;
        Ok(())
    }
}
