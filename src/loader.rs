//! Populating the store in the background at startup.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::{Engine, Error, Store};

/// An error that can occur while loading a single template.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The template file could not be read.
    #[error("failed to read template `{name}` from {path}: {source}")]
    Read {
        /// The template name.
        name: String,
        /// The path that was read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The template file did not compile.
    #[error("failed to compile template `{name}` from {path}: {source}")]
    Compile {
        /// The template name.
        name: String,
        /// The path that was read.
        path: PathBuf,
        /// The compile error.
        source: Error,
    },

    /// The task loading the template panicked or was cancelled.
    #[error("load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LoadError {
    /// Returns the name of the template that failed, if known.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Read { name, .. } | Self::Compile { name, .. } => Some(name),
            Self::Task(_) => None,
        }
    }
}

/// The outcome of loading a set of templates.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// The names of the templates that were published, sorted.
    pub loaded: Vec<String>,
    /// The templates that failed to load.
    pub failed: Vec<LoadError>,
}

impl LoadReport {
    /// Returns `true` if every template was published.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reads, compiles and publishes template files.
///
/// Each template is loaded by its own task and published as soon as it is
/// compiled, in no particular order. A template that fails to load is logged
/// and skipped, it never prevents the others from loading.
#[derive(Debug, Clone)]
pub struct Loader {
    engine: Arc<Engine>,
    store: Store,
}

impl Loader {
    /// Construct a new loader.
    pub fn new(engine: Arc<Engine>, store: Store) -> Self {
        Self { engine, store }
    }

    /// Load the templates on a background task.
    ///
    /// This must be called from within a tokio runtime. The caller does not
    /// need to await the returned handle, templates become available in the
    /// store as they are loaded.
    pub fn spawn<I, K, P>(&self, sources: I) -> JoinHandle<LoadReport>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        let loader = self.clone();
        let sources: Vec<(String, PathBuf)> = sources
            .into_iter()
            .map(|(name, path)| (name.into(), path.into()))
            .collect();
        tokio::spawn(async move { loader.load(sources).await })
    }

    /// Load the templates and wait for all of them to finish.
    pub async fn load<I, K, P>(&self, sources: I) -> LoadReport
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        let mut set = JoinSet::new();
        for (name, path) in sources {
            let loader = self.clone();
            let name = name.into();
            let path = path.into();
            set.spawn(async move { loader.load_one(name, path).await });
        }

        let mut report = LoadReport::default();
        while let Some(res) = set.join_next().await {
            match res.map_err(LoadError::from).and_then(|r| r) {
                Ok(name) => report.loaded.push(name),
                Err(err) => {
                    warn!(name = err.name(), error = %err, "failed to load template");
                    report.failed.push(err);
                }
            }
        }
        report.loaded.sort_unstable();

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "finished loading templates"
        );
        report
    }

    async fn load_one(&self, name: String, path: PathBuf) -> Result<String, LoadError> {
        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(source) => return Err(LoadError::Read { name, path, source }),
        };
        let template = match self.engine.compile(source) {
            Ok(template) => template,
            Err(source) => return Err(LoadError::Compile { name, path, source }),
        };
        debug!(name = %name, path = %path.display(), "template loaded");
        self.store.set(name.clone(), Arc::new(template));
        Ok(name)
    }
}
