//! The site configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Page;

/// An error that can occur while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The path that was read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A page refers to a template that is not configured.
    #[error("page `{url_pattern}` refers to unknown template `{name}`")]
    UnknownTemplate {
        /// The URL pattern of the page.
        url_pattern: String,
        /// The template name that could not be found.
        name: String,
    },

    /// A name is configured both as a content template and as a layout.
    #[error("template `{name}` is configured as both a template and a layout")]
    DuplicateTemplate {
        /// The name configured twice.
        name: String,
    },
}

/// The site configuration.
///
/// Content templates and layouts are both published to the same store, the
/// two maps only exist to keep configuration files readable.
///
/// # Examples
///
/// ```
/// let config = hotpage::Config::from_json_str(r#"{
///     "Pages": [
///         {"URLPattern": "/a", "Layout": "layout", "Template": "a", "Extra": {"name": "stranger"}}
///     ],
///     "Templates": {"a": "templates/a.html"},
///     "Layouts": {"layout": "layouts/default.html"}
/// }"#)?;
/// config.validate()?;
/// assert_eq!(config.sources().len(), 2);
/// # Ok::<(), hotpage::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// The pages served by the site.
    #[serde(alias = "Pages", default)]
    pub pages: Vec<Page>,

    /// Content template names and the files they are loaded from.
    #[serde(alias = "Templates", default)]
    pub templates: BTreeMap<String, PathBuf>,

    /// Layout template names and the files they are loaded from.
    #[serde(alias = "Layouts", default)]
    pub layouts: BTreeMap<String, PathBuf>,

    /// The response body for paths that are not served.
    #[serde(alias = "NotFoundBody", default)]
    pub not_found_body: Option<String>,
}

impl Config {
    /// Parse the configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse the configuration from a JSON file.
    ///
    /// Relative template paths are resolved against the directory containing
    /// the configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let mut config = Self::from_json_str(&contents)?;
        if let Some(base) = path.parent() {
            for p in config.templates.values_mut().chain(config.layouts.values_mut()) {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }

    /// Returns every template name and the file it is loaded from.
    pub fn sources(&self) -> BTreeMap<String, PathBuf> {
        self.templates
            .iter()
            .chain(&self.layouts)
            .map(|(name, path)| (name.clone(), path.clone()))
            .collect()
    }

    /// Check that template and layout names are disjoint and that every page
    /// refers to configured templates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self.templates.keys().find(|name| self.layouts.contains_key(*name)) {
            return Err(ConfigError::DuplicateTemplate { name: name.clone() });
        }
        let known = |name: &str| self.templates.contains_key(name) || self.layouts.contains_key(name);
        for page in &self.pages {
            let mut names = std::iter::once(&page.template).chain(&page.layout);
            if let Some(name) = names.find(|name| !known(name.as_str())) {
                return Err(ConfigError::UnknownTemplate {
                    url_pattern: page.url_pattern.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}
