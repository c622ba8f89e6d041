use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::render::Partials;
use crate::Template;

/// A concurrent map of template names to compiled templates.
///
/// Cloning a store is cheap and the clone shares the same underlying map, so
/// one store can be handed to the loader, the page renderer and the reloader
/// at once. Every operation is safe to call from any number of threads and
/// none of them can fail.
///
/// A lookup returns either nothing or the template most recently published
/// under that name. Publishing swaps the `Arc` under the shard lock, renders
/// that already hold the previous `Arc` keep using it until they finish.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use hotpage::{Engine, Store};
///
/// let engine = Engine::new();
/// let store = Store::new();
/// assert!(store.get("index").is_none());
///
/// store.set("index", Arc::new(engine.compile("v1")?));
/// store.set("index", Arc::new(engine.compile("v2")?));
/// assert_eq!(store.get("index").unwrap().source(), "v2");
/// # Ok::<(), hotpage::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Store {
    templates: Arc<DashMap<String, Arc<Template>>>,
}

impl Store {
    /// Construct a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the template published under `name`.
    ///
    /// The shard lock is released before returning, the caller only holds a
    /// reference count on the template.
    pub fn get(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Publish a template under `name`, returning the one it replaced.
    pub fn set(&self, name: impl Into<String>, template: Arc<Template>) -> Option<Arc<Template>> {
        self.templates.insert(name.into(), template)
    }

    /// Publish several templates.
    ///
    /// Each entry is published on its own, a concurrent reader may observe
    /// some of the entries before others.
    pub fn set_many<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Arc<Template>)>,
        K: Into<String>,
    {
        for (name, template) in entries {
            self.set(name, template);
        }
    }

    /// Remove the template published under `name`.
    pub fn remove(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.remove(name).map(|(_, template)| template)
    }

    /// Returns `true` if a template is published under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Returns the number of published templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if no templates are published.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Returns the names of all published templates, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.templates.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

impl Partials for Store {
    fn get_partial(&self, name: &str) -> Option<Arc<Template>> {
        self.get(name)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("names", &self.names())
            .finish()
    }
}
