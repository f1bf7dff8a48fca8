//! Process-wide template cache.
//!
//! Templates are built lazily on first request and kept for the lifetime of
//! the cache. Concurrent compilations share one cache: steady-state lookups
//! take a shard read lock only, and a missing key is built while holding that
//! key's entry lock, so each key is built at most once and other threads only
//! ever see the finished template.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use log::trace;

use super::{build_div_rem_template, Template, TemplateKey};

/// Memoised templates keyed by operation and width.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: DashMap<TemplateKey, Arc<Template>>,
    builds: AtomicUsize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache shared by every compilation in the process.
    pub fn shared() -> &'static TemplateCache {
        static SHARED: OnceLock<TemplateCache> = OnceLock::new();
        SHARED.get_or_init(TemplateCache::new)
    }

    /// Template for `key`, building it on first use.
    pub fn get(&self, key: TemplateKey) -> Arc<Template> {
        if let Some(template) = self.templates.get(&key) {
            return Arc::clone(template.value());
        }

        let entry = self.templates.entry(key).or_insert_with(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            trace!("building template {}", key);
            Arc::new(build_div_rem_template(key))
        });
        Arc::clone(entry.value())
    }

    pub fn contains(&self, key: TemplateKey) -> bool {
        self.templates.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// How many templates have been built so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}
