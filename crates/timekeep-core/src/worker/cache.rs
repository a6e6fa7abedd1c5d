//! Offline asset cache.
//!
//! Static assets are served cache-first: a cached copy wins and the network
//! is only consulted on a miss. Everything else is network-first, falling
//! back to the cached copy when the network fails.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

const STATIC_EXTENSIONS: [&str; 6] = [".js", ".css", ".png", ".svg", ".ico", ".woff2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    CacheFirst,
    NetworkFirst,
}

impl CacheStrategy {
    pub fn for_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        if path.ends_with("/manifest.json") || path == "manifest.json" {
            return CacheStrategy::CacheFirst;
        }
        if STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            CacheStrategy::CacheFirst
        } else {
            CacheStrategy::NetworkFirst
        }
    }
}

/// Where a served body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

/// Origin of assets on a cache miss.
pub trait Fetch {
    fn fetch(&mut self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// Reads assets from a directory, mapping `/` to `index.html`.
#[derive(Debug, Clone)]
pub struct DirFetch {
    root: PathBuf,
}

impl DirFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for DirFetch {
    fn fetch(&mut self, path: &str) -> std::io::Result<Vec<u8>> {
        let relative = path.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "path escapes asset root",
            ));
        }
        let relative = if relative.is_empty() {
            "index.html"
        } else {
            relative
        };
        std::fs::read(self.root.join(relative))
    }
}

#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, Vec<u8>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the cache. Paths that fail to fetch are skipped.
    pub fn install(&mut self, paths: &[&str], origin: &mut impl Fetch) -> usize {
        let mut stored = 0;
        for path in paths {
            match origin.fetch(path) {
                Ok(body) => {
                    self.entries.insert((*path).to_string(), body);
                    stored += 1;
                }
                Err(e) => warn!(path, "precache failed: {e}"),
            }
        }
        stored
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serve `path` with the strategy its type calls for. `None` when
    /// neither the cache nor the network can provide it.
    pub fn handle(&mut self, path: &str, origin: &mut impl Fetch) -> Option<(Vec<u8>, Source)> {
        match CacheStrategy::for_path(path) {
            CacheStrategy::CacheFirst => {
                if let Some(body) = self.entries.get(path) {
                    return Some((body.clone(), Source::Cache));
                }
                let body = origin.fetch(path).ok()?;
                self.entries.insert(path.to_string(), body.clone());
                Some((body, Source::Network))
            }
            CacheStrategy::NetworkFirst => match origin.fetch(path) {
                Ok(body) => {
                    self.entries.insert(path.to_string(), body.clone());
                    Some((body, Source::Network))
                }
                Err(e) => {
                    debug!(path, "network failed, trying cache: {e}");
                    self.entries
                        .get(path)
                        .map(|body| (body.clone(), Source::Cache))
                }
            },
        }
    }
}
