//! Registry Store - immutable plugin id -> repository URL mapping.
//!
//! Loaded once at startup from a JSON object file:
//!
//! ```json
//! {
//!   "hello-world": "https://github.com/acme/hello-world",
//!   "todo": "https://gitlab.example.com/acme/todo.git"
//! }
//! ```
//!
//! The store is never mutated after load and is shared between requests
//! behind an `Arc`.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while loading the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid registry JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Registry root must be a JSON object")]
    NotAnObject,

    #[error("Registry entry '{0}' must map to a repository URL string")]
    InvalidEntry(String),
}

/// Read-only plugin registry
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, String>,
}

impl Registry {
    /// Load the registry from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let registry = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            entries = registry.len(),
            "Loaded plugin registry"
        );
        Ok(registry)
    }

    /// Parse a registry from JSON text
    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let root: Value = serde_json::from_str(content)?;
        let Value::Object(map) = root else {
            return Err(RegistryError::NotAnObject);
        };

        let mut entries = BTreeMap::new();
        for (id, value) in map {
            match value {
                Value::String(url) => {
                    entries.insert(id, url);
                }
                _ => return Err(RegistryError::InvalidEntry(id)),
            }
        }

        Ok(Self { entries })
    }

    /// Build a registry from in-memory entries
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Repository URL for a plugin id (exact, case-sensitive match)
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All plugin ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All (id, repository URL) pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Plugin ids containing `query` as a substring
    pub fn search(&self, query: &str) -> Vec<String> {
        let matches: Vec<String> = self
            .entries
            .keys()
            .filter(|id| id.contains(query))
            .cloned()
            .collect();
        debug!(query = %query, matches = matches.len(), "Registry search");
        matches
    }
}
