//! Resolution façade: plugin id -> registry -> classifier -> fetcher -> decoder.
//!
//! Every failure below this layer is turned into a descriptive message, so
//! callers always get either data or text they can serve directly.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fetcher::BranchFetcher;
use crate::manifest::{decode, PluginManifest};
use crate::registry::Registry;
use crate::repo::classify;

/// Served when a plugin id is not in the registry
pub const MISSING_PLUGIN_MESSAGE: &str = "Server error, the repo does not exist";

/// Served by the raw registry-entry endpoint when a plugin id is not in the registry
pub const MISSING_ENTRY_MESSAGE: &str = "404";

/// A well-known file fetched from a plugin repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFile {
    Readme,
    Manifest,
}

impl RemoteFile {
    pub fn file_name(self) -> &'static str {
        match self {
            RemoteFile::Readme => "README.md",
            RemoteFile::Manifest => "manifest.toml",
        }
    }

    /// Text served when no candidate URL yields the file
    pub fn not_found_message(self) -> &'static str {
        match self {
            RemoteFile::Readme => "The repo does not have a README",
            RemoteFile::Manifest => "The repo does not have a manifest.toml file",
        }
    }
}

/// Outcome of a manifest lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ManifestLookup {
    Manifest(PluginManifest),
    Message(String),
}

/// Resolves plugin ids against an immutable registry
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<Registry>,
    fetcher: BranchFetcher,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>, fetcher: BranchFetcher) -> Self {
        Self { registry, fetcher }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Repository URL registered for `id`
    pub fn repo_url(&self, id: &str) -> Option<&str> {
        self.registry.get(id)
    }

    pub fn search(&self, query: &str) -> Vec<String> {
        self.registry.search(query)
    }

    /// README text for `id`, or a descriptive message.
    pub async fn resolve_readme(&self, id: &str) -> String {
        let Some(repo_url) = self.registry.get(id) else {
            debug!(plugin = %id, "Plugin not in registry");
            return MISSING_PLUGIN_MESSAGE.to_string();
        };

        self.fetch(repo_url, RemoteFile::Readme)
            .await
            .unwrap_or_else(|| RemoteFile::Readme.not_found_message().to_string())
    }

    /// Decoded manifest for `id`, or a descriptive message.
    ///
    /// A manifest that is present but not valid TOML collapses to an empty
    /// manifest.
    pub async fn resolve_manifest(&self, id: &str) -> ManifestLookup {
        let Some(repo_url) = self.registry.get(id) else {
            debug!(plugin = %id, "Plugin not in registry");
            return ManifestLookup::Message(MISSING_PLUGIN_MESSAGE.to_string());
        };

        let Some(text) = self.fetch(repo_url, RemoteFile::Manifest).await else {
            return ManifestLookup::Message(RemoteFile::Manifest.not_found_message().to_string());
        };

        match decode(&text) {
            Ok(manifest) => ManifestLookup::Manifest(manifest),
            Err(e) => {
                warn!(plugin = %id, error = %e, "Failed to decode plugin manifest");
                ManifestLookup::Manifest(PluginManifest::default())
            }
        }
    }

    async fn fetch(&self, repo_url: &str, file: RemoteFile) -> Option<String> {
        let repo = match classify(repo_url) {
            Ok(repo) => repo,
            Err(e) => {
                warn!(url = %repo_url, error = %e, "Cannot classify repository URL");
                return None;
            }
        };

        self.fetcher
            .fetch_file(&repo, file.file_name())
            .await
            .into_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::test_support::MockTransport;

    const MANIFEST: &str = "name = \"Foo\"\nauthor = \"Bar\"\nversion = \"1.0\"\nlicense = \"MIT\"";

    fn resolver(transport: &Arc<MockTransport>) -> Resolver {
        let registry = Registry::from_entries([
            ("tool", "https://github.com/acme/tool"),
            ("lab", "https://gitlab.example.com/acme/lab.git"),
            ("broken", "https://github.com/acme/tool/tree/main"),
            ("garbage", "not a url"),
        ]);
        Resolver::new(Arc::new(registry), BranchFetcher::new(transport.clone()))
    }

    #[tokio::test]
    async fn test_missing_plugin_makes_no_network_calls() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(&transport);

        assert_eq!(resolver.resolve_readme("nope").await, MISSING_PLUGIN_MESSAGE);
        assert_eq!(
            resolver.resolve_manifest("nope").await,
            ManifestLookup::Message(MISSING_PLUGIN_MESSAGE.to_string())
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_readme_github() {
        let transport = Arc::new(MockTransport::new().respond(
            "https://raw.githubusercontent.com/acme/tool/main/README.md",
            200,
            "# Tool",
        ));
        let resolver = resolver(&transport);

        assert_eq!(resolver.resolve_readme("tool").await, "# Tool");
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_readme_not_found() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(&transport);

        assert_eq!(
            resolver.resolve_readme("lab").await,
            "The repo does not have a README"
        );
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_resolve_manifest_decodes() {
        let transport = Arc::new(MockTransport::new().respond(
            "https://gitlab.example.com/acme/lab/-/raw/master/manifest.toml",
            200,
            MANIFEST,
        ));
        let resolver = resolver(&transport);

        let lookup = resolver.resolve_manifest("lab").await;
        assert_eq!(
            lookup,
            ManifestLookup::Manifest(PluginManifest {
                name: Some("Foo".to_string()),
                author: Some("Bar".to_string()),
                version: Some("1.0".to_string()),
                license: Some("MIT".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_resolve_manifest_not_found_is_not_decoded() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(&transport);

        assert_eq!(
            resolver.resolve_manifest("tool").await,
            ManifestLookup::Message("The repo does not have a manifest.toml file".to_string())
        );
    }

    #[tokio::test]
    async fn test_resolve_manifest_malformed_collapses_to_empty() {
        let transport = Arc::new(MockTransport::new().respond(
            "https://raw.githubusercontent.com/acme/tool/main/manifest.toml",
            200,
            "name = \"unterminated",
        ));
        let resolver = resolver(&transport);

        assert_eq!(
            resolver.resolve_manifest("tool").await,
            ManifestLookup::Manifest(PluginManifest::default())
        );
    }

    #[tokio::test]
    async fn test_invalid_repo_urls_collapse_to_not_found() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(&transport);

        assert_eq!(
            resolver.resolve_readme("broken").await,
            RemoteFile::Readme.not_found_message()
        );
        assert_eq!(
            resolver.resolve_manifest("garbage").await,
            ManifestLookup::Message(RemoteFile::Manifest.not_found_message().to_string())
        );
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_repo_url_and_search() {
        let transport = Arc::new(MockTransport::new());
        let resolver = resolver(&transport);

        assert_eq!(resolver.repo_url("tool"), Some("https://github.com/acme/tool"));
        assert_eq!(resolver.repo_url("missing"), None);
        assert_eq!(resolver.search("la"), vec!["lab"]);
    }

    #[test]
    fn test_manifest_lookup_serializes_untagged() {
        let message = ManifestLookup::Message("text".to_string());
        assert_eq!(serde_json::to_value(&message).unwrap(), serde_json::json!("text"));
    }
}
