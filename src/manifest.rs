//! Plugin manifest decoding.
//!
//! A plugin's `manifest.toml` is a flat TOML table; we project the four
//! fields the registry exposes:
//!
//! ```toml
//! name = "hello-world"
//! author = "acme"
//! version = "1.0"
//! license = "MIT"
//! ```
//!
//! Missing keys are tolerated and left absent. Only text that is not valid
//! TOML at all is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::{Table, Value};

/// Manifest decode failure
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Malformed manifest: {0}")]
    Malformed(#[from] toml::de::Error),
}

/// Plugin metadata served by the info endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl PluginManifest {
    /// True when none of the projected fields were present
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author.is_none()
            && self.version.is_none()
            && self.license.is_none()
    }
}

/// Decode manifest text into a `PluginManifest`.
pub fn decode(manifest_text: &str) -> Result<PluginManifest, ManifestError> {
    let table: Table = manifest_text.parse()?;

    Ok(PluginManifest {
        name: field(&table, "name"),
        author: field(&table, "author"),
        version: field(&table, "version"),
        license: field(&table, "license"),
    })
}

fn field(table: &Table, key: &str) -> Option<String> {
    table.get(key).map(|value| match value {
        Value::String(s) => s.clone(),
        // Numbers, booleans, datetimes, arrays: their TOML rendering
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_manifest() {
        let text = "name = \"Foo\"\nauthor = \"Bar\"\nversion = \"1.0\"\nlicense = \"MIT\"";
        let manifest = decode(text).unwrap();
        assert_eq!(
            manifest,
            PluginManifest {
                name: Some("Foo".to_string()),
                author: Some("Bar".to_string()),
                version: Some("1.0".to_string()),
                license: Some("MIT".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_missing_license_is_absent() {
        let manifest = decode("name = \"Foo\"\nauthor = \"Bar\"\nversion = \"1.0\"").unwrap();
        assert_eq!(manifest.name.as_deref(), Some("Foo"));
        assert!(manifest.license.is_none());
    }

    #[test]
    fn test_decode_ignores_extra_keys() {
        let manifest = decode(
            r#"
name = "Foo"
description = "does things"

[dependencies]
bar = "1"
"#,
        )
        .unwrap();
        assert_eq!(manifest.name.as_deref(), Some("Foo"));
        assert!(manifest.author.is_none());
    }

    #[test]
    fn test_decode_coerces_scalars() {
        let manifest = decode("name = \"Foo\"\nversion = 2\nlicense = true").unwrap();
        assert_eq!(manifest.version.as_deref(), Some("2"));
        assert_eq!(manifest.license.as_deref(), Some("true"));
    }

    #[test]
    fn test_decode_empty_text() {
        let manifest = decode("").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode("name = \"unterminated").unwrap_err();
        assert!(err.to_string().starts_with("Malformed manifest"));
    }

    #[test]
    fn test_decode_rejects_plain_prose() {
        assert!(decode("The repo does not have a manifest.toml file").is_err());
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let manifest = PluginManifest {
            name: Some("Foo".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Foo"}));
    }
}
