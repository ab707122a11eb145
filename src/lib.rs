//! Plugin Registry - resolves plugin ids to their source repositories
//!
//! Looks up a plugin's repository in an immutable registry, then fetches the
//! plugin's `manifest.toml` and `README.md` straight from the hosting
//! provider, falling back across default-branch names and raw-content URL
//! layouts.
//!
//! This library exposes the core for both the CLI binary and integration testing.

pub mod config;
pub mod fetcher;
pub mod manifest;
pub mod registry;
pub mod repo;
pub mod resolver;
pub mod server;
