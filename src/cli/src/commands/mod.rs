//! Subcommands of the `grantline` CLI.

pub mod check;
pub mod config;
pub mod resolve;

use anyhow::{Context, Result};
use grantline_core::authz::AuthorizationDocument;
use std::path::Path;

/// Load an authorization document, naming the path on failure.
pub(crate) fn load_document(path: &Path) -> Result<AuthorizationDocument> {
    AuthorizationDocument::from_path(path)
        .with_context(|| format!("Failed to load authorization document {}", path.display()))
}
