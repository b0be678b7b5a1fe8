//! Filesystem-backed documents and assets.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{Asset, AssetSource, DocumentSource, ExportDocument};
use crate::util::is_http_url;
use crate::{Error, Result};

/// Markdown files on disk plus an asset directory.
///
/// In a note workspace, assets live under `<workspace>/data/`, which is where
/// `assets/...` links in exported Markdown resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalWorkspace {
    asset_root: PathBuf,
}

impl LocalWorkspace {
    /// Workspace rooted at `root`; assets resolve under `root/data`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            asset_root: root.as_ref().join("data"),
        }
    }

    /// Assets resolve directly under `dir`.
    pub fn with_asset_root(dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: dir.into(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Map a document asset path onto the asset root.
    ///
    /// Absolute paths, parent components, and remote URLs are rejected.
    pub fn resolve_asset_path(&self, path: &str) -> Result<PathBuf> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Asset path cannot be empty".to_string()));
        }
        if is_http_url(trimmed) {
            return Err(Error::InvalidInput(format!(
                "Asset is already remote: {trimmed}"
            )));
        }

        let relative = Path::new(trimmed);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "Asset path must stay inside the workspace: {trimmed}"
                    )));
                }
            }
        }

        Ok(self.asset_root.join(relative))
    }
}

impl AssetSource for LocalWorkspace {
    async fn fetch_asset(&self, path: &str) -> Result<Asset> {
        let file_path = self.resolve_asset_path(path)?;
        let bytes = tokio::fs::read(&file_path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => Error::NotFound(format!(
                    "Asset {path} (looked in {})",
                    file_path.display()
                )),
                _ => Error::Io(error),
            })?;
        tracing::debug!(path, bytes = bytes.len(), "Read local asset");
        Ok(Asset::new(path, bytes))
    }
}

impl DocumentSource for LocalWorkspace {
    /// `id` is a Markdown file path; its stem becomes the title.
    async fn load_document(&self, id: &str) -> Result<ExportDocument> {
        let path = Path::new(id);
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => Error::NotFound(format!("Document {id}")),
                _ => Error::Io(error),
            })?;

        let mut document = ExportDocument::new(id, content);
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            document = document.with_title(stem);
        }
        Ok(document)
    }
}
