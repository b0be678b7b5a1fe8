//! Where documents and their embedded assets come from.

mod host;
mod local;

use crate::export::ExportDocument;
use crate::Result;

pub use host::HostApiClient;
pub use local::LocalWorkspace;

const UNNAMED_FILE: &str = "unnamed-file";

/// Raw bytes of an embedded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Decoded asset path as referenced by the document.
    pub path: String,
    pub bytes: Vec<u8>,
    /// Content type reported by the source, if any.
    pub content_type: Option<String>,
}

impl Asset {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
            content_type: None,
        }
    }

    /// Last path segment, or `unnamed-file` when there is none.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_FILE)
    }

    /// Reported content type, otherwise a guess from the file extension.
    pub fn content_type_or_guess(&self) -> String {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(
                || {
                    mime_guess::from_path(self.file_name())
                        .first_or_octet_stream()
                        .to_string()
                },
                ToOwned::to_owned,
            )
    }
}

/// Fetches asset bytes by the path written in a document.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    /// `path` is already decoded (`%20` turned into spaces).
    async fn fetch_asset(&self, path: &str) -> Result<Asset>;
}

/// Loads document content by id.
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    async fn load_document(&self, id: &str) -> Result<ExportDocument>;
}

impl<T: AssetSource> AssetSource for &T {
    async fn fetch_asset(&self, path: &str) -> Result<Asset> {
        (**self).fetch_asset(path).await
    }
}

impl<T: DocumentSource> DocumentSource for &T {
    async fn load_document(&self, id: &str) -> Result<ExportDocument> {
        (**self).load_document(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_file_name_uses_last_segment() {
        assert_eq!(
            Asset::new("assets/2024/photo.png", vec![]).file_name(),
            "photo.png"
        );
        assert_eq!(Asset::new("photo.png", vec![]).file_name(), "photo.png");
        assert_eq!(Asset::new("assets/", vec![]).file_name(), "unnamed-file");
    }

    #[test]
    fn content_type_prefers_reported_value() {
        let mut asset = Asset::new("assets/photo.png", vec![1]);
        assert_eq!(asset.content_type_or_guess(), "image/png");

        asset.content_type = Some(" image/webp ".to_string());
        assert_eq!(asset.content_type_or_guess(), "image/webp");

        let unknown = Asset::new("assets/blob.unknownext", vec![1]);
        assert_eq!(unknown.content_type_or_guess(), "application/octet-stream");
    }
}
