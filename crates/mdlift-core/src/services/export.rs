//! End-to-end export flow shared by all front ends.

use crate::config::{RenderOptions, UploadSettings};
use crate::export::{deliver, Clipboard, ExportDocument, ExportOutcome, ExportTarget};
use crate::markdown::apply_affixes;
use crate::notify::Notifier;
use crate::render::{wrap_html_document, RenderClient, RenderedDocument};
use crate::source::{AssetSource, DocumentSource};
use crate::upload::{process_markdown_with_upload, UploadOptions};
use crate::Result;

/// Parameters for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Upload embedded assets and rewrite their links first.
    pub upload: bool,
    pub options: UploadOptions,
    pub target: ExportTarget,
}

/// Loads documents, optionally lifts their assets, and delivers them.
#[derive(Debug)]
pub struct ExportService<D, A, N> {
    documents: D,
    assets: A,
    notifier: N,
    settings: UploadSettings,
}

impl<D, A, N> ExportService<D, A, N>
where
    D: DocumentSource,
    A: AssetSource,
    N: Notifier,
{
    pub const fn new(documents: D, assets: A, notifier: N, settings: UploadSettings) -> Self {
        Self {
            documents,
            assets,
            notifier,
            settings,
        }
    }

    pub const fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Load every document, uploading assets first when `upload` is set.
    ///
    /// Upload settings are checked once up front so an incomplete backend
    /// aborts the batch before any document is loaded.
    pub async fn prepare(
        &self,
        ids: &[String],
        upload: bool,
        options: UploadOptions,
    ) -> Result<Vec<ExportDocument>> {
        if upload {
            self.settings.validate()?;
        }

        let mut prepared = Vec::with_capacity(ids.len());
        for id in ids {
            let mut document = self.documents.load_document(id).await?;
            tracing::debug!(id, title = document.display_name(), "Loaded document");
            if upload {
                let rewritten = process_markdown_with_upload(
                    &document.content,
                    &self.assets,
                    &self.settings,
                    options,
                    &self.notifier,
                )
                .await?;
                let (prefix, suffix) = self.settings.affixes();
                document.content = apply_affixes(&rewritten, prefix, suffix);
            }
            prepared.push(document);
        }
        Ok(prepared)
    }

    /// Prepare documents and hand them to the requested target.
    pub async fn export(
        &self,
        ids: &[String],
        request: &ExportRequest,
        clipboard: Option<&dyn Clipboard>,
    ) -> Result<ExportOutcome> {
        let documents = self.prepare(ids, request.upload, request.options).await?;
        let outcome = deliver(&documents, &request.target, clipboard)?;
        if !matches!(outcome, ExportOutcome::Printed { .. }) {
            self.notifier.notify(&outcome.summary());
        }
        Ok(outcome)
    }

    /// Load one document and render it to a standalone HTML page.
    pub async fn render_html(
        &self,
        id: &str,
        client: &RenderClient,
        options: &RenderOptions,
    ) -> Result<RenderedDocument> {
        let document = self.documents.load_document(id).await?;
        let fragment = client.render_html(&document.content, options).await?;
        let page = wrap_html_document(document.display_name(), &fragment, options);
        Ok(RenderedDocument {
            document,
            fragment,
            page,
        })
    }
}
