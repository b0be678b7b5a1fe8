//! Upload orchestration: fetch each referenced asset, send it to the selected
//! backend, and collect one result per reference.
//!
//! Failures of individual assets never abort a batch; only configuration
//! problems do, and those are detected before any asset is touched.

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::UploadSettings;
use crate::markdown::{decode_asset_path, extract_image_paths, replace_image_links};
use crate::notify::Notifier;
use crate::source::AssetSource;
use crate::storage::{AssetUploader, PicListClient, S3Storage};
use crate::Result;

pub use crate::config::UploadMethod;

/// Outcome of uploading one asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Path exactly as written in the document.
    pub original_path: String,
    /// Public URL; empty when the upload failed.
    pub url: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn succeeded(original_path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            original_path: original_path.into(),
            url: url.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(original_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            original_path: original_path.into(),
            url: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Per-operation upload switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Send a summary notification when the batch completes.
    pub show_success_message: bool,
    /// Upload S3 assets concurrently. PicList always runs serially.
    pub parallel: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            show_success_message: true,
            parallel: true,
        }
    }
}

/// Number of successful results.
#[must_use]
pub fn count_succeeded(results: &[UploadResult]) -> usize {
    results.iter().filter(|result| result.success).count()
}

/// Upload every path with one backend, in input order.
///
/// With `parallel`, all uploads are in flight at once and joined before
/// returning; otherwise each upload finishes before the next starts.
pub async fn upload_files<S, U>(
    paths: &[String],
    source: &S,
    uploader: &U,
    parallel: bool,
) -> Vec<UploadResult>
where
    S: AssetSource,
    U: AssetUploader,
{
    if parallel {
        return join_all(paths.iter().map(|path| upload_one(path, source, uploader))).await;
    }

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        results.push(upload_one(path, source, uploader).await);
    }
    results
}

async fn upload_one<S, U>(path: &str, source: &S, uploader: &U) -> UploadResult
where
    S: AssetSource,
    U: AssetUploader,
{
    let decoded = decode_asset_path(path);
    let outcome = async {
        let asset = source.fetch_asset(&decoded).await?;
        uploader.upload_asset(&asset).await
    }
    .await;

    match outcome {
        Ok(url) => {
            tracing::info!(path, %url, method = %uploader.method(), "Uploaded asset");
            UploadResult::succeeded(path, url)
        }
        Err(error) => {
            tracing::warn!(path, method = %uploader.method(), %error, "Asset upload failed");
            UploadResult::failed(path, error.to_string())
        }
    }
}

/// Upload `paths` with the backend selected in `settings`.
///
/// Incomplete backend settings fail the whole call before any asset is
/// fetched. Everything after that is reported per path.
pub async fn upload_with_settings<S, N>(
    paths: &[String],
    source: &S,
    settings: &UploadSettings,
    options: UploadOptions,
    notifier: &N,
) -> Result<Vec<UploadResult>>
where
    S: AssetSource,
    N: Notifier + ?Sized,
{
    if paths.is_empty() {
        notifier.notify("No files to upload");
        return Ok(Vec::new());
    }

    settings.validate()?;

    let results = match settings.method {
        UploadMethod::S3 => {
            let storage = S3Storage::new(settings.s3.clone());
            upload_with_uploader(paths, source, &storage, options, notifier).await
        }
        UploadMethod::PicList => {
            let client = PicListClient::new(settings.piclist.clone())?;
            let serial = UploadOptions {
                parallel: false,
                ..options
            };
            upload_with_uploader(paths, source, &client, serial, notifier).await
        }
    };
    Ok(results)
}

/// Upload `paths` with an already-built backend and report the outcome.
///
/// Sends `"<Backend> upload finished (<ok>/<total>)"` when
/// `show_success_message` is set.
pub async fn upload_with_uploader<S, U, N>(
    paths: &[String],
    source: &S,
    uploader: &U,
    options: UploadOptions,
    notifier: &N,
) -> Vec<UploadResult>
where
    S: AssetSource,
    U: AssetUploader,
    N: Notifier + ?Sized,
{
    if paths.is_empty() {
        notifier.notify("No files to upload");
        return Vec::new();
    }

    let method = uploader.method();
    tracing::debug!(count = paths.len(), %method, parallel = options.parallel, "Starting upload batch");
    let results = upload_files(paths, source, uploader, options.parallel).await;

    let succeeded = count_succeeded(&results);
    let failed = results.len() - succeeded;
    if failed > 0 {
        tracing::warn!(failed, total = results.len(), %method, "Some assets failed to upload");
    }
    if options.show_success_message {
        notifier.notify(&format!(
            "{} upload finished ({succeeded}/{})",
            method.label(),
            results.len()
        ));
    }

    results
}

/// Extract image references from `text`, upload them, and rewrite the links
/// that succeeded.
pub async fn process_markdown_with_upload<S, N>(
    text: &str,
    source: &S,
    settings: &UploadSettings,
    options: UploadOptions,
    notifier: &N,
) -> Result<String>
where
    S: AssetSource,
    N: Notifier + ?Sized,
{
    let paths = extract_image_paths(text);
    let results = upload_with_settings(&paths, source, settings, options, notifier).await?;
    Ok(replace_image_links(text, &results))
}
