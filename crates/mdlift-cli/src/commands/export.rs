use std::path::{Path, PathBuf};

use mdlift_core::export::{ExportOutcome, ExportTarget};
use mdlift_core::services::{ExportRequest, ExportService};

use crate::cli::UploadArgs;
use crate::clipboard::SystemClipboard;
use crate::commands::common::{upload_options, AppContext, StderrNotifier};
use crate::error::CliError;

pub async fn run_export(
    context: &AppContext,
    ids: &[String],
    upload: bool,
    upload_args: UploadArgs,
    output_path: Option<&Path>,
    clipboard: bool,
) -> Result<(), CliError> {
    let settings = context.upload_settings(upload_args.method.map(Into::into))?;
    let source = context.source_for(ids)?;
    let service = ExportService::new(source.clone(), source, StderrNotifier, settings);

    let request = ExportRequest {
        upload,
        options: upload_options(upload_args),
        target: resolve_target(output_path, clipboard),
    };
    let outcome = service.export(ids, &request, Some(&SystemClipboard)).await?;

    match outcome {
        ExportOutcome::Written { path, .. } => println!("{}", path.display()),
        ExportOutcome::Copied { .. } => {}
        ExportOutcome::Printed { text, .. } => println!("{text}"),
    }

    Ok(())
}

/// Existing directories and paths ending in a separator receive a
/// timestamped file; anything else is the exact output path.
pub fn resolve_target(output_path: Option<&Path>, clipboard: bool) -> ExportTarget {
    if clipboard {
        return ExportTarget::Clipboard;
    }
    match output_path {
        None => ExportTarget::Stdout,
        Some(path) if path.is_dir() || ends_with_separator(path) => {
            ExportTarget::Directory(path.to_path_buf())
        }
        Some(path) => ExportTarget::File(PathBuf::from(path)),
    }
}

fn ends_with_separator(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
}
