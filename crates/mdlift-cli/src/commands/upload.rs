use mdlift_core::markdown::extract_image_paths;
use mdlift_core::source::DocumentSource;
use mdlift_core::upload::upload_with_settings;

use crate::cli::UploadArgs;
use crate::commands::common::{format_upload_results, upload_options, AppContext, StderrNotifier};
use crate::error::CliError;

pub async fn run_upload(
    context: &AppContext,
    input: &str,
    args: UploadArgs,
    json: bool,
) -> Result<(), CliError> {
    let settings = context.upload_settings(args.method.map(Into::into))?;
    let source = context.source_for(&[input.to_string()])?;

    let document = source.load_document(input).await?;
    let paths = extract_image_paths(&document.content);
    let results = upload_with_settings(
        &paths,
        &source,
        &settings,
        upload_options(args),
        &StderrNotifier,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if !results.is_empty() {
        println!("{}", format_upload_results(&results));
    }

    Ok(())
}
