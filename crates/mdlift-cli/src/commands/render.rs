use mdlift_core::config::{RenderOptions, SettingsStore};
use mdlift_core::export::{deliver_rendered, ExportOutcome, ExportTarget};
use mdlift_core::notify::Notifier;
use mdlift_core::render::{RenderClient, DEFAULT_RENDER_API_URL};
use mdlift_core::services::ExportService;
use mdlift_core::source::DocumentSource;

use crate::clipboard::SystemClipboard;
use crate::commands::common::{AppContext, StderrNotifier};
use crate::error::CliError;

pub async fn run_render(
    context: &AppContext,
    id: &str,
    target: ExportTarget,
    markdown: bool,
    api_url: Option<&str>,
) -> Result<(), CliError> {
    let options: RenderOptions = context.store().load()?;
    let client = RenderClient::new(api_url.unwrap_or(DEFAULT_RENDER_API_URL))?;
    let source = context.source_for(&[id.to_string()])?;

    let outcome = if markdown {
        let document = source.load_document(id).await?;
        let rendered = client.render_markdown(&document.content, &options).await?;
        deliver_rendered(&rendered, &rendered, "md", &target, Some(&SystemClipboard))?
    } else {
        let service = ExportService::new(
            source.clone(),
            source,
            StderrNotifier,
            context.upload_settings(None)?,
        );
        let rendered = service.render_html(id, &client, &options).await?;
        tracing::info!(id, title = rendered.document.display_name(), "Rendered document");
        deliver_rendered(
            &rendered.page,
            &rendered.fragment,
            "html",
            &target,
            Some(&SystemClipboard),
        )?
    };

    match &outcome {
        ExportOutcome::Written { path, .. } => println!("{}", path.display()),
        ExportOutcome::Copied { .. } => StderrNotifier.notify(&outcome.summary()),
        ExportOutcome::Printed { text, .. } => println!("{text}"),
    }

    Ok(())
}
