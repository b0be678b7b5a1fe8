//! mdlift CLI - lift local images out of exported Markdown
//!
//! Uploads referenced assets to S3 or PicList, rewrites links, and exports
//! documents as Markdown files, ZIP batches, clipboard text, or HTML.

mod cli;
mod clipboard;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::AppContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::{resolve_target, run_export};
use crate::commands::extract::run_extract;
use crate::commands::render::run_render;
use crate::commands::upload::run_upload;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        if let Some(hint) = error.hint() {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "mdlift=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = AppContext::from_cli(&cli)?;
    tracing::debug!(config_dir = %context.config_dir.display(), "Resolved settings directory");

    match cli.command {
        Commands::Extract { file, json } => run_extract(&file, json)?,
        Commands::Upload {
            input,
            upload,
            json,
        } => run_upload(&context, &input, upload, json).await?,
        Commands::Export {
            ids,
            upload,
            upload_args,
            output,
            clipboard,
        } => {
            run_export(
                &context,
                &ids,
                upload,
                upload_args,
                output.as_deref(),
                clipboard,
            )
            .await?;
        }
        Commands::Render {
            id,
            output,
            clipboard,
            markdown,
            api_url,
        } => {
            run_render(
                &context,
                &id,
                resolve_target(output.as_deref(), clipboard),
                markdown,
                api_url.as_deref(),
            )
            .await?;
        }
        Commands::Config { command } => run_config(&context, command).await?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
