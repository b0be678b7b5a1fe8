use std::fmt::Write as _;

use mdlift_core::config::{
    PicListConfig, RenderOptions, S3Config, SectionStatus, SettingsCommand, SettingsReply,
    SettingsService, SettingsStore, UploadMethod,
};
use mdlift_core::storage::S3Storage;
use serde::Serialize;

use crate::cli::{ConfigCommands, PicListArgs, RenderArgs, S3Args};
use crate::commands::common::AppContext;
use crate::error::CliError;

/// Everything `config show` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverview {
    pub upload_method: UploadMethod,
    pub s3: SectionStatus<S3Config>,
    pub piclist: SectionStatus<PicListConfig>,
    pub render: RenderOptions,
}

pub async fn run_config(context: &AppContext, command: ConfigCommands) -> Result<(), CliError> {
    let service = SettingsService::new(context.store());

    match command {
        ConfigCommands::Show { json } => {
            let overview = load_overview(&service)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print!("{}", format_overview(&overview));
            }
        }
        ConfigCommands::S3(args) => {
            let current = s3_status(&service)?.config;
            service.handle(SettingsCommand::SaveS3(merge_s3(current, args)))?;
            report_saved("S3", &s3_status(&service)?.missing);
        }
        ConfigCommands::Piclist(args) => {
            let current = piclist_status(&service)?.config;
            service.handle(SettingsCommand::SavePicList(merge_piclist(current, args)))?;
            report_saved("PicList", &piclist_status(&service)?.missing);
        }
        ConfigCommands::Method { method } => {
            let method = UploadMethod::from(method);
            service.handle(SettingsCommand::SaveUploadMethod(method))?;
            println!("Upload method set to {}", method.label());
        }
        ConfigCommands::Render(args) => {
            let current = match service.handle(SettingsCommand::GetRender)? {
                SettingsReply::Render(options) => options,
                other => return Err(unexpected_reply(&other)),
            };
            service.handle(SettingsCommand::SaveRender(merge_render(current, args)?))?;
            println!("Render settings saved");
        }
        ConfigCommands::Check { method } => {
            let settings = context.upload_settings(method.map(Into::into))?;
            settings.validate()?;
            match settings.method {
                UploadMethod::S3 => {
                    S3Storage::new(settings.s3.clone()).bucket_is_reachable().await?;
                    println!("S3 bucket '{}' is reachable", settings.s3.bucket.trim());
                }
                UploadMethod::PicList => {
                    println!(
                        "PicList is configured for {}",
                        settings.piclist.server_url.trim()
                    );
                }
            }
        }
    }

    Ok(())
}

pub fn load_overview<S: SettingsStore>(
    service: &SettingsService<S>,
) -> Result<SettingsOverview, CliError> {
    let upload_method = match service.handle(SettingsCommand::GetUploadMethod)? {
        SettingsReply::UploadMethod(method) => method,
        other => return Err(unexpected_reply(&other)),
    };
    let render = match service.handle(SettingsCommand::GetRender)? {
        SettingsReply::Render(options) => options,
        other => return Err(unexpected_reply(&other)),
    };

    let mut s3 = s3_status(service)?;
    s3.config = s3.config.redacted();
    let mut piclist = piclist_status(service)?;
    piclist.config = piclist.config.redacted();

    Ok(SettingsOverview {
        upload_method,
        s3,
        piclist,
        render,
    })
}

pub fn format_overview(overview: &SettingsOverview) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Upload method: {}", overview.upload_method.label());

    let s3 = &overview.s3.config;
    let _ = writeln!(output, "\n[s3] {}", section_state(&overview.s3.missing));
    let _ = writeln!(output, "  endpoint:   {}", s3.endpoint);
    let _ = writeln!(output, "  bucket:     {}", s3.bucket);
    let _ = writeln!(output, "  region:     {}", s3.region_or_default());
    let _ = writeln!(output, "  access key: {}", s3.access_key);
    let _ = writeln!(output, "  secret key: {}", s3.secret_key);

    let piclist = &overview.piclist.config;
    let _ = writeln!(output, "\n[piclist] {}", section_state(&overview.piclist.missing));
    let _ = writeln!(output, "  server url: {}", piclist.server_url);
    let _ = writeln!(output, "  file field: {}", piclist.file_field_or_default());
    let _ = writeln!(output, "  api key:    {}", piclist.api_key);

    let render = &overview.render;
    let _ = writeln!(output, "\n[render]");
    let _ = writeln!(output, "  code theme:     {}", render.code_theme);
    let _ = writeln!(output, "  markdown style: {}", render.markdown_style);
    let _ = writeln!(output, "  platform:       {}", render.platform);
    let _ = writeln!(output, "  lint:           {}", render.enable_lint);
    let _ = writeln!(output, "  footnote links: {}", render.enable_footnote_links);
    let _ = writeln!(
        output,
        "  custom css:     {}",
        if render.custom_css.trim().is_empty() { "none" } else { "set" }
    );

    output
}

fn section_state(missing: &[String]) -> String {
    if missing.is_empty() {
        "configured".to_string()
    } else {
        format!("incomplete (missing: {})", missing.join(", "))
    }
}

fn report_saved(backend: &str, missing: &[String]) {
    println!("{backend} settings saved");
    if !missing.is_empty() {
        println!("Still missing: {}", missing.join(", "));
    }
}

fn s3_status<S: SettingsStore>(
    service: &SettingsService<S>,
) -> Result<SectionStatus<S3Config>, CliError> {
    match service.handle(SettingsCommand::GetS3Status)? {
        SettingsReply::S3Status(status) => Ok(status),
        other => Err(unexpected_reply(&other)),
    }
}

fn piclist_status<S: SettingsStore>(
    service: &SettingsService<S>,
) -> Result<SectionStatus<PicListConfig>, CliError> {
    match service.handle(SettingsCommand::GetPicListStatus)? {
        SettingsReply::PicListStatus(status) => Ok(status),
        other => Err(unexpected_reply(&other)),
    }
}

fn unexpected_reply(reply: &SettingsReply) -> CliError {
    CliError::Config(format!("Unexpected settings reply: {reply:?}"))
}

/// Overlay the flags that were given onto the stored S3 settings.
pub fn merge_s3(mut config: S3Config, args: S3Args) -> S3Config {
    let S3Args {
        endpoint,
        access_key,
        secret_key,
        bucket,
        region,
        md_prefix,
        md_suffix,
    } = args;
    overlay(&mut config.endpoint, endpoint);
    overlay(&mut config.access_key, access_key);
    overlay(&mut config.secret_key, secret_key);
    overlay(&mut config.bucket, bucket);
    overlay(&mut config.region, region);
    overlay(&mut config.md_prefix, md_prefix);
    overlay(&mut config.md_suffix, md_suffix);
    config
}

pub fn merge_piclist(mut config: PicListConfig, args: PicListArgs) -> PicListConfig {
    let PicListArgs {
        server_url,
        api_key,
        file_field,
        md_prefix,
        md_suffix,
    } = args;
    overlay(&mut config.server_url, server_url);
    overlay(&mut config.api_key, api_key);
    overlay(&mut config.file_field, file_field);
    overlay(&mut config.md_prefix, md_prefix);
    overlay(&mut config.md_suffix, md_suffix);
    config
}

pub fn merge_render(mut options: RenderOptions, args: RenderArgs) -> Result<RenderOptions, CliError> {
    let RenderArgs {
        enable_lint,
        enable_footnote_links,
        footnote_label,
        open_links_in_new_window,
        reference_title,
        code_theme,
        markdown_style,
        platform,
        custom_css,
        custom_css_file,
    } = args;

    let custom_css = match custom_css_file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => custom_css,
    };

    if let Some(value) = enable_lint {
        options.enable_lint = value;
    }
    if let Some(value) = enable_footnote_links {
        options.enable_footnote_links = value;
    }
    if let Some(value) = open_links_in_new_window {
        options.open_links_in_new_window = value;
    }
    overlay(&mut options.footnote_label, footnote_label);
    overlay(&mut options.reference_title, reference_title);
    overlay(&mut options.code_theme, code_theme);
    overlay(&mut options.markdown_style, markdown_style);
    overlay(&mut options.platform, platform);
    overlay(&mut options.custom_css, custom_css);
    Ok(options)
}

/// An empty string clears a field; `None` leaves it alone.
fn overlay(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}
