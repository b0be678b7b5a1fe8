use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mdlift_core::config::UploadMethod;

#[derive(Parser)]
#[command(name = "mdlift")]
#[command(about = "Lift local images out of exported Markdown onto S3 or PicList")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding settings files [env: MDLIFT_CONFIG_DIR]
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Note workspace root; assets resolve under <DIR>/data [env: MDLIFT_WORKSPACE]
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Directory assets resolve under directly [env: MDLIFT_ASSETS_DIR]
    #[arg(long, global = true, value_name = "DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Kernel API of a running note app, e.g. http://127.0.0.1:6806 [env: MDLIFT_HOST_URL]
    #[arg(long, global = true, value_name = "URL")]
    pub host_url: Option<String>,

    /// Kernel API token [env: MDLIFT_HOST_TOKEN]
    #[arg(long, global = true, value_name = "TOKEN")]
    pub host_token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List image paths referenced by a Markdown file
    Extract {
        /// Markdown file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload every image referenced by a document
    Upload {
        /// Markdown file, or document id with --host-url
        input: String,
        #[command(flatten)]
        upload: UploadArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export documents as Markdown, ZIP, or clipboard text
    Export {
        /// Markdown files, or document ids with --host-url
        #[arg(required = true)]
        ids: Vec<String>,
        /// Upload images and rewrite links before exporting
        #[arg(long)]
        upload: bool,
        #[command(flatten)]
        upload_args: UploadArgs,
        /// Output file or directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH", conflicts_with = "clipboard")]
        output: Option<PathBuf>,
        /// Copy the result to the clipboard
        #[arg(long)]
        clipboard: bool,
    },
    /// Render a document to HTML with bm.md
    Render {
        /// Markdown file, or document id with --host-url
        id: String,
        /// Output file or directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH", conflicts_with = "clipboard")]
        output: Option<PathBuf>,
        /// Copy the rendered HTML to the clipboard
        #[arg(long)]
        clipboard: bool,
        /// Produce the renderer's normalized Markdown instead of HTML
        #[arg(long)]
        markdown: bool,
        /// Renderer API base URL
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct UploadArgs {
    /// Override the configured upload method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,
    /// Upload one asset at a time
    #[arg(long)]
    pub serial: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum MethodArg {
    S3,
    #[value(name = "piclist")]
    PicList,
}

impl From<MethodArg> for UploadMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::S3 => Self::S3,
            MethodArg::PicList => Self::PicList,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings with secrets masked
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update S3-compatible storage settings
    S3(S3Args),
    /// Update PicList server settings
    Piclist(PicListArgs),
    /// Select the upload method
    Method {
        #[arg(value_enum)]
        method: MethodArg,
    },
    /// Update bm.md render options
    Render(RenderArgs),
    /// Check that the selected upload backend is usable
    Check {
        /// Check this backend instead of the configured one
        #[arg(long, value_enum)]
        method: Option<MethodArg>,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct S3Args {
    /// Endpoint URL, e.g. https://s3.us-east-1.amazonaws.com
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
    #[arg(long, value_name = "KEY")]
    pub access_key: Option<String>,
    #[arg(long, value_name = "SECRET")]
    pub secret_key: Option<String>,
    #[arg(long, value_name = "NAME")]
    pub bucket: Option<String>,
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,
    /// Text inserted before exported Markdown
    #[arg(long, value_name = "TEXT")]
    pub md_prefix: Option<String>,
    /// Text appended after exported Markdown
    #[arg(long, value_name = "TEXT")]
    pub md_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct PicListArgs {
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
    /// Multipart field carrying the file
    #[arg(long, value_name = "NAME")]
    pub file_field: Option<String>,
    #[arg(long, value_name = "TEXT")]
    pub md_prefix: Option<String>,
    #[arg(long, value_name = "TEXT")]
    pub md_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct RenderArgs {
    #[arg(long, value_name = "BOOL")]
    pub enable_lint: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub enable_footnote_links: Option<bool>,
    #[arg(long, value_name = "TEXT")]
    pub footnote_label: Option<String>,
    #[arg(long, value_name = "BOOL")]
    pub open_links_in_new_window: Option<bool>,
    #[arg(long, value_name = "TEXT")]
    pub reference_title: Option<String>,
    #[arg(long, value_name = "THEME")]
    pub code_theme: Option<String>,
    #[arg(long, value_name = "STYLE")]
    pub markdown_style: Option<String>,
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<String>,
    /// CSS embedded into rendered HTML pages
    #[arg(long, value_name = "CSS", conflicts_with = "custom_css_file")]
    pub custom_css: Option<String>,
    /// Read custom CSS from a file
    #[arg(long, value_name = "PATH")]
    pub custom_css_file: Option<PathBuf>,
}
