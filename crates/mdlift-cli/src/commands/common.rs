use std::env;
use std::path::{Path, PathBuf};

use mdlift_core::config::{JsonFileSettingsStore, UploadMethod, UploadSettings};
use mdlift_core::notify::Notifier;
use mdlift_core::source::{Asset, AssetSource, DocumentSource, HostApiClient, LocalWorkspace};
use mdlift_core::upload::{UploadOptions, UploadResult};
use mdlift_core::util::normalize_text_option;
use mdlift_core::ExportDocument;

use crate::cli::{Cli, UploadArgs};
use crate::error::CliError;

pub const ENV_CONFIG_DIR: &str = "MDLIFT_CONFIG_DIR";
pub const ENV_WORKSPACE: &str = "MDLIFT_WORKSPACE";
pub const ENV_ASSETS_DIR: &str = "MDLIFT_ASSETS_DIR";
pub const ENV_HOST_URL: &str = "MDLIFT_HOST_URL";
pub const ENV_HOST_TOKEN: &str = "MDLIFT_HOST_TOKEN";

/// Global options resolved from flags, then environment, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    pub config_dir: PathBuf,
    pub workspace: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub host_url: Option<String>,
    pub host_token: Option<String>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        Self::resolve(cli, |key| env::var(key).ok())
    }

    pub fn resolve(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let from_env = |key: &str| normalize_text_option(lookup(key));

        let config_dir = match cli
            .config_dir
            .clone()
            .or_else(|| from_env(ENV_CONFIG_DIR).map(PathBuf::from))
        {
            Some(dir) => dir,
            None => default_config_dir()?,
        };

        Ok(Self {
            config_dir,
            workspace: cli
                .workspace
                .clone()
                .or_else(|| from_env(ENV_WORKSPACE).map(PathBuf::from)),
            assets_dir: cli
                .assets_dir
                .clone()
                .or_else(|| from_env(ENV_ASSETS_DIR).map(PathBuf::from)),
            host_url: normalize_text_option(cli.host_url.clone())
                .or_else(|| from_env(ENV_HOST_URL)),
            host_token: normalize_text_option(cli.host_token.clone())
                .or_else(|| from_env(ENV_HOST_TOKEN)),
        })
    }

    pub fn store(&self) -> JsonFileSettingsStore {
        JsonFileSettingsStore::new(&self.config_dir)
    }

    /// Upload settings from the store, with an optional method override.
    pub fn upload_settings(&self, method: Option<UploadMethod>) -> Result<UploadSettings, CliError> {
        let settings = UploadSettings::load(&self.store())?;
        Ok(match method {
            Some(method) => settings.with_method(method),
            None => settings,
        })
    }

    /// Document and asset source for a set of inputs.
    ///
    /// A host URL selects the kernel API. Otherwise inputs are Markdown files
    /// and assets resolve under the assets dir, the workspace `data/` dir, or
    /// the directory of the first input, in that order.
    pub fn source_for(&self, inputs: &[String]) -> Result<NoteSource, CliError> {
        if let Some(url) = &self.host_url {
            let client = HostApiClient::new(url.clone(), self.host_token.clone())?;
            return Ok(NoteSource::Host(client));
        }

        let workspace = if let Some(dir) = &self.assets_dir {
            LocalWorkspace::with_asset_root(dir)
        } else if let Some(root) = &self.workspace {
            LocalWorkspace::new(root)
        } else {
            let parent = inputs
                .first()
                .and_then(|input| Path::new(input).parent())
                .filter(|parent| !parent.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            LocalWorkspace::with_asset_root(parent)
        };
        tracing::debug!(asset_root = %workspace.asset_root().display(), "Using local workspace");
        Ok(NoteSource::Local(workspace))
    }
}

pub fn default_config_dir() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("mdlift"))
        .ok_or_else(|| {
            CliError::Config(format!(
                "Could not resolve a config directory; pass --config-dir or set {ENV_CONFIG_DIR}"
            ))
        })
}

/// Local files or a running note app.
#[derive(Debug, Clone)]
pub enum NoteSource {
    Local(LocalWorkspace),
    Host(HostApiClient),
}

impl DocumentSource for NoteSource {
    async fn load_document(&self, id: &str) -> mdlift_core::Result<ExportDocument> {
        match self {
            Self::Local(workspace) => workspace.load_document(id).await,
            Self::Host(client) => client.load_document(id).await,
        }
    }
}

impl AssetSource for NoteSource {
    async fn fetch_asset(&self, path: &str) -> mdlift_core::Result<Asset> {
        match self {
            Self::Local(workspace) => workspace.fetch_asset(path).await,
            Self::Host(client) => client.fetch_asset(path).await,
        }
    }
}

/// Prints status messages to stderr so stdout stays pipeable.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

pub const fn upload_options(args: UploadArgs) -> UploadOptions {
    UploadOptions {
        show_success_message: true,
        parallel: !args.serial,
    }
}

pub fn format_upload_results(results: &[UploadResult]) -> String {
    results
        .iter()
        .map(|result| {
            if result.success {
                format!("ok      {} -> {}", result.original_path, result.url)
            } else {
                format!(
                    "failed  {}: {}",
                    result.original_path,
                    result.error.as_deref().unwrap_or("unknown error")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
