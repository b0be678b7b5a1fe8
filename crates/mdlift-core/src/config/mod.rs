//! Persisted upload, backend, and render settings.
//!
//! Each settings section is stored under its own key and loaded once per
//! operation into an owned value (`UploadSettings`) that is passed down the
//! pipeline explicitly.

mod service;
mod store;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::util::{is_blank, is_http_url, mask_secret};
use crate::{Error, Result};

pub use service::{SectionStatus, SettingsCommand, SettingsReply, SettingsService};
pub use store::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore};

const DEFAULT_S3_REGION: &str = "us-east-1";
const DEFAULT_PICLIST_SERVER_URL: &str = "http://127.0.0.1:36677";
const DEFAULT_PICLIST_FILE_FIELD: &str = "image";

/// A settings section persisted under a fixed key.
pub trait Section: Serialize + DeserializeOwned + Default {
    /// Storage key for this section.
    const KEY: &'static str;

    /// Required fields that are currently empty.
    fn missing_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Whether every required field is present.
    fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Upload backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// S3-compatible object storage
    #[default]
    S3,
    /// PicList image-hosting server
    PicList,
}

impl UploadMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::PicList => "piclist",
        }
    }

    /// Human-readable backend name for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::S3 => "S3",
            Self::PicList => "PicList",
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadMethod {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "piclist" => Ok(Self::PicList),
            other => Err(Error::InvalidInput(format!(
                "Unknown upload method '{other}' (expected s3 or piclist)"
            ))),
        }
    }
}

/// S3-compatible storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub md_prefix: String,
    pub md_suffix: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            region: DEFAULT_S3_REGION.to_string(),
            md_prefix: String::new(),
            md_suffix: String::new(),
        }
    }
}

impl S3Config {
    /// Fail with a configuration error naming every missing required field.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigIncomplete {
                backend: "S3",
                missing,
            })
        }
    }

    /// Configured region, falling back to `us-east-1`.
    #[must_use]
    pub fn region_or_default(&self) -> &str {
        let region = self.region.trim();
        if region.is_empty() {
            DEFAULT_S3_REGION
        } else {
            region
        }
    }

    /// Copy with credentials masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            access_key: mask_secret(&self.access_key),
            secret_key: mask_secret(&self.secret_key),
            ..self.clone()
        }
    }
}

impl Section for S3Config {
    const KEY: &'static str = "s3-config";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.endpoint) {
            missing.push("endpoint");
        }
        if is_blank(&self.access_key) {
            missing.push("accessKey");
        }
        if is_blank(&self.secret_key) {
            missing.push("secretKey");
        }
        if is_blank(&self.bucket) {
            missing.push("bucket");
        }
        missing
    }
}

/// PicList image-hosting server settings.
///
/// Also accepts the older `piclist`-prefixed field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PicListConfig {
    #[serde(alias = "piclistServerUrl")]
    pub server_url: String,
    #[serde(alias = "piclistApiKey")]
    pub api_key: String,
    #[serde(alias = "piclistFileField")]
    pub file_field: String,
    #[serde(alias = "piclistMdPrefix")]
    pub md_prefix: String,
    #[serde(alias = "piclistMdSuffix")]
    pub md_suffix: String,
}

impl Default for PicListConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_PICLIST_SERVER_URL.to_string(),
            api_key: String::new(),
            file_field: DEFAULT_PICLIST_FILE_FIELD.to_string(),
            md_prefix: String::new(),
            md_suffix: String::new(),
        }
    }
}

impl PicListConfig {
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigIncomplete {
                backend: "PicList",
                missing,
            })
        }
    }

    /// Form field carrying the file, falling back to `image`.
    #[must_use]
    pub fn file_field_or_default(&self) -> &str {
        let field = self.file_field.trim();
        if field.is_empty() {
            DEFAULT_PICLIST_FILE_FIELD
        } else {
            field
        }
    }

    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            api_key: mask_secret(&self.api_key),
            ..self.clone()
        }
    }
}

impl Section for PicListConfig {
    const KEY: &'static str = "piclist-config";

    /// A server URL without an `http(s)://` scheme counts as missing.
    fn missing_fields(&self) -> Vec<&'static str> {
        if !is_http_url(self.server_url.trim()) {
            vec!["serverUrl"]
        } else {
            Vec::new()
        }
    }
}

/// Which backend uploads go to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadMethodConfig {
    pub upload_method: UploadMethod,
}

impl Section for UploadMethodConfig {
    const KEY: &'static str = "upload-method";
}

/// Options forwarded to the remote Markdown renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub enable_lint: bool,
    pub enable_footnote_links: bool,
    pub footnote_label: String,
    pub open_links_in_new_window: bool,
    pub reference_title: String,
    pub code_theme: String,
    pub markdown_style: String,
    pub platform: String,
    pub custom_css: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            enable_lint: false,
            enable_footnote_links: true,
            footnote_label: "Footnotes".to_string(),
            open_links_in_new_window: true,
            reference_title: "References".to_string(),
            code_theme: "kimbie-light".to_string(),
            markdown_style: "ayu-light".to_string(),
            platform: "html".to_string(),
            custom_css: String::new(),
        }
    }
}

impl Section for RenderOptions {
    const KEY: &'static str = "render-config";
}

/// Settings snapshot used for one upload or export operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSettings {
    pub method: UploadMethod,
    pub s3: S3Config,
    pub piclist: PicListConfig,
}

impl UploadSettings {
    /// Read the upload-related sections from a settings store.
    pub fn load(store: &impl SettingsStore) -> Result<Self> {
        Ok(Self {
            method: store.load::<UploadMethodConfig>()?.upload_method,
            s3: store.load()?,
            piclist: store.load()?,
        })
    }

    /// Same settings with a different backend selected.
    #[must_use]
    pub fn with_method(mut self, method: UploadMethod) -> Self {
        self.method = method;
        self
    }

    /// Validate the selected backend's required fields.
    pub fn validate(&self) -> Result<()> {
        match self.method {
            UploadMethod::S3 => self.s3.validate(),
            UploadMethod::PicList => self.piclist.validate(),
        }
    }

    /// Markdown prefix and suffix configured for the selected backend.
    #[must_use]
    pub fn affixes(&self) -> (&str, &str) {
        match self.method {
            UploadMethod::S3 => (self.s3.md_prefix.as_str(), self.s3.md_suffix.as_str()),
            UploadMethod::PicList => (
                self.piclist.md_prefix.as_str(),
                self.piclist.md_suffix.as_str(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn complete_s3() -> S3Config {
        S3Config {
            endpoint: "https://s3.example.com".to_string(),
            access_key: "AKID123".to_string(),
            secret_key: "SECRET123".to_string(),
            bucket: "notes".to_string(),
            ..S3Config::default()
        }
    }

    #[test]
    fn s3_defaults_to_us_east_1() {
        let config = S3Config::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(
            S3Config {
                region: "  ".to_string(),
                ..complete_s3()
            }
            .region_or_default(),
            "us-east-1"
        );
    }

    #[test]
    fn s3_validate_names_missing_bucket() {
        let config = S3Config {
            bucket: String::new(),
            ..complete_s3()
        };
        match config.validate().unwrap_err() {
            Error::ConfigIncomplete { backend, missing } => {
                assert_eq!(backend, "S3");
                assert_eq!(missing, vec!["bucket"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(complete_s3().validate().is_ok());
    }

    #[test]
    fn s3_deserializes_camel_case_with_defaults() {
        let config: S3Config = serde_json::from_str(
            r#"{"endpoint":"https://s3.example.com","accessKey":"a","secretKey":"b","bucket":"c"}"#,
        )
        .unwrap();
        assert_eq!(config.access_key, "a");
        assert_eq!(config.region, "us-east-1");
        assert!(config.md_prefix.is_empty());
    }

    #[test]
    fn s3_redacted_masks_credentials() {
        let redacted = complete_s3().redacted();
        assert_eq!(redacted.access_key, "***D123");
        assert_eq!(redacted.secret_key, "*****T123");
        assert_eq!(redacted.bucket, "notes");
    }

    #[test]
    fn piclist_accepts_legacy_field_names() {
        let config: PicListConfig = serde_json::from_str(
            r#"{"piclistServerUrl":"http://localhost:36677","piclistApiKey":"k","piclistFileField":"file"}"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://localhost:36677");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.file_field_or_default(), "file");
    }

    #[test]
    fn piclist_requires_server_url_only() {
        let mut config = PicListConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.file_field_or_default(), "image");

        config.server_url = " ".to_string();
        assert_eq!(config.missing_fields(), vec!["serverUrl"]);
        config.server_url = "127.0.0.1:36677".to_string();
        assert_eq!(config.missing_fields(), vec!["serverUrl"]);
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigIncomplete {
                backend: "PicList",
                ..
            })
        ));
    }

    #[test]
    fn upload_method_parses_and_serializes_lowercase() {
        assert_eq!("S3".parse::<UploadMethod>().unwrap(), UploadMethod::S3);
        assert_eq!(
            "piclist".parse::<UploadMethod>().unwrap(),
            UploadMethod::PicList
        );
        assert!("ftp".parse::<UploadMethod>().is_err());
        assert_eq!(
            serde_json::to_string(&UploadMethodConfig {
                upload_method: UploadMethod::PicList
            })
            .unwrap(),
            r#"{"uploadMethod":"piclist"}"#
        );
    }

    #[test]
    fn upload_settings_affixes_follow_selected_method() {
        let settings = UploadSettings {
            method: UploadMethod::PicList,
            s3: S3Config {
                md_prefix: "s3-top".to_string(),
                ..complete_s3()
            },
            piclist: PicListConfig {
                md_prefix: "pic-top".to_string(),
                md_suffix: "pic-end".to_string(),
                ..PicListConfig::default()
            },
        };
        assert_eq!(settings.affixes(), ("pic-top", "pic-end"));
        assert_eq!(
            settings.with_method(UploadMethod::S3).affixes(),
            ("s3-top", "")
        );
    }

    #[test]
    fn render_options_defaults_match_renderer_defaults() {
        let options = RenderOptions::default();
        assert!(!options.enable_lint);
        assert!(options.enable_footnote_links);
        assert_eq!(options.code_theme, "kimbie-light");
        assert_eq!(options.markdown_style, "ayu-light");
        assert_eq!(options.platform, "html");
    }
}
