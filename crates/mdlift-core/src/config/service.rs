//! Typed request/response interface between a settings UI and the store.

use serde::{Deserialize, Serialize};

use super::{
    PicListConfig, RenderOptions, S3Config, Section, SettingsStore, UploadMethod,
    UploadMethodConfig,
};
use crate::Result;

/// Commands a settings surface can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "data", rename_all = "camelCase")]
pub enum SettingsCommand {
    SaveS3(S3Config),
    GetS3Status,
    SavePicList(PicListConfig),
    GetPicListStatus,
    SaveUploadMethod(UploadMethod),
    GetUploadMethod,
    SaveRender(RenderOptions),
    GetRender,
}

/// Configuration state of one backend section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus<T> {
    pub configured: bool,
    pub missing: Vec<String>,
    pub config: T,
}

impl<T: Section> SectionStatus<T> {
    fn of(config: T) -> Self {
        Self {
            configured: config.is_configured(),
            missing: config
                .missing_fields()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            config,
        }
    }
}

/// Replies to [`SettingsCommand`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "data", rename_all = "camelCase")]
pub enum SettingsReply {
    Saved,
    S3Status(SectionStatus<S3Config>),
    PicListStatus(SectionStatus<PicListConfig>),
    UploadMethod(UploadMethod),
    Render(RenderOptions),
}

/// Dispatches settings commands against a store.
#[derive(Debug)]
pub struct SettingsService<S> {
    store: S,
}

impl<S: SettingsStore> SettingsService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn handle(&self, command: SettingsCommand) -> Result<SettingsReply> {
        match command {
            SettingsCommand::SaveS3(config) => self.save(&config),
            SettingsCommand::GetS3Status => Ok(SettingsReply::S3Status(SectionStatus::of(
                self.store.load::<S3Config>()?,
            ))),
            SettingsCommand::SavePicList(config) => self.save(&config),
            SettingsCommand::GetPicListStatus => Ok(SettingsReply::PicListStatus(
                SectionStatus::of(self.store.load::<PicListConfig>()?),
            )),
            SettingsCommand::SaveUploadMethod(upload_method) => {
                self.save(&UploadMethodConfig { upload_method })
            }
            SettingsCommand::GetUploadMethod => Ok(SettingsReply::UploadMethod(
                self.store.load::<UploadMethodConfig>()?.upload_method,
            )),
            SettingsCommand::SaveRender(options) => self.save(&options),
            SettingsCommand::GetRender => Ok(SettingsReply::Render(self.store.load()?)),
        }
    }

    fn save<T: Section>(&self, value: &T) -> Result<SettingsReply> {
        self.store.save(value)?;
        tracing::info!(key = T::KEY, "Settings saved");
        Ok(SettingsReply::Saved)
    }
}
