//! Upload backends for embedded assets.

mod piclist;
mod s3;

use crate::config::UploadMethod;
use crate::source::Asset;
use crate::Result;

pub use piclist::PicListClient;
pub use s3::{S3Storage, ASSET_KEY_PREFIX};

/// A backend that stores one asset and returns its public URL.
#[allow(async_fn_in_trait)]
pub trait AssetUploader {
    /// Backend this uploader talks to.
    fn method(&self) -> UploadMethod;

    async fn upload_asset(&self, asset: &Asset) -> Result<String>;
}
