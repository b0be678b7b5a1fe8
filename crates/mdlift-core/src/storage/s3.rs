//! S3-compatible object storage backend.

use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::AssetUploader;
use crate::config::{S3Config, UploadMethod};
use crate::source::Asset;
use crate::{Error, Result};

/// Key namespace uploaded assets are stored under.
pub const ASSET_KEY_PREFIX: &str = "siyuan-assets";

/// S3-compatible storage client for one configured bucket.
#[derive(Clone, Debug)]
pub struct S3Storage {
    config: S3Config,
    client: Client,
}

impl S3Storage {
    /// Build a client for the given settings.
    ///
    /// Settings are not validated here; callers validate before uploading.
    #[must_use]
    pub fn new(config: S3Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &S3Config {
        &self.config
    }

    /// Object key for an asset path: `siyuan-assets/<file name>`.
    #[must_use]
    pub fn object_key_for(&self, asset: &Asset) -> String {
        format!("{ASSET_KEY_PREFIX}/{}", asset.file_name())
    }

    /// Public URL of an object: `<endpoint>/<bucket>/<key>`.
    ///
    /// Plain concatenation; a trailing slash on the endpoint is kept.
    #[must_use]
    pub fn public_object_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}/{object_key}",
            self.config.endpoint.trim(),
            self.config.bucket.trim()
        )
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.config.validate()?;
        self.client
            .head_bucket()
            .bucket(self.config.bucket.trim())
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, error))?;
        Ok(())
    }

    /// Upload object bytes to the configured bucket.
    pub async fn upload_bytes(
        &self,
        object_key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<()> {
        let object_key = normalize_object_key(object_key)?;
        let bucket = self.config.bucket.trim();

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()));

        if let Some(content_type) = normalize_content_type(content_type) {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|error| storage_error("put_object", bucket, Some(&object_key), error))?;

        Ok(())
    }
}

impl AssetUploader for S3Storage {
    fn method(&self) -> UploadMethod {
        UploadMethod::S3
    }

    async fn upload_asset(&self, asset: &Asset) -> Result<String> {
        let object_key = self.object_key_for(asset);
        let content_type = asset.content_type_or_guess();
        self.upload_bytes(&object_key, &asset.bytes, Some(&content_type))
            .await?;
        Ok(self.public_object_url(&object_key))
    }
}

fn build_s3_client(config: &S3Config) -> Client {
    let credentials = Credentials::new(
        config.access_key.trim(),
        config.secret_key.trim(),
        None,
        None,
        "mdlift-s3-storage",
    );

    let mut builder = aws_sdk_s3::config::Builder::new()
        .region(Region::new(config.region_or_default().to_string()))
        .credentials_provider(credentials)
        .force_path_style(true);

    let endpoint = config.endpoint.trim();
    if !endpoint.is_empty() {
        builder = builder.endpoint_url(endpoint);
    }

    Client::from_conf(builder.build())
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::Storage(format!("S3 {operation} failed for {target}: {error}"))
}

fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::InvalidInput(
            "Object key cannot be empty".to_string(),
        ));
    }
    Ok(object_key)
}

fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use std::env;

    use pretty_assertions::assert_eq;

    use super::*;

    fn storage() -> S3Storage {
        S3Storage::new(S3Config {
            endpoint: "https://s3.example.com".to_string(),
            access_key: "AKID123".to_string(),
            secret_key: "SECRET123".to_string(),
            bucket: "notes".to_string(),
            ..S3Config::default()
        })
    }

    #[tokio::test(flavor = "current_thread")]
    async fn object_key_uses_asset_basename() {
        let storage = storage();
        assert_eq!(
            storage.object_key_for(&Asset::new("assets/2024/photo one.png", vec![])),
            "siyuan-assets/photo one.png"
        );
        assert_eq!(
            storage.object_key_for(&Asset::new("", vec![])),
            "siyuan-assets/unnamed-file"
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn public_url_joins_endpoint_bucket_and_key() {
        assert_eq!(
            storage().public_object_url("siyuan-assets/a.png"),
            "https://s3.example.com/notes/siyuan-assets/a.png"
        );

        let trailing = S3Storage::new(S3Config {
            endpoint: "https://s3.example.com/".to_string(),
            ..storage().config().clone()
        });
        assert_eq!(
            trailing.public_object_url("siyuan-assets/a.png"),
            "https://s3.example.com//notes/siyuan-assets/a.png"
        );
    }

    #[test]
    fn normalize_object_key_rejects_empty() {
        let err = normalize_object_key("   ").unwrap_err();
        match err {
            Error::InvalidInput(message) => assert!(message.contains("Object key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn normalize_content_type_ignores_empty_values() {
        assert_eq!(normalize_content_type(None), None);
        assert_eq!(normalize_content_type(Some("   ")), None);
        assert_eq!(
            normalize_content_type(Some(" image/png ")),
            Some("image/png".to_string())
        );
    }

    fn config_from_env() -> S3Config {
        let _ = dotenvy::dotenv();
        let var = |key: &str| env::var(key).unwrap_or_default();
        S3Config {
            endpoint: var("MDLIFT_S3_ENDPOINT"),
            access_key: var("MDLIFT_S3_ACCESS_KEY"),
            secret_key: var("MDLIFT_S3_SECRET_KEY"),
            bucket: var("MDLIFT_S3_BUCKET"),
            region: var("MDLIFT_S3_REGION"),
            ..S3Config::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires MDLIFT_S3_* env vars plus network access"]
    async fn s3_bucket_exists_and_is_reachable() {
        let config = config_from_env();
        let storage = S3Storage::new(config.clone());

        storage.bucket_is_reachable().await.unwrap_or_else(|error| {
            panic!(
                "S3 bucket health check failed for bucket '{}': {error}",
                config.bucket
            )
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires MDLIFT_S3_* env vars plus network access"]
    async fn s3_asset_upload_returns_public_url() {
        let storage = S3Storage::new(config_from_env());
        let asset = Asset::new("assets/mdlift-roundtrip.txt", b"mdlift-roundtrip".to_vec());

        let url = storage
            .upload_asset(&asset)
            .await
            .unwrap_or_else(|error| panic!("S3 upload failed: {error}"));
        assert!(url.ends_with("/siyuan-assets/mdlift-roundtrip.txt"));
    }
}
