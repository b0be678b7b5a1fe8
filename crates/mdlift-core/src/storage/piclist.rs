//! PicList image-hosting server backend.
//!
//! PicList accepts a multipart `POST /upload` and answers with
//! `{success, result: [url], message}`.

use reqwest::{multipart, Request};
use serde::Deserialize;

use super::AssetUploader;
use crate::config::{PicListConfig, UploadMethod};
use crate::source::Asset;
use crate::util::{compact_text, normalize_base_url};
use crate::{Error, Result};

/// Client for one PicList server.
#[derive(Debug, Clone)]
pub struct PicListClient {
    config: PicListConfig,
    base_url: String,
    client: reqwest::Client,
}

impl PicListClient {
    pub fn new(config: PicListConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.server_url, "PicList server URL")?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PicListConfig {
        &self.config
    }

    fn build_upload_request(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Request> {
        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form =
            multipart::Form::new().part(self.config.file_field_or_default().to_string(), file_part);

        let mut request = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form);
        let api_key = self.config.api_key.trim();
        if !api_key.is_empty() {
            request = request.query(&[("key", api_key)]);
        }
        Ok(request.build()?)
    }
}

impl AssetUploader for PicListClient {
    fn method(&self) -> UploadMethod {
        UploadMethod::PicList
    }

    async fn upload_asset(&self, asset: &Asset) -> Result<String> {
        let request = self.build_upload_request(
            asset.file_name(),
            &asset.content_type_or_guess(),
            asset.bytes.clone(),
        )?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Upload(format!(
                "PicList upload failed with HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }
        parse_upload_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Vec<String>,
    #[serde(default)]
    message: Option<String>,
}

fn parse_upload_response(body: &str) -> Result<String> {
    let payload: UploadResponse = serde_json::from_str(body).map_err(|error| {
        Error::Upload(format!(
            "Unreadable PicList response ({error}): {}",
            compact_text(body)
        ))
    })?;

    if !payload.success {
        let reason = payload
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "no reason given".to_string());
        return Err(Error::Upload(format!("PicList rejected the upload: {reason}")));
    }

    payload
        .result
        .into_iter()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .ok_or_else(|| Error::Upload("PicList returned no URL".to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn client(api_key: &str, file_field: &str) -> PicListClient {
        PicListClient::new(PicListConfig {
            api_key: api_key.to_string(),
            file_field: file_field.to_string(),
            ..PicListConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn upload_request_shape_is_correct() {
        let request = client("secret", "")
            .build_upload_request("photo.png", "image/png", vec![0, 1, 2])
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:36677/upload?key=secret"
        );
        let content_type = request
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[test]
    fn upload_request_skips_key_when_unset() {
        let request = client("", "file")
            .build_upload_request("photo.png", "image/png", vec![0])
            .unwrap();
        assert_eq!(request.url().as_str(), "http://127.0.0.1:36677/upload");
    }

    #[test]
    fn new_rejects_missing_server_url() {
        let error = PicListClient::new(PicListConfig {
            server_url: String::new(),
            ..PicListConfig::default()
        })
        .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[test]
    fn parse_upload_response_returns_first_url() {
        let url = parse_upload_response(
            r#"{"success":true,"result":["https://img.example.com/a.png"]}"#,
        )
        .unwrap();
        assert_eq!(url, "https://img.example.com/a.png");
    }

    #[test]
    fn parse_upload_response_reports_rejection() {
        let error =
            parse_upload_response(r#"{"success":false,"message":"server busy"}"#).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Upload error: PicList rejected the upload: server busy"
        );

        let error = parse_upload_response(r#"{"success":true,"result":[]}"#).unwrap_err();
        assert!(error.to_string().contains("no URL"));

        assert!(parse_upload_response("<html>").is_err());
    }
}
