//! HTTP client for a running note application's kernel API.
//!
//! Every endpoint is a JSON `POST` answered with a `{code, msg, data}`
//! envelope; a non-zero `code` is an application-level failure.

use reqwest::{Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Asset, AssetSource, DocumentSource, ExportDocument};
use crate::util::{compact_text, is_http_url, normalize_base_url, normalize_text_option};
use crate::{Error, Result};

const EXPORT_MARKDOWN_ROUTE: &str = "/api/export/exportMdContent";
const BLOCK_INFO_ROUTE: &str = "/api/block/getBlockInfo";
const GET_FILE_ROUTE: &str = "/api/file/getFile";

/// Kernel API client authenticated with an optional API token.
#[derive(Debug, Clone)]
pub struct HostApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HostApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into(), "Host URL")?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            token: normalize_text_option(token),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Export a document as Markdown.
    pub async fn export_markdown(&self, id: &str) -> Result<String> {
        let data: ExportedMarkdown = self.call(EXPORT_MARKDOWN_ROUTE, &json!({ "id": id })).await?;
        Ok(data.content)
    }

    /// Resolve a document title, falling back to the id on any failure.
    pub async fn document_title(&self, id: &str) -> String {
        match self
            .call::<BlockInfo>(BLOCK_INFO_ROUTE, &json!({ "id": id }))
            .await
        {
            Ok(info) => info.title().unwrap_or(id).to_string(),
            Err(error) => {
                tracing::warn!(id, %error, "Could not resolve document title");
                id.to_string()
            }
        }
    }

    /// Read a workspace file below `data/`.
    pub async fn get_file(&self, path: &str) -> Result<(Vec<u8>, Option<String>)> {
        let request = self.build_request(GET_FILE_ROUTE, &get_file_body(path))?;
        let response = self.client.execute(request).await?;
        let status = response.status();

        // Missing files are reported as 202 with an envelope body.
        if status == StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(envelope_failure(GET_FILE_ROUTE, &body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Host(format!(
                "{GET_FILE_ROUTE} failed with HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }

    fn build_request(&self, route: &str, body: &Value) -> Result<Request> {
        let mut request = self
            .client
            .post(format!("{}{route}", self.base_url))
            .json(body);
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Token {token}"));
        }
        Ok(request.build()?)
    }

    async fn call<T: DeserializeOwned>(&self, route: &str, body: &Value) -> Result<T> {
        let request = self.build_request(route, body)?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Host(format!(
                "{route} failed with HTTP {}: {}",
                status.as_u16(),
                compact_text(&text)
            )));
        }
        parse_envelope(route, &text)
    }
}

impl DocumentSource for HostApiClient {
    async fn load_document(&self, id: &str) -> Result<ExportDocument> {
        let content = self.export_markdown(id).await?;
        let title = self.document_title(id).await;
        Ok(ExportDocument::new(id, content).with_title(title))
    }
}

impl AssetSource for HostApiClient {
    async fn fetch_asset(&self, path: &str) -> Result<Asset> {
        if is_http_url(path.trim()) {
            return Err(Error::InvalidInput(format!("Asset is already remote: {path}")));
        }
        let (bytes, content_type) = self.get_file(path).await?;
        tracing::debug!(path, bytes = bytes.len(), "Fetched asset from host");
        Ok(Asset {
            path: path.to_string(),
            bytes,
            content_type,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ExportedMarkdown {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BlockInfo {
    root_title: Option<String>,
    name: Option<String>,
}

impl BlockInfo {
    fn title(&self) -> Option<&str> {
        [self.root_title.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

fn get_file_body(path: &str) -> Value {
    json!({ "path": format!("/data/{}", path.trim().trim_start_matches('/')) })
}

fn parse_envelope<T: DeserializeOwned>(route: &str, body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|error| {
        Error::Host(format!(
            "{route} returned an unreadable response ({error}): {}",
            compact_text(body)
        ))
    })?;
    if envelope.code != 0 {
        return Err(Error::Host(format!(
            "{route} failed with code {}: {}",
            envelope.code, envelope.msg
        )));
    }
    envelope
        .data
        .ok_or_else(|| Error::Host(format!("{route} returned no data")))
}

fn envelope_failure(route: &str, body: &str) -> Error {
    match parse_envelope::<Value>(route, body) {
        Err(error) => error,
        Ok(_) => Error::Host(format!("{route} did not return file content")),
    }
}
