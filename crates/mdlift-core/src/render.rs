//! Client for the bm.md Markdown rendering service.

use std::time::Duration;

use reqwest::Request;
use serde::{Deserialize, Serialize};

use crate::config::RenderOptions;
use crate::export::ExportDocument;
use crate::util::{compact_text, normalize_base_url};
use crate::{Error, Result};

/// Public bm.md API base.
pub const DEFAULT_RENDER_API_URL: &str = "https://bm.md/api";

const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// A document rendered to HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub document: ExportDocument,
    /// HTML exactly as the renderer returned it.
    pub fragment: String,
    /// Standalone page wrapping the fragment.
    pub page: String,
}

/// Renders Markdown remotely, either to HTML or to linted Markdown.
#[derive(Debug, Clone)]
pub struct RenderClient {
    base_url: String,
    client: reqwest::Client,
}

impl RenderClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into(), "Render API URL")?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Render Markdown to an HTML fragment.
    pub async fn render_html(&self, markdown: &str, options: &RenderOptions) -> Result<String> {
        let response = self.send("/render", markdown, options).await?;
        response.html.ok_or_else(|| {
            Error::Render("Renderer reported success but returned no HTML".to_string())
        })
    }

    /// Send Markdown through the renderer and get normalized Markdown back.
    pub async fn render_markdown(&self, markdown: &str, options: &RenderOptions) -> Result<String> {
        let response = self.send("/render/markdown", markdown, options).await?;
        response.markdown.ok_or_else(|| {
            Error::Render("Renderer reported success but returned no Markdown".to_string())
        })
    }

    async fn send(
        &self,
        route: &str,
        markdown: &str,
        options: &RenderOptions,
    ) -> Result<RenderResponse> {
        let request = self.build_render_request(route, markdown, options)?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Render(format!(
                "{route} failed with HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }
        parse_render_response(&body)
    }

    fn build_render_request(
        &self,
        route: &str,
        markdown: &str,
        options: &RenderOptions,
    ) -> Result<Request> {
        Ok(self
            .client
            .post(format!("{}{route}", self.base_url))
            .timeout(RENDER_TIMEOUT)
            .json(&RenderRequest { markdown, options })
            .build()?)
    }
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    markdown: &'a str,
    #[serde(flatten)]
    options: &'a RenderOptions,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    #[serde(default)]
    success: bool,
    html: Option<String>,
    markdown: Option<String>,
    error: Option<String>,
}

fn parse_render_response(body: &str) -> Result<RenderResponse> {
    let response: RenderResponse = serde_json::from_str(body).map_err(|error| {
        Error::Render(format!(
            "Unreadable renderer response ({error}): {}",
            compact_text(body)
        ))
    })?;
    if !response.success {
        let reason = response
            .error
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Error::Render(format!("Rendering failed: {reason}")));
    }
    Ok(response)
}

/// Wrap a rendered fragment in a standalone HTML5 document.
///
/// A `<style>` block is added only when custom CSS is configured.
#[must_use]
pub fn wrap_html_document(title: &str, html: &str, options: &RenderOptions) -> String {
    let style = if options.custom_css.trim().is_empty() {
        String::new()
    } else {
        format!("  <style>\n{}\n  </style>\n", options.custom_css)
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>{}</title>\n{style}</head>\n<body>\n{html}\n</body>\n</html>\n",
        escape_html(title)
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;

    #[test]
    fn render_request_flattens_options_into_body() {
        let client = RenderClient::new(DEFAULT_RENDER_API_URL).unwrap();
        let request = client
            .build_render_request("/render", "# Hi", &RenderOptions::default())
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://bm.md/api/render");
        assert_eq!(request.timeout(), Some(&RENDER_TIMEOUT));

        let body: Value =
            serde_json::from_slice(request.body().and_then(|body| body.as_bytes()).unwrap())
                .unwrap();
        assert_eq!(body["markdown"], "# Hi");
        assert_eq!(body["codeTheme"], "kimbie-light");
        assert_eq!(body["enableFootnoteLinks"], true);
        assert_eq!(body["customCss"], "");
    }

    #[test]
    fn parse_render_response_reports_failure() {
        let response =
            parse_render_response(r#"{"success":true,"html":"<h1>Hi</h1>"}"#).unwrap();
        assert_eq!(response.html.as_deref(), Some("<h1>Hi</h1>"));

        let error =
            parse_render_response(r#"{"success":false,"error":"bad theme"}"#).unwrap_err();
        assert_eq!(error.to_string(), "Render error: Rendering failed: bad theme");

        assert!(parse_render_response("not json").is_err());
    }

    #[test]
    fn wrap_html_document_adds_style_only_with_custom_css() {
        let plain = wrap_html_document("Notes", "<p>x</p>", &RenderOptions::default());
        assert!(plain.starts_with("<!DOCTYPE html>"));
        assert!(plain.contains("<title>Notes</title>"));
        assert!(plain.contains("<body>\n<p>x</p>\n</body>"));
        assert!(!plain.contains("<style>"));

        let options = RenderOptions {
            custom_css: "body { color: red; }".to_string(),
            ..RenderOptions::default()
        };
        let styled = wrap_html_document("A <b> & \"c\"", "<p>x</p>", &options);
        assert!(styled.contains("<style>\nbody { color: red; }\n  </style>"));
        assert!(styled.contains("<title>A &lt;b&gt; &amp; &quot;c&quot;</title>"));
    }
}
