//! Markdown image reference extraction and link rewriting.
//!
//! Scanning is pattern based rather than a full Markdown parse: an image
//! embed is anything shaped like `![alt](path)` on a single line.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::upload::UploadResult;

static IMAGE_EMBED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("Invalid regex"));

/// Return the paths referenced by image embeds, in document order.
///
/// Duplicates are preserved and ordinary `[text](link)` links are ignored.
/// A malformed occurrence simply does not match.
#[must_use]
pub fn extract_image_paths(text: &str) -> Vec<String> {
    IMAGE_EMBED
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Decode the URL-escaped spaces the editor writes into asset links.
#[must_use]
pub fn decode_asset_path(path: &str) -> String {
    path.replace("%20", " ")
}

/// Rewrite image embeds whose path was uploaded successfully.
///
/// Every occurrence of a mapped path is rewritten, keeping its alt text.
/// Paths without a successful upload are left exactly as they were.
#[must_use]
pub fn replace_image_links(text: &str, results: &[UploadResult]) -> String {
    let mut mapping: Vec<(&str, &str)> = Vec::new();
    for result in results.iter().filter(|r| r.success && !r.url.is_empty()) {
        let existing = mapping
            .iter()
            .position(|(path, _)| *path == result.original_path);
        match existing {
            Some(index) => mapping[index].1 = result.url.as_str(),
            None => mapping.push((result.original_path.as_str(), result.url.as_str())),
        }
    }

    let mut updated = text.to_string();
    for (original_path, new_url) in mapping {
        // Alt text may hold balanced `[...]` pairs but never a bare `]`, so a
        // match cannot start inside a neighbouring embed.
        let pattern = format!(
            r"!\[((?:[^\[\]\n]|\[[^\[\]\n]*\])*)\]\({}\)",
            regex::escape(original_path)
        );
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(error) => {
                tracing::warn!(path = original_path, %error, "Skipping unrewritable image path");
                continue;
            }
        };
        updated = re
            .replace_all(&updated, |caps: &Captures<'_>| {
                format!("![{}]({new_url})", &caps[1])
            })
            .into_owned();
    }

    updated
}

/// Wrap exported Markdown with the backend's configured prefix and suffix.
#[must_use]
pub fn apply_affixes(text: &str, prefix: &str, suffix: &str) -> String {
    let mut output = String::with_capacity(text.len() + prefix.len() + suffix.len() + 2);
    if !prefix.is_empty() {
        output.push_str(prefix);
        output.push('\n');
    }
    output.push_str(text);
    if !suffix.is_empty() {
        if !text.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(suffix);
    }
    output
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ok(path: &str, url: &str) -> UploadResult {
        UploadResult::succeeded(path, url)
    }

    #[test]
    fn extract_returns_paths_in_document_order() {
        let text = "intro ![one](assets/a.png)\n\
                    [not an image](https://example.com)\n\
                    ![two](assets/b.jpg) and ![](assets/a.png)";
        assert_eq!(
            extract_image_paths(text),
            vec!["assets/a.png", "assets/b.jpg", "assets/a.png"]
        );
    }

    #[test]
    fn extract_ignores_malformed_embeds() {
        let text = "![broken(assets/a.png)\n![ok](assets/b.png)\n![unclosed](assets/c.png";
        assert_eq!(extract_image_paths(text), vec!["assets/b.png"]);
    }

    #[test]
    fn extract_handles_empty_text() {
        assert!(extract_image_paths("").is_empty());
        assert!(extract_image_paths("no images here").is_empty());
    }

    #[test]
    fn decode_asset_path_restores_spaces() {
        assert_eq!(
            decode_asset_path("assets/my%20photo%20one.png"),
            "assets/my photo one.png"
        );
        assert_eq!(decode_asset_path("assets/plain.png"), "assets/plain.png");
    }

    #[test]
    fn replace_with_no_results_is_noop() {
        let text = "![a](img1.png) text ![b](img2.png)";
        assert_eq!(replace_image_links(text, &[]), text);
    }

    #[test]
    fn replace_rewrites_every_occurrence_and_keeps_alt() {
        let text = "![a](img1.png) and ![b](img1.png)";
        let rewritten = replace_image_links(text, &[ok("img1.png", "https://cdn/x.png")]);
        assert_eq!(
            rewritten,
            "![a](https://cdn/x.png) and ![b](https://cdn/x.png)"
        );
    }

    #[test]
    fn replace_leaves_failed_paths_untouched() {
        let text = "![keep](local.png) ![swap](remote.png)\n![keep again](local.png)";
        let results = vec![
            UploadResult::failed("local.png", "network down"),
            ok("remote.png", "https://cdn/remote.png"),
        ];
        assert_eq!(
            replace_image_links(text, &results),
            "![keep](local.png) ![swap](https://cdn/remote.png)\n![keep again](local.png)"
        );
    }

    #[test]
    fn replace_escapes_regex_metacharacters_in_paths() {
        let text = "![x](assets/a+b (1).png) ![y](assets/aab (1)xpng)";
        let rewritten = replace_image_links(text, &[ok("assets/a+b (1).png", "https://cdn/1.png")]);
        assert_eq!(
            rewritten,
            "![x](https://cdn/1.png) ![y](assets/aab (1)xpng)"
        );
    }

    #[test]
    fn replace_ignores_plain_links_to_same_path() {
        let text = "[download](img1.png) ![shown](img1.png)";
        let rewritten = replace_image_links(text, &[ok("img1.png", "https://cdn/x.png")]);
        assert_eq!(rewritten, "[download](img1.png) ![shown](https://cdn/x.png)");
    }

    #[test]
    fn replace_handles_bracketed_alt_text() {
        let text = "![Figure [1]](img.png) and ![a](other.png) ![b [c] d](img.png)";
        assert_eq!(extract_image_paths(text), vec!["img.png", "other.png", "img.png"]);

        let rewritten = replace_image_links(text, &[ok("img.png", "https://cdn/x.png")]);
        assert_eq!(
            rewritten,
            "![Figure [1]](https://cdn/x.png) and ![a](other.png) ![b [c] d](https://cdn/x.png)"
        );
    }

    #[test]
    fn replace_does_not_reach_across_neighbouring_embeds() {
        let text = "![a](other.png) ![b](img.png)";
        let rewritten = replace_image_links(text, &[ok("img.png", "https://cdn/x.png")]);
        assert_eq!(rewritten, "![a](other.png) ![b](https://cdn/x.png)");
    }

    #[test]
    fn replace_uses_last_successful_url_for_duplicate_results() {
        let text = "![a](img.png)";
        let results = vec![
            ok("img.png", "https://cdn/first.png"),
            ok("img.png", "https://cdn/second.png"),
        ];
        assert_eq!(
            replace_image_links(text, &results),
            "![a](https://cdn/second.png)"
        );
    }

    #[test]
    fn apply_affixes_skips_empty_values() {
        assert_eq!(apply_affixes("body", "", ""), "body");
        assert_eq!(apply_affixes("body", "> header", ""), "> header\nbody");
        assert_eq!(apply_affixes("body\n", "", "footer"), "body\nfooter");
        assert_eq!(apply_affixes("body", "top", "end"), "top\nbody\nend");
    }
}
