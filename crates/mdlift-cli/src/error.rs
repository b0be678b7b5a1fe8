use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] mdlift_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Follow-up advice printed after the error message.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Core(mdlift_core::Error::ConfigIncomplete { backend, missing }) => {
                let command = if *backend == "PicList" { "piclist" } else { "s3" };
                let flags = missing
                    .iter()
                    .map(|field| format!("--{}", kebab_case(field)))
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(format!("Set them with `mdlift config {command} {flags} ...`"))
            }
            _ => None,
        }
    }
}

fn kebab_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 2);
    for ch in field.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
