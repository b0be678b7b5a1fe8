use std::path::Path;

use mdlift_core::markdown::extract_image_paths;

use crate::error::CliError;

pub fn run_extract(file: &Path, json: bool) -> Result<(), CliError> {
    let text = std::fs::read_to_string(file)?;
    let paths = extract_image_paths(&text);
    tracing::debug!(file = %file.display(), count = paths.len(), "Extracted image paths");
    let output = format_extract_output(&paths, json)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

pub fn format_extract_output(paths: &[String], json: bool) -> Result<String, CliError> {
    if json {
        Ok(serde_json::to_string_pretty(paths)?)
    } else {
        Ok(paths.join("\n"))
    }
}
