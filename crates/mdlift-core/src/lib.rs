//! mdlift-core - Core library for mdlift
//!
//! Finds local image references in exported Markdown, uploads the assets to
//! an S3-compatible store or a PicList server, rewrites the links to their
//! public URLs, and packages the result as files, ZIP batches, clipboard
//! text, or rendered HTML.

pub mod config;
pub mod error;
pub mod export;
pub mod markdown;
pub mod notify;
pub mod render;
pub mod services;
pub mod source;
pub mod storage;
pub mod upload;
pub mod util;

pub use error::{Error, Result};
pub use export::ExportDocument;
pub use upload::{UploadOptions, UploadResult};
