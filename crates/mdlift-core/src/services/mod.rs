//! Application services composed from the lower-level modules.

mod export;

pub use export::{ExportRequest, ExportService};
