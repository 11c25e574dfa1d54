//! Best-effort diagnostic outputs for the comparator: mask images and a JSON
//! score report.

pub mod config;
pub mod dump;

pub use config::{DEFAULT_JPEG_QUALITY, DumpConfig, ImageDumpConfig, ImageOutputFormat};
pub use dump::{DumpError, DumpSink};
