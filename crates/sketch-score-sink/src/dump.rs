use std::fs;
use std::path::{Path, PathBuf};

use sketch_score_comparator::{DiagnosticSink, ScoreReport};
use sketch_score_types::{BinaryMask, SketchRole};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{DumpConfig, ImageDumpConfig, ImageOutputFormat};

/// Writes pipeline intermediates to disk. Failures are logged and dropped so
/// a broken dump directory never changes the score.
pub struct DumpSink {
    config: DumpConfig,
}

impl DumpSink {
    pub fn new(config: DumpConfig) -> Self {
        Self { config }
    }

    fn dump_mask(&self, stage: &str, role: SketchRole, mask: &BinaryMask) {
        let Some(images) = &self.config.images else {
            return;
        };
        match write_mask(images, stage, role, mask) {
            Ok(path) => debug!(path = %path.display(), "wrote diagnostic mask"),
            Err(err) => warn!(%stage, %role, error = %err, "failed to write diagnostic mask"),
        }
    }
}

impl DiagnosticSink for DumpSink {
    fn name(&self) -> &'static str {
        "dump"
    }

    fn binarized(&self, role: SketchRole, mask: &BinaryMask) {
        self.dump_mask("binarized", role, mask);
    }

    fn canonical(&self, role: SketchRole, mask: &BinaryMask) {
        self.dump_mask("canonical", role, mask);
    }

    fn report(&self, report: &ScoreReport) {
        let Some(path) = &self.config.report_path else {
            return;
        };
        match write_report(path, report) {
            Ok(()) => debug!(path = %path.display(), "wrote score report"),
            Err(err) => warn!(path = %path.display(), error = %err, "failed to write score report"),
        }
    }
}

pub fn mask_file_name(stage: &str, role: SketchRole, format: ImageOutputFormat) -> String {
    format!("{stage}_{role}.{}", format.extension())
}

fn write_mask(
    images: &ImageDumpConfig,
    stage: &str,
    role: SketchRole,
    mask: &BinaryMask,
) -> Result<PathBuf, DumpError> {
    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::png::PngEncoder;
    use image::codecs::webp::WebPEncoder;
    use image::{ColorType, ImageEncoder};

    let width = u32::try_from(mask.width()).map_err(|_| DumpError::Dimensions {
        width: mask.width(),
        height: mask.height(),
    })?;
    let height = u32::try_from(mask.height()).map_err(|_| DumpError::Dimensions {
        width: mask.width(),
        height: mask.height(),
    })?;
    if width == 0 || height == 0 {
        return Err(DumpError::Dimensions {
            width: mask.width(),
            height: mask.height(),
        });
    }

    let buffer = mask.data();
    let mut encoded = Vec::new();
    match images.format {
        ImageOutputFormat::Jpeg { quality } => {
            let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
            encoder.encode(buffer, width, height, ColorType::L8)?;
        }
        ImageOutputFormat::Png => {
            let encoder = PngEncoder::new(&mut encoded);
            encoder.write_image(buffer, width, height, ColorType::L8)?;
        }
        ImageOutputFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut encoded);
            encoder.encode(buffer, width, height, ColorType::L8)?;
        }
    }

    fs::create_dir_all(&images.directory)?;
    let path = images
        .directory
        .join(mask_file_name(stage, role, images.format));
    fs::write(&path, encoded)?;
    Ok(path)
}

fn write_report(path: &Path, report: &ScoreReport) -> Result<(), DumpError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot encode a {width}x{height} mask")]
    Dimensions { width: usize, height: usize },
}
