use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::io::Reader as ImageReader;
use sketch_score_types::{GrayGrid, MaskError, SketchRole};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing {role} image argument")]
    MissingArgument { role: SketchRole },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{} has no pixels", .path.display())]
    Empty { path: PathBuf },
    #[error(transparent)]
    Raster(#[from] MaskError),
}

/// Resolves the path for `role`, failing when the argument was not given.
pub fn require_path(path: Option<&Path>, role: SketchRole) -> Result<&Path, LoadError> {
    path.ok_or(LoadError::MissingArgument { role })
}

/// Reads and decodes an image file into 8-bit grayscale.
///
/// The container format is sniffed from the file contents. Alpha is dropped
/// and color is reduced with BT.601 luma weights.
pub fn load_grayscale(path: &Path) -> Result<GrayGrid, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    let grid = to_gray_grid(image)?;
    debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        "loaded image"
    );
    Ok(grid)
}

pub fn to_gray_grid(image: DynamicImage) -> Result<GrayGrid, LoadError> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let data = match image {
        DynamicImage::ImageLuma8(buffer) => buffer.into_raw(),
        other => other
            .to_rgb8()
            .pixels()
            .map(|p| bt601_luma(p.0[0], p.0[1], p.0[2]))
            .collect(),
    };
    Ok(GrayGrid::from_owned(width, height, data)?)
}

/// Fixed-point `0.299 R + 0.587 G + 0.114 B`, rounded.
pub fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    const SHIFT: u32 = 14;
    let value = r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << (SHIFT - 1));
    (value >> SHIFT) as u8
}
