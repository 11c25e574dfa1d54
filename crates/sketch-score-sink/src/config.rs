use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Where diagnostic artifacts go. Both outputs are optional and independent.
#[derive(Clone, Debug, Default)]
pub struct DumpConfig {
    pub images: Option<ImageDumpConfig>,
    /// JSON file receiving the full score report.
    pub report_path: Option<PathBuf>,
}

impl DumpConfig {
    pub fn new(
        dump_dir: Option<PathBuf>,
        format: ImageOutputFormat,
        report_path: Option<PathBuf>,
    ) -> Self {
        Self {
            images: dump_dir.map(|directory| ImageDumpConfig { directory, format }),
            report_path,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.images.is_some() || self.report_path.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ImageDumpConfig {
    pub directory: PathBuf,
    pub format: ImageOutputFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageOutputFormat {
    Jpeg {
        quality: u8,
    },
    #[default]
    Png,
    Webp,
}

impl ImageOutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageOutputFormat::Jpeg { .. } => "jpg",
            ImageOutputFormat::Png => "png",
            ImageOutputFormat::Webp => "webp",
        }
    }
}

#[derive(Debug)]
pub struct ImageOutputFormatParseError(pub String);

impl fmt::Display for ImageOutputFormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dump format '{}'", self.0)
    }
}

impl std::error::Error for ImageOutputFormatParseError {}

impl FromStr for ImageOutputFormat {
    type Err = ImageOutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "png" => Ok(ImageOutputFormat::Png),
            "jpg" | "jpeg" => Ok(ImageOutputFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            }),
            "webp" => Ok(ImageOutputFormat::Webp),
            _ => Err(ImageOutputFormatParseError(lower)),
        }
    }
}
