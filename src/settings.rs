use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use sketch_score_comparator::{ComparisonError, ScoringConfig};
use sketch_score_sink::{DumpConfig, ImageOutputFormat};
use thiserror::Error;

use crate::cli::{CliArgs, CliSources};

const PROJECT_CONFIG_FILE: &str = "sketch-score.toml";
const DEFAULT_IMAGE_DUMP_DIR: &str = "sketch-debug";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    canonical_size: Option<usize>,
    tolerance_radius: Option<usize>,
    min_content_size: Option<usize>,
    report: Option<String>,
    binarize: Option<BinarizeFileConfig>,
    scoring: Option<ScoringFileConfig>,
    dump: Option<DumpFileConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BinarizeFileConfig {
    clahe_clip_limit: Option<f64>,
    clahe_tiles: Option<usize>,
    blur_kernel: Option<usize>,
    adaptive_block_size: Option<usize>,
    adaptive_offset: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScoringFileConfig {
    efficiency_ratio: Option<f64>,
    messiness_threshold: Option<f64>,
    bonus_precision_threshold: Option<f64>,
    bonus_weight: Option<f64>,
    completion_threshold: Option<f64>,
    completion_exponent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DumpFileConfig {
    enable: Option<bool>,
    dir: Option<String>,
    format: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub scoring: ScoringConfig,
    pub dump: DumpConfig,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for '{field}'{}", in_path(.path.as_deref()))]
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    #[error("config file {} does not exist", .path.display())]
    NotFound { path: PathBuf },
}

fn in_path(path: Option<&Path>) -> String {
    path.map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = expand_pathbuf(path.to_path_buf());
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return read_config(path);
    }

    let candidates = [project_config_path(), default_config_path()];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            return read_config(path);
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: PathBuf) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((config, Some(path)))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        canonical_size: file_canonical_size,
        tolerance_radius: file_tolerance_radius,
        min_content_size: file_min_content_size,
        report: file_report,
        binarize: file_binarize,
        scoring: file_scoring,
        dump: file_dump,
    } = file;

    let mut scoring = ScoringConfig::default();

    if let Some(section) = file_binarize {
        let binarize = &mut scoring.binarize;
        override_with(&mut binarize.clahe_clip_limit, section.clahe_clip_limit);
        override_with(&mut binarize.clahe_tiles, section.clahe_tiles);
        override_with(&mut binarize.blur_kernel, section.blur_kernel);
        override_with(&mut binarize.adaptive_block_size, section.adaptive_block_size);
        override_with(&mut binarize.adaptive_offset, section.adaptive_offset);
    }

    if let Some(section) = file_scoring {
        let weights = &mut scoring.weights;
        override_with(&mut weights.efficiency_ratio, section.efficiency_ratio);
        override_with(&mut weights.messiness_threshold, section.messiness_threshold);
        override_with(
            &mut weights.bonus_precision_threshold,
            section.bonus_precision_threshold,
        );
        override_with(&mut weights.bonus_weight, section.bonus_weight);
        override_with(&mut weights.completion_threshold, section.completion_threshold);
        override_with(&mut weights.completion_exponent, section.completion_exponent);
    }

    override_with(&mut scoring.canonical.canonical_size, file_canonical_size);
    override_with(&mut scoring.tolerance_radius, file_tolerance_radius);
    override_with(&mut scoring.canonical.min_content_size, file_min_content_size);

    override_with(
        &mut scoring.canonical.canonical_size,
        cli.canonical_size.map(|v| v as usize),
    );
    override_with(
        &mut scoring.tolerance_radius,
        cli.tolerance_radius.map(|v| v as usize),
    );
    override_with(
        &mut scoring.canonical.min_content_size,
        cli.min_content_size.map(|v| v as usize),
    );

    scoring.validate().map_err(|err| match err {
        ComparisonError::InvalidConfig { field, value } => ConfigError::InvalidValue {
            path: config_path.clone(),
            field,
            value,
        },
        other => ConfigError::InvalidValue {
            path: config_path.clone(),
            field: "scoring",
            value: other.to_string(),
        },
    })?;

    let mut dump_format = ImageOutputFormat::from(cli.dump_format);
    if !sources.dump_format_from_cli {
        if let Some(value) = file_dump
            .as_ref()
            .and_then(|section| normalize_string(section.format.clone()))
        {
            dump_format =
                ImageOutputFormat::from_str(&value).map_err(|_| ConfigError::InvalidValue {
                    path: config_path.clone(),
                    field: "dump.format",
                    value,
                })?;
        }
    }

    let file_dump_dir = file_dump
        .as_ref()
        .and_then(|section| normalize_string(section.dir.clone()));
    let image_enabled_config = file_dump
        .as_ref()
        .and_then(|section| section.enable)
        .unwrap_or(file_dump_dir.is_some());

    let dump_dir = if let Some(dir) = cli.dump_dir.clone() {
        Some(expand_pathbuf(dir))
    } else if image_enabled_config {
        Some(
            file_dump_dir
                .and_then(|dir| resolve_path_from_config(dir, config_dir.as_deref()))
                .unwrap_or_else(|| {
                    resolve_path_from_config(
                        DEFAULT_IMAGE_DUMP_DIR.to_string(),
                        config_dir.as_deref(),
                    )
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DUMP_DIR))
                }),
        )
    } else {
        None
    };

    let report = match cli.report.clone() {
        Some(path) => Some(expand_pathbuf(path)),
        None => normalize_string(file_report)
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref())),
    };

    Ok(EffectiveSettings {
        scoring,
        dump: DumpConfig::new(dump_dir, dump_format, report),
        config_path,
    })
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "sketch-score", "sketch-score")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_args;

    fn resolve_with(config: &Path, extra: &[&str]) -> Result<EffectiveSettings, ConfigError> {
        let mut argv = vec![
            "sketch-score".to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        let (args, sources) = parse_args(argv).unwrap();
        resolve_settings(&args, &sources)
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("settings.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let settings = resolve_with(&path, &[]).unwrap();
        assert_eq!(settings.scoring, ScoringConfig::default());
        assert!(!settings.dump.is_enabled());
        assert_eq!(settings.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn file_values_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
canonical_size = 200
tolerance_radius = 5
report = "out/report.json"

[binarize]
adaptive_block_size = 31

[scoring]
bonus_weight = 0.2

[dump]
dir = "masks"
format = "jpeg"
"#,
        );
        let settings = resolve_with(&path, &[]).unwrap();
        assert_eq!(settings.scoring.canonical.canonical_size, 200);
        assert_eq!(settings.scoring.tolerance_radius, 5);
        assert_eq!(settings.scoring.binarize.adaptive_block_size, 31);
        assert_eq!(settings.scoring.weights.bonus_weight, 0.2);

        let images = settings.dump.images.unwrap();
        assert_eq!(images.directory, dir.path().join("masks"));
        assert!(matches!(images.format, ImageOutputFormat::Jpeg { .. }));
        assert_eq!(
            settings.dump.report_path,
            Some(dir.path().join("out/report.json"))
        );
    }

    #[test]
    fn cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "tolerance_radius = 5\n[dump]\ndir = \"masks\"\nformat = \"jpeg\"\n",
        );
        let cli_dir = dir.path().join("cli-masks");
        let settings = resolve_with(
            &path,
            &[
                "--tolerance-radius",
                "3",
                "--dump-format",
                "png",
                "--dump-dir",
                cli_dir.to_str().unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(settings.scoring.tolerance_radius, 3);
        let images = settings.dump.images.unwrap();
        assert_eq!(images.directory, cli_dir);
        assert_eq!(images.format, ImageOutputFormat::Png);
    }

    #[test]
    fn enabled_dump_without_dir_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[dump]\nenable = true\n");
        let settings = resolve_with(&path, &[]).unwrap();
        assert_eq!(
            settings.dump.images.unwrap().directory,
            dir.path().join(DEFAULT_IMAGE_DUMP_DIR)
        );
    }

    #[test]
    fn invalid_values_name_the_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[binarize]\nblur_kernel = 4\n");
        let err = resolve_with(&path, &[]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "binarize.blur_kernel",
                ..
            }
        ));

        let path = write_config(dir.path(), "[dump]\nformat = \"tiff\"\n");
        let err = resolve_with(&path, &[]).unwrap_err();
        assert!(err.to_string().contains("dump.format"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "canonical_size = \"big\"\n");
        assert!(matches!(
            resolve_with(&path, &[]).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn explicit_missing_config_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_with(&dir.path().join("nope.toml"), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let base = Path::new("/etc/sketch");
        assert_eq!(
            resolve_path_from_config("dump".to_string(), Some(base)),
            Some(PathBuf::from("/etc/sketch/dump"))
        );
        assert_eq!(
            resolve_path_from_config("/tmp/x".to_string(), Some(base)),
            Some(PathBuf::from("/tmp/x"))
        );
        assert_eq!(resolve_path_from_config("  ".to_string(), Some(base)), None);
    }
}
