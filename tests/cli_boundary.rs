use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use sketch_score::cli::parse_args;
use sketch_score::{RunError, output_line, run_to_output};

const PAPER: u8 = 240;
const PEN: u8 = 20;

fn ring_image(size: u32, cx: f64, cy: f64, radius: f64) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        if ((dx * dx + dy * dy).sqrt() - radius).abs() <= 2.5 {
            Luma([PEN])
        } else {
            Luma([PAPER])
        }
    })
}

// Corner dots keep the ink bounding box fixed while the ring moves.
fn framed_ring_image(size: u32, cx: f64, cy: f64, radius: f64) -> GrayImage {
    let far = size - 8;
    let ring = ring_image(size, cx, cy, radius);
    GrayImage::from_fn(size, size, |x, y| {
        let dot = |ox: u32, oy: u32| (ox..ox + 3).contains(&x) && (oy..oy + 3).contains(&y);
        if dot(5, 5) || dot(far, 5) || dot(5, far) || dot(far, far) {
            Luma([PEN])
        } else {
            *ring.get_pixel(x, y)
        }
    })
}

fn save(dir: &Path, name: &str, image: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

fn score_with(flags: &[&str], paths: &[&Path]) -> String {
    let mut argv: Vec<OsString> = vec!["sketch-score".into()];
    argv.extend(flags.iter().map(OsString::from));
    argv.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
    run_to_output(argv)
}

fn score(args: &[&Path]) -> String {
    let mut argv: Vec<OsString> = vec!["sketch-score".into()];
    argv.extend(args.iter().map(|p| p.as_os_str().to_os_string()));
    run_to_output(argv)
}

#[test]
fn missing_arguments_print_zero() {
    assert_eq!(run_to_output(["sketch-score"]), "0");

    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    assert_eq!(score(&[&reference]), "0");
}

#[test]
fn unreadable_files_print_zero() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    let missing = dir.path().join("missing.png");
    assert_eq!(score(&[&reference, &missing]), "0");

    let garbage = dir.path().join("garbage.png");
    fs::write(&garbage, b"\x89PNG but not really").unwrap();
    assert_eq!(score(&[&garbage, &reference]), "0");
}

#[test]
fn blank_attempt_prints_zero() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    let blank = save(dir.path(), "blank.png", &GrayImage::from_pixel(200, 200, Luma([PAPER])));
    assert_eq!(score(&[&reference, &blank]), "0");
    assert_eq!(score(&[&blank, &reference]), "0");
}

#[test]
fn identical_images_print_one() {
    let dir = tempfile::tempdir().unwrap();
    let image = ring_image(240, 120.0, 120.0, 80.0);
    let reference = save(dir.path(), "ref.png", &image);
    let attempt = save(dir.path(), "attempt.png", &image);
    assert_eq!(score(&[&reference, &attempt]), "1.0000");
}

#[test]
fn offset_circle_scores_near_one_only_with_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(
        dir.path(),
        "ref.png",
        &framed_ring_image(300, 150.0, 150.0, 100.0),
    );
    let attempt = save(
        dir.path(),
        "attempt.png",
        &framed_ring_image(300, 153.0, 147.0, 100.0),
    );

    let line = score(&[&reference, &attempt]);
    assert_eq!(line.len(), 6, "unexpected output {line}");
    let tolerant: f64 = line.parse().unwrap();
    assert!(tolerant > 0.95, "score {tolerant}");

    let exact: f64 = score_with(&["--tolerance-radius", "0"], &[&reference, &attempt])
        .parse()
        .unwrap();
    assert!(exact < 0.9, "score without tolerance {exact}");
}

#[test]
fn oversized_canonical_size_prints_zero() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    assert_eq!(
        score_with(&["--canonical-size", "4000000000"], &[&reference, &reference]),
        "0"
    );
    assert_eq!(
        score_with(&["--canonical-size", "150"], &[&reference, &reference]),
        "1.0000"
    );
}

#[test]
fn color_input_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let gray = ring_image(200, 100.0, 100.0, 60.0);
    let color = RgbImage::from_fn(200, 200, |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });
    let reference = save(dir.path(), "ref.png", &gray);
    let attempt = dir.path().join("attempt.png");
    color.save(&attempt).unwrap();
    assert_eq!(score(&[&reference, &attempt]), "1.0000");
}

#[test]
fn diagnostics_are_written_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    let dump_dir = dir.path().join("dump");
    let report = dir.path().join("report.json");

    let argv: Vec<OsString> = vec![
        "sketch-score".into(),
        "--dump-dir".into(),
        dump_dir.as_os_str().to_os_string(),
        "--report".into(),
        report.as_os_str().to_os_string(),
        reference.as_os_str().to_os_string(),
        reference.as_os_str().to_os_string(),
    ];
    let line = run_to_output(argv);
    assert_eq!(line, "1.0000");
    assert!(dump_dir.join("canonical_attempt.png").is_file());
    assert!(dump_dir.join("binarized_reference.png").is_file());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["breakdown"]["score"], 1.0);
}

#[test]
fn broken_dump_dir_does_not_change_the_score() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file").unwrap();

    let argv: Vec<OsString> = vec![
        "sketch-score".into(),
        "--dump-dir".into(),
        blocker.join("sub").into_os_string(),
        reference.as_os_str().to_os_string(),
        reference.as_os_str().to_os_string(),
    ];
    assert_eq!(run_to_output(argv), "1.0000");
}

#[test]
fn malformed_flags_print_zero() {
    assert_eq!(run_to_output(["sketch-score", "--tolerance-radius", "wide"]), "0");
    assert_eq!(run_to_output(["sketch-score", "--no-such-flag"]), "0");
}

#[test]
fn parse_errors_collapse_through_the_output_line() {
    let err = parse_args(["sketch-score", "--no-such-flag"]).unwrap_err();
    assert_eq!(output_line(&Err(RunError::Cli(err))), "0");
}

#[test]
fn invalid_config_file_prints_zero() {
    let dir = tempfile::tempdir().unwrap();
    let reference = save(dir.path(), "ref.png", &ring_image(200, 100.0, 100.0, 60.0));
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[binarize]\nadaptive_block_size = 40\n").unwrap();
    let argv: Vec<OsString> = vec![
        "sketch-score".into(),
        "--config".into(),
        config.into_os_string(),
        reference.as_os_str().to_os_string(),
        reference.as_os_str().to_os_string(),
    ];
    assert_eq!(run_to_output(argv), "0");
}
