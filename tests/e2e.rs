//! End-to-end integration tests for file-converter.
//!
//! Fixtures are generated on the fly into temporary directories, so these
//! tests need no files on disk and no network.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use file_converter::{
    convert_file, inspect, read_source_file, ConversionConfig, ConversionSession, ConversionState,
    ConvertError, Notification, Notifier, NoopNotifier, Severity,
};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> ConversionConfig {
    ConversionConfig::builder()
        .tick_interval_ms(5)
        .build()
        .expect("valid config")
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

/// A 12×8 gradient saved in `format`.
fn write_image(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(12, 8, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 128]));
    img.save_with_format(&path, format).expect("save image fixture");
    path
}

#[derive(Default)]
struct Recorder(Mutex<Vec<Notification>>);

impl Notifier for Recorder {
    fn notify(&self, n: Notification) {
        self.0.lock().unwrap().push(n);
    }
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_png_lists_targets() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(dir.path(), "photo.png", ImageFormat::Png);

    let info = inspect(&path).await.unwrap();
    assert_eq!(info.name, "photo.png");
    assert_eq!(info.media_type, "image/png");
    assert_eq!(info.category, "image");
    let formats: Vec<&str> = info.targets.iter().map(|t| t.format).collect();
    assert_eq!(formats, vec!["jpg", "webp", "gif", "bmp"]);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    let err = inspect("/definitely/not/here.csv").await.unwrap_err();
    assert!(
        matches!(err, ConvertError::FileNotFound { .. }),
        "expected FileNotFound, got: {err:?}"
    );
}

// ── One-shot conversion ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_png_to_jpg_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = write_image(dir.path(), "photo.png", ImageFormat::Png);
    let out_dir = dir.path().join("out");

    let (result, path) = convert_file(&input, "jpg", &out_dir).await.unwrap();
    assert_eq!(path, out_dir.join("photo.jpg"));
    assert_eq!(result.artifact_media_type, "image/jpeg");

    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (12, 8));
    assert_eq!(image::guess_format(&result.artifact).unwrap(), ImageFormat::Jpeg);
}

#[tokio::test]
async fn test_convert_every_image_pair() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("a.png", ImageFormat::Png, ["jpg", "webp", "gif", "bmp"]),
        ("b.jpg", ImageFormat::Jpeg, ["png", "webp", "gif", "bmp"]),
        ("c.gif", ImageFormat::Gif, ["png", "jpg", "webp", "bmp"]),
        ("d.bmp", ImageFormat::Bmp, ["png", "jpg", "webp", "gif"]),
        ("e.webp", ImageFormat::WebP, ["png", "jpg", "gif", "bmp"]),
    ];
    for (name, format, targets) in cases {
        let input = write_image(dir.path(), name, format);
        for target in targets {
            let (result, path) = convert_file(&input, target, dir.path().join(target))
                .await
                .unwrap_or_else(|e| panic!("{name} → {target}: {e}"));
            let decoded = image::open(&path).unwrap();
            assert_eq!(
                (decoded.width(), decoded.height()),
                (12, 8),
                "{name} → {target}"
            );
            assert!(result.size_bytes() > 0);
        }
    }
}

#[tokio::test]
async fn test_convert_transparent_png_to_jpg() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 0]))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();

    let (_, out) = convert_file(&path, "jpg", dir.path()).await.unwrap();
    let decoded = image::open(out).unwrap();
    assert!(!decoded.color().has_alpha());
}

#[tokio::test]
async fn test_convert_json_to_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(
        dir.path(),
        "people.json",
        br#"[{"name":"Alice","age":30},{"name":"Bob","age":null}]"#,
    );

    let (_, path) = convert_file(&input, "csv", dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "people.csv");
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "name,age\nAlice,30\nBob,"
    );
}

#[tokio::test]
async fn test_convert_rejects_unlisted_target() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "t.csv", b"a\n1");
    let err = convert_file(&input, "png", dir.path()).await.unwrap_err();
    assert!(matches!(err, ConvertError::IncompatibleTarget { .. }), "got: {err:?}");
    assert!(!dir.path().join("t.png").exists());
}

#[tokio::test]
async fn test_convert_corrupt_image_reports_generic_message() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "broken.png", b"\x89PNG\r\n\x1a\nnot really");
    let err = convert_file(&input, "jpg", dir.path()).await.unwrap_err();
    assert!(matches!(err, ConvertError::Decode { .. }), "got: {err:?}");
    assert_eq!(err.user_message(), "Failed to convert image");
}

// ── Session flows ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_csv_to_json_and_save() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "people.csv", b"name,age\nAlice,30\nBob,25");
    let notes = Arc::new(Recorder::default());

    let session = ConversionSession::new(fast_config()).with_notifier(notes.clone());
    session.select_file(read_source_file(&input).await.unwrap());
    assert_ok!(session.select_format("json"));
    assert_ok!(session.convert().await);

    let download = session.download().unwrap();
    let path = download.save_to_dir(dir.path().join("out")).await.unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([{"name": "Alice", "age": "30"}, {"name": "Bob", "age": "25"}])
    );

    let titles: Vec<String> = notes.0.lock().unwrap().iter().map(|n| n.title.clone()).collect();
    assert_eq!(titles, vec!["Conversion completed!", "Download started"]);
}

#[tokio::test]
async fn test_session_unsupported_video() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "clip.mp4", &[0u8; 32]);
    let notes = Arc::new(Recorder::default());

    let session = ConversionSession::new(fast_config()).with_notifier(notes.clone());
    session.select_file(read_source_file(&input).await.unwrap());
    session.select_format("webm").unwrap();

    let err = session.convert().await.unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedCategory { .. }), "got: {err:?}");
    match session.state() {
        ConversionState::Error { message } => {
            assert!(message.ends_with("not supported in this version."), "{message}")
        }
        other => panic!("expected Error, got {other:?}"),
    }
    let recorded = notes.0.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].severity, Severity::Destructive);
}

#[tokio::test]
async fn test_session_unknown_extension_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "blob.xyz", b"??");

    let session = ConversionSession::new(fast_config());
    session.select_file(read_source_file(&input).await.unwrap());
    assert!(session.legal_targets().is_empty());
    session.select_format("txt").unwrap();

    let err = session.convert().await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "This file type conversion is not supported in this version."
    );
}

#[tokio::test]
async fn test_session_retry_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "data.json", b"{\"not\": \"an array\"}");

    let session = ConversionSession::new(fast_config());
    session.select_file(read_source_file(&input).await.unwrap());
    session.select_format("csv").unwrap();
    assert_err!(session.convert().await);
    assert_eq!(
        session.state(),
        ConversionState::Error {
            message: "Failed to convert text file".into()
        }
    );

    // Reselecting a format clears the error; passthrough to txt succeeds.
    session.select_format("txt").unwrap();
    assert_eq!(session.state(), ConversionState::Idle);
    let result = session.convert().await.unwrap();
    assert_eq!(&result.artifact[..], b"{\"not\": \"an array\"}");
    assert_eq!(result.suggested_file_name, "data.txt");
}

#[tokio::test]
async fn test_session_data_url() {
    let session = ConversionSession::new(fast_config());
    session.select_file(file_converter::SourceFile::new(
        "n.txt",
        b"hi".to_vec(),
        "text/plain",
    ));
    session.select_format("json").unwrap();
    session.convert().await.unwrap();

    let url = session.download().unwrap().to_data_url();
    assert_eq!(url, "data:application/json;base64,aGk=");
}

#[tokio::test]
async fn test_session_usable_from_spawned_tasks() {
    let session = ConversionSession::new(fast_config());
    session.select_file(file_converter::SourceFile::new(
        "t.csv",
        b"k\nv".to_vec(),
        "text/csv",
    ));
    session.select_format("json").unwrap();

    let handle = tokio::spawn({
        let session = session.clone();
        async move { session.convert().await }
    });
    handle.await.unwrap().unwrap();
    assert!(matches!(session.state(), ConversionState::Completed(_)));
}

#[test]
fn test_public_types_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ConversionSession>();
    assert_send_sync::<NoopNotifier>();
    assert_send_sync::<ConversionState>();
}
