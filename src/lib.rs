//! # file-converter
//!
//! Convert one local file at a time between common image and structured
//! text formats, with a small state machine that reports progress and
//! hands back a downloadable artifact.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input    read bytes + declared media type
//!  ├─ 2. Route    compatibility table → image | text | unsupported
//!  ├─ 3. Convert  decode/encode raster, or CSV ↔ JSON rewrite (spawn_blocking)
//!  └─ 4. Output   artifact + content type + suggested file name
//! ```
//!
//! [`ConversionSession`] wraps the pipeline with selection rules, a
//! simulated progress ticker, notifications and repeatable downloads.
//! The free functions in [`mod@convert`] run a single request without any state.
//!
//! ## Supported Conversions
//!
//! | Input | Targets |
//! |-------|---------|
//! | `image/png`  | jpg, webp, gif, bmp |
//! | `image/jpeg` | png, webp, gif, bmp |
//! | `image/webp` | png, jpg, gif, bmp |
//! | `image/gif`  | png, jpg, webp, bmp |
//! | `image/bmp`  | png, jpg, webp, gif |
//! | `text/plain` | json, csv, xml |
//! | `text/csv`   | txt, json, xml |
//! | `application/json` | txt, csv, xml |
//! | `text/xml`, `application/xml` | txt, json, csv |
//!
//! Audio, video and office documents are recognised and refused with a
//! fixed explanation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use file_converter::{read_source_file, ConversionConfig, ConversionSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ConversionSession::new(ConversionConfig::default());
//!     session.select_file(read_source_file("people.csv").await?);
//!     session.select_format("json")?;
//!     session.convert().await?;
//!     let path = session.download()?.save_to_dir("out").await?;
//!     println!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! file-converter = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod formats;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    convert, convert_file, convert_sync, convert_with, describe, inspect, ConversionRequest,
    FileInfo, TargetInfo,
};
pub use error::ConvertError;
pub use formats::{Category, FormatTable, UnsupportedKind};
pub use notify::{Notification, Notifier, NoopNotifier, Severity, SharedNotifier, TracingNotifier};
pub use output::{ConversionResult, Download};
pub use pipeline::input::{read_source_file, SourceFile};
pub use pipeline::{Converters, FormatConverter};
pub use session::{ConversionSession, ConversionState};
