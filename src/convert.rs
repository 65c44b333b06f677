//! One-shot conversion entry points.
//!
//! These functions convert a single request and return; they hold no state
//! and report no progress. [`crate::session::ConversionSession`] wraps the
//! same call with the state machine, progress ticker and notifications.

use crate::error::ConvertError;
use crate::formats::{Category, FormatTable};
use crate::output::{suggested_file_name, ConversionResult};
use crate::pipeline::input::{read_source_file, SourceFile};
use crate::pipeline::{run_converter, Converters};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A source file paired with a target format the table allows for it.
///
/// Construction is the only place the compatibility invariant is checked;
/// a `ConversionRequest` that exists is always routable.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    source: Arc<SourceFile>,
    target_format: String,
    category: Category,
}

impl ConversionRequest {
    /// Validate `target_format` against the source's declared media type.
    ///
    /// # Errors
    /// * [`ConvertError::UnsupportedCategory`] when the media type routes to
    ///   an unsupported family, whatever the target.
    /// * [`ConvertError::IncompatibleTarget`] when the target is not listed.
    pub fn new(
        source: impl Into<Arc<SourceFile>>,
        target_format: impl AsRef<str>,
    ) -> Result<Self, ConvertError> {
        let source = source.into();
        let table = FormatTable::standard();
        let media_type = source.declared_media_type();

        let category = table.route(media_type);
        if let Category::Unsupported(kind) = category {
            return Err(ConvertError::UnsupportedCategory {
                media_type: media_type.to_string(),
                message: kind.message(),
            });
        }

        let target_format = target_format.as_ref().trim().to_ascii_lowercase();
        if !table.is_legal(media_type, &target_format) {
            return Err(ConvertError::IncompatibleTarget {
                media_type: media_type.to_string(),
                target: target_format,
            });
        }

        Ok(Self {
            source,
            target_format,
            category,
        })
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Lowercased target format identifier.
    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    /// Converter family resolved at construction.
    pub fn category(&self) -> Category {
        self.category
    }
}

/// Convert a validated request with the built-in converters.
///
/// # Example
/// ```rust,no_run
/// use file_converter::{convert, ConversionRequest, SourceFile};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = SourceFile::new("people.csv", b"name,age\nAlice,30".to_vec(), "text/csv");
/// let request = ConversionRequest::new(source, "json")?;
/// let result = convert(&request).await?;
/// assert_eq!(result.suggested_file_name, "people.json");
/// # Ok(())
/// # }
/// ```
pub async fn convert(request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
    convert_with(request, &Converters::default()).await
}

/// Convert a validated request with the given converter set.
pub async fn convert_with(
    request: &ConversionRequest,
    converters: &Converters,
) -> Result<ConversionResult, ConvertError> {
    let source = request.source();
    let target = request.target_format();
    let media_type = source.declared_media_type();

    let converter = converters
        .for_category(request.category())
        .ok_or_else(|| ConvertError::Internal(format!("no converter for '{media_type}'")))?;

    info!(
        "Converting {} ({}, {} bytes) → {}",
        source.name(),
        media_type,
        source.size_bytes(),
        target
    );
    let start = Instant::now();

    let bytes = run_converter(
        converter,
        source.shared_bytes(),
        media_type.to_string(),
        target.to_string(),
    )
    .await?;

    debug!(
        "Converted {} in {}ms → {} bytes",
        source.name(),
        start.elapsed().as_millis(),
        bytes.len()
    );

    Ok(ConversionResult {
        artifact: Arc::from(bytes),
        artifact_media_type: FormatTable::standard()
            .media_type_of_format(target)
            .to_string(),
        suggested_file_name: suggested_file_name(source.name(), target),
        target_format: target.to_string(),
    })
}

/// Read `input`, convert it to `target_format` and save the result in
/// `output_dir`. Returns the result and the written path.
pub async fn convert_file(
    input: impl AsRef<Path>,
    target_format: &str,
    output_dir: impl AsRef<Path>,
) -> Result<(ConversionResult, PathBuf), ConvertError> {
    let source = read_source_file(input).await?;
    let request = ConversionRequest::new(source, target_format)?;
    let result = convert(&request).await?;
    let path = result.to_download().save_to_dir(output_dir).await?;
    Ok((result, path))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(request))
}

/// What the table says about a local file, without converting it.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub media_type: String,
    pub size_bytes: u64,
    /// Table category (`"image"`, `"text"`) or `"unknown"`.
    pub category: &'static str,
    pub targets: Vec<TargetInfo>,
}

/// One selectable output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    pub format: &'static str,
    pub label: String,
}

/// Describe a source file and its legal targets.
pub fn describe(source: &SourceFile) -> FileInfo {
    let table = FormatTable::standard();
    let media_type = source.declared_media_type();
    FileInfo {
        name: source.name().to_string(),
        media_type: media_type.to_string(),
        size_bytes: source.size_bytes(),
        category: table.category_of(media_type),
        targets: table
            .legal_targets(media_type)
            .iter()
            .map(|&format| TargetInfo {
                format,
                label: table.label_of(format),
            })
            .collect(),
    }
}

/// Read a local file and describe it. Does not run any converter.
pub async fn inspect(input: impl AsRef<Path>) -> Result<FileInfo, ConvertError> {
    let source = read_source_file(input).await?;
    Ok(describe(&source))
}
