//! Pipeline stages for a single-file conversion.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ route ──▶ image | text ──▶ output
//! (path)   (table)   (converter)     (result)
//! ```
//!
//! 1. [`input`]: read a local path into a [`input::SourceFile`]
//! 2. routing: [`crate::formats::FormatTable::route`] picks a [`Category`]
//! 3. [`image`]: decode and re-encode raster images
//! 4. [`text`]: CSV ↔ JSON rewrite, passthrough for every other pair
//!
//! Converters are synchronous and CPU-bound; [`run_converter`] moves each
//! call onto tokio's blocking pool so callers see one `.await` per call.

pub mod image;
pub mod input;
pub mod text;

use crate::error::ConvertError;
use crate::formats::Category;
use std::fmt;
use std::sync::Arc;

/// A category converter: bytes in one format to bytes in another.
pub trait FormatConverter: Send + Sync {
    fn convert(
        &self,
        bytes: &[u8],
        source_media_type: &str,
        target_format: &str,
    ) -> Result<Vec<u8>, ConvertError>;
}

/// Raster image converter backed by [`image::convert_image`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageConverter;

impl FormatConverter for ImageConverter {
    fn convert(
        &self,
        bytes: &[u8],
        source_media_type: &str,
        target_format: &str,
    ) -> Result<Vec<u8>, ConvertError> {
        self::image::convert_image(bytes, source_media_type, target_format)
    }
}

/// Structured text converter backed by [`text::convert_text`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredTextConverter;

impl FormatConverter for StructuredTextConverter {
    fn convert(
        &self,
        bytes: &[u8],
        source_media_type: &str,
        target_format: &str,
    ) -> Result<Vec<u8>, ConvertError> {
        self::text::convert_text(bytes, source_media_type, target_format)
    }
}

/// One converter per supported [`Category`].
#[derive(Clone)]
pub struct Converters {
    image: Arc<dyn FormatConverter>,
    text: Arc<dyn FormatConverter>,
}

impl Default for Converters {
    fn default() -> Self {
        Self {
            image: Arc::new(ImageConverter),
            text: Arc::new(StructuredTextConverter),
        }
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("image", &"<dyn FormatConverter>")
            .field("text", &"<dyn FormatConverter>")
            .finish()
    }
}

impl Converters {
    /// Use custom converters, e.g. instrumented ones in tests.
    pub fn new(image: Arc<dyn FormatConverter>, text: Arc<dyn FormatConverter>) -> Self {
        Self { image, text }
    }

    /// The converter for `category`; `None` for unsupported categories.
    pub fn for_category(&self, category: Category) -> Option<Arc<dyn FormatConverter>> {
        match category {
            Category::Image => Some(Arc::clone(&self.image)),
            Category::StructuredText => Some(Arc::clone(&self.text)),
            Category::Unsupported(_) => None,
        }
    }
}

/// Run `converter` on the blocking pool.
pub async fn run_converter(
    converter: Arc<dyn FormatConverter>,
    bytes: Arc<[u8]>,
    source_media_type: String,
    target_format: String,
) -> Result<Vec<u8>, ConvertError> {
    tokio::task::spawn_blocking(move || {
        converter.convert(&bytes, &source_media_type, &target_format)
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Converter task panicked: {e}")))?
}
