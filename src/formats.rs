//! Format compatibility table and category routing.
//!
//! Everything here is static reference data: which output formats are legal
//! for an input media type, how each format is labelled, which content type an
//! output carries, and which converter category a media type belongs to.
//! Lookups are pure and deterministic; list order is stable.
//!
//! ```text
//! media type ──▶ route() ──▶ Category::{Image, StructuredText, Unsupported}
//!            └─▶ legal_targets() ──▶ ["jpg", "webp", …]
//! ```

use serde::Serialize;
use std::path::Path;

/// Fallback media type for files whose extension is not recognised.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Category name returned by [`FormatTable::category_of`] for unlisted types.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Converter family a media type is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    /// Raster images, handled by [`crate::pipeline::image`].
    Image,
    /// Plain text, CSV, JSON and XML, handled by [`crate::pipeline::text`].
    StructuredText,
    /// Rejected before any converter runs.
    Unsupported(UnsupportedKind),
}

/// Why a media type is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnsupportedKind {
    /// `audio/*` and `video/*`.
    Media,
    /// PDF and office documents.
    Document,
    /// Anything else, including undetected types.
    Other,
}

impl UnsupportedKind {
    /// Fixed explanation shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            UnsupportedKind::Media => {
                "Video and audio conversions require transcoding and are not supported in this version."
            }
            UnsupportedKind::Document => {
                "Document conversions require a document engine and are not supported in this version."
            }
            UnsupportedKind::Other => "This file type conversion is not supported in this version.",
        }
    }
}

/// One row of the compatibility table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormatEntry {
    pub input_media_type: &'static str,
    pub category: &'static str,
    pub outputs: &'static [&'static str],
}

/// How a routing rule matches a normalised media type.
#[derive(Debug, Clone, Copy)]
enum MediaMatch {
    Prefix(&'static str),
    Exact(&'static str),
    Contains(&'static str),
}

impl MediaMatch {
    fn matches(self, media_type: &str) -> bool {
        match self {
            MediaMatch::Prefix(p) => media_type.starts_with(p),
            MediaMatch::Exact(e) => media_type == e,
            MediaMatch::Contains(c) => media_type.contains(c),
        }
    }
}

const IMAGE: &str = "image";
const TEXT: &str = "text";

const fn row(
    input_media_type: &'static str,
    category: &'static str,
    outputs: &'static [&'static str],
) -> FormatEntry {
    FormatEntry {
        input_media_type,
        category,
        outputs,
    }
}

static ENTRIES: &[FormatEntry] = &[
    row("image/png", IMAGE, &["jpg", "webp", "gif", "bmp"]),
    row("image/jpeg", IMAGE, &["png", "webp", "gif", "bmp"]),
    row("image/jpg", IMAGE, &["png", "webp", "gif", "bmp"]),
    row("image/webp", IMAGE, &["png", "jpg", "gif", "bmp"]),
    row("image/gif", IMAGE, &["png", "jpg", "webp", "bmp"]),
    row("image/bmp", IMAGE, &["png", "jpg", "webp", "gif"]),
    row("text/plain", TEXT, &["json", "csv", "xml"]),
    row("application/json", TEXT, &["txt", "csv", "xml"]),
    row("text/csv", TEXT, &["txt", "json", "xml"]),
    row("application/xml", TEXT, &["txt", "json", "csv"]),
    row("text/xml", TEXT, &["txt", "json", "csv"]),
];

static LABELS: &[(&str, &str)] = &[
    ("png", "PNG Image"),
    ("jpg", "JPG Image"),
    ("jpeg", "JPEG Image"),
    ("webp", "WebP Image"),
    ("gif", "GIF Image"),
    ("bmp", "BMP Image"),
    ("txt", "Text File"),
    ("json", "JSON File"),
    ("csv", "CSV File"),
    ("xml", "XML File"),
];

static OUTPUT_MEDIA_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "application/xml"),
];

static EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "text/xml"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("zip", "application/zip"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
];

// First match wins.
static ROUTES: &[(MediaMatch, Category)] = &[
    (MediaMatch::Prefix("image/"), Category::Image),
    (MediaMatch::Prefix("text/"), Category::StructuredText),
    (MediaMatch::Exact("application/json"), Category::StructuredText),
    (MediaMatch::Exact("application/xml"), Category::StructuredText),
    (MediaMatch::Prefix("audio/"), Category::Unsupported(UnsupportedKind::Media)),
    (MediaMatch::Prefix("video/"), Category::Unsupported(UnsupportedKind::Media)),
    (MediaMatch::Exact("application/pdf"), Category::Unsupported(UnsupportedKind::Document)),
    (MediaMatch::Exact("application/msword"), Category::Unsupported(UnsupportedKind::Document)),
    (MediaMatch::Contains("document"), Category::Unsupported(UnsupportedKind::Document)),
];

static STANDARD: FormatTable = FormatTable {
    entries: ENTRIES,
    labels: LABELS,
    output_media_types: OUTPUT_MEDIA_TYPES,
    extensions: EXTENSIONS,
    routes: ROUTES,
};

/// The compatibility table: legal targets, labels and category routing.
#[derive(Debug)]
pub struct FormatTable {
    entries: &'static [FormatEntry],
    labels: &'static [(&'static str, &'static str)],
    output_media_types: &'static [(&'static str, &'static str)],
    extensions: &'static [(&'static str, &'static str)],
    routes: &'static [(MediaMatch, Category)],
}

impl FormatTable {
    /// The built-in table, loaded once and never mutated.
    pub fn standard() -> &'static FormatTable {
        &STANDARD
    }

    /// All rows, in table order.
    pub fn entries(&self) -> &'static [FormatEntry] {
        self.entries
    }

    /// Ordered output formats for `input_media_type`; empty when unknown.
    pub fn legal_targets(&self, input_media_type: &str) -> &'static [&'static str] {
        self.entry(input_media_type)
            .map(|e| e.outputs)
            .unwrap_or(&[])
    }

    /// True when `target` is listed for `input_media_type`.
    pub fn is_legal(&self, input_media_type: &str, target: &str) -> bool {
        let target = target.trim().to_ascii_lowercase();
        self.legal_targets(input_media_type)
            .iter()
            .any(|t| *t == target)
    }

    /// Table category name (`"image"`, `"text"`) or [`UNKNOWN_CATEGORY`].
    pub fn category_of(&self, input_media_type: &str) -> &'static str {
        self.entry(input_media_type)
            .map(|e| e.category)
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Display label for a format, falling back to the uppercased identifier.
    pub fn label_of(&self, format_id: &str) -> String {
        let key = format_id.to_ascii_lowercase();
        lookup(self.labels, &key)
            .map(str::to_string)
            .unwrap_or_else(|| format_id.to_uppercase())
    }

    /// Content type carried by an output in `format_id`.
    pub fn media_type_of_format(&self, format_id: &str) -> &'static str {
        lookup(self.output_media_types, &format_id.to_ascii_lowercase())
            .unwrap_or(UNKNOWN_MEDIA_TYPE)
    }

    /// Media type for a local file, derived from its extension.
    pub fn media_type_from_path(&self, path: &Path) -> &'static str {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| lookup(self.extensions, &ext.to_ascii_lowercase()))
            .unwrap_or(UNKNOWN_MEDIA_TYPE)
    }

    /// Converter category for a media type.
    pub fn route(&self, media_type: &str) -> Category {
        let normalised = normalise_media_type(media_type);
        self.routes
            .iter()
            .find(|(rule, _)| rule.matches(&normalised))
            .map(|(_, category)| *category)
            .unwrap_or(Category::Unsupported(UnsupportedKind::Other))
    }

    fn entry(&self, input_media_type: &str) -> Option<&'static FormatEntry> {
        let normalised = normalise_media_type(input_media_type);
        self.entries
            .iter()
            .find(|e| e.input_media_type == normalised)
    }
}

/// Lowercase a media type and drop any `; parameter` suffix.
pub fn normalise_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn lookup(pairs: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
