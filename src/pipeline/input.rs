//! Input resolution: turn a user-selected file into a [`SourceFile`].
//!
//! A `SourceFile` is the already-validated file handle the rest of the crate
//! works with: a name, the full byte content, the declared media type and the
//! size. Callers that capture files elsewhere (a drop zone, an upload form)
//! build one with [`SourceFile::new`]; the CLI uses [`read_source_file`],
//! which reads a local path and derives the media type from its extension.

use crate::error::ConvertError;
use crate::formats::FormatTable;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One selected input file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    bytes: Arc<[u8]>,
    declared_media_type: String,
}

impl SourceFile {
    /// Wrap already-captured file content.
    pub fn new(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        declared_media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            declared_media_type: declared_media_type.into(),
        }
    }

    /// File name as selected, including its extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the content, for handing to a blocking task.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn declared_media_type(&self) -> &str {
        &self.declared_media_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Read a local file into a [`SourceFile`].
///
/// The media type comes from the file extension via
/// [`FormatTable::media_type_from_path`]; unknown extensions yield
/// `application/octet-stream`, which later routes to an unsupported category.
pub async fn read_source_file(path: impl AsRef<Path>) -> Result<SourceFile, ConvertError> {
    let path = path.as_ref().to_path_buf();

    let bytes = tokio::fs::read(&path).await.map_err(|e| map_io(&path, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = FormatTable::standard().media_type_from_path(&path);

    debug!(
        "Resolved local file: {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        media_type
    );

    Ok(SourceFile::new(name, bytes, media_type))
}

fn map_io(path: &Path, e: std::io::Error) -> ConvertError {
    match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    }
}
