//! Conversion results and the download surface.

use crate::error::ConvertError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

static FINAL_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^/.]+$").unwrap());

/// The artifact produced by one successful conversion.
///
/// `artifact` is shared, so cloning a result (or the session state holding it)
/// never copies the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    #[serde(skip_serializing)]
    pub artifact: Arc<[u8]>,
    /// Content type of the artifact, from the target format.
    pub artifact_media_type: String,
    /// Source base name with the target extension.
    pub suggested_file_name: String,
    /// Target format identifier, e.g. `"jpg"`.
    pub target_format: String,
}

impl ConversionResult {
    /// Artifact size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.artifact.len()
    }

    /// A download handle over the same bytes.
    pub fn to_download(&self) -> Download {
        Download {
            file_name: self.suggested_file_name.clone(),
            media_type: self.artifact_media_type.clone(),
            bytes: Arc::clone(&self.artifact),
        }
    }
}

/// Strip the final extension from `original_name` and append `target_format`.
///
/// ```rust
/// use file_converter::output::suggested_file_name;
///
/// assert_eq!(suggested_file_name("photo.png", "jpg"), "photo.jpg");
/// assert_eq!(suggested_file_name("archive.tar.gz", "txt"), "archive.tar.txt");
/// assert_eq!(suggested_file_name("notes", "json"), "notes.json");
/// ```
pub fn suggested_file_name(original_name: &str, target_format: &str) -> String {
    let base = FINAL_EXTENSION.replace(original_name, "");
    format!("{base}.{target_format}")
}

/// Bytes plus a suggested file name, ready to be saved by the caller.
///
/// Obtained from [`crate::session::ConversionSession::download`]; producing
/// one never consumes the session's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl Download {
    /// Encode the artifact as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }

    /// Write the artifact into `dir` under [`Download::file_name`].
    ///
    /// The bytes go to a temp file in the same directory first and are then
    /// renamed into place, so a failed write never leaves a partial file.
    pub async fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(&self.file_name);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let bytes = Arc::clone(&self.bytes);
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("Write task panicked: {e}")))?
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        debug!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(bytes: &[u8]) -> ConversionResult {
        ConversionResult {
            artifact: Arc::from(bytes),
            artifact_media_type: "text/csv".into(),
            suggested_file_name: "table.csv".into(),
            target_format: "csv".into(),
        }
    }

    #[test]
    fn file_name_strips_only_final_extension() {
        assert_eq!(suggested_file_name("report.final.json", "csv"), "report.final.csv");
        assert_eq!(suggested_file_name("dir.v2/data", "txt"), "dir.v2/data.txt");
        assert_eq!(suggested_file_name("image.PNG", "bmp"), "image.bmp");
    }

    #[test]
    fn download_shares_result_bytes() {
        let r = result(b"a,b\n1,2");
        let d1 = r.to_download();
        let d2 = r.to_download();
        assert_eq!(d1, d2);
        assert!(Arc::ptr_eq(&d1.bytes, &r.artifact));
        assert_eq!(r.size_bytes(), 7);
    }

    #[test]
    fn data_url_is_base64() {
        let d = result(b"hi").to_download();
        assert_eq!(d.to_data_url(), "data:text/csv;base64,aGk=");
    }

    #[tokio::test]
    async fn save_to_dir_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let d = result(b"a,b\n1,2").to_download();
        let path = d.save_to_dir(dir.path().join("nested")).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "table.csv");
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2");

        // Saving again overwrites in place.
        let again = d.save_to_dir(dir.path().join("nested")).await.unwrap();
        assert_eq!(again, path);
    }
}
