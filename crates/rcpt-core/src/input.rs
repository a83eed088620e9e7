//! Input enumeration and pre-upload document checks.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;

use crate::error::{DocumentError, ScanError};

/// File formats accepted by the receipt model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Heif,
    Pdf,
}

impl DocumentFormat {
    /// Map a file extension (case-insensitive) to a supported format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "heif" | "heic" => Some(Self::Heif),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type sent with the upload.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Heif => "image/heif",
            Self::Pdf => "application/pdf",
        }
    }

    fn image_format(&self) -> Option<ImageFormat> {
        match self {
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Png => Some(ImageFormat::Png),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::Tiff => Some(ImageFormat::Tiff),
            Self::Heif | Self::Pdf => None,
        }
    }
}

/// Resolve an input path into the ordered list of files to process.
///
/// A file must have a supported extension. A directory yields its supported
/// files (non-recursive) sorted by file name; an empty directory yields an
/// empty list.
pub fn enumerate_inputs(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !path.exists() {
        return Err(ScanError::InputNotFound(path.to_path_buf()));
    }

    if path.is_file() {
        return match DocumentFormat::from_path(path) {
            Some(_) => Ok(vec![path.to_path_buf()]),
            None => Err(ScanError::UnsupportedFormat(path.to_path_buf())),
        };
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if !entry_path.is_file() {
            continue;
        }
        if DocumentFormat::from_path(&entry_path).is_some() {
            files.push(entry_path);
        } else {
            debug!("Skipping unsupported file {}", entry_path.display());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// A document ready for upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Source path, used for logging and the output record.
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }
}

/// Read a file and check that its content matches its extension.
pub async fn load_document(path: &Path) -> Result<DocumentUpload, DocumentError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| DocumentError::CorruptDocument {
        path: path.to_path_buf(),
        reason: "unsupported extension".to_string(),
    })?;

    let bytes = tokio::fs::read(path).await.map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    sniff(path, format, &bytes)?;

    Ok(DocumentUpload {
        path: path.to_path_buf(),
        format,
        bytes,
    })
}

/// Check magic bytes for images and structure for PDFs.
fn sniff(path: &Path, format: DocumentFormat, bytes: &[u8]) -> Result<(), DocumentError> {
    let corrupt = |reason: String| DocumentError::CorruptDocument {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.is_empty() {
        return Err(corrupt("file is empty".to_string()));
    }

    if let Some(expected) = format.image_format() {
        let detected = image::guess_format(bytes)
            .map_err(|_| corrupt("unrecognized image data".to_string()))?;
        if detected != expected {
            return Err(corrupt(format!(
                "content is {:?} but extension says {:?}",
                detected, expected
            )));
        }
        return Ok(());
    }

    if format == DocumentFormat::Pdf {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| corrupt(format!("failed to parse PDF: {}", e)))?;
        if doc.is_encrypted() {
            return Err(corrupt("PDF is encrypted".to_string()));
        }
        let pages = doc.get_pages().len();
        if pages == 0 {
            return Err(corrupt("PDF has no pages".to_string()));
        }
        debug!("{} has {} page(s)", path.display(), pages);
    }

    Ok(())
}
