use std::fmt;
use std::path::Path;

use crate::constants::{ACCEPTED_MIME_PREFIX, MAX_FILE_SIZE};
use crate::models::SelectedFile;
use crate::services::preview::format_file_size;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    UnsupportedType(String),
    TooLarge(u64),
    Unreadable(String),
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::UnsupportedType(mime) if mime.is_empty() => {
                write!(f, "Please select an image file (unknown file type)")
            }
            AcquisitionError::UnsupportedType(mime) => {
                write!(f, "Please select an image file (got {})", mime)
            }
            AcquisitionError::TooLarge(size) => write!(
                f,
                "File is too large ({}). Maximum size is {}",
                format_file_size(*size),
                format_file_size(MAX_FILE_SIZE)
            ),
            AcquisitionError::Unreadable(msg) => write!(f, "Could not read file: {}", msg),
        }
    }
}

impl std::error::Error for AcquisitionError {}

/// Size check without the payload, so oversized uploads can be refused
/// before they are buffered.
pub fn check_size(size: u64) -> Result<(), AcquisitionError> {
    if size > MAX_FILE_SIZE {
        return Err(AcquisitionError::TooLarge(size));
    }
    Ok(())
}

pub fn check_mime(mime: &str) -> Result<(), AcquisitionError> {
    if !mime.trim().to_ascii_lowercase().starts_with(ACCEPTED_MIME_PREFIX) {
        return Err(AcquisitionError::UnsupportedType(mime.to_string()));
    }
    Ok(())
}

pub fn acquire(name: &str, mime: &str, bytes: Vec<u8>) -> Result<SelectedFile, AcquisitionError> {
    check_size(bytes.len() as u64)?;
    check_mime(mime)?;

    let name = if name.trim().is_empty() { "image" } else { name.trim() };
    log::debug!("Accepted {} ({}, {} bytes)", name, mime, bytes.len());

    Ok(SelectedFile {
        name: name.to_string(),
        mime: mime.trim().to_string(),
        bytes,
    })
}

/// Loads an image from disk for the command line.
pub fn acquire_path(path: &Path) -> Result<SelectedFile, AcquisitionError> {
    let metadata =
        std::fs::metadata(path).map_err(|e| AcquisitionError::Unreadable(e.to_string()))?;
    check_size(metadata.len())?;

    let mime = guess_mime(path).unwrap_or_default();
    check_mime(mime)?;

    let bytes = std::fs::read(path).map_err(|e| AcquisitionError::Unreadable(e.to_string()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image");

    acquire(name, mime, bytes)
}

/// MIME type from the file extension.
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}
