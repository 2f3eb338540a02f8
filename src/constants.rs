// src/constants.rs

pub const DEFAULT_OCR_ENDPOINT: &str = "http://localhost:5000/api/extract-text";
pub const DEFAULT_OCR_STATUS_ENDPOINT: &str = "http://localhost:5000/api/status";

// Upload limits
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const ACCEPTED_MIME_PREFIX: &str = "image/";

// Multipart field the OCR backend reads the image from
pub const UPLOAD_FIELD_NAME: &str = "file";

// Header carrying the (URL-encoded) original file name on /api/file
pub const FILE_NAME_HEADER: &str = "X-File-Name";

pub const SESSION_COOKIE: &str = "ocr_desk_sid";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60;

pub const DISPLAY_NAME_MAX: usize = 30;
pub const DOWNLOAD_FILE_PREFIX: &str = "extracted-text-";
pub const DOWNLOAD_FILE_EXT: &str = "txt";
pub const BLOB_ROUTE_PREFIX: &str = "/blob";

pub const FALLBACK_SERVER_ERROR: &str = "Failed to extract text";
pub const NO_TEXT_MESSAGE: &str =
    "No text found in the image. Please try a clearer image containing readable text.";
