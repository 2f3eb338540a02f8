use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::constants::{DOWNLOAD_FILE_EXT, DOWNLOAD_FILE_PREFIX};

pub const TEXT_MIME: &str = "text/plain; charset=utf-8";

/// `Content-Disposition` value that makes the browser save under `file_name`.
pub fn attachment_disposition(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace(['"', '\\'], "_"))
}

/// `extracted-text-2026-10-19T08-15-00.txt`
pub fn download_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{}{}.{}",
        DOWNLOAD_FILE_PREFIX,
        now.format("%Y-%m-%dT%H-%M-%S"),
        DOWNLOAD_FILE_EXT
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl TextDownload {
    pub fn new(text: &str, now: DateTime<Utc>) -> Self {
        Self {
            file_name: download_file_name(now),
            bytes: text.as_bytes().to_vec(),
        }
    }

    pub fn mime(&self) -> &'static str {
        TEXT_MIME
    }

    pub fn save_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        log::info!("Saved {} bytes to {:?}", self.bytes.len(), path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_download_file_name() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 0).unwrap();
        assert_eq!(download_file_name(now), "extracted-text-2026-10-19T08-15-00.txt");
    }

    #[test]
    fn test_download_is_utf8_text() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let download = TextDownload::new("naïve café", now);
        assert_eq!(String::from_utf8(download.bytes.clone()).unwrap(), "naïve café");
        assert_eq!(
            attachment_disposition(&download.file_name),
            "attachment; filename=\"extracted-text-2026-01-02T03-04-05.txt\""
        );
        assert_eq!(download.mime(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_disposition_escapes_quotes() {
        assert_eq!(
            attachment_disposition("a\"b.txt"),
            "attachment; filename=\"a_b.txt\""
        );
    }

    #[test]
    fn test_save_to_dir() {
        let dir = std::env::temp_dir().join(format!("ocr-desk-export-{}", uuid::Uuid::new_v4()));
        let download = TextDownload::new("line one\nline two", Utc::now());
        let path = download.save_to_dir(&dir).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("extracted-text-"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line one\nline two");
        std::fs::remove_dir_all(&dir).ok();
    }
}
