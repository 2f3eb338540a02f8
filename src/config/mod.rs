use reqwest::Url;
use std::path::PathBuf;

use crate::constants::{DEFAULT_OCR_ENDPOINT, DEFAULT_OCR_STATUS_ENDPOINT, DEFAULT_SESSION_TTL_SECS};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ocr_endpoint: String,
    pub ocr_status_endpoint: String,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub session_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let ocr_endpoint =
            std::env::var("OCR_ENDPOINT").unwrap_or_else(|_| DEFAULT_OCR_ENDPOINT.to_string());
        let ocr_status_endpoint = std::env::var("OCR_STATUS_ENDPOINT")
            .unwrap_or_else(|_| status_endpoint_for(&ocr_endpoint));

        Self {
            host,
            port,
            ocr_endpoint,
            ocr_status_endpoint,
            templates_dir: PathBuf::from(
                std::env::var("TEMPLATES_DIR").unwrap_or_else(|_| "./templates".to_string()),
            ),
            static_dir: PathBuf::from(
                std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".to_string()),
            ),
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ttl: &i64| *ttl > 0)
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points both OCR URLs at another backend, deriving the status URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.ocr_endpoint = endpoint.to_string();
        self.ocr_status_endpoint = status_endpoint_for(endpoint);
        self
    }

    pub fn templates_glob(&self) -> String {
        format!("{}/**/*", self.templates_dir.display())
    }
}

/// `.../api/extract-text` -> `.../api/status`; anything else gets `/api/status`
/// on its origin.
pub fn status_endpoint_for(endpoint: &str) -> String {
    if endpoint == DEFAULT_OCR_ENDPOINT {
        return DEFAULT_OCR_STATUS_ENDPOINT.to_string();
    }

    let url = match Url::parse(endpoint) {
        Ok(url) => url,
        Err(_) => return format!("{}/api/status", endpoint.trim_end_matches('/')),
    };

    let under_api = url
        .path_segments()
        .map(|segments| {
            let segments: Vec<&str> = segments.collect();
            matches!(segments.as_slice(), [.., "api", last] if !last.is_empty())
        })
        .unwrap_or(false);

    let derived = if under_api {
        url.join("status")
    } else {
        url.join("/api/status")
    };

    match derived {
        Ok(status) => status.to_string(),
        Err(_) => format!("{}/api/status", endpoint.trim_end_matches('/')),
    }
}
