use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;

use crate::config::Config;
use crate::constants::{FALLBACK_SERVER_ERROR, NO_TEXT_MESSAGE, UPLOAD_FIELD_NAME};
use crate::models::{BackendStatus, ExtractResponse, ExtractionResult, SelectedFile, Statistics};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The request never produced a response.
    Transport {
        endpoint: String,
        unreachable: bool,
        detail: String,
    },
    Http(u16),
    Server(String),
    NoText,
    Malformed(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Transport {
                endpoint,
                unreachable: true,
                ..
            } => write!(
                f,
                "Cannot connect to the OCR backend at {}. Make sure the backend server is running.",
                endpoint
            ),
            ExtractionError::Transport { detail, .. } => {
                write!(f, "Failed to extract text: {}", detail)
            }
            ExtractionError::Http(status) => {
                write!(f, "OCR backend responded with HTTP status {}", status)
            }
            ExtractionError::Server(msg) => f.write_str(msg),
            ExtractionError::NoText => f.write_str(NO_TEXT_MESSAGE),
            ExtractionError::Malformed(detail) => {
                write!(f, "Failed to read OCR backend response: {}", detail)
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn extract(&self, file: &SelectedFile) -> Result<ExtractionResult, ExtractionError>;
    fn backend_id(&self) -> &str;
}

/// Talks to the OCR backend over HTTP.
#[derive(Clone)]
pub struct HttpExtractionClient {
    client: reqwest::Client,
    endpoint: String,
    status_endpoint: String,
}

impl HttpExtractionClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.ocr_endpoint.clone(),
            status_endpoint: config.ocr_status_endpoint.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> ExtractionError {
        ExtractionError::Transport {
            endpoint: self.endpoint.clone(),
            unreachable: err.is_connect(),
            detail: err.to_string(),
        }
    }

    pub async fn backend_status(&self) -> Result<BackendStatus, ExtractionError> {
        let resp = self
            .client
            .get(&self.status_endpoint)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport {
                endpoint: self.status_endpoint.clone(),
                unreachable: e.is_connect(),
                detail: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractionError::Http(status.as_u16()));
        }

        resp.json::<BackendStatus>()
            .await
            .map_err(|e| ExtractionError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ExtractionBackend for HttpExtractionClient {
    async fn extract(&self, file: &SelectedFile) -> Result<ExtractionResult, ExtractionError> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| self.transport_error(e))?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD_NAME, part);

        log::info!(
            "Sending {} ({} bytes) to {}",
            file.name,
            file.size(),
            self.endpoint
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        parse_response(status, &body)
    }

    fn backend_id(&self) -> &str {
        &self.endpoint
    }
}

/// Applies the extraction contract to a raw backend answer.
pub fn parse_response(status: StatusCode, body: &str) -> Result<ExtractionResult, ExtractionError> {
    if !status.is_success() {
        log::warn!("OCR backend answered {}: {}", status, body);
        return Err(ExtractionError::Http(status.as_u16()));
    }

    let response: ExtractResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    if !response.success {
        let msg = response
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_SERVER_ERROR.to_string());
        return Err(ExtractionError::Server(msg));
    }

    let text = prefer(response.extracted_text, response.corrected_text).unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }

    let original_text = prefer(response.original_text, response.raw_text);
    let statistics = response.statistics.map(|raw| Statistics {
        word_count: raw.corrected_word_count.or(raw.raw_word_count),
        corrections_applied: raw.corrections_applied,
        quality_assessment: raw.quality_assessment.filter(|q| !q.is_empty()),
    });

    Ok(ExtractionResult {
        text,
        original_text,
        statistics,
    })
}

/// Primary field wins when present and non-empty.
fn prefer(primary: Option<String>, secondary: Option<String>) -> Option<String> {
    primary
        .filter(|s| !s.is_empty())
        .or_else(|| secondary.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

    fn ok(body: &str) -> Result<ExtractionResult, ExtractionError> {
        parse_response(StatusCode::OK, body)
    }

    #[test]
    fn test_parse_primary_fields() {
        let result = ok(r#"{"success":true,"extracted_text":"Hello world"}"#).unwrap();
        assert_eq!(result.text, "Hello world");
        assert_eq!(result.original_text, None);
        assert_eq!(result.statistics, None);
    }

    #[test]
    fn test_parse_fallback_fields() {
        let result = ok(r#"{
            "success": true,
            "extracted_text": "",
            "corrected_text": "Corrected",
            "raw_text": "Corectd",
            "statistics": {"raw_word_count": 1, "corrections_applied": 1, "quality_assessment": "fair"}
        }"#)
        .unwrap();
        assert_eq!(result.text, "Corrected");
        assert_eq!(result.original_text.as_deref(), Some("Corectd"));
        assert_eq!(
            result.statistics,
            Some(Statistics {
                word_count: Some(1),
                corrections_applied: Some(1),
                quality_assessment: Some("fair".to_string()),
            })
        );
    }

    #[test]
    fn test_primary_wins_when_both_present() {
        let result = ok(r#"{"success":true,"extracted_text":"A","corrected_text":"B",
            "original_text":"C","raw_text":"D",
            "statistics":{"corrected_word_count":7,"raw_word_count":9}}"#)
        .unwrap();
        assert_eq!(result.text, "A");
        assert_eq!(result.original_text.as_deref(), Some("C"));
        assert_eq!(result.statistics.unwrap().word_count, Some(7));
    }

    #[test]
    fn test_blank_text_is_no_text() {
        assert_eq!(ok(r#"{"success":true,"extracted_text":"   "}"#), Err(ExtractionError::NoText));
        assert_eq!(ok(r#"{"success":true}"#), Err(ExtractionError::NoText));
    }

    #[test]
    fn test_server_error_message() {
        assert_eq!(
            ok(r#"{"success":false,"error":"bad image"}"#),
            Err(ExtractionError::Server("bad image".to_string()))
        );
        let err = ok(r#"{"success":false}"#).unwrap_err();
        assert_eq!(err.to_string(), "Failed to extract text");
    }

    #[test]
    fn test_http_status_is_reported() {
        let err = parse_response(StatusCode::SERVICE_UNAVAILABLE, "down").unwrap_err();
        assert_eq!(err, ExtractionError::Http(503));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(ok("<html>"), Err(ExtractionError::Malformed(_))));
    }

    #[test]
    fn test_unreachable_message_names_backend() {
        let err = ExtractionError::Transport {
            endpoint: "http://localhost:5000/api/extract-text".to_string(),
            unreachable: true,
            detail: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot connect to the OCR backend"));
        assert!(msg.contains("http://localhost:5000/api/extract-text"));
    }

    fn sample_file() -> SelectedFile {
        SelectedFile {
            name: "photo.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    async fn fake_extract(req: HttpRequest, body: web::Bytes) -> HttpResponse {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let raw = String::from_utf8_lossy(&body);
        if content_type.starts_with("multipart/form-data")
            && raw.contains("name=\"file\"")
            && raw.contains("filename=\"photo.jpg\"")
        {
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "extracted_text": "Hello world"
            }))
        } else {
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "No file provided"
            }))
        }
    }

    #[actix_web::test]
    async fn test_client_posts_multipart_file() {
        let server = HttpServer::new(|| {
            App::new()
                .route("/api/extract-text", web::post().to(fake_extract))
                .route(
                    "/api/status",
                    web::get().to(|| async {
                        HttpResponse::Ok().json(serde_json::json!({
                            "status": "running",
                            "ocr_service_ready": true
                        }))
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let handle = server.run();
        let server_handle = handle.handle();
        actix_web::rt::spawn(handle);

        let config =
            Config::new().with_endpoint(&format!("http://{}/api/extract-text", addr));
        let client = HttpExtractionClient::new(&config);

        let result = client.extract(&sample_file()).await.unwrap();
        assert_eq!(result.text, "Hello world");

        let status = client.backend_status().await.unwrap();
        assert!(status.ocr_service_ready);
        assert_eq!(status.status, "running");

        server_handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind and immediately release a port so nothing listens on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = Config::new().with_endpoint(&format!("http://127.0.0.1:{}/api/extract-text", port));
        let client = HttpExtractionClient::new(&config);

        let err = client.extract(&sample_file()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Transport { unreachable: true, .. }));
    }
}
