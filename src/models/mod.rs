use serde::{Deserialize, Serialize};

/// Image accepted by file acquisition. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Statistics block reported by the OCR backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub word_count: Option<u64>,
    pub corrections_applied: Option<u64>,
    pub quality_assessment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub text: String,
    pub original_text: Option<String>,
    pub statistics: Option<Statistics>,
}

/// Raw body of the extraction endpoint. Both generations of field names are
/// accepted; resolution happens in `services::ocr`.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub success: bool,
    pub extracted_text: Option<String>,
    pub corrected_text: Option<String>,
    pub original_text: Option<String>,
    pub raw_text: Option<String>,
    pub statistics: Option<RawStatistics>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawStatistics {
    pub corrected_word_count: Option<u64>,
    pub raw_word_count: Option<u64>,
    pub corrections_applied: Option<u64>,
    pub quality_assessment: Option<String>,
}

/// Answer of the backend status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ocr_service: Option<String>,
    #[serde(default)]
    pub ocr_service_ready: bool,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileView {
    pub name: String,
    pub display_name: String,
    pub mime: String,
    pub size: u64,
    pub size_label: String,
    pub preview_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextStatsView {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
}

/// Snapshot of one session, rendered by the page script.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub file: Option<FileView>,
    pub text: String,
    pub has_result: bool,
    pub edit_seq: u64,
    pub has_original: bool,
    pub can_toggle_original: bool,
    pub stats: TextStatsView,
    pub statistics: Option<Statistics>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub text: String,
    /// Client-side edit counter; absent for clients that send one edit at a time.
    #[serde(default)]
    pub seq: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DownloadTicket {
    pub url: String,
    pub file_name: String,
}
