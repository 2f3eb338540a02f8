use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::{SelectedFile, Statistics};
use crate::services::acquisition::acquire_path;
use crate::services::clipboard::CopyService;
use crate::services::export::TextDownload;
use crate::services::preview::format_file_size;
use crate::services::session::{Event, Session};
use crate::services::text::{TextStats, TextTransform};
use crate::services::{ExtractionBackend, HttpExtractionClient};

#[derive(Parser)]
#[command(name = "ocr-desk")]
#[command(author, version, about = "Upload images to an OCR backend and work with the text", long_about = None)]
pub struct Cli {
    /// OCR extraction endpoint (overrides OCR_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve,

    /// Extract text from an image file and print it
    Extract {
        /// Image file (PNG, JPEG, GIF, BMP, TIFF, WebP; at most 10 MB)
        image: PathBuf,
        /// Apply a transform to the text: uppercase, lowercase or normalize
        #[arg(long)]
        transform: Option<TextTransform>,
        /// Print the uncorrected text when the backend returns one
        #[arg(long)]
        original: bool,
        /// Save the text as extracted-text-<timestamp>.txt in this directory
        #[arg(long)]
        save: Option<PathBuf>,
        /// Copy the text to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Check whether the OCR backend is up
    Status,
}

impl Cli {
    pub fn config(&self) -> Config {
        match &self.endpoint {
            Some(endpoint) => Config::new().with_endpoint(endpoint),
            None => Config::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub transform: Option<TextTransform>,
    pub original: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractReport {
    pub text: String,
    pub stats: TextStats,
    pub statistics: Option<Statistics>,
}

/// Drives a session through select -> extract -> (toggle) -> (transform).
pub async fn run_extract(
    backend: &dyn ExtractionBackend,
    file: SelectedFile,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut session = Session::new();
    session.dispatch(Event::Select {
        file: file.clone(),
        preview: None,
    })?;
    session.dispatch(Event::ExtractStarted)?;

    let outcome = backend.extract(&file).await;
    session.dispatch(Event::ExtractFinished(outcome))?;
    if let Some(error) = session.error() {
        bail!("{}", error);
    }

    if options.original {
        if session.can_toggle_original() {
            session.dispatch(Event::ToggleOriginal)?;
        } else {
            warn!("Backend returned no distinct original text; printing the extracted text");
        }
    }
    if let Some(transform) = options.transform {
        session.dispatch(Event::Transform(transform))?;
    }

    Ok(ExtractReport {
        text: session.extracted_text().to_string(),
        stats: session.stats(),
        statistics: session.statistics().cloned(),
    })
}

pub async fn handle_extract(
    config: &Config,
    image: &Path,
    options: ExtractOptions,
    save: Option<&Path>,
    copy: bool,
) -> Result<()> {
    let file = acquire_path(image).with_context(|| format!("Cannot use {}", image.display()))?;
    info!(
        "Extracting text from {} ({})",
        file.name,
        format_file_size(file.size())
    );

    let client = HttpExtractionClient::new(config);
    let report = run_extract(&client, file, &options).await?;

    println!("{}", report.text);
    eprintln!(
        "--- {} words, {} characters, {} lines",
        report.stats.words, report.stats.characters, report.stats.lines
    );
    if let Some(statistics) = &report.statistics {
        if let Some(corrections) = statistics.corrections_applied {
            eprintln!("--- {} corrections applied", corrections);
        }
        if let Some(quality) = &statistics.quality_assessment {
            eprintln!("--- quality: {}", quality);
        }
    }

    if let Some(dir) = save {
        let download = TextDownload::new(&report.text, Utc::now());
        let path = download
            .save_to_dir(dir)
            .with_context(|| format!("Failed to save text into {}", dir.display()))?;
        eprintln!("Saved to {}", path.display());
    }

    if copy {
        match CopyService::platform_default().copy(&report.text) {
            Ok(outcome) if outcome.used_fallback => {
                eprintln!("Copied to clipboard via {} (fallback)", outcome.method)
            }
            Ok(outcome) => eprintln!("Copied to clipboard via {}", outcome.method),
            Err(e) => warn!("{}", e),
        }
    }

    Ok(())
}

pub async fn handle_status(config: &Config) -> Result<()> {
    let client = HttpExtractionClient::new(config);
    let status = client.backend_status().await?;

    println!("Endpoint      : {}", client.endpoint());
    println!("Status        : {}", status.status);
    println!(
        "OCR service   : {}",
        status.ocr_service.as_deref().unwrap_or("unknown")
    );
    println!("Ready         : {}", status.ocr_service_ready);
    if let Some(version) = &status.version {
        println!("Version       : {}", version);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionResult;
    use crate::services::ExtractionError;
    use async_trait::async_trait;

    struct Fixed(Result<ExtractionResult, ExtractionError>);

    #[async_trait]
    impl ExtractionBackend for Fixed {
        async fn extract(&self, _file: &SelectedFile) -> Result<ExtractionResult, ExtractionError> {
            self.0.clone()
        }

        fn backend_id(&self) -> &str {
            "fixed"
        }
    }

    fn png() -> SelectedFile {
        SelectedFile {
            name: "page.png".into(),
            mime: "image/png".into(),
            bytes: vec![0; 32],
        }
    }

    #[tokio::test]
    async fn test_run_extract_with_original_and_transform() {
        let backend = Fixed(Ok(ExtractionResult {
            text: "Corrected text".into(),
            original_text: Some("  Corectd\n\n text ".into()),
            statistics: Some(Statistics {
                word_count: Some(2),
                corrections_applied: Some(1),
                quality_assessment: Some("good".into()),
            }),
        }));
        let options = ExtractOptions {
            transform: Some(TextTransform::Normalize),
            original: true,
        };

        let report = run_extract(&backend, png(), &options).await.unwrap();
        assert_eq!(report.text, "Corectd\ntext");
        assert_eq!(report.stats.lines, 2);
        assert_eq!(report.statistics.unwrap().corrections_applied, Some(1));
    }

    #[tokio::test]
    async fn test_run_extract_surfaces_errors() {
        let backend = Fixed(Err(ExtractionError::Http(500)));
        let err = run_extract(&backend, png(), &ExtractOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_cli_parses_extract() {
        let cli = Cli::parse_from([
            "ocr-desk",
            "--endpoint",
            "http://ocr:5000/api/extract-text",
            "extract",
            "scan.png",
            "--transform",
            "lowercase",
            "--copy",
        ]);
        assert_eq!(cli.config().ocr_status_endpoint, "http://ocr:5000/api/status");
        match cli.command {
            Some(Commands::Extract {
                image,
                transform,
                copy,
                original,
                save,
            }) => {
                assert_eq!(image, PathBuf::from("scan.png"));
                assert_eq!(transform, Some(TextTransform::Lowercase));
                assert!(copy);
                assert!(!original);
                assert!(save.is_none());
            }
            _ => panic!("expected extract command"),
        }
    }
}
