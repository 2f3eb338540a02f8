use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use std::io::Write;
use std::process::{Child, Command, ExitStatus, Stdio};

pub trait ClipboardWriter: Send {
    fn name(&self) -> &'static str;
    fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Which writer ended up holding the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub method: &'static str,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyError {
    pub attempts: Vec<(&'static str, String)>,
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return f.write_str("No clipboard method available");
        }
        let reasons = self
            .attempts
            .iter()
            .map(|(name, reason)| format!("{}: {}", name, reason))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "Failed to copy text ({})", reasons)
    }
}

impl std::error::Error for CopyError {}

/// Platform clipboard first, then the fallbacks in order.
pub struct CopyService {
    writers: Vec<Box<dyn ClipboardWriter>>,
}

impl CopyService {
    pub fn new(writers: Vec<Box<dyn ClipboardWriter>>) -> Self {
        Self { writers }
    }

    pub fn platform_default() -> Self {
        Self::new(vec![
            Box::new(SystemClipboard::detect()),
            Box::new(Osc52Clipboard::stdout()),
        ])
    }

    pub fn copy(&self, text: &str) -> Result<CopyOutcome, CopyError> {
        let mut attempts = Vec::new();
        for (index, writer) in self.writers.iter().enumerate() {
            match writer.write_text(text) {
                Ok(()) => {
                    log::info!("Copied {} characters via {}", text.chars().count(), writer.name());
                    return Ok(CopyOutcome {
                        method: writer.name(),
                        used_fallback: index > 0,
                    });
                }
                Err(reason) => {
                    log::warn!("Clipboard method {} failed: {}", writer.name(), reason);
                    attempts.push((writer.name(), reason));
                }
            }
        }
        Err(CopyError { attempts })
    }
}

/// Pipes the text into the platform clipboard tool.
pub struct SystemClipboard {
    program: &'static str,
    args: &'static [&'static str],
}

impl SystemClipboard {
    pub fn detect() -> Self {
        let (program, args): (&'static str, &'static [&'static str]) = if cfg!(target_os = "macos") {
            ("pbcopy", &[])
        } else if cfg!(target_os = "windows") {
            ("clip.exe", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            ("wl-copy", &[])
        } else {
            ("xclip", &["-selection", "clipboard"])
        };
        Self { program, args }
    }
}

impl ClipboardWriter for SystemClipboard {
    fn name(&self) -> &'static str {
        self.program
    }

    fn write_text(&self, text: &str) -> Result<(), String> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| e.to_string())?;

        let status = feed_and_reap(&mut child, text)?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("exited with {}", status))
        }
    }
}

/// Writes `text` to the child's stdin and waits for it even when the write
/// fails, so no zombie is left behind.
fn feed_and_reap(child: &mut Child, text: &str) -> Result<ExitStatus, String> {
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()).map_err(|e| e.to_string()),
        None => Ok(()),
    };
    if written.is_err() {
        let _ = child.kill();
    }

    let status = child.wait().map_err(|e| e.to_string())?;
    written.map(|_| status)
}

/// OSC 52 escape sequence; terminals that support it put the payload on the
/// clipboard of the machine the user is sitting at.
pub struct Osc52Clipboard<W: Write + Send> {
    out: std::sync::Mutex<W>,
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: std::sync::Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

impl<W: Write + Send> ClipboardWriter for Osc52Clipboard<W> {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn write_text(&self, text: &str) -> Result<(), String> {
        let mut out = self.out.lock().map_err(|e| e.to_string())?;
        write!(out, "\x1b]52;c;{}\x07", general_purpose::STANDARD.encode(text.as_bytes()))
            .and_then(|_| out.flush())
            .map_err(|e| e.to_string())
    }
}
