//! Extraction routine invoked once per staged upload.
//!
//! Usage: `extract-file <path>`
//!
//! Writes the document text to stdout and exits 0. On any failure a
//! message goes to stderr and the exit status is 1. Nothing except
//! extracted text is ever written to stdout.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "extract-file", version, about = "Print the text content of a document")]
struct Args {
    /// Document to extract (.pdf, .txt, .doc, .docx, .jpg, .jpeg, .png)
    path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let text = match extract(&args.path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("extract-file: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        eprintln!("extract-file: failed to write output: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn extract(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail!("File does not exist: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    tracing::debug!(path = %path.display(), extension = %extension, "Extracting");

    match extension.as_str() {
        "pdf" => extract_pdf(path),
        "txt" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {} as UTF-8 text", path.display())),
        "doc" | "docx" => extract_docx(path),
        "jpg" | "jpeg" | "png" => extract_image(path),
        "" => bail!("Unsupported file type: no extension"),
        other => bail!("Unsupported file type: .{other}"),
    }
}

fn extract_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Failed to extract PDF text from {}", path.display()))
}

/// Paragraph text joined by newlines. Legacy binary `.doc` files are not
/// OOXML and fail here.
fn extract_docx(path: &Path) -> Result<String> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = docx_rs::read_docx(&data)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Failed to parse Word document {}", path.display()))?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut text = String::new();
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }

    Ok(paragraphs.join("\n"))
}

/// OCR through the Tesseract CLI.
fn extract_image(path: &Path) -> Result<String> {
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .output()
        .context("Failed to execute tesseract. Install it with: apt-get install tesseract-ocr (Linux) or brew install tesseract (macOS)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("tesseract failed: {}", stderr.trim());
    }

    String::from_utf8(output.stdout).context("tesseract returned invalid UTF-8")
}
