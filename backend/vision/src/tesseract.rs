//! Tesseract-backed OCR engine.
//!
//! Runs the tesseract CLI in TSV mode and parses word-level rows into
//! text spans. Recognition languages and the trained-data directory come
//! from configuration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use framescribe_core::{BoundingBox, OcrEngine, ScribeError, TextSpan};
use tokio::process::Command;
use tracing::debug;

pub struct TesseractOcr {
    binary: String,
    languages: Vec<String>,
    model_dir: Option<PathBuf>,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            languages,
            model_dir: None,
        }
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &Path) -> Result<Vec<TextSpan>, ScribeError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image)
            .arg("stdout")
            .args(["-l", &self.languages.join("+")]);
        if let Some(dir) = &self.model_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("tsv");

        debug!(image = %image.display(), languages = %self.languages.join("+"), "Running OCR");

        let output = cmd.output().await.map_err(|e| {
            ScribeError::unavailable("ocr", format!("failed to run {}: {e}", self.binary))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::unavailable(
                "ocr",
                format!("{} exited with {}: {}", self.binary, output.status, stderr.trim()),
            ));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse tesseract TSV output into word-level spans, detection order.
///
/// Columns: level page block par line word left top width height conf text.
/// Word rows carry level 5 and a non-negative confidence (percent).
fn parse_tsv(tsv: &str) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        if fields[0] != "5" {
            continue;
        }
        let Ok(conf) = fields[10].parse::<f32>() else {
            continue;
        };
        if conf < 0.0 {
            continue;
        }
        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }
        let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
            fields[6].parse::<u32>(),
            fields[7].parse::<u32>(),
            fields[8].parse::<u32>(),
            fields[9].parse::<u32>(),
        ) else {
            continue;
        };
        spans.push(TextSpan::new(
            BoundingBox {
                x,
                y,
                width,
                height,
            },
            text,
            conf / 100.0,
        ));
    }
    spans
}
