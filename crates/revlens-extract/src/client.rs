//! Client for the external text-generation service.
//!
//! One review costs at most two generation calls: the original prompt,
//! then a single retry with a strict-output directive appended. Timeouts
//! and HTTP failures count as failed attempts, same as unparseable output.
//! The client holds no per-review state.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use revlens_core::{Error, Result};

use crate::diagnostics::{write_failure_artifact, FailedAttempt};
use crate::prompt::STRICT_OUTPUT_DIRECTIVE;
use crate::repair;
use crate::types::ExtractionResult;

/// Seam between the enrichment pipeline and the generation service.
pub trait ExtractorBackend: Send + Sync {
    /// Extract aspects for one rendered prompt.
    fn extract(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<ExtractionResult>> + Send;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for an Ollama-style `/api/generate` endpoint.
pub struct OllamaClient {
    http: Client,
    url: String,
    diagnostics_dir: Option<PathBuf>,
}

impl OllamaClient {
    /// Build a client with distinct connect and read timeouts.
    pub fn new(url: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            diagnostics_dir: None,
        })
    }

    /// Persist failure artifacts under `dir` when both attempts fail.
    pub fn with_diagnostics(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = Some(dir.into());
        self
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: "json",
            options: GenerateOptions { temperature: 0.2 },
        };

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "generation service returned {}: {}",
                status, text
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("invalid generation envelope: {}", e)))?;
        Ok(parsed.response.trim().to_string())
    }

    /// One call + repair + typed parse. On failure returns what there is
    /// to show for it.
    async fn attempt(&self, model: &str, prompt: &str) -> std::result::Result<ExtractionResult, FailedAttempt> {
        let raw = match self.generate(model, prompt).await {
            Ok(r) => r,
            Err(e) => {
                return Err(FailedAttempt {
                    raw: None,
                    candidate: None,
                    reason: e.to_string(),
                })
            }
        };

        let candidate = match repair::extract_candidate(&raw) {
            Some(c) => c,
            None => {
                return Err(FailedAttempt {
                    raw: Some(raw),
                    candidate: None,
                    reason: "no JSON object found in response".into(),
                })
            }
        };

        match serde_json::from_str::<ExtractionResult>(&candidate) {
            Ok(result) => Ok(result),
            Err(e) => Err(FailedAttempt {
                raw: Some(raw),
                candidate: Some(candidate),
                reason: format!("parse error: {}", e),
            }),
        }
    }
}

impl ExtractorBackend for OllamaClient {
    async fn extract(&self, model: &str, prompt: &str) -> Result<ExtractionResult> {
        let first = match self.attempt(model, prompt).await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };
        debug!("Extraction attempt 1 failed ({}), retrying strict", first.reason);

        let strict_prompt = format!("{}\n\n{}", prompt, STRICT_OUTPUT_DIRECTIVE);
        let second = match self.attempt(model, &strict_prompt).await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };

        if let Some(dir) = &self.diagnostics_dir {
            match write_failure_artifact(dir, &[first, second]) {
                Ok(path) => warn!("Extraction failed twice, artifact at {}", path.display()),
                Err(e) => warn!("Extraction failed twice; artifact write failed: {}", e),
            }
        } else {
            warn!("Extraction failed twice, no diagnostics dir configured");
        }

        Err(Error::Extraction(
            "no recoverable JSON after two attempts".into(),
        ))
    }
}
