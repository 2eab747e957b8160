//! Aspect extraction: prompt rendering, the external generation-service
//! client, and the JSON repair pipeline that stands between the two.

pub mod client;
pub mod diagnostics;
pub mod prompt;
pub mod repair;
pub mod types;

pub use client::{ExtractorBackend, OllamaClient};
pub use prompt::{render_extraction_prompt, PROMPT_VERSION, STRICT_OUTPUT_DIRECTIVE};
pub use types::{AspectMention, ExtractionResult, UnmappedIssue};
