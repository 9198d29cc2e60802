//! Batch processing types for parallel highlighting.

use crate::types::HighlightNode;
use napi_derive::napi;
use serde_json::Value as JsonValue;

/// Input for batch processing - a single snippet to highlight.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct HighlightBatchInput {
    /// Caller-chosen identifier echoed in the result.
    pub id: String,
    /// Language identifier.
    pub language: String,
    /// Source code to highlight.
    pub source_code: String,
    /// Optional per-snippet configuration map (`{"result-ns": ...}`).
    pub config: Option<JsonValue>,
}

/// Result for a single snippet in a batch.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct HighlightBatchResult {
    /// Identifier matching the input.
    pub id: String,
    /// Highlighted nodes (present on success).
    pub nodes: Option<Vec<HighlightNode>>,
    /// Error message (present on failure).
    pub error: Option<String>,
}

/// Statistics for batch processing.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct HighlightBatchStats {
    /// Total number of snippets submitted.
    pub total: u32,
    /// Number of snippets highlighted.
    pub succeeded: u32,
    /// Number of failed snippets.
    pub failed: u32,
    /// Total processing time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch processing.
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct HighlightBatchOptions {
    /// Maximum number of threads to use. Defaults to number of CPU cores.
    pub max_threads: Option<u32>,
    /// Whether to continue processing after an error. Defaults to true.
    pub continue_on_error: Option<bool>,
}

/// Result of batch processing containing all results and statistics.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct HighlightBatchProcessingResult {
    /// Individual results, in input order.
    pub results: Vec<HighlightBatchResult>,
    /// Processing statistics.
    pub stats: HighlightBatchStats,
}
