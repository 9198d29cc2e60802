//! The stateful highlighter and its configuration.

use crate::batch::{
    HighlightBatchInput, HighlightBatchOptions, HighlightBatchProcessingResult,
    HighlightBatchResult, HighlightBatchStats,
};
use crate::convert::{convert_node, to_napi_error};
use crate::types::{HighlightNode, HighlighterOptions};
use napi_derive::napi;
use rayon::prelude::*;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use xhl_core::{
    EngineOptions, GrammarSource, HLJS_CLASS_PREFIX, HighlightEngine, HighlightError,
    HighlightFunction, ResultSequence,
};

pub(crate) fn engine_options(options: Option<HighlighterOptions>) -> EngineOptions {
    let opts = options.unwrap_or_default();
    let grammars = match (opts.syntax_dump, opts.grammar_dir) {
        (Some(dump), _) => GrammarSource::Dump(PathBuf::from(dump)),
        (None, Some(dir)) => GrammarSource::Directory(PathBuf::from(dir)),
        (None, None) => GrammarSource::Bundled,
    };
    EngineOptions {
        grammars,
        class_prefix: opts
            .class_prefix
            .unwrap_or_else(|| HLJS_CLASS_PREFIX.to_string()),
    }
}

fn positional_args(language: String, source_code: String, config: Option<JsonValue>) -> Vec<JsonValue> {
    let mut args = vec![JsonValue::String(language), JsonValue::String(source_code)];
    if let Some(config) = config {
        args.push(config);
    }
    args
}

/// Highlighter exposed to Node callers.
///
/// The grammar engine is loaded once by the constructor and shared by every
/// call made through this instance, including the worker threads of
/// `highlightBatch`.
#[napi]
pub struct Highlighter {
    pub(crate) function: HighlightFunction,
}

impl Highlighter {
    pub(crate) fn from_engine(engine: HighlightEngine) -> Self {
        Self {
            function: HighlightFunction::new(Arc::new(engine)),
        }
    }

    fn run(
        &self,
        language: String,
        source_code: String,
        config: Option<JsonValue>,
    ) -> Result<ResultSequence, HighlightError> {
        self.function
            .invoke(&positional_args(language, source_code, config))
    }
}

#[napi]
impl Highlighter {
    #[napi(constructor)]
    /// Loads the grammar engine. A failed load yields a disabled highlighter.
    pub fn new(options: Option<HighlighterOptions>) -> Self {
        Self::from_engine(HighlightEngine::initialize(&engine_options(options)))
    }

    /// Whether the grammar engine loaded.
    #[napi(getter)]
    pub fn is_available(&self) -> bool {
        self.function.engine().is_available()
    }

    /// Why the grammar engine failed to load, if it did.
    #[napi(getter)]
    pub fn unavailable_reason(&self) -> Option<String> {
        self.function
            .engine()
            .unavailable_reason()
            .map(str::to_string)
    }

    /// Highlights source code into element and text nodes.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier (must not be empty)
    /// * `source_code` - Code to highlight
    /// * `config` - Optional map; `result-ns` sets the element namespace (default XHTML)
    ///
    /// # Example (JavaScript)
    ///
    /// ```javascript
    /// const { Highlighter } = require('xhl-napi');
    ///
    /// const hl = new Highlighter();
    /// const nodes = hl.highlight('xml', '<test>value</test>', { 'result-ns': 'urn:example' });
    /// // nodes[0] = { type: "element", namespace: "urn:example", localName: "span", ... }
    /// ```
    #[napi]
    pub fn highlight(
        &self,
        language: String,
        source_code: String,
        config: Option<JsonValue>,
    ) -> napi::Result<Vec<HighlightNode>> {
        let seq = self
            .run(language, source_code, config)
            .map_err(to_napi_error)?;
        Ok(seq.into_iter().map(convert_node).collect())
    }

    /// Highlights source code and serializes the nodes as XML.
    ///
    /// Each top-level element declares its namespace.
    #[napi(js_name = "highlightToXml")]
    pub fn highlight_to_xml(
        &self,
        language: String,
        source_code: String,
        config: Option<JsonValue>,
    ) -> napi::Result<String> {
        let seq = self
            .run(language, source_code, config)
            .map_err(to_napi_error)?;
        Ok(seq.to_xml())
    }

    /// Returns the raw highlighted markup string.
    ///
    /// Deprecated: prefer `highlight`, which returns nodes in a configurable namespace.
    #[napi(js_name = "highlightMarkup")]
    #[allow(deprecated)]
    pub fn highlight_markup(&self, language: String, source_code: String) -> napi::Result<String> {
        self.function
            .invoke_markup(&positional_args(language, source_code, None))
            .map_err(to_napi_error)
    }

    /// Highlights many snippets in parallel using Rayon.
    ///
    /// All worker threads share this highlighter's engine; tokenizer calls are
    /// serialized inside it while parsing and namespace rewriting run in parallel.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Snippets to highlight
    /// * `options` - Optional batch processing options (thread count, error handling)
    #[napi(js_name = "highlightBatch")]
    pub fn highlight_batch(
        &self,
        inputs: Vec<HighlightBatchInput>,
        options: Option<HighlightBatchOptions>,
    ) -> napi::Result<HighlightBatchProcessingResult> {
        let start = Instant::now();
        let opts = options.unwrap_or_default();
        let continue_on_error = opts.continue_on_error.unwrap_or(true);

        let total = inputs.len() as u32;
        let succeeded = AtomicU32::new(0);
        let failed = AtomicU32::new(0);

        let process_input = |input: HighlightBatchInput| -> HighlightBatchResult {
            match self.run(input.language, input.source_code, input.config) {
                Ok(seq) => {
                    succeeded.fetch_add(1, Ordering::Relaxed);
                    HighlightBatchResult {
                        id: input.id,
                        nodes: Some(seq.into_iter().map(convert_node).collect()),
                        error: None,
                    }
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    log::debug!("batch item {} failed: {e}", input.id);
                    HighlightBatchResult {
                        id: input.id,
                        nodes: None,
                        error: Some(to_napi_error(e).reason),
                    }
                }
            }
        };

        let results: Vec<HighlightBatchResult> = if continue_on_error {
            // Configure thread pool if max_threads is specified
            let pool = opts.max_threads.and_then(|max_threads| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(max_threads as usize)
                    .build()
                    .ok()
            });
            if let Some(pool) = pool {
                pool.install(|| inputs.into_par_iter().map(process_input).collect())
            } else {
                inputs.into_par_iter().map(process_input).collect()
            }
        } else {
            // Stop on first error - sequential processing required
            let mut results = Vec::with_capacity(inputs.len());
            for input in inputs {
                let result = process_input(input);
                let had_error = result.error.is_some();
                results.push(result);
                if had_error {
                    break;
                }
            }
            results
        };

        let elapsed = start.elapsed();

        Ok(HighlightBatchProcessingResult {
            results,
            stats: HighlightBatchStats {
                total,
                succeeded: succeeded.load(Ordering::Relaxed),
                failed: failed.load(Ordering::Relaxed),
                processing_time_ms: elapsed.as_secs_f64() * 1000.0,
            },
        })
    }
}
