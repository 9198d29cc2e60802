//! Calling convention of the `highlight` extension function.
//!
//! Host engines hand over loosely typed argument values. This layer checks the
//! arity, coerces arguments to strings, reads the optional configuration map and
//! runs the pipeline: tokenizer, fragment parser, retargeter, extractor.

use crate::engine::HighlightEngine;
use crate::extract::{ResultSequence, extract_sequence};
use crate::fragment::parse_fragment;
use crate::retarget::{NamespaceRetargeter, TargetNamespace};
use crate::HighlightError;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::sync::Arc;

/// Namespace the function is registered under.
pub const FUNCTION_NAMESPACE: &str = "urn:xhl:extfunctions";
/// Conventional prefix for [`FUNCTION_NAMESPACE`].
pub const FUNCTION_PREFIX: &str = "xhl";
/// Local name of the function.
pub const FUNCTION_NAME: &str = "highlight";
/// Configuration key selecting the result namespace.
pub const RESULT_NS_KEY: &str = "result-ns";

/// Name and arity of an extension function, as registered with a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Function namespace URI.
    pub namespace: &'static str,
    /// Conventional prefix.
    pub prefix: &'static str,
    /// Local name.
    pub local_name: &'static str,
    /// Lexical `prefix:local` form used in messages.
    pub display_name: &'static str,
    /// Minimum number of arguments.
    pub min_arity: usize,
    /// Maximum number of arguments.
    pub max_arity: usize,
}

impl FunctionSignature {
    /// Whether `count` arguments are accepted.
    pub fn accepts(&self, count: usize) -> bool {
        (self.min_arity..=self.max_arity).contains(&count)
    }

    fn check_arity(&self, count: usize) -> Result<(), HighlightError> {
        if self.accepts(count) {
            return Ok(());
        }
        Err(HighlightError::Arity {
            function: self.display_name,
            min: self.min_arity,
            max: self.max_arity,
            given: count,
        })
    }
}

/// Optional third argument of the function.
///
/// Only `result-ns` is recognized; any other key is ignored so callers can pass
/// options meant for newer versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HighlightConfig {
    /// Namespace URI highlighted elements are bound to.
    #[serde(default, rename = "result-ns")]
    pub result_namespace: Option<String>,
}

impl HighlightConfig {
    /// Read the configuration out of a host map.
    ///
    /// A key bound to the empty value counts as absent; other values are
    /// coerced to their string value.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, HighlightError> {
        let result_namespace = match map.get(RESULT_NS_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(value) => Some(string_value(value, RESULT_NS_KEY)?),
        };
        Ok(Self { result_namespace })
    }

    /// Interpret the optional configuration argument.
    ///
    /// Accepts a map, a single-item sequence holding a map, or the empty value.
    pub fn from_argument(value: Option<&Value>) -> Result<Self, HighlightError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(map)) => Self::from_map(map),
            Some(Value::Array(items)) => match items.as_slice() {
                [] => Ok(Self::default()),
                [Value::Object(map)] => Self::from_map(map),
                _ => Err(HighlightError::invalid_argument(
                    "config",
                    "expected a single map",
                )),
            },
            Some(other) => Err(HighlightError::invalid_argument(
                "config",
                format!("expected a map, got {}", value_kind(other)),
            )),
        }
    }

    /// Validated namespace, defaulting to XHTML.
    pub fn target_namespace(&self) -> Result<TargetNamespace, HighlightError> {
        match &self.result_namespace {
            Some(uri) => TargetNamespace::parse(uri),
            None => Ok(TargetNamespace::xhtml()),
        }
    }
}

/// One validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRequest {
    /// Language identifier, never empty.
    pub language: String,
    /// Code to highlight, possibly empty.
    pub source_code: String,
    /// Namespace for result elements.
    pub target_namespace: TargetNamespace,
}

impl HighlightRequest {
    /// A request targeting XHTML.
    pub fn new(
        language: impl Into<String>,
        source_code: impl Into<String>,
    ) -> Result<Self, HighlightError> {
        let language = language.into();
        if language.is_empty() {
            return Err(HighlightError::invalid_argument(
                "language",
                "must not be empty",
            ));
        }
        Ok(Self {
            language,
            source_code: source_code.into(),
            target_namespace: TargetNamespace::xhtml(),
        })
    }

    /// Replace the target namespace.
    pub fn with_namespace(mut self, namespace: TargetNamespace) -> Self {
        self.target_namespace = namespace;
        self
    }

    /// Validate positional host arguments `(language, sourceCode, config?)`.
    pub fn from_args(args: &[Value]) -> Result<Self, HighlightError> {
        HighlightFunction::SIGNATURE.check_arity(args.len())?;
        let language = string_value(&args[0], "language")?;
        let source_code = string_value(&args[1], "sourceCode")?;
        let config = HighlightConfig::from_argument(args.get(2))?;
        Ok(Self::new(language, source_code)?.with_namespace(config.target_namespace()?))
    }
}

/// String value of a host item.
///
/// Sequences contribute their first item and the empty value is the empty
/// string. Maps have no string value.
pub fn string_value(value: &Value, argument: &'static str) -> Result<String, HighlightError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(number_string(n)),
        Value::Array(items) => match items.first() {
            Some(first) => string_value(first, argument),
            None => Ok(String::new()),
        },
        Value::Object(_) => Err(HighlightError::invalid_argument(
            argument,
            "a map has no string value",
        )),
    }
}

/// Canonical decimal form: integral values print without a fractional part.
fn number_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "the empty value",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a map",
    }
}

/// The `highlight` function bound to an engine.
#[derive(Debug, Clone)]
pub struct HighlightFunction {
    engine: Arc<HighlightEngine>,
}

impl HighlightFunction {
    /// Registration details.
    pub const SIGNATURE: FunctionSignature = FunctionSignature {
        namespace: FUNCTION_NAMESPACE,
        prefix: FUNCTION_PREFIX,
        local_name: FUNCTION_NAME,
        display_name: "xhl:highlight",
        min_arity: 2,
        max_arity: 3,
    };

    /// Bind the function to a shared engine.
    pub fn new(engine: Arc<HighlightEngine>) -> Self {
        Self { engine }
    }

    /// The engine calls go through.
    pub fn engine(&self) -> &HighlightEngine {
        &self.engine
    }

    /// Evaluate with positional host arguments.
    pub fn invoke(&self, args: &[Value]) -> Result<ResultSequence, HighlightError> {
        self.ensure_available()?;
        let request = HighlightRequest::from_args(args)?;
        self.call(&request)
    }

    /// Run the pipeline for a validated request.
    pub fn call(&self, request: &HighlightRequest) -> Result<ResultSequence, HighlightError> {
        self.ensure_available()?;
        if request.source_code.is_empty() {
            return Ok(ResultSequence::default());
        }

        let markup = self
            .engine
            .highlight(&request.language, &request.source_code)?;
        log::debug!(
            "highlighted {} bytes of {} into {} bytes of markup",
            request.source_code.len(),
            request.language,
            markup.len()
        );

        let tree = parse_fragment(&markup).inspect_err(|err| {
            log::debug!("tokenizer output for {} did not parse: {err}", request.language);
        })?;
        let retargeted =
            NamespaceRetargeter::new(request.target_namespace.clone()).apply(&tree);
        Ok(extract_sequence(retargeted))
    }

    /// Raw tokenizer markup instead of nodes.
    ///
    /// Earlier deployments returned the highlighted markup as one string and
    /// ignored the configuration argument. Kept for callers that still embed
    /// the string themselves.
    #[deprecated(note = "use `invoke`, which returns nodes in a configurable namespace")]
    pub fn invoke_markup(&self, args: &[Value]) -> Result<String, HighlightError> {
        self.ensure_available()?;
        let request = HighlightRequest::from_args(args)?;
        if request.source_code.is_empty() {
            return Ok(String::new());
        }
        self.engine
            .highlight(&request.language, &request.source_code)
    }

    fn ensure_available(&self) -> Result<(), HighlightError> {
        match self.engine.unavailable_reason() {
            Some(reason) => Err(HighlightError::engine_unavailable(reason)),
            None => Ok(()),
        }
    }
}
