#![deny(missing_docs)]
//! Node.js bindings that surface xhl's highlighting pipeline.

use napi_derive::napi;

/// Batch processing types.
pub mod batch;
/// Core-to-NAPI conversions.
mod convert;
/// The stateful highlighter.
pub mod highlighter;
/// NAPI-exposed data structures.
pub mod types;

pub use batch::*;
pub use highlighter::Highlighter;
pub use types::*;

/// Namespace URI the `highlight` function is registered under.
#[napi(js_name = "functionNamespace")]
pub fn function_namespace() -> String {
    xhl_core::FUNCTION_NAMESPACE.to_string()
}

/// Namespace highlighted elements get when no `result-ns` is configured.
#[napi(js_name = "defaultResultNamespace")]
pub fn default_result_namespace() -> String {
    xhl_core::XHTML_NAMESPACE.to_string()
}
