#![deny(missing_docs)]
//! xhl core: highlighted source code as namespaced markup nodes.

/// Calling convention of the `highlight` extension function.
pub mod call;
/// Shared tokenizer engine lifecycle.
pub mod engine;
/// Core error types.
pub mod error;
/// Result sequence extraction.
pub mod extract;
/// Fragment parsing under a synthetic root.
pub mod fragment;
/// Node tree and serialization.
pub mod node;
/// Namespace retargeting.
pub mod retarget;
/// Tokenizer adapters.
pub mod tokenizer;

pub use call::{
    FUNCTION_NAME, FUNCTION_NAMESPACE, FUNCTION_PREFIX, FunctionSignature, HighlightConfig,
    HighlightFunction, HighlightRequest, RESULT_NS_KEY, string_value,
};
pub use engine::{EngineOptions, HighlightEngine};
pub use error::{ErrorKind, FragmentOffset, HighlightError};
pub use extract::{ResultSequence, extract_sequence};
pub use fragment::{FragmentTree, WRAPPER, parse_fragment};
pub use node::{Attribute, Element, Node, QName, descendants, to_markup};
pub use retarget::{NamespaceRetargeter, RetargetedTree, TargetNamespace, XHTML_NAMESPACE};
pub use tokenizer::{GrammarSource, HLJS_CLASS_PREFIX, LoadError, SyntectTokenizer, Tokenizer};
