//! NAPI-exposed data structures.

use napi_derive::napi;

/// Options passed to the highlighter constructor.
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct HighlighterOptions {
    /// Directory of `.sublime-syntax` grammars to load instead of the bundled set.
    pub grammar_dir: Option<String>,
    /// Binary syntax set dump to load. Takes precedence over `grammarDir`.
    pub syntax_dump: Option<String>,
    /// Prefix for highlight classes. Defaults to `hljs-`.
    pub class_prefix: Option<String>,
}

/// Attribute of a highlighted element.
#[napi(object)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttribute {
    /// Attribute name (namespace-less).
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// A highlighted node.
///
/// JavaScript receives this as:
/// ```ts
/// type HighlightNode =
///   | { type: "element", namespace: string, localName: string, attributes: NodeAttribute[], children: HighlightNode[] }
///   | { type: "text", text: string }
/// ```
#[napi(object)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightNode {
    /// Node type: "element" or "text"
    pub r#type: String,
    /// Namespace URI (for type="element")
    pub namespace: Option<String>,
    /// Local name (for type="element")
    pub local_name: Option<String>,
    /// Attributes in source order (for type="element")
    pub attributes: Option<Vec<NodeAttribute>>,
    /// Child nodes in document order (for type="element")
    pub children: Option<Vec<HighlightNode>>,
    /// Character content (for type="text")
    pub text: Option<String>,
}
