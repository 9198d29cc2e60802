use crate::types::{HighlightNode, NodeAttribute};
use xhl_core::{HighlightError, Node};

/// Converts a core `Node` to a `HighlightNode`.
pub(crate) fn convert_node(node: Node) -> HighlightNode {
    match node {
        Node::Element(el) => HighlightNode {
            r#type: "element".to_string(),
            namespace: el.name.namespace,
            local_name: Some(el.name.local_name),
            attributes: Some(
                el.attributes
                    .into_iter()
                    .map(|attr| NodeAttribute {
                        name: attr.name,
                        value: attr.value,
                    })
                    .collect(),
            ),
            children: Some(el.children.into_iter().map(convert_node).collect()),
            text: None,
        },
        Node::Text(text) => HighlightNode {
            r#type: "text".to_string(),
            namespace: None,
            local_name: None,
            attributes: None,
            children: None,
            text: Some(text),
        },
    }
}

/// Converts a pipeline error into a JS exception whose message starts with the error kind.
pub(crate) fn to_napi_error(err: HighlightError) -> napi::Error {
    napi::Error::from_reason(format!("{}: {}", err.kind().code(), err))
}
