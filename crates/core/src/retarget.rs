//! Moves every element of a fragment into a caller-chosen namespace.

use crate::HighlightError;
use crate::fragment::FragmentTree;
use crate::node::{Element, Node, QName};

/// XHTML namespace URI, the default target for highlighted elements.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A syntactically valid, absolute namespace URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetNamespace(String);

impl TargetNamespace {
    /// The XHTML namespace.
    pub fn xhtml() -> Self {
        Self(XHTML_NAMESPACE.to_string())
    }

    /// Validate a namespace URI.
    ///
    /// Accepts absolute URIs only: a scheme (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`)
    /// followed by `:` and at least one more character, with no whitespace,
    /// control characters or characters that can never appear in a URI.
    pub fn parse(uri: &str) -> Result<Self, HighlightError> {
        let invalid = |message: &str| HighlightError::invalid_argument("result-ns", message);

        if uri.is_empty() {
            return Err(invalid("namespace URI must not be empty"));
        }
        if let Some(bad) = uri
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || "<>\"{}|\\^`".contains(*c))
        {
            return Err(invalid(&format!(
                "namespace URI `{uri}` contains illegal character {bad:?}"
            )));
        }
        let Some((scheme, rest)) = uri.split_once(':') else {
            return Err(invalid(&format!("namespace URI `{uri}` has no scheme")));
        };
        let mut scheme_chars = scheme.chars();
        let scheme_ok = scheme_chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && scheme_chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok || rest.is_empty() {
            return Err(invalid(&format!(
                "namespace URI `{uri}` is not an absolute URI"
            )));
        }
        Ok(Self(uri.to_string()))
    }

    /// URI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TargetNamespace {
    fn default() -> Self {
        Self::xhtml()
    }
}

impl std::fmt::Display for TargetNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fragment whose elements all live in one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetargetedTree {
    root: Element,
    namespace: TargetNamespace,
}

impl RetargetedTree {
    /// The retargeted synthetic root.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Namespace every element is bound to.
    pub fn namespace(&self) -> &TargetNamespace {
        &self.namespace
    }

    /// Take ownership of the root.
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Move this tree into another namespace. The previous binding is discarded.
    pub fn retarget(&self, namespace: &TargetNamespace) -> RetargetedTree {
        NamespaceRetargeter::new(namespace.clone()).retarget_root(&self.root)
    }
}

/// Rewrites element names into a fixed namespace.
///
/// Local names, attributes (which stay namespace-less), text and child order
/// are preserved exactly. Each pass replaces the namespace outright, so
/// applying the same retargeter twice is the same as applying it once.
#[derive(Debug, Clone)]
pub struct NamespaceRetargeter {
    namespace: TargetNamespace,
}

impl NamespaceRetargeter {
    /// Retargeter for `namespace`.
    pub fn new(namespace: TargetNamespace) -> Self {
        Self { namespace }
    }

    /// Target namespace.
    pub fn namespace(&self) -> &TargetNamespace {
        &self.namespace
    }

    /// Retarget a parsed fragment, wrapper included.
    pub fn apply(&self, tree: &FragmentTree) -> RetargetedTree {
        self.retarget_root(tree.root())
    }

    fn retarget_root(&self, root: &Element) -> RetargetedTree {
        RetargetedTree {
            root: self.element(root),
            namespace: self.namespace.clone(),
        }
    }

    /// Retarget one element and its subtree.
    pub fn element(&self, element: &Element) -> Element {
        Element {
            name: QName::namespaced(self.namespace.as_str(), element.name.local_name.as_str()),
            attributes: element.attributes.clone(),
            children: element.children.iter().map(|child| self.node(child)).collect(),
        }
    }

    /// Retarget a node; text is copied verbatim.
    pub fn node(&self, node: &Node) -> Node {
        match node {
            Node::Element(el) => Node::Element(self.element(el)),
            Node::Text(text) => Node::Text(text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::parse_fragment;
    use crate::node::descendants;

    fn sample() -> FragmentTree {
        parse_fragment(
            r#"<span class="hljs-tag">&lt;<span class="hljs-name">a</span>&gt;</span>text<b xmlns="urn:old"/>"#,
        )
        .unwrap()
    }

    #[test]
    fn binds_every_element_including_wrapper() {
        let ns = TargetNamespace::parse("urn:example:custom").unwrap();
        let tree = NamespaceRetargeter::new(ns).apply(&sample());
        assert_eq!(tree.root().name.namespace_uri(), Some("urn:example:custom"));
        for node in descendants(&tree.root().children) {
            if let Node::Element(el) = node {
                assert_eq!(el.name.namespace_uri(), Some("urn:example:custom"));
            }
        }
    }

    #[test]
    fn preserves_shape_attributes_and_text() {
        let source = sample();
        let tree = NamespaceRetargeter::new(TargetNamespace::xhtml()).apply(&source);
        let before: Vec<&Node> = descendants(&source.root().children).collect();
        let after: Vec<&Node> = descendants(&tree.root().children).collect();
        assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after.iter()) {
            match (old, new) {
                (Node::Element(a), Node::Element(b)) => {
                    assert_eq!(a.name.local_name, b.name.local_name);
                    assert_eq!(a.attributes, b.attributes);
                    assert_eq!(a.children.len(), b.children.len());
                }
                (Node::Text(a), Node::Text(b)) => assert_eq!(a, b),
                _ => panic!("node kinds diverged"),
            }
        }
    }

    #[test]
    fn retargeting_is_idempotent() {
        let ns = TargetNamespace::parse("urn:a").unwrap();
        let once = NamespaceRetargeter::new(ns.clone()).apply(&sample());
        let twice = once.retarget(&ns);
        assert_eq!(once, twice);
    }

    #[test]
    fn last_namespace_wins() {
        let first = TargetNamespace::parse("urn:first").unwrap();
        let second = TargetNamespace::parse("urn:second").unwrap();
        let chained = NamespaceRetargeter::new(first).apply(&sample()).retarget(&second);
        let direct = NamespaceRetargeter::new(second).apply(&sample());
        assert_eq!(chained, direct);
    }

    #[test]
    fn accepts_absolute_uris() {
        for uri in [
            XHTML_NAMESPACE,
            "urn:example:custom",
            "tag:example.com,2024:x",
            "x-y.z+w:rest",
        ] {
            assert_eq!(TargetNamespace::parse(uri).unwrap().as_str(), uri);
        }
    }

    #[test]
    fn rejects_malformed_uris() {
        for uri in ["", "relative/path", ":nope", "1abc:x", "urn:", "urn:a b", "urn:<x>"] {
            let err = TargetNamespace::parse(uri).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument, "{uri}");
        }
    }
}
