//! In-memory node tree shared by the parser, retargeter and extractor.

/// Namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, or `None` for an element in no namespace.
    pub namespace: Option<String>,
    /// Local part of the name.
    pub local_name: String,
}

impl QName {
    /// A name in no namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// A name bound to `namespace`.
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Namespace URI as a string slice.
    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "Q{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Attribute as written in the markup. Attributes never carry a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name (e.g. `class`).
    pub name: String,
    /// Entity-decoded value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element node with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified element name.
    pub name: QName,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// An empty element.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for node in descendants(&self.children) {
            if let Node::Text(t) = node {
                text.push_str(t);
            }
        }
        text
    }

    /// Append text, merging with a trailing text child so no two text nodes are adjacent.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(text),
            _ => self.children.push(Node::Text(text.to_string())),
        }
    }
}

/// A node of a highlighted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element node.
    Element(Element),
    /// Text node (entity-decoded).
    Text(String),
}

impl Node {
    /// Borrow as an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Borrow as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Element(_) => None,
            Node::Text(text) => Some(text),
        }
    }

    /// Text content of this node.
    pub fn string_value(&self) -> String {
        match self {
            Node::Element(el) => el.text_content(),
            Node::Text(text) => text.clone(),
        }
    }
}

/// Depth-first, pre-order iterator over a node list and all descendants.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

/// Walk `nodes` and their descendants in document order.
pub fn descendants(nodes: &[Node]) -> Descendants<'_> {
    Descendants {
        stack: vec![nodes.iter()],
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(node) => {
                    if let Node::Element(el) = node {
                        self.stack.push(el.children.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Serialize a node sequence as XML.
///
/// `in_scope` is the default namespace already declared by the surrounding
/// document; elements in that namespace are written without an `xmlns` attribute.
pub fn to_markup(nodes: &[Node], in_scope: Option<&str>) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, in_scope);
    }
    out
}

fn write_node(out: &mut String, node: &Node, in_scope: Option<&str>) {
    match node {
        Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
        Node::Element(el) => write_element(out, el, in_scope),
    }
}

fn write_element(out: &mut String, el: &Element, in_scope: Option<&str>) {
    let own = el.name.namespace_uri();
    out.push('<');
    out.push_str(&el.name.local_name);
    if own != in_scope {
        out.push_str(" xmlns=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(
            own.unwrap_or_default(),
        ));
        out.push('"');
    }
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_node(out, child, own);
    }
    out.push_str("</");
    out.push_str(&el.name.local_name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(class: &str, children: Vec<Node>) -> Node {
        Node::Element(Element {
            name: QName::local("span"),
            attributes: vec![Attribute::new("class", class)],
            children,
        })
    }

    #[test]
    fn descendants_follow_document_order() {
        let nodes = vec![
            span("a", vec![Node::Text("1".into()), span("b", vec![Node::Text("2".into())])]),
            Node::Text("3".into()),
        ];
        let order: Vec<String> = descendants(&nodes)
            .map(|n| match n {
                Node::Element(el) => el.attribute("class").unwrap_or("").to_string(),
                Node::Text(t) => t.clone(),
            })
            .collect();
        assert_eq!(order, vec!["a", "1", "b", "2", "3"]);
    }

    #[test]
    fn push_text_merges_adjacent_runs() {
        let mut el = Element::new(QName::local("wrapper"));
        el.push_text("a");
        el.push_text("");
        el.push_text("b");
        assert_eq!(el.children, vec![Node::Text("ab".into())]);
    }

    #[test]
    fn markup_declares_namespace_only_when_it_changes() {
        let nodes = vec![Node::Element(Element {
            name: QName::namespaced("urn:x", "span"),
            attributes: vec![Attribute::new("class", "k\"q")],
            children: vec![
                Node::Text("a<b".into()),
                Node::Element(Element::new(QName::namespaced("urn:x", "br"))),
            ],
        })];
        assert_eq!(
            to_markup(&nodes, None),
            r#"<span xmlns="urn:x" class="k&quot;q">a&lt;b<br/></span>"#
        );
        assert_eq!(
            to_markup(&nodes, Some("urn:x")),
            r#"<span class="k&quot;q">a&lt;b<br/></span>"#
        );
    }

    #[test]
    fn qname_display_uses_clark_notation() {
        assert_eq!(QName::namespaced("urn:x", "span").to_string(), "Q{urn:x}span");
        assert_eq!(QName::local("span").to_string(), "span");
    }
}
