//! Parses tokenizer markup into a node tree under a synthetic root.
//!
//! Highlighter output is a run of sibling elements and text, which is not a
//! document on its own. Wrapping it in a single artificial element makes it
//! parseable by an ordinary XML reader.

use crate::HighlightError;
use crate::node::{Attribute, Element, Node, QName};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

/// Local name of the synthetic root element.
pub const WRAPPER: &str = "wrapper";

/// Parsed fragment: exactly one synthetic root owning the highlighted nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTree {
    root: Element,
}

impl FragmentTree {
    /// Build a tree from an already constructed root.
    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    /// The synthetic root.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Take ownership of the root.
    pub fn into_root(self) -> Element {
        self.root
    }
}

/// Wrap `markup` in the synthetic root and parse it.
///
/// Text is entity-decoded, CDATA becomes text, comments and processing
/// instructions are dropped, and adjacent text runs are merged.
pub fn parse_fragment(markup: &str) -> Result<FragmentTree, HighlightError> {
    let wrapped = format!("<{WRAPPER}>{markup}</{WRAPPER}>");
    let prefix = WRAPPER.len() + 2;
    let mut reader = NsReader::from_str(&wrapped);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let at = fragment_offset(reader.buffer_position(), prefix);
        let event = reader.read_event().map_err(|err| {
            HighlightError::malformed(
                err.to_string(),
                fragment_offset(reader.error_position(), prefix),
            )
        })?;

        match event {
            Event::Start(start) => {
                ensure_inside_document(&root, at)?;
                open.push(open_element(&reader, &start, at)?);
            }
            Event::Empty(start) => {
                ensure_inside_document(&root, at)?;
                let element = open_element(&reader, &start, at)?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let Some(element) = open.pop() else {
                    return Err(HighlightError::malformed("unmatched end tag", at));
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let decoded = text
                    .unescape()
                    .map_err(|err| HighlightError::malformed(err.to_string(), at))?;
                append_text(&mut open, &decoded, at)?;
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                let decoded = std::str::from_utf8(&raw)
                    .map_err(|err| HighlightError::malformed(err.to_string(), at))?;
                append_text(&mut open, decoded, at)?;
            }
            Event::Comment(_) | Event::PI(_) => {}
            Event::Decl(_) => {
                return Err(HighlightError::malformed(
                    "XML declaration inside element content",
                    at,
                ));
            }
            Event::DocType(_) => {
                return Err(HighlightError::malformed(
                    "document type declaration inside element content",
                    at,
                ));
            }
            Event::Eof => break,
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(HighlightError::malformed(
            format!("element `{}` is never closed", unclosed.name.local_name),
            markup.len(),
        ));
    }

    root.map(FragmentTree::from_root)
        .ok_or_else(|| HighlightError::malformed("missing root element", 0))
}

fn fragment_offset<P>(position: P, prefix: usize) -> usize
where
    usize: TryFrom<P>,
{
    usize::try_from(position)
        .unwrap_or(usize::MAX)
        .saturating_sub(prefix)
}

fn ensure_inside_document(root: &Option<Element>, at: usize) -> Result<(), HighlightError> {
    if root.is_some() {
        return Err(HighlightError::malformed(
            "content after the end of the fragment",
            at,
        ));
    }
    Ok(())
}

fn append_text(open: &mut [Element], text: &str, at: usize) -> Result<(), HighlightError> {
    match open.last_mut() {
        Some(parent) => {
            parent.push_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(HighlightError::malformed(
            "text outside of the fragment",
            at,
        )),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    at: usize,
) -> Result<Element, HighlightError> {
    let (resolved, local) = reader.resolve_element(start.name());
    let namespace = match resolved {
        ResolveResult::Bound(ns) => Some(utf8(ns.as_ref(), at)?.to_string()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(HighlightError::malformed(
                format!(
                    "undeclared namespace prefix `{}`",
                    String::from_utf8_lossy(&prefix)
                ),
                at,
            ));
        }
    };
    let local_name = utf8(local.as_ref(), at)?.to_string();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| HighlightError::malformed(err.to_string(), at))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = utf8(attr.key.as_ref(), at)?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| HighlightError::malformed(err.to_string(), at))?;
        attributes.push(Attribute::new(name, value));
    }

    Ok(Element {
        name: QName {
            namespace,
            local_name,
        },
        attributes,
        children: Vec::new(),
    })
}

fn utf8(bytes: &[u8], at: usize) -> Result<&str, HighlightError> {
    std::str::from_utf8(bytes).map_err(|err| HighlightError::malformed(err.to_string(), at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn wraps_multiple_top_level_runs() {
        let tree = parse_fragment(r#"<span class="k">def</span> main"#).unwrap();
        let root = tree.root();
        assert_eq!(root.name, QName::local(WRAPPER));
        assert_eq!(root.children.len(), 2);
        let span = root.children[0].as_element().unwrap();
        assert_eq!(span.name, QName::local("span"));
        assert_eq!(span.attribute("class"), Some("k"));
        assert_eq!(root.children[1], Node::Text(" main".into()));
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let tree = parse_fragment(r#"&lt;a&gt; &amp;&#65;<span title="&quot;x&quot;"/>"#).unwrap();
        let root = tree.root();
        assert_eq!(root.children[0], Node::Text("<a> &A".into()));
        let span = root.children[1].as_element().unwrap();
        assert_eq!(span.attribute("title"), Some("\"x\""));
    }

    #[test]
    fn empty_markup_gives_childless_root() {
        let tree = parse_fragment("").unwrap();
        assert!(tree.root().children.is_empty());
    }

    #[test]
    fn cdata_merges_with_neighbouring_text() {
        let tree = parse_fragment("a<![CDATA[<b>]]>c<!-- gone -->d").unwrap();
        assert_eq!(tree.root().children, vec![Node::Text("a<b>cd".into())]);
    }

    #[test]
    fn honours_declared_namespaces() {
        let tree =
            parse_fragment(r#"<h:span xmlns:h="urn:h">x</h:span><span xmlns="urn:d"/>"#).unwrap();
        let children = &tree.root().children;
        let first = children[0].as_element().unwrap();
        assert_eq!(first.name, QName::namespaced("urn:h", "span"));
        assert!(first.attributes.is_empty());
        let second = children[1].as_element().unwrap();
        assert_eq!(second.name, QName::namespaced("urn:d", "span"));
    }

    #[test]
    fn rejects_unclosed_element() {
        let err = parse_fragment("<span>oops").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFragment);
    }

    #[test]
    fn rejects_mismatched_end_tag() {
        let err = parse_fragment("<span>oops</div>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFragment);
    }

    #[test]
    fn rejects_markup_that_closes_the_wrapper_early() {
        let err = parse_fragment("a</wrapper><span/>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFragment);
    }

    #[test]
    fn rejects_unknown_entities_and_prefixes() {
        assert_eq!(
            parse_fragment("&nbsp;").unwrap_err().kind(),
            ErrorKind::MalformedFragment
        );
        assert_eq!(
            parse_fragment("<x:span/>").unwrap_err().kind(),
            ErrorKind::MalformedFragment
        );
    }

    #[test]
    fn rejects_declarations_inside_fragment() {
        for markup in ["a<?xml version='1.0'?>b", "a<!DOCTYPE html>b"] {
            let err = parse_fragment(markup).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedFragment, "{markup}");
        }
    }

    #[test]
    fn keeps_dropping_comments_and_processing_instructions() {
        let tree = parse_fragment("a<?php echo ?>b<!-- c -->d").unwrap();
        assert_eq!(tree.root().children, vec![Node::Text("abd".into())]);
    }

    #[test]
    fn rejects_bare_ampersand() {
        let err = parse_fragment("a & b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFragment);
    }
}
