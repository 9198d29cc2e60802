use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Arc;
use xhl_core::{
    EngineOptions, GrammarSource, HighlightEngine, HighlightFunction, Node, ResultSequence,
    XHTML_NAMESPACE, descendants,
};

static ENGINE: Lazy<Arc<HighlightEngine>> =
    Lazy::new(|| Arc::new(HighlightEngine::initialize(&EngineOptions::default())));

fn function() -> HighlightFunction {
    HighlightFunction::new(Arc::clone(&ENGINE))
}

fn text_of(seq: &ResultSequence) -> String {
    seq.nodes().iter().map(Node::string_value).collect()
}

const SNIPPETS: &[(&str, &str)] = &[
    ("xml", "<test>value</test>"),
    (
        "java",
        "public class Test {\n\tpublic static void main(String[] args) {\n\t\tSystem.out.println(\"Hello World!\");\n\t}\n}",
    ),
    ("rust", "fn main() {\n    let x = 1 << 3 & 7;\n    println!(\"{x} <&>\");\n}\n"),
    ("python", "def f(a, b):\n    # compare\n    return a < b and b > 0\n"),
    ("js", "const s = '<b>' + \"&amp;\"; // tricky\n"),
    ("no-such-language", "plain & simple <text>"),
];

#[test]
fn bundled_engine_is_available() {
    assert!(ENGINE.is_available(), "{:?}", ENGINE.unavailable_reason());
}

#[test]
fn text_content_reproduces_the_source() {
    for (language, code) in SNIPPETS {
        let seq = function()
            .invoke(&[json!(language), json!(code)])
            .unwrap_or_else(|err| panic!("{language}: {err}"));
        assert_eq!(&text_of(&seq), code, "{language}");
    }
}

#[test]
fn every_element_is_an_xhtml_span_with_a_class() {
    for (language, code) in SNIPPETS {
        let seq = function().invoke(&[json!(language), json!(code)]).unwrap();
        for node in descendants(seq.nodes()) {
            if let Node::Element(el) = node {
                assert_eq!(el.name.namespace_uri(), Some(XHTML_NAMESPACE), "{language}");
                assert_eq!(el.name.local_name, "span");
                let class = el.attribute("class").unwrap();
                assert!(class.starts_with("hljs-"), "{language}: {class}");
                assert!(!el.children.is_empty(), "{language}: empty span");
            }
        }
    }
}

#[test]
fn markup_languages_produce_elements() {
    let seq = function()
        .invoke(&[json!("xml"), json!("<test>value</test>")])
        .unwrap();
    assert!(seq.nodes().iter().any(|n| n.as_element().is_some()));
    assert!(
        seq.nodes()
            .iter()
            .filter_map(Node::as_text)
            .any(|t| t.contains("value"))
    );
}

#[test]
fn code_starting_with_a_keyword_starts_with_an_element() {
    let seq = function()
        .invoke(&[json!("java"), json!("public class Test {}")])
        .unwrap();
    let first = seq.nodes()[0].as_element().expect("first node is an element");
    assert_eq!(first.name.local_name, "span");
    assert_eq!(first.text_content(), "public");
}

#[test]
fn custom_namespace_applies_to_real_output() {
    let (language, code) = SNIPPETS[2];
    let default = function().invoke(&[json!(language), json!(code)]).unwrap();
    let custom = function()
        .invoke(&[json!(language), json!(code), json!({"result-ns": "urn:example:custom"})])
        .unwrap();
    assert_eq!(default.len(), custom.len());
    assert_eq!(text_of(&default), text_of(&custom));
    for node in descendants(custom.nodes()) {
        if let Node::Element(el) = node {
            assert_eq!(el.name.namespace_uri(), Some("urn:example:custom"));
        }
    }
}

#[test]
fn custom_class_prefix_is_used() {
    let engine = HighlightEngine::initialize(&EngineOptions {
        grammars: GrammarSource::Bundled,
        class_prefix: "tok-".to_string(),
    });
    let seq = HighlightFunction::new(Arc::new(engine))
        .invoke(&[json!("python"), json!("# note\n")])
        .unwrap();
    let classes: Vec<&str> = descendants(seq.nodes())
        .filter_map(Node::as_element)
        .filter_map(|el| el.attribute("class"))
        .collect();
    assert!(!classes.is_empty());
    assert!(classes.iter().all(|c| c.starts_with("tok-")), "{classes:?}");
}

#[test]
fn concurrent_invocations_agree() {
    let expected: Vec<ResultSequence> = SNIPPETS
        .iter()
        .map(|(l, c)| function().invoke(&[json!(l), json!(c)]).unwrap())
        .collect();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let expected = Arc::clone(&expected);
            std::thread::spawn(move || {
                for (i, (l, c)) in SNIPPETS.iter().enumerate() {
                    let seq = function().invoke(&[json!(l), json!(c)]).unwrap();
                    assert_eq!(seq, expected[i]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
