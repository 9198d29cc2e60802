//! Tokenizer adapters that turn source code into highlighted markup.
//!
//! The pipeline only needs `highlight(language, code) -> markup`. The markup
//! must consist of elements and text with special characters escaped, so it
//! parses once wrapped in a single root element.

use crate::HighlightError;
use std::path::{Path, PathBuf};
use syntect::parsing::{
    ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet, SyntaxSetBuilder,
};
use syntect::util::LinesWithEndings;
use thiserror::Error;

/// Class prefix used by highlight.js themes.
pub const HLJS_CLASS_PREFIX: &str = "hljs-";

/// Produces highlighted markup for a snippet.
///
/// Takes `&mut self` so an engine that is not safe to share can only be
/// reached through exclusive access.
pub trait Tokenizer: Send {
    /// Highlight `code` written in `language`.
    fn highlight(&mut self, language: &str, code: &str) -> Result<String, HighlightError>;
}

impl<F> Tokenizer for F
where
    F: FnMut(&str, &str) -> Result<String, HighlightError> + Send,
{
    fn highlight(&mut self, language: &str, code: &str) -> Result<String, HighlightError> {
        (self)(language, code)
    }
}

/// Where grammar definitions are loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GrammarSource {
    /// Grammars compiled into syntect.
    #[default]
    Bundled,
    /// A directory of `.sublime-syntax` files.
    Directory(PathBuf),
    /// A binary syntax set dump written by `syntect::dumps`.
    Dump(PathBuf),
}

/// Reasons a grammar set could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Grammar directory missing or unreadable, or a grammar failed to compile.
    #[error("failed to load grammars from {}: {source}", path.display())]
    Grammars {
        /// Directory that was scanned.
        path: PathBuf,
        /// Underlying syntect error.
        #[source]
        source: syntect::LoadingError,
    },
    /// Dump file missing or corrupt.
    #[error("failed to read syntax dump {}: {message}", path.display())]
    Dump {
        /// Dump file path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
    /// Directory held no grammar files.
    #[error("no grammars found in {}", .0.display())]
    Empty(PathBuf),
    /// The set lacks the plain text fallback syntax.
    #[error("grammar set has no plain text syntax")]
    NoPlainText,
    /// A built-in scope selector did not parse.
    #[error("invalid scope selector `{selector}`: {message}")]
    Scope {
        /// Selector text.
        selector: &'static str,
        /// Parser message.
        message: String,
    },
}

impl GrammarSource {
    /// Load the syntax set this source describes.
    pub fn load(&self) -> Result<SyntaxSet, LoadError> {
        match self {
            GrammarSource::Bundled => Ok(SyntaxSet::load_defaults_newlines()),
            GrammarSource::Directory(path) => load_directory(path),
            GrammarSource::Dump(path) => syntect::dumps::from_dump_file(path).map_err(|err| {
                LoadError::Dump {
                    path: path.clone(),
                    message: err.to_string(),
                }
            }),
        }
    }
}

fn load_directory(path: &Path) -> Result<SyntaxSet, LoadError> {
    let mut builder = SyntaxSetBuilder::new();
    builder.add_plain_text_syntax();
    builder
        .add_from_folder(path, true)
        .map_err(|source| LoadError::Grammars {
            path: path.to_path_buf(),
            source,
        })?;
    let set = builder.build();
    if set.syntaxes().len() <= 1 {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(set)
}

/// Grammar scope prefixes and the highlight category they map to.
/// Earlier entries win over later ones for the same scope.
const SCOPE_CATEGORIES: &[(&str, &str)] = &[
    ("comment", "comment"),
    ("string.regexp", "regexp"),
    ("string", "string"),
    ("constant.numeric", "number"),
    ("constant.character.escape", "char"),
    ("constant.language", "literal"),
    ("constant.other.placeholder", "subst"),
    ("constant", "symbol"),
    ("keyword.operator", "operator"),
    ("keyword", "keyword"),
    ("storage.type", "type"),
    ("storage", "keyword"),
    ("support.function", "built_in"),
    ("support.type", "type"),
    ("support.class", "type"),
    ("entity.name.tag", "name"),
    ("entity.other.attribute-name", "attr"),
    ("entity.other.inherited-class", "title"),
    ("entity.name", "title"),
    ("meta.tag", "tag"),
    ("meta.annotation", "meta"),
    ("meta.preprocessor", "meta"),
    ("variable.parameter", "params"),
    ("variable.language", "variable"),
    ("markup.heading", "section"),
    ("markup.bold", "strong"),
    ("markup.italic", "emphasis"),
    ("markup.inserted", "addition"),
    ("markup.deleted", "deletion"),
    ("markup.underline.link", "link"),
    ("markup.quote", "quote"),
    ("markup.raw", "code"),
];

/// Common highlighter language names that syntect knows under another token.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("bash", "Bourne Again Shell (bash)"),
    ("c++", "C++"),
    ("cs", "C#"),
    ("csharp", "C#"),
    ("golang", "Go"),
    ("javascript", "JavaScript"),
    ("js", "JavaScript"),
    ("objc", "Objective-C"),
    ("objectivec", "Objective-C"),
    ("plaintext", "Plain Text"),
    ("shell", "Bourne Again Shell (bash)"),
    ("tex", "LaTeX"),
    ("text", "Plain Text"),
    ("xhtml", "HTML"),
];

const PLAIN_TEXT: &str = "Plain Text";

/// Tokenizer backed by syntect grammars, emitting highlight.js style spans.
///
/// Scopes are mapped to categories through a fixed table and emitted as nested
/// `<span class="PREFIX+category">` elements. Text between spans is escaped.
pub struct SyntectTokenizer {
    syntaxes: SyntaxSet,
    categories: Vec<(Scope, &'static str)>,
    class_prefix: String,
}

impl std::fmt::Debug for SyntectTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectTokenizer")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .field("class_prefix", &self.class_prefix)
            .finish()
    }
}

impl SyntectTokenizer {
    /// Load grammars from `source`.
    pub fn load(source: &GrammarSource, class_prefix: &str) -> Result<Self, LoadError> {
        Self::from_syntax_set(source.load()?, class_prefix)
    }

    /// Wrap an already loaded syntax set.
    pub fn from_syntax_set(syntaxes: SyntaxSet, class_prefix: &str) -> Result<Self, LoadError> {
        if syntaxes.find_syntax_by_name(PLAIN_TEXT).is_none() {
            return Err(LoadError::NoPlainText);
        }
        let categories = SCOPE_CATEGORIES
            .iter()
            .map(|&(selector, category)| {
                Scope::new(selector)
                    .map(|scope| (scope, category))
                    .map_err(|err| LoadError::Scope {
                        selector,
                        message: format!("{err:?}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            syntaxes,
            categories,
            class_prefix: class_prefix.to_string(),
        })
    }

    /// Loaded syntax set.
    pub fn syntax_set(&self) -> &SyntaxSet {
        &self.syntaxes
    }

    /// Find the grammar for `language`, falling back to plain text.
    pub fn resolve_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        let lowered = language.to_ascii_lowercase();
        let token = LANGUAGE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, token)| *token)
            .unwrap_or(language);

        self.syntaxes
            .find_syntax_by_token(token)
            .or_else(|| self.syntaxes.find_syntax_by_name(token))
            .or_else(|| {
                log::warn!("no grammar for language `{language}`, highlighting as plain text");
                self.syntaxes.find_syntax_by_name(PLAIN_TEXT)
            })
    }

    fn categories_for(&self, stack: &ScopeStack) -> Vec<&'static str> {
        let mut categories: Vec<&'static str> = Vec::new();
        for scope in stack.as_slice() {
            let category = self
                .categories
                .iter()
                .find(|(prefix, _)| prefix.is_prefix_of(*scope))
                .map(|(_, category)| *category);
            if let Some(category) = category
                && categories.last() != Some(&category)
            {
                categories.push(category);
            }
        }
        categories
    }

    fn render(
        &self,
        syntax: &SyntaxReference,
        language: &str,
        code: &str,
    ) -> Result<String, HighlightError> {
        let grammar_error = |message: String| HighlightError::tokenizer(language, message);

        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut writer = SpanWriter::new(&self.class_prefix, code.len());

        for line in LinesWithEndings::from(code) {
            let ops = state
                .parse_line(line, &self.syntaxes)
                .map_err(|err| grammar_error(err.to_string()))?;
            let mut cursor = 0;
            for (position, op) in ops {
                if position > cursor {
                    writer.text(&self.categories_for(&stack), &line[cursor..position]);
                    cursor = position;
                }
                stack
                    .apply(&op)
                    .map_err(|err| grammar_error(format!("{err:?}")))?;
            }
            if cursor < line.len() {
                writer.text(&self.categories_for(&stack), &line[cursor..]);
            }
        }

        Ok(writer.finish())
    }
}

impl Tokenizer for SyntectTokenizer {
    fn highlight(&mut self, language: &str, code: &str) -> Result<String, HighlightError> {
        let syntax = self.resolve_syntax(language).ok_or_else(|| {
            HighlightError::tokenizer(language, "no grammar and no plain text fallback")
        })?;
        log::trace!("highlighting {} bytes as {}", code.len(), syntax.name);
        self.render(syntax, language, code)
    }
}

/// Emits nested spans, opening them lazily so no span is ever empty.
struct SpanWriter<'p> {
    prefix: &'p str,
    open: Vec<&'static str>,
    out: String,
}

impl<'p> SpanWriter<'p> {
    fn new(prefix: &'p str, capacity: usize) -> Self {
        Self {
            prefix,
            open: Vec::new(),
            out: String::with_capacity(capacity * 2),
        }
    }

    fn text(&mut self, categories: &[&'static str], text: &str) {
        let common = self
            .open
            .iter()
            .zip(categories)
            .take_while(|(open, wanted)| open == wanted)
            .count();
        while self.open.len() > common {
            self.open.pop();
            self.out.push_str("</span>");
        }
        for category in &categories[common..] {
            self.out.push_str("<span class=\"");
            self.out
                .push_str(&html_escape::encode_double_quoted_attribute(self.prefix));
            self.out.push_str(category);
            self.out.push_str("\">");
            self.open.push(*category);
        }
        self.out.push_str(&html_escape::encode_text(text));
    }

    fn finish(mut self) -> String {
        for _ in self.open.drain(..) {
            self.out.push_str("</span>");
        }
        self.out
    }
}
