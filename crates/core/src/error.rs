use thiserror::Error;

/// Position inside a wrapped markup fragment where parsing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOffset {
    /// Byte offset into the fragment as produced by the tokenizer (wrapper excluded).
    pub byte: usize,
}

impl std::fmt::Display for FragmentOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "byte {}", self.byte)
    }
}

/// Category of a [`HighlightError`], stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong number of arguments.
    Arity,
    /// An argument had an unusable value.
    InvalidArgument,
    /// The tokenizer engine never came up.
    EngineUnavailable,
    /// Tokenizer output did not parse once wrapped.
    MalformedFragment,
    /// The tokenizer failed on this particular input.
    Tokenizer,
}

impl ErrorKind {
    /// Short identifier used when errors cross into a host engine.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Arity => "ArityError",
            ErrorKind::InvalidArgument => "InvalidArgumentError",
            ErrorKind::EngineUnavailable => "EngineUnavailableError",
            ErrorKind::MalformedFragment => "MalformedFragmentError",
            ErrorKind::Tokenizer => "TokenizerError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur while highlighting a snippet.
#[derive(Debug, Error)]
pub enum HighlightError {
    /// Fewer (or more) positional arguments than the function accepts.
    #[error("{function} expects {min} to {max} arguments, got {given}")]
    Arity {
        /// Qualified function name as shown to callers.
        function: &'static str,
        /// Minimum accepted arity.
        min: usize,
        /// Maximum accepted arity.
        max: usize,
        /// Number of arguments supplied.
        given: usize,
    },
    /// An argument was present but unusable.
    #[error("invalid argument `{argument}`: {message}")]
    InvalidArgument {
        /// Parameter name.
        argument: &'static str,
        /// What was wrong with it.
        message: String,
    },
    /// The tokenizer engine failed to initialize; the component is disabled.
    #[error("highlighting engine unavailable: {reason}")]
    EngineUnavailable {
        /// Initialization failure recorded at construction time.
        reason: String,
    },
    /// Tokenizer output is not well-formed once wrapped in the synthetic root.
    #[error("malformed highlighted markup at {offset}: {message}")]
    MalformedFragment {
        /// Parser diagnostic.
        message: String,
        /// Where the parser gave up.
        offset: FragmentOffset,
    },
    /// The tokenizer rejected this input.
    #[error("tokenizer failed for language `{language}`: {message}")]
    Tokenizer {
        /// Requested language.
        language: String,
        /// Underlying grammar error.
        message: String,
    },
}

impl HighlightError {
    /// Create an invalid argument error.
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// Create a malformed fragment error at a byte offset of the fragment.
    pub fn malformed(message: impl Into<String>, byte: usize) -> Self {
        Self::MalformedFragment {
            message: message.into(),
            offset: FragmentOffset { byte },
        }
    }

    /// Create an engine unavailable error.
    pub fn engine_unavailable(reason: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a tokenizer error for a language.
    pub fn tokenizer(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tokenizer {
            language: language.into(),
            message: message.into(),
        }
    }

    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HighlightError::Arity { .. } => ErrorKind::Arity,
            HighlightError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            HighlightError::EngineUnavailable { .. } => ErrorKind::EngineUnavailable,
            HighlightError::MalformedFragment { .. } => ErrorKind::MalformedFragment,
            HighlightError::Tokenizer { .. } => ErrorKind::Tokenizer,
        }
    }
}
