//! Lifecycle of the shared tokenizer engine.

use crate::HighlightError;
use crate::tokenizer::{GrammarSource, HLJS_CLASS_PREFIX, SyntectTokenizer, Tokenizer};
use std::sync::{Mutex, PoisonError};

/// Options for building the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Where grammars come from.
    pub grammars: GrammarSource,
    /// Prefix prepended to every highlight category in `class` attributes.
    pub class_prefix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            grammars: GrammarSource::Bundled,
            class_prefix: HLJS_CLASS_PREFIX.to_string(),
        }
    }
}

enum EngineState {
    Ready(Mutex<Box<dyn Tokenizer>>),
    Disabled { reason: String },
}

/// Owns the one tokenizer instance every call goes through.
///
/// Built once, shared (typically behind an `Arc`) by all callers, dropped at
/// shutdown. Calls into the tokenizer are serialized by a mutex; parsing and
/// retargeting happen outside the lock on call-local data.
///
/// A failed initialization does not panic or return an error: the engine
/// comes up disabled, remembers why, and every call reports
/// [`HighlightError::EngineUnavailable`]. Initialization is never retried.
pub struct HighlightEngine {
    state: EngineState,
}

impl std::fmt::Debug for HighlightEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            EngineState::Ready(_) => f.write_str("HighlightEngine(ready)"),
            EngineState::Disabled { reason } => write!(f, "HighlightEngine(disabled: {reason})"),
        }
    }
}

impl HighlightEngine {
    /// Load the syntect tokenizer described by `options`.
    pub fn initialize(options: &EngineOptions) -> Self {
        match SyntectTokenizer::load(&options.grammars, &options.class_prefix) {
            Ok(tokenizer) => {
                log::debug!(
                    "highlight engine ready with {} grammars",
                    tokenizer.syntax_set().syntaxes().len()
                );
                Self::with_tokenizer(tokenizer)
            }
            Err(err) => {
                log::error!("highlight engine disabled: {err}");
                Self::disabled(err.to_string())
            }
        }
    }

    /// Wrap an existing tokenizer.
    pub fn with_tokenizer<T>(tokenizer: T) -> Self
    where
        T: Tokenizer + 'static,
    {
        Self {
            state: EngineState::Ready(Mutex::new(Box::new(tokenizer))),
        }
    }

    /// An engine whose initialization failed.
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            state: EngineState::Disabled {
                reason: reason.into(),
            },
        }
    }

    /// Whether calls can succeed.
    pub fn is_available(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Why the engine is disabled, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            EngineState::Ready(_) => None,
            EngineState::Disabled { reason } => Some(reason),
        }
    }

    /// Run the tokenizer under the engine lock.
    pub fn highlight(&self, language: &str, code: &str) -> Result<String, HighlightError> {
        match &self.state {
            EngineState::Disabled { reason } => Err(HighlightError::engine_unavailable(reason)),
            EngineState::Ready(tokenizer) => {
                // Tokenizers keep no state between calls, so a poisoned lock is reusable.
                let mut tokenizer = tokenizer.lock().unwrap_or_else(PoisonError::into_inner);
                tokenizer.highlight(language, code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn disabled_engine_rejects_every_call() {
        let engine = HighlightEngine::disabled("script missing");
        assert!(!engine.is_available());
        assert_eq!(engine.unavailable_reason(), Some("script missing"));
        for _ in 0..2 {
            let err = engine.highlight("xml", "<a/>").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::EngineUnavailable);
        }
    }

    #[test]
    fn failed_load_disables_instead_of_panicking() {
        let options = EngineOptions {
            grammars: GrammarSource::Directory(PathBuf::from("/missing/grammars")),
            ..EngineOptions::default()
        };
        let engine = HighlightEngine::initialize(&options);
        assert!(!engine.is_available());
        assert!(engine.unavailable_reason().unwrap().contains("/missing/grammars"));
    }

    #[test]
    fn tokenizer_panic_does_not_disable_the_engine() {
        let engine = HighlightEngine::with_tokenizer(
            |language: &str, code: &str| -> Result<String, HighlightError> {
                if language == "boom" {
                    panic!("grammar crashed");
                }
                Ok(code.to_string())
            },
        );
        let crashed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.highlight("boom", "x")
        }));
        assert!(crashed.is_err());

        assert!(engine.is_available());
        assert_eq!(engine.highlight("xml", "ok").unwrap(), "ok");
    }

    #[test]
    fn concurrent_calls_never_overlap_inside_the_tokenizer() {
        let busy = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&busy);
        let engine = Arc::new(HighlightEngine::with_tokenizer(
            move |_: &str, code: &str| -> Result<String, HighlightError> {
                assert!(!flag.swap(true, Ordering::SeqCst), "tokenizer re-entered");
                std::thread::yield_now();
                flag.store(false, Ordering::SeqCst);
                Ok(code.to_string())
            },
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let code = format!("{i}-{j}");
                        assert_eq!(engine.highlight("text", &code).unwrap(), code);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(!busy.load(Ordering::SeqCst));
    }
}
