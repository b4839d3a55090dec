//! Known exception names used for autocomplete.

use crate::matching::canonicalize;
use std::collections::HashSet;

/// Python's built-in exception hierarchy.
pub const BUILTIN_EXCEPTIONS: &[&str] = &[
    "BaseException",
    "SystemExit",
    "KeyboardInterrupt",
    "GeneratorExit",
    "Exception",
    "StopIteration",
    "StopAsyncIteration",
    "ArithmeticError",
    "FloatingPointError",
    "OverflowError",
    "ZeroDivisionError",
    "AssertionError",
    "AttributeError",
    "BufferError",
    "EOFError",
    "ImportError",
    "ModuleNotFoundError",
    "LookupError",
    "IndexError",
    "KeyError",
    "MemoryError",
    "NameError",
    "UnboundLocalError",
    "OSError",
    "BlockingIOError",
    "ChildProcessError",
    "ConnectionError",
    "BrokenPipeError",
    "ConnectionAbortedError",
    "ConnectionRefusedError",
    "ConnectionResetError",
    "FileExistsError",
    "FileNotFoundError",
    "InterruptedError",
    "IsADirectoryError",
    "NotADirectoryError",
    "PermissionError",
    "ProcessLookupError",
    "TimeoutError",
    "ReferenceError",
    "RuntimeError",
    "NotImplementedError",
    "RecursionError",
    "SyntaxError",
    "IndentationError",
    "TabError",
    "SystemError",
    "TypeError",
    "ValueError",
    "UnicodeError",
    "UnicodeDecodeError",
    "UnicodeEncodeError",
    "UnicodeTranslateError",
    "Warning",
    "DeprecationWarning",
    "PendingDeprecationWarning",
    "RuntimeWarning",
    "SyntaxWarning",
    "UserWarning",
    "FutureWarning",
    "ImportWarning",
    "UnicodeWarning",
    "BytesWarning",
    "ResourceWarning",
];

/// Sorted, deduplicated set of exception names.
///
/// Each entry is stored as first spelled; uniqueness is by canonical form.
#[derive(Debug, Clone, Default)]
pub struct ExceptionVocabulary {
    /// (canonical, display), sorted by display.
    entries: Vec<(String, String)>,
}

impl ExceptionVocabulary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::default();
        vocabulary.extend(names);
        vocabulary
    }

    /// Vocabulary seeded with [`BUILTIN_EXCEPTIONS`].
    pub fn builtin() -> Self {
        Self::new(BUILTIN_EXCEPTIONS)
    }

    /// Add names, skipping blanks and names already present.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.entries.iter().map(|(c, _)| c.clone()).collect();
        for name in names {
            let display = name.as_ref().trim();
            if display.is_empty() {
                continue;
            }
            let canonical = canonicalize(display);
            if seen.insert(canonical.clone()) {
                self.entries.push((canonical, display.to_string()));
            }
        }
        self.entries.sort_by(|a, b| a.1.cmp(&b.1));
    }

    pub fn contains(&self, name: &str) -> bool {
        let canonical = canonicalize(name);
        self.entries.iter().any(|(c, _)| *c == canonical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(canonical, display)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, d)| (c.as_str(), d.as_str()))
    }

    /// Display names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, d)| d.as_str())
    }
}
