// Fatal conditions raised while finalizing a table (spec.md §7). Everything
// else (redeclarations, unused-symbol notices, POSIX warnings) flows through
// the `DiagnosticSink` as non-fatal complaints/warnings instead of this type.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeError {
    TooManySymbols { limit: u32 },
    StartSymbolUndefined,
    StartSymbolIsToken,
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FinalizeError::TooManySymbols { limit } => {
                write!(f, "too many symbols (maximum {})", limit)
            }
            FinalizeError::StartSymbolUndefined => write!(f, "start symbol is undefined"),
            FinalizeError::StartSymbolIsToken => write!(f, "start symbol is a token"),
        }
    }
}

impl std::error::Error for FinalizeError {}
