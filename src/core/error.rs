//! Error types for the renderer

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// A grammar symbol has a rule entry but no productions to pick from.
    /// Fatal at generation time; the previous geometry is kept.
    #[error("malformed grammar: symbol '{0}' has no productions")]
    MalformedGrammar(char),

    /// A `]` was interpreted with an empty turtle stack. Indicates a broken
    /// grammar or interpreter bug; generation aborts.
    #[error("unbalanced bracket stack: pop at symbol index {0} with empty stack")]
    UnbalancedBrackets(usize),

    /// GPU-side validation error, surfaced once per frame. Non-fatal.
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("window error: {0}")]
    Window(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
