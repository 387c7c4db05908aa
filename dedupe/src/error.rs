//! Error taxonomy for the engine: malformed input, invalid configuration,
//! and resource exhaustion each get their own variant so a caller can tell
//! a bad job from a broken machine. A `thiserror`-derived enum, each
//! variant carrying enough context for a single-line diagnostic.

/// Errors the engine can report. Every run either succeeds or aborts with
/// exactly one of these; there is no partial output and no retry.
#[derive(Debug, thiserror::Error)]
pub enum DedupeError {
    /// The input document was malformed: wrong JSON shape, a missing
    /// required key, or an item reference out of range.
    #[error("bad input: {0}")]
    Input(String),

    /// A configuration value was invalid (not silently clampable), e.g. a
    /// `kick_size` or `local_size` that isn't a power of two.
    #[error("bad configuration: {0}")]
    Config(String),

    /// Allocation, scoring-buffer, or other host-resource failure.
    #[error("resource exhausted: {0}")]
    Resource(String),

    /// The input or output file could not be opened.
    #[error("I/O error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, DedupeError>;
