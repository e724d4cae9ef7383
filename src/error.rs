use thiserror::Error;

/// Errors produced by the alignment core.
///
/// The core owns no I/O, so nothing here is retryable from the inside;
/// callers decide whether to drop the search or re-run it with different
/// parameters. Per-row bound overflow during reorientation is deliberately
/// *not* an error: the bounds are bridged and a warning flag is surfaced in
/// the search outcome instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid search shape: {0}")]
    InvalidShape(String),

    #[error("edgebound invariant violated: {0}")]
    InvariantViolation(String),

    #[error("failed to allocate {bytes} bytes of scratch")]
    AllocFailure { bytes: usize },

    #[error("search cancelled")]
    Cancelled,
}
