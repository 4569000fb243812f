use thiserror::Error;

/// Errors returned by [`crate::Dci`]'s public API.
///
/// Contract violations (`InvalidConfig`, `DimensionMismatch`, `NotPopulated`,
/// `InvalidBudget`) are reported before any mutation occurs. `InvalidState`
/// is reported after a data pathology (non-finite input, zero-norm
/// direction) is detected during `add`; the instance is rolled back to
/// empty in that case.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DciError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index has not been populated with add()")]
    NotPopulated,

    #[error("invalid budget parameter: {0}")]
    InvalidBudget(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, DciError>;
