//! Error types for protogen pipelines
//!
//! Only setup-time configuration errors and IR invariant violations are
//! errors. Problems with individual fields or types are reported through a
//! [`DiagnosticSink`](crate::DiagnosticSink) and never abort a run.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Hard failures of a pipeline run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A type mapping entry cannot be used
    #[error("invalid mapping for {key:?}: {reason}")]
    InvalidMapping { key: String, reason: String },

    /// Two declarations of the same kind share a name in one package
    #[error("duplicate {kind} {name:?}")]
    DuplicateName { kind: &'static str, name: String },

    /// The package import path has no letters or digits left after sanitizing
    #[error("import path {0:?} does not yield a package name")]
    InvalidPackagePath(String),
}

impl CoreError {
    /// Whether the error comes from configuration rather than from the IR
    pub fn is_config_error(&self) -> bool {
        matches!(self, CoreError::InvalidMapping { .. })
    }
}
