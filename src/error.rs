//! Error types with actionable diagnostics.
//!
//! Every failure of a session surfaces synchronously as one of these
//! variants. Nothing in this crate retries internally.

use thiserror::Error;

/// Result type alias for comprimir operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by configuration loading, optimization sessions and loaders.
#[derive(Error, Debug)]
pub enum Error {
    /// Nothing exists at the given identifier.
    #[error("{what} not found at '{identifier}'\n  → Check the path or repository name (expected a local path or 'org/name')")]
    NotFound { identifier: String, what: String },

    /// An artifact exists but cannot be parsed into the expected schema.
    #[error("Malformed configuration '{identifier}': {message}\n  → Check YAML/JSON syntax and field names")]
    MalformedConfig { identifier: String, message: String },

    /// The accuracy-driven search did not find an acceptable model within its budget.
    #[error("Optimization did not converge after {trials} trial(s): {reason} (baseline {baseline:.4}, best {best:.4})\n  → Loosen accuracy_criterion, raise exit_policy.max_trials or exclude sensitive ops")]
    OptimizationFailed { trials: usize, baseline: f32, best: f32, reason: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored artifact does not match what the caller asked for.
    #[error("Incompatible configuration: expected {expected}, found {found}\n  → Use the loader matching the saved task head")]
    IncompatibleConfig { expected: String, found: String },

    /// `fit()` was called with no quantizer, pruner or distiller.
    #[error("Nothing to optimize: no quantizer, pruner or distiller was configured\n  → Pass at least one component to Optimizer::new")]
    NothingToOptimize,

    /// Components of a combined run were configured from different sources.
    #[error("Configuration source mismatch: {first} vs {second}\n  → Load quantization and pruning settings from the same configuration identifier")]
    ConfigSourceMismatch { first: String, second: String },

    /// An operation was requested in a session state that does not allow it.
    #[error("Cannot {operation} while session is {state}")]
    InvalidState { operation: &'static str, state: &'static str },

    /// Static quantization needs calibration samples.
    #[error("Calibration data required for {approach}\n  → Attach samples with Quantizer::with_calibration")]
    CalibrationRequired { approach: String },

    /// Quantization-aware training needs a training step.
    #[error("A training function is required for {approach}\n  → Attach one with Quantizer::with_train_func")]
    MissingTrainingFunction { approach: String },

    /// Weight or metadata (de)serialization failed.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Remote hub access failed for a reason other than a missing artifact.
    #[error("Hub error: {message}\n  → Check your HF_TOKEN environment variable and network connection")]
    Hub { message: String },

    /// A caller-supplied callback reported a failure.
    #[error("Callback failed: {message}")]
    Callback { message: String },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound { identifier: identifier.into(), what: what.into() }
    }

    /// Create a malformed-config error.
    pub fn malformed(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConfig { identifier: identifier.into(), message: message.into() }
    }

    /// Create a callback error.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback { message: message.into() }
    }

    /// Check if this error is user-recoverable.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::MalformedConfig { .. }
                | Self::OptimizationFailed { .. }
                | Self::IncompatibleConfig { .. }
                | Self::NothingToOptimize
                | Self::ConfigSourceMismatch { .. }
                | Self::InvalidState { .. }
                | Self::CalibrationRequired { .. }
                | Self::MissingTrainingFunction { .. }
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E001",
            Self::MalformedConfig { .. } => "E002",
            Self::ConfigSourceMismatch { .. } => "E003",
            Self::IncompatibleConfig { .. } => "E010",
            Self::OptimizationFailed { .. } => "E020",
            Self::NothingToOptimize => "E021",
            Self::CalibrationRequired { .. } => "E022",
            Self::MissingTrainingFunction { .. } => "E023",
            Self::InvalidState { .. } => "E030",
            Self::Hub { .. } => "E040",
            Self::Io { .. } => "E050",
            Self::Serialization { .. } => "E051",
            Self::Callback { .. } => "E060",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<Error> {
        vec![
            Error::not_found("config", "x"),
            Error::malformed("x", "bad"),
            Error::OptimizationFailed { trials: 3, baseline: 0.9, best: 0.5, reason: "r".into() },
            Error::io("writing", std::io::Error::other("disk full")),
            Error::IncompatibleConfig { expected: "a".into(), found: "b".into() },
            Error::NothingToOptimize,
            Error::ConfigSourceMismatch { first: "a".into(), second: "b".into() },
            Error::InvalidState { operation: "save", state: "configured" },
            Error::CalibrationRequired { approach: "static".into() },
            Error::MissingTrainingFunction { approach: "qat".into() },
            Error::Serialization { message: "m".into() },
            Error::Hub { message: "m".into() },
            Error::callback("m"),
        ]
    }

    #[test]
    fn test_error_codes_are_unique() {
        let errors = all_variants();
        let codes: std::collections::HashSet<_> = errors.iter().map(Error::code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_all_errors_display_non_empty() {
        for err in all_variants() {
            assert!(!err.to_string().is_empty(), "{:?} has empty message", err.code());
        }
    }

    #[test]
    fn test_user_errors_carry_hint() {
        for err in all_variants().into_iter().filter(|e| e.is_user_error()) {
            if matches!(err, Error::InvalidState { .. }) {
                continue;
            }
            assert!(err.to_string().contains('→'), "{} lacks a hint", err.code());
        }
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::io("writing weights", std::io::Error::other("disk full"));
        assert!(!err.is_user_error());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("writing weights"));
    }
}
