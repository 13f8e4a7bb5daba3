//! Contract for the external structural validator.
//!
//! The builder never inspects root-signature content itself.  When a
//! container carries an `RTS0` part the serialized bytes are handed to a
//! [`Validator`] before a digest is stamped.  Two outcomes are distinct:
//!
//! - `Ok(outcome)` with `success == false` — the validator ran and rejected
//!   the container.  Serialization still succeeds, unhashed.
//! - `Err(_)` — the validator could not run.  Serialization fails.

use serde::Serialize;
use thiserror::Error;

/// How much the validator should check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Only the root-signature part's structure.
    RootSignatureOnly,
}

/// What the validator reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub success:  bool,
    pub errors:   String,
    pub warnings: String,
}

impl ValidationOutcome {
    pub fn passed() -> Self {
        Self { success: true, ..Self::default() }
    }

    pub fn failed(errors: impl Into<String>) -> Self {
        Self { success: false, errors: errors.into(), warnings: String::new() }
    }

    pub fn with_warnings(mut self, warnings: impl Into<String>) -> Self {
        self.warnings = warnings.into();
        self
    }
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct ValidatorError(pub String);

pub trait Validator: Send + Sync {
    fn validate(&self, container: &[u8], mode: ValidationMode) -> Result<ValidationOutcome, ValidatorError>;
}

/// Closures work as validators, which keeps test doubles short.
impl<F> Validator for F
where
    F: Fn(&[u8], ValidationMode) -> Result<ValidationOutcome, ValidatorError> + Send + Sync,
{
    fn validate(&self, container: &[u8], mode: ValidationMode) -> Result<ValidationOutcome, ValidatorError> {
        self(container, mode)
    }
}
