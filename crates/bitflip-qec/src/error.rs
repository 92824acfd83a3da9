//! Error types for the error-correction core.

use bitflip_hal::HalError;
use bitflip_ir::IrError;
use thiserror::Error;

/// Errors raised while building or running a bit-flip experiment.
#[derive(Debug, Error)]
pub enum QecError {
    /// Caller supplied something outside the accepted domain. Raised before
    /// anything is simulated.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The backend failed; the underlying error is passed through unchanged.
    #[error(transparent)]
    Simulation(#[from] HalError),

    /// A recipe lowered to an ill-formed circuit.
    #[error("Circuit construction failed: {0}")]
    Circuit(#[from] IrError),
}

impl QecError {
    /// Shorthand for [`QecError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error came from user input rather than execution.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type for error-correction operations.
pub type QecResult<T> = Result<T, QecError>;
