use thiserror::Error;

/// Error types for thin-plate spline fitting and evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum TpsError {
    /// Not enough correspondences to fit a spline.
    #[error("thin-plate spline requires at least {required} landmarks, got {actual}")]
    InsufficientLandmarks {
        /// Minimum number of landmarks required by the solver
        required: usize,
        /// Actual number of landmarks provided
        actual: usize,
    },

    /// The assembled linear system has no stable solution.
    #[error("singular thin-plate spline system: {0}")]
    SingularSystem(String),

    /// A parameter was rejected before any computation took place.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl TpsError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TpsError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
