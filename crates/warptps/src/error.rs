use thiserror::Error;

use warptps_image::ImageError;
use warptps_imgproc::warp::WarpError;
use warptps_tps::TpsError;

/// Errors reported by the top-level warping API.
#[derive(Debug, Error)]
pub enum WarpTpsError {
    /// Fitting or evaluating the spline failed.
    #[error(transparent)]
    Tps(#[from] TpsError),

    /// An image had the wrong shape.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Resampling failed or was cancelled.
    #[error(transparent)]
    Warp(#[from] WarpError),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// An argument was rejected before any computation took place.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl WarpTpsError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        WarpTpsError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
