use serde::{Deserialize, Serialize};

use warptps_imgproc::fill::FillPolicy;
use warptps_imgproc::interpolation::InterpolationMode;
use warptps_imgproc::parallel::ExecutionStrategy;
use warptps_imgproc::warp::{WarpParams, DEFAULT_BAND_ROWS};
use warptps_tps::{validate_percent, SolverParams};

use crate::error::WarpTpsError;

/// Settings for fitting and applying a transform.
///
/// Every field has a default, so a configuration document only needs to
/// name what it changes:
///
/// ```
/// use warptps::{FillPolicy, TransformConfig};
///
/// let config = TransformConfig::from_json(r#"{ "percent": 0.5, "fill": "replicate" }"#)?;
/// assert_eq!(config.percent, 0.5);
/// assert_eq!(config.fill, FillPolicy::Replicate);
/// assert_eq!(config.regularization, 0.0);
/// # Ok::<(), warptps::WarpTpsError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Smoothing `λ`; `0.0` passes exactly through the landmarks.
    pub regularization: f64,
    /// Blend between the identity (`0.0`) and the full transform (`1.0`).
    pub percent: f64,
    /// How to fill pixels that map outside the source.
    pub fill: FillPolicy,
    /// How to sample the source between pixel centres.
    pub interpolation: InterpolationMode,
    /// Where the warp runs.
    pub strategy: ExecutionStrategy,
    /// Height of the row bands the destination is split into.
    pub band_rows: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            regularization: 0.0,
            percent: 1.0,
            fill: FillPolicy::Zeros,
            interpolation: InterpolationMode::Bilinear,
            strategy: ExecutionStrategy::Parallel,
            band_rows: DEFAULT_BAND_ROWS,
        }
    }
}

impl TransformConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, WarpTpsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, WarpTpsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field except the fill policy, which depends on the
    /// channel count of the image and is checked at warp time.
    pub fn validate(&self) -> Result<(), WarpTpsError> {
        SolverParams::with_regularization(self.regularization).validate()?;
        validate_percent(self.percent)?;
        if self.band_rows == 0 {
            return Err(WarpTpsError::invalid("band_rows", "must be > 0"));
        }
        if self.strategy == ExecutionStrategy::Fixed(0) {
            return Err(WarpTpsError::invalid("strategy", "thread count must be > 0"));
        }
        Ok(())
    }

    /// The warp parameters described by this configuration.
    pub fn warp_params(&self) -> WarpParams {
        WarpParams {
            percent: self.percent,
            fill: self.fill.clone(),
            interpolation: self.interpolation,
            strategy: self.strategy,
            band_rows: self.band_rows,
            cancel: None,
        }
    }
}
