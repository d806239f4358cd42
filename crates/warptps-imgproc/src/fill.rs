use serde::{Deserialize, Serialize};
use warptps_image::ImageDtype;

use crate::warp::WarpError;

/// How destination pixels whose source location falls outside the source
/// image are filled.
///
/// # Example
///
/// ```
/// use warptps_imgproc::fill::FillPolicy;
///
/// assert_eq!(FillPolicy::default(), FillPolicy::Zeros);
/// let red = FillPolicy::Constant(vec![255.0, 0.0, 0.0]);
/// assert!(red.validate(3).is_ok());
/// assert!(red.validate(4).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Write zero to every channel (black, or transparent for alpha images).
    #[default]
    Zeros,
    /// Write the given value to each channel; one value per channel.
    Constant(Vec<f64>),
    /// Leave the destination pixel untouched.
    Transparent,
    /// Clamp the source location to the nearest edge pixel.
    Replicate,
}

/// A [`FillPolicy`] checked against a channel count and converted to samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ResolvedFill<T, const C: usize> {
    Value([T; C]),
    Keep,
    Replicate,
}

impl FillPolicy {
    /// Check the policy for an image with `channels` channels.
    ///
    /// # Errors
    ///
    /// A constant fill must provide exactly one finite value per channel.
    pub fn validate(&self, channels: usize) -> Result<(), WarpError> {
        if let FillPolicy::Constant(values) = self {
            if values.len() != channels {
                return Err(WarpError::invalid(
                    "fill",
                    format!(
                        "constant fill has {} values for {} channels",
                        values.len(),
                        channels
                    ),
                ));
            }
            if !values.iter().all(|v| v.is_finite()) {
                return Err(WarpError::invalid(
                    "fill",
                    "constant fill values must be finite",
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn resolve<T: ImageDtype, const C: usize>(
        &self,
    ) -> Result<ResolvedFill<T, C>, WarpError> {
        self.validate(C)?;
        Ok(match self {
            FillPolicy::Zeros => ResolvedFill::Value([T::from_f64(0.0); C]),
            FillPolicy::Constant(values) => {
                let mut pixel = [T::default(); C];
                for (out, &v) in pixel.iter_mut().zip(values.iter()) {
                    *out = T::from_f64(v);
                }
                ResolvedFill::Value(pixel)
            }
            FillPolicy::Transparent => ResolvedFill::Keep,
            FillPolicy::Replicate => ResolvedFill::Replicate,
        })
    }
}
