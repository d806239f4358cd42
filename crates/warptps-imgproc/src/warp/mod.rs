mod field;
mod tps;

pub use field::{warp_with_field, SampleField};
pub use tps::warp_tps;

use thiserror::Error;
use warptps_image::{Image, ImageDtype, ImageError};
use warptps_tps::TpsError;

use crate::fill::{FillPolicy, ResolvedFill};
use crate::interpolation::{interpolate_pixel, InterpolationMode};
use crate::parallel::{self, CancelToken, ExecutionStrategy, ParallelError};

/// Default height of the row bands a warp is split into.
pub const DEFAULT_BAND_ROWS: usize = 16;

/// Source coordinates closer than this to an integer are snapped to it.
pub const SNAP_TOLERANCE: f64 = 1e-6;

/// Errors reported by the warping functions.
#[derive(Debug, Error, PartialEq)]
pub enum WarpError {
    /// The images involved have inconsistent shapes.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The transform could not be evaluated.
    #[error(transparent)]
    Tps(#[from] TpsError),

    /// A warp parameter was rejected before any pixel was written.
    #[error("invalid warp parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The worker pool could not run the warp.
    #[error(transparent)]
    Parallel(ParallelError),

    /// The warp was cancelled; the destination is partially written.
    #[error("warp was cancelled")]
    Cancelled,
}

impl WarpError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        WarpError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<ParallelError> for WarpError {
    fn from(e: ParallelError) -> Self {
        match e {
            ParallelError::Cancelled => WarpError::Cancelled,
            other => WarpError::Parallel(other),
        }
    }
}

/// Parameters shared by every warp.
#[derive(Debug, Clone)]
pub struct WarpParams {
    /// Blend between the identity (`0.0`) and the full transform (`1.0`).
    pub percent: f64,
    /// How to fill pixels that map outside the source.
    pub fill: FillPolicy,
    /// How to sample the source between pixel centres.
    pub interpolation: InterpolationMode,
    /// Where the row bands run.
    pub strategy: ExecutionStrategy,
    /// Height of a row band.
    pub band_rows: usize,
    /// Checked before each band starts.
    pub cancel: Option<CancelToken>,
}

impl Default for WarpParams {
    fn default() -> Self {
        Self {
            percent: 1.0,
            fill: FillPolicy::default(),
            interpolation: InterpolationMode::default(),
            strategy: ExecutionStrategy::default(),
            band_rows: DEFAULT_BAND_ROWS,
            cancel: None,
        }
    }
}

impl WarpParams {
    /// Set the blend factor.
    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = percent;
        self
    }

    /// Set the fill policy.
    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = fill;
        self
    }

    /// Set the interpolation mode.
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the band height.
    pub fn with_band_rows(mut self, band_rows: usize) -> Self {
        self.band_rows = band_rows;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Check every parameter for an image with `channels` channels.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::Tps`] for a non-finite percent and
    /// [`WarpError::InvalidParameter`] for a malformed fill or a zero band height.
    pub fn validate(&self, channels: usize) -> Result<(), WarpError> {
        warptps_tps::validate_percent(self.percent)?;
        self.fill.validate(channels)?;
        if self.band_rows == 0 {
            return Err(WarpError::invalid("band_rows", "must be > 0"));
        }
        if self.strategy == ExecutionStrategy::Fixed(0) {
            return Err(WarpError::invalid("strategy", "thread count must be > 0"));
        }
        Ok(())
    }
}

#[inline]
fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() <= SNAP_TOLERANCE {
        r
    } else {
        v
    }
}

pub(crate) fn check_same_size<T1, T2, const C: usize>(
    src: &Image<T1, C>,
    dst: &Image<T2, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Pull-based resampling shared by every warp.
///
/// `map` returns the source location of the destination pixel `(x, y)`.
pub(crate) fn resample<T, const C: usize, F>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    params: &WarpParams,
    map: F,
) -> Result<(), WarpError>
where
    T: ImageDtype,
    F: Fn(usize, usize) -> (f64, f64) + Send + Sync,
{
    let mut fill = params.fill.resolve::<T, C>()?;
    if src.is_empty() && fill == ResolvedFill::Replicate {
        fill = ResolvedFill::Value([T::from_f64(0.0); C]);
    }

    let max_x = src.cols() as f64 - 1.0;
    let max_y = src.rows() as f64 - 1.0;
    let row_stride = dst.cols() * C;

    parallel::par_iter_row_bands(
        dst.as_slice_mut(),
        row_stride,
        params.band_rows,
        params.strategy,
        params.cancel.as_ref(),
        |row0, band| {
            for (r, row) in band.chunks_exact_mut(row_stride).enumerate() {
                let y = row0 + r;
                for (x, pixel) in row.chunks_exact_mut(C).enumerate() {
                    let (u, v) = map(x, y);
                    let (mut u, mut v) = (snap(u), snap(v));

                    // NaN compares false and falls through to the fill
                    let inside = u >= 0.0 && u <= max_x && v >= 0.0 && v <= max_y;
                    if !inside {
                        match fill {
                            ResolvedFill::Value(value) => {
                                pixel.copy_from_slice(&value);
                                continue;
                            }
                            ResolvedFill::Keep => continue,
                            ResolvedFill::Replicate => {
                                u = if u.is_nan() { 0.0 } else { u.clamp(0.0, max_x) };
                                v = if v.is_nan() { 0.0 } else { v.clamp(0.0, max_y) };
                            }
                        }
                    }

                    let samples = interpolate_pixel(src, u, v, params.interpolation);
                    for (out, s) in pixel.iter_mut().zip(samples) {
                        *out = T::from_f64(s);
                    }
                }
            }
        },
    )?;

    Ok(())
}
