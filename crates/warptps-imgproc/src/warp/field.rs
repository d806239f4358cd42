use rayon::prelude::*;
use warptps_image::{Image, ImageDtype, ImageError, ImageSize};
use warptps_tps::{blend, validate_percent, Point2d, TpsModel};

use super::{check_same_size, resample, WarpError, WarpParams};

/// Source locations of every destination pixel, presampled on a grid.
///
/// The transform is evaluated on grid nodes every `stride` pixels and
/// bilinearly interpolated in between. Evaluating the spline costs one
/// kernel per control point, so a coarse field pays off when many warps
/// reuse the same transform or the model has many control points. A stride
/// of 1 evaluates every pixel and is exact.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleField {
    size: ImageSize,
    stride: usize,
    grid_cols: usize,
    grid_rows: usize,
    nodes: Vec<Point2d>,
}

fn grid_len(pixels: usize, stride: usize) -> usize {
    if pixels == 0 {
        0
    } else {
        (pixels - 1).div_ceil(stride) + 1
    }
}

impl SampleField {
    /// Presample `model` blended at `percent` over an image of `size`.
    ///
    /// # Errors
    ///
    /// Returns an error if `percent` is not finite or `stride` is zero.
    pub fn from_model(
        model: &TpsModel,
        size: ImageSize,
        percent: f64,
        stride: usize,
    ) -> Result<Self, WarpError> {
        validate_percent(percent)?;
        if stride == 0 {
            return Err(WarpError::invalid("stride", "must be > 0"));
        }

        let grid_cols = grid_len(size.width, stride);
        let grid_rows = grid_len(size.height, stride);
        let nodes = (0..grid_cols * grid_rows)
            .into_par_iter()
            .map(|i| {
                let x = (i % grid_cols * stride) as f64;
                let y = (i / grid_cols * stride) as f64;
                blend(model, Point2d::new(x, y), percent)
            })
            .collect();

        log::debug!(
            "presampled {}x{} field on a {}x{} grid",
            size.width,
            size.height,
            grid_cols,
            grid_rows
        );

        Ok(Self {
            size,
            stride,
            grid_cols,
            grid_rows,
            nodes,
        })
    }

    /// Evaluate `model` at every pixel.
    pub fn dense(model: &TpsModel, size: ImageSize, percent: f64) -> Result<Self, WarpError> {
        Self::from_model(model, size, percent, 1)
    }

    /// Size of the image the field covers.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Distance in pixels between grid nodes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Source location for the destination pixel `(x, y)`.
    ///
    /// Pixels outside the field are clamped to its border.
    pub fn sample(&self, x: usize, y: usize) -> Point2d {
        if self.nodes.is_empty() {
            return Point2d::new(x as f64, y as f64);
        }

        let (i0, fx) = (x / self.stride, (x % self.stride) as f64 / self.stride as f64);
        let (j0, fy) = (y / self.stride, (y % self.stride) as f64 / self.stride as f64);
        let i0 = i0.min(self.grid_cols - 1);
        let j0 = j0.min(self.grid_rows - 1);
        let i1 = (i0 + 1).min(self.grid_cols - 1);
        let j1 = (j0 + 1).min(self.grid_rows - 1);

        let node = |i: usize, j: usize| self.nodes[j * self.grid_cols + i];
        if fx == 0.0 && fy == 0.0 {
            return node(i0, j0);
        }

        let top = node(i0, j0).lerp(node(i1, j0), fx);
        if fy == 0.0 {
            return top;
        }
        let bottom = node(i0, j1).lerp(node(i1, j1), fx);
        top.lerp(bottom, fy)
    }
}

/// Warp an image through a presampled field.
///
/// Behaves like [`super::warp_tps`] except that the source locations come
/// from `field`; `params.percent` is ignored because the field already
/// carries its blend factor.
///
/// # Errors
///
/// Returns [`WarpError::Image`] if `src`, `dst` and the field differ in size.
pub fn warp_with_field<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    field: &SampleField,
    params: &WarpParams,
) -> Result<(), WarpError> {
    check_same_size(src, dst)?;
    if field.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            field.size().width,
            field.size().height,
            dst.cols(),
            dst.rows(),
        )
        .into());
    }
    params.validate(C)?;

    resample(src, dst, params, |x, y| {
        let p = field.sample(x, y);
        (p.x, p.y)
    })
}
