use warptps_image::{Image, ImageDtype};

/// Kernel for bilinear interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate, in `[0, cols - 1]`.
/// * `v` - The y coordinate of the pixel to interpolate, in `[0, rows - 1]`.
///
/// # Returns
///
/// The interpolated samples of every channel, widened to `f64`.
pub(crate) fn bilinear_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu0 = (u.trunc() as usize).min(cols - 1);
    let iv0 = (v.trunc() as usize).min(rows - 1);

    let frac_u = u - iu0 as f64;
    let frac_v = v - iv0 as f64;

    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let w00 = (1.0 - frac_u) * (1.0 - frac_v);
    let w01 = frac_u * (1.0 - frac_v);
    let w10 = (1.0 - frac_u) * frac_v;
    let w11 = frac_u * frac_v;

    let data = image.as_slice();
    let base00 = (iv0 * cols + iu0) * C;
    let base01 = (iv0 * cols + iu1) * C;
    let base10 = (iv1 * cols + iu0) * C;
    let base11 = (iv1 * cols + iu1) * C;

    let p00 = &data[base00..base00 + C];
    let p01 = &data[base01..base01 + C];
    let p10 = &data[base10..base10 + C];
    let p11 = &data[base11..base11 + C];

    let mut pixel = [0.0; C];
    for k in 0..C {
        // skip zero-weight neighbours so integer coordinates read exactly one sample
        let mut acc = p00[k].as_f64() * w00;
        if w01 != 0.0 {
            acc += p01[k].as_f64() * w01;
        }
        if w10 != 0.0 {
            acc += p10[k].as_f64() * w10;
        }
        if w11 != 0.0 {
            acc += p11[k].as_f64() * w11;
        }
        pixel[k] = acc;
    }

    pixel
}
