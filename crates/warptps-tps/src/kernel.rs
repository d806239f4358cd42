//! The thin-plate spline radial basis `U(r) = r² ln r`.

/// TPS radial basis function: U(r) = r² ln(r).
///
/// For r = 0 we define U(0) = 0 (the limit as r → 0).
#[inline]
pub fn tps_kernel(r: f64) -> f64 {
    if r <= 0.0 {
        0.0
    } else {
        r * r * r.ln()
    }
}

/// Same as [`tps_kernel`] but from the squared radius, avoiding a square root.
///
/// Uses `r² ln r = ½ r² ln r²`.
#[inline]
pub fn tps_kernel_sq(r2: f64) -> f64 {
    if r2 <= 0.0 {
        0.0
    } else {
        0.5 * r2 * r2.ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kernel_values() {
        assert_eq!(tps_kernel(0.0), 0.0);
        assert_eq!(tps_kernel(1.0), 0.0);
        assert_relative_eq!(tps_kernel(2.0), 4.0 * 2.0f64.ln(), epsilon = 1e-12);
        assert!(tps_kernel(0.5) < 0.0);
    }

    #[test]
    fn squared_form_matches() {
        for r in [1e-6, 0.3, 1.0, 2.5, 150.0] {
            assert_relative_eq!(tps_kernel_sq(r * r), tps_kernel(r), max_relative = 1e-12);
        }
        assert_eq!(tps_kernel_sq(0.0), 0.0);
    }
}
