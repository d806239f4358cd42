//! Evaluating a fitted model with partial-strength blending.
//!
//! `percent` interpolates between the identity (`0.0`) and the fitted
//! transform (`1.0`). Values outside `[0, 1]` extrapolate and are not clamped.

use crate::error::TpsError;
use crate::model::TpsModel;
use crate::point::Point2d;

/// Check that a blend factor is usable.
///
/// # Errors
///
/// Returns [`TpsError::InvalidParameter`] if `percent` is NaN or infinite.
pub fn validate_percent(percent: f64) -> Result<(), TpsError> {
    if !percent.is_finite() {
        return Err(TpsError::invalid(
            "percent",
            format!("must be finite, got {percent}"),
        ));
    }
    Ok(())
}

/// Blend between the identity and the model without validating `percent`.
///
/// `percent == 0.0` returns `point` unchanged and `percent == 1.0` returns
/// `model.transform(point)`, both bit for bit.
#[inline]
pub fn blend(model: &TpsModel, point: Point2d, percent: f64) -> Point2d {
    if percent == 0.0 {
        return point;
    }
    let mapped = model.transform(point);
    if percent == 1.0 {
        return mapped;
    }
    point + (mapped - point) * percent
}

/// Map a point through `model` at the given blend strength.
///
/// # Errors
///
/// Returns [`TpsError::InvalidParameter`] for a non-finite `percent` or point.
///
/// # Example
///
/// ```
/// use warptps_tps::{evaluate, solve, LandmarkSet, Point2d};
///
/// let mut landmarks = LandmarkSet::new();
/// landmarks.add([0.0, 0.0], [0.0, 0.0]);
/// landmarks.add([10.0, 0.0], [12.0, 0.0]);
/// landmarks.add([0.0, 10.0], [0.0, 10.0]);
/// let model = solve(&landmarks, 0.0)?;
///
/// let p = Point2d::new(10.0, 0.0);
/// assert_eq!(evaluate(&model, p, 0.0)?, p);
/// let half = evaluate(&model, p, 0.5)?;
/// assert!((half.x - 11.0).abs() < 1e-9);
/// # Ok::<(), warptps_tps::TpsError>(())
/// ```
pub fn evaluate(model: &TpsModel, point: Point2d, percent: f64) -> Result<Point2d, TpsError> {
    validate_percent(percent)?;
    if !point.is_finite() {
        return Err(TpsError::invalid(
            "point",
            format!("coordinates must be finite, got ({}, {})", point.x, point.y),
        ));
    }
    Ok(blend(model, point, percent))
}

/// Map several points through `model` at the given blend strength.
pub fn evaluate_points(
    model: &TpsModel,
    points: &[Point2d],
    percent: f64,
) -> Result<Vec<Point2d>, TpsError> {
    points
        .iter()
        .map(|&p| evaluate(model, p, percent))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{solve, LandmarkSet};
    use approx::assert_relative_eq;

    fn model() -> Result<TpsModel, TpsError> {
        let mut landmarks = LandmarkSet::new();
        landmarks.add([100.0, 100.0], [110.0, 110.0]);
        landmarks.add([200.0, 100.0], [210.0, 105.0]);
        landmarks.add([150.0, 200.0], [155.0, 210.0]);
        landmarks.add([100.0, 200.0], [105.0, 205.0]);
        solve(&landmarks, 0.0)
    }

    #[test]
    fn zero_blend_is_identity() -> Result<(), TpsError> {
        let model = model()?;
        for p in [
            Point2d::new(0.0, 0.0),
            Point2d::new(123.456, -78.9),
            Point2d::new(1e6, 3.0),
        ] {
            assert_eq!(evaluate(&model, p, 0.0)?, p);
        }
        Ok(())
    }

    #[test]
    fn full_blend_is_transform() -> Result<(), TpsError> {
        let model = model()?;
        let p = Point2d::new(140.0, 160.0);
        assert_eq!(evaluate(&model, p, 1.0)?, model.transform(p));

        let dst = evaluate(&model, Point2d::new(200.0, 100.0), 1.0)?;
        assert_relative_eq!(dst.x, 210.0, epsilon = 1e-6);
        assert_relative_eq!(dst.y, 105.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn partial_blend_at_landmark() -> Result<(), TpsError> {
        let model = model()?;
        let src = Point2d::new(100.0, 100.0);
        for percent in [0.25, 0.5, 0.75] {
            let p = evaluate(&model, src, percent)?;
            assert_relative_eq!(p.x, 100.0 + 10.0 * percent, epsilon = 1e-6);
            assert_relative_eq!(p.y, 100.0 + 10.0 * percent, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn out_of_range_percent_extrapolates() -> Result<(), TpsError> {
        let model = model()?;
        let src = Point2d::new(100.0, 100.0);

        let over = evaluate(&model, src, 1.5)?;
        assert_relative_eq!(over.x, 115.0, epsilon = 1e-6);
        assert_relative_eq!(over.y, 115.0, epsilon = 1e-6);

        let under = evaluate(&model, src, -0.5)?;
        assert_relative_eq!(under.x, 95.0, epsilon = 1e-6);
        assert_relative_eq!(under.y, 95.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn rejects_non_finite() -> Result<(), TpsError> {
        let model = model()?;
        let p = Point2d::new(1.0, 1.0);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                evaluate(&model, p, bad),
                Err(TpsError::InvalidParameter { name: "percent", .. })
            ));
        }
        assert!(evaluate(&model, Point2d::new(f64::NAN, 0.0), 1.0).is_err());
        Ok(())
    }

    #[test]
    fn batch_matches_single() -> Result<(), TpsError> {
        let model = model()?;
        let points = vec![Point2d::new(10.0, 20.0), Point2d::new(150.0, 150.0)];
        let batch = evaluate_points(&model, &points, 0.3)?;
        for (p, q) in points.iter().zip(batch.iter()) {
            assert_eq!(*q, evaluate(&model, *p, 0.3)?);
        }
        Ok(())
    }
}
