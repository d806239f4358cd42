/// A point in the plane, in pixel units.
///
/// This is [`glam::DVec2`]: it serializes as `[x, y]` and converts from
/// `[f64; 2]` and `(f64, f64)`.
pub type Point2d = glam::DVec2;
