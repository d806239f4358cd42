#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Thin-plate splines
//!
//! A [`LandmarkSet`] of source → destination correspondences is fitted into
//! an immutable [`TpsModel`] by [`TpsSolver`]. The model maps any point of
//! the plane; [`evaluate`] blends it with the identity.
//!
//! ```rust
//! use warptps_tps::{evaluate, solve, LandmarkSet, Point2d};
//!
//! let mut landmarks = LandmarkSet::new();
//! landmarks.add([100.0, 100.0], [110.0, 110.0]);
//! landmarks.add([200.0, 100.0], [210.0, 120.0]);
//! landmarks.add([150.0, 200.0], [155.0, 205.0]);
//! landmarks.add([100.0, 200.0], [102.0, 198.0]);
//!
//! let model = solve(&landmarks, 0.0)?;
//! let p = evaluate(&model, Point2d::new(150.0, 150.0), 1.0)?;
//! println!("(150, 150) -> ({:.2}, {:.2})", p.x, p.y);
//! # Ok::<(), warptps_tps::TpsError>(())
//! ```

/// Error types for fitting and evaluation.
pub mod error;

/// Blended evaluation of fitted models.
pub mod evaluate;

/// The radial basis function.
pub mod kernel;

/// Landmark correspondences.
pub mod landmarks;

/// The fitted transform.
pub mod model;

/// Planar points.
pub mod point;

/// Assembly and solution of the spline system.
pub mod solver;

mod linalg;

pub use error::TpsError;
pub use evaluate::{blend, evaluate, evaluate_points, validate_percent};
pub use landmarks::{Fingerprint, LandmarkPair, LandmarkSet};
pub use model::TpsModel;
pub use point::Point2d;
pub use solver::{solve, SolverParams, TpsSolver, MIN_LANDMARKS};
