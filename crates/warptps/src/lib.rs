#![deny(missing_docs)]
//! Landmark-driven image warping with thin-plate splines.
//!
//! Place correspondences on a [`TpsTransform`], fit them with
//! [`TpsTransform::compute_model`] and use the resulting [`WarpModel`] to
//! map points or resample images. Images are dense, row-major buffers with
//! channel-interleaved pixels (see [`Image`]).
//!
//! ```rust
//! use warptps::{Image, ImageSize, Point2d, TpsTransform};
//!
//! let mut transform = TpsTransform::default();
//! transform.add_landmark([100.0, 100.0], [110.0, 110.0]);
//! transform.add_landmark([200.0, 100.0], [210.0, 120.0]);
//! transform.add_landmark([150.0, 200.0], [155.0, 205.0]);
//! let model = transform.compute_model()?;
//!
//! let p = model.evaluate(Point2d::new(200.0, 100.0), 1.0)?;
//! assert!((p.x - 210.0).abs() < 1e-6);
//!
//! let image = Image::<u8, 3>::from_size_val(ImageSize { width: 300, height: 300 }, 0)?;
//! let params = transform.config().warp_params().with_percent(0.5);
//! let warped = model.warp(&image, &params)?;
//! assert_eq!(warped.size(), image.size());
//! # Ok::<(), warptps::WarpTpsError>(())
//! ```

/// Caching of fitted models.
pub mod cache;

/// Transform configuration.
pub mod config;

/// Error types for the top-level API.
pub mod error;

/// Morphing between two images.
pub mod morph;

/// Landmark collection, fitting and the fitted model handle.
pub mod transform;

#[doc(inline)]
pub use warptps_image as image;

#[doc(inline)]
pub use warptps_imgproc as imgproc;

#[doc(inline)]
pub use warptps_tps as tps;

pub use cache::ModelCache;
pub use config::TransformConfig;
pub use error::WarpTpsError;
pub use morph::morph_sequence;
pub use transform::{TpsTransform, WarpModel};

pub use warptps_image::{Image, ImageDtype, ImageSize, SampleType};
pub use warptps_imgproc::fill::FillPolicy;
pub use warptps_imgproc::interpolation::InterpolationMode;
pub use warptps_imgproc::parallel::{CancelToken, ExecutionStrategy};
pub use warptps_imgproc::warp::WarpParams;
pub use warptps_tps::{LandmarkPair, LandmarkSet, Point2d, TpsModel};

/// Name and version of the library, e.g. `"warptps 0.1.0"`.
pub fn version() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
