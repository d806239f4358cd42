#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image enhancement module.
pub mod enhance;

/// fill policies for pixels that map outside the source.
pub mod fill;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;

/// image geometric transformations module.
pub mod warp;
