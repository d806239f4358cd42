use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warptps_image::Image;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The band height must be positive.
    #[error("band rows must be > 0, got {0}")]
    InvalidBandRows(usize),

    /// At least one band was skipped because the operation was cancelled.
    #[error("operation was cancelled")]
    Cancelled,
}

/// Controls how parallel operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool, sized to the available hardware parallelism.
    #[default]
    Parallel,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    Fixed(usize),
}

/// Shared flag used to stop a long running operation between bands.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Apply a function to bands of rows of a row-major buffer.
///
/// The buffer is split into bands of `band_rows` rows, each `row_stride`
/// elements long (the last band may be shorter). `f` receives the index of
/// the first row of the band and the band itself. Bands are disjoint, so no
/// locking is needed. The cancel token is checked before each band starts.
///
/// # Errors
///
/// * [`ParallelError::InvalidBandRows`] if `band_rows` is zero.
/// * [`ParallelError::InvalidThreadCount`] / [`ParallelError::BuildError`] for a bad fixed pool.
/// * [`ParallelError::Cancelled`] if any band was skipped.
pub fn par_iter_row_bands<T, F>(
    data: &mut [T],
    row_stride: usize,
    band_rows: usize,
    strategy: ExecutionStrategy,
    cancel: Option<&CancelToken>,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if band_rows == 0 {
        return Err(ParallelError::InvalidBandRows(band_rows));
    }
    if row_stride == 0 || data.is_empty() {
        return Ok(());
    }

    let chunk = row_stride * band_rows;
    let skipped = AtomicBool::new(false);
    let run_band = |(i, band): (usize, &mut [T])| {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            skipped.store(true, Ordering::Relaxed);
            return;
        }
        f(i * band_rows, band);
    };

    match strategy {
        ExecutionStrategy::Serial => {
            data.chunks_mut(chunk).enumerate().for_each(run_band);
        }
        ExecutionStrategy::Parallel => {
            data.par_chunks_mut(chunk).enumerate().for_each(run_band);
        }
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| {
                data.par_chunks_mut(chunk).enumerate().for_each(run_band);
            });
        }
    }

    if skipped.load(Ordering::Relaxed) {
        return Err(ParallelError::Cancelled);
    }
    Ok(())
}

/// Apply a function to each sample of two images and a destination in parallel.
pub fn par_iter_rows_val_two<T1, T2, T3, const C: usize>(
    src1: &Image<T1, C>,
    src2: &Image<T2, C>,
    dst: &mut Image<T3, C>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Sync,
    T2: Sync,
    T3: Send,
{
    let stride = (C * src1.cols()).max(1);
    src1.as_slice()
        .par_chunks(stride)
        .zip(src2.as_slice().par_chunks(stride))
        .zip(dst.as_slice_mut().par_chunks_mut(stride))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .iter()
                .zip(src2_chunk.iter())
                .zip(dst_chunk.iter_mut())
                .for_each(|((a, b), out)| f(a, b, out));
        });
}
