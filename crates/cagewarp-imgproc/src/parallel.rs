use rayon::prelude::*;
use thiserror::Error;

use cagewarp_image::Image;

/// Errors raised when a strategy cannot run.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// Rayon could not create the local pool.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// `Fixed` was given zero threads.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// `AutoRows` was given zero rows per task.
    #[error("rows per task must be > 0, got {0}")]
    InvalidRowStride(usize),
}

/// How a row based pass is spread over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Global rayon pool, the finest split the pass supports.
    #[default]
    ParallelElements,

    /// Global rayon pool, `n` rows per task.
    AutoRows(usize),

    /// Everything on the calling thread.
    Serial,

    /// A dedicated pool of `n` threads, built for each call.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Check that the strategy parameters are usable.
    pub fn validate(&self) -> Result<(), ParallelError> {
        match *self {
            ExecutionStrategy::AutoRows(0) => Err(ParallelError::InvalidRowStride(0)),
            ExecutionStrategy::Fixed(0) => Err(ParallelError::InvalidThreadCount(0)),
            _ => Ok(()),
        }
    }

    /// Number of rows handed to one task for cheap per-row work.
    pub fn rows_per_task(&self, rows: usize) -> usize {
        match *self {
            ExecutionStrategy::Serial => rows.max(1),
            ExecutionStrategy::AutoRows(n) => n.max(1),
            ExecutionStrategy::ParallelElements | ExecutionStrategy::Fixed(_) => 1,
        }
    }

    /// Number of rows in one band for work that scans a shared structure per band.
    ///
    /// Bands are sized so every worker gets a few of them.
    pub fn rows_per_band(&self, rows: usize) -> usize {
        let threads = match *self {
            ExecutionStrategy::Serial => return rows.max(1),
            ExecutionStrategy::AutoRows(n) => return n.max(1),
            ExecutionStrategy::ParallelElements => rayon::current_num_threads(),
            ExecutionStrategy::Fixed(n) => n,
        };
        rows.div_ceil(threads.max(1) * 4).max(1)
    }
}

/// Split `data` into chunks of `rows_per_chunk` rows and map each chunk.
///
/// # Arguments
///
/// * `data` - The row-major buffer to split.
/// * `row_len` - The number of elements in one row.
/// * `rows_per_chunk` - The number of rows per chunk; the last chunk may be shorter.
/// * `strategy` - The execution strategy.
/// * `f` - Called with the index of the first row of the chunk and the chunk itself.
///
/// # Returns
///
/// The results of `f` in chunk order.
pub fn map_row_chunks_mut<T, R, F>(
    data: &mut [T],
    row_len: usize,
    rows_per_chunk: usize,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<Vec<R>, ParallelError>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut [T]) -> R + Send + Sync,
{
    strategy.validate()?;

    if row_len == 0 || data.is_empty() {
        return Ok(Vec::new());
    }

    let rows_per_chunk = rows_per_chunk.max(1);
    let chunk_len = row_len * rows_per_chunk;

    let results: Vec<R> = match strategy {
        ExecutionStrategy::Serial => data
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(i, chunk)| f(i * rows_per_chunk, chunk))
            .collect(),
        ExecutionStrategy::ParallelElements | ExecutionStrategy::AutoRows(_) => data
            .par_chunks_mut(chunk_len)
            .enumerate()
            .map(|(i, chunk)| f(i * rows_per_chunk, chunk))
            .collect(),
        ExecutionStrategy::Fixed(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| {
                data.par_chunks_mut(chunk_len)
                    .enumerate()
                    .map(|(i, chunk)| f(i * rows_per_chunk, chunk))
                    .collect()
            })
        }
    };

    Ok(results)
}

/// Apply a function to each pixel for absolute coordinate resampling in parallel.
///
/// The coordinate image holds one `(x, y)` pair per destination pixel.
pub fn par_iter_rows_resample<const C: usize>(
    dst: &mut Image<f32, C>,
    coords: &Image<f32, 2>,
    f: impl Fn(f32, f32, &mut [f32]) + Send + Sync,
) {
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(coords.as_slice().par_chunks_exact(2 * cols))
        .for_each(|(dst_chunk, coords_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(coords_chunk.chunks_exact(2))
                .for_each(|(dst_pixel, uv)| {
                    f(uv[0], uv[1], dst_pixel);
                });
        });
}
