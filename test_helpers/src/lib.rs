//! Test helpers for warm-pixels
//!
//! Synthetic CCD frames with known warm pixels, logging setup for tests,
//! and a scratch directory for test artifacts.

use ndarray::Array2;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::env;
use std::path::{Path, PathBuf};

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Install a tracing subscriber for tests. Safe to call from every test.
///
/// Honours `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Returns the path to the workspace root directory.
///
/// Walks up from the current directory until it finds a Cargo.toml that
/// declares `[workspace]`.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {}", e))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {}", e))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Directory for test artifacts such as saved line collections, created on demand.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Path relative to [`get_output_dir`].
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

/// A warm pixel planted in a synthetic frame.
///
/// The trail behind the pixel decays as `flux × trail_fraction × exp(-k / trail_scale)`
/// for `k = 1, 2, ...` rows further from the readout register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantedPixel {
    pub row: usize,
    pub col: usize,
    pub flux: f64,
    pub trail_fraction: f64,
    pub trail_scale: f64,
}

impl PlantedPixel {
    pub fn new(row: usize, col: usize, flux: f64) -> Self {
        Self {
            row,
            col,
            flux,
            trail_fraction: 0.05,
            trail_scale: 2.0,
        }
    }
}

/// Builder for noisy CCD frames with known warm pixels.
///
/// Every random draw comes from an `StdRng` seeded by the caller, so the
/// same builder and seed always produce the same frame.
#[derive(Debug, Clone)]
pub struct SyntheticFrame {
    pub rows: usize,
    pub cols: usize,
    /// Constant level added to every pixel
    pub bias: f64,
    /// Per-pixel Gaussian noise
    pub read_noise: f64,
    /// Spread of fixed per-column offsets
    pub column_offset_sigma: f64,
    pub warm_pixels: Vec<PlantedPixel>,
    /// Columns raised by the given amount along their full length
    pub bad_columns: Vec<(usize, f64)>,
}

impl SyntheticFrame {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            bias: 100.0,
            read_noise: 2.0,
            column_offset_sigma: 0.0,
            warm_pixels: Vec::new(),
            bad_columns: Vec::new(),
        }
    }

    pub fn with_noise(mut self, bias: f64, read_noise: f64) -> Self {
        self.bias = bias;
        self.read_noise = read_noise;
        self
    }

    pub fn with_column_offsets(mut self, sigma: f64) -> Self {
        self.column_offset_sigma = sigma;
        self
    }

    pub fn with_warm_pixel(mut self, pixel: PlantedPixel) -> Self {
        self.warm_pixels.push(pixel);
        self
    }

    pub fn with_bad_column(mut self, col: usize, excess: f64) -> Self {
        self.bad_columns.push((col, excess));
        self
    }

    /// Render the frame.
    ///
    /// Column offsets are drawn from `column_seed` so that several frames
    /// of one sensor share the same fixed pattern; pixel noise is drawn from
    /// `noise_seed`.
    pub fn build(&self, column_seed: u64, noise_seed: u64) -> Array2<f64> {
        let mut column_rng = StdRng::seed_from_u64(column_seed);
        let offsets: Vec<f64> = if self.column_offset_sigma > 0.0 {
            let dist = Normal::new(0.0, self.column_offset_sigma)
                .expect("Column offset sigma must be finite and positive");
            (0..self.cols).map(|_| dist.sample(&mut column_rng)).collect()
        } else {
            vec![0.0; self.cols]
        };

        let mut noise_rng = StdRng::seed_from_u64(noise_seed);
        let mut image = if self.read_noise > 0.0 {
            let noise = Normal::new(0.0, self.read_noise)
                .expect("Read noise must be finite and positive");
            Array2::from_shape_fn((self.rows, self.cols), |(_, c)| {
                self.bias + offsets[c] + noise.sample(&mut noise_rng)
            })
        } else {
            Array2::from_shape_fn((self.rows, self.cols), |(_, c)| self.bias + offsets[c])
        };

        for &(col, excess) in &self.bad_columns {
            image.column_mut(col).mapv_inplace(|v| v + excess);
        }

        for pixel in &self.warm_pixels {
            image[[pixel.row, pixel.col]] += pixel.flux;
            for k in 1.. {
                let row = pixel.row + k;
                if row >= self.rows {
                    break;
                }
                let charge =
                    pixel.flux * pixel.trail_fraction * (-(k as f64) / pixel.trail_scale).exp();
                if charge < 1e-3 {
                    break;
                }
                image[[row, pixel.col]] += charge;
            }
        }

        image
    }
}

/// Add a single-frame spike (e.g. a cosmic ray hit) at random positions.
pub fn add_random_spikes(
    image: &mut Array2<f64>,
    count: usize,
    flux: f64,
    seed: u64,
) -> Vec<(usize, usize)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (rows, cols) = image.dim();
    (0..count)
        .map(|_| {
            let position = (rng.gen_range(0..rows), rng.gen_range(0..cols));
            image[[position.0, position.1]] += flux;
            position
        })
        .collect()
}
