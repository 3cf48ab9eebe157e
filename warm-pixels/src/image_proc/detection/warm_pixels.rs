//! Warm pixel detection and trail extraction.
//!
//! A warm pixel is a single bright pixel that stands above every pixel
//! within ±[`ISOLATION_RADIUS`] rows of its own column, and is sharp
//! compared with a box-smoothed copy of the frame around it. Each
//! accepted pixel is emitted as a [`PixelLine`] holding the raw values of
//! the pixel and the trail behind it.

use ndarray::{s, ArrayView2, Axis};

use crate::algo::{mean, median, std_dev};
use crate::image_proc::detection::DetectionConfig;
use crate::image_proc::filter::uniform_filter;
use crate::pixel_line::PixelLine;

/// Same-column neighbours on each side a candidate must outshine
pub const ISOLATION_RADIUS: usize = 9;

/// Mean of every column of `image`.
pub fn column_means(image: &ArrayView2<f64>) -> Vec<f64> {
    match image.mean_axis(Axis(0)) {
        Some(means) => means.to_vec(),
        None => Vec::new(),
    }
}

/// Flags of the columns that survive iterative outlier rejection.
///
/// Each round computes the median and standard deviation of the currently
/// accepted means and drops accepted columns further than
/// `factor` standard deviations from that median. Rejected columns are
/// never re-admitted.
pub fn good_columns(means: &[f64], factor: f64, loops: usize) -> Vec<bool> {
    let mut good = vec![true; means.len()];

    for round in 0..loops {
        let accepted: Vec<f64> = means
            .iter()
            .zip(&good)
            .filter(|&(_, &keep)| keep)
            .map(|(&m, _)| m)
            .collect();
        let (Some(centre), Some(spread)) = (median(&accepted), std_dev(&accepted)) else {
            break;
        };

        let mut n_rejected = 0;
        for (keep, &m) in good.iter_mut().zip(means) {
            if *keep && (m - centre).abs() > factor * spread {
                *keep = false;
                n_rejected += 1;
            }
        }

        tracing::debug!(
            "Bad column round {}: median={:.3}, std={:.3}, rejected {}",
            round,
            centre,
            spread,
            n_rejected
        );

        if n_rejected == 0 {
            break;
        }
    }

    good
}

/// Mode-biased background estimate `2.5 × median − 1.5 × mean`.
///
/// Returns None if `values` is empty.
pub fn estimate_background(values: &[f64]) -> Option<f64> {
    Some(2.5 * median(values)? - 1.5 * mean(values)?)
}

/// Half-open range of rows that may hold a candidate.
fn candidate_rows(n_rows: usize, config: &DetectionConfig) -> std::ops::Range<usize> {
    let start = config.trail_length;
    let end = n_rows.saturating_sub(config.n_parallel_overscan + config.trail_length);
    start..end.max(start)
}

/// True if the pixel at `(row, col)` of the background-subtracted frame
/// passes every candidate test.
fn is_candidate(
    subtracted: &ArrayView2<f64>,
    smoothed: &ArrayView2<f64>,
    row: usize,
    col: usize,
    config: &DetectionConfig,
) -> bool {
    let (n_rows, n_cols) = subtracted.dim();
    let value = subtracted[[row, col]];

    if let Some(flux_min) = config.flux_min {
        if value < flux_min {
            return false;
        }
    }

    // Isolation along the readout direction; the ±1 rows are part of the window
    let lo = row.saturating_sub(ISOLATION_RADIUS);
    let hi = (row + ISOLATION_RADIUS).min(n_rows - 1);
    let isolated = (lo..=hi)
        .filter(|&r| r != row)
        .all(|r| value > subtracted[[r, col]]);
    if !isolated {
        return false;
    }

    // Unsharp masking against the four immediate neighbours
    let mut neighbours = Vec::with_capacity(4);
    if row > 0 {
        neighbours.push((row - 1, col));
    }
    if row + 1 < n_rows {
        neighbours.push((row + 1, col));
    }
    if col > 0 {
        neighbours.push((row, col - 1));
    }
    if col + 1 < n_cols {
        neighbours.push((row, col + 1));
    }
    neighbours
        .into_iter()
        .all(|idx| value > config.unsharp_masking_factor * smoothed[idx])
}

/// Find warm pixels in a raw frame and extract their trails.
///
/// `image` is indexed `[[row, column]]` with row 0 nearest the readout
/// register. Each returned line holds
/// `image[row..row + trail_length, column]` (background not subtracted),
/// its location, the supplied `origin` and `date`, and the scalar
/// background estimate. Returns an empty Vec when nothing is found.
pub fn find_warm_pixels(
    image: &ArrayView2<f64>,
    config: &DetectionConfig,
    origin: Option<&str>,
    date: Option<f64>,
) -> Vec<PixelLine> {
    let (n_rows, n_cols) = image.dim();
    if n_rows == 0 || n_cols == 0 || config.trail_length == 0 {
        return Vec::new();
    }

    let means = column_means(image);
    let good = if config.ignore_bad_columns {
        good_columns(&means, config.bad_column_factor, config.bad_column_loops)
    } else {
        vec![true; n_cols]
    };
    let good_means: Vec<f64> = means
        .iter()
        .zip(&good)
        .filter(|&(_, &keep)| keep)
        .map(|(&m, _)| m)
        .collect();

    let Some(background) = estimate_background(&good_means) else {
        tracing::warn!("Every column rejected as bad; no warm pixels searched");
        return Vec::new();
    };
    tracing::debug!(
        "Background {:.3} from {} of {} columns",
        background,
        good_means.len(),
        n_cols
    );

    let subtracted = image.mapv(|v| v - background);
    let smoothed = uniform_filter(&subtracted.view(), config.smooth_width);

    let (subtracted, smoothed) = (subtracted.view(), smoothed.view());

    let mut lines = Vec::new();
    for row in candidate_rows(n_rows, config) {
        for col in config.n_serial_prescan..n_cols {
            if !good[col] {
                continue;
            }
            if !is_candidate(&subtracted, &smoothed, row, col, config) {
                continue;
            }

            let trail = image
                .slice(s![row..row + config.trail_length, col])
                .to_vec();
            let mut line = PixelLine::new(trail)
                .with_location(row as f64, col as f64)
                .with_background(background);
            line.origin = origin.map(str::to_owned);
            line.date = date;
            lines.push(line);
        }
    }

    tracing::info!(
        "Found {} warm pixels in {}x{} frame{}",
        lines.len(),
        n_rows,
        n_cols,
        origin.map(|o| format!(" '{o}'")).unwrap_or_default()
    );

    lines
}
