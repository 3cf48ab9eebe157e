//! Uniform (box) filtering with reflected edges.
//!
//! Edge handling mirrors about the array boundary including the edge
//! sample (`d c b a | a b c d | d c b a`). For an even `size` the window
//! extends one pixel further backward than forward.

use ndarray::{Array2, ArrayView2, Axis};

/// Map a possibly out-of-range index into `0..len` by half-sample reflection.
fn reflect_index(index: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - 1 - i;
    }
    i as usize
}

/// Box-average a single 1D lane in place using a scratch copy of its input.
fn filter_lane(input: &[f64], output: &mut [f64], size: usize) {
    let len = input.len();
    let back = (size / 2) as isize;
    let forward = (size - 1 - size / 2) as isize;
    let norm = size as f64;

    for (i, out) in output.iter_mut().enumerate() {
        let center = i as isize;
        let sum: f64 = (center - back..=center + forward)
            .map(|j| input[reflect_index(j, len)])
            .sum();
        *out = sum / norm;
    }
}

fn filter_along_axis(image: &ArrayView2<f64>, axis: Axis, size: usize) -> Array2<f64> {
    let mut output = Array2::<f64>::zeros(image.dim());
    for (lane_in, mut lane_out) in image.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        let input: Vec<f64> = lane_in.iter().copied().collect();
        let mut smoothed = vec![0.0; input.len()];
        filter_lane(&input, &mut smoothed, size);
        for (dst, src) in lane_out.iter_mut().zip(smoothed) {
            *dst = src;
        }
    }
    output
}

/// Apply a `size`×`size` uniform filter to `image`.
///
/// `size` of 0 or 1 returns a copy of the input. Empty images are returned
/// unchanged.
pub fn uniform_filter(image: &ArrayView2<f64>, size: usize) -> Array2<f64> {
    if size <= 1 || image.is_empty() {
        return image.to_owned();
    }
    let rows_done = filter_along_axis(image, Axis(0), size);
    filter_along_axis(&rows_done.view(), Axis(1), size)
}
