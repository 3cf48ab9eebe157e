//! Per-axis binning: edge computation and digitization.

use serde::{Deserialize, Serialize};

use super::StackingError;

/// Spacing of bin edges along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinScale {
    #[default]
    Linear,
    /// Equal spacing in log10; both bounds must be positive
    Log,
}

/// Binning request for one metadata axis.
///
/// A bound left as `None` is taken from the data being stacked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinAxis {
    pub n_bins: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub scale: BinScale,
}

impl Default for BinAxis {
    fn default() -> Self {
        Self {
            n_bins: 1,
            min: None,
            max: None,
            scale: BinScale::Linear,
        }
    }
}

impl BinAxis {
    pub fn new(n_bins: usize, scale: BinScale) -> Self {
        Self {
            n_bins,
            scale,
            ..Self::default()
        }
    }

    /// Fix both bounds instead of deriving them from the data.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Resolved bins for one axis.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AxisBins {
    lower_edges: Vec<f64>,
    max: f64,
    degenerate: bool,
}

impl AxisBins {
    /// Resolve `axis` against the observed `values`.
    ///
    /// Returns `Ok(None)` when a bound must come from the data but there is
    /// no data.
    pub(crate) fn resolve(
        name: &'static str,
        axis: &BinAxis,
        values: &[f64],
    ) -> Result<Option<Self>, StackingError> {
        if axis.n_bins == 0 {
            return Err(StackingError::NoBins { axis: name });
        }

        let observed_min = values.iter().copied().reduce(f64::min);
        let observed_max = values.iter().copied().reduce(f64::max);
        let (Some(min), Some(max)) = (axis.min.or(observed_min), axis.max.or(observed_max)) else {
            return Ok(None);
        };

        // With one declared bound, data lying wholly beyond it collapses the
        // axis onto that bound instead of inverting the range
        let (min, max) = match (axis.min, axis.max) {
            (Some(_), None) if min > max => (min, min),
            (None, Some(_)) if min > max => (max, max),
            _ => (min, max),
        };

        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(StackingError::InvalidRange {
                axis: name,
                min,
                max,
            });
        }

        if axis.n_bins == 1 || min == max {
            return Ok(Some(Self {
                lower_edges: vec![min],
                max,
                degenerate: true,
            }));
        }

        let n = axis.n_bins;
        let lower_edges = match axis.scale {
            BinScale::Linear => (0..n)
                .map(|i| min + (max - min) * i as f64 / n as f64)
                .collect(),
            BinScale::Log => {
                if min <= 0.0 {
                    return Err(StackingError::InvalidRange {
                        axis: name,
                        min,
                        max,
                    });
                }
                let (log_min, log_max) = (min.log10(), max.log10());
                // Pin the first edge so a value equal to `min` never falls below it
                std::iter::once(min)
                    .chain((1..n).map(|i| {
                        10f64.powf(log_min + (log_max - log_min) * i as f64 / n as f64)
                    }))
                    .collect()
            }
        };

        Ok(Some(Self {
            lower_edges,
            max,
            degenerate: false,
        }))
    }

    /// Number of bins actually in use (1 when degenerate).
    pub(crate) fn len(&self) -> usize {
        self.lower_edges.len()
    }

    pub(crate) fn lower_edge(&self, index: usize) -> f64 {
        self.lower_edges[index]
    }

    /// Bin index of `value`, or None if it falls outside the axis range.
    ///
    /// Bins are closed on the left; the last bin also holds `max` itself.
    pub(crate) fn digitize(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value > self.max {
            return None;
        }
        if self.degenerate {
            return Some(0);
        }
        self.lower_edges
            .partition_point(|&edge| edge <= value)
            .checked_sub(1)
    }

    /// Sorted unique lower edges with the axis maximum appended.
    pub(crate) fn edges(&self) -> Vec<f64> {
        let mut edges = self.lower_edges.clone();
        edges.push(self.max);
        edges.sort_by(|a, b| a.total_cmp(b));
        edges.dedup();
        edges
    }
}
