//! Multi-dimensional binning and averaging of pixel lines.
//!
//! Lines are binned independently along four metadata axes (row, flux,
//! date and background), each with its own bin count, range and spacing.
//! Every populated cell of the resulting 4-D grid yields one line holding
//! the pixel-wise mean of its members.
//!
//! # Algorithm
//!
//! 1. Resolve each axis into lower edges (linear or log10 spacing). A single
//!    requested bin, or `min == max`, collapses the axis to one bin, as does
//!    a single declared bound that the data lies wholly beyond.
//! 2. Digitize every line on every axis; lines outside any axis range are
//!    discarded.
//! 3. Accumulate each surviving line into its cell of the row-major
//!    `(row, date, background, flux)` grid.
//! 4. Emit populated cells in grid order with their running mean and the
//!    standard error of that mean.

mod accumulator;
pub mod bins;
pub mod config;

use thiserror::Error;

use crate::collection::PixelLineCollection;
use crate::pixel_line::PixelLine;
use accumulator::TrailAccumulator;
use bins::AxisBins;

pub use bins::{BinAxis, BinScale};
pub use config::StackingConfig;

/// Errors that can occur while stacking a collection.
#[derive(Error, Debug, PartialEq)]
pub enum StackingError {
    #[error("line {index} has {found} pixels, expected {expected} like the first line")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {index} is missing its {field}, required for stacking")]
    MissingMetadata { index: usize, field: &'static str },
    #[error("line {index} has no pixel data")]
    MissingData { index: usize },
    #[error("invalid {axis} range [{min}, {max}]")]
    InvalidRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{axis} axis must have at least one bin")]
    NoBins { axis: &'static str },
}

/// Edges of every axis: sorted unique lower edges with the maximum appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinInfo {
    pub row: Vec<f64>,
    pub flux: Vec<f64>,
    pub date: Vec<f64>,
    pub background: Vec<f64>,
}

/// Result of [`PixelLineCollection::generate_stacked_lines_from_bins`].
#[derive(Debug, Clone, PartialEq)]
pub struct StackedLines {
    pub lines: PixelLineCollection,
    /// Present when `return_bin_info` was requested
    pub bin_info: Option<BinInfo>,
}

/// Metadata of one line, validated for stacking.
struct BinningKey<'a> {
    data: &'a [f64],
    row: f64,
    flux: f64,
    date: f64,
    background: f64,
}

fn binning_key(index: usize, line: &PixelLine) -> Result<BinningKey<'_>, StackingError> {
    let missing = |field| StackingError::MissingMetadata { index, field };
    Ok(BinningKey {
        data: line
            .data
            .as_deref()
            .ok_or(StackingError::MissingData { index })?,
        row: line.row().ok_or_else(|| missing("location"))?,
        flux: line.flux.ok_or_else(|| missing("flux"))?,
        date: line.date.ok_or_else(|| missing("date"))?,
        background: line.background.ok_or_else(|| missing("background"))?,
    })
}

fn validate(collection: &PixelLineCollection) -> Result<Vec<BinningKey<'_>>, StackingError> {
    let keys = collection
        .iter()
        .enumerate()
        .map(|(index, line)| binning_key(index, line))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(first) = keys.first() {
        let expected = first.data.len();
        if let Some((index, key)) = keys
            .iter()
            .enumerate()
            .find(|(_, key)| key.data.len() != expected)
        {
            return Err(StackingError::ShapeMismatch {
                index,
                expected,
                found: key.data.len(),
            });
        }
    }

    Ok(keys)
}

/// The four resolved axes in grid order.
struct Grid {
    row: AxisBins,
    date: AxisBins,
    background: AxisBins,
    flux: AxisBins,
}

impl Grid {
    fn n_cells(&self) -> usize {
        self.row.len() * self.date.len() * self.background.len() * self.flux.len()
    }

    /// Row-major cell id, or None if the line falls outside any axis.
    fn cell(&self, key: &BinningKey) -> Option<usize> {
        let r = self.row.digitize(key.row)?;
        let d = self.date.digitize(key.date)?;
        let b = self.background.digitize(key.background)?;
        let f = self.flux.digitize(key.flux)?;
        Some(((r * self.date.len() + d) * self.background.len() + b) * self.flux.len() + f)
    }

    /// Per-axis bin indices of a cell id.
    fn unravel(&self, cell: usize) -> (usize, usize, usize, usize) {
        let f = cell % self.flux.len();
        let rest = cell / self.flux.len();
        let b = rest % self.background.len();
        let rest = rest / self.background.len();
        let d = rest % self.date.len();
        let r = rest / self.date.len();
        (r, d, b, f)
    }

    fn bin_info(&self) -> BinInfo {
        BinInfo {
            row: self.row.edges(),
            flux: self.flux.edges(),
            date: self.date.edges(),
            background: self.background.edges(),
        }
    }
}

/// Bin info when some axis range could not be resolved: declared edges
/// where available, empty otherwise.
fn partial_bin_info(axes: [Option<&AxisBins>; 4]) -> BinInfo {
    let edges = |axis: Option<&AxisBins>| axis.map(AxisBins::edges).unwrap_or_default();
    let [row, flux, date, background] = axes;
    BinInfo {
        row: edges(row),
        flux: edges(flux),
        date: edges(date),
        background: edges(background),
    }
}

impl PixelLineCollection {
    /// Bin lines by row, flux, date and background, and average each bin.
    ///
    /// All lines must carry data of one common length plus a location,
    /// flux, date and background. Lines outside the range of any axis are
    /// dropped. The returned lines come in row-major
    /// `(row, date, background, flux)` order, one per populated bin, with
    /// `location = [row lower edge, 0]` and `date`, `background` and `flux`
    /// set to the lower edges of the bin.
    ///
    /// # Arguments
    /// * `config` - Bin count, range and spacing per axis, and whether to
    ///   return the bin edges
    ///
    /// # Returns
    /// * `Ok(StackedLines)` - Averaged lines, with `noise` holding the
    ///   standard error of the mean, plus the edges when requested
    /// * `Err(StackingError)` - On mismatched lengths, missing metadata or an
    ///   unusable axis range; nothing is stacked in that case
    pub fn generate_stacked_lines_from_bins(
        &self,
        config: &StackingConfig,
    ) -> Result<StackedLines, StackingError> {
        let keys = validate(self)?;

        let collect = |f: fn(&BinningKey) -> f64| keys.iter().map(f).collect::<Vec<_>>();
        let row = AxisBins::resolve("row", &config.row, &collect(|k| k.row))?;
        let flux = AxisBins::resolve("flux", &config.flux, &collect(|k| k.flux))?;
        let date = AxisBins::resolve("date", &config.date, &collect(|k| k.date))?;
        let background =
            AxisBins::resolve("background", &config.background, &collect(|k| k.background))?;

        let grid = match (row, date, background, flux) {
            (Some(row), Some(date), Some(background), Some(flux)) => Grid {
                row,
                date,
                background,
                flux,
            },
            (row, date, background, flux) => {
                // Only reachable with no lines and data-derived bounds
                let bin_info = config.return_bin_info.then(|| {
                    partial_bin_info([
                        row.as_ref(),
                        flux.as_ref(),
                        date.as_ref(),
                        background.as_ref(),
                    ])
                });
                return Ok(StackedLines {
                    lines: PixelLineCollection::new(),
                    bin_info,
                });
            }
        };

        let length = keys.first().map_or(0, |k| k.data.len());
        let mut cells: Vec<TrailAccumulator> =
            (0..grid.n_cells()).map(|_| TrailAccumulator::new(length)).collect();

        let mut n_discarded = 0;
        for key in &keys {
            match grid.cell(key) {
                Some(cell) => cells[cell].push(key.data),
                None => n_discarded += 1,
            }
        }
        if n_discarded > 0 {
            tracing::warn!(
                "Discarded {} of {} lines outside the binning range",
                n_discarded,
                keys.len()
            );
        }

        let lines: PixelLineCollection = cells
            .into_iter()
            .enumerate()
            .filter(|(_, acc)| acc.count() > 0)
            .map(|(cell, acc)| {
                let (r, d, b, f) = grid.unravel(cell);
                PixelLine {
                    data: Some(acc.mean().to_vec()),
                    noise: acc.standard_error(),
                    origin: None,
                    location: Some([grid.row.lower_edge(r), 0.0]),
                    date: Some(grid.date.lower_edge(d)),
                    background: Some(grid.background.lower_edge(b)),
                    flux: Some(grid.flux.lower_edge(f)),
                    n_stacked: acc.count(),
                }
            })
            .collect();

        tracing::info!(
            "Stacked {} lines into {} of {} bins",
            keys.len() - n_discarded,
            lines.n_lines(),
            grid.n_cells()
        );

        Ok(StackedLines {
            lines,
            bin_info: config.return_bin_info.then(|| grid.bin_info()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(data: Vec<f64>, row: f64) -> PixelLine {
        PixelLine::new(data)
            .with_location(row, 3.0)
            .with_date(1.0)
            .with_background(0.0)
    }

    /// Three trails at rows 0..=2 with fluxes 3, 2.5 and 2
    fn three_rows() -> PixelLineCollection {
        PixelLineCollection::from_lines(vec![
            line(vec![3.0, 2.5, 2.0], 0.0),
            line(vec![2.5, 2.0, 1.5], 1.0),
            line(vec![2.0, 1.5, 1.0], 2.0),
        ])
    }

    fn three_row_bins_log_flux() -> StackingConfig {
        StackingConfig {
            row: BinAxis::new(3, BinScale::Linear).with_range(0.0, 20.0),
            flux: BinAxis::new(1, BinScale::Log).with_range(1.0, 10.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_column_wise_mean() {
        let stacked = three_rows()
            .generate_stacked_lines_from_bins(&three_row_bins_log_flux())
            .unwrap();

        assert_eq!(stacked.lines.n_lines(), 1);
        assert!(stacked.bin_info.is_none());

        let line = &stacked.lines.lines()[0];
        assert_eq!(line.n_stacked, 3);
        let data = line.data.as_ref().unwrap();
        for (value, expected) in data.iter().zip([2.5, 2.0, 1.5]) {
            assert_relative_eq!(*value, expected, epsilon = 1e-12);
        }
        assert_eq!(line.location, Some([0.0, 0.0]));
        assert_eq!(line.flux, Some(1.0));
        assert_eq!(line.date, Some(1.0));
        assert_eq!(line.background, Some(0.0));

        // Sample std of each column is 0.5
        for sem in line.noise.as_ref().unwrap() {
            assert_relative_eq!(*sem, 0.5 / 3f64.sqrt(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_lines_above_max_are_discarded() {
        let mut collection = three_rows();
        collection.append(vec![line(vec![15.0, 1.0, 1.0], 1.0)]);

        let stacked = collection
            .generate_stacked_lines_from_bins(&three_row_bins_log_flux())
            .unwrap();

        let total: usize = stacked.lines.n_stacked().iter().sum();
        assert_eq!(total, collection.n_lines() - 1);
        assert_relative_eq!(stacked.lines.lines()[0].data.as_ref().unwrap()[0], 2.5);
    }

    #[test]
    fn test_bins_in_row_major_order() {
        let collection = PixelLineCollection::from_lines(vec![
            line(vec![500.0, 1.0], 15.0),
            line(vec![5.0, 1.0], 15.0),
            line(vec![50.0, 2.0], 2.0),
            line(vec![5.0, 3.0], 2.0),
            line(vec![7.0, 5.0], 3.0),
        ]);
        let config = StackingConfig {
            row: BinAxis::new(2, BinScale::Linear).with_range(0.0, 20.0),
            flux: BinAxis::new(3, BinScale::Log).with_range(1.0, 1000.0),
            return_bin_info: true,
            ..Default::default()
        };

        let stacked = collection.generate_stacked_lines_from_bins(&config).unwrap();
        let lines = stacked.lines.lines();

        assert_eq!(lines.len(), 4);
        assert_eq!(stacked.lines.n_stacked(), vec![2, 1, 1, 1]);

        // (row 0, flux 1..10): mean of [5, 3] and [7, 5]
        assert_eq!(lines[0].location, Some([0.0, 0.0]));
        assert_relative_eq!(lines[0].flux.unwrap(), 1.0);
        assert_eq!(lines[0].data, Some(vec![6.0, 4.0]));
        // (row 0, flux 10..100)
        assert_relative_eq!(lines[1].flux.unwrap(), 10.0, max_relative = 1e-12);
        assert!(lines[1].noise.is_none());
        // (row 10, flux 1..10) then (row 10, flux 100..1000)
        assert_eq!(lines[2].location, Some([10.0, 0.0]));
        assert_relative_eq!(lines[2].flux.unwrap(), 1.0);
        assert_eq!(lines[3].location, Some([10.0, 0.0]));
        assert_relative_eq!(lines[3].flux.unwrap(), 100.0, max_relative = 1e-12);

        let info = stacked.bin_info.unwrap();
        assert_eq!(info.row, vec![0.0, 10.0, 20.0]);
        assert_eq!(info.flux.len(), 4);
        for (edge, expected) in info.flux.iter().zip([1.0, 10.0, 100.0, 1000.0]) {
            assert_relative_eq!(*edge, expected, max_relative = 1e-12);
        }
        assert_eq!(info.date, vec![1.0]);
        assert_eq!(info.background, vec![0.0]);
    }

    #[test]
    fn test_date_and_background_axes() {
        let collection = PixelLineCollection::from_lines(vec![
            line(vec![1.0], 0.0).with_date(10.0).with_background(5.0),
            line(vec![3.0], 0.0).with_date(10.0).with_background(25.0),
            line(vec![5.0], 0.0).with_date(30.0).with_background(5.0),
            line(vec![7.0], 0.0).with_date(30.0).with_background(5.0),
        ]);
        let config = StackingConfig {
            date: BinAxis::new(2, BinScale::Linear),
            background: BinAxis::new(2, BinScale::Linear),
            return_bin_info: true,
            ..Default::default()
        };

        let stacked = collection.generate_stacked_lines_from_bins(&config).unwrap();
        let lines = stacked.lines.lines();

        // (date 10, bg 5), (date 10, bg 15), (date 20, bg 5)
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].data, Some(vec![1.0]));
        assert_eq!((lines[0].date, lines[0].background), (Some(10.0), Some(5.0)));
        assert_eq!(lines[1].data, Some(vec![3.0]));
        assert_eq!((lines[1].date, lines[1].background), (Some(10.0), Some(15.0)));
        assert_eq!(lines[2].data, Some(vec![6.0]));
        assert_eq!(lines[2].n_stacked, 2);
        assert_eq!((lines[2].date, lines[2].background), (Some(20.0), Some(5.0)));

        let info = stacked.bin_info.unwrap();
        assert_eq!(info.date, vec![10.0, 20.0, 30.0]);
        assert_eq!(info.background, vec![5.0, 15.0, 25.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut collection = three_rows();
        collection.append(vec![line(vec![1.0, 2.0], 0.0)]);

        let err = collection
            .generate_stacked_lines_from_bins(&StackingConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            StackingError::ShapeMismatch {
                index: 3,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_missing_metadata() {
        let collection = PixelLineCollection::from_lines(vec![
            line(vec![1.0], 0.0),
            PixelLine::new(vec![1.0]).with_location(0.0, 0.0).with_background(0.0),
        ]);
        let err = collection
            .generate_stacked_lines_from_bins(&StackingConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            StackingError::MissingMetadata {
                index: 1,
                field: "date"
            }
        );

        let collection = PixelLineCollection::from_lines(vec![PixelLine::default()]);
        assert_eq!(
            collection
                .generate_stacked_lines_from_bins(&StackingConfig::default())
                .unwrap_err(),
            StackingError::MissingData { index: 0 }
        );
    }

    #[test]
    fn test_degenerate_range_is_single_bin() {
        let collection = PixelLineCollection::from_lines(vec![
            line(vec![1.0, 1.0], 4.0),
            line(vec![3.0, 1.0], 4.0),
        ]);
        let config = StackingConfig {
            row: BinAxis::new(5, BinScale::Linear),
            ..Default::default()
        };
        let stacked = collection.generate_stacked_lines_from_bins(&config).unwrap();
        assert_eq!(stacked.lines.n_lines(), 1);
        assert_eq!(stacked.lines.lines()[0].data, Some(vec![2.0, 1.0]));
        assert_eq!(stacked.lines.lines()[0].location, Some([4.0, 0.0]));
    }

    #[test]
    fn test_single_declared_max_below_data_stacks_nothing() {
        let collection = PixelLineCollection::from_lines(vec![
            line(vec![50.0, 1.0], 0.0),
            line(vec![60.0, 2.0], 1.0),
        ]);
        let config = StackingConfig {
            flux: BinAxis {
                max: Some(10.0),
                ..BinAxis::default()
            },
            ..Default::default()
        };

        let stacked = collection.generate_stacked_lines_from_bins(&config).unwrap();
        assert!(stacked.lines.is_empty());
    }

    #[test]
    fn test_single_declared_min_above_data_keeps_lines() {
        let collection = PixelLineCollection::from_lines(vec![
            line(vec![50.0, 1.0], 3.0),
            line(vec![60.0, 3.0], 3.0),
        ]);
        let config = StackingConfig {
            row: BinAxis {
                min: Some(100.0),
                ..BinAxis::default()
            },
            ..Default::default()
        };

        let stacked = collection.generate_stacked_lines_from_bins(&config).unwrap();
        assert_eq!(stacked.lines.n_lines(), 1);
        let line = &stacked.lines.lines()[0];
        assert_eq!(line.n_stacked, 2);
        assert_eq!(line.data, Some(vec![55.0, 2.0]));
        assert_eq!(line.location, Some([100.0, 0.0]));
    }

    #[test]
    fn test_inverted_declared_range_is_an_error() {
        let config = StackingConfig {
            row: BinAxis::new(1, BinScale::Linear).with_range(10.0, 0.0),
            ..Default::default()
        };
        assert_eq!(
            three_rows()
                .generate_stacked_lines_from_bins(&config)
                .unwrap_err(),
            StackingError::InvalidRange {
                axis: "row",
                min: 10.0,
                max: 0.0
            }
        );
    }

    #[test]
    fn test_empty_collection() {
        let config = StackingConfig {
            row: BinAxis::new(2, BinScale::Linear).with_range(0.0, 10.0),
            return_bin_info: true,
            ..Default::default()
        };
        let stacked = PixelLineCollection::new()
            .generate_stacked_lines_from_bins(&config)
            .unwrap();

        assert!(stacked.lines.is_empty());
        let info = stacked.bin_info.unwrap();
        assert_eq!(info.row, vec![0.0, 5.0, 10.0]);
        assert!(info.flux.is_empty());
    }

    #[test]
    fn test_everything_out_of_range() {
        let config = StackingConfig {
            flux: BinAxis::new(2, BinScale::Linear).with_range(100.0, 200.0),
            ..Default::default()
        };
        let stacked = three_rows().generate_stacked_lines_from_bins(&config).unwrap();
        assert!(stacked.lines.is_empty());
    }
}
