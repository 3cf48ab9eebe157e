//! A single pixel trail and the metadata needed to bin it.
//!
//! A [`PixelLine`] is either one raw detection (a warm pixel plus the
//! `trail_length` pixels behind it along the parallel direction) or the
//! pixel-wise average of many detections produced by stacking.

use serde::{Deserialize, Serialize};

use crate::algo::{mean, median, std_dev};

mod float_json;

/// Summary statistic evaluated over the pixel values of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatistic {
    Mean,
    Median,
    /// Population standard deviation
    Std,
}

impl LineStatistic {
    /// Evaluate this statistic over `values`. Returns None for empty input.
    pub fn evaluate(&self, values: &[f64]) -> Option<f64> {
        match self {
            LineStatistic::Mean => mean(values),
            LineStatistic::Median => median(values),
            LineStatistic::Std => std_dev(values),
        }
    }
}

/// One trail of pixel values (electrons) with its source metadata.
///
/// Fields are public for inspection and serialization, but a line is
/// treated as immutable once built: `flux` is derived from `data` only in
/// [`PixelLine::new`] and never recomputed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelLine {
    /// Pixel values, background not subtracted
    #[serde(default, with = "float_json::values")]
    pub data: Option<Vec<f64>>,

    /// Per-pixel uncertainty; set on stacked lines only
    #[serde(default, with = "float_json::values")]
    pub noise: Option<Vec<f64>>,

    /// Identifier of the source image
    #[serde(default)]
    pub origin: Option<String>,

    /// `[row, column]`: row is the distance from the readout register minus one
    #[serde(default, with = "float_json::pair")]
    pub location: Option<[f64; 2]>,

    /// Observation timestamp, e.g. a Julian date
    #[serde(default, with = "float_json::scalar")]
    pub date: Option<f64>,

    /// Local background level at detection time
    #[serde(default, with = "float_json::scalar")]
    pub background: Option<f64>,

    /// Peak or representative charge of the trail
    #[serde(default, with = "float_json::scalar")]
    pub flux: Option<f64>,

    /// Number of raw detections merged into this record
    #[serde(default)]
    pub n_stacked: usize,
}

impl PixelLine {
    /// Create a line from its pixel values.
    ///
    /// # Arguments
    /// * `data` - Trail pixel values in electrons, leading pixel first
    ///
    /// # Returns
    /// A line with `flux` set to the largest non-NaN value of `data` (None
    /// when every value is NaN or `data` is empty) and all other metadata
    /// unset.
    pub fn new(data: Vec<f64>) -> Self {
        let flux = data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max);
        Self {
            data: Some(data),
            flux,
            ..Self::default()
        }
    }

    /// Tag the line with the identifier of its source image.
    ///
    /// Lines sharing an origin count as one image when filtering for
    /// consistency.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the pixel coordinate of the leading pixel.
    ///
    /// # Arguments
    /// * `row` - Distance from the readout register minus one
    /// * `column` - Serial position of the pixel
    pub fn with_location(mut self, row: f64, column: f64) -> Self {
        self.location = Some([row, column]);
        self
    }

    pub fn with_date(mut self, date: f64) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_background(mut self, background: f64) -> Self {
        self.background = Some(background);
        self
    }

    /// Override the flux derived from the data.
    pub fn with_flux(mut self, flux: f64) -> Self {
        self.flux = Some(flux);
        self
    }

    /// Number of pixels in the trail, or None when there is no data.
    pub fn length(&self) -> Option<usize> {
        self.data.as_ref().map(Vec::len)
    }

    /// Row coordinate of the line, if located.
    pub fn row(&self) -> Option<f64> {
        self.location.map(|[row, _]| row)
    }

    /// Evaluate `statistic` over the pixel values, None without data.
    pub fn statistic(&self, statistic: LineStatistic) -> Option<f64> {
        self.data.as_deref().and_then(|data| statistic.evaluate(data))
    }
}
