//! Warm pixel detection parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Parameters for [`find_warm_pixels`](super::find_warm_pixels).
///
/// Missing fields take their default when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Number of pixels in each extracted trail
    pub trail_length: usize,

    /// Overscan rows at the far end of the parallel direction
    pub n_parallel_overscan: usize,

    /// Prescan columns at the start of the serial direction
    pub n_serial_prescan: usize,

    /// Reject columns whose mean stands out from the rest
    pub ignore_bad_columns: bool,

    /// Rejection threshold in standard deviations of the column means
    pub bad_column_factor: f64,

    /// Number of bad column rejection rounds
    pub bad_column_loops: usize,

    /// Box filter width for the smoothed comparison frame
    pub smooth_width: usize,

    /// A candidate must exceed this multiple of the smoothed value at each
    /// of its four immediate neighbours
    pub unsharp_masking_factor: f64,

    /// Minimum background-subtracted value for a candidate
    pub flux_min: Option<f64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            trail_length: 9,
            n_parallel_overscan: 0,
            n_serial_prescan: 0,
            ignore_bad_columns: true,
            bad_column_factor: 3.5,
            bad_column_loops: 5,
            smooth_width: 3,
            unsharp_masking_factor: 4.0,
            flux_min: None,
        }
    }
}

impl DetectionConfig {
    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
