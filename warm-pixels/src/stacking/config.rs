//! Stacking parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bins::BinAxis;

/// Binning along the four metadata axes used to group lines for stacking.
///
/// Every axis defaults to a single bin spanning the data, which groups
/// nothing apart but still requires the attribute on every line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingConfig {
    /// Binning of `location[0]`
    pub row: BinAxis,
    pub flux: BinAxis,
    pub date: BinAxis,
    pub background: BinAxis,

    /// Also return the edges of every axis
    pub return_bin_info: bool,
}

impl StackingConfig {
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
