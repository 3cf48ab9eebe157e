//! Ordered, appendable collection of pixel lines.
//!
//! The collection owns its [`PixelLine`] members. It only grows through
//! [`PixelLineCollection::append`] (or [`PixelLineCollection::load`]);
//! filtering and stacking return new collections.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pixel_line::{LineStatistic, PixelLine};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixelLineCollection {
    lines: Vec<PixelLine>,
}

impl PixelLineCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing lines, keeping their order.
    pub fn from_lines(lines: Vec<PixelLine>) -> Self {
        Self { lines }
    }

    /// Append lines to the end of the collection, preserving their order.
    ///
    /// # Arguments
    /// * `new_lines` - Lines to add; a `Vec`, another collection's
    ///   `into_lines()` or any iterator of owned lines
    pub fn append<I>(&mut self, new_lines: I)
    where
        I: IntoIterator<Item = PixelLine>,
    {
        self.lines.extend(new_lines);
    }

    pub fn lines(&self) -> &[PixelLine] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PixelLine> {
        self.lines.iter()
    }

    pub fn n_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<PixelLine> {
        self.lines
    }

    /// New collection holding copies of the lines at `indices`.
    ///
    /// # Arguments
    /// * `indices` - Positions to copy, typically from
    ///   [`PixelLineCollection::find_consistent_lines`]
    ///
    /// # Returns
    /// A collection in the order of `indices`. Out-of-range indices are
    /// skipped and repeated indices repeat the line.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let lines = indices
            .iter()
            .filter_map(|&i| self.lines.get(i).cloned())
            .collect();
        Self { lines }
    }

    pub fn data(&self) -> Vec<Option<&[f64]>> {
        self.lines.iter().map(|l| l.data.as_deref()).collect()
    }

    pub fn noise(&self) -> Vec<Option<&[f64]>> {
        self.lines.iter().map(|l| l.noise.as_deref()).collect()
    }

    pub fn origins(&self) -> Vec<Option<&str>> {
        self.lines.iter().map(|l| l.origin.as_deref()).collect()
    }

    pub fn locations(&self) -> Vec<Option<[f64; 2]>> {
        self.lines.iter().map(|l| l.location).collect()
    }

    pub fn dates(&self) -> Vec<Option<f64>> {
        self.lines.iter().map(|l| l.date).collect()
    }

    pub fn backgrounds(&self) -> Vec<Option<f64>> {
        self.lines.iter().map(|l| l.background).collect()
    }

    pub fn fluxes(&self) -> Vec<Option<f64>> {
        self.lines.iter().map(|l| l.flux).collect()
    }

    pub fn lengths(&self) -> Vec<Option<usize>> {
        self.lines.iter().map(PixelLine::length).collect()
    }

    pub fn n_stacked(&self) -> Vec<usize> {
        self.lines.iter().map(|l| l.n_stacked).collect()
    }

    /// Evaluate `statistic` over the data of every line.
    pub fn statistics(&self, statistic: LineStatistic) -> Vec<Option<f64>> {
        self.lines.iter().map(|l| l.statistic(statistic)).collect()
    }

    /// Save all lines to a JSON file.
    ///
    /// NaN and infinite pixel values are written as the strings `"NaN"`,
    /// `"inf"` and `"-inf"` so that [`PixelLineCollection::load`] restores
    /// them.
    ///
    /// # Arguments
    /// * `path` - Destination file, overwritten if present
    ///
    /// # Returns
    /// `Ok(())` on success, or the I/O error from writing the file
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)?;
        tracing::debug!("Saved {} pixel lines to {:?}", self.n_lines(), path);
        Ok(())
    }

    /// Load lines from a JSON file and append them to this collection.
    ///
    /// # Arguments
    /// * `path` - File previously written by [`PixelLineCollection::save`]
    ///
    /// # Returns
    /// `Ok(())` once the lines are appended. A missing file yields the
    /// underlying I/O error and malformed content yields
    /// [`std::io::ErrorKind::InvalidData`]; the collection is left untouched
    /// in both cases.
    pub fn load(&mut self, path: &Path) -> Result<(), std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        let loaded: Vec<PixelLine> = serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tracing::debug!("Loaded {} pixel lines from {:?}", loaded.len(), path);
        self.lines.extend(loaded);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PixelLineCollection {
    type Item = &'a PixelLine;
    type IntoIter = std::slice::Iter<'a, PixelLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl FromIterator<PixelLine> for PixelLineCollection {
    fn from_iter<I: IntoIterator<Item = PixelLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}
