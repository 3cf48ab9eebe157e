//! Cross-exposure consistency filtering.
//!
//! A genuine trap shows up at the same pixel in most exposures, while
//! cosmic rays and read-noise spikes do not recur. Lines are grouped by
//! location and accepted if their location is occupied in a sufficient
//! fraction of the source images.

use std::collections::{HashMap, HashSet};

use crate::collection::PixelLineCollection;

/// Round a `[row, column]` location to the integer pixel it falls on.
///
/// Negative coordinates clamp to zero and values beyond `u64::MAX`
/// saturate, so every finite or infinite input maps to a key.
fn location_key(location: [f64; 2]) -> (u64, u64) {
    let row = location[0].round().max(0.0) as u64;
    let column = location[1].round().max(0.0) as u64;
    (row, column)
}

impl PixelLineCollection {
    /// Indices (in collection order) of lines whose location recurs across
    /// at least `fraction_present` of the distinct source images.
    ///
    /// Occurrences are counted per line, not per image: two lines from the
    /// same image at the same location count twice. Lines without a
    /// location are never returned. A missing origin counts as one
    /// distinct origin.
    ///
    /// # Arguments
    /// * `fraction_present` - Minimum ratio of occurrences at a location to
    ///   the number of distinct origins, usually in `(0, 1]`
    ///
    /// # Returns
    /// Ascending indices, ready for [`PixelLineCollection::subset`]
    pub fn find_consistent_lines(&self, fraction_present: f64) -> Vec<usize> {
        let n_images = self
            .iter()
            .map(|line| line.origin.as_deref())
            .collect::<HashSet<_>>()
            .len();
        if n_images == 0 {
            return Vec::new();
        }

        let keys: Vec<Option<(u64, u64)>> = self
            .iter()
            .map(|line| line.location.map(location_key))
            .collect();

        let mut counts: HashMap<(u64, u64), usize> = HashMap::new();
        for key in keys.iter().flatten() {
            *counts.entry(*key).or_insert(0) += 1;
        }

        let consistent: Vec<usize> = keys
            .iter()
            .enumerate()
            .filter_map(|(index, key)| {
                let count = counts.get(key.as_ref()?)?;
                (*count as f64 / n_images as f64 >= fraction_present).then_some(index)
            })
            .collect();

        tracing::info!(
            "{} of {} lines consistent across {} images (fraction_present={})",
            consistent.len(),
            self.n_lines(),
            n_images,
            fraction_present
        );

        consistent
    }
}
