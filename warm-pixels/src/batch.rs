//! Warm pixel detection over a set of calibration frames.
//!
//! Each frame is searched independently on the rayon thread pool; the
//! per-frame results are then merged into one collection in input order.

use ndarray::Array2;
use rayon::prelude::*;

use crate::collection::PixelLineCollection;
use crate::image_proc::detection::{find_warm_pixels, DetectionConfig};

/// One calibration exposure and the metadata copied onto its detections.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel values in electrons, `[[row, column]]`, row 0 at the readout register
    pub image: Array2<f64>,
    pub origin: Option<String>,
    pub date: Option<f64>,
}

impl Frame {
    pub fn new(image: Array2<f64>) -> Self {
        Self {
            image,
            origin: None,
            date: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_date(mut self, date: f64) -> Self {
        self.date = Some(date);
        self
    }
}

/// Detect warm pixels in every frame and collect them in frame order.
pub fn detect_in_frames(frames: &[Frame], config: &DetectionConfig) -> PixelLineCollection {
    let per_frame: Vec<_> = frames
        .par_iter()
        .map(|frame| {
            find_warm_pixels(
                &frame.image.view(),
                config,
                frame.origin.as_deref(),
                frame.date,
            )
        })
        .collect();

    let mut collection = PixelLineCollection::new();
    for lines in per_frame {
        collection.append(lines);
    }

    tracing::info!(
        "Detected {} warm pixel lines across {} frames",
        collection.n_lines(),
        frames.len()
    );

    collection
}
