//! Warm pixel trails for CCD charge-trap characterization.
//!
//! Finds isolated bright pixels in calibration frames, keeps the ones that
//! recur at the same location across exposures, and averages their trails
//! in bins of row, flux, date and background. The stacked trails are the
//! input to a charge transfer inefficiency model.
//!
//! # Pipeline
//!
//! ```rust,ignore
//! use warm_pixels::{detect_in_frames, DetectionConfig, Frame, StackingConfig};
//!
//! let frames: Vec<Frame> = load_frames()?;
//! let lines = detect_in_frames(&frames, &DetectionConfig::default());
//!
//! let consistent = lines.subset(&lines.find_consistent_lines(0.9));
//! let stacked = consistent.generate_stacked_lines_from_bins(&StackingConfig::default())?;
//! stacked.lines.save(Path::new("stacked_lines.json"))?;
//! ```

pub mod algo;
pub mod batch;
pub mod collection;
pub mod consistency;
pub mod image_proc;
pub mod pixel_line;
pub mod stacking;

pub use batch::{detect_in_frames, Frame};
pub use collection::PixelLineCollection;
pub use image_proc::detection::{find_warm_pixels, DetectionConfig};
pub use pixel_line::{LineStatistic, PixelLine};
pub use stacking::{BinAxis, BinInfo, BinScale, StackedLines, StackingConfig, StackingError};
