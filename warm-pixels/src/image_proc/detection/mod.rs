//! Warm pixel detection in raw calibration frames.
//!
//! # Module Organization
//!
//! - **config**: Detection parameters and their JSON persistence
//! - **warm_pixels**: Bad column rejection, background estimation and the
//!   candidate predicate that turns isolated bright pixels into trails
//!
//! # Algorithm Overview
//!
//! 1. **Column statistics**: mean of every column, iterative rejection of
//!    columns that sit far from the median of the accepted set
//! 2. **Background**: mode estimate `2.5 × median − 1.5 × mean` of the
//!    accepted column means, subtracted from the whole frame
//! 3. **Candidates**: pixels brighter than every neighbour within ±9 rows
//!    and sharper than the box-smoothed frame around them
//! 4. **Trails**: `trail_length` pixels starting at each candidate row

pub mod config;
pub mod warm_pixels;

pub use config::DetectionConfig;
pub use warm_pixels::{column_means, estimate_background, find_warm_pixels, good_columns};
