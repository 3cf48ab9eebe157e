//! General numeric helpers shared by detection and stacking.

pub mod stats;

pub use stats::{mean, median, std_dev};
