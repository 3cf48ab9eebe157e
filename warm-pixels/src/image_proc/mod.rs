//! Image processing for raw CCD frames.
//!
//! - **filter**: separable box smoothing used for unsharp-mask rejection
//! - **detection**: warm pixel detection and trail extraction

pub mod detection;
pub mod filter;

pub use detection::{find_warm_pixels, DetectionConfig};
pub use filter::uniform_filter;
