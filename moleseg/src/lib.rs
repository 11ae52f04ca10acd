//! moleseg - Lesion segmentation for mole measurement
//!
//! Given a photo of skin and a seed point tapped on a mole (or on a
//! calibration coin), segment the object under the seed and report the
//! circle that encloses it.
//!
//! # Overview
//!
//! - Channel extraction and Gaussian smoothing
//! - Adaptive thresholding into a binary mask
//! - Binary morphology to remove hairs and bridge reflections
//! - Connected-component labeling, edge pruning, enclosing circle
//! - [`auto_encircle`] and its mole and coin wrappers chain all of the above
//!
//! # Example
//!
//! ```
//! use moleseg::{ChannelOrder, EncircleParams, SeedPoint, auto_encircle};
//! use moleseg::{Pix, PixelDepth};
//!
//! // A dark square on a bright field, samples stored RGB
//! let mut pm = Pix::new(120, 100, PixelDepth::Bit32).unwrap().to_mut();
//! for y in 0..100 {
//!     for x in 0..120 {
//!         let inside = (50..70).contains(&x) && (40..60).contains(&y);
//!         let v = if inside { 60 } else { 220 };
//!         pm.set_rgb(x, y, v, v, v).unwrap();
//!     }
//! }
//! let image: Pix = pm.into();
//!
//! let result = auto_encircle(
//!     &image,
//!     SeedPoint::new(60, 50),
//!     &EncircleParams::mole(),
//!     ChannelOrder::Rgb,
//! )
//! .unwrap();
//! assert!(result.circle.radius > 10.0);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use moleseg_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use moleseg_color as threshold;
pub use moleseg_filter as filter;
pub use moleseg_io as io;
pub use moleseg_morph as morph;
pub use moleseg_region as region;

pub mod encircle;

pub use encircle::{
    CoinChoice, CoinEstimate, EncircleError, EncircleParams, EncircleResult, ObjectType,
    auto_encircle, auto_encircle_coin, auto_encircle_mole,
};
pub use moleseg_region::{CircleFitMethod, CircleFitOptions, EnclosingCircle, SeedPoint};
