//! moleseg-color - Thresholding
//!
//! Turns an intensity image (usually one extracted color channel, see
//! [`moleseg_core::Pix::extract_channel`]) into a binary mask.

mod error;
pub mod threshold;

pub use error::{ColorError, ColorResult};
pub use threshold::{
    AdaptiveMethod, AdaptiveThresholdOptions, ThresholdType, adaptive_threshold,
    threshold_to_binary,
};
