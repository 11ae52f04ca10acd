//! moleseg-filter - Smoothing and convolution
//!
//! - 2-D convolution with arbitrary kernels
//! - Separable Gaussian and box blur with replicate border
//! - Exact block sums and unrounded weighted means for adaptive thresholding

pub mod block_conv;
pub mod convolve;
mod error;
pub mod kernel;

pub use error::{FilterError, FilterResult};
pub use kernel::Kernel;

pub use block_conv::block_sum_map;
pub use convolve::{box_blur, convolve_gray, gaussian_blur, local_mean_map};
pub use kernel::{box_weights, default_sigma, gaussian_weights};
