//! moleseg-morph - Binary morphology
//!
//! - Structuring elements: rectangle, cross and ellipse kernels, and
//!   conversion to and from 1 bpp images
//! - Erosion, dilation, opening, closing
//! - Morphological gradient, top-hat and black-hat
//! - [`morphology_ex`] for selecting the operation at run time

pub mod binary;
mod error;
pub mod morphapp;
pub mod sel;

pub use error::{MorphError, MorphResult};
pub use sel::{KernelShape, Sel};

pub use binary::{black_hat, close, dilate, erode, gradient, open, top_hat};
pub use morphapp::{MorphOp, morphology_ex};
