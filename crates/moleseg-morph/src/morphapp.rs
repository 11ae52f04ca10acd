//! Operation selector
//!
//! [`morphology_ex`] dispatches on a [`MorphOp`] value so callers can keep
//! the operation as a plain parameter.

use crate::binary::{black_hat, close, dilate, erode, gradient, open, top_hat};
use crate::{MorphResult, Sel};
use moleseg_core::Pix;

/// Morphological operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MorphOp {
    Erode,
    Dilate,
    /// Erode then dilate
    Open,
    /// Dilate then erode (border-safe)
    Close,
    /// Dilation minus erosion
    Gradient,
    /// Input minus opening
    TopHat,
    /// Closing minus input
    BlackHat,
}

/// Apply `op` to a 1 bpp mask with structuring element `sel`.
pub fn morphology_ex(pix: &Pix, op: MorphOp, sel: &Sel) -> MorphResult<Pix> {
    match op {
        MorphOp::Erode => erode(pix, sel),
        MorphOp::Dilate => dilate(pix, sel),
        MorphOp::Open => open(pix, sel),
        MorphOp::Close => close(pix, sel),
        MorphOp::Gradient => gradient(pix, sel),
        MorphOp::TopHat => top_hat(pix, sel),
        MorphOp::BlackHat => black_hat(pix, sel),
    }
}
