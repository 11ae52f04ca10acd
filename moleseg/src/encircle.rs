//! Seeded auto-encircle pipeline
//!
//! Segments the object under a seed point and fits a circle around it:
//!
//! 1. Extract one color channel (red for moles and dark coins, blue for
//!    shiny coins) and smooth it with a Gaussian blur
//! 2. Adaptive threshold into a mask
//! 3. Label, then drop large components cut by the frame
//! 4. Open with a small ellipse to remove hairs
//! 5. Dilate then erode with the object's kernels to bridge reflections
//! 6. Relabel and fit the circle around the component under the seed
//!
//! The tuned parameter sets live in [`EncircleParams::mole`],
//! [`EncircleParams::dark_coin`] and [`EncircleParams::shiny_coin`].

use std::f64::consts::PI;

use log::{debug, info, trace};
use moleseg_color::{
    AdaptiveMethod, AdaptiveThresholdOptions, ColorError, ThresholdType, adaptive_threshold,
};
use moleseg_core::{ChannelOrder, ColorChannel, Pix, Point};
use moleseg_filter::{FilterError, gaussian_blur};
use moleseg_morph::{MorphError, Sel, dilate, erode, open};
use moleseg_region::{
    CircleFitOptions, EnclosingCircle, RegionError, SeedPoint, connected_components_with_stats,
    flood_fill_ccs, white_fill_ccs,
};
use thiserror::Error;

/// Smallest radius reported for a mole, in pixels
pub const MIN_MOLE_RADIUS: f64 = 5.0;
/// Largest radius reported for a mole, in pixels
pub const MAX_MOLE_RADIUS: f64 = 80.0;
/// Coin candidates must have a radius strictly above this
pub const MIN_COIN_RADIUS: f64 = 12.0;
/// Coin candidates must have a radius strictly below this
pub const MAX_COIN_RADIUS: f64 = 55.0;
/// Radius of the coin circle when no candidate qualifies
pub const FALLBACK_COIN_RADIUS: f64 = 25.0;
/// Coin candidates must score below this
const MAX_COIN_SCORE: f64 = 1000.0;

/// Errors from the auto-encircle pipeline
#[derive(Debug, Error)]
pub enum EncircleError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] moleseg_core::Error),

    /// Smoothing stage failed
    #[error("blur error: {0}")]
    Filter(#[from] FilterError),

    /// Thresholding stage failed
    #[error("threshold error: {0}")]
    Threshold(#[from] ColorError),

    /// Morphology stage failed
    #[error("morphology error: {0}")]
    Morph(#[from] MorphError),

    /// Labeling or circle fitting failed
    #[error("region error: {0}")]
    Region(#[from] RegionError),
}

/// What the seed was placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Mole,
    DarkCoin,
    ShinyCoin,
}

impl ObjectType {
    /// Channel with the best object/skin contrast.
    ///
    /// Skin is bright in red, so dark objects stand out there; a shiny coin
    /// reflects more blue than skin does.
    pub fn channel(self) -> ColorChannel {
        match self {
            ObjectType::ShinyCoin => ColorChannel::Blue,
            ObjectType::Mole | ObjectType::DarkCoin => ColorChannel::Red,
        }
    }
}

/// Tuning for one run of [`auto_encircle`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncircleParams {
    /// Adaptive threshold neighborhood side (odd)
    pub threshold_block_size: u32,
    pub threshold_offset: f32,
    pub threshold_type: ThresholdType,
    pub threshold_method: AdaptiveMethod,
    /// Gaussian kernel side (odd)
    pub blur_kernel_size: u32,
    pub blur_sigma: f32,
    /// Ellipse size for the closing erosion
    pub erode_kernel_size: u32,
    /// Ellipse size for the bridging dilation
    pub dilate_kernel_size: u32,
    /// Ellipse size for hair removal
    pub cleanup_kernel_size: u32,
    /// Frame-touching components larger than this are discarded
    pub prune_size_threshold: u32,
    pub object_type: ObjectType,
    /// Channel fed to the threshold; the presets take it from `object_type`
    pub channel: ColorChannel,
    pub circle_fit: CircleFitOptions,
}

impl EncircleParams {
    fn preset(
        object_type: ObjectType,
        block: u32,
        offset: f32,
        threshold_type: ThresholdType,
        blur: (u32, f32),
        dilate_size: u32,
        erode_size: u32,
    ) -> Self {
        EncircleParams {
            threshold_block_size: block,
            threshold_offset: offset,
            threshold_type,
            threshold_method: AdaptiveMethod::Mean,
            blur_kernel_size: blur.0,
            blur_sigma: blur.1,
            erode_kernel_size: erode_size,
            dilate_kernel_size: dilate_size,
            cleanup_kernel_size: 7,
            prune_size_threshold: 105,
            object_type,
            channel: object_type.channel(),
            circle_fit: CircleFitOptions::default(),
        }
    }

    /// Dark lesion on skin.
    pub fn mole() -> Self {
        Self::preset(
            ObjectType::Mole,
            39,
            5.0,
            ThresholdType::BinaryInverted,
            (7, 2.5),
            9,
            11,
        )
    }

    /// Dull or tarnished coin, darker than the skin around it.
    pub fn dark_coin() -> Self {
        Self::preset(
            ObjectType::DarkCoin,
            55,
            10.0,
            ThresholdType::BinaryInverted,
            (11, 3.5),
            23,
            25,
        )
    }

    /// Polished coin, brighter than the skin in blue.
    pub fn shiny_coin() -> Self {
        Self::preset(
            ObjectType::ShinyCoin,
            65,
            -16.0,
            ThresholdType::Binary,
            (5, 2.0),
            21,
            21,
        )
    }

    pub fn threshold_options(&self) -> AdaptiveThresholdOptions {
        AdaptiveThresholdOptions::new(
            self.threshold_block_size,
            self.threshold_offset,
            self.threshold_type,
        )
        .with_method(self.threshold_method)
    }
}

/// Output of [`auto_encircle`]
#[derive(Debug, Clone)]
pub struct EncircleResult {
    pub circle: EnclosingCircle,
    /// Final labeling painted one color per component
    pub debug_image: Pix,
    /// Pixel count of the blob under the seed
    pub blob_area: u32,
}

/// Segment the object under `seed` in a 32 bpp color image and fit its
/// enclosing circle.
///
/// `order` names how the samples of `image` are stored; see
/// [`ChannelOrder`].
///
/// # Errors
///
/// Stage errors are passed through; in particular
/// [`RegionError::NoComponentAtSeed`] when nothing was segmented under the
/// seed.
pub fn auto_encircle(
    image: &Pix,
    seed: SeedPoint,
    params: &EncircleParams,
    order: ChannelOrder,
) -> Result<EncircleResult, EncircleError> {
    debug!(
        "auto_encircle {:?} at ({}, {}): channel {:?}, block {}, offset {}, {:?}, blur {}/{}, dilate {}, erode {}",
        params.object_type,
        seed.x,
        seed.y,
        params.channel,
        params.threshold_block_size,
        params.threshold_offset,
        params.threshold_type,
        params.blur_kernel_size,
        params.blur_sigma,
        params.dilate_kernel_size,
        params.erode_kernel_size
    );

    let channel = image.extract_channel(params.channel, order)?;
    let smoothed = gaussian_blur(&channel, params.blur_kernel_size, params.blur_sigma)?;
    let mask = adaptive_threshold(&smoothed, &params.threshold_options())?;
    trace!("threshold mask: {} pixels", mask.count_pixels());

    // Remove edge structures
    let cc = connected_components_with_stats(&mask)?;
    let pruned = cc.prune_edgelike(params.prune_size_threshold)?;
    let mask = white_fill_ccs(&pruned, cc.cc_count())?;
    trace!(
        "{} components, {} pixels after pruning",
        cc.cc_count(),
        mask.count_pixels()
    );

    // Remove hairs, then bridge parts split by reflections
    let cleanup = Sel::create_ellipse(params.cleanup_kernel_size)?;
    let mask = open(&mask, &cleanup)?;
    let mask = dilate(&mask, &Sel::create_ellipse(params.dilate_kernel_size)?)?;
    let mask = erode(&mask, &Sel::create_ellipse(params.erode_kernel_size)?)?;

    let cc = connected_components_with_stats(&mask)?;
    debug!("{} components after morphology", cc.cc_count());
    let debug_image = flood_fill_ccs(cc.labels(), cc.cc_count())?;

    let circle = cc.enclosing_circle(seed, &params.circle_fit)?;
    debug!(
        "circle at ({:.1}, {:.1}) radius {:.2}, blob area {}",
        circle.center.x, circle.center.y, circle.radius, circle.blob_area
    );

    Ok(EncircleResult {
        circle,
        debug_image,
        blob_area: circle.blob_area,
    })
}

/// [`auto_encircle`] with the mole preset, radius clamped to
/// [[`MIN_MOLE_RADIUS`], [`MAX_MOLE_RADIUS`]].
pub fn auto_encircle_mole(
    image: &Pix,
    seed: SeedPoint,
    order: ChannelOrder,
) -> Result<EncircleResult, EncircleError> {
    let mut result = auto_encircle(image, seed, &EncircleParams::mole(), order)?;
    let clamped = result.circle.radius.clamp(MIN_MOLE_RADIUS, MAX_MOLE_RADIUS);
    if clamped != result.circle.radius {
        debug!(
            "mole radius {:.2} clamped to {:.2}",
            result.circle.radius, clamped
        );
        result.circle.radius = clamped;
    }
    Ok(result)
}

/// Which parameter set produced a coin estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinChoice {
    Shiny,
    Dark,
    /// No candidate qualified; fixed-size circle at the seed
    Fallback,
}

impl CoinChoice {
    pub fn name(self) -> &'static str {
        match self {
            CoinChoice::Shiny => "shiny",
            CoinChoice::Dark => "dark",
            CoinChoice::Fallback => "fallback",
        }
    }
}

/// Output of [`auto_encircle_coin`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinEstimate {
    pub circle: EnclosingCircle,
    pub choice: CoinChoice,
}

/// Lower is better: squared offset from the seed, divided by how much of
/// the circle the blob fills.
fn coin_score(circle: &EnclosingCircle, seed: SeedPoint) -> Option<f64> {
    if circle.radius <= MIN_COIN_RADIUS || circle.radius >= MAX_COIN_RADIUS {
        return None;
    }
    let coverage = circle.blob_area as f64 / (PI * circle.radius * circle.radius);
    if coverage <= 0.0 {
        return None;
    }
    let seed_point = Point::new(seed.x as f64, seed.y as f64);
    Some(circle.center.distance_sq(&seed_point) / coverage)
}

/// Locate a calibration coin under `seed`.
///
/// Runs the shiny-coin and dark-coin presets and keeps the best-scoring
/// plausible circle. A preset that segments nothing under the seed simply
/// contributes no candidate. With no candidate, returns a
/// [`FALLBACK_COIN_RADIUS`] circle centered on the seed.
///
/// # Errors
///
/// [`RegionError::InvalidSeed`] if the seed is outside the image, or any
/// error other than an empty seed from either run.
pub fn auto_encircle_coin(
    image: &Pix,
    seed: SeedPoint,
    order: ChannelOrder,
) -> Result<CoinEstimate, EncircleError> {
    let mut best = CoinEstimate {
        circle: EnclosingCircle {
            center: Point::new(seed.x as f64, seed.y as f64),
            radius: FALLBACK_COIN_RADIUS,
            blob_area: 0,
            label: 0,
        },
        choice: CoinChoice::Fallback,
    };
    let mut best_score = MAX_COIN_SCORE;

    for (params, choice) in [
        (EncircleParams::shiny_coin(), CoinChoice::Shiny),
        (EncircleParams::dark_coin(), CoinChoice::Dark),
    ] {
        let circle = match auto_encircle(image, seed, &params, order) {
            Ok(result) => result.circle,
            Err(EncircleError::Region(RegionError::NoComponentAtSeed { .. })) => {
                debug!("{} parameters found nothing under the seed", choice.name());
                continue;
            }
            Err(e) => return Err(e),
        };
        match coin_score(&circle, seed) {
            Some(score) if score < best_score => {
                info!(
                    "Choosing blob from {} parameters (score {:.2})",
                    choice.name(),
                    score
                );
                best_score = score;
                best = CoinEstimate { circle, choice };
            }
            Some(score) => trace!("{:?} candidate scored {:.2}, not better", choice, score),
            None => debug!(
                "{:?} candidate radius {:.2} out of range",
                choice, circle.radius
            ),
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moleseg_test::synthetic::{DARK_COIN, SKIN, disk_scene, lesion_scene};

    #[test]
    fn test_presets() {
        let mole = EncircleParams::mole();
        assert_eq!(mole.threshold_block_size, 39);
        assert_eq!(mole.channel, ColorChannel::Red);
        assert_eq!(mole.threshold_type, ThresholdType::BinaryInverted);
        let shiny = EncircleParams::shiny_coin();
        assert_eq!(shiny.channel, ColorChannel::Blue);
        assert_eq!(shiny.threshold_offset, -16.0);
        assert_eq!(shiny.threshold_type, ThresholdType::Binary);
        let dark = EncircleParams::dark_coin();
        assert_eq!((dark.dilate_kernel_size, dark.erode_kernel_size), (23, 25));
        for p in [mole, shiny, dark] {
            assert_eq!(p.threshold_block_size % 2, 1);
            assert_eq!(p.blur_kernel_size % 2, 1);
            assert!(p.threshold_options().validate().is_ok());
        }
    }

    #[test]
    fn test_coin_score_bounds() {
        let seed = SeedPoint::new(10, 10);
        let circle = |radius: f64, area: u32| EnclosingCircle {
            center: Point::new(13.0, 14.0),
            radius,
            blob_area: area,
            label: 1,
        };
        assert_eq!(coin_score(&circle(12.0, 400), seed), None);
        assert_eq!(coin_score(&circle(55.0, 400), seed), None);
        assert_eq!(coin_score(&circle(20.0, 0), seed), None);
        let full = (PI * 400.0) as u32;
        let score = coin_score(&circle(20.0, full), seed).unwrap();
        assert!((score - 25.0).abs() < 0.1);
    }

    #[test]
    fn test_mole_found() {
        let image = lesion_scene(120, 100, (60.0, 50.0), 15.0, ChannelOrder::Rgb).unwrap();
        let result = auto_encircle_mole(&image, SeedPoint::new(60, 50), ChannelOrder::Rgb).unwrap();
        assert!((result.circle.radius - 15.0).abs() < 2.5, "{:?}", result.circle);
        assert!(result.circle.center.distance(&Point::new(60.0, 50.0)) < 1.5);
        assert_eq!(result.debug_image.dimensions(), (120, 100));
    }

    #[test]
    fn test_mole_bgr_storage() {
        let image = lesion_scene(120, 100, (60.0, 50.0), 12.0, ChannelOrder::Bgr).unwrap();
        let result = auto_encircle_mole(&image, SeedPoint::new(60, 50), ChannelOrder::Bgr).unwrap();
        assert!((result.circle.radius - 12.0).abs() < 2.5);
    }

    #[test]
    fn test_small_mole_clamped() {
        let image = lesion_scene(120, 100, (60.0, 50.0), 3.0, ChannelOrder::Rgb).unwrap();
        match auto_encircle_mole(&image, SeedPoint::new(60, 50), ChannelOrder::Rgb) {
            Ok(result) => assert!(result.circle.radius >= MIN_MOLE_RADIUS),
            Err(e) => assert!(matches!(
                e,
                EncircleError::Region(RegionError::NoComponentAtSeed { .. })
            )),
        }
    }

    #[test]
    fn test_seed_on_skin() {
        let image = lesion_scene(120, 100, (60.0, 50.0), 15.0, ChannelOrder::Rgb).unwrap();
        let err = auto_encircle_mole(&image, SeedPoint::new(10, 10), ChannelOrder::Rgb);
        assert!(matches!(
            err,
            Err(EncircleError::Region(RegionError::NoComponentAtSeed { .. }))
        ));
        let err = auto_encircle_mole(&image, SeedPoint::new(500, 10), ChannelOrder::Rgb);
        assert!(matches!(
            err,
            Err(EncircleError::Region(RegionError::InvalidSeed { .. }))
        ));
    }

    #[test]
    fn test_dark_coin_chosen() {
        let image = disk_scene(
            160,
            140,
            (80.0, 70.0),
            25.0,
            DARK_COIN,
            SKIN,
            ChannelOrder::Rgb,
            3,
            11,
        )
        .unwrap();
        let est = auto_encircle_coin(&image, SeedPoint::new(80, 70), ChannelOrder::Rgb).unwrap();
        assert_eq!(est.choice, CoinChoice::Dark);
        assert!((est.circle.radius - 25.0).abs() < 3.0, "{:?}", est.circle);
    }

    #[test]
    fn test_coin_fallback_on_plain_skin() {
        let image = disk_scene(
            160,
            140,
            (80.0, 70.0),
            0.0,
            SKIN,
            SKIN,
            ChannelOrder::Rgb,
            2,
            5,
        )
        .unwrap();
        let est = auto_encircle_coin(&image, SeedPoint::new(40, 30), ChannelOrder::Rgb).unwrap();
        assert_eq!(est.choice, CoinChoice::Fallback);
        assert_eq!(est.circle.radius, FALLBACK_COIN_RADIUS);
        assert_eq!(est.circle.center, Point::new(40.0, 30.0));
    }
}
