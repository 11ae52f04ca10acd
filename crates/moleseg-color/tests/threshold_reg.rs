//! Adaptive threshold regression test
//!
//! The two threshold types are exact complements, a binary input passes
//! through unchanged, and a smoothed synthetic mole is separated from the
//! skin around it with either local-mean method.
//!
//! Run with:
//! ```
//! cargo test -p moleseg-color --test threshold_reg
//! ```

use moleseg_color::{
    AdaptiveMethod, AdaptiveThresholdOptions, ThresholdType, adaptive_threshold,
};
use moleseg_core::{ChannelOrder, ColorChannel};
use moleseg_filter::gaussian_blur;
use moleseg_test::RegParams;
use moleseg_test::synthetic::{disk_mask, lesion_scene, random_gray, random_mask};

/// Pixels where the two masks disagree
fn count_diff(a: &moleseg_core::Pix, b: &moleseg_core::Pix) -> u64 {
    a.data()
        .iter()
        .zip(b.data())
        .map(|(&x, &y)| (x ^ y).count_ones() as u64)
        .sum()
}

#[test]
fn threshold_reg() {
    let mut rp = RegParams::new("threshold");

    // Binary and inverted are complements on any gray image
    let gray = random_gray(45, 33, 9).expect("random_gray");
    for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
        for &(block, offset) in &[(3, 0.0), (15, 2.0), (31, -7.5)] {
            let opts = AdaptiveThresholdOptions::new(block, offset, ThresholdType::Binary)
                .with_method(method);
            let inv_opts = AdaptiveThresholdOptions {
                threshold_type: ThresholdType::BinaryInverted,
                ..opts.clone()
            };
            let pos = adaptive_threshold(&gray, &opts).expect("binary");
            let neg = adaptive_threshold(&gray, &inv_opts).expect("inverted");
            rp.compare_values(
                (45 * 33) as f64,
                (pos.count_pixels() + neg.count_pixels()) as f64,
                0.0,
            );
            rp.compare_pix(&pos.invert_binary().expect("invert"), &neg);
        }
    }

    // Masks pass through; inverted masks flip
    let mask = random_mask(40, 40, 0.3, 4).expect("random_mask");
    let opts = AdaptiveThresholdOptions::default();
    rp.compare_pix(&adaptive_threshold(&mask, &opts).expect("mask"), &mask);
    let inv = AdaptiveThresholdOptions {
        threshold_type: ThresholdType::BinaryInverted,
        ..opts
    };
    rp.compare_pix(
        &adaptive_threshold(&mask, &inv).expect("mask inverted"),
        &mask.invert_binary().expect("invert"),
    );

    // A smoothed mole on skin, seen through the red channel
    let (w, h, cx, cy, r) = (120, 100, 60.0, 50.0, 15.0);
    let scene = lesion_scene(w, h, (cx, cy), r, ChannelOrder::Rgb).expect("scene");
    let red = scene
        .extract_channel(ColorChannel::Red, ChannelOrder::Rgb)
        .expect("red");
    let smoothed = gaussian_blur(&red, 7, 2.5).expect("blur");
    let truth = disk_mask(w, h, cx, cy, r).expect("disk");
    for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
        let opts = AdaptiveThresholdOptions::new(39, 5.0, ThresholdType::BinaryInverted)
            .with_method(method);
        let found = adaptive_threshold(&smoothed, &opts).expect("threshold");
        let diff = count_diff(&found, &truth);
        eprintln!(
            "  {:?}: {} fg pixels, {} differ from the disk",
            method,
            found.count_pixels(),
            diff
        );
        // Disagreement only along the blurred rim
        rp.check(
            (diff as f64) < 0.3 * truth.count_pixels() as f64,
            "mole separated from skin",
        );
    }

    assert!(rp.cleanup(), "threshold regression test failed");
}
