//! Auto-encircle regression test
//!
//! Synthetic moles of several sizes and positions, stored in both channel
//! orders, are found at roughly their true radius; the debug rendering is
//! written for inspection.
//!
//! Run with:
//! ```
//! cargo test -p moleseg --test encircle_reg
//! ```

use moleseg::io::ImageFormat;
use moleseg::{
    ChannelOrder, CircleFitOptions, EncircleParams, Point, SeedPoint, auto_encircle,
    auto_encircle_mole,
};
use moleseg_test::RegParams;
use moleseg_test::synthetic::lesion_scene;

#[test]
fn encircle_reg() {
    let mut rp = RegParams::new("encircle");

    for order in [ChannelOrder::Rgb, ChannelOrder::Bgr] {
        for &(cx, cy, r) in &[(60.0, 50.0, 15.0), (45.0, 62.0, 10.0), (90.0, 45.0, 20.0)] {
            let image = lesion_scene(140, 110, (cx, cy), r, order).expect("scene");
            let seed = SeedPoint::from_point(Point::new(cx, cy)).expect("finite seed");
            let result = auto_encircle_mole(&image, seed, order).expect("encircle");
            eprintln!(
                "  {:?} mole ({}, {}) r={}: found ({:.2}, {:.2}) r={:.2} area={}",
                order,
                cx,
                cy,
                r,
                result.circle.center.x,
                result.circle.center.y,
                result.circle.radius,
                result.blob_area
            );
            rp.compare_values(r, result.circle.radius, 2.5);
            rp.compare_values(cx, result.circle.center.x, 1.5);
            rp.compare_values(cy, result.circle.center.y, 1.5);
            rp.check(
                result.blob_area == result.circle.blob_area,
                "blob area matches circle",
            );
            rp.check(
                (result.circle.diameter_mm(0.1) - 0.2 * result.circle.radius).abs() < 1e-9,
                "diameter in millimeters",
            );
        }
    }

    // Exact fit agrees with the default within half a pixel
    let image = lesion_scene(140, 110, (70.0, 55.0), 18.0, ChannelOrder::Rgb).expect("scene");
    let seed = SeedPoint::new(70, 55);
    let default = auto_encircle(&image, seed, &EncircleParams::mole(), ChannelOrder::Rgb)
        .expect("default fit");
    let exact = auto_encircle(
        &image,
        seed,
        &EncircleParams {
            circle_fit: CircleFitOptions::minimal(),
            ..EncircleParams::mole()
        },
        ChannelOrder::Rgb,
    )
    .expect("exact fit");
    rp.compare_values(exact.circle.radius, default.circle.radius, 0.5);
    rp.check(
        exact.circle.radius <= default.circle.radius + 1e-6,
        "exact fit is no larger",
    );

    rp.write_pix_and_check(&default.debug_image, ImageFormat::Png)
        .expect("write debug image");

    assert!(rp.cleanup(), "encircle regression test failed");
}
