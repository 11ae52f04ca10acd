//! Blob geometry
//!
//! - [`find_enclosing_circle`]: the circle around the component under a
//!   seed point
//! - [`prune_edgelike_components`]: drop large components cut by the frame
//!
//! Pixels are unit squares: pixel `(x, y)` covers
//! `[x - 0.5, x + 0.5] x [y - 0.5, y + 0.5]`. A circle contains a pixel
//! when it contains all four corners, so a single pixel has radius
//! `sqrt(0.5)` and a 3x3 square has radius `1.5 * sqrt(2)`.

use crate::conncomp::{ComponentStats, LabeledComponents, check_labels};
use crate::error::{RegionError, RegionResult};
use moleseg_core::{Box, Pix, Point};

/// Slack for floating-point containment tests
const CONTAINS_EPS: f64 = 1e-9;

/// Seed coordinate in image-pixel space, as tapped by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeedPoint {
    pub x: i32,
    pub y: i32,
}

impl SeedPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        SeedPoint { x, y }
    }

    /// Nearest pixel to a sub-pixel position.
    ///
    /// Returns `None` when either coordinate is not finite or rounds
    /// outside the `i32` range.
    pub fn from_point(p: Point) -> Option<Self> {
        let to_i32 = |v: f64| {
            let r = v.round();
            (r.is_finite() && r >= i32::MIN as f64 && r <= i32::MAX as f64).then_some(r as i32)
        };
        Some(SeedPoint {
            x: to_i32(p.x)?,
            y: to_i32(p.y)?,
        })
    }

    fn in_bounds(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }
}

impl From<(i32, i32)> for SeedPoint {
    fn from((x, y): (i32, i32)) -> Self {
        SeedPoint { x, y }
    }
}

/// Circle fitting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircleFitMethod {
    /// Start at the centroid with a radius from the bounding box, grow
    /// until every pixel is inside, then walk the center toward the
    /// farthest pixels while the radius shrinks.
    #[default]
    Expanding,
    /// Exact minimal enclosing circle (randomized incremental, with a fixed
    /// shuffle so results are reproducible).
    Minimal,
}

/// Options for [`find_enclosing_circle`]
#[derive(Debug, Clone, PartialEq)]
pub struct CircleFitOptions {
    pub method: CircleFitMethod,
    /// Re-centering stops once the step length drops below this many pixels
    pub tolerance: f64,
    /// Cap on re-centering steps
    pub max_iterations: u32,
}

impl Default for CircleFitOptions {
    fn default() -> Self {
        CircleFitOptions {
            method: CircleFitMethod::Expanding,
            tolerance: 1e-3,
            max_iterations: 500,
        }
    }
}

impl CircleFitOptions {
    pub fn minimal() -> Self {
        CircleFitOptions {
            method: CircleFitMethod::Minimal,
            ..Default::default()
        }
    }

    fn validate(&self) -> RegionResult<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(RegionError::InvalidParameters(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Circle fitted to one component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnclosingCircle {
    pub center: Point,
    pub radius: f64,
    /// Pixel count of the component
    pub blob_area: u32,
    /// Label of the component
    pub label: u32,
}

impl EnclosingCircle {
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// Diameter in millimeters given the pixel pitch.
    pub fn diameter_mm(&self, mm_per_pixel: f64) -> f64 {
        self.diameter() * mm_per_pixel
    }

    /// Whether the whole square of pixel (x, y) lies inside the circle.
    pub fn contains_pixel(&self, x: u32, y: u32) -> bool {
        pixel_corners(x as f64, y as f64)
            .iter()
            .all(|c| c.distance(&self.center) <= self.radius + CONTAINS_EPS)
    }
}

/// Fit a circle around the component under `seed`.
///
/// The returned circle contains every pixel of the component, and its
/// radius is the distance to the farthest pixel corner, so any smaller
/// radius around the same center leaves part of a pixel outside.
///
/// # Errors
///
/// - [`RegionError::InvalidSeed`] if the seed is outside the image
/// - [`RegionError::NoComponentAtSeed`] if the seed is on background
/// - [`RegionError::InvalidParameters`] if `stats` has no record for the
///   label under the seed, or that record's box does not lie inside the
///   image around the seed and the component
pub fn find_enclosing_circle(
    labels: &Pix,
    stats: &[ComponentStats],
    seed: SeedPoint,
    options: &CircleFitOptions,
) -> RegionResult<EnclosingCircle> {
    check_labels(labels)?;
    options.validate()?;

    if !seed.in_bounds(labels.width(), labels.height()) {
        return Err(RegionError::InvalidSeed {
            x: seed.x,
            y: seed.y,
        });
    }
    let label = labels.get_pixel_unchecked(seed.x as u32, seed.y as u32);
    if label == 0 {
        return Err(RegionError::NoComponentAtSeed {
            x: seed.x,
            y: seed.y,
        });
    }
    let stat = stats.iter().find(|s| s.label == label).ok_or_else(|| {
        RegionError::InvalidParameters(format!("no stats record for label {}", label))
    })?;
    if !stat.bbox.lies_within(labels.width(), labels.height())
        || !stat.bbox.contains_point(seed.x, seed.y)
    {
        return Err(RegionError::InvalidParameters(format!(
            "bbox {:?} of label {} does not fit the labeling around seed ({}, {})",
            stat.bbox, label, seed.x, seed.y
        )));
    }

    let points = hull_candidates(labels, label, &stat.bbox);
    if points.is_empty() {
        return Err(RegionError::InvalidParameters(format!(
            "bbox {:?} holds no pixel of label {}",
            stat.bbox, label
        )));
    }
    let center = match options.method {
        CircleFitMethod::Expanding => fit_expanding(&points, stat, options),
        CircleFitMethod::Minimal => fit_minimal(&points),
    };
    let radius = max_distance(&points, center);

    Ok(EnclosingCircle {
        center,
        radius,
        blob_area: stat.area,
        label,
    })
}

fn pixel_corners(x: f64, y: f64) -> [Point; 4] {
    [
        Point::new(x - 0.5, y - 0.5),
        Point::new(x + 0.5, y - 0.5),
        Point::new(x - 0.5, y + 0.5),
        Point::new(x + 0.5, y + 0.5),
    ]
}

/// Corners of the leftmost and rightmost pixel of each row.
///
/// Every other pixel of the row lies between these, so a circle holding
/// these corners holds the whole component.
fn hull_candidates(labels: &Pix, label: u32, bbox: &Box) -> Vec<Point> {
    let mut points = Vec::with_capacity(bbox.h as usize * 4);
    for y in bbox.y..bbox.bottom() {
        let y = y as u32;
        let mut row = (bbox.x..bbox.right())
            .map(|x| x as u32)
            .filter(|&x| labels.get_pixel_unchecked(x, y) == label);
        let Some(first) = row.next() else {
            continue;
        };
        let last = row.last().unwrap_or(first);
        let (yf, x0, x1) = (y as f64, first as f64, last as f64);
        points.push(Point::new(x0 - 0.5, yf - 0.5));
        points.push(Point::new(x0 - 0.5, yf + 0.5));
        points.push(Point::new(x1 + 0.5, yf - 0.5));
        points.push(Point::new(x1 + 0.5, yf + 0.5));
    }
    points
}

fn max_distance(points: &[Point], center: Point) -> f64 {
    points
        .iter()
        .map(|p| p.distance(&center))
        .fold(0.0, f64::max)
}

fn fit_expanding(points: &[Point], stat: &ComponentStats, options: &CircleFitOptions) -> Point {
    let mut c = stat.centroid;
    let mut r = 0.5 * ((stat.bbox.w as f64).powi(2) + (stat.bbox.h as f64).powi(2)).sqrt();

    // Grow: each outside point pulls the circle just far enough to touch it
    for p in points {
        let d = p.distance(&c);
        if d > r + CONTAINS_EPS {
            let new_r = 0.5 * (r + d);
            let t = (new_r - r) / d;
            c = Point::new(c.x + (p.x - c.x) * t, c.y + (p.y - c.y) * t);
            r = new_r;
        }
    }

    // Re-center: step toward the mean of the near-farthest points while
    // that lowers the farthest distance, halving the step otherwise
    let mut rmax = max_distance(points, c);
    let mut step = 0.5 * rmax;
    for _ in 0..options.max_iterations {
        if step < options.tolerance {
            break;
        }
        let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
        for p in points {
            if p.distance(&c) >= rmax - step {
                sx += p.x;
                sy += p.y;
                n += 1;
            }
        }
        let (dx, dy) = (sx / n as f64 - c.x, sy / n as f64 - c.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len < CONTAINS_EPS {
            step *= 0.5;
            continue;
        }
        let candidate = Point::new(c.x + dx / len * step, c.y + dy / len * step);
        let r_candidate = max_distance(points, candidate);
        if r_candidate < rmax {
            c = candidate;
            rmax = r_candidate;
        } else {
            step *= 0.5;
        }
    }
    c
}

fn fit_minimal(points: &[Point]) -> Point {
    let mut pts = points.to_vec();
    shuffle(&mut pts);

    let Some(&first) = pts.first() else {
        return Point::default();
    };
    let mut circle = (first, 0.0);
    let inside = |c: &(Point, f64), p: &Point| p.distance(&c.0) <= c.1 + CONTAINS_EPS;

    for i in 1..pts.len() {
        if inside(&circle, &pts[i]) {
            continue;
        }
        circle = (pts[i], 0.0);
        for j in 0..i {
            if inside(&circle, &pts[j]) {
                continue;
            }
            circle = diameter_circle(pts[i], pts[j]);
            for k in 0..j {
                if !inside(&circle, &pts[k]) {
                    circle = circumcircle(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    circle.0
}

fn diameter_circle(a: Point, b: Point) -> (Point, f64) {
    (a.midpoint(&b), 0.5 * a.distance(&b))
}

/// Circle through three points; for collinear points, the circle on the
/// farthest pair.
fn circumcircle(a: Point, b: Point, c: Point) -> (Point, f64) {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        let pairs = [(a, b), (a, c), (b, c)];
        let (p, q) = pairs
            .into_iter()
            .max_by(|l, r| l.0.distance_sq(&l.1).total_cmp(&r.0.distance_sq(&r.1)))
            .unwrap_or((a, b));
        return diameter_circle(p, q);
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point::new(ux, uy);
    (center, center.distance(&a))
}

/// Fisher-Yates with a fixed xorshift stream
fn shuffle(points: &mut [Point]) {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    for i in (1..points.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        points.swap(i, j);
    }
}

/// Whether a component counts as edge-like: its box reaches the frame and
/// its area exceeds `size_threshold`.
pub fn is_edgelike(stat: &ComponentStats, width: u32, height: u32, size_threshold: u32) -> bool {
    stat.area > size_threshold && stat.bbox.touches_frame(width, height)
}

/// Reset every edge-like component to background.
///
/// All other labels pass through unchanged. `size_threshold = 0` removes
/// every component touching the frame; `u32::MAX` removes none.
///
/// # Errors
///
/// [`RegionError::InvalidParameters`] if a stats box does not lie inside
/// the labeling.
pub fn prune_edgelike_components(
    labels: &Pix,
    stats: &[ComponentStats],
    size_threshold: u32,
) -> RegionResult<Pix> {
    check_labels(labels)?;
    let (w, h) = labels.dimensions();

    if let Some(bad) = stats.iter().find(|s| !s.bbox.lies_within(w, h)) {
        return Err(RegionError::InvalidParameters(format!(
            "bbox {:?} of label {} lies outside the {}x{} labeling",
            bad.bbox, bad.label, w, h
        )));
    }

    let mut doomed: Vec<u32> = stats
        .iter()
        .filter(|s| is_edgelike(s, w, h, size_threshold))
        .map(|s| s.label)
        .collect();
    if doomed.is_empty() {
        return Ok(labels.clone());
    }
    doomed.sort_unstable();
    doomed.dedup();

    let mut out = labels.to_mut();
    for y in 0..h {
        for x in 0..w {
            let l = out.get_pixel_unchecked(x, y);
            if l != 0 && doomed.binary_search(&l).is_ok() {
                out.set_pixel_unchecked(x, y, 0);
            }
        }
    }
    Ok(out.into())
}

impl LabeledComponents {
    /// [`find_enclosing_circle`] on this labeling.
    pub fn enclosing_circle(
        &self,
        seed: SeedPoint,
        options: &CircleFitOptions,
    ) -> RegionResult<EnclosingCircle> {
        find_enclosing_circle(self.labels(), self.stats(), seed, options)
    }

    /// [`prune_edgelike_components`] on this labeling.
    pub fn prune_edgelike(&self, size_threshold: u32) -> RegionResult<Pix> {
        prune_edgelike_components(self.labels(), self.stats(), size_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conncomp::connected_components_with_stats;
    use moleseg_core::PixelDepth;

    fn square_mask() -> Pix {
        let mut pm = Pix::new(10, 10, PixelDepth::Bit1).unwrap().to_mut();
        for y in 3..6 {
            for x in 3..6 {
                pm.set_pixel_unchecked(x, y, 1);
            }
        }
        pm.into()
    }

    #[test]
    fn test_square_circle_both_methods() {
        let cc = connected_components_with_stats(&square_mask()).unwrap();
        let expected = 1.5 * 2f64.sqrt();
        for opts in [CircleFitOptions::default(), CircleFitOptions::minimal()] {
            let circle = cc.enclosing_circle(SeedPoint::new(4, 4), &opts).unwrap();
            assert!((circle.center.x - 4.0).abs() < 1e-6, "{:?}", opts.method);
            assert!((circle.center.y - 4.0).abs() < 1e-6);
            assert!((circle.radius - expected).abs() < 1e-6);
            assert_eq!(circle.blob_area, 9);
            assert_eq!(circle.label, 1);
        }
    }

    #[test]
    fn test_single_pixel() {
        let mut pm = Pix::new(5, 5, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel_unchecked(0, 4, 1);
        let cc = connected_components_with_stats(&pm.into()).unwrap();
        let circle = cc
            .enclosing_circle(SeedPoint::new(0, 4), &CircleFitOptions::default())
            .unwrap();
        assert!((circle.radius - 0.5f64.sqrt()).abs() < 1e-9);
        assert!(circle.contains_pixel(0, 4));
    }

    #[test]
    fn test_seed_errors() {
        let cc = connected_components_with_stats(&square_mask()).unwrap();
        let opts = CircleFitOptions::default();
        assert!(matches!(
            cc.enclosing_circle(SeedPoint::new(0, 0), &opts),
            Err(RegionError::NoComponentAtSeed { x: 0, y: 0 })
        ));
        assert!(matches!(
            cc.enclosing_circle(SeedPoint::new(10, 4), &opts),
            Err(RegionError::InvalidSeed { x: 10, y: 4 })
        ));
        assert!(matches!(
            cc.enclosing_circle(SeedPoint::new(-1, 4), &opts),
            Err(RegionError::InvalidSeed { .. })
        ));
    }

    #[test]
    fn test_missing_stats_record() {
        let cc = connected_components_with_stats(&square_mask()).unwrap();
        assert!(matches!(
            find_enclosing_circle(
                cc.labels(),
                &[],
                SeedPoint::new(4, 4),
                &CircleFitOptions::default()
            ),
            Err(RegionError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_stats_box_must_fit_labeling() {
        let cc = connected_components_with_stats(&square_mask()).unwrap();
        let opts = CircleFitOptions::default();
        let mut stat = cc.stats()[0];
        let seed = SeedPoint::new(4, 4);

        // Past the image
        stat.bbox = Box::new_unchecked(0, 0, 50, 50);
        assert!(matches!(
            find_enclosing_circle(cc.labels(), &[stat], seed, &opts),
            Err(RegionError::InvalidParameters(_))
        ));

        // Inside the image but away from the seed and the component
        stat.bbox = Box::new_unchecked(7, 7, 2, 2);
        assert!(matches!(
            find_enclosing_circle(cc.labels(), &[stat], seed, &opts),
            Err(RegionError::InvalidParameters(_))
        ));

        // Around the seed, so the fit still covers the component
        stat.bbox = Box::new_unchecked(2, 2, 5, 5);
        let circle = find_enclosing_circle(cc.labels(), &[stat], seed, &opts).unwrap();
        assert!(circle.contains_pixel(4, 4));
        assert!(circle.contains_pixel(3, 5));
    }

    #[test]
    fn test_seed_from_point() {
        assert_eq!(
            SeedPoint::from_point(Point::new(3.4, 7.6)),
            Some(SeedPoint::new(3, 8))
        );
        assert_eq!(
            SeedPoint::from_point(Point::new(-0.6, 0.0)),
            Some(SeedPoint::new(-1, 0))
        );
        assert_eq!(SeedPoint::from_point(Point::new(f64::NAN, 1.0)), None);
        assert_eq!(SeedPoint::from_point(Point::new(1.0, f64::INFINITY)), None);
        assert_eq!(SeedPoint::from_point(Point::new(1e12, 1.0)), None);
    }

    #[test]
    fn test_bad_tolerance() {
        let cc = connected_components_with_stats(&square_mask()).unwrap();
        let opts = CircleFitOptions {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(cc.enclosing_circle(SeedPoint::new(4, 4), &opts).is_err());
    }

    #[test]
    fn test_circumcircle_collinear() {
        let (c, r) = circumcircle(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(4.0, 0.0),
        );
        assert_eq!(c, Point::new(2.0, 0.0));
        assert_eq!(r, 2.0);
    }

    #[test]
    fn test_diameter_mm() {
        let circle = EnclosingCircle {
            center: Point::new(0.0, 0.0),
            radius: 10.0,
            blob_area: 300,
            label: 1,
        };
        assert!((circle.diameter_mm(0.05) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prune_edge_rules() {
        let mut pm = Pix::new(10, 10, PixelDepth::Bit1).unwrap().to_mut();
        // Border blob of 4 pixels, interior blob of 1
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1), (5, 5)] {
            pm.set_pixel_unchecked(x, y, 1);
        }
        let cc = connected_components_with_stats(&pm.into()).unwrap();
        let keep = cc.prune_edgelike(4).unwrap();
        assert_eq!(keep.get_pixel(0, 0), Some(1));
        let pruned = cc.prune_edgelike(3).unwrap();
        assert_eq!(pruned.get_pixel(0, 0), Some(0));
        assert_eq!(pruned.get_pixel(5, 5), Some(2));
    }

    #[test]
    fn test_prune_checks_stats_boxes() {
        let cc = connected_components_with_stats(&square_mask()).unwrap();
        let mut stat = cc.stats()[0];
        stat.bbox = Box::new_unchecked(5, 5, 10, 10);
        assert!(matches!(
            prune_edgelike_components(cc.labels(), &[stat], 0),
            Err(RegionError::InvalidParameters(_))
        ));

        // A large label value in the stats does not size any table
        let mut far = cc.stats()[0];
        far.label = u32::MAX;
        far.bbox = Box::new_unchecked(0, 0, 1, 1);
        let out = prune_edgelike_components(cc.labels(), &[far], 0).unwrap();
        assert_eq!(out.get_pixel(4, 4), Some(1));
    }
}
