//! Connected component labeling
//!
//! Two-pass labeling over a disjoint-set forest:
//!
//! 1. A raster pass gives each foreground pixel a provisional label taken
//!    from its already-visited neighbors, or a fresh one, and records every
//!    pair of touching provisional labels in a [`UnionFind`].
//! 2. A second raster pass replaces each provisional label by its class
//!    representative, renumbers representatives densely in order of first
//!    appearance, and accumulates area, bounding box and centroid sums.
//!
//! Label images are 32 bpp with one sample per pixel; 0 is background.

use crate::error::{RegionError, RegionResult};
use moleseg_core::{Box, Pix, PixelDepth, Point};

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    FourWay,
    /// 8-way connectivity (includes diagonals)
    ///
    /// Lesion masks are noisy and often bridged only diagonally, so this is
    /// the default.
    #[default]
    EightWay,
}

/// Disjoint-set forest over provisional labels.
///
/// Element 0 is reserved for background and never merged. [`union`]
/// always makes the smaller root the representative; [`find`] compresses
/// paths.
///
/// [`union`]: UnionFind::union
/// [`find`]: UnionFind::find
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<u32>,
}

impl Default for UnionFind {
    fn default() -> Self {
        Self::new()
    }
}

impl UnionFind {
    pub fn new() -> Self {
        UnionFind { parent: vec![0] }
    }

    /// Add a singleton set and return its id (ids start at 1).
    pub fn make_set(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    /// Number of ids handed out, background included.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.len() <= 1
    }

    /// Representative of the set containing `x`.
    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`; returns the new representative.
    pub fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        let (lo, hi) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        lo
    }
}

/// Per-component statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentStats {
    /// Component label (1-based)
    pub label: u32,
    /// Number of pixels
    pub area: u32,
    /// Tightest box containing every pixel of the component
    pub bbox: Box,
    /// Mean pixel position
    pub centroid: Point,
}

/// Result of labeling: the label image and one stats record per label.
///
/// `stats[i].label == i + 1` for every record.
#[derive(Debug, Clone)]
pub struct LabeledComponents {
    labels: Pix,
    stats: Vec<ComponentStats>,
}

impl LabeledComponents {
    /// The 32 bpp label image
    pub fn labels(&self) -> &Pix {
        &self.labels
    }

    pub fn stats(&self) -> &[ComponentStats] {
        &self.stats
    }

    /// Number of non-background labels
    pub fn cc_count(&self) -> u32 {
        self.stats.len() as u32
    }

    /// Label at (x, y), `None` outside the image.
    pub fn label_at(&self, x: u32, y: u32) -> Option<u32> {
        self.labels.get_pixel(x, y)
    }

    /// Stats record for `label`, `None` for background or unknown labels.
    pub fn stats_for(&self, label: u32) -> Option<&ComponentStats> {
        label
            .checked_sub(1)
            .and_then(|i| self.stats.get(i as usize))
    }

    pub fn into_parts(self) -> (Pix, Vec<ComponentStats>) {
        (self.labels, self.stats)
    }
}

/// Running sums for one component
#[derive(Debug, Clone, Copy)]
struct StatsAccum {
    area: u32,
    xmin: u32,
    ymin: u32,
    xmax: u32,
    ymax: u32,
    sum_x: u64,
    sum_y: u64,
}

impl StatsAccum {
    fn new(x: u32, y: u32) -> Self {
        StatsAccum {
            area: 0,
            xmin: x,
            ymin: y,
            xmax: x,
            ymax: y,
            sum_x: 0,
            sum_y: 0,
        }
    }

    #[inline]
    fn add(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
        self.sum_x += x as u64;
        self.sum_y += y as u64;
    }

    fn finish(&self, label: u32) -> ComponentStats {
        let n = self.area.max(1) as f64;
        ComponentStats {
            label,
            area: self.area,
            bbox: Box::from_inclusive(
                self.xmin as i32,
                self.ymin as i32,
                self.xmax as i32,
                self.ymax as i32,
            ),
            centroid: Point::new(self.sum_x as f64 / n, self.sum_y as f64 / n),
        }
    }
}

/// Label the connected components of a mask with 8-connectivity.
///
/// The mask may be 1 bpp or 8 bpp (any nonzero value is foreground). An
/// all-background mask yields `cc_count() == 0`.
pub fn connected_components_with_stats(pix: &Pix) -> RegionResult<LabeledComponents> {
    label_components(pix, ConnectivityType::EightWay)
}

/// Label the connected components of a mask with the given connectivity.
pub fn label_components(
    pix: &Pix,
    connectivity: ConnectivityType,
) -> RegionResult<LabeledComponents> {
    let mask = match pix.depth() {
        PixelDepth::Bit1 => pix.clone(),
        PixelDepth::Bit8 => pix.convert_to_binary()?,
        PixelDepth::Bit32 => {
            return Err(RegionError::UnsupportedDepth {
                expected: "1 or 8 bpp mask",
                actual: 32,
            });
        }
    };
    let (w, h) = mask.dimensions();
    let (wu, hu) = (w as usize, h as usize);

    // First pass: provisional labels and equivalences
    let mut provisional = vec![0u32; wu * hu];
    let mut uf = UnionFind::new();
    let mut neighbors = [0u32; 4];
    for y in 0..hu {
        for x in 0..wu {
            if mask.get_pixel_unchecked(x as u32, y as u32) == 0 {
                continue;
            }
            let mut n = 0;
            let mut look = |nx: usize, ny: usize| {
                let l = provisional[ny * wu + nx];
                if l != 0 {
                    neighbors[n] = l;
                    n += 1;
                }
            };
            if x > 0 {
                look(x - 1, y);
            }
            if y > 0 {
                look(x, y - 1);
                if connectivity == ConnectivityType::EightWay {
                    if x > 0 {
                        look(x - 1, y - 1);
                    }
                    if x + 1 < wu {
                        look(x + 1, y - 1);
                    }
                }
            }

            let label = if n == 0 {
                uf.make_set()
            } else {
                let first = neighbors[0];
                for &other in &neighbors[1..n] {
                    uf.union(first, other);
                }
                first
            };
            provisional[y * wu + x] = label;
        }
    }

    // Second pass: dense relabeling and stats
    let mut remap = vec![0u32; uf.len()];
    let mut accums: Vec<StatsAccum> = Vec::new();
    let mut labels = Pix::new_labels(w, h)?.to_mut();
    for y in 0..hu {
        for x in 0..wu {
            let p = provisional[y * wu + x];
            if p == 0 {
                continue;
            }
            let root = uf.find(p) as usize;
            if remap[root] == 0 {
                accums.push(StatsAccum::new(x as u32, y as u32));
                remap[root] = accums.len() as u32;
            }
            let label = remap[root];
            accums[(label - 1) as usize].add(x as u32, y as u32);
            labels.set_pixel_unchecked(x as u32, y as u32, label);
        }
    }

    let stats = accums
        .iter()
        .enumerate()
        .map(|(i, acc)| acc.finish(i as u32 + 1))
        .collect();

    Ok(LabeledComponents {
        labels: labels.into(),
        stats,
    })
}

/// Recompute statistics from an arbitrary label image.
///
/// Labels need not be dense; records come back sorted by label, one per
/// label that occurs.
pub fn component_stats(labels: &Pix) -> RegionResult<Vec<ComponentStats>> {
    check_labels(labels)?;
    let (w, h) = labels.dimensions();
    let mut accums: std::collections::BTreeMap<u32, StatsAccum> = Default::default();
    for y in 0..h {
        for x in 0..w {
            let l = labels.get_pixel_unchecked(x, y);
            if l != 0 {
                accums
                    .entry(l)
                    .or_insert_with(|| StatsAccum::new(x, y))
                    .add(x, y);
            }
        }
    }
    Ok(accums.iter().map(|(&l, acc)| acc.finish(l)).collect())
}

/// Require a 32 bpp, single-sample label image.
pub(crate) fn check_labels(pix: &Pix) -> RegionResult<()> {
    if pix.depth() != PixelDepth::Bit32 || pix.spp() != 1 {
        return Err(RegionError::UnsupportedDepth {
            expected: "32 bpp label image",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}
