//! moleseg-region - Connected components and blob geometry
//!
//! - Connected-component labeling with per-component statistics
//! - Pruning of large components cut by the image frame
//! - Enclosing circle of the component under a seed point
//! - Pseudo-color and mask renderings of a labeling, circle overlays

pub mod conncomp;
mod error;
pub mod fill;
pub mod geometry;

pub use error::{RegionError, RegionResult};

pub use conncomp::{
    ComponentStats, ConnectivityType, LabeledComponents, UnionFind, component_stats,
    connected_components_with_stats, label_components,
};
pub use fill::{flood_fill_ccs, label_color, render_circle, white_fill_ccs};
pub use geometry::{
    CircleFitMethod, CircleFitOptions, EnclosingCircle, SeedPoint, find_enclosing_circle,
    is_edgelike, prune_edgelike_components,
};
