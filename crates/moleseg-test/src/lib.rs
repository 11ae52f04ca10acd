//! moleseg-test - Regression test framework
//!
//! Supports three modes, selected by the `REGTEST_MODE` environment
//! variable:
//!
//! - **generate**: Create golden files for comparison
//! - **compare**: Compare results with golden files (default)
//! - **display**: Run tests without comparison (visual inspection)
//!
//! # Usage
//!
//! ```ignore
//! use moleseg_test::RegParams;
//!
//! let mut rp = RegParams::new("conncomp");
//! rp.compare_values(4.0, count as f64, 0.0);
//! assert!(rp.cleanup());
//! ```

mod error;
mod params;
pub mod synthetic;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    // moleseg-test is at crates/moleseg-test
    format!("{}/../..", env!("CARGO_MANIFEST_DIR"))
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
