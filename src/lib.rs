//! Volume-constrained depression filling over a terrain mesh.
//!
//! Given a set of pit nodes and a finite water volume available at each, this
//! crate raises each lake's water surface node by node, stopping when the
//! volume runs out, when two lakes meet at a common level (they merge), or
//! when a lake reaches a designated draining node. The pass is re-entrant:
//! a lake parked out of volume keeps its frontier and resumes when recharged
//! on a later time step.
//!
//! Conventions:
//! - Elevations are water-surface elevations in meters at the start of the
//!   step, stored as `f32` per node; lake-level and volume bookkeeping is
//!   carried in `f64`.
//! - Cell areas are in m², volumes in m³.
//! - The volume-balance terms `(c, K)` model extra gain/loss per flooded
//!   node as `c·area + K·area·depth`; both are usually negative (loss).
#![deny(missing_docs)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::dbg_macro, clippy::large_enum_variant)]

pub mod balance;
pub mod fill;
pub mod lake;
pub mod mesh;
pub mod outlet;
pub mod queue;

/// Returns the crate version string from Cargo metadata.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
