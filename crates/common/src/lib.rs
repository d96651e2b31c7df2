//! Shared types used across the blockworld crates.

mod types;

pub use types::{NodeId, Rgb, Transform};
