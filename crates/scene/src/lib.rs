//! Scene Graph: the container of renderable objects.
//!
//! # Invariants
//! - The viewer only adds and removes nodes; renderers read the graph and never mutate it.
//! - Iteration order is deterministic (BTreeMap keyed by `NodeId`).

pub mod graph;
pub mod node;
pub mod populate;

pub use graph::SceneGraph;
pub use node::{Geometry, Material, NodeKind, SceneNode};
pub use populate::{populate_default_scene, DefaultScene, SceneLayout};
