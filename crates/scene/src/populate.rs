use std::f32::consts::FRAC_PI_2;

use blockworld_common::{NodeId, Rgb, Transform};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::graph::SceneGraph;
use crate::node::{Geometry, Material, SceneNode};

/// Dimensions and colours of the starting scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    /// Edge length of one block.
    pub unit_size: f32,
    /// Number of blocks along each side of the floor.
    pub units: u32,
    pub cube_color: Rgb,
    pub floor_color: Rgb,
    pub light_color: Rgb,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            unit_size: 20.0,
            units: 1000,
            cube_color: Rgb(0xD4AF37),
            floor_color: Rgb(0x395D33),
            light_color: Rgb::WHITE,
        }
    }
}

/// Ids of the nodes added by [`populate_default_scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultScene {
    pub cube: NodeId,
    pub floor: NodeId,
    pub light: NodeId,
}

/// One block resting on the floor two units ahead of the origin, a floor on the
/// xz plane, and a single ambient light.
pub fn populate_default_scene(scene: &mut SceneGraph, layout: &SceneLayout) -> DefaultScene {
    let unit = layout.unit_size;

    let cube = scene.add(SceneNode::mesh(
        Geometry::Cuboid {
            width: unit,
            height: unit,
            depth: unit,
        },
        Material::lambert(layout.cube_color),
        Transform::from_position(Vec3::new(0.0, unit / 2.0, -2.0 * unit)),
    ));

    let extent = unit * layout.units as f32;
    let floor = scene.add(SceneNode::mesh(
        Geometry::Plane {
            width: extent,
            height: extent,
        },
        Material::lambert(layout.floor_color),
        Transform {
            rotation: Quat::from_rotation_x(-FRAC_PI_2),
            ..Transform::default()
        },
    ));

    let light = scene.add(SceneNode::ambient_light(layout.light_color));

    tracing::debug!(unit, units = layout.units, "default scene populated");

    DefaultScene { cube, floor, light }
}
