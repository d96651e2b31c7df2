use blockworld_common::{Rgb, Transform};
use serde::{Deserialize, Serialize};

/// Shape of a mesh, in local units before the node transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Axis-aligned box centred on the origin.
    Cuboid { width: f32, height: f32, depth: f32 },
    /// Flat rectangle in the local XY plane, centred on the origin.
    Plane { width: f32, height: f32 },
}

/// Surface description. Only diffuse (Lambert) shading is supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    Lambert { color: Rgb, ambient: Rgb },
}

impl Material {
    pub fn lambert(color: Rgb) -> Self {
        Self::Lambert {
            color,
            ambient: color,
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            Self::Lambert { color, .. } => *color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Mesh { geometry: Geometry, material: Material },
    AmbientLight { color: Rgb },
    /// Scene-side representation of the camera rig. Carries no geometry.
    RigAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub transform: Transform,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn mesh(geometry: Geometry, material: Material, transform: Transform) -> Self {
        Self {
            transform,
            kind: NodeKind::Mesh { geometry, material },
        }
    }

    pub fn ambient_light(color: Rgb) -> Self {
        Self {
            transform: Transform::default(),
            kind: NodeKind::AmbientLight { color },
        }
    }

    pub fn rig_anchor(transform: Transform) -> Self {
        Self {
            transform,
            kind: NodeKind::RigAnchor,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. })
    }
}
