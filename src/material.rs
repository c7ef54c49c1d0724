use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Surface attributes attached to a shape.
///
/// Tracing consumes `emission` only; `reflectivity`, `refractivity` and
/// `absorption` ride along in the scene description for scenes that set
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub reflectivity: f32,
    pub refractivity: f32,
    /// Radiance color added to a light path on every hit.
    pub emission: Vec3,
    pub absorption: Vec3,
}

impl Material {
    pub fn new(emission: Vec3, absorption: Vec3, reflectivity: f32, refractivity: f32) -> Self {
        Self {
            reflectivity,
            refractivity,
            emission,
            absorption,
        }
    }

    /// A material that only emits.
    pub fn emissive(emission: Vec3) -> Self {
        Self::new(emission, Vec3::ZERO, 0.0, 0.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            reflectivity: 0.0,
            refractivity: 0.0,
            emission: Vec3::ZERO,
            absorption: Vec3::ZERO,
        }
    }
}
