use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::HitInfo;
use crate::{error::RenderError, material::Material};

/// A circle primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    center: Vec2,
    radius: f32,
    material: Material,
}

impl Circle {
    /// Creates a new `Circle`. The radius must be strictly positive.
    pub fn new(center: Vec2, radius: f32, material: Material) -> Result<Self, RenderError> {
        if !(radius > 0.0) {
            return Err(RenderError::InvalidGeometry(format!(
                "circle radius must be positive, got {radius}"
            )));
        }
        Ok(Self {
            center,
            radius,
            material,
        })
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn distance(&self, p: Vec2) -> f32 {
        (p - self.center).length() - self.radius
    }

    pub fn hit_test(&self, p: Vec2, epsilon: f32) -> HitInfo {
        let distance = self.distance(p);

        let mut info = HitInfo {
            distance,
            material: &self.material,
            is_hit: false,
            normal: Vec2::ZERO,
        };

        if distance < epsilon {
            info.is_hit = true;
            // Radius-scaled offset from the center, an approximation of the
            // outward normal
            info.normal = (p - self.center) * self.radius;
        }

        info
    }
}
