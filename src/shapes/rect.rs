use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::HitInfo;
use crate::{error::RenderError, material::Material};

fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// An axis-aligned box primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rect {
    center: Vec2,
    half_extents: Vec2,
    material: Material,
}

impl Rect {
    /// Creates a new `Rect`. Both half extents must be strictly positive.
    pub fn new(center: Vec2, half_extents: Vec2, material: Material) -> Result<Self, RenderError> {
        if !(half_extents.x > 0.0 && half_extents.y > 0.0) {
            return Err(RenderError::InvalidGeometry(format!(
                "rect half extents must be positive, got {half_extents}"
            )));
        }
        Ok(Self {
            center,
            half_extents,
            material,
        })
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    // Based on the box SDF from
    // https://iquilezles.org/articles/distfunctions2d/
    // with the interior clamped to exactly zero instead of reporting depth.
    pub fn distance(&self, p: Vec2) -> f32 {
        let d = (p - self.center).abs() - self.half_extents;
        let inside = d.max_element().min(0.0);
        let outside = d.max(Vec2::ZERO).length();

        (inside + outside).max(0.0)
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
            // Axis-aligned normal; the axis with the larger |d| component
            // carries the sign of the point's offset from the center
            let rel = p - self.center;
            let d = rel.abs() - self.half_extents;
            info.normal = if d.x.abs() > d.y.abs() {
                Vec2::new(sign(rel.x), 0.0)
            } else {
                Vec2::new(0.0, sign(rel.y))
            };
        }

        info
    }
}
