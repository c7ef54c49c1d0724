mod circle;
mod rect;

pub use circle::Circle;
pub use rect::Rect;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::material::Material;

/// The outcome of a hit query against a shape.
///
/// `distance` is filled in whether or not the query counts as a hit; scene
/// resolution keeps the running minimum to drive the marching step size.
#[derive(Debug, Clone, Copy)]
pub struct HitInfo<'a> {
    /// Signed distance from the query point to the shape boundary.
    pub distance: f32,
    pub material: &'a Material,
    /// `true` iff `distance` fell below the query epsilon.
    pub is_hit: bool,
    /// Surface normal estimate on hit. Not guaranteed to be unit length.
    pub normal: Vec2,
}

/// A signed-distance-field primitive. Closed set; nothing dispatches over
/// shapes beyond these two variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Circle(Circle),
    Rect(Rect),
}

impl Shape {
    /// Signed distance from `p` to the shape boundary, negative inside.
    pub fn distance(&self, p: Vec2) -> f32 {
        match self {
            Shape::Circle(circle) => circle.distance(p),
            Shape::Rect(rect) => rect.distance(p),
        }
    }

    /// Queries `p` against the shape, counting a hit when the signed
    /// distance falls below `epsilon`.
    pub fn hit_test(&self, p: Vec2, epsilon: f32) -> HitInfo {
        match self {
            Shape::Circle(circle) => circle.hit_test(p, epsilon),
            Shape::Rect(rect) => rect.hit_test(p, epsilon),
        }
    }

    pub fn material(&self) -> &Material {
        match self {
            Shape::Circle(circle) => circle.material(),
            Shape::Rect(rect) => rect.material(),
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Shape::Rect(rect)
    }
}
