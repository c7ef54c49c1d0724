use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::shapes::{HitInfo, Shape};

/// An ordered collection of shapes.
///
/// The order affects only which shape wins exact distance ties. `Scene` is
/// plain data; render jobs carry it by value and every worker clones its
/// own copy before tracing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    shapes: Vec<Shape>,
}

impl Scene {
    pub fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    pub fn add_shape(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Resolves the globally nearest query over all shapes.
    ///
    /// Every shape is scanned; the smallest signed distance wins whether or
    /// not it counts as a hit, since the running minimum is what drives the
    /// marching step size. The first shape added wins exact ties. Returns
    /// `None` only for an empty scene.
    pub fn result(&self, p: Vec2, epsilon: f32) -> Option<HitInfo> {
        let mut res: Option<HitInfo> = None;

        for shape in &self.shapes {
            let candidate = shape.hit_test(p, epsilon);
            match res {
                Some(best) if candidate.distance < best.distance => res = Some(candidate),
                Some(_) => (),
                None => res = Some(candidate),
            }
        }

        res
    }
}
