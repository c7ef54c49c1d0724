use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{error::RenderError, glimmer_debug, scene::Scene};

/// Settings for sphere tracing and per-pixel sampling.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerConfig {
    /// Marching iterations allowed per ray.
    pub max_steps: u32,
    /// Recursive reflection depth limit.
    pub max_depth: u32,
    /// Stratified directions fired per sampled point.
    pub samples: u32,
    /// Signed distance below which a query counts as a hit.
    pub epsilon: f32,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_depth: 10,
            samples: 64,
            epsilon: 0.001,
        }
    }
}

impl TracerConfig {
    /// Rejects settings that would produce degenerate or never-terminating
    /// traces.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_steps == 0 {
            return Err(RenderError::InvalidConfiguration(
                "max_steps must be positive".into(),
            ));
        }
        if self.samples == 0 {
            return Err(RenderError::InvalidConfiguration(
                "samples must be positive".into(),
            ));
        }
        if !(self.epsilon > 0.0) {
            return Err(RenderError::InvalidConfiguration(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Radiance accumulated along one traced light path.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceResult {
    /// Summed emission of every hit on the path. Unclamped.
    pub radiance: Vec3,
    /// Marching iterations spent, recursion included.
    pub steps: usize,
}

/// Reflects `v` about `normal`.
///
/// The normal is normalized first, so `v`'s length is preserved and the
/// caller may pass the approximate normals shapes report.
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    let n = normal.normalize();
    v - n * (2.0 * v.dot(n))
}

/// Sphere-marches rays through a [`Scene`], following reflections
/// recursively up to the configured depth.
#[derive(Debug, Clone, Copy)]
pub struct Tracer {
    config: TracerConfig,
}

impl Tracer {
    pub fn new(config: TracerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Traces one ray from `point` along `direction`, which must be unit
    /// length. `depth` is 0 for a primary ray; every reflection bounce
    /// increments it.
    ///
    /// Each iteration advances by the scene's nearest signed distance, so
    /// the march never overshoots a surface. On a hit the material's
    /// emission joins the path radiance; if the depth limit allows, the
    /// path first continues one unit step along the reflected direction.
    /// Exhausting `max_steps` leaves the background black.
    pub fn trace(&self, scene: &Scene, point: Vec2, direction: Vec2, depth: u32) -> TraceResult {
        let mut result = TraceResult::default();
        let mut point = point;

        for _ in 0..self.config.max_steps {
            result.steps += 1;

            let hit = match scene.result(point, self.config.epsilon) {
                Some(hit) => hit,
                None => {
                    glimmer_debug!("trace: Empty scene, aborting ray");
                    break;
                }
            };

            if hit.is_hit {
                if depth < self.config.max_depth {
                    let reflected = reflect(direction, hit.normal);
                    let bounce = self.trace(scene, point + reflected, reflected, depth + 1);
                    result.radiance += bounce.radiance;
                    result.steps += bounce.steps;
                }
                result.radiance += hit.material.emission;
                break;
            }

            point += direction * hit.distance;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{material::Material, shapes::Circle};
    use approx::assert_abs_diff_eq;

    fn emissive_circle(center: Vec2, radius: f32, emission: Vec3) -> Circle {
        Circle::new(center, radius, Material::emissive(emission)).unwrap()
    }

    #[test]
    fn reflect_preserves_length_and_negates_normal_component() {
        let cases = [
            (Vec2::new(1.0, -1.0), Vec2::new(0.0, 1.0)),
            (Vec2::new(0.3, 0.7), Vec2::new(1.0, 0.0)),
            (Vec2::new(-2.0, 5.0), Vec2::new(0.6, 0.8)),
        ];

        for (v, n) in cases {
            let r = reflect(v, n);
            assert_abs_diff_eq!(r.dot(n), -v.dot(n), epsilon = 1e-5);
            assert_abs_diff_eq!(r.length(), v.length(), epsilon = 1e-5);
        }
    }

    #[test]
    fn reflect_normalizes_the_normal_first() {
        let v = Vec2::new(1.0, -1.0);
        // Same direction, wildly different magnitude
        let r_unit = reflect(v, Vec2::new(0.0, 1.0));
        let r_scaled = reflect(v, Vec2::new(0.0, 123.0));
        assert_abs_diff_eq!(r_unit.x, r_scaled.x, epsilon = 1e-5);
        assert_abs_diff_eq!(r_unit.y, r_scaled.y, epsilon = 1e-5);
    }

    #[test]
    fn immediate_hit_accumulates_emission() {
        let mut scene = Scene::new();
        scene.add_shape(emissive_circle(Vec2::ZERO, 1.0, Vec3::new(0.5, 1.0, 2.0)));

        let config = TracerConfig {
            max_depth: 0,
            ..TracerConfig::default()
        };
        let result = Tracer::new(config).trace(&scene, Vec2::ZERO, Vec2::X, 0);

        assert_abs_diff_eq!(result.radiance.x, 0.5);
        assert_abs_diff_eq!(result.radiance.y, 1.0);
        assert_abs_diff_eq!(result.radiance.z, 2.0);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn march_reaches_distant_surface() {
        let mut scene = Scene::new();
        scene.add_shape(emissive_circle(Vec2::new(5.0, 0.0), 1.0, Vec3::ONE));

        let config = TracerConfig {
            max_steps: 16,
            max_depth: 0,
            ..TracerConfig::default()
        };
        let result = Tracer::new(config).trace(&scene, Vec2::ZERO, Vec2::X, 0);

        assert_abs_diff_eq!(result.radiance.x, 1.0);
    }

    #[test]
    fn exhausted_steps_contribute_nothing() {
        let mut scene = Scene::new();
        scene.add_shape(emissive_circle(Vec2::new(5.0, 0.0), 1.0, Vec3::ONE));

        let config = TracerConfig {
            max_steps: 4,
            max_depth: 0,
            ..TracerConfig::default()
        };
        // Marching away from the only shape
        let result = Tracer::new(config).trace(&scene, Vec2::ZERO, -Vec2::X, 0);

        assert_eq!(result.radiance, Vec3::ZERO);
        assert_eq!(result.steps, 4);
    }

    #[test]
    fn empty_scene_aborts_the_ray() {
        let scene = Scene::new();
        let result = Tracer::new(TracerConfig::default()).trace(&scene, Vec2::ZERO, Vec2::X, 0);

        assert_eq!(result.radiance, Vec3::ZERO);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn depth_limit_stops_reflection_recursion() {
        // Two parallel walls; a reflected path bounces between them
        let mut scene = Scene::new();
        scene.add_shape(emissive_circle(Vec2::new(2.0, 0.0), 1.0, Vec3::ONE));
        scene.add_shape(emissive_circle(Vec2::new(-2.0, 0.0), 1.0, Vec3::ONE));

        let shallow = Tracer::new(TracerConfig {
            max_steps: 8,
            max_depth: 0,
            ..TracerConfig::default()
        })
        .trace(&scene, Vec2::ZERO, Vec2::X, 0);

        let deep = Tracer::new(TracerConfig {
            max_steps: 8,
            max_depth: 2,
            ..TracerConfig::default()
        })
        .trace(&scene, Vec2::ZERO, Vec2::X, 0);

        // Every extra bounce can only add emission
        assert!(deep.radiance.x >= shallow.radiance.x);
        assert_abs_diff_eq!(shallow.radiance.x, 1.0);
    }

    #[test]
    fn validate_rejects_degenerate_settings() {
        let good = TracerConfig::default();
        assert!(good.validate().is_ok());

        assert!(TracerConfig { max_steps: 0, ..good }.validate().is_err());
        assert!(TracerConfig { samples: 0, ..good }.validate().is_err());
        assert!(TracerConfig { epsilon: 0.0, ..good }.validate().is_err());
        assert!(TracerConfig { epsilon: -0.1, ..good }.validate().is_err());
        assert!(TracerConfig { max_depth: 0, ..good }.validate().is_ok());
    }
}
