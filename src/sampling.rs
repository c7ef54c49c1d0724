use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use crate::{
    scene::Scene,
    tracer::{Tracer, TracerConfig},
};

/// The outcome of one directional sampling sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleResult {
    /// Average radiance over the sweep. Unclamped; channels may exceed 1.
    pub radiance: Vec3,
    /// Marching iterations spent across all traced rays.
    pub steps: usize,
}

/// Estimates incoming light at a point by tracing stratified directions
/// around the full circle and averaging the gathered emission.
///
/// This is a crude Monte Carlo estimate: uniform angular strata share one
/// random rotation per sweep, with no importance sampling or BRDF
/// weighting.
pub struct DirectionalSampler {
    tracer: Tracer,
    step_angle: f32,
    rng: Pcg32,
    // Stored so per-worker clones can pick an uncorrelated stream
    rng_seed: u64,
}

impl DirectionalSampler {
    /// Creates a sampler seeded from the thread rng.
    pub fn new(config: TracerConfig) -> Self {
        Self::with_rng(config, rand::thread_rng().gen(), 0)
    }

    /// Creates a sampler with a known prng seed and stream, for
    /// deterministic use.
    pub fn with_rng(config: TracerConfig, seed: u64, stream: u64) -> Self {
        Self {
            tracer: Tracer::new(config),
            step_angle: TAU / (config.samples as f32),
            rng: Pcg32::new(seed, stream),
            rng_seed: seed,
        }
    }

    /// Clones this sampler onto a different prng stream. PCG streams are
    /// uncorrelated, which decorrelates concurrent workers sharing a seed.
    pub fn for_stream(&self, stream: u64) -> Self {
        Self::with_rng(*self.tracer.config(), self.rng_seed, stream)
    }

    pub fn config(&self) -> &TracerConfig {
        self.tracer.config()
    }

    /// Fires `samples` stratified directions from `point` through the
    /// scene and averages the traced emission.
    pub fn sample(&mut self, scene: &Scene, point: Vec2) -> SampleResult {
        let samples = self.config().samples;

        // One shared rotation for the whole sweep
        let rotation = (self.rng.gen::<f32>() - 0.5) * TAU;

        let mut color = Vec3::ZERO;
        let mut steps = 0;
        let mut angle = 0.0_f32;
        for _ in 0..samples {
            let direction = Vec2::new((angle + rotation).cos(), (angle + rotation).sin());

            let result = self.tracer.trace(scene, point, direction, 0);
            color += result.radiance;
            steps += result.steps;

            angle += self.step_angle;
        }

        SampleResult {
            radiance: color / (samples as f32),
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{material::Material, shapes::Circle};
    use approx::assert_abs_diff_eq;

    fn sampler(config: TracerConfig) -> DirectionalSampler {
        DirectionalSampler::with_rng(config, 0x73B9_642E_74AC_471C, 0)
    }

    #[test]
    fn enclosing_emitter_averages_to_its_emission() {
        // Every direction hits immediately from inside, so the average is
        // exactly the per-direction emission
        let mut scene = Scene::new();
        scene.add_shape(
            Circle::new(Vec2::ZERO, 2.0, Material::emissive(Vec3::new(0.25, 0.5, 0.75))).unwrap(),
        );

        let config = TracerConfig {
            samples: 16,
            max_depth: 0,
            ..TracerConfig::default()
        };
        let result = sampler(config).sample(&scene, Vec2::ZERO);

        assert_abs_diff_eq!(result.radiance.x, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(result.radiance.y, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.radiance.z, 0.75, epsilon = 1e-6);
        assert_eq!(result.steps, 16);
    }

    #[test]
    fn point_emitter_hits_every_stratified_direction() {
        let mut scene = Scene::new();
        scene.add_shape(Circle::new(Vec2::ZERO, 0.2, Material::emissive(Vec3::ONE)).unwrap());

        let config = TracerConfig {
            samples: 8,
            max_steps: 4,
            max_depth: 0,
            epsilon: 0.01,
        };
        let result = sampler(config).sample(&scene, Vec2::ZERO);

        assert_abs_diff_eq!(result.radiance.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.radiance.y, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.radiance.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_scene_samples_black() {
        let scene = Scene::new();
        let result = sampler(TracerConfig::default()).sample(&scene, Vec2::new(0.3, -0.7));

        assert_eq!(result.radiance, Vec3::ZERO);
    }

    #[test]
    fn streams_decorrelate_but_share_the_seed() {
        let base = sampler(TracerConfig::default());
        let clone = base.for_stream(7);

        assert_eq!(base.config(), clone.config());
        assert_eq!(base.rng_seed, clone.rng_seed);
    }
}
