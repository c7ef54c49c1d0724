//! A 2D signed-distance-field renderer.
//!
//! Scenes are built from SDF primitives; each pixel's radiance is a Monte
//! Carlo average over sphere-traced rays with recursive reflections. The
//! raster is decomposed into shuffled tiles rendered by a pool of isolated
//! worker threads that communicate through messages only.

mod macros;

mod error;
mod film;
mod logging;
mod material;
mod renderer;
mod sampling;
mod scene;
mod shapes;
mod tracer;

pub use error::RenderError;
pub use film::{radiance_to_rgba, render_tiles, sample_point, shuffle_tiles, RenderResult, Tile};
pub use logging::setup_logger;
pub use material::Material;
pub use renderer::{DispatchMode, RenderJob, RenderStatus, Renderer};
pub use sampling::{DirectionalSampler, SampleResult};
pub use scene::Scene;
pub use shapes::{Circle, HitInfo, Rect, Shape};
pub use tracer::{reflect, TraceResult, Tracer, TracerConfig};
