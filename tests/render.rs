use std::{
    thread,
    time::{Duration, Instant},
};

use glam::{Vec2, Vec3};

use glimmer::{
    Circle, DispatchMode, Material, RenderJob, RenderResult, RenderStatus, Renderer, Scene,
    TracerConfig,
};

const WIDTH: u32 = 16;
const HEIGHT: u32 = 16;
const GRID: u32 = 4;

fn emissive_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add_shape(Circle::new(Vec2::ZERO, 0.3, Material::emissive(Vec3::ONE)).unwrap());
    scene
}

fn job(mode: DispatchMode) -> RenderJob {
    RenderJob {
        width: WIDTH,
        height: HEIGHT,
        grid_x: GRID,
        grid_y: GRID,
        scene: emissive_scene(),
        tracer: TracerConfig {
            max_steps: 4,
            max_depth: 0,
            samples: 8,
            epsilon: 0.01,
        },
        mode,
    }
}

/// Runs one job to completion, returning the tile results in delivery
/// order and whether any arrived before the finish status.
fn run_to_completion(mode: DispatchMode) -> (Vec<RenderResult>, bool) {
    let mut renderer = Renderer::new();
    renderer.launch(job(mode)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut results = Vec::new();
    let mut tiles_before_finish = false;
    'poll: loop {
        assert!(Instant::now() < deadline, "render timed out");

        for status in renderer.check_status() {
            match status {
                RenderStatus::TileDone {
                    result,
                    tiles_total,
                    ..
                } => {
                    assert_eq!(tiles_total, (GRID * GRID) as usize);
                    results.push(result);
                }
                RenderStatus::TileFailed { error } => panic!("{error}"),
                RenderStatus::Finished { step_count } => {
                    assert!(step_count > 0);
                    tiles_before_finish = !results.is_empty();
                    break 'poll;
                }
            }
        }

        thread::sleep(Duration::from_millis(5));
    }

    assert!(!renderer.is_active());
    (results, tiles_before_finish)
}

/// Asserts the tiles reassemble into a full raster with the expected
/// pixels: opaque everywhere, white inside the emitter.
fn check_coverage(results: &[RenderResult]) {
    assert_eq!(results.len(), (GRID * GRID) as usize);

    let mut covered = vec![0u8; (WIDTH * HEIGHT) as usize];
    let mut frame = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    for result in results {
        assert_eq!(
            result.pixels.len(),
            (result.width * result.height * 4) as usize
        );
        for y in 0..result.height {
            for x in 0..result.width {
                let pixel = (y * result.width + x) as usize * 4;
                let global = ((result.y + y) * WIDTH + result.x + x) as usize;
                covered[global] += 1;
                frame[global * 4..global * 4 + 4]
                    .copy_from_slice(&result.pixels[pixel..pixel + 4]);
            }
        }
    }
    assert!(covered.iter().all(|&count| count == 1));

    // Alpha is constant 255
    assert!(frame.chunks_exact(4).all(|px| px[3] == 255));

    // The raster center maps to the scene origin, inside the emitter, so
    // every sampled direction hits immediately
    let center = ((HEIGHT / 2) * WIDTH + WIDTH / 2) as usize * 4;
    assert_eq!(&frame[center..center + 4], &[255, 255, 255, 255]);
}

#[test]
fn batch_render_covers_the_raster() {
    let (results, _) = run_to_completion(DispatchMode::Batch);
    check_coverage(&results);
}

#[test]
fn progressive_render_streams_tiles() {
    let (results, tiles_before_finish) = run_to_completion(DispatchMode::Progressive);
    check_coverage(&results);
    assert!(tiles_before_finish);
}

#[test]
fn relaunch_overrides_active_job() {
    let mut renderer = Renderer::new();
    renderer.launch(job(DispatchMode::Batch)).unwrap();
    renderer.launch(job(DispatchMode::Batch)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut results = Vec::new();
    'poll: loop {
        assert!(Instant::now() < deadline, "render timed out");
        for status in renderer.check_status() {
            match status {
                RenderStatus::TileDone { result, .. } => results.push(result),
                RenderStatus::TileFailed { error } => panic!("{error}"),
                RenderStatus::Finished { .. } => break 'poll,
            }
        }
        thread::sleep(Duration::from_millis(5));
    }

    // Only the overriding job's tiles come through
    check_coverage(&results);
}

#[test]
fn launch_rejects_degenerate_jobs() {
    let mut renderer = Renderer::new();

    let mut zero_width = job(DispatchMode::Batch);
    zero_width.width = 0;
    assert!(renderer.launch(zero_width).is_err());

    let mut zero_grid = job(DispatchMode::Batch);
    zero_grid.grid_y = 0;
    assert!(renderer.launch(zero_grid).is_err());

    let mut zero_samples = job(DispatchMode::Batch);
    zero_samples.tracer.samples = 0;
    assert!(renderer.launch(zero_samples).is_err());

    assert!(!renderer.is_active());
}
