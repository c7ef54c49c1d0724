use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{Receiver, RecvError, Sender, TryRecvError},
    time::Instant,
};

use crate::{
    film::{self, RenderResult, Tile},
    glimmer_debug, glimmer_error, glimmer_trace,
    sampling::DirectionalSampler,
    scene::Scene,
    tracer::TracerConfig,
};

pub enum Message {
    TileDone {
        info: WorkerInfo,
        result: RenderResult,
        steps: usize,
        elapsed_s: f32,
    },
    TileFailed {
        info: WorkerInfo,
        x: u32,
        y: u32,
        cause: String,
    },
    Finished(WorkerInfo),
}

#[derive(Clone, Copy)]
pub struct WorkerInfo {
    pub render_id: usize,
    pub thread_id: usize,
}

/// One worker's share of a render job. Everything is owned; the scene
/// clone was made for this worker alone.
pub struct Payload {
    pub render_id: usize,
    pub tiles: VecDeque<Tile>,
    pub width: u32,
    pub height: u32,
    pub scene: Scene,
    pub tracer: TracerConfig,
    pub seed: u64,
}

pub fn launch(thread_id: usize, to_parent: &Sender<Message>, from_parent: &Receiver<Option<Payload>>) {
    glimmer_debug!("Render thread {}: Begin", thread_id);

    'thread: loop {
        // Blocking recv to avoid spinlock while there is no work
        let mut payload = match from_parent.recv() {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                glimmer_debug!("Render thread {}: Killed by parent", thread_id);
                break 'thread;
            }
            Err(RecvError {}) => {
                panic!("Render thread {}: Receive channel disconnected", thread_id)
            }
        };

        'job: loop {
            glimmer_debug!("Render thread {}: Received new payload", thread_id);

            let Payload {
                render_id,
                mut tiles,
                width,
                height,
                scene,
                tracer,
                seed,
            } = payload;
            let worker_info = WorkerInfo {
                render_id,
                thread_id,
            };

            // Owned sampling state built from the job description before
            // any tile is touched; decorrelated from the other workers
            // through the rng stream
            let mut sampler = DirectionalSampler::with_rng(tracer, seed, thread_id as u64);

            let mut newer_payload = None;
            while let Some(tile) = tiles.pop_front() {
                // Poll for a kill or an overriding job between tiles
                match from_parent.try_recv() {
                    Ok(Some(new_payload)) => {
                        glimmer_debug!("Render thread {}: Interrupted by parent", thread_id);
                        newer_payload = Some(new_payload);
                        break;
                    }
                    Ok(None) => {
                        glimmer_debug!("Render thread {}: Killed by parent", thread_id);
                        break 'thread;
                    }
                    Err(TryRecvError::Disconnected) => {
                        panic!("Render thread {}: Receive channel disconnected", thread_id)
                    }
                    Err(TryRecvError::Empty) => (),
                }

                glimmer_trace!("Render thread {}: Render tile {:?}", thread_id, tile);
                let tile_start = Instant::now();
                match render_tile(&scene, &mut sampler, tile, width, height) {
                    Ok((result, steps)) => {
                        if let Err(why) = to_parent.send(Message::TileDone {
                            info: worker_info,
                            result,
                            steps,
                            elapsed_s: tile_start.elapsed().as_secs_f32(),
                        }) {
                            glimmer_error!(
                                "Render thread {}: Error notifying parent on tile done: {}",
                                thread_id,
                                why
                            );
                        }
                    }
                    Err(cause) => {
                        glimmer_error!(
                            "Render thread {}: Tile ({}, {}) failed: {}",
                            thread_id,
                            tile.x,
                            tile.y,
                            cause
                        );
                        if let Err(why) = to_parent.send(Message::TileFailed {
                            info: worker_info,
                            x: tile.x,
                            y: tile.y,
                            cause,
                        }) {
                            glimmer_error!(
                                "Render thread {}: Error notifying parent on tile failure: {}",
                                thread_id,
                                why
                            );
                        }
                    }
                }
            }

            match newer_payload {
                Some(new_payload) => {
                    // The stale job's remaining tiles are dropped
                    payload = new_payload;
                }
                None => {
                    glimmer_trace!("Render thread {}: Signal done", thread_id);
                    if let Err(why) = to_parent.send(Message::Finished(worker_info)) {
                        glimmer_error!(
                            "Render thread {}: Error notifying parent on finish: {}",
                            thread_id,
                            why
                        );
                    }
                    break 'job;
                }
            }
        }
    }
}

/// Renders every pixel of `tile`, also returning the marching steps spent.
///
/// A fault inside the tile computation is caught and reported so the rest
/// of the job can proceed.
fn render_tile(
    scene: &Scene,
    sampler: &mut DirectionalSampler,
    tile: Tile,
    width: u32,
    height: u32,
) -> Result<(RenderResult, usize), String> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let mut pixels = Vec::with_capacity((tile.width as usize) * (tile.height as usize) * 4);
        let mut steps = 0;

        for y in 0..tile.height {
            for x in 0..tile.width {
                let point = film::sample_point(tile.x + x, tile.y + y, width, height);

                let sample = sampler.sample(scene, point);
                steps += sample.steps;

                pixels.extend_from_slice(&film::radiance_to_rgba(sample.radiance));
            }
        }

        (
            RenderResult {
                pixels,
                x: tile.x,
                y: tile.y,
                width: tile.width,
                height: tile.height,
            },
            steps,
        )
    }))
    .map_err(|panic_payload| {
        if let Some(message) = panic_payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_string()
        }
    })
}
