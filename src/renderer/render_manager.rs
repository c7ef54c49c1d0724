use rand::Rng;
use rand_pcg::Pcg32;
use std::{
    collections::{HashMap, VecDeque},
    sync::mpsc::{channel, Receiver, RecvError, SendError, Sender, TryRecvError},
    thread::JoinHandle,
};

use super::{render_worker, render_worker::WorkerInfo, DispatchMode, RenderJob, RenderStatus};

use crate::{
    error::RenderError,
    film::{self, Tile},
    glimmer_debug, glimmer_error, glimmer_trace,
};

struct TileInfo {
    elapsed_s: f32,
    steps: usize,
}

pub struct Message {
    pub render_id: usize,
    pub status: RenderStatus,
}

pub struct RenderManager {
    pub tx: Sender<Option<Payload>>,
    pub rx: Receiver<Message>,
    pub handle: JoinHandle<()>,
}

pub struct Payload {
    pub render_id: usize,
    pub job: RenderJob,
}

#[derive(Default)]
struct ManagerState {
    active_tiles_total: usize,
    active_tiles_done: usize,
    active_render_id: usize,
    active_workers: usize,
    step_count: usize,
    progressive: bool,
    tile_infos: VecDeque<TileInfo>,
    // Completed tiles held back until the job finishes in batch mode
    held_results: Vec<RenderStatus>,
}

type WorkerMap = HashMap<usize, (Sender<Option<render_worker::Payload>>, JoinHandle<()>)>;

pub fn launch(
    to_parent: Sender<Message>,
    from_parent: Receiver<Option<Payload>>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("RenderManager".into())
        .spawn(move || {
            glimmer_trace!("Render manager: Launch threads");
            let thread_count = num_cpus::get().saturating_sub(1).max(1);
            let (worker_send, from_workers) = channel();
            let workers: WorkerMap = (0..thread_count)
                .map(|thread| {
                    let (to_worker, worker_receive) = channel();
                    let worker_send = worker_send.clone();
                    (
                        thread,
                        (
                            to_worker,
                            std::thread::Builder::new()
                                .name("RenderWorker".into())
                                .spawn(move || {
                                    render_worker::launch(thread, &worker_send, &worker_receive);
                                })
                                .expect("Failed to spawn RenderWorker"),
                        ),
                    )
                })
                .collect();

            'thread: loop {
                let mut state = ManagerState::default();
                let avg_tile_window = 2 * thread_count;

                // Blocking recv to avoid spinlock while no job is active
                let mut previous_message = match from_parent.recv() {
                    Ok(msg) => Some(Ok(msg)),
                    Err(RecvError {}) => {
                        panic!("Render manager: Receive channel disconnected")
                    }
                };
                'work: loop {
                    if previous_message.is_none() {
                        previous_message = Some(from_parent.try_recv());
                    }
                    let payload = match previous_message.take().unwrap() {
                        Ok(Some(payload)) => {
                            glimmer_debug!("Render manager: Received new payload");
                            Some(payload)
                        }
                        Ok(None) => {
                            glimmer_debug!("Render manager: Killed by parent");
                            break 'thread;
                        }
                        Err(TryRecvError::Disconnected) => {
                            panic!("Render manager: Receive channel disconnected")
                        }
                        Err(TryRecvError::Empty) => None,
                    };

                    if let Some(payload) = payload {
                        dispatch_job(payload, &workers, &mut state);
                    } else {
                        let active_workers = state.active_workers;

                        handle_worker_messages(
                            &from_workers,
                            &to_parent,
                            avg_tile_window,
                            &mut state,
                        );

                        let task_finished = active_workers > 0 && state.active_workers == 0;

                        if task_finished {
                            glimmer_trace!("Render manager: Report back");
                            // Batch mode releases every held tile at once
                            for status in state.held_results.drain(..) {
                                send_status(&to_parent, state.active_render_id, status);
                            }
                            send_status(
                                &to_parent,
                                state.active_render_id,
                                RenderStatus::Finished {
                                    step_count: state.step_count,
                                },
                            );
                            break 'work;
                        }
                    }
                }
            }

            // Kill workers after being killed
            for (tx, _) in workers.values() {
                // No need to check for error, worker having disconnected, since that's our goal
                drop(tx.send(None));
            }

            glimmer_debug!("Render manager: End");
        })
        .expect("Failed to spawn RenderManager")
}

/// Builds the shuffled tile list and deals each worker its own payload of
/// owned data: a slice of tiles, a deep scene clone and the tracer
/// settings.
fn dispatch_job(payload: Payload, workers: &WorkerMap, state: &mut ManagerState) {
    let Payload { render_id, job } = payload;

    let job_seed: u64 = rand::thread_rng().gen();
    let mut rng = Pcg32::new(job_seed, 0);

    let mut tiles = film::render_tiles(job.width, job.height, job.grid_x, job.grid_y);
    film::shuffle_tiles(&mut tiles, &mut rng);
    let tile_count = tiles.len();

    let progressive = job.mode == DispatchMode::Progressive;

    // Progressive mode keeps the whole queue on one worker so tiles stream
    // out in shuffle order; batch mode deals tiles round-robin across the
    // pool
    let queue_count = if progressive {
        1
    } else {
        workers.len().min(tile_count).max(1)
    };
    let mut queues: Vec<VecDeque<Tile>> = vec![VecDeque::new(); queue_count];
    for (i, tile) in tiles.into_iter().enumerate() {
        queues[i % queue_count].push_back(tile);
    }

    let mut active_workers = 0;
    for ((tx, _), tiles) in workers.values().zip(queues.into_iter()) {
        let worker_payload = render_worker::Payload {
            render_id,
            tiles,
            width: job.width,
            height: job.height,
            scene: job.scene.clone(),
            tracer: job.tracer,
            seed: job_seed,
        };

        if let Err(SendError { .. }) = tx.send(Some(worker_payload)) {
            panic!("dispatch_job: Worker has been terminated");
        }

        active_workers += 1;
    }

    *state = ManagerState {
        active_tiles_total: tile_count,
        active_render_id: render_id,
        active_workers,
        progressive,
        ..ManagerState::default()
    };
}

fn handle_worker_messages(
    from_workers: &Receiver<render_worker::Message>,
    to_parent: &Sender<Message>,
    avg_tile_window: usize,
    state: &mut ManagerState,
) {
    while let Ok(msg) = from_workers.try_recv() {
        match msg {
            render_worker::Message::Finished(WorkerInfo {
                thread_id,
                render_id,
            }) => {
                if render_id == state.active_render_id {
                    glimmer_trace!("Render manager: Worker {} finished", thread_id);
                    state.active_workers -= 1;
                } else {
                    glimmer_trace!("Render manager: Worker {} finished stale work", thread_id);
                }
            }
            render_worker::Message::TileDone {
                info,
                result,
                steps,
                elapsed_s,
            } => {
                if info.render_id != state.active_render_id {
                    glimmer_trace!(
                        "Render manager: Worker {} finished a stale tile",
                        info.thread_id
                    );
                    continue;
                }

                state.step_count += steps;

                if state.tile_infos.len() >= avg_tile_window {
                    state.tile_infos.pop_front();
                }
                state.tile_infos.push_back(TileInfo { elapsed_s, steps });

                state.active_tiles_done += 1;

                let avg_s_per_tile = state
                    .tile_infos
                    .iter()
                    .map(|TileInfo { elapsed_s, .. }| elapsed_s)
                    .sum::<f32>()
                    / (state.tile_infos.len() as f32);

                let approx_remaining_s = avg_s_per_tile
                    * ((state.active_tiles_total - state.active_tiles_done) as f32)
                    / (state.active_workers as f32);

                let current_steps_per_s = state
                    .tile_infos
                    .iter()
                    // Sum of averages to downplay overtly expensive tiles
                    .map(|&TileInfo { elapsed_s, steps }| (steps as f32) / elapsed_s)
                    .sum::<f32>()
                    / (state.tile_infos.len() as f32)
                    * (state.active_workers as f32);

                let status = RenderStatus::TileDone {
                    result,
                    tiles_done: state.active_tiles_done,
                    tiles_total: state.active_tiles_total,
                    approx_remaining_s,
                    current_steps_per_s,
                };

                if state.progressive {
                    send_status(to_parent, state.active_render_id, status);
                } else {
                    state.held_results.push(status);
                }
            }
            render_worker::Message::TileFailed { info, x, y, cause } => {
                if info.render_id != state.active_render_id {
                    continue;
                }

                state.active_tiles_done += 1;

                // Failures surface immediately in both modes
                send_status(
                    to_parent,
                    state.active_render_id,
                    RenderStatus::TileFailed {
                        error: RenderError::TileRenderFailed { x, y, cause },
                    },
                );
            }
        }
    }
}

fn send_status(to_parent: &Sender<Message>, render_id: usize, status: RenderStatus) {
    if let Err(why) = to_parent.send(Message { render_id, status }) {
        glimmer_error!("Render manager: Error sending status to parent: {}", why);
    }
}
