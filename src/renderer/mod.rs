mod render_manager;
mod render_worker;

use render_manager::RenderManager;

use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, SendError, TryRecvError};
use strum::{Display, EnumString, EnumVariantNames};

use crate::{
    error::RenderError, film::RenderResult, glimmer_debug, scene::Scene, tracer::TracerConfig,
};

/// How tiles are dispatched to workers and when results are delivered.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    Display,
    EnumString,
    EnumVariantNames,
)]
pub enum DispatchMode {
    /// All tiles render concurrently across the worker pool; every result
    /// is held back until the whole job has finished.
    #[default]
    Batch,
    /// A single worker renders the shuffled tiles in order, emitting each
    /// result as soon as it completes. Lower latency to the first visible
    /// tile, lower total throughput.
    Progressive,
}

/// A complete render job description.
///
/// Carries plain data only; no live object graph crosses a thread
/// boundary. Workers construct their own owned tracing state from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub width: u32,
    pub height: u32,
    pub grid_x: u32,
    pub grid_y: u32,
    pub scene: Scene,
    pub tracer: TracerConfig,
    pub mode: DispatchMode,
}

impl RenderJob {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfiguration(format!(
                "raster dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.grid_x == 0 || self.grid_y == 0 {
            return Err(RenderError::InvalidConfiguration(format!(
                "tile grid must be positive, got {}x{}",
                self.grid_x, self.grid_y
            )));
        }
        self.tracer.validate()
    }
}

/// Status of the active render task.
pub enum RenderStatus {
    TileDone {
        result: RenderResult,
        tiles_done: usize,
        tiles_total: usize,
        approx_remaining_s: f32,
        current_steps_per_s: f32,
    },
    TileFailed {
        error: RenderError,
    },
    Finished {
        step_count: usize,
    },
}

/// Public handle to the render task pool.
pub struct Renderer {
    manager: Option<RenderManager>,
    render_in_progress: bool,
    render_id: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            manager: None,
            render_in_progress: false,
            render_id: 0,
        }
    }

    /// Checks if a render task is active.
    pub fn is_active(&self) -> bool {
        self.render_in_progress
    }

    /// Drains pending status messages from the active render task.
    /// Statuses from overridden jobs are dropped.
    pub fn check_status(&mut self) -> Vec<RenderStatus> {
        let mut statuses = Vec::new();
        if self.manager.is_some() && self.render_in_progress {
            loop {
                match self.manager.as_ref().unwrap().rx.try_recv() {
                    Ok(render_manager::Message { render_id, status }) => {
                        if render_id != self.render_id {
                            glimmer_debug!("check_status: Dropping stale render status");
                            continue;
                        }
                        if let RenderStatus::Finished { .. } = status {
                            glimmer_debug!("check_status: Render job has finished");
                            self.render_in_progress = false;
                        }
                        statuses.push(status);
                    }
                    Err(TryRecvError::Empty) => {
                        break;
                    }
                    Err(TryRecvError::Disconnected) => {
                        panic!("check_status: Render manager has been terminated");
                    }
                }
            }
        }
        statuses
    }

    pub fn kill(&mut self) {
        if let Some(RenderManager { tx, handle, .. }) = self.manager.take() {
            drop(tx.send(None));
            handle.join().unwrap();
        }
    }

    /// Launches a new render task, overriding the previous one if one is
    /// still running.
    pub fn launch(&mut self, job: RenderJob) -> Result<(), RenderError> {
        job.validate()?;

        self.render_id += 1;

        if self.manager.is_none() {
            let (tx, manager_rx) = channel();
            let (manager_tx, rx) = channel();

            let handle = render_manager::launch(manager_tx, manager_rx);

            self.manager = Some(RenderManager { tx, rx, handle });
        }
        let manager = self.manager.as_ref().unwrap();

        glimmer_debug!("launch: Sending new payload");
        match manager.tx.send(Some(render_manager::Payload {
            render_id: self.render_id,
            job,
        })) {
            Ok(()) => {
                self.render_in_progress = true;
            }
            Err(SendError(_)) => {
                panic!("launch: Render manager has been terminated");
            }
        }

        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.kill();
    }
}
