use thiserror::Error;

/// Errors surfaced by scene construction and render jobs.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// A shape was constructed with non-positive extents.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A tracer or job setting would produce degenerate output.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// One tile's computation faulted. The rest of the job continues.
    #[error("tile at ({x}, {y}) failed to render: {cause}")]
    TileRenderFailed { x: u32, y: u32, cause: String },
}
