use glam::{Vec2, Vec3};
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// A rectangular region of the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Raw pixels rendered for one tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// Row-major RGBA bytes, 4 per pixel, alpha fixed at 255.
    pub pixels: Vec<u8>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Partitions a `width x height` raster into a fixed `grid_x * grid_y`
/// grid of tiles.
///
/// Tile extents round up, so the last row and column are clamped to the
/// raster bounds when the grid doesn't divide evenly.
pub fn render_tiles(width: u32, height: u32, grid_x: u32, grid_y: u32) -> Vec<Tile> {
    let tile_width = (width + grid_x - 1) / grid_x;
    let tile_height = (height + grid_y - 1) / grid_y;

    let mut tiles = Vec::with_capacity((grid_x as usize) * (grid_y as usize));
    for gy in 0..grid_y {
        for gx in 0..grid_x {
            let x = gx * tile_width;
            let y = gy * tile_height;
            tiles.push(Tile {
                x,
                y,
                width: tile_width.min(width.saturating_sub(x)),
                height: tile_height.min(height.saturating_sub(y)),
            });
        }
    }

    tiles
}

/// Shuffles tile processing order uniformly so progressive delivery
/// reveals the image evenly instead of top-to-bottom.
pub fn shuffle_tiles(tiles: &mut [Tile], rng: &mut Pcg32) {
    tiles.shuffle(rng);
}

/// Maps a raster pixel to its normalized scene-space sampling point.
pub fn sample_point(px: u32, py: u32, width: u32, height: u32) -> Vec2 {
    let w = width as f32;
    let h = height as f32;
    let aspect = w / h;

    Vec2::new(
        ((px as f32) - w / 2.0) / w,
        (((py as f32) - h / 2.0) / h) / aspect,
    )
}

/// Converts unclamped radiance to RGBA bytes. Channels clamp to
/// [0, 255]; alpha is constant 255.
pub fn radiance_to_rgba(color: Vec3) -> [u8; 4] {
    [
        (color.x * 255.0).clamp(0.0, 255.0) as u8,
        (color.y * 255.0).clamp(0.0, 255.0) as u8,
        (color.z * 255.0).clamp(0.0, 255.0) as u8,
        255,
    ]
}
