//! Camera in tile space.

use atoll_common::coords::{ChunkCoord, WorldSize, CHUNK_SIZE};

use super::TILE_PIXELS;

/// View rectangle centred on a tile-space position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    center: (f32, f32),
    viewport: (u32, u32),
}

impl Camera {
    /// Camera with a viewport of `width × height` pixels.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            center: (0.0, 0.0),
            viewport: (width, height),
        }
    }

    /// Centres the view on a tile-space position.
    pub fn center_on(&mut self, x: f32, y: f32) {
        self.center = (x, y);
    }

    /// Resizes the viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Tile-space centre.
    #[must_use]
    pub const fn center(&self) -> (f32, f32) {
        self.center
    }

    /// Viewport in pixels.
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// World pixel at the top-left corner of the viewport.
    #[must_use]
    pub fn top_left(&self) -> (i64, i64) {
        let px = f64::from(self.center.0) * f64::from(TILE_PIXELS) - f64::from(self.viewport.0) / 2.0;
        let py = f64::from(self.center.1) * f64::from(TILE_PIXELS) - f64::from(self.viewport.1) / 2.0;
        (px.floor() as i64, py.floor() as i64)
    }

    /// Screen pixel of a tile-space position.
    #[must_use]
    pub fn to_screen(&self, x: f32, y: f32) -> (i64, i64) {
        let (left, top) = self.top_left();
        let px = (f64::from(x) * f64::from(TILE_PIXELS)).floor() as i64;
        let py = (f64::from(y) * f64::from(TILE_PIXELS)).floor() as i64;
        (px - left, py - top)
    }

    /// Chunks of a world overlapping the view, row-major.
    #[must_use]
    pub fn visible_chunks(&self, size: WorldSize) -> Vec<ChunkCoord> {
        if size.chunks_x() == 0 || size.chunks_y() == 0 {
            return Vec::new();
        }
        let chunk_px = i64::from(TILE_PIXELS * CHUNK_SIZE);
        let (left, top) = self.top_left();
        let right = left + i64::from(self.viewport.0) - 1;
        let bottom = top + i64::from(self.viewport.1) - 1;
        let max_x = i64::from(size.chunks_x()) - 1;
        let max_y = i64::from(size.chunks_y()) - 1;

        let world_right = (max_x + 1) * chunk_px;
        let world_bottom = (max_y + 1) * chunk_px;
        if right < 0 || bottom < 0 || left >= world_right || top >= world_bottom {
            return Vec::new();
        }

        let x0 = left.div_euclid(chunk_px).clamp(0, max_x);
        let x1 = right.div_euclid(chunk_px).clamp(0, max_x);
        let y0 = top.div_euclid(chunk_px).clamp(0, max_y);
        let y1 = bottom.div_euclid(chunk_px).clamp(0, max_y);
        (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| ChunkCoord::new(x as i32, y as i32)))
            .collect()
    }
}
