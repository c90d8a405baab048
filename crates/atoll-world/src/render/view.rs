use atoll_common::coords::ChunkCoord;
use image::Rgba;

use super::{BlitTarget, Camera, TextureLookup, CHUNK_PIXELS, TILE_PIXELS};
use crate::chunk::Chunk;
use crate::world::World;

const BORDER_COLOR: Rgba<u8> = Rgba([255, 255, 0, 160]);
const PENDING_COLOR: Rgba<u8> = Rgba([255, 0, 255, 96]);

/// Per-frame render counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Chunk surfaces blitted
    pub chunks_drawn: usize,
    /// Chunk surfaces repainted this frame
    pub chunks_redrawn: usize,
}

impl World {
    /// Draws every chunk overlapping the camera into `target`.
    ///
    /// Visible chunks that are not resident are requested as a side effect.
    /// Stale surfaces are repainted before blitting. With `debug` set, chunk
    /// borders are outlined and pending chunks tinted.
    pub fn draw<T: BlitTarget + ?Sized>(
        &mut self,
        target: &mut T,
        camera: &Camera,
        textures: &dyn TextureLookup,
        debug: bool,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        let (left, top) = camera.top_left();

        for coord in camera.visible_chunks(self.size()) {
            if self.chunk_at(coord).is_none() {
                continue;
            }
            if self.refresh_surface(coord, textures) {
                stats.chunks_redrawn += 1;
            }
            let Some(chunk) = self.resident_chunk(coord) else {
                continue;
            };
            let origin = coord.origin();
            let x = i64::from(origin.x) * i64::from(TILE_PIXELS) - left;
            let y = i64::from(origin.y) * i64::from(TILE_PIXELS) - top;
            if let Some(surface) = chunk.surface() {
                target.blit(surface, x, y);
                stats.chunks_drawn += 1;
            }
            if debug {
                draw_chunk_outline(target, chunk, x, y);
            }
        }
        stats
    }

    /// Repaints a chunk's cached surface if it is stale. Returns whether it
    /// was repainted.
    fn refresh_surface(&mut self, coord: ChunkCoord, textures: &dyn TextureLookup) -> bool {
        let Some(mut surface) = self.take_stale_surface(coord) else {
            return false;
        };
        if let Some(chunk) = self.resident_chunk(coord) {
            chunk.render_into(&mut surface, textures, self);
        }
        if let Some(chunk) = self.chunk_mut(coord) {
            chunk.store_surface(surface);
        }
        true
    }
}

fn draw_chunk_outline<T: BlitTarget + ?Sized>(target: &mut T, chunk: &Chunk, x: i64, y: i64) {
    if chunk.is_placeholder() {
        target.fill_rect(x, y, CHUNK_PIXELS, CHUNK_PIXELS, PENDING_COLOR);
    }
    target.fill_rect(x, y, CHUNK_PIXELS, 1, BORDER_COLOR);
    target.fill_rect(x, y, 1, CHUNK_PIXELS, BORDER_COLOR);
}
