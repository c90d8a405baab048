//! CPU-side 2D rendering.
//!
//! Tiles are painted into cached per-chunk surfaces; the world blits those
//! surfaces into a [`BlitTarget`] each frame.

pub mod camera;
pub mod connected;
pub mod textures;
mod view;

use atoll_common::coords::CHUNK_SIZE;
use image::{imageops, Rgba, RgbaImage};

use crate::tile::{descriptor, TextureSpec, Tile, TileView, Underlay};

pub use camera::Camera;
pub use connected::{resolve_sides, Sides};
pub use textures::{AssetError, AssetResult, AssetStore, TextureLookup, PLAYER_SPRITES};
pub use view::DrawStats;

/// Side length of a tile in pixels.
pub const TILE_PIXELS: u32 = 16;
/// Side length of a chunk surface in pixels.
pub const CHUNK_PIXELS: u32 = TILE_PIXELS * CHUNK_SIZE;

/// Surface that images can be drawn onto.
pub trait BlitTarget {
    /// Alpha-blends `image` with its top-left corner at `(x, y)`, clipping.
    fn blit(&mut self, image: &RgbaImage, x: i64, y: i64);

    /// Fills a rectangle, clipping.
    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>);

    /// Size in pixels.
    fn size(&self) -> (u32, u32);
}

impl BlitTarget for RgbaImage {
    fn blit(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(self, image, x, y);
    }

    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(width)).min(i64::from(self.width()));
        let y1 = (y + i64::from(height)).min(i64::from(self.height()));
        for py in y0..y1 {
            for px in x0..x1 {
                self.put_pixel(px as u32, py as u32, color);
            }
        }
    }

    fn size(&self) -> (u32, u32) {
        self.dimensions()
    }
}

/// Draws one tile (underlay, then texture) at a pixel offset.
pub fn draw_tile<T: BlitTarget + ?Sized>(
    tile: &Tile,
    target: &mut T,
    x: i64,
    y: i64,
    textures: &dyn TextureLookup,
    view: &dyn TileView,
) {
    let entry = descriptor(tile.kind());
    let underlay = match entry.underlay {
        Underlay::None => None,
        Underlay::Ground => Some(view.world_type().ground()),
        Underlay::Kind(kind) => Some(kind),
    };
    if let Some(kind) = underlay {
        match descriptor(kind).texture {
            TextureSpec::Connected { base, .. } => {
                target.blit(textures.connected_texture(base, Sides::ALL), x, y);
            }
            TextureSpec::Simple(name) => target.blit(textures.texture(name), x, y),
            TextureSpec::None => {}
        }
    }

    match entry.texture {
        TextureSpec::None => {}
        TextureSpec::Connected { base, connects_to } => {
            let sides = resolve_sides(tile.pos(), connects_to, view);
            target.blit(textures.connected_texture(base, sides), x, y);
        }
        TextureSpec::Simple(_) => {
            if let Some(name) = tile.texture_name() {
                target.blit(textures.texture(name), x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips() {
        let mut image = RgbaImage::new(4, 4);
        let red = Rgba([255, 0, 0, 255]);
        image.fill_rect(-2, 2, 10, 10, red);
        assert_eq!(image.get_pixel(0, 3), &red);
        assert_eq!(image.get_pixel(3, 2), &red);
        assert_eq!(image.get_pixel(0, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_blit_clips_at_edges() {
        let mut image = RgbaImage::new(8, 8);
        let sprite = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));
        image.blit(&sprite, -2, 6);
        assert_eq!(image.get_pixel(0, 7), &Rgba([0, 255, 0, 255]));
        assert_eq!(image.get_pixel(2, 7), &Rgba([0, 0, 0, 0]));
        assert_eq!(image.size(), (8, 8));
    }
}
