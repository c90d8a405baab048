//! Named textures.
//!
//! Textures are looked up by name through [`TextureLookup`]. The
//! [`AssetStore`] loads PNGs eagerly from an asset directory and fills any
//! gap with a generated palette, so a partial asset pack still renders.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

use super::connected::{Sides, SIDE_TABLE};
use super::TILE_PIXELS;
use crate::tile::descriptor::texture_names;

/// Sprite names of the player, indexed by facing (up, down, left, right)
/// then animation frame.
pub const PLAYER_SPRITES: [[&str; 4]; 4] = [
    ["player_up_0", "player_up_1", "player_up_2", "player_up_3"],
    ["player_down_0", "player_down_1", "player_down_2", "player_down_3"],
    ["player_left_0", "player_left_1", "player_left_2", "player_left_3"],
    ["player_right_0", "player_right_1", "player_right_2", "player_right_3"],
];

/// Side length of a connected-texture atlas in pixels.
pub const ATLAS_PIXELS: u32 = TILE_PIXELS * 4;

/// Texture loading errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Atlas has the wrong dimensions
    #[error("Atlas {name} is {width}x{height}, expected {ATLAS_PIXELS}x{ATLAS_PIXELS}")]
    BadAtlas {
        /// Atlas name
        name: String,
        /// Actual width
        width: u32,
        /// Actual height
        height: u32,
    },
}

/// Result type for asset loading.
pub type AssetResult<T> = Result<T, AssetError>;

/// Texture lookup by name.
pub trait TextureLookup {
    /// Simple texture.
    ///
    /// # Panics
    /// Panics if the name is unknown.
    fn texture(&self, name: &str) -> &RgbaImage;

    /// Atlas cell of a connected texture.
    ///
    /// # Panics
    /// Panics if the base name is unknown.
    fn connected_texture(&self, base: &str, sides: Sides) -> &RgbaImage;
}

/// In-memory texture store.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    textures: AHashMap<String, RgbaImage>,
    atlases: AHashMap<String, Vec<RgbaImage>>,
}

impl AssetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a generated texture for every name the game uses.
    #[must_use]
    pub fn generated() -> Self {
        let mut store = Self::new();
        let (simple, connected) = texture_names();
        for name in simple {
            store.insert_texture(name, generate_sprite(name));
        }
        for row in PLAYER_SPRITES {
            for name in row {
                store.insert_texture(name, generate_sprite(name));
            }
        }
        for base in connected {
            // Generated atlases always have the right size.
            let _ = store.insert_atlas(base, &generate_atlas(base));
        }
        store
    }

    /// Loads `<dir>/textures/*.png` and `<dir>/textures/connected/*.png`
    /// over the generated palette.
    pub fn load(dir: &Path) -> AssetResult<Self> {
        let mut store = Self::generated();
        let textures = dir.join("textures");
        let mut loaded = 0usize;
        for (path, name) in png_files(&textures)? {
            store.insert_texture(&name, image::open(&path)?.to_rgba8());
            loaded += 1;
        }
        let connected = textures.join("connected");
        if connected.is_dir() {
            for (path, name) in png_files(&connected)? {
                store.insert_atlas(&name, &image::open(&path)?.to_rgba8())?;
                loaded += 1;
            }
        }
        info!("Loaded {} textures from {}", loaded, dir.display());
        Ok(store)
    }

    /// Adds or replaces a simple texture.
    pub fn insert_texture(&mut self, name: &str, image: RgbaImage) {
        self.textures.insert(name.to_owned(), image);
    }

    /// Adds or replaces a connected texture from its 4×4 atlas.
    pub fn insert_atlas(&mut self, name: &str, atlas: &RgbaImage) -> AssetResult<()> {
        let (width, height) = atlas.dimensions();
        if width != ATLAS_PIXELS || height != ATLAS_PIXELS {
            return Err(AssetError::BadAtlas {
                name: name.to_owned(),
                width,
                height,
            });
        }
        let cells = (0..16u8)
            .map(|mask| {
                let (col, row) = SIDE_TABLE[mask as usize];
                imageops::crop_imm(
                    atlas,
                    col * TILE_PIXELS,
                    row * TILE_PIXELS,
                    TILE_PIXELS,
                    TILE_PIXELS,
                )
                .to_image()
            })
            .collect();
        self.atlases.insert(name.to_owned(), cells);
        Ok(())
    }

    /// Whether a simple texture exists.
    #[must_use]
    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    /// Number of simple textures and atlases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len() + self.atlases.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.atlases.is_empty()
    }
}

impl TextureLookup for AssetStore {
    fn texture(&self, name: &str) -> &RgbaImage {
        match self.textures.get(name) {
            Some(image) => image,
            None => panic!("unknown texture {name:?}"),
        }
    }

    fn connected_texture(&self, base: &str, sides: Sides) -> &RgbaImage {
        match self.atlases.get(base) {
            Some(cells) => &cells[sides.mask() as usize],
            None => panic!("unknown connected texture {base:?}"),
        }
    }
}

fn png_files(dir: &Path) -> AssetResult<Vec<(std::path::PathBuf, String)>> {
    if !dir.is_dir() {
        debug!("No texture directory at {}", dir.display());
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "png") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                files.push((path.clone(), stem.to_owned()));
            }
        }
    }
    Ok(files)
}

fn base_color(name: &str) -> [u8; 3] {
    match name {
        "water" => [48, 96, 200],
        "sand" | "sand_stones" => [222, 200, 140],
        "grass" => [86, 160, 70],
        "short_grass" => [60, 140, 50],
        "short_grass_trampled" => [110, 150, 80],
        "flowers_0" => [230, 70, 90],
        "flowers_1" => [240, 220, 70],
        "flowers_2" => [150, 110, 230],
        "red_mushroom" => [200, 40, 40],
        "brown_mushroom" => [140, 95, 60],
        "pine_tree" => [30, 90, 45],
        "sapling" => [70, 150, 60],
        "berry_bush" => [40, 110, 50],
        "berry_bush_picked" => [70, 110, 60],
        "stone" => [130, 130, 135],
        "campfire_lit" => [250, 150, 40],
        "campfire_out" => [90, 70, 60],
        "cave_entrance" => [30, 25, 25],
        "cave_floor" => [95, 85, 80],
        "cave_wall" => [60, 55, 55],
        "cave_exit" => [170, 130, 80],
        _ if name.starts_with("player") => [40, 70, 160],
        _ => [255, 0, 255],
    }
}

fn shade(color: [u8; 3], factor: f32) -> Rgba<u8> {
    let [r, g, b] = color.map(|c| (f32::from(c) * factor).clamp(0.0, 255.0) as u8);
    Rgba([r, g, b, 255])
}

fn fill(image: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgba<u8>) {
    for y in y0..(y0 + h).min(image.height()) {
        for x in x0..(x0 + w).min(image.width()) {
            image.put_pixel(x, y, color);
        }
    }
}

fn generate_sprite(name: &str) -> RgbaImage {
    let color = base_color(name);
    let mut image = RgbaImage::new(TILE_PIXELS, TILE_PIXELS);
    match name {
        "cave_floor" => fill(&mut image, 0, 0, 16, 16, shade(color, 1.0)),
        "cave_exit" => {
            fill(&mut image, 4, 0, 2, 16, shade(color, 1.0));
            fill(&mut image, 10, 0, 2, 16, shade(color, 1.0));
            for rung in [2, 6, 10, 14] {
                fill(&mut image, 6, rung, 4, 1, shade(color, 0.8));
            }
        }
        "pine_tree" => {
            for row in 0..11 {
                let half = row / 2 + 1;
                fill(&mut image, 8 - half, row, half * 2, 1, shade(color, 1.0));
            }
            fill(&mut image, 7, 11, 2, 5, shade([110, 75, 40], 1.0));
        }
        "cave_entrance" => fill(&mut image, 3, 4, 10, 9, shade(color, 1.0)),
        _ if name.starts_with("player") => {
            fill(&mut image, 4, 2, 8, 12, shade(color, 1.0));
            fill(&mut image, 5, 0, 6, 4, shade([230, 190, 150], 1.0));
            let frame = name
                .rsplit('_')
                .next()
                .and_then(|frame| frame.parse::<u32>().ok())
                .unwrap_or(0);
            let stride = [0, 1, 0, 2][frame as usize % 4];
            fill(&mut image, 4 + stride, 14, 2, 2, shade(color, 0.6));
            fill(&mut image, 10 - stride, 14, 2, 2, shade(color, 0.6));
        }
        "sand_stones" => {
            for (x, y) in [(3, 4), (10, 3), (6, 10), (12, 12)] {
                fill(&mut image, x, y, 2, 2, shade([120, 115, 110], 1.0));
            }
        }
        "short_grass" | "short_grass_trampled" => {
            let height = if name == "short_grass" { 6 } else { 2 };
            for x in [2, 5, 8, 11, 14] {
                fill(&mut image, x, 14 - height, 1, height, shade(color, 1.0));
            }
        }
        _ => fill(&mut image, 4, 4, 8, 8, shade(color, 1.0)),
    }
    image
}

fn generate_atlas(base: &str) -> RgbaImage {
    let color = base_color(base);
    let mut atlas = RgbaImage::new(ATLAS_PIXELS, ATLAS_PIXELS);
    for mask in 0..16u8 {
        let sides = Sides::from_mask(mask);
        let (col, row) = sides.atlas_cell();
        let (x0, y0) = (col * TILE_PIXELS, row * TILE_PIXELS);
        fill(&mut atlas, x0, y0, TILE_PIXELS, TILE_PIXELS, shade(color, 1.0));
        let edge = shade(color, 0.7);
        if !sides.left {
            fill(&mut atlas, x0, y0, 2, TILE_PIXELS, edge);
        }
        if !sides.right {
            fill(&mut atlas, x0 + TILE_PIXELS - 2, y0, 2, TILE_PIXELS, edge);
        }
        if !sides.top {
            fill(&mut atlas, x0, y0, TILE_PIXELS, 2, edge);
        }
        if !sides.bottom {
            fill(&mut atlas, x0, y0 + TILE_PIXELS - 2, TILE_PIXELS, 2, edge);
        }
    }
    atlas
}
