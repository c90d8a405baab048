//! Procedural chunk generation.
//!
//! Generation is a pure function of the world seed and the chunk coordinate,
//! so any chunk can be regenerated at any time and on any thread.

pub mod cave;
pub mod overworld;
pub mod worker;

use atoll_common::coords::ChunkCoord;
use noise::{Fbm, MultiFractal, NoiseFn, Value};

use crate::chunk::Chunk;
use crate::meta::{WorldMeta, WorldType};

pub use cave::CaveGenerator;
pub use overworld::OverworldGenerator;
pub use worker::GeneratorWorker;

/// Octaves of every noise layer.
pub const NOISE_OCTAVES: usize = 4;
/// Persistence of every noise layer.
pub const NOISE_PERSISTENCE: f64 = 0.5;

/// Produces chunks for one world.
pub trait ChunkGenerator: Send {
    /// Generates the chunk at `coord`.
    fn generate(&self, coord: ChunkCoord) -> Chunk;

    /// World type this generator produces.
    fn world_type(&self) -> WorldType;
}

/// Creates the generator matching a world's type and seed.
#[must_use]
pub fn generator_for(meta: &WorldMeta) -> Box<dyn ChunkGenerator> {
    match meta.world_type {
        WorldType::Overworld => Box::new(OverworldGenerator::new(meta.seed, meta.size)),
        WorldType::Cave => Box::new(CaveGenerator::new(meta.seed, meta.size)),
    }
}

/// Splits a world seed into independent noise seeds, in a fixed order.
#[must_use]
pub fn sub_seeds<const N: usize>(seed: i64) -> [u32; N] {
    let mut rng = fastrand::Rng::with_seed(seed as u64);
    std::array::from_fn(|_| rng.u32(..))
}

/// Fractal value noise sampled in tile space, returning values in `[0, 2]`.
#[derive(Debug, Clone)]
pub struct NoiseLayer {
    fbm: Fbm<Value>,
    scale: f64,
}

impl NoiseLayer {
    /// Creates a layer; `scale` converts tiles to noise space.
    #[must_use]
    pub fn new(seed: u32, scale: f64) -> Self {
        let fbm = Fbm::<Value>::new(seed)
            .set_octaves(NOISE_OCTAVES)
            .set_persistence(NOISE_PERSISTENCE);
        Self { fbm, scale }
    }

    /// Samples at a tile-space position.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        (self.fbm.get([x * self.scale, y * self.scale]) + 1.0).clamp(0.0, 2.0)
    }
}

/// Seeds a PRNG from a noise value and a position.
#[must_use]
pub(crate) fn position_rng(noise_value: f64, x: i32, y: i32) -> fastrand::Rng {
    let position = (u64::from(x as u32) << 32) | u64::from(y as u32);
    let seed = noise_value.to_bits() ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    fastrand::Rng::with_seed(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_seeds_are_stable() {
        let a: [u32; 3] = sub_seeds(42);
        let b: [u32; 3] = sub_seeds(42);
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
        assert_ne!(sub_seeds::<3>(43), a);
    }

    #[test]
    fn test_noise_layer_range() {
        let layer = NoiseLayer::new(7, 1.0 / 48.0);
        for i in 0..500 {
            let v = layer.sample(f64::from(i) * 3.7, f64::from(i) * 1.3);
            assert!((0.0..=2.0).contains(&v));
        }
    }
}
