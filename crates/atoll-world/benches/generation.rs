use criterion::{black_box, criterion_group, criterion_main, Criterion};

use atoll_common::coords::{ChunkCoord, TilePos, WorldSize};
use atoll_world::generation::{generator_for, ChunkGenerator};
use atoll_world::meta::WorldMeta;
use atoll_world::render::{AssetStore, Sides, TextureLookup};
use atoll_world::storage::codec::encode_chunk;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_chunk");
    let overworld = WorldMeta::overworld("bench", 1, WorldSize::square(1024));
    let cave = WorldMeta::cave(&overworld, TilePos::new(512, 512), WorldSize::square(256));

    let generator = generator_for(&overworld);
    group.bench_function("overworld_centre", |b| {
        b.iter(|| black_box(generator.generate(black_box(ChunkCoord::new(32, 32)))));
    });
    let generator = generator_for(&cave);
    group.bench_function("cave", |b| {
        b.iter(|| black_box(generator.generate(black_box(ChunkCoord::new(5, 5)))));
    });
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let meta = WorldMeta::overworld("bench", 1, WorldSize::square(1024));
    let chunk = generator_for(&meta).generate(ChunkCoord::new(30, 33));
    c.bench_function("encode_chunk", |b| {
        b.iter(|| black_box(encode_chunk(black_box(&chunk)).unwrap()));
    });
}

fn bench_texture_lookup(c: &mut Criterion) {
    let store = AssetStore::generated();
    c.bench_function("connected_lookup", |b| {
        b.iter(|| {
            for mask in 0..16u8 {
                let sides = Sides::from_mask(mask);
                black_box(store.connected_texture("grass", sides));
            }
        });
    });
}

criterion_group!(benches, bench_generate, bench_encode, bench_texture_lookup);
criterion_main!(benches);
