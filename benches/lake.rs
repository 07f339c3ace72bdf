use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use fish_lake::core::{decode_batch, encode_batch, Fish, GridTopology, Lake, Painter};
use fish_lake::term::{LakeDisplay, LakeView, Viewport};
use fish_lake::types::NodeId;

fn bench_fish_step(c: &mut Criterion) {
    let lake = Lake::new(NodeId::ALL[0], GridTopology::default());
    let mut rng = Pcg32::seed_from_u64(12345);
    let fish = Fish::hatch(&lake, 0, &mut rng);

    c.bench_function("fish_tick_one_step", |b| {
        b.iter(|| {
            let mut fish = fish.clone();
            let now = fish.move_interval_ms as u64;
            black_box(fish.tick(&lake, 100_000, black_box(now), &mut rng));
            lake.frames().drain(NodeId::ALL[0]);
        })
    });
}

fn bench_paint_straddling(c: &mut Criterion) {
    let grid = GridTopology::default();

    c.bench_function("paint_across_four_nodes", |b| {
        b.iter(|| {
            let mut painter = Painter::new(&grid);
            painter.erase(9, black_box(19), 1);
            painter.draw(">←0[[[[θ>", black_box(20), 2);
            black_box(painter.finish());
        })
    });
}

fn bench_batch_codec(c: &mut Criterion) {
    let frames: Vec<Vec<u8>> = (0..32).map(|_| vec![b' '; 32]).collect();

    c.bench_function("encode_decode_32_frames", |b| {
        b.iter(|| {
            let batch = encode_batch(NodeId::ALL[1], black_box(&frames));
            black_box(decode_batch(&batch).unwrap());
        })
    });
}

fn bench_lake_view(c: &mut Criterion) {
    let display = LakeDisplay::new(GridTopology::default());
    let view = LakeView::default();

    c.bench_function("render_lake_80x24", |b| {
        b.iter(|| black_box(view.render(&display, "bench", Viewport::new(80, 24))))
    });
}

criterion_group!(
    benches,
    bench_fish_step,
    bench_paint_straddling,
    bench_batch_codec,
    bench_lake_view
);
criterion_main!(benches);
