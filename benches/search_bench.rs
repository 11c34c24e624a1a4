use criterion::{criterion_group, criterion_main, Criterion};

use vesper::position::Position;
use vesper::search::quiescence_score;
use vesper::smp;

fn bench_fixed_depth(c: &mut Criterion) {
    let startpos = Position::startpos();
    let middlegame = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();

    c.bench_function("search startpos depth 5", |b| {
        b.iter(|| smp::search_to_depth(&startpos, 5, 1))
    });
    c.bench_function("search middlegame depth 4", |b| {
        b.iter(|| smp::search_to_depth(&middlegame, 4, 1))
    });
}

fn bench_quiescence(c: &mut Criterion) {
    let tactical = Position::from_fen(
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    )
    .unwrap();

    c.bench_function("quiescence tactical", |b| {
        b.iter(|| quiescence_score(&tactical))
    });
}

criterion_group!(benches, bench_fixed_depth, bench_quiescence);
criterion_main!(benches);
