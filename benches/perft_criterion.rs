use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use quince_chess::game_state::chess_rules::STARTING_POSITION_FEN;
use quince_chess::game_state::position::Position;
use quince_chess::move_generation::perft::perft;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: STARTING_POSITION_FEN,
        expected_nodes: &[20, 400, 8_902],
    },
    BenchCase {
        name: "tactical_middlegame",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0",
        expected_nodes: &[48, 2_039],
    },
    BenchCase {
        name: "pawn_endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_nodes: &[14, 191, 2_812],
    },
];

fn perft_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    for case in CASES {
        let position = Position::from_fen(case.fen).expect("bench FEN should parse");

        for (i, expected) in case.expected_nodes.iter().enumerate() {
            let depth = (i + 1) as u8;
            let counts = perft(&position, depth).expect("perft should run");
            assert_eq!(counts.nodes, *expected, "{} depth {}", case.name, depth);

            group.throughput(Throughput::Elements(*expected));
            group.bench_with_input(
                BenchmarkId::new(case.name, depth),
                &depth,
                |b, &depth| {
                    b.iter(|| perft(black_box(&position), black_box(depth)).expect("perft should run"))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, perft_benchmarks);
criterion_main!(benches);
