use criterion::{black_box, criterion_group, criterion_main, Criterion};
use versus_tetris::core::board::Board;
use versus_tetris::core::pieces::Piece;
use versus_tetris::core::playfield::Playfield;
use versus_tetris::core::rotation::rotate_piece;
use versus_tetris::core::setup::MatchSetup;
use versus_tetris::core::snapshot::FieldSnapshot;
use versus_tetris::sync::protocol::parse_message;
use versus_tetris::types::{ActionSet, CellValue, PieceKind, RotateDirection, RotationSystem};

fn started_field(system: RotationSystem) -> Playfield {
    let mut field = MatchSetup::new()
        .rotation_system(system)
        .seed(12345)
        .build()
        .unwrap();
    field.start();
    field
}

fn bench_tick(c: &mut Criterion) {
    let mut field = started_field(RotationSystem::Modern);

    c.bench_function("field_tick_idle", |b| {
        b.iter(|| {
            if field.is_topped_out() {
                field = started_field(RotationSystem::Modern);
            }
            field.tick(black_box(ActionSet::empty()));
            field.take_events();
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 36..40 {
                board.fill_row_except(y, CellValue::Garbage, &[]);
            }
            let rows = board.full_rows();
            board.remove_rows(black_box(&rows));
        })
    });
}

fn bench_rotate(c: &mut Criterion) {
    let board = Board::new();
    let modern = Piece::spawn(PieceKind::T, RotationSystem::Modern);
    let classic = Piece::spawn(PieceKind::L, RotationSystem::Classic);

    c.bench_function("rotate_modern_t", |b| {
        b.iter(|| rotate_piece(black_box(&modern), RotateDirection::Right, &board))
    });
    c.bench_function("rotate_classic_l", |b| {
        b.iter(|| rotate_piece(black_box(&classic), RotateDirection::Left, &board))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let field = started_field(RotationSystem::Classic);
    let mut snapshot = FieldSnapshot::default();

    c.bench_function("snapshot_into", |b| {
        b.iter(|| field.snapshot_into(black_box(&mut snapshot)))
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_lock_report", |b| {
        b.iter(|| parse_message(black_box("FL T 3 37 2 R")))
    });
    c.bench_function("parse_garbage_rows", |b| {
        b.iter(|| parse_message(black_box("GL 3 3 7 1 0")))
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_line_clear,
    bench_rotate,
    bench_snapshot,
    bench_parse
);
criterion_main!(benches);
