use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use versus_tetris::core::board::Board;
use versus_tetris::core::garbage::{GarbageLedger, HoleRoller};
use versus_tetris::core::pacing::PacingCurve;
use versus_tetris::core::playfield::Playfield;
use versus_tetris::types::RotationSystem;

fn assert_conserved(ledger: &GarbageLedger) {
    let accounted = u64::from(ledger.pending_total())
        + ledger.total_materialized()
        + ledger.total_sent()
        + ledger.total_absorbed();
    assert_eq!(accounted, ledger.total_enqueued() + ledger.total_outgoing());
}

#[test]
fn test_ledger_conservation_under_random_traffic() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut ledger = GarbageLedger::new();

    for _ in 0..2000 {
        match rng.gen_range(0..3) {
            0 => ledger.enqueue(rng.gen_range(0..6)),
            1 => {
                ledger.resolve(rng.gen_range(0..8));
            }
            _ => {
                ledger.take_rows(rng.gen_range(0..4));
            }
        }
        assert_conserved(&ledger);
        assert!(ledger.entries().all(|e| e >= 1));
    }
}

#[test]
fn test_counter_before_rows_drop() {
    let mut ledger = GarbageLedger::new();
    ledger.enqueue(4);
    ledger.enqueue(1);

    assert_eq!(ledger.resolve(2), 0);
    assert_eq!(ledger.pending_total(), 3);
    assert_eq!(ledger.resolve(5), 2);
    assert!(ledger.is_empty());
    assert_eq!(ledger.total_absorbed(), 10);
    assert_conserved(&ledger);
}

#[test]
fn test_authority_holes_match_reported_rows() {
    // Rolls that always pass the keep check reproduce "GL 3 3 3".
    let mut roller = HoleRoller::starting_at(3);
    let holes = roller.roll(&mut StepRng::new(0, 0), 3);
    assert_eq!(holes, vec![3, 3, 3]);

    let mut authority_board = Board::new();
    assert!(authority_board.insert_garbage_rows(&holes));

    let mut mirror = Playfield::mirror(RotationSystem::Modern, PacingCurve::default(), 0);
    mirror.start();
    mirror.replay_garbage(&[3, 3, 3]).unwrap();
    assert_eq!(mirror.board(), &authority_board);
}

#[test]
fn test_garbage_overflow_tops_out_mirror() {
    let mut mirror = Playfield::mirror(RotationSystem::Modern, PacingCurve::default(), 0);
    mirror.start();
    mirror
        .board_mut()
        .set(0, 0, versus_tetris::types::CellValue::Garbage);
    mirror.replay_garbage(&[5]).unwrap();
    assert!(mirror.is_topped_out());
    assert!(mirror.replay_garbage(&[5]).is_err());
}
