use versus_tetris::core::board::Board;
use versus_tetris::core::pacing::PacingCurve;
use versus_tetris::core::pieces::Piece;
use versus_tetris::core::playfield::{FieldPhase, Playfield};
use versus_tetris::core::rng::{Bag, BagGenerator};
use versus_tetris::core::rotation::{rotate_piece, RotateOutcome};
use versus_tetris::core::scoring::ClearChain;
use versus_tetris::core::setup::MatchSetup;
use versus_tetris::types::{
    ActionSet, CellValue, KeyAction, PieceKind, RotateDirection, Rotation, RotationSystem,
    SpinKind,
};

fn field(system: RotationSystem, bags: &[&str]) -> Playfield {
    let bags = bags.iter().map(|b| Bag::parse(b).unwrap()).collect();
    let mut field = MatchSetup::new()
        .rotation_system(system)
        .seed(7)
        .preset_bags(bags)
        .build()
        .unwrap();
    field.start();
    field
}

fn press(field: &mut Playfield, action: KeyAction) {
    field.tick(ActionSet::from_actions(&[action]));
}

#[test]
fn test_board_reads_outside_are_out_of_bounds() {
    let board = Board::new();
    assert_eq!(board.cell(-1, 0), CellValue::OutOfBounds);
    assert_eq!(board.cell(10, 0), CellValue::OutOfBounds);
    assert_eq!(board.cell(0, 40), CellValue::OutOfBounds);
    assert_eq!(board.cell(0, -1), CellValue::OutOfBounds);
    assert_eq!(board.cell(9, 39), CellValue::Empty);
}

#[test]
fn test_every_bag_is_a_permutation() {
    let mut bags = BagGenerator::new(2024);
    for _ in 0..200 {
        let mut kinds = bags.next_bag().kinds().to_vec();
        kinds.sort_by_key(|k| k.letter());
        let mut all = PieceKind::ALL.to_vec();
        all.sort_by_key(|k| k.letter());
        assert_eq!(kinds, all);
    }
}

#[test]
fn test_modern_o_rotation_is_state_only() {
    let board = Board::new();
    let o = Piece::spawn(PieceKind::O, RotationSystem::Modern);
    for direction in [RotateDirection::Left, RotateDirection::Right] {
        match rotate_piece(&o, direction, &board) {
            RotateOutcome::Rotated { piece, kick } => {
                assert_eq!(kick, (0, 0));
                assert_eq!(piece.cells(), o.cells());
                assert_ne!(piece.rotation, o.rotation);
            }
            other => panic!("O rotation failed: {:?}", other),
        }
    }
}

#[test]
fn test_t_spin_double_through_inputs() {
    let mut field = field(RotationSystem::Modern, &["TIJLOSZ"]);
    field.tick(ActionSet::empty());
    assert_eq!(field.active().unwrap().kind, PieceKind::T);

    let board = field.board_mut();
    board.fill_row_except(39, CellValue::Garbage, &[4]);
    board.fill_row_except(38, CellValue::Garbage, &[3, 4, 5]);
    board.set(3, 37, CellValue::Garbage);

    press(&mut field, KeyAction::RotateRight);
    press(&mut field, KeyAction::SonicDrop);
    let t = field.active().unwrap();
    assert_eq!((t.rotation, t.x, t.y), (Rotation::East, 3, 37));

    press(&mut field, KeyAction::RotateRight);
    assert_eq!(field.active().unwrap().rotation, Rotation::South);
    press(&mut field, KeyAction::HardDrop);
    assert_eq!(field.phase(), FieldPhase::Locking);
    field.settle();

    let summary = field.last_summary().unwrap();
    assert_eq!(summary.spin, SpinKind::Full);
    assert_eq!(summary.lines_cleared, 2);
    assert_eq!(summary.attack.total(), 4);
    assert_eq!(field.attack_sent(), 4);
    assert!(!field.board().is_empty());
}

#[test]
fn test_perfect_clear_adds_seven() {
    let mut field = field(RotationSystem::Modern, &["IJLOSTZ"]);
    field.tick(ActionSet::empty());
    field
        .board_mut()
        .fill_row_except(39, CellValue::Garbage, &[0, 1, 2, 3]);

    for _ in 0..3 {
        press(&mut field, KeyAction::MoveLeft);
    }
    press(&mut field, KeyAction::HardDrop);
    field.settle();

    let summary = field.last_summary().unwrap();
    assert!(summary.perfect_clear);
    assert_eq!(summary.lines_cleared, 1);
    assert_eq!(summary.attack.lines, 0);
    assert_eq!(summary.attack.perfect_clear_bonus, 7);
    assert_eq!(summary.attack.total(), 7);
    assert!(field.board().is_empty());
}

#[test]
fn test_four_singles_build_combo() {
    let mut chain = ClearChain::new();
    let results: Vec<_> = (0..4)
        .map(|_| chain.record(1, SpinKind::None, false))
        .collect();
    let lines: Vec<u32> = results.iter().map(|r| r.attack.lines).collect();
    let combo: Vec<u32> = results.iter().map(|r| r.attack.combo_bonus).collect();
    assert_eq!(lines, vec![0, 0, 0, 0]);
    assert_eq!(combo, vec![0, 1, 1, 1]);
    assert_eq!(chain.combo(), 3);

    chain.record(0, SpinKind::None, false);
    assert_eq!(chain.combo(), -1);
}

#[test]
fn test_classic_soft_drop_locks_resting_piece() {
    let mut field = field(RotationSystem::Classic, &["OIJLSTZ"]);
    field.tick(ActionSet::empty());
    press(&mut field, KeyAction::SonicDrop);
    assert_eq!(field.phase(), FieldPhase::Active);
    press(&mut field, KeyAction::SoftDrop);
    assert_eq!(field.phase(), FieldPhase::Locking);
}

#[test]
fn test_mirror_applies_reported_garbage() {
    let mut mirror = Playfield::mirror(RotationSystem::Classic, PacingCurve::default(), 0);
    mirror.start();
    mirror.replay_garbage(&[3, 3, 3]).unwrap();

    for y in 37..40 {
        for x in 0..10 {
            let expected = if x == 3 {
                CellValue::Empty
            } else {
                CellValue::Garbage
            };
            assert_eq!(mirror.board().cell(x, y), expected, "cell ({}, {})", x, y);
        }
    }
    assert!(mirror.board().is_row_empty(36));
}
