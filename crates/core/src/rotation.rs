//! Rotation module - kick resolution for both rotation systems
//!
//! A rotation first tests the unkicked target orientation. If that collides,
//! the system's ordered kick sequence is tried and the first offset that fits
//! wins. If every offset collides the piece keeps its old pose.
//!
//! - **Modern**: SRS tables (https://tetris.wiki/SRS), converted to y-down.
//!   The square piece has no kicks; the long piece has its own table.
//! - **Classic**: the long piece never kicks. Hook pieces first nudge in the
//!   rotation direction, then every kickable piece tries one cell right and
//!   one cell left.

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::pieces::Piece;
use crate::types::{PieceClass, PieceKind, RotateDirection, Rotation, RotationSystem};

/// Ordered kick offsets tried after the unkicked test fails
pub type KickSequence = ArrayVec<(i8, i8), 4>;

/// Result of a rotation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateOutcome {
    /// New pose and the offset that made it fit ((0, 0) when unkicked)
    Rotated { piece: Piece, kick: (i8, i8) },
    /// Every candidate collided; the piece keeps its pose
    Blocked,
    /// No piece was active
    NoPiece,
}

impl RotateOutcome {
    pub fn is_rotated(&self) -> bool {
        matches!(self, RotateOutcome::Rotated { .. })
    }
}

/// A kick moving the piece two rows counts as large (it upgrades mini spins).
pub fn is_large_kick(kick: (i8, i8)) -> bool {
    kick.1.abs() >= 2
}

/// Kick offsets for rotating `kind` out of `from` in `direction`.
pub fn kick_sequence(
    system: RotationSystem,
    kind: PieceKind,
    from: Rotation,
    direction: RotateDirection,
) -> KickSequence {
    match system {
        RotationSystem::Modern => modern_kicks(kind, from, direction),
        RotationSystem::Classic => classic_kicks(kind, direction),
    }
}

/// Rotate with kicks. Pure: the caller decides whether to keep the new pose.
pub fn rotate_piece(piece: &Piece, direction: RotateDirection, board: &Board) -> RotateOutcome {
    let target = piece.with_rotation(piece.rotation.rotate(direction));
    if !target.collides(board) {
        return RotateOutcome::Rotated {
            piece: target,
            kick: (0, 0),
        };
    }

    for (dx, dy) in kick_sequence(piece.system, piece.kind, piece.rotation, direction) {
        let kicked = target.shifted(dx, dy);
        if !kicked.collides(board) {
            return RotateOutcome::Rotated {
                piece: kicked,
                kick: (dx, dy),
            };
        }
    }

    RotateOutcome::Blocked
}

fn classic_kicks(kind: PieceKind, direction: RotateDirection) -> KickSequence {
    let mut kicks = KickSequence::new();
    match kind.class() {
        PieceClass::Long | PieceClass::Square => return kicks,
        PieceClass::Hook => {
            let nudge = match direction {
                RotateDirection::Right => 1,
                RotateDirection::Left => -1,
            };
            kicks.push((nudge, 0));
        }
        PieceClass::Pivot | PieceClass::Default => {}
    }
    for kick in [(1, 0), (-1, 0)] {
        if !kicks.contains(&kick) {
            kicks.push(kick);
        }
    }
    kicks
}

type KickTable = [[(i8, i8); 4]; 8];

/// J, L, S, T, Z (y-down)
const JLSTZ_KICKS: KickTable = [
    // 0->R
    [(-1, 0), (-1, -1), (0, 2), (-1, 2)],
    // 0->L
    [(1, 0), (1, -1), (0, 2), (1, 2)],
    // R->0
    [(1, 0), (1, 1), (0, -2), (1, -2)],
    // R->2
    [(1, 0), (1, 1), (0, -2), (1, -2)],
    // 2->R
    [(-1, 0), (-1, -1), (0, 2), (-1, 2)],
    // 2->L
    [(1, 0), (1, -1), (0, 2), (1, 2)],
    // L->2
    [(-1, 0), (-1, 1), (0, -2), (-1, -2)],
    // L->0
    [(-1, 0), (-1, 1), (0, -2), (-1, -2)],
];

/// I piece (y-down)
const I_KICKS: KickTable = [
    // 0->R
    [(-2, 0), (1, 0), (-2, 1), (1, -2)],
    // 0->L
    [(-1, 0), (2, 0), (-1, -2), (2, 1)],
    // R->0
    [(2, 0), (-1, 0), (2, -1), (-1, 2)],
    // R->2
    [(-1, 0), (2, 0), (-1, -2), (2, 1)],
    // 2->R
    [(1, 0), (-2, 0), (1, 2), (-2, -1)],
    // 2->L
    [(2, 0), (-1, 0), (2, -1), (-1, 2)],
    // L->2
    [(-2, 0), (1, 0), (-2, 1), (1, -2)],
    // L->0
    [(1, 0), (-2, 0), (1, 2), (-2, -1)],
];

fn kick_index(from: Rotation, direction: RotateDirection) -> usize {
    use RotateDirection::{Left, Right};
    match (from, direction) {
        (Rotation::North, Right) => 0,
        (Rotation::North, Left) => 1,
        (Rotation::East, Left) => 2,
        (Rotation::East, Right) => 3,
        (Rotation::South, Left) => 4,
        (Rotation::South, Right) => 5,
        (Rotation::West, Left) => 6,
        (Rotation::West, Right) => 7,
    }
}

fn modern_kicks(kind: PieceKind, from: Rotation, direction: RotateDirection) -> KickSequence {
    let table = match kind.class() {
        PieceClass::Square => return KickSequence::new(),
        PieceClass::Long => &I_KICKS,
        _ => &JLSTZ_KICKS,
    };
    KickSequence::from(table[kick_index(from, direction)])
}
