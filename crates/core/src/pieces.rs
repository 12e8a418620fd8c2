//! Pieces module - tetromino shapes for both rotation systems
//!
//! Every shape is four mino offsets inside a 4×4 box whose top-left corner is
//! the piece anchor `(x, y)`. Offsets grow right (+x) and down (+y).
//!
//! - Modern shapes follow SRS (https://tetris.wiki/SRS).
//! - Classic shapes follow the arcade layout: pieces spawn flat side up and
//!   rotate around the lower-center of the box.

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::types::{PieceKind, Rotation, RotationSystem, SPAWN_X, SPAWN_Y};

/// Offset of a single mino relative to the piece anchor
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from the piece anchor
pub type PieceShape = [MinoOffset; 4];

/// Get the shape (mino offsets) for a piece kind and rotation
pub fn get_shape(system: RotationSystem, kind: PieceKind, rotation: Rotation) -> PieceShape {
    match system {
        RotationSystem::Modern => modern_shape(kind, rotation),
        RotationSystem::Classic => classic_shape(kind, rotation),
    }
}

/// Occupancy of the 4×4 box, indexed `[row][column]`.
pub fn occupancy_grid(system: RotationSystem, kind: PieceKind, rotation: Rotation) -> [[bool; 4]; 4] {
    let mut grid = [[false; 4]; 4];
    for (dx, dy) in get_shape(system, kind, rotation) {
        grid[dy as usize][dx as usize] = true;
    }
    grid
}

fn modern_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    use Rotation::*;
    match (kind, rotation) {
        (PieceKind::I, North) => [(0, 1), (1, 1), (2, 1), (3, 1)],
        (PieceKind::I, East) => [(2, 0), (2, 1), (2, 2), (2, 3)],
        (PieceKind::I, South) => [(0, 2), (1, 2), (2, 2), (3, 2)],
        (PieceKind::I, West) => [(1, 0), (1, 1), (1, 2), (1, 3)],

        (PieceKind::O, _) => [(1, 0), (2, 0), (1, 1), (2, 1)],

        (PieceKind::T, North) => [(1, 0), (0, 1), (1, 1), (2, 1)],
        (PieceKind::T, East) => [(1, 0), (1, 1), (2, 1), (1, 2)],
        (PieceKind::T, South) => [(0, 1), (1, 1), (2, 1), (1, 2)],
        (PieceKind::T, West) => [(1, 0), (0, 1), (1, 1), (1, 2)],

        (PieceKind::S, North) => [(1, 0), (2, 0), (0, 1), (1, 1)],
        (PieceKind::S, East) => [(1, 0), (1, 1), (2, 1), (2, 2)],
        (PieceKind::S, South) => [(1, 1), (2, 1), (0, 2), (1, 2)],
        (PieceKind::S, West) => [(0, 0), (0, 1), (1, 1), (1, 2)],

        (PieceKind::Z, North) => [(0, 0), (1, 0), (1, 1), (2, 1)],
        (PieceKind::Z, East) => [(2, 0), (1, 1), (2, 1), (1, 2)],
        (PieceKind::Z, South) => [(0, 1), (1, 1), (1, 2), (2, 2)],
        (PieceKind::Z, West) => [(1, 0), (0, 1), (1, 1), (0, 2)],

        (PieceKind::J, North) => [(0, 0), (0, 1), (1, 1), (2, 1)],
        (PieceKind::J, East) => [(1, 0), (2, 0), (1, 1), (1, 2)],
        (PieceKind::J, South) => [(0, 1), (1, 1), (2, 1), (2, 2)],
        (PieceKind::J, West) => [(1, 0), (1, 1), (0, 2), (1, 2)],

        (PieceKind::L, North) => [(2, 0), (0, 1), (1, 1), (2, 1)],
        (PieceKind::L, East) => [(1, 0), (1, 1), (1, 2), (2, 2)],
        (PieceKind::L, South) => [(0, 1), (1, 1), (2, 1), (0, 2)],
        (PieceKind::L, West) => [(0, 0), (1, 0), (1, 1), (1, 2)],
    }
}

fn classic_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    use Rotation::*;
    match (kind, rotation) {
        // I and the two-state S/Z only have two distinct orientations.
        (PieceKind::I, North | South) => [(0, 1), (1, 1), (2, 1), (3, 1)],
        (PieceKind::I, East | West) => [(2, 0), (2, 1), (2, 2), (2, 3)],

        (PieceKind::O, _) => [(1, 1), (2, 1), (1, 2), (2, 2)],

        (PieceKind::T, North) => [(0, 1), (1, 1), (2, 1), (1, 2)],
        (PieceKind::T, East) => [(1, 0), (0, 1), (1, 1), (1, 2)],
        (PieceKind::T, South) => [(1, 1), (0, 2), (1, 2), (2, 2)],
        (PieceKind::T, West) => [(1, 0), (1, 1), (2, 1), (1, 2)],

        (PieceKind::S, North | South) => [(1, 1), (2, 1), (0, 2), (1, 2)],
        (PieceKind::S, East | West) => [(0, 0), (0, 1), (1, 1), (1, 2)],

        (PieceKind::Z, North | South) => [(0, 1), (1, 1), (1, 2), (2, 2)],
        (PieceKind::Z, East | West) => [(2, 0), (1, 1), (2, 1), (1, 2)],

        (PieceKind::J, North) => [(0, 1), (1, 1), (2, 1), (2, 2)],
        (PieceKind::J, East) => [(1, 0), (1, 1), (0, 2), (1, 2)],
        (PieceKind::J, South) => [(0, 1), (0, 2), (1, 2), (2, 2)],
        (PieceKind::J, West) => [(1, 0), (2, 0), (1, 1), (1, 2)],

        (PieceKind::L, North) => [(0, 1), (1, 1), (2, 1), (0, 2)],
        (PieceKind::L, East) => [(0, 0), (1, 0), (1, 1), (1, 2)],
        (PieceKind::L, South) => [(2, 1), (0, 2), (1, 2), (2, 2)],
        (PieceKind::L, West) => [(1, 0), (1, 1), (1, 2), (2, 2)],
    }
}

/// Center mino and facing direction of a T-shaped piece.
///
/// The center is the mino touching the other three; the facing points from
/// the center to the one neighbor with no opposite partner. Returns `None`
/// for shapes that are not T-shaped.
pub fn pivot_and_facing(shape: &PieceShape) -> Option<(MinoOffset, MinoOffset)> {
    let adjacent = |a: MinoOffset, b: MinoOffset| (a.0 - b.0).abs() + (a.1 - b.1).abs() == 1;

    let center = *shape
        .iter()
        .find(|&&m| shape.iter().filter(|&&o| adjacent(m, o)).count() == 3)?;

    let arms: ArrayVec<MinoOffset, 3> = shape.iter().copied().filter(|&m| m != center).collect();
    let nub = arms.iter().copied().find(|&a| {
        let opposite = (2 * center.0 - a.0, 2 * center.1 - a.1);
        !arms.contains(&opposite)
    })?;

    Some((center, (nub.0 - center.0, nub.1 - center.1)))
}

/// A falling piece: kind, orientation and anchor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
    pub system: RotationSystem,
}

impl Piece {
    pub fn new(kind: PieceKind, rotation: Rotation, x: i8, y: i8, system: RotationSystem) -> Self {
        Self {
            kind,
            rotation,
            x,
            y,
            system,
        }
    }

    /// Spawn pose: north-facing at the spawn anchor.
    pub fn spawn(kind: PieceKind, system: RotationSystem) -> Self {
        Self::new(kind, Rotation::North, SPAWN_X, SPAWN_Y, system)
    }

    pub fn shape(&self) -> PieceShape {
        get_shape(self.system, self.kind, self.rotation)
    }

    /// Absolute board coordinates of the four minos
    pub fn cells(&self) -> [(i8, i8); 4] {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// True if any mino is out of bounds or on an occupied cell
    pub fn collides(&self, board: &Board) -> bool {
        self.cells().iter().any(|&(x, y)| board.is_blocked(x, y))
    }

    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn with_rotation(&self, rotation: Rotation) -> Self {
        Self { rotation, ..*self }
    }

    /// Resting on a surface (cannot move down)
    pub fn is_grounded(&self, board: &Board) -> bool {
        self.shifted(0, 1).collides(board)
    }

    /// Lowest row the piece can fall to from its current position
    pub fn drop_row(&self, board: &Board) -> i8 {
        let mut landed = *self;
        while !landed.shifted(0, 1).collides(board) {
            landed.y += 1;
        }
        landed.y
    }
}
