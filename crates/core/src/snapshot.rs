use crate::pieces::Piece;
use crate::types::{PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH, PREVIEW_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl From<Piece> for ActiveSnapshot {
    fn from(value: Piece) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.x,
            y: value.y,
        }
    }
}

/// Coarse field state for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PhaseSnapshot {
    #[default]
    Idle,
    Active,
    Locking,
    ToppedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSnapshot {
    /// Cell codes (see `CellValue::code`), hidden rows included.
    pub board: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub active: Option<ActiveSnapshot>,
    pub ghost_y: Option<i8>,
    pub hold: Option<PieceKind>,
    pub next_queue: [Option<PieceKind>; PREVIEW_DEPTH],
    pub can_hold: bool,
    pub phase: PhaseSnapshot,
    pub level: u32,
    pub combo: i32,
    pub back_to_back: bool,
    pub pending_garbage: u32,
    pub pieces: u32,
    pub lines: u32,
    pub attack_sent: u32,
}

impl FieldSnapshot {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn playable(&self) -> bool {
        self.phase != PhaseSnapshot::ToppedOut
    }

    /// Visible 20 rows only
    pub fn visible_rows(&self) -> &[[u8; BOARD_WIDTH as usize]] {
        &self.board[(BOARD_HEIGHT - crate::types::VISIBLE_HEIGHT) as usize..]
    }
}

impl Default for FieldSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            ghost_y: None,
            hold: None,
            next_queue: [None; PREVIEW_DEPTH],
            can_hold: true,
            phase: PhaseSnapshot::Idle,
            level: 0,
            combo: -1,
            back_to_back: false,
            pending_garbage: 0,
            pieces: 0,
            lines: 0,
            attack_sent: 0,
        }
    }
}
