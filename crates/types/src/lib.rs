//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used by the playfield simulation and
//! the peer synchronization layer. All types are plain data with no I/O, so they
//! can be shared by the authoritative field, the mirrored field and the wire codec.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 40 rows (indexed 0-39); rows 0-19 are a hidden buffer above the
//!   visible 20-row area
//! - **Spawn anchor**: (3, 18), so spawn minos sit just above the visible area
//!
//! # Timing
//!
//! The simulation advances in whole ticks (60 per second). Every delay below is
//! measured in ticks, not milliseconds, so that both peers agree exactly.
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICKS_PER_SECOND` | 60 | Fixed simulation rate |
//! | `DEFAULT_LOCK_DELAY_TICKS` | 30 | Grace period for a resting piece |
//! | `DEFAULT_ARE_TICKS` | 6 | Entry delay after a non-clearing lock |
//! | `DEFAULT_LINE_CLEAR_TICKS` | 24 | Pause while cleared rows flash out |
//! | `DEFAULT_FLASH_TICKS` | 2 | Locked-piece flash before merge |
//!
//! # Examples
//!
//! ```
//! use versus_tetris_types::{ActionSet, KeyAction, PieceKind, Rotation, BOARD_HEIGHT};
//!
//! assert_eq!(PieceKind::from_letter('t'), Some(PieceKind::T));
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//!
//! let mut actions = ActionSet::empty();
//! actions.insert(KeyAction::MoveLeft);
//! actions.insert(KeyAction::HardDrop);
//! assert_eq!(actions.encode(), "LD");
//!
//! assert_eq!(BOARD_HEIGHT, 40);
//! ```

use serde::{Deserialize, Serialize};

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells, hidden buffer included (40 rows)
pub const BOARD_HEIGHT: u8 = 40;

/// Rows above the visible area (rows 0..20)
pub const HIDDEN_ROWS: u8 = 20;

/// Visible rows (rows 20..40)
pub const VISIBLE_HEIGHT: u8 = BOARD_HEIGHT - HIDDEN_ROWS;

/// Spawn anchor column
pub const SPAWN_X: i8 = 3;

/// Spawn anchor row
pub const SPAWN_Y: i8 = 18;

/// Number of upcoming pieces kept ahead of the active piece
pub const PREVIEW_DEPTH: usize = 5;

/// Pieces per randomizer bag
pub const BAG_SIZE: usize = 7;

/// Fixed simulation rate
pub const TICKS_PER_SECOND: u32 = 60;

/// Wall-clock length of one tick in milliseconds (rounded down)
pub const TICK_MS: u32 = 1000 / TICKS_PER_SECOND;

pub const DEFAULT_LOCK_DELAY_TICKS: u32 = 30;

pub const DEFAULT_ARE_TICKS: u32 = 6;

pub const DEFAULT_LINE_CLEAR_TICKS: u32 = 24;

pub const DEFAULT_FLASH_TICKS: u32 = 2;

/// Line attack for 0..=4 lines without a spin
pub const LINE_ATTACK: [u32; 5] = [0, 0, 1, 2, 4];

/// Line attack for a full spin clearing 0..=3 lines (replaces `LINE_ATTACK`)
pub const SPIN_ATTACK: [u32; 4] = [0, 2, 4, 6];

/// Line attack for a mini spin clearing 0..=3 lines (replaces `LINE_ATTACK`)
pub const MINI_SPIN_ATTACK: [u32; 4] = [0, 1, 2, 3];

/// Bonus for two difficult clears in a row
pub const BACK_TO_BACK_BONUS: u32 = 1;

/// Flat bonus for emptying the board
pub const PERFECT_CLEAR_BONUS: u32 = 7;

/// Chance that a garbage row keeps the previous row's hole column
pub const GARBAGE_KEEP_HOLE_CHANCE: f64 = 0.8;

/// The seven tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in canonical bag order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Parse piece kind from its letter (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use versus_tetris_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_letter('i'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_letter('O'), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_letter('?'), None);
    /// ```
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'T' => Some(PieceKind::T),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            _ => None,
        }
    }

    /// Uppercase wire letter
    pub fn letter(&self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
        }
    }

    /// Kick/spin class of this piece.
    pub fn class(&self) -> PieceClass {
        match self {
            PieceKind::T => PieceClass::Pivot,
            PieceKind::I => PieceClass::Long,
            PieceKind::O => PieceClass::Square,
            PieceKind::J | PieceKind::L => PieceClass::Hook,
            PieceKind::S | PieceKind::Z => PieceClass::Default,
        }
    }
}

/// Piece class tag used by kick resolution and spin detection
///
/// - **Pivot**: the T piece (spin-eligible)
/// - **Long**: the I piece (own kick table / never kicks under classic rules)
/// - **Hook**: J and L (direction-dependent nudge under classic rules)
/// - **Square**: the 2×2-center O piece (no kicks)
/// - **Default**: S and Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceClass {
    Pivot,
    Long,
    Hook,
    Square,
    Default,
}

/// Rotation states
///
/// - **North**: Spawn orientation
/// - **East**: Rotated 90° clockwise ("right")
/// - **South**: Rotated 180°
/// - **West**: Rotated 90° counter-clockwise ("left")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// # Examples
    ///
    /// ```
    /// use versus_tetris_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    pub fn rotate(&self, direction: RotateDirection) -> Self {
        match direction {
            RotateDirection::Right => self.rotate_cw(),
            RotateDirection::Left => self.rotate_ccw(),
        }
    }

    /// 0 = North, 1 = East, 2 = South, 3 = West (wire encoding)
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Rotation::North),
            1 => Some(Rotation::East),
            2 => Some(Rotation::South),
            3 => Some(Rotation::West),
            _ => None,
        }
    }
}

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotateDirection {
    /// Counter-clockwise
    Left,
    /// Clockwise
    Right,
}

/// Selects the shape tables and kick strategy of a field
///
/// - **Modern**: SRS shapes and kick tables; soft drop never locks
/// - **Classic**: ARS-style shapes, nudge-based kicks; soft drop on a
///   resting piece locks it immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationSystem {
    Modern,
    Classic,
}

impl RotationSystem {
    /// Parse from string (case-insensitive)
    ///
    /// ```
    /// use versus_tetris_types::RotationSystem;
    ///
    /// assert_eq!(RotationSystem::from_str("Modern"), Some(RotationSystem::Modern));
    /// assert_eq!(RotationSystem::from_str("classic"), Some(RotationSystem::Classic));
    /// assert_eq!(RotationSystem::from_str("nes"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("modern") {
            Some(RotationSystem::Modern)
        } else if s.eq_ignore_ascii_case("classic") {
            Some(RotationSystem::Classic)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationSystem::Modern => "modern",
            RotationSystem::Classic => "classic",
        }
    }

    /// Whether soft drop on a resting piece locks it immediately.
    pub fn soft_drop_locks(&self) -> bool {
        matches!(self, RotationSystem::Classic)
    }
}

/// Logical input actions sampled once per tick
///
/// Debounce and auto-repeat happen upstream; the core only sees which actions
/// are asserted on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Rotate 90° counter-clockwise
    RotateLeft,
    /// Rotate 90° clockwise
    RotateRight,
    /// Swap with the held piece
    Hold,
    /// Move one cell left
    MoveLeft,
    /// Move one cell right
    MoveRight,
    /// Move one cell down (locks a resting piece under classic rules)
    SoftDrop,
    /// Move to the lowest legal row without locking
    SonicDrop,
    /// Move to the lowest legal row and lock
    HardDrop,
}

impl KeyAction {
    /// Canonical application order within a tick.
    pub const ORDER: [KeyAction; 8] = [
        KeyAction::Hold,
        KeyAction::RotateLeft,
        KeyAction::RotateRight,
        KeyAction::MoveLeft,
        KeyAction::MoveRight,
        KeyAction::SoftDrop,
        KeyAction::SonicDrop,
        KeyAction::HardDrop,
    ];

    /// Single-letter wire code
    pub fn code(&self) -> char {
        match self {
            KeyAction::RotateLeft => 'A',
            KeyAction::RotateRight => 'C',
            KeyAction::Hold => 'H',
            KeyAction::MoveLeft => 'L',
            KeyAction::MoveRight => 'R',
            KeyAction::SoftDrop => 'S',
            KeyAction::SonicDrop => 'V',
            KeyAction::HardDrop => 'D',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'A' => Some(KeyAction::RotateLeft),
            'C' => Some(KeyAction::RotateRight),
            'H' => Some(KeyAction::Hold),
            'L' => Some(KeyAction::MoveLeft),
            'R' => Some(KeyAction::MoveRight),
            'S' => Some(KeyAction::SoftDrop),
            'V' => Some(KeyAction::SonicDrop),
            'D' => Some(KeyAction::HardDrop),
            _ => None,
        }
    }

    fn bit(&self) -> u8 {
        match self {
            KeyAction::Hold => 1 << 0,
            KeyAction::RotateLeft => 1 << 1,
            KeyAction::RotateRight => 1 << 2,
            KeyAction::MoveLeft => 1 << 3,
            KeyAction::MoveRight => 1 << 4,
            KeyAction::SoftDrop => 1 << 5,
            KeyAction::SonicDrop => 1 << 6,
            KeyAction::HardDrop => 1 << 7,
        }
    }
}

/// Set of simultaneously asserted actions for one tick
///
/// Iteration always follows [`KeyAction::ORDER`], so both peers apply the same
/// set in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionSet(u8);

impl ActionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_actions(actions: &[KeyAction]) -> Self {
        let mut set = Self::empty();
        for &a in actions {
            set.insert(a);
        }
        set
    }

    pub fn insert(&mut self, action: KeyAction) {
        self.0 |= action.bit();
    }

    /// Remove an action; returns whether it was present.
    pub fn remove(&mut self, action: KeyAction) -> bool {
        let present = self.contains(action);
        self.0 &= !action.bit();
        present
    }

    pub fn contains(&self, action: KeyAction) -> bool {
        self.0 & action.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyAction> + '_ {
        KeyAction::ORDER.into_iter().filter(|a| self.contains(*a))
    }

    /// Wire form: action codes in canonical order, `-` when empty.
    pub fn encode(&self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        self.iter().map(|a| a.code()).collect()
    }

    /// Parse the wire form; any unknown code rejects the whole set.
    pub fn parse(s: &str) -> Option<Self> {
        if s == "-" {
            return Some(Self::empty());
        }
        let mut set = Self::empty();
        for c in s.chars() {
            set.insert(KeyAction::from_code(c)?);
        }
        Some(set)
    }
}

/// A stored board cell, or the out-of-bounds sentinel returned by reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Piece(PieceKind),
    /// Garbage mino from a materialized attack row
    Garbage,
    /// Locked piece that has not been merged yet
    Flash,
    /// Returned by boundary-safe reads; never stored
    OutOfBounds,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric code for snapshots: 0 empty, 1-7 pieces, 8 garbage, 9 flash,
    /// 255 out of bounds.
    pub fn code(&self) -> u8 {
        match self {
            CellValue::Empty => 0,
            CellValue::Piece(PieceKind::I) => 1,
            CellValue::Piece(PieceKind::O) => 2,
            CellValue::Piece(PieceKind::T) => 3,
            CellValue::Piece(PieceKind::S) => 4,
            CellValue::Piece(PieceKind::Z) => 5,
            CellValue::Piece(PieceKind::J) => 6,
            CellValue::Piece(PieceKind::L) => 7,
            CellValue::Garbage => 8,
            CellValue::Flash => 9,
            CellValue::OutOfBounds => 255,
        }
    }
}

/// T-spin classification of a lock
///
/// - **None**: Not a spin
/// - **Mini**: 3+ corners, but the front corners are not both filled and no
///   large kick happened
/// - **Full**: every other qualifying spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpinKind {
    #[default]
    None,
    Mini,
    Full,
}

impl SpinKind {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            SpinKind::None => None,
            SpinKind::Mini => Some("mini"),
            SpinKind::Full => Some("full"),
        }
    }

    pub fn is_spin(&self) -> bool {
        !matches!(self, SpinKind::None)
    }
}

/// Attack produced by one lock, split into its components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttackBreakdown {
    /// Line attack (spin tables replace the plain table).
    pub lines: u32,
    pub combo_bonus: u32,
    pub back_to_back_bonus: u32,
    pub perfect_clear_bonus: u32,
}

impl AttackBreakdown {
    pub fn total(&self) -> u32 {
        self.lines + self.combo_bonus + self.back_to_back_bonus + self.perfect_clear_bonus
    }
}

/// Summary emitted after a piece merges into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSummary {
    pub kind: PieceKind,
    pub lines_cleared: u32,
    pub spin: SpinKind,
    /// Combo counter after this lock (-1 = no combo).
    pub combo: i32,
    pub back_to_back: bool,
    pub perfect_clear: bool,
    pub attack: AttackBreakdown,
    /// Attack left after countering incoming garbage.
    pub sent: u32,
}
