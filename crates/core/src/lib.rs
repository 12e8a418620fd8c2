//! Core game logic module - pure, deterministic, and testable
//!
//! Everything needed to simulate one player's field: board, shape tables,
//! rotation and kicks, bag generation, attack scoring, the garbage ledger and
//! the per-tick [`Playfield`] state machine. No networking or I/O lives here.
//!
//! # Module Structure
//!
//! - [`board`]: 10x40 board (20 hidden rows) with line clears and garbage insertion
//! - [`pieces`]: tetromino shape tables for the modern and classic systems
//! - [`rotation`]: kick resolution for both rotation systems
//! - [`rng`]: 7-bag generation and the preview queue
//! - [`scoring`]: attack from lines, spins, combo, back-to-back and perfect clears
//! - [`garbage`]: incoming attack ledger and hole rolling
//! - [`pacing`]: per-level gravity and delays
//! - [`playfield`]: authoritative and mirrored field state machine
//! - [`snapshot`]: copyable per-tick view for display
//! - [`setup`]: validated match construction
//! - [`input`]: per-tick action samplers
//!
//! # Rules
//!
//! - **7-Bag Randomizer**: every piece type once per 7 draws, 5 pieces previewed
//! - **Modern rotation**: SRS kick tables, O never rotates
//! - **Classic rotation**: flat-bottom states, wall kicks only, softlock on soft drop
//! - **Lock Delay**: counted in ticks while grounded, reset when the row changes
//! - **Spins**: pivot pieces only, 3-corner rule with a mini variant
//!
//! # Example
//!
//! ```
//! use versus_tetris_core::setup::MatchSetup;
//! use versus_tetris_core::types::{ActionSet, KeyAction, RotationSystem};
//!
//! let mut field = MatchSetup::new()
//!     .rotation_system(RotationSystem::Modern)
//!     .seed(12345)
//!     .build()
//!     .unwrap();
//! field.start();
//!
//! field.tick(ActionSet::empty()); // spawn
//! field.tick(ActionSet::from_actions(&[KeyAction::HardDrop]));
//!
//! assert_eq!(field.pieces_locked(), 0); // still flashing
//! field.settle();
//! assert_eq!(field.pieces_locked(), 1);
//! ```

pub mod board;
pub mod garbage;
pub mod input;
pub mod pacing;
pub mod pieces;
pub mod playfield;
pub mod rng;
pub mod rotation;
pub mod scoring;
pub mod setup;
pub mod snapshot;

pub use versus_tetris_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use garbage::{GarbageLedger, HoleRoller};
pub use input::{InputSampler, ScriptedInput};
pub use pacing::{Gravity, PacingCurve, PacingLevel};
pub use pieces::{get_shape, Piece};
pub use playfield::{FieldEvent, FieldPhase, FieldRole, LockPose, Playfield, ReplayError};
pub use rng::{Bag, BagGenerator, BagParseError, PieceQueue};
pub use rotation::{rotate_piece, RotateOutcome};
pub use scoring::{calculate_attack, ClearChain, ScoreResult};
pub use setup::{ConfigError, MatchSetup};
pub use snapshot::{ActiveSnapshot, FieldSnapshot};
