//! RNG module - 7-bag random piece generation
//!
//! Implements the "7-bag" randomization algorithm used in modern Tetris.
//! Each bag contains one of each piece (I, J, L, O, S, T, Z), shuffled.
//!
//! Generation and consumption are split: a [`BagGenerator`] produces whole
//! bags (only the authoritative side owns one), and a [`PieceQueue`] holds the
//! upcoming pieces. A mirrored field fills its queue from bags received over
//! the wire, so both sides see the same sequence.

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::types::{PieceKind, BAG_SIZE, PREVIEW_DEPTH};

/// One permutation of the seven piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bag([PieceKind; BAG_SIZE]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BagParseError {
    #[error("bag must have 7 letters, got {0}")]
    WrongLength(usize),
    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),
    #[error("piece {0:?} appears more than once")]
    Duplicate(char),
}

impl Bag {
    /// Build from an explicit order; must be a permutation of all seven kinds.
    pub fn from_kinds(kinds: [PieceKind; BAG_SIZE]) -> Result<Self, BagParseError> {
        for (i, kind) in kinds.iter().enumerate() {
            if kinds[..i].contains(kind) {
                return Err(BagParseError::Duplicate(kind.letter()));
            }
        }
        Ok(Self(kinds))
    }

    /// Parse the wire form, e.g. `"TJZOSLI"`.
    pub fn parse(letters: &str) -> Result<Self, BagParseError> {
        let count = letters.chars().count();
        if count != BAG_SIZE {
            return Err(BagParseError::WrongLength(count));
        }
        let mut kinds = PieceKind::ALL;
        for (slot, c) in kinds.iter_mut().zip(letters.chars()) {
            *slot = PieceKind::from_letter(c).ok_or(BagParseError::UnknownPiece(c))?;
        }
        Self::from_kinds(kinds)
    }

    pub fn kinds(&self) -> &[PieceKind; BAG_SIZE] {
        &self.0
    }
}

impl fmt::Display for Bag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in &self.0 {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Uniform shuffle of the seven kinds.
pub fn create_random_bag<R: Rng + ?Sized>(rng: &mut R) -> Bag {
    let mut kinds = PieceKind::ALL;
    kinds.shuffle(rng);
    Bag(kinds)
}

/// Rebuild a bag from its letters (see [`Bag::parse`]).
pub fn create_bag_of(letters: &str) -> Result<Bag, BagParseError> {
    Bag::parse(letters)
}

/// Shuffled-bag source. Seeded generators are fully deterministic.
#[derive(Debug, Clone)]
pub struct BagGenerator {
    rng: StdRng,
}

impl BagGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn next_bag(&mut self) -> Bag {
        create_random_bag(&mut self.rng)
    }
}

/// Upcoming pieces, refilled one bag at a time
#[derive(Debug, Clone, Default)]
pub struct PieceQueue {
    pieces: VecDeque<PieceKind>,
}

impl PieceQueue {
    pub fn new() -> Self {
        Self {
            pieces: VecDeque::with_capacity(BAG_SIZE * 2),
        }
    }

    pub fn push_bag(&mut self, bag: &Bag) {
        self.pieces.extend(bag.kinds().iter().copied());
    }

    /// True when fewer pieces than the preview depth remain.
    pub fn needs_bag(&self) -> bool {
        self.pieces.len() < PREVIEW_DEPTH
    }

    pub fn draw(&mut self) -> Option<PieceKind> {
        self.pieces.pop_front()
    }

    /// Next piece without removing it
    pub fn peek(&self) -> Option<PieceKind> {
        self.pieces.front().copied()
    }

    /// Preview of the next [`PREVIEW_DEPTH`] pieces; missing slots are `None`.
    pub fn preview(&self) -> [Option<PieceKind>; PREVIEW_DEPTH] {
        let mut out = [None; PREVIEW_DEPTH];
        for (slot, kind) in out.iter_mut().zip(self.pieces.iter()) {
            *slot = Some(*kind);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
