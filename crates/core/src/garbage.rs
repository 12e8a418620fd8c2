//! Garbage module - incoming attack ledger and garbage row materialization
//!
//! Incoming attack is queued as entries in arrival order. Outgoing attack
//! first counters the oldest entries; only the remainder reaches the opponent.
//! Rows still pending when the field is idle are materialized at the bottom of
//! the board, each with a single hole column.

use std::collections::VecDeque;

use rand::Rng;

use crate::types::{BOARD_WIDTH, GARBAGE_KEEP_HOLE_CHANCE};

/// FIFO of pending incoming attack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarbageLedger {
    /// Entries are always >= 1; the front is the oldest.
    pending: VecDeque<u32>,
    total_enqueued: u64,
    total_outgoing: u64,
    total_absorbed: u64,
    total_sent: u64,
    total_materialized: u64,
}

impl GarbageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue incoming attack. Zero is ignored.
    pub fn enqueue(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.pending.push_back(amount);
        self.total_enqueued += u64::from(amount);
    }

    /// Counter pending entries with outgoing attack, oldest first.
    ///
    /// Returns the part of `outgoing` that reaches the opponent.
    pub fn resolve(&mut self, outgoing: u32) -> u32 {
        self.total_outgoing += u64::from(outgoing);
        let mut remaining = outgoing;

        while remaining > 0 {
            let Some(front) = self.pending.pop_front() else {
                break;
            };
            let cancelled = front.min(remaining);
            remaining -= cancelled;
            // Both the attack and the garbage it cancels are absorbed.
            self.total_absorbed += 2 * u64::from(cancelled);
            if front > cancelled {
                self.pending.push_front(front - cancelled);
            }
        }

        self.total_sent += u64::from(remaining);
        remaining
    }

    /// Drain up to `max` whole rows for materialization.
    pub fn take_rows(&mut self, max: u32) -> u32 {
        let mut taken = 0;
        while taken < max {
            let Some(front) = self.pending.pop_front() else {
                break;
            };
            let rows = front.min(max - taken);
            taken += rows;
            if front > rows {
                self.pending.push_front(front - rows);
            }
        }
        self.total_materialized += u64::from(taken);
        taken
    }

    /// Rows still pending, saturating at `u32::MAX`
    pub fn pending_total(&self) -> u32 {
        self.pending
            .iter()
            .fold(0u32, |total, &entry| total.saturating_add(entry))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = u32> + '_ {
        self.pending.iter().copied()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn total_enqueued(&self) -> u64 {
        self.total_enqueued
    }

    pub fn total_outgoing(&self) -> u64 {
        self.total_outgoing
    }

    /// Attack and garbage that cancelled each other (each unit counted twice).
    pub fn total_absorbed(&self) -> u64 {
        self.total_absorbed
    }

    pub fn total_sent(&self) -> u64 {
        self.total_sent
    }

    pub fn total_materialized(&self) -> u64 {
        self.total_materialized
    }
}

/// Hole column generator for garbage rows
///
/// Each row keeps the previous row's hole with [`GARBAGE_KEEP_HOLE_CHANCE`],
/// otherwise picks a uniform column. The last hole carries over between
/// materializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleRoller {
    last: u8,
}

impl HoleRoller {
    pub fn starting_at(column: u8) -> Self {
        Self {
            last: column.min(BOARD_WIDTH - 1),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            last: rng.gen_range(0..BOARD_WIDTH),
        }
    }

    pub fn last_hole(&self) -> u8 {
        self.last
    }

    /// Roll hole columns for `rows` rows, listed top to bottom.
    pub fn roll<R: Rng + ?Sized>(&mut self, rng: &mut R, rows: u32) -> Vec<u8> {
        (0..rows)
            .map(|_| {
                if !rng.gen_bool(GARBAGE_KEEP_HOLE_CHANCE) {
                    self.last = rng.gen_range(0..BOARD_WIDTH);
                }
                self.last
            })
            .collect()
    }
}
