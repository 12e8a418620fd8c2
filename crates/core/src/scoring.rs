//! Scoring module - attack computation for versus play
//!
//! A lock that clears rows produces attack (garbage rows for the opponent):
//! - Line attack comes from [`LINE_ATTACK`]; spin clears use the spin tables
//!   instead of the plain table.
//! - Combo bonus grows with consecutive clearing locks.
//! - Back-to-back adds [`BACK_TO_BACK_BONUS`] when two difficult clears (four
//!   rows, or any spin clear) happen with no ordinary clear in between.
//! - A perfect clear adds [`PERFECT_CLEAR_BONUS`].

use crate::types::{
    AttackBreakdown, SpinKind, BACK_TO_BACK_BONUS, LINE_ATTACK, MINI_SPIN_ATTACK,
    PERFECT_CLEAR_BONUS, SPIN_ATTACK,
};

/// Attack calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    pub attack: AttackBreakdown,
    /// Four rows, or a spin that cleared rows.
    pub difficult: bool,
    pub back_to_back_applied: bool,
}

impl ScoreResult {
    pub fn total(&self) -> u32 {
        self.attack.total()
    }
}

/// Base line attack for a clear.
pub fn line_attack(lines: u32, spin: SpinKind) -> u32 {
    let lines = lines.min(4) as usize;
    if lines == 4 {
        return LINE_ATTACK[4];
    }
    match spin {
        SpinKind::None => LINE_ATTACK[lines],
        SpinKind::Mini => MINI_SPIN_ATTACK[lines],
        SpinKind::Full => SPIN_ATTACK[lines],
    }
}

/// Combo bonus for the combo counter after a clearing lock.
///
/// - `-1` / `0`: no bonus (first clear of a chain)
/// - `1..=3`: 1, `4..=5`: 2, `6..=7`: 3, `8..=10`: 4, `11+`: 5
pub fn combo_bonus(combo: i32) -> u32 {
    match combo {
        i32::MIN..=0 => 0,
        1..=3 => 1,
        4..=5 => 2,
        6..=7 => 3,
        8..=10 => 4,
        _ => 5,
    }
}

/// Whether a clear can start or continue a back-to-back chain.
pub fn is_difficult(lines: u32, spin: SpinKind) -> bool {
    lines >= 4 || (lines > 0 && spin.is_spin())
}

/// Calculate attack for one lock.
///
/// `combo` is the counter after this lock; `previous_b2b` is whether the last
/// clear was difficult. Non-clearing locks produce no attack.
pub fn calculate_attack(
    lines: u32,
    spin: SpinKind,
    combo: i32,
    previous_b2b: bool,
    perfect_clear: bool,
) -> ScoreResult {
    if lines == 0 {
        return ScoreResult::default();
    }

    let difficult = is_difficult(lines, spin);
    let back_to_back_applied = difficult && previous_b2b;

    let attack = AttackBreakdown {
        lines: line_attack(lines, spin),
        combo_bonus: combo_bonus(combo),
        back_to_back_bonus: if back_to_back_applied {
            BACK_TO_BACK_BONUS
        } else {
            0
        },
        perfect_clear_bonus: if perfect_clear {
            PERFECT_CLEAR_BONUS
        } else {
            0
        },
    };

    ScoreResult {
        attack,
        difficult,
        back_to_back_applied,
    }
}

/// Combo and back-to-back state carried from lock to lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearChain {
    combo: i32,
    back_to_back: bool,
}

impl ClearChain {
    pub fn new() -> Self {
        Self {
            combo: -1,
            back_to_back: false,
        }
    }

    /// -1 when no combo is running
    pub fn combo(&self) -> i32 {
        self.combo
    }

    /// Whether the last clear was difficult
    pub fn back_to_back(&self) -> bool {
        self.back_to_back
    }

    /// Advance the chain for one lock and return its attack.
    ///
    /// Non-clearing locks reset the combo but leave back-to-back untouched.
    pub fn record(&mut self, lines: u32, spin: SpinKind, perfect_clear: bool) -> ScoreResult {
        if lines == 0 {
            self.combo = -1;
            return ScoreResult::default();
        }
        self.combo += 1;
        let result = calculate_attack(lines, spin, self.combo, self.back_to_back, perfect_clear);
        self.back_to_back = result.difficult;
        result
    }
}

impl Default for ClearChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_attack_tables() {
        assert_eq!(line_attack(1, SpinKind::None), 0);
        assert_eq!(line_attack(2, SpinKind::None), 1);
        assert_eq!(line_attack(3, SpinKind::None), 2);
        assert_eq!(line_attack(4, SpinKind::None), 4);

        assert_eq!(line_attack(1, SpinKind::Full), 2);
        assert_eq!(line_attack(2, SpinKind::Full), 4);
        assert_eq!(line_attack(3, SpinKind::Full), 6);

        assert_eq!(line_attack(1, SpinKind::Mini), 1);
        assert_eq!(line_attack(0, SpinKind::Full), 0);
    }

    #[test]
    fn test_combo_bands() {
        let bonuses: Vec<u32> = (-1..=12).map(combo_bonus).collect();
        assert_eq!(bonuses, vec![0, 0, 1, 1, 1, 2, 2, 3, 3, 4, 4, 4, 5, 5]);
    }

    #[test]
    fn test_difficult_clears() {
        assert!(is_difficult(4, SpinKind::None));
        assert!(is_difficult(1, SpinKind::Mini));
        assert!(!is_difficult(3, SpinKind::None));
        assert!(!is_difficult(0, SpinKind::Full));
    }

    #[test]
    fn test_four_consecutive_singles() {
        let mut chain = ClearChain::new();
        let sent: Vec<u32> = (0..4)
            .map(|_| chain.record(1, SpinKind::None, false).total())
            .collect();
        // Line attack is 0 for a single; the combo bonus supplies the rest.
        assert_eq!(sent, vec![0, 1, 1, 1]);
        assert_eq!(chain.combo(), 3);
    }

    #[test]
    fn test_back_to_back_fours() {
        let mut chain = ClearChain::new();
        assert_eq!(chain.record(4, SpinKind::None, false).total(), 4);
        // Interrupting non-clear resets the combo but keeps back-to-back.
        assert_eq!(chain.record(0, SpinKind::None, false).total(), 0);
        let second = chain.record(4, SpinKind::None, false);
        assert!(second.back_to_back_applied);
        assert_eq!(second.total(), 5);
    }

    #[test]
    fn test_ordinary_clear_breaks_back_to_back() {
        let mut chain = ClearChain::new();
        chain.record(4, SpinKind::None, false);
        chain.record(0, SpinKind::None, false);
        chain.record(1, SpinKind::None, false);
        chain.record(0, SpinKind::None, false);
        let result = chain.record(4, SpinKind::None, false);
        assert!(!result.back_to_back_applied);
        assert_eq!(result.total(), 4);
    }

    #[test]
    fn test_perfect_clear_bonus() {
        let result = calculate_attack(2, SpinKind::None, 0, false, true);
        assert_eq!(result.attack.perfect_clear_bonus, PERFECT_CLEAR_BONUS);
        assert_eq!(result.total(), 1 + 7);
    }

    #[test]
    fn test_spin_without_lines_sends_nothing() {
        let mut chain = ClearChain::new();
        assert_eq!(chain.record(0, SpinKind::Full, false).total(), 0);
        assert!(!chain.back_to_back());
    }
}
