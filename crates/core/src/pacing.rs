//! Pacing curve - per-level gravity and delays
//!
//! Both peers agree on the level through pacing checkpoints; each level fixes
//! gravity, lock delay, entry delay (ARE), line-clear delay and flash length.
//! All delays are in ticks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    DEFAULT_ARE_TICKS, DEFAULT_FLASH_TICKS, DEFAULT_LINE_CLEAR_TICKS, DEFAULT_LOCK_DELAY_TICKS,
};

/// Cells per tick as a fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gravity {
    pub numerator: u32,
    pub denominator: u32,
}

impl Gravity {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// At least one whole cell per tick
    pub fn is_whole(&self) -> bool {
        self.numerator >= self.denominator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingLevel {
    pub gravity: Gravity,
    pub lock_delay: u32,
    pub are: u32,
    pub line_clear: u32,
    pub flash: u32,
}

impl PacingLevel {
    const fn with_gravity(numerator: u32, denominator: u32) -> Self {
        Self {
            gravity: Gravity::new(numerator, denominator),
            lock_delay: DEFAULT_LOCK_DELAY_TICKS,
            are: DEFAULT_ARE_TICKS,
            line_clear: DEFAULT_LINE_CLEAR_TICKS,
            flash: DEFAULT_FLASH_TICKS,
        }
    }
}

impl Default for PacingLevel {
    fn default() -> Self {
        Self::with_gravity(1, 64)
    }
}

#[derive(Debug, Error)]
pub enum PacingError {
    #[error("pacing curve has no levels")]
    Empty,
    #[error("level {0} has a zero gravity denominator")]
    ZeroDenominator(usize),
    #[error("invalid pacing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered levels; requests past the end clamp to the last level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingCurve {
    pub levels: Vec<PacingLevel>,
}

impl PacingCurve {
    pub fn from_json(json: &str) -> Result<Self, PacingError> {
        let curve: PacingCurve = serde_json::from_str(json)?;
        curve.validate()?;
        Ok(curve)
    }

    pub fn validate(&self) -> Result<(), PacingError> {
        if self.levels.is_empty() {
            return Err(PacingError::Empty);
        }
        if let Some(i) = self.levels.iter().position(|l| l.gravity.denominator == 0) {
            return Err(PacingError::ZeroDenominator(i));
        }
        Ok(())
    }

    pub fn level(&self, index: u32) -> PacingLevel {
        let last = self.levels.len().saturating_sub(1);
        self.levels
            .get((index as usize).min(last))
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for PacingCurve {
    fn default() -> Self {
        let mut levels = vec![
            PacingLevel::with_gravity(1, 64),
            PacingLevel::with_gravity(1, 48),
            PacingLevel::with_gravity(1, 32),
            PacingLevel::with_gravity(1, 24),
            PacingLevel::with_gravity(1, 16),
            PacingLevel::with_gravity(1, 12),
            PacingLevel::with_gravity(1, 8),
            PacingLevel::with_gravity(1, 4),
            PacingLevel::with_gravity(1, 2),
            PacingLevel::with_gravity(1, 1),
        ];
        // The fastest levels tighten the delays.
        for level in levels.iter_mut().skip(7) {
            level.lock_delay = 24;
            level.line_clear = 16;
        }
        Self { levels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curve_speeds_up() {
        let curve = PacingCurve::default();
        assert_eq!(curve.len(), 10);
        assert!(curve.validate().is_ok());
        assert!(!curve.level(0).gravity.is_whole());
        assert!(curve.level(9).gravity.is_whole());
        assert_eq!(curve.level(42), curve.level(9));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"levels":[{"gravity":{"numerator":2,"denominator":1},
            "lock_delay":10,"are":3,"line_clear":8,"flash":0}]}"#;
        let curve = PacingCurve::from_json(json).unwrap();
        assert_eq!(curve.level(0).gravity, Gravity::new(2, 1));
        assert_eq!(curve.level(5).lock_delay, 10);
    }

    #[test]
    fn test_rejects_bad_curves() {
        assert!(matches!(
            PacingCurve::from_json(r#"{"levels":[]}"#),
            Err(PacingError::Empty)
        ));
        let zero = r#"{"levels":[{"gravity":{"numerator":1,"denominator":0},
            "lock_delay":1,"are":1,"line_clear":1,"flash":1}]}"#;
        assert!(matches!(
            PacingCurve::from_json(zero),
            Err(PacingError::ZeroDenominator(0))
        ));
        assert!(matches!(
            PacingCurve::from_json("nope"),
            Err(PacingError::Json(_))
        ));
    }
}
