//! Match setup - validated construction of an authoritative field

use std::collections::VecDeque;

use thiserror::Error;

use crate::pacing::{PacingCurve, PacingError};
use crate::playfield::Playfield;
use crate::rng::Bag;
use crate::types::RotationSystem;

/// Errors that prevent a match from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no rotation system selected")]
    MissingRotationSystem,
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },
    #[error("cannot read pacing file {path}: {source}")]
    PacingFile {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Pacing(#[from] PacingError),
}

/// Builder for the local authoritative [`Playfield`]
///
/// ```
/// use versus_tetris_core::setup::{ConfigError, MatchSetup};
/// use versus_tetris_core::types::RotationSystem;
///
/// assert!(matches!(MatchSetup::new().build(), Err(ConfigError::MissingRotationSystem)));
///
/// let field = MatchSetup::new()
///     .rotation_system(RotationSystem::Classic)
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(field.rotation_system(), RotationSystem::Classic);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MatchSetup {
    rotation_system: Option<RotationSystem>,
    seed: Option<u64>,
    pacing: PacingCurve,
    start_level: u32,
    preset_bags: Vec<Bag>,
}

impl MatchSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotation_system(mut self, system: RotationSystem) -> Self {
        self.rotation_system = Some(system);
        self
    }

    pub fn maybe_rotation_system(mut self, system: Option<RotationSystem>) -> Self {
        self.rotation_system = system;
        self
    }

    /// Seed for bags and garbage holes; entropy when unset.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn maybe_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn pacing(mut self, curve: PacingCurve) -> Self {
        self.pacing = curve;
        self
    }

    pub fn start_level(mut self, level: u32) -> Self {
        self.start_level = level;
        self
    }

    /// Bags dealt before any random ones.
    pub fn preset_bags(mut self, bags: Vec<Bag>) -> Self {
        self.preset_bags = bags;
        self
    }

    pub fn selected_rotation_system(&self) -> Option<RotationSystem> {
        self.rotation_system
    }

    pub fn pacing_curve(&self) -> &PacingCurve {
        &self.pacing
    }

    pub fn build(&self) -> Result<Playfield, ConfigError> {
        let system = self
            .rotation_system
            .ok_or(ConfigError::MissingRotationSystem)?;
        self.pacing.validate()?;
        Ok(Playfield::authority(
            system,
            self.seed,
            self.pacing.clone(),
            self.start_level,
            VecDeque::from(self.preset_bags.clone()),
        ))
    }
}
