//! Match configuration from environment variables or JSON
//!
//! - `VERSUS_HOST`: address to listen on or connect to (default "127.0.0.1")
//! - `VERSUS_PORT`: port (default 7878)
//! - `VERSUS_ROLE`: `host` listens and paces the match, `join` connects (default host)
//! - `VERSUS_ROTATION`: `modern` or `classic` (default modern)
//! - `VERSUS_SEED`: seed for bags and garbage holes (default: entropy)
//! - `VERSUS_LEVEL_TICKS`: ticks between pacing checkpoints; 0 disables (default 1800)
//! - `VERSUS_WIRE_LOG`: append the raw wire exchange to this file
//! - `VERSUS_PACING`: JSON pacing curve file

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::core::pacing::PacingCurve;
use crate::core::setup::{ConfigError, MatchSetup};
use crate::types::{RotationSystem, TICKS_PER_SECOND};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    /// Listens and acts as pacing host
    Host,
    Join,
}

impl PeerRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Some(Self::Host),
            "join" => Some(Self::Join),
            _ => None,
        }
    }

    pub fn is_pacing_host(&self) -> bool {
        *self == PeerRole::Host
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub host: String,
    pub port: u16,
    pub role: PeerRole,
    pub rotation: Option<RotationSystem>,
    pub seed: Option<u64>,
    pub level_ticks: u32,
    pub wire_log: Option<String>,
    #[serde(skip)]
    pub pacing: PacingCurve,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            role: PeerRole::Host,
            rotation: Some(RotationSystem::Modern),
            seed: None,
            level_ticks: 30 * TICKS_PER_SECOND,
            wire_log: None,
            pacing: PacingCurve::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(host) = get("VERSUS_HOST") {
            config.host = host;
        }
        if let Some(port) = get("VERSUS_PORT") {
            config.port = parse_setting("VERSUS_PORT", &port)?;
        }
        if let Some(role) = get("VERSUS_ROLE") {
            config.role = PeerRole::from_str(&role).ok_or(ConfigError::InvalidSetting {
                key: "VERSUS_ROLE",
                value: role,
            })?;
        }
        if let Some(rotation) = get("VERSUS_ROTATION") {
            let system = RotationSystem::from_str(&rotation).ok_or(ConfigError::InvalidSetting {
                key: "VERSUS_ROTATION",
                value: rotation,
            })?;
            config.rotation = Some(system);
        }
        if let Some(seed) = get("VERSUS_SEED") {
            config.seed = Some(parse_setting("VERSUS_SEED", &seed)?);
        }
        if let Some(ticks) = get("VERSUS_LEVEL_TICKS") {
            config.level_ticks = parse_setting("VERSUS_LEVEL_TICKS", &ticks)?;
        }
        config.wire_log = get("VERSUS_WIRE_LOG");
        if let Some(path) = get("VERSUS_PACING") {
            config.pacing = load_pacing(&path)?;
        }

        Ok(config)
    }

    /// Parse a JSON config; the pacing curve stays at its default.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidSetting {
            key: "config",
            value: e.to_string(),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidSetting {
            key: "VERSUS_HOST",
            value: raw,
        })
    }

    pub fn match_setup(&self) -> MatchSetup {
        MatchSetup::new()
            .maybe_rotation_system(self.rotation)
            .maybe_seed(self.seed)
            .pacing(self.pacing.clone())
    }
}

fn parse_setting<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidSetting {
        key,
        value: value.to_string(),
    })
}

pub fn load_pacing(path: &str) -> Result<PacingCurve, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::PacingFile {
        path: path.to_string(),
        source,
    })?;
    Ok(PacingCurve::from_json(&json)?)
}
