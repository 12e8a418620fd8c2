//! Protocol module - line-based lockstep messages
//!
//! Every message is one UTF-8 line: a two-letter tag followed by
//! space-separated fields.
//!
//! ```text
//! HI 1 modern        handshake (protocol version, sender's rotation system)
//! BG TIJLOSZ         next bag
//! PE C               piece entry with IRS right
//! AC LA              one tick of actions
//! GR 1               gravity fall
//! FL T 3 37 2 R      forced lock at an absolute pose
//! GL 3 3 7           garbage rows, bottom-most last
//! LV 4               pacing checkpoint
//! AT 2               attack for the receiver
//! TO                 sender topped out
//! BY                 sender leaves
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::core::playfield::LockPose;
use crate::core::rng::Bag;
use crate::types::{
    ActionSet, KeyAction, PieceKind, Rotation, RotationSystem, BOARD_HEIGHT, BOARD_WIDTH,
};

/// Version carried in `HI`
pub const PROTOCOL_VERSION: u32 = 1;

/// Most fields any fixed-arity message carries
const MAX_FIELDS: usize = 5;

/// Largest attack a single `AT` may carry
pub const MAX_ATTACK_LINES: u32 = BOARD_HEIGHT as u32;

/// Most cells one `GR` may report
pub const MAX_GRAVITY_CELLS: u32 = BOARD_HEIGHT as u32;

/// How far a lock anchor may sit outside the board; shapes fit a 4×4 box.
const POSE_MARGIN: i8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    Hello { version: u32, system: RotationSystem },
    /// Piece entry; only rotate and hold flags
    Entry(ActionSet),
    Actions(ActionSet),
    ForcedLock(LockPose),
    Gravity(u32),
    /// Hole columns, top row first
    Garbage(Vec<u8>),
    Bag(Bag),
    Level(u32),
    Attack(u32),
    ToppedOut,
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
    #[error("{tag}: missing {field}")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },
    #[error("{tag}: bad {field} {value:?}")]
    BadField {
        tag: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{0}: unexpected trailing fields")]
    TrailingFields(&'static str),
}

impl SyncMessage {
    pub fn tag(&self) -> &'static str {
        match self {
            SyncMessage::Hello { .. } => "HI",
            SyncMessage::Entry(_) => "PE",
            SyncMessage::Actions(_) => "AC",
            SyncMessage::ForcedLock(_) => "FL",
            SyncMessage::Gravity(_) => "GR",
            SyncMessage::Garbage(_) => "GL",
            SyncMessage::Bag(_) => "BG",
            SyncMessage::Level(_) => "LV",
            SyncMessage::Attack(_) => "AT",
            SyncMessage::ToppedOut => "TO",
            SyncMessage::Bye => "BY",
        }
    }

    /// Movement a later forced lock makes redundant.
    ///
    /// Holds change the queue, so an action message carrying one is kept.
    pub fn is_droppable(&self) -> bool {
        match self {
            SyncMessage::Actions(actions) => !actions.contains(KeyAction::Hold),
            SyncMessage::Gravity(_) => true,
            _ => false,
        }
    }

    /// Ends the exchange for this side
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncMessage::ToppedOut | SyncMessage::Bye)
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SyncMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        match self {
            SyncMessage::Hello { version, system } => {
                write!(f, "{} {} {}", tag, version, system.as_str())
            }
            SyncMessage::Entry(flags) => write!(f, "{} {}", tag, flags.encode()),
            SyncMessage::Actions(actions) => write!(f, "{} {}", tag, actions.encode()),
            SyncMessage::ForcedLock(pose) => {
                let mut flags = String::new();
                if pose.rotated_last {
                    flags.push('R');
                }
                if pose.large_kick {
                    flags.push('K');
                }
                if flags.is_empty() {
                    flags.push('-');
                }
                write!(
                    f,
                    "{} {} {} {} {} {}",
                    tag,
                    pose.kind.letter(),
                    pose.x,
                    pose.y,
                    pose.rotation.index(),
                    flags
                )
            }
            SyncMessage::Garbage(holes) => {
                f.write_str(tag)?;
                for hole in holes {
                    write!(f, " {}", hole)?;
                }
                Ok(())
            }
            SyncMessage::Bag(bag) => write!(f, "{} {}", tag, bag),
            SyncMessage::Gravity(n)
            | SyncMessage::Level(n)
            | SyncMessage::Attack(n) => write!(f, "{} {}", tag, n),
            SyncMessage::ToppedOut | SyncMessage::Bye => f.write_str(tag),
        }
    }
}

impl FromStr for SyncMessage {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        parse_message(line)
    }
}

/// Parse one wire line (without the newline).
pub fn parse_message(line: &str) -> Result<SyncMessage, ProtocolError> {
    let mut parts = line.split_ascii_whitespace();
    let raw_tag = parts.next().ok_or(ProtocolError::Empty)?;

    if raw_tag == "GL" {
        let holes = parts
            .map(|p| match p.parse::<u8>() {
                Ok(col) if col < BOARD_WIDTH => Ok(col),
                _ => Err(bad("GL", "hole column", p)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if holes.is_empty() {
            return Err(ProtocolError::MissingField {
                tag: "GL",
                field: "hole column",
            });
        }
        return Ok(SyncMessage::Garbage(holes));
    }

    let tag: &'static str = match raw_tag {
        "HI" => "HI",
        "PE" => "PE",
        "AC" => "AC",
        "FL" => "FL",
        "GR" => "GR",
        "BG" => "BG",
        "LV" => "LV",
        "AT" => "AT",
        "TO" => "TO",
        "BY" => "BY",
        other => return Err(ProtocolError::UnknownTag(other.to_string())),
    };

    let mut fields: ArrayVec<&str, MAX_FIELDS> = ArrayVec::new();
    for part in parts {
        fields
            .try_push(part)
            .map_err(|_| ProtocolError::TrailingFields(tag))?;
    }
    let fields = Fields { tag, items: fields };

    let message = match tag {
        "HI" => {
            fields.expect_len(2)?;
            SyncMessage::Hello {
                version: fields.number(0, "version")?,
                system: RotationSystem::from_str(fields.get(1, "rotation system")?)
                    .ok_or_else(|| bad(tag, "rotation system", fields.items[1]))?,
            }
        }
        "PE" => {
            fields.expect_len(1)?;
            let raw = fields.get(0, "entry flags")?;
            let flags = ActionSet::parse(raw).ok_or_else(|| bad(tag, "entry flags", raw))?;
            let allowed = ActionSet::from_actions(&[
                KeyAction::RotateLeft,
                KeyAction::RotateRight,
                KeyAction::Hold,
            ]);
            if flags.iter().any(|a| !allowed.contains(a)) {
                return Err(bad(tag, "entry flags", raw));
            }
            SyncMessage::Entry(flags)
        }
        "AC" => {
            fields.expect_len(1)?;
            let raw = fields.get(0, "actions")?;
            SyncMessage::Actions(ActionSet::parse(raw).ok_or_else(|| bad(tag, "actions", raw))?)
        }
        "FL" => {
            fields.expect_len(5)?;
            SyncMessage::ForcedLock(parse_lock(&fields)?)
        }
        "GR" => {
            fields.expect_len(1)?;
            SyncMessage::Gravity(fields.number_in(0, "cells", 0..=MAX_GRAVITY_CELLS)?)
        }
        "BG" => {
            fields.expect_len(1)?;
            let raw = fields.get(0, "bag")?;
            SyncMessage::Bag(Bag::parse(raw).map_err(|_| bad(tag, "bag", raw))?)
        }
        "LV" => {
            fields.expect_len(1)?;
            SyncMessage::Level(fields.number(0, "level")?)
        }
        "AT" => {
            fields.expect_len(1)?;
            SyncMessage::Attack(fields.number_in(0, "lines", 0..=MAX_ATTACK_LINES)?)
        }
        "TO" => {
            fields.expect_len(0)?;
            SyncMessage::ToppedOut
        }
        _ => {
            fields.expect_len(0)?;
            SyncMessage::Bye
        }
    };
    Ok(message)
}

fn parse_lock(fields: &Fields<'_>) -> Result<LockPose, ProtocolError> {
    let tag = fields.tag;

    let raw_kind = fields.get(0, "piece")?;
    let mut letters = raw_kind.chars();
    let kind = match (letters.next().and_then(PieceKind::from_letter), letters.next()) {
        (Some(kind), None) => kind,
        _ => return Err(bad(tag, "piece", raw_kind)),
    };

    let x = fields.number_in(1, "x", -POSE_MARGIN..=BOARD_WIDTH as i8)?;
    let y = fields.number_in(2, "y", -POSE_MARGIN..=BOARD_HEIGHT as i8)?;
    let rot: usize = fields.number(3, "rotation")?;
    let rotation = Rotation::from_index(rot).ok_or_else(|| bad(tag, "rotation", fields.items[3]))?;

    let raw_flags = fields.get(4, "lock flags")?;
    let (mut rotated_last, mut large_kick) = (false, false);
    if raw_flags != "-" {
        for c in raw_flags.chars() {
            match c {
                'R' => rotated_last = true,
                'K' => large_kick = true,
                _ => return Err(bad(tag, "lock flags", raw_flags)),
            }
        }
    }

    Ok(LockPose {
        kind,
        x,
        y,
        rotation,
        rotated_last,
        large_kick,
    })
}

fn bad(tag: &'static str, field: &'static str, value: &str) -> ProtocolError {
    ProtocolError::BadField {
        tag,
        field,
        value: value.to_string(),
    }
}

struct Fields<'a> {
    tag: &'static str,
    items: ArrayVec<&'a str, MAX_FIELDS>,
}

impl<'a> Fields<'a> {
    fn expect_len(&self, len: usize) -> Result<(), ProtocolError> {
        if self.items.len() > len {
            return Err(ProtocolError::TrailingFields(self.tag));
        }
        Ok(())
    }

    fn get(&self, index: usize, field: &'static str) -> Result<&'a str, ProtocolError> {
        self.items
            .get(index)
            .copied()
            .ok_or(ProtocolError::MissingField {
                tag: self.tag,
                field,
            })
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, ProtocolError> {
        let raw = self.get(index, field)?;
        raw.parse().map_err(|_| bad(self.tag, field, raw))
    }

    fn number_in<T>(
        &self,
        index: usize,
        field: &'static str,
        range: RangeInclusive<T>,
    ) -> Result<T, ProtocolError>
    where
        T: FromStr + PartialOrd,
    {
        let raw = self.get(index, field)?;
        raw.parse()
            .ok()
            .filter(|value| range.contains(value))
            .ok_or_else(|| bad(self.tag, field, raw))
    }
}
