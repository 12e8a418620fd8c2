//! Sync module - lockstep play between two peers over TCP
//!
//! Each peer simulates its own field authoritatively and mirrors the
//! opponent's field from what the opponent reports. Nothing is predicted:
//! the mirror applies reports strictly in arrival order.
//!
//! # Protocol Overview
//!
//! A **line-based text protocol**, one message per line, two-letter tag first:
//!
//! 1. **Handshake**: both sides send `HI <version> <rotation system>`; messages
//!    before it are dropped
//! 2. **Piece flow**: `BG` bags, `PE` entries, `AC` actions, `GR` gravity and
//!    `FL` forced locks replay the sender's field on the receiver's mirror
//! 3. **Combat**: `AT` attack goes into the receiver's ledger, `GL` reports
//!    materialized garbage rows
//! 4. **Pacing**: the host sends `LV` checkpoints; both sides apply them
//! 5. **End**: `TO` when topped out, `BY` to forfeit
//!
//! # Implementation
//!
//! - [`protocol`]: message codec
//! - [`outbox`]: outgoing queue with priority insert and supersede
//! - [`session`]: per-tick match state machine
//! - [`peer`]: tokio reader/writer tasks and the optional wire log
//! - [`config`]: environment and JSON configuration
//! - [`runtime`]: blocking handle owning the tokio runtime
//!
//! # Example Exchange
//!
//! ```text
//! A -> B: HI 1 modern
//! A -> B: BG TIJLOSZ
//! A -> B: PE -
//! A -> B: AC L
//! A -> B: GR 1
//! A -> B: FL T 3 37 2 R
//! A -> B: AT 4
//! ```

pub mod config;
pub mod outbox;
pub mod peer;
pub mod protocol;
pub mod runtime;
pub mod session;

pub use versus_tetris_core as core;
pub use versus_tetris_types as types;

pub use config::{PeerRole, SyncConfig};
pub use outbox::Outbox;
pub use peer::{PeerEvent, PeerLink, WireLog};
pub use protocol::{parse_message, ProtocolError, SyncMessage, PROTOCOL_VERSION};
pub use runtime::NetPeer;
pub use session::{AttackDirection, AttackListener, MatchOutcome, MatchSession};
