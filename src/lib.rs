//! Versus Tetris (workspace facade crate).
//!
//! Exposes `versus_tetris::{core,sync,types}` while the implementation lives in
//! dedicated crates under `crates/`.

pub use versus_tetris_core as core;
pub use versus_tetris_sync as sync;
pub use versus_tetris_types as types;
