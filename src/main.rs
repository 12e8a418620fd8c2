//! Headless match runner (default binary).
//!
//! Hosts or joins a match per `VERSUS_*` environment variables and drives
//! the local field with a seeded random input sampler at the fixed tick rate.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use versus_tetris::core::input::InputSampler;
use versus_tetris::core::snapshot::FieldSnapshot;
use versus_tetris::sync::{AttackDirection, MatchSession, NetPeer, SyncConfig};
use versus_tetris::types::{ActionSet, KeyAction, TICK_MS, TICKS_PER_SECOND};

/// Presses one random action on a fraction of ticks.
struct RandomInput {
    rng: StdRng,
    press_chance: f64,
}

impl RandomInput {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            press_chance: 0.15,
        }
    }
}

impl InputSampler for RandomInput {
    fn sample(&mut self, _tick: u64) -> ActionSet {
        let mut set = ActionSet::empty();
        if self.rng.gen_bool(self.press_chance) {
            if let Some(&action) = KeyAction::ORDER.choose(&mut self.rng) {
                set.insert(action);
            }
        }
        set
    }
}

fn main() -> Result<()> {
    let config = SyncConfig::from_env().context("invalid VERSUS_* configuration")?;
    let field = config
        .match_setup()
        .build()
        .context("cannot set up the local field")?;

    println!(
        "[Runner] {:?} on {}:{} with {} rotation",
        config.role,
        config.host,
        config.port,
        field.rotation_system().as_str()
    );

    let mut peer = NetPeer::start(&config)?;
    let mut session = MatchSession::new(
        field,
        config.pacing.clone(),
        peer.outbox(),
        config.role.is_pacing_host(),
        config.level_ticks,
    );
    session.set_attack_listener(|direction: AttackDirection, lines: i32| match direction {
        AttackDirection::Sent => println!("[Runner] Sent {} lines", lines),
        AttackDirection::Received if lines < 0 => println!("[Runner] Opponent gone"),
        AttackDirection::Received => println!("[Runner] Incoming {} lines", lines),
    });
    session.begin();

    let mut input = RandomInput::new(config.seed.unwrap_or_else(rand::random));
    let tick_duration = Duration::from_millis(u64::from(TICK_MS));
    let mut next_tick = Instant::now();
    let mut snapshot = FieldSnapshot::default();

    let outcome = loop {
        let inbound = peer.poll_events();
        let actions = input.sample(session.ticks());
        if let Some(outcome) = session.step(inbound, actions) {
            break outcome;
        }

        if session.ticks() > 0 && session.ticks() % u64::from(TICKS_PER_SECOND * 10) == 0 {
            session.local_snapshot_into(&mut snapshot);
            println!(
                "[Runner] tick {} level {} pieces {} lines {} sent {} pending {}",
                session.ticks(),
                snapshot.level,
                snapshot.pieces,
                snapshot.lines,
                snapshot.attack_sent,
                snapshot.pending_garbage
            );
        }

        next_tick += tick_duration;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            next_tick = now;
        }
    };

    println!("[Runner] Match over: {:?}", outcome);
    peer.close();
    Ok(())
}
