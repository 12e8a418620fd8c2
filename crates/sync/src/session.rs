//! Match session - one local authority, one remote mirror
//!
//! Each tick the session drains what the peer sent (mirror replay, incoming
//! attack, pacing), steps the local field with the sampled actions, and turns
//! the local field's events into outgoing messages.

use std::sync::Arc;

use crate::core::pacing::PacingCurve;
use crate::core::playfield::{FieldEvent, Playfield};
use crate::core::snapshot::FieldSnapshot;
use crate::outbox::Outbox;
use crate::peer::PeerEvent;
use crate::protocol::{SyncMessage, PROTOCOL_VERSION};
use crate::types::{ActionSet, RotationSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The opponent topped out
    Won,
    /// The local field topped out
    Lost,
    /// The local player left
    Forfeited,
    OpponentForfeit,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackDirection {
    Sent,
    Received,
}

/// Notified whenever attack crosses the wire
///
/// `lines` is negative when the opponent forfeits or disconnects.
pub trait AttackListener {
    fn on_attack(&mut self, direction: AttackDirection, lines: i32);
}

impl<F> AttackListener for F
where
    F: FnMut(AttackDirection, i32),
{
    fn on_attack(&mut self, direction: AttackDirection, lines: i32) {
        self(direction, lines)
    }
}

pub struct MatchSession {
    local: Playfield,
    remote: Option<Playfield>,
    curve: PacingCurve,
    outbox: Arc<Outbox>,
    pacing_host: bool,
    level_ticks: u32,
    level: u32,
    ticks: u64,
    hello_sent: bool,
    outcome: Option<MatchOutcome>,
    listener: Option<Box<dyn AttackListener + Send>>,
}

impl MatchSession {
    /// `local` must be an authority field that has not started yet.
    pub fn new(
        local: Playfield,
        curve: PacingCurve,
        outbox: Arc<Outbox>,
        pacing_host: bool,
        level_ticks: u32,
    ) -> Self {
        let level = local.level();
        Self {
            local,
            remote: None,
            curve,
            outbox,
            pacing_host,
            level_ticks,
            level,
            ticks: 0,
            hello_sent: false,
            outcome: None,
            listener: None,
        }
    }

    pub fn set_attack_listener<L>(&mut self, listener: L)
    where
        L: AttackListener + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Announce the local rotation system.
    pub fn begin(&mut self) {
        if self.hello_sent {
            return;
        }
        self.hello_sent = true;
        self.outbox.push(SyncMessage::Hello {
            version: PROTOCOL_VERSION,
            system: self.local.rotation_system(),
        });
    }

    pub fn local(&self) -> &Playfield {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Playfield {
        &mut self.local
    }

    /// Mirror of the opponent; present after the handshake
    pub fn remote(&self) -> Option<&Playfield> {
        self.remote.as_ref()
    }

    pub fn remote_system(&self) -> Option<RotationSystem> {
        self.remote.as_ref().map(|r| r.rotation_system())
    }

    pub fn is_connected(&self) -> bool {
        self.remote.is_some()
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    pub fn local_snapshot_into(&self, out: &mut FieldSnapshot) {
        self.local.snapshot_into(out);
    }

    /// Returns false before the handshake.
    pub fn remote_snapshot_into(&self, out: &mut FieldSnapshot) -> bool {
        match self.remote.as_ref() {
            Some(remote) => {
                remote.snapshot_into(out);
                true
            }
            None => false,
        }
    }

    /// Leave the match and tell the opponent.
    pub fn forfeit(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.outbox.push(SyncMessage::Bye);
        self.finish(MatchOutcome::Forfeited);
    }

    /// One tick: inbound first, then the local step.
    pub fn step<I>(&mut self, inbound: I, input: ActionSet) -> Option<MatchOutcome>
    where
        I: IntoIterator<Item = PeerEvent>,
    {
        for event in inbound {
            if self.outcome.is_some() {
                break;
            }
            match event {
                PeerEvent::Message(message) => self.handle_message(message),
                PeerEvent::Closed => {
                    println!("[Sync] Opponent disconnected");
                    self.notify(AttackDirection::Received, -1);
                    self.finish(MatchOutcome::Disconnected);
                }
            }
        }
        if self.outcome.is_some() || !self.local.started() {
            return self.outcome;
        }

        self.ticks += 1;
        if self.pacing_host && self.level_ticks > 0 && self.ticks % u64::from(self.level_ticks) == 0
        {
            let level = self.level + 1;
            self.apply_level(level);
            self.outbox.push_priority(SyncMessage::Level(level));
        }

        self.local.tick(input);
        if let Some(remote) = self.remote.as_mut() {
            remote.tick(ActionSet::empty());
        }
        self.publish_local_events();
        self.outcome
    }

    fn handle_message(&mut self, message: SyncMessage) {
        let Some(remote) = self.remote.as_mut() else {
            match message {
                SyncMessage::Hello { version, system } => self.handshake(version, system),
                other => eprintln!("[Sync] Dropping {} before handshake", other.tag()),
            }
            return;
        };

        let tag = message.tag();
        let replayed = match message {
            SyncMessage::Hello { .. } => {
                eprintln!("[Sync] Ignoring repeated handshake");
                Ok(())
            }
            SyncMessage::Bag(bag) => {
                remote.push_bag(&bag);
                Ok(())
            }
            SyncMessage::Entry(flags) => remote.replay_entry(flags),
            SyncMessage::Actions(actions) => remote.replay_actions(actions),
            SyncMessage::Gravity(cells) => remote.replay_gravity(cells),
            SyncMessage::ForcedLock(pose) => remote.replay_lock(pose),
            SyncMessage::Garbage(holes) => remote.replay_garbage(&holes),
            SyncMessage::Level(level) => {
                if !self.pacing_host {
                    self.apply_level(level);
                }
                Ok(())
            }
            SyncMessage::Attack(lines) => {
                match i32::try_from(lines) {
                    Ok(signed) => {
                        self.local.receive_attack(lines);
                        self.notify(AttackDirection::Received, signed);
                    }
                    Err(_) => eprintln!("[Sync] Dropping attack of {} lines", lines),
                }
                Ok(())
            }
            SyncMessage::ToppedOut => {
                remote.mark_topped_out();
                println!("[Sync] Opponent topped out");
                self.finish(MatchOutcome::Won);
                Ok(())
            }
            SyncMessage::Bye => {
                println!("[Sync] Opponent left the match");
                self.notify(AttackDirection::Received, -1);
                self.finish(MatchOutcome::OpponentForfeit);
                Ok(())
            }
        };
        if let Err(e) = replayed {
            eprintln!("[Sync] Mirror rejected {}: {}", tag, e);
        }
    }

    fn handshake(&mut self, version: u32, system: RotationSystem) {
        if version != PROTOCOL_VERSION {
            eprintln!(
                "[Sync] Ignoring handshake with protocol version {} (expected {})",
                version, PROTOCOL_VERSION
            );
            return;
        }
        self.begin();

        let mut remote = Playfield::mirror(system, self.curve.clone(), self.level);
        remote.start();
        self.remote = Some(remote);
        self.local.start();
        println!(
            "[Sync] Match started: local {} vs remote {}",
            self.local.rotation_system().as_str(),
            system.as_str()
        );
        self.publish_local_events();
    }

    fn apply_level(&mut self, level: u32) {
        self.level = level;
        self.local.set_level(level);
        if let Some(remote) = self.remote.as_mut() {
            remote.set_level(level);
        }
    }

    fn publish_local_events(&mut self) {
        for event in self.local.take_events() {
            match event {
                FieldEvent::BagQueued(bag) => self.outbox.push(SyncMessage::Bag(bag)),
                FieldEvent::Spawned { flags, .. } => self.outbox.push(SyncMessage::Entry(flags)),
                // Mirrors treat a hard drop as a sonic drop and wait for FL.
                FieldEvent::Actions(actions) => self.outbox.push(SyncMessage::Actions(actions)),
                FieldEvent::Fell(cells) => self.outbox.push(SyncMessage::Gravity(cells)),
                FieldEvent::Locked(pose) => {
                    self.outbox.supersede(SyncMessage::ForcedLock(pose));
                }
                FieldEvent::Merged(_) => {}
                FieldEvent::GarbageRows(holes) => self.outbox.push(SyncMessage::Garbage(holes)),
                FieldEvent::AttackSent(lines) => {
                    self.outbox.push_priority(SyncMessage::Attack(lines));
                    self.notify(AttackDirection::Sent, i32::try_from(lines).unwrap_or(i32::MAX));
                }
                FieldEvent::ToppedOut => {
                    self.outbox.push(SyncMessage::ToppedOut);
                    println!("[Sync] Topped out");
                    self.finish(MatchOutcome::Lost);
                }
            }
        }
    }

    fn notify(&mut self, direction: AttackDirection, lines: i32) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_attack(direction, lines);
        }
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playfield::{FieldPhase, LockPose};
    use crate::protocol::parse_message;
    use crate::types::{PieceKind, Rotation};
    use crate::core::setup::MatchSetup;
    use crate::types::KeyAction;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::sync::Mutex;

    fn session(system: RotationSystem, seed: u64, pacing_host: bool) -> MatchSession {
        let local = MatchSetup::new()
            .rotation_system(system)
            .seed(seed)
            .build()
            .unwrap();
        MatchSession::new(
            local,
            PacingCurve::default(),
            Arc::new(Outbox::new()),
            pacing_host,
            0,
        )
    }

    fn sent(session: &MatchSession) -> Vec<PeerEvent> {
        session
            .outbox()
            .drain()
            .into_iter()
            .map(PeerEvent::Message)
            .collect()
    }

    fn connect(a: &mut MatchSession, b: &mut MatchSession) {
        a.begin();
        b.begin();
        let to_b = sent(a);
        let to_a = sent(b);
        b.step(to_b, ActionSet::empty());
        a.step(to_a, ActionSet::empty());
    }

    #[test]
    fn test_messages_before_handshake_are_dropped() {
        let mut a = session(RotationSystem::Modern, 1, true);
        a.step(
            vec![PeerEvent::Message(SyncMessage::Attack(3))],
            ActionSet::empty(),
        );
        assert!(!a.is_connected());
        assert!(a.local().ledger().is_empty());
        assert!(!a.local().started());
    }

    #[test]
    fn test_handshake_builds_mirror_with_remote_system() {
        let mut a = session(RotationSystem::Modern, 1, true);
        let mut b = session(RotationSystem::Classic, 2, false);
        connect(&mut a, &mut b);

        assert_eq!(a.remote_system(), Some(RotationSystem::Classic));
        assert_eq!(b.remote_system(), Some(RotationSystem::Modern));
        assert!(a.local().started());
        assert!(b.local().started());
    }

    #[test]
    fn test_attack_reaches_ledger_and_listener() {
        let mut a = session(RotationSystem::Modern, 1, true);
        let mut b = session(RotationSystem::Modern, 2, false);
        connect(&mut a, &mut b);

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            b.set_attack_listener(move |dir: AttackDirection, lines: i32| {
                seen.lock().unwrap().push((dir, lines))
            });
        }
        b.step(
            vec![PeerEvent::Message(SyncMessage::Attack(2))],
            ActionSet::empty(),
        );
        assert_eq!(b.local().ledger().pending_total(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(AttackDirection::Received, 2)]
        );

        b.step(vec![PeerEvent::Closed], ActionSet::empty());
        assert_eq!(b.outcome(), Some(MatchOutcome::Disconnected));
        assert_eq!(seen.lock().unwrap().last(), Some(&(AttackDirection::Received, -1)));
    }

    #[test]
    fn test_out_of_range_reports_leave_match_running() {
        let mut a = session(RotationSystem::Modern, 1, true);
        let mut b = session(RotationSystem::Modern, 2, false);
        connect(&mut a, &mut b);
        b.step(sent(&a), ActionSet::empty());

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            b.set_attack_listener(move |dir: AttackDirection, lines: i32| {
                seen.lock().unwrap().push((dir, lines))
            });
        }

        // The line codec refuses these outright.
        let lines = [
            "FL T 127 30 0 R",
            "FL T 3 -100 0 -",
            "AT 3000000000",
            "AT 4294967295",
            "GR 4294967295",
        ];
        assert!(lines.iter().all(|line| parse_message(line).is_err()));

        // Built directly they still get past the parser; the session drops them.
        let far = LockPose {
            kind: PieceKind::T,
            x: i8::MAX,
            y: 30,
            rotation: Rotation::North,
            rotated_last: true,
            large_kick: false,
        };
        let events = vec![
            PeerEvent::Message(SyncMessage::ForcedLock(far)),
            PeerEvent::Message(SyncMessage::Attack(u32::MAX)),
            PeerEvent::Message(SyncMessage::Attack(u32::MAX)),
            PeerEvent::Message(SyncMessage::Gravity(u32::MAX)),
        ];
        let locked_before = b.remote().unwrap().pieces_locked();
        for _ in 0..3 {
            b.step(events.clone(), ActionSet::empty());
        }

        assert_eq!(b.outcome(), None);
        assert!(b.is_connected());
        assert!(seen.lock().unwrap().is_empty());
        assert!(b.local().ledger().is_empty());
        assert_eq!(b.remote().unwrap().pieces_locked(), locked_before);
        assert!(!b.remote().unwrap().is_topped_out());

        let mut snapshot = FieldSnapshot::default();
        b.local().snapshot_into(&mut snapshot);
        assert_eq!(snapshot.pending_garbage, 0);
    }

    #[test]
    fn test_terminal_messages() {
        let mut a = session(RotationSystem::Modern, 1, true);
        let mut b = session(RotationSystem::Modern, 2, false);
        connect(&mut a, &mut b);

        a.forfeit();
        assert_eq!(a.outcome(), Some(MatchOutcome::Forfeited));
        let to_b = sent(&a);
        assert!(to_b.contains(&PeerEvent::Message(SyncMessage::Bye)));
        b.step(to_b, ActionSet::empty());
        assert_eq!(b.outcome(), Some(MatchOutcome::OpponentForfeit));

        let mut c = session(RotationSystem::Modern, 3, true);
        let mut d = session(RotationSystem::Modern, 4, false);
        connect(&mut c, &mut d);
        c.step(
            vec![PeerEvent::Message(SyncMessage::ToppedOut)],
            ActionSet::empty(),
        );
        assert_eq!(c.outcome(), Some(MatchOutcome::Won));
        assert!(c.remote().unwrap().is_topped_out());
    }

    #[test]
    fn test_pacing_host_sends_levels() {
        let mut a = session(RotationSystem::Modern, 1, true);
        let mut b = session(RotationSystem::Modern, 2, false);
        a.level_ticks = 5;
        b.level_ticks = 5;
        connect(&mut a, &mut b);

        let mut to_b = Vec::new();
        for _ in 0..10 {
            a.step(Vec::new(), ActionSet::empty());
            to_b.extend(sent(&a));
        }
        assert_eq!(a.level(), 2);
        assert!(to_b.contains(&PeerEvent::Message(SyncMessage::Level(2))));

        // The joining side only follows the host.
        b.step(to_b, ActionSet::empty());
        assert_eq!(b.level(), 2);
        assert_eq!(b.local().level(), 2);
        assert_eq!(b.remote().unwrap().level(), 2);
    }

    fn random_input(rng: &mut StdRng) -> ActionSet {
        let mut set = ActionSet::empty();
        if rng.gen_bool(0.3) {
            if let Some(&action) = KeyAction::ORDER.choose(rng) {
                set.insert(action);
            }
        }
        set
    }

    /// Mirror's view of `authority`, both settled.
    fn assert_mirrors(authority: &Playfield, mirror: &Playfield) {
        let mut authority = authority.clone();
        let mut mirror = mirror.clone();
        if authority.phase() == FieldPhase::Active {
            assert_eq!(mirror.active(), authority.active());
        }
        authority.settle();
        mirror.settle();
        assert_eq!(mirror.board(), authority.board());
        assert_eq!(mirror.pieces_locked(), authority.pieces_locked());
        assert_eq!(mirror.hold_piece(), authority.hold_piece());
    }

    #[test]
    fn test_mirror_tracks_authority_with_random_play() {
        for (sa, sb) in [
            (RotationSystem::Modern, RotationSystem::Classic),
            (RotationSystem::Classic, RotationSystem::Modern),
        ] {
            let mut a = session(sa, 11, true);
            let mut b = session(sb, 12, false);
            connect(&mut a, &mut b);
            let mut rng = StdRng::seed_from_u64(99);
            let mut to_a = sent(&b);

            for _ in 0..3000 {
                a.step(std::mem::take(&mut to_a), random_input(&mut rng));
                let to_b = sent(&a);
                b.step(to_b, random_input(&mut rng));
                to_a = sent(&b);

                if let Some(mirror) = b.remote() {
                    if !b.is_over() {
                        assert_mirrors(a.local(), mirror);
                    }
                }
                if a.is_over() || b.is_over() {
                    break;
                }
            }
            assert!(a.local().pieces_locked() > 5);
        }
    }
}
