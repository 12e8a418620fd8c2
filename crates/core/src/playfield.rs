//! Playfield module - the per-tick field state machine
//!
//! A field is either the **authority** for its own physics (gravity, lock
//! delay, bag generation, garbage materialization) or a **mirror** that
//! replays what the remote authority reported. Both share the same board,
//! rotation and scoring code, so replaying the same inputs in the same order
//! yields the same board.
//!
//! Phases: `Idle` (pre-spawn or pause window) → `Active` → `Locking` (flash)
//! → `Idle`, or `ToppedOut` (terminal).
//!
//! The authority records what happened during a tick as [`FieldEvent`]s; the
//! sync layer turns them into wire messages. Mirrors never emit events.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::board::{Board, ClearedRows};
use crate::garbage::{GarbageLedger, HoleRoller};
use crate::pacing::{PacingCurve, PacingLevel};
use crate::pieces::{get_shape, pivot_and_facing, Piece};
use crate::rng::{Bag, BagGenerator, PieceQueue};
use crate::rotation::{is_large_kick, rotate_piece, RotateOutcome};
use crate::scoring::ClearChain;
use crate::snapshot::{ActiveSnapshot, FieldSnapshot, PhaseSnapshot};
use crate::types::*;

/// Most garbage rows materialized before a single spawn
pub const MAX_GARBAGE_PER_SPAWN: u32 = VISIBLE_HEIGHT as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Authority,
    Mirror,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPhase {
    Idle,
    Active,
    Locking,
    ToppedOut,
}

/// Last successful piece action, for spin attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LastAction {
    #[default]
    None,
    Rotation {
        large_kick: bool,
    },
    Other,
}

/// Absolute pose of a locking piece plus the spin attribution flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPose {
    pub kind: PieceKind,
    pub x: i8,
    pub y: i8,
    pub rotation: Rotation,
    pub rotated_last: bool,
    pub large_kick: bool,
}

impl LockPose {
    pub fn piece(&self, system: RotationSystem) -> Piece {
        Piece::new(self.kind, self.rotation, self.x, self.y, system)
    }

    /// True when all four minos land inside the board.
    pub fn fits_board(&self, system: RotationSystem) -> bool {
        let width = 0..i16::from(BOARD_WIDTH);
        let height = 0..i16::from(BOARD_HEIGHT);
        get_shape(system, self.kind, self.rotation)
            .iter()
            .all(|&(dx, dy)| {
                width.contains(&(i16::from(self.x) + i16::from(dx)))
                    && height.contains(&(i16::from(self.y) + i16::from(dy)))
            })
    }
}

/// What the authoritative field did during a tick, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// A bag was appended to the queue
    BagQueued(Bag),
    /// A piece entered; `flags` holds the entry rotate/hold actions
    Spawned { kind: PieceKind, flags: ActionSet },
    /// Actions applied to the active piece this tick
    Actions(ActionSet),
    /// Cells fallen under gravity this tick
    Fell(u32),
    /// The active piece locked at this pose
    Locked(LockPose),
    /// The locked piece merged into the board
    Merged(LockSummary),
    /// Garbage rows inserted at the bottom (hole columns, top to bottom)
    GarbageRows(Vec<u8>),
    /// Attack left after countering incoming garbage
    AttackSent(u32),
    ToppedOut,
}

/// Reasons a mirror cannot apply a remote report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("piece entry with an empty queue")]
    QueueEmpty,
    #[error("no active piece")]
    NoActivePiece,
    #[error("field has topped out")]
    ToppedOut,
    #[error("garbage hole column {0} is off the board")]
    BadHoleColumn(u8),
    #[error("lock pose ({x}, {y}) leaves the board")]
    PoseOffBoard { x: i8, y: i8 },
}

/// Complete state of one player's field
#[derive(Debug, Clone)]
pub struct Playfield {
    role: FieldRole,
    system: RotationSystem,
    board: Board,
    active: Option<Piece>,
    hold: Option<PieceKind>,
    can_hold: bool,
    queue: PieceQueue,
    /// Authority only
    bags: Option<BagGenerator>,
    preset_bags: VecDeque<Bag>,
    ledger: GarbageLedger,
    holes: HoleRoller,
    rng: StdRng,
    curve: PacingCurve,
    level: u32,
    pacing: PacingLevel,
    phase: FieldPhase,
    /// Ticks left in the current idle or flash window
    pause: u32,
    locking: Option<(Piece, SpinKind)>,
    pending_rows: ClearedRows,
    lock_timer: u32,
    last_row: i8,
    gravity_acc: u32,
    last_action: LastAction,
    chain: ClearChain,
    last_lock_cleared: bool,
    started: bool,
    ticks: u64,
    pieces_locked: u32,
    lines_cleared: u32,
    attack_sent: u32,
    last_summary: Option<LockSummary>,
    events: Vec<FieldEvent>,
}

impl Playfield {
    /// Authoritative field; prefer [`MatchSetup`](crate::setup::MatchSetup).
    pub fn authority(
        system: RotationSystem,
        seed: Option<u64>,
        curve: PacingCurve,
        level: u32,
        preset_bags: VecDeque<Bag>,
    ) -> Self {
        let (bags, mut rng) = match seed {
            Some(seed) => (
                BagGenerator::new(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (BagGenerator::from_entropy(), StdRng::from_entropy()),
        };
        let holes = HoleRoller::random(&mut rng);
        let mut field = Self::with_role(FieldRole::Authority, system, curve, level, rng, holes);
        field.bags = Some(bags);
        field.preset_bags = preset_bags;
        field
    }

    /// Mirror of a remote field; its queue is fed by [`Playfield::push_bag`].
    pub fn mirror(system: RotationSystem, curve: PacingCurve, level: u32) -> Self {
        let rng = StdRng::seed_from_u64(0);
        Self::with_role(
            FieldRole::Mirror,
            system,
            curve,
            level,
            rng,
            HoleRoller::starting_at(0),
        )
    }

    fn with_role(
        role: FieldRole,
        system: RotationSystem,
        curve: PacingCurve,
        level: u32,
        rng: StdRng,
        holes: HoleRoller,
    ) -> Self {
        let pacing = curve.level(level);
        Self {
            role,
            system,
            board: Board::new(),
            active: None,
            hold: None,
            can_hold: true,
            queue: PieceQueue::new(),
            bags: None,
            preset_bags: VecDeque::new(),
            ledger: GarbageLedger::new(),
            holes,
            rng,
            curve,
            level,
            pacing,
            phase: FieldPhase::Idle,
            pause: 0,
            locking: None,
            pending_rows: ClearedRows::new(),
            lock_timer: pacing.lock_delay,
            last_row: SPAWN_Y,
            gravity_acc: 0,
            last_action: LastAction::None,
            chain: ClearChain::new(),
            last_lock_cleared: false,
            started: false,
            ticks: 0,
            pieces_locked: 0,
            lines_cleared: 0,
            attack_sent: 0,
            last_summary: None,
            events: Vec::with_capacity(8),
        }
    }

    /// Begin the match. The authority deals its first bags here.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.phase = FieldPhase::Idle;
        self.pause = 0;
        if self.role == FieldRole::Authority {
            self.refill_queue();
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn role(&self) -> FieldRole {
        self.role
    }

    pub fn rotation_system(&self) -> RotationSystem {
        self.system
    }

    pub fn phase(&self) -> FieldPhase {
        self.phase
    }

    pub fn is_topped_out(&self) -> bool {
        self.phase == FieldPhase::ToppedOut
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Direct board access for scenario setup.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn next_pieces(&self) -> [Option<PieceKind>; PREVIEW_DEPTH] {
        self.queue.preview()
    }

    pub fn queue(&self) -> &PieceQueue {
        &self.queue
    }

    pub fn ledger(&self) -> &GarbageLedger {
        &self.ledger
    }

    pub fn combo(&self) -> i32 {
        self.chain.combo()
    }

    pub fn back_to_back(&self) -> bool {
        self.chain.back_to_back()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn pacing(&self) -> &PacingLevel {
        &self.pacing
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pieces_locked(&self) -> u32 {
        self.pieces_locked
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn attack_sent(&self) -> u32 {
        self.attack_sent
    }

    pub fn last_summary(&self) -> Option<LockSummary> {
        self.last_summary
    }

    /// Rows cleared by the last lock and not yet removed
    pub fn pending_rows(&self) -> &[usize] {
        &self.pending_rows
    }

    /// Landing row of the active piece
    pub fn ghost_y(&self) -> Option<i8> {
        self.active.map(|p| p.drop_row(&self.board))
    }

    /// Drain the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<FieldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Switch pacing level. The lock timer never grows past the new delay.
    pub fn set_level(&mut self, level: u32) {
        self.level = level;
        self.pacing = self.curve.level(level);
        self.lock_timer = self.lock_timer.min(self.pacing.lock_delay);
    }

    /// Queue incoming attack from the opponent.
    pub fn receive_attack(&mut self, lines: u32) {
        self.ledger.enqueue(lines);
    }

    pub fn snapshot_into(&self, out: &mut FieldSnapshot) {
        self.board.write_code_grid(&mut out.board);
        out.active = self.active.map(ActiveSnapshot::from);
        out.ghost_y = self.ghost_y();
        out.hold = self.hold;
        out.next_queue = self.queue.preview();
        out.can_hold = self.can_hold;
        out.phase = match self.phase {
            FieldPhase::Idle => PhaseSnapshot::Idle,
            FieldPhase::Active => PhaseSnapshot::Active,
            FieldPhase::Locking => PhaseSnapshot::Locking,
            FieldPhase::ToppedOut => PhaseSnapshot::ToppedOut,
        };
        out.level = self.level;
        out.combo = self.chain.combo();
        out.back_to_back = self.chain.back_to_back();
        out.pending_garbage = self.ledger.pending_total();
        out.pieces = self.pieces_locked;
        out.lines = self.lines_cleared;
        out.attack_sent = self.attack_sent;
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        let mut s = FieldSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Advance one tick with the actions asserted on it.
    ///
    /// Mirrors only run their flash and pause timers here; their pieces move
    /// through the `replay_*` calls.
    pub fn tick(&mut self, input: ActionSet) {
        if !self.started || self.phase == FieldPhase::ToppedOut {
            return;
        }
        self.ticks += 1;

        match self.phase {
            FieldPhase::Locking => {
                self.pause = self.pause.saturating_sub(1);
                if self.pause == 0 {
                    self.merge_locked();
                }
            }
            FieldPhase::Idle => {
                self.pause = self.pause.saturating_sub(1);
                if self.pause > 0 {
                    return;
                }
                if !self.pending_rows.is_empty() {
                    self.compact_rows();
                    self.pause = self.pacing.are;
                    return;
                }
                if self.role == FieldRole::Mirror {
                    return;
                }
                if !self.last_lock_cleared {
                    self.materialize_garbage();
                    if self.phase == FieldPhase::ToppedOut {
                        return;
                    }
                }
                if let Some(rest) = self.spawn_next(input) {
                    self.step_active(rest);
                }
            }
            FieldPhase::Active => {
                if self.role == FieldRole::Authority {
                    self.step_active(input);
                }
            }
            FieldPhase::ToppedOut => {}
        }
    }

    fn step_active(&mut self, input: ActionSet) {
        if !input.is_empty() {
            self.emit(FieldEvent::Actions(input));
        }
        self.apply_actions(input);
        if self.phase == FieldPhase::Active {
            self.apply_gravity();
        }
    }

    fn apply_actions(&mut self, actions: ActionSet) {
        for action in actions.iter() {
            if self.active.is_none() {
                break;
            }
            match action {
                KeyAction::Hold => {
                    self.hold();
                }
                KeyAction::RotateLeft => {
                    self.try_rotate(RotateDirection::Left);
                }
                KeyAction::RotateRight => {
                    self.try_rotate(RotateDirection::Right);
                }
                KeyAction::MoveLeft => {
                    self.try_move(-1, 0);
                }
                KeyAction::MoveRight => {
                    self.try_move(1, 0);
                }
                KeyAction::SoftDrop => {
                    self.soft_drop();
                }
                KeyAction::SonicDrop => {
                    self.sonic_drop();
                }
                KeyAction::HardDrop => {
                    self.hard_drop();
                }
            }
        }
    }

    fn emit(&mut self, event: FieldEvent) {
        if self.role == FieldRole::Authority {
            self.events.push(event);
        }
    }

    /// Keep at least the preview depth queued (authority only).
    fn refill_queue(&mut self) {
        while self.queue.needs_bag() {
            let bag = match self.preset_bags.pop_front() {
                Some(bag) => bag,
                None => match self.bags.as_mut() {
                    Some(gen) => gen.next_bag(),
                    None => return,
                },
            };
            self.queue.push_bag(&bag);
            self.emit(FieldEvent::BagQueued(bag));
        }
    }

    fn draw_piece(&mut self) -> Option<PieceKind> {
        let kind = self.queue.draw();
        if self.role == FieldRole::Authority {
            self.refill_queue();
        }
        kind
    }

    fn reset_piece_counters(&mut self, row: i8) {
        self.lock_timer = self.pacing.lock_delay;
        self.last_row = row;
        self.gravity_acc = 0;
    }

    /// Put `kind` at the spawn pose; a collision tops the field out.
    fn enter_piece(&mut self, kind: PieceKind) {
        let piece = Piece::spawn(kind, self.system);
        self.can_hold = true;
        self.last_action = LastAction::None;
        self.reset_piece_counters(piece.y);
        if piece.collides(&self.board) {
            self.active = None;
            self.top_out();
            return;
        }
        self.active = Some(piece);
        self.phase = FieldPhase::Active;
    }

    /// Spawn the next piece and apply entry rotate/hold from `input`.
    ///
    /// Returns the actions left for the regular action step.
    fn spawn_next(&mut self, input: ActionSet) -> Option<ActionSet> {
        let kind = self.draw_piece()?;
        self.enter_piece(kind);
        if self.phase == FieldPhase::ToppedOut {
            return None;
        }

        let mut rest = input;
        let mut flags = ActionSet::empty();
        for action in [KeyAction::RotateLeft, KeyAction::RotateRight, KeyAction::Hold] {
            if rest.remove(action) {
                flags.insert(action);
            }
        }
        self.emit(FieldEvent::Spawned { kind, flags });
        self.apply_entry_flags(flags);

        if self.phase == FieldPhase::Active {
            Some(rest)
        } else {
            None
        }
    }

    fn apply_entry_flags(&mut self, flags: ActionSet) {
        let left = flags.contains(KeyAction::RotateLeft);
        let right = flags.contains(KeyAction::RotateRight);
        if left && !right {
            self.try_rotate(RotateDirection::Left);
        } else if right && !left {
            self.try_rotate(RotateDirection::Right);
        }
        if flags.contains(KeyAction::Hold) {
            self.hold();
        }
    }

    /// Move the active piece; false if blocked or no piece.
    pub fn try_move(&mut self, dx: i8, dy: i8) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let moved = piece.shifted(dx, dy);
        if moved.collides(&self.board) {
            return false;
        }
        self.active = Some(moved);
        self.last_action = LastAction::Other;
        true
    }

    pub fn try_rotate(&mut self, direction: RotateDirection) -> RotateOutcome {
        let Some(piece) = self.active else {
            return RotateOutcome::NoPiece;
        };
        let outcome = rotate_piece(&piece, direction, &self.board);
        if let RotateOutcome::Rotated { piece, kick } = outcome {
            self.active = Some(piece);
            self.last_action = LastAction::Rotation {
                large_kick: is_large_kick(kick),
            };
        }
        outcome
    }

    /// Swap with the held piece (or stash and draw). Once per piece.
    pub fn hold(&mut self) -> bool {
        if !self.can_hold {
            return false;
        }
        let Some(current) = self.active else {
            return false;
        };
        let next = match self.hold {
            Some(held) => held,
            None => match self.draw_piece() {
                Some(kind) => kind,
                None => return false,
            },
        };
        self.hold = Some(current.kind);

        let piece = Piece::spawn(next, self.system);
        self.can_hold = false;
        self.last_action = LastAction::Other;
        self.reset_piece_counters(piece.y);
        if piece.collides(&self.board) {
            self.active = None;
            self.top_out();
            return true;
        }
        self.active = Some(piece);
        true
    }

    /// One cell down. A resting piece locks only under classic softlock,
    /// and only on the authority.
    pub fn soft_drop(&mut self) -> bool {
        if self.try_move(0, 1) {
            return true;
        }
        if self.active.is_some()
            && self.role == FieldRole::Authority
            && self.system.soft_drop_locks()
        {
            self.lock_active();
            return true;
        }
        false
    }

    /// Drop to the landing row without locking; returns cells moved.
    pub fn sonic_drop(&mut self) -> u32 {
        let Some(piece) = self.active else {
            return 0;
        };
        let target = piece.drop_row(&self.board);
        let cells = (target - piece.y) as u32;
        if cells > 0 {
            self.active = Some(Piece { y: target, ..piece });
            self.last_action = LastAction::Other;
        }
        cells
    }

    /// Sonic drop then lock. On a mirror this is a plain sonic drop; the
    /// authority's forced lock follows separately.
    pub fn hard_drop(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.sonic_drop();
        if self.role == FieldRole::Authority {
            self.lock_active();
        }
        true
    }

    fn apply_gravity(&mut self) {
        if self.active.is_none() {
            return;
        }
        let gravity = self.pacing.gravity;
        let denominator = gravity.denominator.max(1);
        // Whole cells fall now; the fraction carries into later ticks.
        self.gravity_acc = self.gravity_acc.saturating_add(gravity.numerator);
        let cells = self.gravity_acc / denominator;
        self.gravity_acc %= denominator;

        let fell = self.fall(cells);
        if fell > 0 {
            self.emit(FieldEvent::Fell(fell));
        }
        self.update_lock_delay();
    }

    /// Gravity movement; does not count as a player action.
    fn fall(&mut self, cells: u32) -> u32 {
        let mut fell = 0;
        while fell < cells {
            let Some(piece) = self.active else {
                break;
            };
            let lower = piece.shifted(0, 1);
            if lower.collides(&self.board) {
                break;
            }
            self.active = Some(lower);
            fell += 1;
        }
        fell
    }

    fn update_lock_delay(&mut self) {
        let Some(piece) = self.active else {
            return;
        };
        if piece.y != self.last_row {
            self.last_row = piece.y;
            self.lock_timer = self.pacing.lock_delay;
            return;
        }
        if piece.is_grounded(&self.board) {
            if self.lock_timer <= 1 {
                self.lock_active();
            } else {
                self.lock_timer -= 1;
            }
        }
    }

    /// Stop the active piece and start the flash window.
    fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        let (rotated_last, large_kick) = match self.last_action {
            LastAction::Rotation { large_kick } => (true, large_kick),
            _ => (false, false),
        };
        let spin = detect_spin(&self.board, &piece, rotated_last, large_kick);

        self.emit(FieldEvent::Locked(LockPose {
            kind: piece.kind,
            x: piece.x,
            y: piece.y,
            rotation: piece.rotation,
            rotated_last,
            large_kick,
        }));

        for (x, y) in piece.cells() {
            self.board.set(x, y, CellValue::Flash);
        }
        self.locking = Some((piece, spin));
        self.phase = FieldPhase::Locking;
        self.pause = self.pacing.flash;
        if self.pause == 0 {
            self.merge_locked();
        }
    }

    /// Merge the flashing piece, score it and schedule the next pause.
    fn merge_locked(&mut self) {
        let Some((piece, spin)) = self.locking.take() else {
            return;
        };
        for (x, y) in piece.cells() {
            self.board.set(x, y, CellValue::Piece(piece.kind));
        }

        let rows = self.board.full_rows();
        let lines = rows.len() as u32;
        let perfect_clear = lines > 0 && self.board.is_empty_except(&rows);
        let result = self.chain.record(lines, spin, perfect_clear);

        let sent = match self.role {
            FieldRole::Authority => self.ledger.resolve(result.total()),
            FieldRole::Mirror => 0,
        };
        if sent > 0 {
            self.attack_sent += sent;
            self.emit(FieldEvent::AttackSent(sent));
        }

        let summary = LockSummary {
            kind: piece.kind,
            lines_cleared: lines,
            spin,
            combo: self.chain.combo(),
            back_to_back: result.back_to_back_applied,
            perfect_clear,
            attack: result.attack,
            sent,
        };
        self.last_summary = Some(summary);
        self.emit(FieldEvent::Merged(summary));

        self.pieces_locked += 1;
        self.lines_cleared += lines;
        self.last_lock_cleared = lines > 0;
        self.pending_rows = rows;
        self.phase = FieldPhase::Idle;
        self.pause = if lines > 0 {
            self.pacing.line_clear
        } else {
            self.pacing.are
        };
    }

    fn compact_rows(&mut self) {
        let rows = std::mem::take(&mut self.pending_rows);
        self.board.remove_rows(&rows);
    }

    fn materialize_garbage(&mut self) {
        let rows = self.ledger.take_rows(MAX_GARBAGE_PER_SPAWN);
        if rows == 0 {
            return;
        }
        let holes = self.holes.roll(&mut self.rng, rows);
        let fits = self.board.insert_garbage_rows(&holes);
        self.emit(FieldEvent::GarbageRows(holes));
        if !fits {
            self.top_out();
        }
    }

    fn top_out(&mut self) {
        self.active = None;
        self.phase = FieldPhase::ToppedOut;
        self.emit(FieldEvent::ToppedOut);
    }

    /// Finish any in-flight lock or clear immediately.
    pub fn settle(&mut self) {
        if self.phase == FieldPhase::Locking {
            self.merge_locked();
        }
        if !self.pending_rows.is_empty() {
            self.compact_rows();
        }
        if self.phase == FieldPhase::Idle {
            self.pause = 0;
        }
    }

    // --- mirror replay -------------------------------------------------

    pub fn push_bag(&mut self, bag: &Bag) {
        self.queue.push_bag(bag);
    }

    /// Remote piece entry with its entry rotate/hold flags.
    pub fn replay_entry(&mut self, flags: ActionSet) -> Result<(), ReplayError> {
        self.ensure_live()?;
        self.settle();
        let kind = self.queue.draw().ok_or(ReplayError::QueueEmpty)?;
        self.enter_piece(kind);
        if self.phase == FieldPhase::Active {
            self.apply_entry_flags(flags);
        }
        Ok(())
    }

    pub fn replay_actions(&mut self, actions: ActionSet) -> Result<(), ReplayError> {
        self.ensure_live()?;
        if self.active.is_none() {
            return Err(ReplayError::NoActivePiece);
        }
        self.apply_actions(actions);
        Ok(())
    }

    pub fn replay_gravity(&mut self, cells: u32) -> Result<(), ReplayError> {
        self.ensure_live()?;
        if self.active.is_none() {
            return Err(ReplayError::NoActivePiece);
        }
        self.fall(cells);
        Ok(())
    }

    /// Place the piece at the reported pose and lock it there.
    pub fn replay_lock(&mut self, pose: LockPose) -> Result<(), ReplayError> {
        self.ensure_live()?;
        if !pose.fits_board(self.system) {
            return Err(ReplayError::PoseOffBoard {
                x: pose.x,
                y: pose.y,
            });
        }
        if self.phase == FieldPhase::Locking {
            self.merge_locked();
        }
        self.active = Some(pose.piece(self.system));
        self.last_action = if pose.rotated_last {
            LastAction::Rotation {
                large_kick: pose.large_kick,
            }
        } else {
            LastAction::Other
        };
        self.lock_active();
        Ok(())
    }

    pub fn replay_garbage(&mut self, holes: &[u8]) -> Result<(), ReplayError> {
        self.ensure_live()?;
        if let Some(&bad) = holes.iter().find(|&&h| h >= BOARD_WIDTH) {
            return Err(ReplayError::BadHoleColumn(bad));
        }
        self.settle();
        if !self.board.insert_garbage_rows(holes) {
            self.top_out();
        }
        Ok(())
    }

    /// Mark a mirror as topped out after the remote reported it.
    pub fn mark_topped_out(&mut self) {
        self.active = None;
        self.phase = FieldPhase::ToppedOut;
    }

    fn ensure_live(&self) -> Result<(), ReplayError> {
        if self.phase == FieldPhase::ToppedOut {
            Err(ReplayError::ToppedOut)
        } else {
            Ok(())
        }
    }
}

/// Classify a lock as a spin.
///
/// Only pivot pieces whose last successful action was a rotation qualify.
/// Three occupied diagonals around the center make a spin (walls and floor
/// count as occupied). It is mini unless both front corners are occupied or
/// the rotation used a large kick.
pub fn detect_spin(board: &Board, piece: &Piece, rotated_last: bool, large_kick: bool) -> SpinKind {
    if !rotated_last || piece.kind.class() != PieceClass::Pivot {
        return SpinKind::None;
    }
    let Some(((cx, cy), (fx, fy))) = pivot_and_facing(&piece.shape()) else {
        return SpinKind::None;
    };
    let px = piece.x + cx;
    let py = piece.y + cy;
    let occupied = |dx: i8, dy: i8| board.is_blocked(px + dx, py + dy);

    let corners = [(-1, -1), (1, -1), (-1, 1), (1, 1)]
        .iter()
        .filter(|&&(dx, dy)| occupied(dx, dy))
        .count();
    if corners < 3 {
        return SpinKind::None;
    }

    let front_a = occupied(fx + fy.abs(), fy + fx.abs());
    let front_b = occupied(fx - fy.abs(), fy - fx.abs());
    if !(front_a && front_b) && !large_kick {
        SpinKind::Mini
    } else {
        SpinKind::Full
    }
}
