//! Input sampling - per-tick logical action sets
//!
//! Key capture and debouncing live outside this crate; samplers only report
//! which logical actions are asserted on a tick.

use std::collections::VecDeque;

use crate::types::ActionSet;

/// Source of the actions asserted on each tick
pub trait InputSampler {
    fn sample(&mut self, tick: u64) -> ActionSet;
}

impl<F> InputSampler for F
where
    F: FnMut(u64) -> ActionSet,
{
    fn sample(&mut self, tick: u64) -> ActionSet {
        self(tick)
    }
}

/// Replays a fixed list of action sets, then reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    steps: VecDeque<ActionSet>,
}

impl ScriptedInput {
    pub fn new(steps: impl IntoIterator<Item = ActionSet>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Append `idle` empty ticks.
    pub fn wait(mut self, idle: usize) -> Self {
        self.steps
            .extend(std::iter::repeat(ActionSet::empty()).take(idle));
        self
    }

    pub fn then(mut self, actions: ActionSet) -> Self {
        self.steps.push_back(actions);
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }
}

impl InputSampler for ScriptedInput {
    fn sample(&mut self, _tick: u64) -> ActionSet {
        self.steps.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyAction;

    #[test]
    fn test_scripted_input_drains_in_order() {
        let hard = ActionSet::from_actions(&[KeyAction::HardDrop]);
        let mut input = ScriptedInput::new([hard]).wait(1).then(hard);
        assert_eq!(input.remaining(), 3);
        assert_eq!(input.sample(0), hard);
        assert!(input.sample(1).is_empty());
        assert_eq!(input.sample(2), hard);
        assert!(input.is_done());
        assert!(input.sample(3).is_empty());
    }

    #[test]
    fn test_closure_sampler() {
        let mut every_other = |tick: u64| {
            if tick % 2 == 0 {
                ActionSet::from_actions(&[KeyAction::MoveLeft])
            } else {
                ActionSet::empty()
            }
        };
        assert!(every_other.sample(0).contains(KeyAction::MoveLeft));
        assert!(every_other.sample(1).is_empty());
    }
}
