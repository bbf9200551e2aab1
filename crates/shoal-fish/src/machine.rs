//! Per-fish behavior machine.
//!
//! A [`FishStateMachine`] holds the fixed set of [`BehaviorState`]s a fish
//! can be in and runs at most one of them. Entering a state cleans up the
//! old one, announces the new one on [`FishStateMachine::state_changed`]
//! and the event bus, then follows any transition `execute` asks for.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{bail, Result};
use shoal_core::bus::EventBus;
use shoal_core::event::Event;
use shoal_core::signal::Signal;
use shoal_core::tween::TweenEngine;

use crate::navigation::NavigationModel;
use crate::state::FishState;

/// Tween engine shared by the whole school. Callbacks index the slice of
/// navigation models by fish id.
pub type SchoolTweens = TweenEngine<[NavigationModel]>;

/// What a state may touch while it runs.
pub struct StateContext<'a> {
    pub fish_id: usize,
    pub now: Instant,
    pub nav: &'a mut NavigationModel,
    pub tweens: &'a mut SchoolTweens,
    pub bus: &'a EventBus,
}

/// One behavior of a fish.
///
/// `execute` runs on entry and `update` once per frame afterwards. Either
/// may return the next state. `clean_up` runs on every exit and must drop
/// the state's poke subscription.
pub trait BehaviorState {
    fn id(&self) -> FishState;

    fn execute(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>>;

    fn update(&mut self, _ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        Ok(None)
    }

    fn clean_up(&mut self, tweens: &mut SchoolTweens);
}

pub struct FishStateMachine {
    fish_id: usize,
    states: Vec<Box<dyn BehaviorState>>,
    index: HashMap<FishState, usize>,
    current: Option<usize>,
    /// Fires with every state entered.
    pub state_changed: Signal<FishState>,
}

impl FishStateMachine {
    pub fn new(fish_id: usize) -> Self {
        Self {
            fish_id,
            states: Vec::new(),
            index: HashMap::new(),
            current: None,
            state_changed: Signal::new(),
        }
    }

    pub fn fish_id(&self) -> usize {
        self.fish_id
    }

    pub fn add_state(&mut self, state: Box<dyn BehaviorState>) -> Result<()> {
        let id = state.id();
        if self.index.contains_key(&id) {
            bail!("state already defined: {}", id);
        }
        self.index.insert(id, self.states.len());
        self.states.push(state);
        Ok(())
    }

    /// Leave the current state and enter `id`, following any transitions
    /// the new state requests straight from `execute`.
    pub fn set_state(&mut self, id: FishState, ctx: &mut StateContext<'_>) -> Result<()> {
        let mut next = id;
        loop {
            let Some(&idx) = self.index.get(&next) else {
                bail!("unknown state id: {}", next);
            };
            if let Some(old) = self.current.take() {
                self.states[old].clean_up(ctx.tweens);
            }
            self.current = Some(idx);
            tracing::debug!(fish_id = self.fish_id, state = %next, "state entered");
            self.state_changed.dispatch(&next);
            ctx.bus.publish(Event::FishStateChanged {
                fish_id: self.fish_id,
                state: next.name(),
            });
            match self.states[idx].execute(ctx)? {
                Some(follow) => next = follow,
                None => return Ok(()),
            }
        }
    }

    /// Poll the current state once.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        let Some(idx) = self.current else {
            return Ok(());
        };
        if let Some(next) = self.states[idx].update(ctx)? {
            self.set_state(next, ctx)?;
        }
        Ok(())
    }

    pub fn current_state(&self) -> Option<FishState> {
        self.current.map(|i| self.states[i].id())
    }

    pub fn in_a_state(&self, states: &[FishState]) -> bool {
        self.current_state().is_some_and(|s| s.in_any(states))
    }

    /// Clean up the active state and leave the machine stateless.
    pub fn shutdown(&mut self, tweens: &mut SchoolTweens) {
        if let Some(idx) = self.current.take() {
            self.states[idx].clean_up(tweens);
            tracing::trace!(fish_id = self.fish_id, "state machine shut down");
        }
    }
}
