use anyhow::Result;
use shoal_core::bus::Subscription;
use shoal_core::wait::{CancelToken, Delay, WaitOutcome};

use super::subscribe_poke;
use crate::machine::{BehaviorState, SchoolTweens, StateContext};
use crate::navigation::TurnDirection;
use crate::state::FishState;

/// Hang in place for a short random delay, then turn.
pub struct IdleState {
    fish_id: usize,
    delay: Option<Delay>,
    poke: Option<Subscription>,
}

impl IdleState {
    pub fn new(fish_id: usize) -> Self {
        Self {
            fish_id,
            delay: None,
            poke: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.delay.is_some()
    }
}

impl BehaviorState for IdleState {
    fn id(&self) -> FishState {
        FishState::Idle
    }

    fn execute(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        ctx.nav.set_turn_direction(TurnDirection::Straight);
        let token = CancelToken::new();
        self.poke = Some(subscribe_poke(ctx.bus, self.fish_id, token.clone()));
        let wait = ctx.nav.random_idle_delay();
        self.delay = Some(Delay::new(ctx.now, wait, token));
        tracing::trace!(fish_id = self.fish_id, wait_ms = wait.as_millis() as u64, "idling");
        Ok(None)
    }

    fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        let Some(delay) = &self.delay else {
            return Ok(None);
        };
        match delay.poll(ctx.now) {
            None => Ok(None),
            Some(WaitOutcome::Cancelled) => {
                tracing::debug!(fish_id = self.fish_id, "poked while idle");
                self.delay = None;
                ctx.nav.set_rush(true);
                ctx.nav.randomize_speed();
                Ok(Some(FishState::Rotating))
            }
            Some(WaitOutcome::Elapsed) => {
                self.delay = None;
                ctx.nav.randomize_rush();
                ctx.nav.randomize_speed();
                Ok(Some(FishState::Rotating))
            }
        }
    }

    fn clean_up(&mut self, _tweens: &mut SchoolTweens) {
        self.poke = None;
        self.delay = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shoal_core::event::{Event, EventKind};
    use super::*;
    use crate::states::testing::Harness;

    fn idle(h: &mut Harness, fish_id: usize) -> IdleState {
        let mut state = IdleState::new(fish_id);
        let next = state.execute(&mut h.ctx(fish_id)).unwrap();
        assert_eq!(next, None);
        state
    }

    #[test]
    fn entering_straightens_and_subscribes() {
        let mut h = Harness::new(1);
        h.navs[0].set_turn_direction(TurnDirection::Left);
        let state = idle(&mut h, 0);
        assert_eq!(h.navs[0].turn_direction(), TurnDirection::Straight);
        assert_eq!(h.bus.subscriber_count(EventKind::FishPoke), 1);
        assert!(state.is_waiting());
    }

    #[test]
    fn poke_turns_with_rush_and_the_timer_never_fires() {
        let mut h = Harness::new(1);
        let mut state = idle(&mut h, 0);
        h.bus.publish(Event::FishPoke { fish_id: 0 });
        h.pump();

        let next = state.update(&mut h.ctx(0)).unwrap();
        assert_eq!(next, Some(FishState::Rotating));
        assert!(h.navs[0].is_rush());
        assert!(h.navs[0].speed() >= 960.0);
        assert!(!state.is_waiting());

        // long past any idle delay
        h.now += Duration::from_secs(5);
        assert_eq!(state.update(&mut h.ctx(0)).unwrap(), None);
    }

    #[test]
    fn poke_for_another_fish_is_ignored() {
        let mut h = Harness::new(2);
        let mut state = idle(&mut h, 0);
        let speed = h.navs[0].speed();
        h.bus.publish(Event::FishPoke { fish_id: 1 });
        h.pump();

        assert_eq!(state.update(&mut h.ctx(0)).unwrap(), None);
        assert!(state.is_waiting());
        assert!(!h.navs[0].is_rush());
        assert_eq!(h.navs[0].speed(), speed);
    }

    #[test]
    fn timeout_turns_and_rerolls_speed() {
        let mut h = Harness::new(1);
        let mut state = idle(&mut h, 0);
        h.now += Duration::from_millis(2100);
        assert_eq!(state.update(&mut h.ctx(0)).unwrap(), Some(FishState::Rotating));
        assert!(!state.is_waiting());
    }

    #[test]
    fn clean_up_unsubscribes() {
        let mut h = Harness::new(1);
        let mut state = idle(&mut h, 0);
        state.clean_up(&mut h.tweens);
        assert_eq!(h.bus.subscriber_count(EventKind::FishPoke), 0);

        // a late poke has nobody to reach
        h.bus.publish(Event::FishPoke { fish_id: 0 });
        h.pump();
        assert_eq!(state.update(&mut h.ctx(0)).unwrap(), None);
        assert!(!h.navs[0].is_rush());
    }
}
