use anyhow::Result;
use shoal_core::bus::Subscription;
use shoal_core::easing::Easing;
use shoal_core::geometry::{bearing, lerp_vec2};
use shoal_core::tween::{Completion, TweenId};
use shoal_core::wait::CancelToken;

use super::subscribe_poke;
use crate::machine::{BehaviorState, SchoolTweens, StateContext};
use crate::navigation::{NavigationModel, TurnDirection};
use crate::state::FishState;

/// Swim in a straight line. A fish that has drifted off screen heads
/// back toward the nearest sampled on-screen point instead.
pub struct MovingForwardState {
    fish_id: usize,
    token: CancelToken,
    poked: bool,
    motion: Option<(TweenId, Completion)>,
    poke: Option<Subscription>,
}

impl MovingForwardState {
    pub fn new(fish_id: usize) -> Self {
        Self {
            fish_id,
            token: CancelToken::new(),
            poked: false,
            motion: None,
            poke: None,
        }
    }
}

impl BehaviorState for MovingForwardState {
    fn id(&self) -> FishState {
        FishState::MovingForward
    }

    fn execute(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        ctx.nav.set_turn_direction(TurnDirection::Straight);
        self.poked = false;

        let origin = ctx.nav.position();
        let target = if ctx.nav.is_out_of_bounds() {
            let target = ctx.nav.closest_of_screen_samples();
            ctx.nav.set_rotation(bearing(origin, target))?;
            tracing::trace!(fish_id = self.fish_id, x = target.x, y = target.y, "returning to screen");
            target
        } else {
            ctx.nav.random_forward_target()
        };
        let duration = ctx.nav.move_duration(origin.distance(target));

        let fish_id = self.fish_id;
        let tween = ctx.tweens.get(
            duration,
            move |navs: &mut [NavigationModel], t| {
                if let Some(nav) = navs.get_mut(fish_id) {
                    nav.set_position(lerp_vec2(origin, target, t));
                }
            },
            Easing::Linear,
        );

        self.token = CancelToken::new();
        self.poke = Some(subscribe_poke(ctx.bus, fish_id, self.token.clone()));
        let done = ctx.tweens.start(tween, ctx.now)?;
        self.motion = Some((tween, done));
        Ok(None)
    }

    fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        let Some((tween, done)) = &self.motion else {
            return Ok(None);
        };
        let tween = *tween;
        if self.token.take() && !ctx.nav.is_rush() {
            tracing::debug!(fish_id = self.fish_id, "poked mid-swim");
            ctx.nav.set_rush(true);
            ctx.nav.randomize_speed();
            self.poked = true;
            ctx.tweens.stop(tween);
        }
        if !done.is_settled() {
            return Ok(None);
        }
        ctx.tweens.return_tween(tween);
        self.motion = None;
        if self.poked {
            Ok(Some(FishState::Rotating))
        } else {
            Ok(Some(FishState::Idle))
        }
    }

    fn clean_up(&mut self, tweens: &mut SchoolTweens) {
        self.poke = None;
        if let Some((tween, _)) = self.motion.take() {
            tweens.return_tween(tween);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shoal_core::event::{Event, EventKind};
    use shoal_core::geometry::Vec2;

    use super::*;
    use crate::states::testing::{Harness, VIEWPORT};

    #[test]
    fn out_of_bounds_heads_back_on_screen() {
        for seed_fish in 0..8 {
            let mut h = Harness::new(seed_fish + 1);
            let id = seed_fish;
            assert!(h.navs[id].is_out_of_bounds());
            let origin = h.navs[id].position();

            let mut state = MovingForwardState::new(id);
            state.execute(&mut h.ctx(id)).unwrap();
            h.now += Duration::from_secs(10);
            h.pump();

            let target = h.navs[id].position();
            assert!(target.x > -1e-9 && target.x < VIEWPORT.x, "{target:?}");
            assert!(target.y > -1e-9 && target.y < VIEWPORT.y, "{target:?}");
            let facing = (target - origin).normalize();
            assert!(facing.distance(h.navs[id].direction()) < 1e-9);
        }
    }

    #[test]
    fn swims_straight_ahead_when_on_screen() {
        let mut h = Harness::new(1);
        h.navs[0].set_position(Vec2::new(100.0, 300.0));
        h.navs[0].set_rotation(0.0).unwrap();
        h.navs[0].set_turn_direction(TurnDirection::Right);

        let mut state = MovingForwardState::new(0);
        state.execute(&mut h.ctx(0)).unwrap();
        assert_eq!(h.navs[0].turn_direction(), TurnDirection::Straight);

        h.now += Duration::from_secs(10);
        h.pump();
        let end = h.navs[0].position();
        assert!((end.y - 300.0).abs() < 1e-9);
        assert!((250.0..=400.0).contains(&end.x), "{end:?}");
        assert_eq!(state.update(&mut h.ctx(0)).unwrap(), Some(FishState::Idle));
    }

    #[test]
    fn poke_rushes_then_turns() {
        let mut h = Harness::new(1);
        h.navs[0].set_position(Vec2::new(100.0, 300.0));
        let mut state = MovingForwardState::new(0);
        state.execute(&mut h.ctx(0)).unwrap();

        h.bus.publish(Event::FishPoke { fish_id: 0 });
        h.pump();
        assert_eq!(state.update(&mut h.ctx(0)).unwrap(), Some(FishState::Rotating));
        assert!(h.navs[0].is_rush());
        assert_eq!(h.tweens.active_count(), 0);
    }

    #[test]
    fn only_one_subscription_while_active() {
        let mut h = Harness::new(1);
        let mut state = MovingForwardState::new(0);
        state.execute(&mut h.ctx(0)).unwrap();
        assert_eq!(h.bus.subscriber_count(EventKind::FishPoke), 1);
        state.clean_up(&mut h.tweens);
        assert_eq!(h.bus.subscriber_count(EventKind::FishPoke), 0);
        assert_eq!(h.tweens.pooled(), 1);
    }
}
