use anyhow::Result;
use shoal_core::bus::Subscription;
use shoal_core::easing::Easing;
use shoal_core::geometry::rotate_around;
use shoal_core::tween::{Completion, TweenId};
use shoal_core::wait::CancelToken;

use super::subscribe_poke;
use crate::machine::{BehaviorState, SchoolTweens, StateContext};
use crate::navigation::{NavigationModel, TurnDirection};
use crate::state::FishState;

/// Swim an arc around a point off to one side.
pub struct RotatingState {
    fish_id: usize,
    token: CancelToken,
    motion: Option<(TweenId, Completion)>,
    poke: Option<Subscription>,
}

impl RotatingState {
    pub fn new(fish_id: usize) -> Self {
        Self {
            fish_id,
            token: CancelToken::new(),
            motion: None,
            poke: None,
        }
    }
}

impl BehaviorState for RotatingState {
    fn id(&self) -> FishState {
        FishState::Rotating
    }

    fn execute(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        if ctx.nav.is_out_of_bounds() {
            return Ok(Some(FishState::MovingForward));
        }

        let arc = ctx.nav.random_rotation_target();
        ctx.nav.set_turn_direction(TurnDirection::from_angle(arc.angle_degrees));
        let duration = ctx.nav.move_duration(arc.arc_length());

        let fish_id = self.fish_id;
        let origin = ctx.nav.position();
        let heading = ctx.nav.rotation();
        let sweep = arc.angle_degrees.to_radians();
        let center = arc.center;
        let tween = ctx.tweens.get(
            duration,
            move |navs: &mut [NavigationModel], t| {
                let Some(nav) = navs.get_mut(fish_id) else {
                    return;
                };
                let turned = sweep * t;
                nav.set_position(rotate_around(origin, center, turned));
                if let Err(err) = nav.set_rotation(heading + turned) {
                    tracing::warn!(fish_id, %err, "arc produced an invalid heading");
                }
            },
            Easing::Linear,
        );

        self.token = CancelToken::new();
        self.poke = Some(subscribe_poke(ctx.bus, fish_id, self.token.clone()));
        let done = ctx.tweens.start(tween, ctx.now)?;
        self.motion = Some((tween, done));
        tracing::trace!(
            fish_id,
            degrees = arc.angle_degrees,
            radius = arc.radius,
            ms = duration.as_millis() as u64,
            "turning"
        );
        Ok(None)
    }

    fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<FishState>> {
        let Some((tween, done)) = &self.motion else {
            return Ok(None);
        };
        let tween = *tween;
        if self.token.take() && !ctx.nav.is_rush() {
            tracing::debug!(fish_id = self.fish_id, "poked mid-turn");
            ctx.nav.set_rush(true);
            ctx.nav.randomize_speed();
            ctx.tweens.stop(tween);
        }
        if done.is_settled() {
            ctx.tweens.return_tween(tween);
            self.motion = None;
            return Ok(Some(FishState::MovingForward));
        }
        Ok(None)
    }

    fn clean_up(&mut self, tweens: &mut SchoolTweens) {
        self.poke = None;
        if let Some((tween, _)) = self.motion.take() {
            tweens.return_tween(tween);
        }
    }
}
