//! Per-frame presentation of one fish.
//!
//! The view never writes to the navigation model. It trails the model's
//! position with exponential smoothing, faces the way it is travelling,
//! and poses the rig from a travelling tail wave blended with a turn bend.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::Rng;
use shoal_config::RigConfig;
use shoal_core::bus::EventBus;
use shoal_core::event::Event;
use shoal_core::geometry::{bearing, smooth_interpolate, smooth_interpolate_vec2, Vec2};
use shoal_core::signal::{Mailbox, SlotId};
use shoal_ui::container::{Container, PointerEvent};

use crate::machine::FishStateMachine;
use crate::navigation::{NavigationModel, TurnDirection};
use crate::rig::Rig;
use crate::state::FishState;

/// Displayed movement below this many pixels keeps the old heading.
const MIN_TURN_DISTANCE: f64 = 0.1;
/// Container rotation that aligns the rig's +y head axis with a heading.
const RIG_ROTATION_OFFSET: f64 = 270.0;

pub struct FishView {
    fish_id: usize,
    container: Container,
    rig: Rig,
    config: RigConfig,
    color: u32,
    rng: SmallRng,

    position: Vec2,
    rotation: f64,
    move_decay: f64,

    tail_phase: f64,
    tail_speed: f64,
    tail_speed_target: f64,
    swing: Vec<f64>,

    spine_blend: f64,
    spine_blend_target: f64,
    turn_pose: f64,

    turns: Mailbox<TurnDirection>,
    turn_slot: SlotId,
    states: Mailbox<FishState>,
    state_slot: SlotId,
}

impl FishView {
    pub fn new(
        nav: &mut NavigationModel,
        machine: &mut FishStateMachine,
        config: &RigConfig,
        color: u32,
        bus: &EventBus,
        mut rng: SmallRng,
    ) -> Result<Self> {
        let fish_id = machine.fish_id();
        let rig = Rig::new(config)?;
        let (turn_slot, turns) = nav.turn_direction_changed.mailbox();
        let (state_slot, states) = machine.state_changed.mailbox();

        let mut container = Container::new();
        let hover_bus = bus.clone();
        container.on(PointerEvent::Over, move || {
            hover_bus.publish(Event::FishPoke { fish_id });
        });

        let move_decay = random_move_decay(&mut rng);
        let mut view = Self {
            fish_id,
            container,
            swing: vec![0.0; rig.spine_bone_count()],
            rig,
            config: config.clone(),
            color,
            rng,
            position: nav.position(),
            rotation: nav.rotation(),
            move_decay,
            tail_phase: 0.0,
            tail_speed: 0.0,
            tail_speed_target: 0.0,
            spine_blend: 0.0,
            spine_blend_target: 0.0,
            turn_pose: -config.turn_pose_angle,
            turns,
            turn_slot,
            states,
            state_slot,
        };
        view.reroll_tail_speed(nav.is_rush());
        view.draw();
        Ok(view)
    }

    /// Advance one frame of `dt` seconds.
    pub fn update(&mut self, nav: &NavigationModel, dt: f64) {
        for state in self.states.drain() {
            match state {
                FishState::Rotating => self.move_decay = random_move_decay(&mut self.rng),
                FishState::MovingForward => self.reroll_tail_speed(nav.is_rush()),
                FishState::Idle => {}
            }
        }
        for turn in self.turns.drain() {
            self.on_turn(turn);
        }

        let target = nav.position();
        self.position = smooth_interpolate_vec2(self.position, target, self.move_decay, dt);
        if self.position.distance(target) > MIN_TURN_DISTANCE {
            self.rotation = bearing(self.position, target);
        }

        self.tail_speed = smooth_interpolate(
            self.tail_speed,
            self.tail_speed_target,
            self.config.tail_speed_decay,
            dt,
        );
        self.spine_blend = smooth_interpolate(
            self.spine_blend,
            self.spine_blend_target,
            self.config.spine_blend_decay,
            dt,
        );

        self.advance_tail_swing();
        self.rig.pose(&self.swing, self.turn_pose, self.spine_blend);
        self.draw();
    }

    /// Detach from the model and machine this view was built against.
    pub fn detach(&self, nav: &mut NavigationModel, machine: &mut FishStateMachine) {
        nav.turn_direction_changed.remove(self.turn_slot);
        machine.state_changed.remove(self.state_slot);
    }

    fn on_turn(&mut self, turn: TurnDirection) {
        match turn {
            TurnDirection::Straight => self.spine_blend_target = 0.0,
            TurnDirection::Right => {
                self.turn_pose = -self.config.turn_pose_angle;
                self.spine_blend_target = 1.0;
            }
            TurnDirection::Left => {
                self.turn_pose = self.config.turn_pose_angle;
                self.spine_blend_target = 1.0;
            }
        }
    }

    fn reroll_tail_speed(&mut self, rush: bool) {
        let multiplier = 1.0 + self.rng.gen::<f64>() * 0.3;
        let start = if rush { 20.0 } else { 10.0 };
        self.tail_speed = start * multiplier;
        self.tail_speed_target = 2.0 * multiplier;
    }

    fn advance_tail_swing(&mut self) {
        self.tail_phase = (self.tail_phase + self.tail_speed) % 360.0;
        for (i, angle) in self.swing.iter_mut().enumerate() {
            let phase = self.tail_phase - i as f64 * self.config.tail_swing_follow_offset;
            *angle = phase.to_radians().sin() * self.config.tail_swing_max_bend;
        }
    }

    fn draw(&mut self) {
        let points = self.rig.skin_points();
        let graphics = &mut self.container.graphics;
        graphics.clear();
        graphics.begin_fill(self.color, 1.0);
        if let Some((first, rest)) = points.split_first() {
            graphics.move_to(first.x, first.y);
            for p in rest {
                graphics.line_to(p.x, p.y);
            }
            graphics.close_path();
        }
        self.container.set_position(self.position);
        self.container.rotation = self.rotation.to_degrees() + RIG_ROTATION_OFFSET;
    }

    pub fn fish_id(&self) -> usize {
        self.fish_id
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    /// Smoothed on-screen position.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Smoothed heading in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn move_decay(&self) -> f64 {
        self.move_decay
    }

    pub fn tail_speed(&self) -> f64 {
        self.tail_speed
    }

    pub fn spine_blend(&self) -> f64 {
        self.spine_blend
    }
}

fn random_move_decay(rng: &mut SmallRng) -> f64 {
    1.5 + rng.gen::<f64>() * 1.5
}
