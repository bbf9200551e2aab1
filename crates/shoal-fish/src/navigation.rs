//! Authoritative position, heading and speed of one fish.
//!
//! The behavior states mutate this model; the view only reads it and
//! smooths toward it. Every random draw goes through the model's own
//! generator so a seeded school replays identically.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use shoal_core::geometry::{perpendicular, unit_vec2, GeometryError, Vec2};
use shoal_core::signal::Signal;

/// Radius of the circle assumed to contain the whole fish.
pub const FISH_BOUNDS_RADIUS: f64 = 120.0;
/// Candidates drawn by [`NavigationModel::closest_of_screen_samples`].
const SCREEN_SAMPLES: usize = 6;

/// Which way the body bends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnDirection {
    Left = -1,
    #[default]
    Straight = 0,
    Right = 1,
}

impl TurnDirection {
    /// Direction for a signed arc angle.
    pub fn from_angle(angle: f64) -> Self {
        if angle < 0.0 {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        }
    }
}

/// An arc maneuver: swing `angle_degrees` around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcTarget {
    pub center: Vec2,
    /// Signed; negative turns left.
    pub angle_degrees: f64,
    pub radius: f64,
}

impl ArcTarget {
    /// Length of the path swept along the arc.
    pub fn arc_length(&self) -> f64 {
        (self.radius * self.angle_degrees.to_radians()).abs()
    }
}

pub struct NavigationModel {
    position: Vec2,
    rotation: f64,
    direction: Vec2,
    speed: f64,
    rush: bool,
    turn_direction: TurnDirection,
    viewport: Vec2,
    rng: SmallRng,
    /// Fires with the new value whenever the turn direction changes.
    pub turn_direction_changed: Signal<TurnDirection>,
}

impl std::fmt::Debug for NavigationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationModel")
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("speed", &self.speed)
            .field("rush", &self.rush)
            .field("turn_direction", &self.turn_direction)
            .finish()
    }
}

impl NavigationModel {
    /// A fish facing a random heading, waiting just off the top-left corner.
    pub fn new(viewport: Vec2, mut rng: SmallRng) -> Self {
        let rotation = rng.gen_range(0.0..360.0_f64).to_radians();
        let position = Vec2::new(
            -FISH_BOUNDS_RADIUS - rng.gen::<f64>() * FISH_BOUNDS_RADIUS,
            -FISH_BOUNDS_RADIUS - rng.gen::<f64>() * FISH_BOUNDS_RADIUS,
        );
        let mut model = Self {
            position,
            rotation,
            direction: Vec2::from_angle(rotation),
            speed: 0.0,
            rush: false,
            turn_direction: TurnDirection::Straight,
            viewport,
            rng,
            turn_direction_changed: Signal::new(),
        };
        model.randomize_speed();
        model
    }

    pub fn from_seed(viewport: Vec2, seed: u64) -> Self {
        Self::new(viewport, SmallRng::seed_from_u64(seed))
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Heading in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Unit vector of the current heading.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Set the heading and recompute the move direction. A non-finite
    /// angle is rejected and leaves the model untouched.
    pub fn set_rotation(&mut self, angle: f64) -> Result<(), GeometryError> {
        let direction = unit_vec2(Vec2::new(angle.cos(), angle.sin()))?;
        self.rotation = angle;
        self.direction = direction;
        Ok(())
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.turn_direction
    }

    /// Notifies listeners only on an actual change.
    pub fn set_turn_direction(&mut self, value: TurnDirection) {
        if self.turn_direction != value {
            self.turn_direction = value;
            self.turn_direction_changed.dispatch(&value);
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Speed in px/s from [300, 600), times [3.2, 4.8) while rushing.
    pub fn randomize_speed(&mut self) {
        let rush_multiplier = if self.rush {
            3.2 + self.rng.gen::<f64>() * 1.6
        } else {
            1.0
        };
        self.speed = (300.0 + self.rng.gen::<f64>() * 300.0) * rush_multiplier;
    }

    pub fn is_rush(&self) -> bool {
        self.rush
    }

    pub fn set_rush(&mut self, rush: bool) {
        self.rush = rush;
    }

    /// Rush one time in five.
    pub fn randomize_rush(&mut self) {
        self.rush = self.rng.gen::<f64>() < 0.2;
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn random_rotation_target(&mut self) -> ArcTarget {
        let radius = self.rng.gen::<f64>() * 90.0 + 30.0;
        let mut angle = self.rng.gen::<f64>() * 190.0;
        // favour narrower turns
        if self.rng.gen::<f64>() > 0.3 {
            angle *= 0.6;
        }
        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let offset = perpendicular(self.direction) * side;
        ArcTarget {
            center: self.position + offset * radius,
            angle_degrees: angle * side,
            radius,
        }
    }

    /// A point straight ahead, 150 to 300 px away, stretched by [1.6, 3.2)
    /// while rushing.
    pub fn random_forward_target(&mut self) -> Vec2 {
        let rush_multiplier = if self.rush {
            1.6 + self.rng.gen::<f64>() * 1.6
        } else {
            1.0
        };
        let distance = (self.rng.gen::<f64>() * 150.0 + 150.0) * rush_multiplier;
        self.position + self.direction * distance
    }

    pub fn random_screen_point(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen::<f64>() * self.viewport.x,
            self.rng.gen::<f64>() * self.viewport.y,
        )
    }

    /// Nearest of a handful of random on-screen points. Cheap, not exact.
    pub fn closest_of_screen_samples(&mut self) -> Vec2 {
        let mut best = self.random_screen_point();
        let mut best_distance = self.position.distance(best);
        for _ in 1..SCREEN_SAMPLES {
            let candidate = self.random_screen_point();
            let distance = self.position.distance(candidate);
            if distance < best_distance {
                best = candidate;
                best_distance = distance;
            }
        }
        best
    }

    /// Time to cover `distance` at the current speed.
    pub fn move_duration(&self, distance: f64) -> Duration {
        Duration::try_from_secs_f64(distance / self.speed).unwrap_or(Duration::ZERO)
    }

    /// True once the bounding circle is entirely off any edge.
    pub fn is_out_of_bounds(&self) -> bool {
        let Vec2 { x, y } = self.position;
        let r = FISH_BOUNDS_RADIUS;
        x + r < 0.0 || x - r > self.viewport.x || y + r < 0.0 || y - r > self.viewport.y
    }

    pub fn random_idle_delay(&mut self) -> Duration {
        Duration::from_secs_f64((self.rng.gen::<f64>() * 2000.0 + 100.0) / 1000.0)
    }
}
