//! Easing curves mapping linear progress `t` in `[0, 1]` to eased progress.

use std::f64::consts::PI;

const BACK_OVERSHOOT: f64 = 1.70158;

/// Curve applied to tween progress before it reaches the update callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    SineIn,
    SineOut,
    SineInOut,
    CircIn,
    CircOut,
    CircInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

impl Easing {
    pub const ALL: [Easing; 28] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::QuarticIn,
        Easing::QuarticOut,
        Easing::QuarticInOut,
        Easing::QuinticIn,
        Easing::QuinticOut,
        Easing::QuinticInOut,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::ElasticInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
        Easing::BounceIn,
        Easing::BounceOut,
        Easing::BounceInOut,
    ];

    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => quad_ease_out(t),
            Easing::QuadInOut => {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t * t
                } else {
                    let t = t - 1.0;
                    -0.5 * (t * (t - 2.0) - 1.0)
                }
            }
            Easing::CubicIn => t.powi(3),
            Easing::CubicOut => (t - 1.0).powi(3) + 1.0,
            Easing::CubicInOut => in_out(t, |t| 0.5 * t.powi(3), |t| 0.5 * (t.powi(3) + 2.0)),
            Easing::QuarticIn => t.powi(4),
            Easing::QuarticOut => 1.0 - (t - 1.0).powi(4),
            Easing::QuarticInOut => in_out(t, |t| 0.5 * t.powi(4), |t| -0.5 * (t.powi(4) - 2.0)),
            Easing::QuinticIn => t.powi(5),
            Easing::QuinticOut => (t - 1.0).powi(5) + 1.0,
            Easing::QuinticInOut => in_out(t, |t| 0.5 * t.powi(5), |t| 0.5 * (t.powi(5) + 2.0)),
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => 0.5 * (1.0 - (PI * t).cos()),
            Easing::CircIn => 1.0 - (1.0 - t * t).sqrt(),
            Easing::CircOut => {
                let t = t - 1.0;
                (1.0 - t * t).sqrt()
            }
            Easing::CircInOut => in_out(
                t,
                |t| -0.5 * ((1.0 - t * t).sqrt() - 1.0),
                |t| 0.5 * ((1.0 - t * t).sqrt() + 1.0),
            ),
            Easing::ElasticIn => pinned(t, |t| {
                -(2f64.powf(10.0 * (t - 1.0))) * ((t - 1.1) * 5.0 * PI).sin()
            }),
            Easing::ElasticOut => pinned(t, |t| {
                2f64.powf(-10.0 * t) * ((t - 0.1) * 5.0 * PI).sin() + 1.0
            }),
            Easing::ElasticInOut => pinned(t, |t| {
                let t = t * 2.0;
                let wave = ((t - 1.1) * 5.0 * PI).sin();
                if t < 1.0 {
                    -0.5 * 2f64.powf(10.0 * (t - 1.0)) * wave
                } else {
                    0.5 * 2f64.powf(-10.0 * (t - 1.0)) * wave + 1.0
                }
            }),
            Easing::BackIn => {
                let s = BACK_OVERSHOOT;
                t * t * ((s + 1.0) * t - s)
            }
            Easing::BackOut => {
                let s = BACK_OVERSHOOT;
                let t = t - 1.0;
                t * t * ((s + 1.0) * t + s) + 1.0
            }
            Easing::BackInOut => {
                let s = BACK_OVERSHOOT * 1.525;
                in_out(
                    t,
                    |t| 0.5 * (t * t * ((s + 1.0) * t - s)),
                    |t| 0.5 * (t * t * ((s + 1.0) * t + s) + 2.0),
                )
            }
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - t * 2.0)) * 0.5
                } else {
                    bounce_out(t * 2.0 - 1.0) * 0.5 + 0.5
                }
            }
        }
    }
}

/// Quadratic ease-out, also used to taper the fish spine.
pub fn quad_ease_out(t: f64) -> f64 {
    t * (2.0 - t)
}

fn bounce_out(t: f64) -> f64 {
    const K: f64 = 7.5625;
    if t < 1.0 / 2.75 {
        K * t * t
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        K * t * t + 0.75
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        K * t * t + 0.9375
    } else {
        let t = t - 2.625 / 2.75;
        K * t * t + 0.984375
    }
}

/// Split at the midpoint: `first` sees `2t`, `second` sees `2t - 2`.
fn in_out(t: f64, first: impl Fn(f64) -> f64, second: impl Fn(f64) -> f64) -> f64 {
    let t = t * 2.0;
    if t < 1.0 {
        first(t)
    } else {
        second(t - 2.0)
    }
}

/// Elastic curves are undefined-looking at the ends, so pin them exactly.
fn pinned(t: f64, curve: impl Fn(f64) -> f64) -> f64 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        curve(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curve_starts_at_zero_and_ends_at_one() {
        for easing in Easing::ALL {
            let start = easing.apply(0.0);
            let end = easing.apply(1.0);
            assert!(start.abs() < 1e-9, "{easing:?} starts at {start}");
            assert!((end - 1.0).abs() < 1e-9, "{easing:?} ends at {end}");
        }
    }

    #[test]
    fn in_out_curves_are_half_way_at_midpoint() {
        for easing in [
            Easing::QuadInOut,
            Easing::CubicInOut,
            Easing::QuarticInOut,
            Easing::QuinticInOut,
            Easing::SineInOut,
            Easing::CircInOut,
            Easing::BounceInOut,
        ] {
            let mid = easing.apply(0.5);
            assert!((mid - 0.5).abs() < 1e-9, "{easing:?} mid = {mid}");
        }
    }

    #[test]
    fn quad_ease_out_tapers() {
        assert_eq!(quad_ease_out(0.5), 0.75);
        assert_eq!(Easing::QuadOut.apply(0.2), quad_ease_out(0.2));
    }

    #[test]
    fn back_in_overshoots_below_zero() {
        assert!(Easing::BackIn.apply(0.2) < 0.0);
        assert!(Easing::BackOut.apply(0.8) > 1.0);
    }

    #[test]
    fn default_is_linear() {
        assert_eq!(Easing::default(), Easing::Linear);
        assert_eq!(Easing::default().apply(0.37), 0.37);
    }
}
