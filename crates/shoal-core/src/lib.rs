//! Core infrastructure for the shoal aquarium.
//!
//! Engine pieces shared by the fish simulation and the terminal shell:
//! 2D math, easing curves, pooled tweens, signals and the event bus,
//! cancellable waits, frame timing, the drop-down console with its
//! command system, and the logging subsystem.

pub mod bus;
pub mod command;
pub mod console;
pub mod easing;
pub mod event;
pub mod fps;
pub mod geometry;
pub mod logging;
pub mod signal;
pub mod tween;
pub mod wait;
