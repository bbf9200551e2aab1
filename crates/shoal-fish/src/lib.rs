//! The fish themselves.
//!
//! Each fish is three cooperating parts sharing one id:
//! - a [`NavigationModel`](navigation::NavigationModel) holding where it
//!   really is and where it is going,
//! - a [`FishStateMachine`](machine::FishStateMachine) that picks the next
//!   maneuver and drives it with tweens,
//! - a [`FishView`](view::FishView) that smooths the motion and poses the
//!   skeletal [`Rig`](rig::Rig) for drawing.
//!
//! [`Shoal`](shoal::Shoal) owns all of them and advances the school one
//! frame at a time.

pub mod machine;
pub mod navigation;
pub mod palette;
pub mod rig;
pub mod shoal;
pub mod state;
pub mod states;
pub mod view;

pub use shoal::Shoal;
pub use state::FishState;
