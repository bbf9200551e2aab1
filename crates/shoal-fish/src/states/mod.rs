//! The three behaviors a fish cycles through.
//!
//! ```text
//! MovingForward --settled--> Idle --delay or poke--> Rotating
//!       ^  \__poked__________________________________/  |
//!       |                                                |
//!       +---------------------settled--------------------+
//! ```
//!
//! Each state owns its poke subscription for exactly as long as it is
//! active. A poke only trips a [`CancelToken`]; the state notices on its
//! next poll.

mod idle;
mod moving_forward;
mod rotating;

pub use idle::IdleState;
pub use moving_forward::MovingForwardState;
pub use rotating::RotatingState;

use anyhow::Result;
use shoal_core::bus::{EventBus, Subscription};
use shoal_core::event::{Event, EventKind};
use shoal_core::wait::CancelToken;

use crate::machine::FishStateMachine;

/// Trip `token` whenever fish `fish_id` is poked.
pub(crate) fn subscribe_poke(bus: &EventBus, fish_id: usize, token: CancelToken) -> Subscription {
    bus.subscribe(EventKind::FishPoke, move |event| {
        if let Event::FishPoke { fish_id: poked } = event {
            if *poked == fish_id {
                token.cancel();
            }
        }
    })
}

/// A machine for `fish_id` with all three behaviors registered.
pub fn school_machine(fish_id: usize) -> Result<FishStateMachine> {
    let mut machine = FishStateMachine::new(fish_id);
    machine.add_state(Box::new(IdleState::new(fish_id)))?;
    machine.add_state(Box::new(RotatingState::new(fish_id)))?;
    machine.add_state(Box::new(MovingForwardState::new(fish_id)))?;
    Ok(machine)
}


#[cfg(test)]
mod tests {
    use super::testing::Harness;
    use super::*;
    use crate::state::FishState;

    #[test]
    fn poke_filter_matches_only_its_fish() {
        let bus = EventBus::new();
        let token = CancelToken::new();
        let _sub = subscribe_poke(&bus, 2, token.clone());
        bus.publish(Event::FishPoke { fish_id: 1 });
        bus.dispatch();
        assert!(!token.is_cancelled());
        bus.publish(Event::FishPoke { fish_id: 2 });
        bus.dispatch();
        assert!(token.is_cancelled());
    }

    #[test]
    fn one_poke_subscription_per_active_machine() {
        let mut h = Harness::new(1);
        let mut machine = school_machine(0).unwrap();
        for state in [FishState::MovingForward, FishState::Idle, FishState::Rotating] {
            machine.set_state(state, &mut h.ctx(0)).unwrap();
            assert_eq!(h.bus.subscriber_count(EventKind::FishPoke), 1, "in {state}");
        }
        machine.shutdown(&mut h.tweens);
        assert_eq!(h.bus.subscriber_count(EventKind::FishPoke), 0);
        assert_eq!(h.tweens.active_count(), 0);
    }

    #[test]
    fn registering_all_states_once() {
        let machine = school_machine(4).unwrap();
        assert_eq!(machine.fish_id(), 4);
        assert_eq!(machine.current_state(), None);
    }
}
