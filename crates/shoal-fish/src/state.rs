use std::fmt;

/// Behavior a fish is in. Exactly one at a time per fish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FishState {
    Idle,
    Rotating,
    MovingForward,
}

impl FishState {
    pub const ALL: [FishState; 3] = [FishState::Idle, FishState::Rotating, FishState::MovingForward];

    pub fn name(self) -> &'static str {
        match self {
            FishState::Idle => "idle",
            FishState::Rotating => "rotating",
            FishState::MovingForward => "moving-forward",
        }
    }

    pub fn in_any(self, states: &[FishState]) -> bool {
        states.contains(&self)
    }
}

impl fmt::Display for FishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        assert!(FishState::Idle.in_any(&[FishState::Rotating, FishState::Idle]));
        assert!(!FishState::MovingForward.in_any(&[FishState::Idle]));
        assert!(!FishState::Rotating.in_any(&[]));
    }

    #[test]
    fn names_are_distinct() {
        let mut names: Vec<_> = FishState::ALL.iter().map(|s| s.name()).collect();
        names.dedup();
        assert_eq!(names.len(), 3);
        assert_eq!(format!("{:<8}|", FishState::Idle), "idle    |");
    }
}
