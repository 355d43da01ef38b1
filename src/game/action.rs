use serde::{Deserialize, Serialize};

use super::state::PaddleCommand;

/// Number of discrete actions the agent can take
pub const ACTION_COUNT: usize = 3;

/// Discrete control for the agent paddle, encoded one-hot as `[UP, DOWN, STOP]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveUp,
    MoveDown,
    Stop,
}

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [Action::MoveUp, Action::MoveDown, Action::Stop];

    pub fn index(self) -> usize {
        match self {
            Action::MoveUp => 0,
            Action::MoveDown => 1,
            Action::Stop => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    pub fn one_hot(self) -> [f32; ACTION_COUNT] {
        let mut flags = [0.0; ACTION_COUNT];
        flags[self.index()] = 1.0;
        flags
    }

    /// Decode a one-hot vector. Anything other than exactly one set flag is rejected.
    pub fn from_one_hot(flags: &[f32; ACTION_COUNT]) -> Option<Action> {
        let mut set = flags.iter().enumerate().filter(|(_, &f)| f == 1.0);
        let (index, _) = set.next()?;
        if set.next().is_some() || flags.iter().any(|&f| f != 0.0 && f != 1.0) {
            return None;
        }
        Self::from_index(index)
    }
}

impl From<Action> for PaddleCommand {
    fn from(action: Action) -> Self {
        match action {
            Action::MoveUp => PaddleCommand::Up,
            Action::MoveDown => PaddleCommand::Down,
            Action::Stop => PaddleCommand::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_layout() {
        assert_eq!(Action::MoveUp.one_hot(), [1.0, 0.0, 0.0]);
        assert_eq!(Action::MoveDown.one_hot(), [0.0, 1.0, 0.0]);
        assert_eq!(Action::Stop.one_hot(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_from_one_hot_rejects_ambiguous_vectors() {
        assert_eq!(Action::from_one_hot(&[0.0, 1.0, 0.0]), Some(Action::MoveDown));
        assert_eq!(Action::from_one_hot(&[1.0, 1.0, 0.0]), None);
        assert_eq!(Action::from_one_hot(&[0.0, 0.0, 0.0]), None);
        assert_eq!(Action::from_one_hot(&[0.5, 0.0, 1.0]), None);
    }

    #[test]
    fn test_index_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()), Some(action));
        }
        assert_eq!(Action::from_index(3), None);
    }
}
