// Match state → learner input features

use crate::game::MatchState;

/// Length of the feature vector fed to the Q-network
pub const STATE_SIZE: usize = 3;

pub type StateVector = [f32; STATE_SIZE];

/// `[agent paddle y, ball y, |paddle y - ball y|]`, scaled by the field height
/// so every feature sits roughly in `[0, 1]`.
pub fn encode(state: &MatchState) -> StateVector {
    let height = state.field().height;
    let paddle_y = state.agent_paddle.y / height;
    let ball_y = state.ball.y / height;
    [paddle_y, ball_y, (paddle_y - ball_y).abs()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::game::Action;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_encode_reset_state() {
        let state = MatchState::new(&PhysicsConfig::default(), ChaCha8Rng::seed_from_u64(0));
        let features = encode(&state);

        assert_eq!(features[0], 240.0 / 600.0);
        assert_eq!(features[1], 285.0 / 600.0);
        assert!((features[2] - 45.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_encode_is_pure() {
        let mut state = MatchState::new(&PhysicsConfig::default(), ChaCha8Rng::seed_from_u64(0));
        state.step(Action::MoveDown);
        assert_eq!(encode(&state), encode(&state));
    }
}
