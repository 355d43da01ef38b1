// Tracker bot - follows the ball with the right paddle

use super::Bot;
use crate::game::{MatchState, PaddleCommand};

/// A simple opponent that mirrors the ball's height
///
/// - Follows the ball while it travels toward the right paddle
/// - Drifts back to the centre while the ball moves away
/// - Limited to the normal paddle speed, so steep shots still get past it
pub struct TrackerBot {
    name: String,
    movement_threshold: f32, // How far from target before moving
}

impl TrackerBot {
    pub fn new() -> Self {
        Self {
            name: "Tracker".to_string(),
            movement_threshold: 30.0,
        }
    }
}

impl Default for TrackerBot {
    fn default() -> Self {
        Self::new()
    }
}

impl Bot for TrackerBot {
    fn get_action(&mut self, state: &MatchState) -> Option<PaddleCommand> {
        let paddle_center_y = state.opponent_paddle.center_y();
        let field_center_y = state.field().height / 2.0;

        let target_y = if state.ball.vx > 0.0 {
            state.ball.y
        } else {
            field_center_y
        };

        let diff = target_y - paddle_center_y;

        if diff.abs() < self.movement_threshold {
            Some(PaddleCommand::Stop)
        } else if diff > 0.0 {
            Some(PaddleCommand::Down)
        } else {
            Some(PaddleCommand::Up)
        }
    }

    fn reset(&mut self) {
        // Stateless tracker, nothing to reset
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::game::Ball;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn state_with_ball(y: f32, vx: f32) -> MatchState {
        let mut state = MatchState::new(&PhysicsConfig::default(), ChaCha8Rng::seed_from_u64(0));
        state.ball = Ball::new(600.0, y, vx, 7.0, 15.0);
        state
    }

    #[test]
    fn test_follows_incoming_ball() {
        let mut bot = TrackerBot::new();
        assert_eq!(bot.get_action(&state_with_ball(500.0, 7.0)), Some(PaddleCommand::Down));
        assert_eq!(bot.get_action(&state_with_ball(100.0, 7.0)), Some(PaddleCommand::Up));
        assert_eq!(bot.get_action(&state_with_ball(310.0, 7.0)), Some(PaddleCommand::Stop));
    }

    #[test]
    fn test_returns_to_centre_when_ball_leaves() {
        let mut bot = TrackerBot::new();
        let mut state = state_with_ball(500.0, -7.0);
        state.opponent_paddle.y = 0.0;
        assert_eq!(bot.get_action(&state), Some(PaddleCommand::Down));
    }
}
