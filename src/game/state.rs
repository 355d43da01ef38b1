use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::physics::{self, PhysicsEvents};
use crate::config::PhysicsConfig;

/// Reward for putting the ball past the opponent
pub const REWARD_SCORED: f32 = 10.0;
/// Reward for letting the ball past the agent paddle; ends the episode
pub const REWARD_CONCEDED: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Agent-controlled paddle
    Left,
    /// Opponent paddle (human or scripted)
    Right,
}

/// Velocity command for a paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddleCommand {
    Up,
    Down,
    Stop,
}

/// Playable area; the origin is the top-left corner and y grows downward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

impl Ball {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paddle {
    pub side: Side,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// One of `-speed`, `0`, `+speed`
    pub velocity: f32,
    pub speed: f32,
}

impl Paddle {
    pub fn new(side: Side, physics: &PhysicsConfig) -> Self {
        let x = match side {
            Side::Left => physics.paddle_margin - physics.paddle_width / 2.0,
            Side::Right => physics.field_width - physics.paddle_width - physics.paddle_margin,
        };
        Self {
            side,
            x,
            y: physics.field_height / 2.0 - physics.paddle_height / 2.0,
            width: physics.paddle_width,
            height: physics.paddle_height,
            velocity: 0.0,
            speed: physics.paddle_speed,
        }
    }

    pub fn apply(&mut self, command: PaddleCommand) {
        self.velocity = match command {
            PaddleCommand::Up => -self.speed,
            PaddleCommand::Down => self.speed,
            PaddleCommand::Stop => 0.0,
        };
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Result of one `step`: reward for the agent, whether the episode ended,
/// and the agent's score so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub terminal: bool,
    pub score: u32,
}

/// One Pong match between the agent (left) and an opponent (right).
///
/// RUNNING until the ball crosses the agent's edge, then TERMINATED until
/// `reset` is called.
pub struct MatchState {
    pub ball: Ball,
    pub agent_paddle: Paddle,
    pub opponent_paddle: Paddle,
    pub agent_score: u32,
    pub opponent_score: u32,
    pub tick: u64,
    /// What the physics resolved during the most recent tick
    pub last_events: PhysicsEvents,
    terminal: bool,
    field: Field,
    physics: PhysicsConfig,
    rng: Box<dyn RngCore>,
}

impl fmt::Debug for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchState")
            .field("ball", &self.ball)
            .field("agent_paddle", &self.agent_paddle)
            .field("opponent_paddle", &self.opponent_paddle)
            .field("agent_score", &self.agent_score)
            .field("opponent_score", &self.opponent_score)
            .field("tick", &self.tick)
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}

impl MatchState {
    /// `rng` decides where the ball re-enters after crossing a scoring edge
    pub fn new(physics: &PhysicsConfig, rng: impl RngCore + 'static) -> Self {
        let mut state = Self {
            ball: Ball::new(0.0, 0.0, 0.0, 0.0, physics.ball_radius),
            agent_paddle: Paddle::new(Side::Left, physics),
            opponent_paddle: Paddle::new(Side::Right, physics),
            agent_score: 0,
            opponent_score: 0,
            tick: 0,
            last_events: PhysicsEvents::default(),
            terminal: false,
            field: Field {
                width: physics.field_width,
                height: physics.field_height,
            },
            physics: physics.clone(),
            rng: Box::new(rng),
        };
        state.reset();
        state
    }

    /// Start a fresh episode: centred paddles, served ball, zeroed scores
    pub fn reset(&mut self) {
        let p = &self.physics;
        self.agent_paddle = Paddle::new(Side::Left, p);
        self.opponent_paddle = Paddle::new(Side::Right, p);

        // Serve toward the agent so every episode starts with something to learn
        self.ball = Ball::new(
            p.field_width / 2.0 - p.ball_radius,
            p.field_height / 2.0 - p.ball_radius,
            -p.ball_speed,
            p.ball_speed,
            p.ball_radius,
        );

        self.agent_score = 0;
        self.opponent_score = 0;
        self.tick = 0;
        self.last_events = PhysicsEvents::default();
        self.terminal = false;
    }

    /// Velocity command for the opponent paddle, applied before the next `step`
    pub fn command_opponent(&mut self, command: PaddleCommand) {
        self.opponent_paddle.apply(command);
    }

    /// Advance the match by one tick with the agent playing `action`
    pub fn step(&mut self, action: Action) -> StepOutcome {
        if self.terminal {
            return StepOutcome {
                reward: 0.0,
                terminal: true,
                score: self.agent_score,
            };
        }

        self.agent_paddle.apply(action.into());

        let mut events = PhysicsEvents {
            paddle_contacts: physics::resolve_paddle_collision(
                &mut self.ball,
                &[&self.agent_paddle, &self.opponent_paddle],
            ),
            ..PhysicsEvents::default()
        };

        physics::advance_paddle(&mut self.agent_paddle, &self.field);
        physics::advance_paddle(&mut self.opponent_paddle, &self.field);

        events.wall = physics::resolve_wall_bounce(&mut self.ball, &self.field, &mut self.rng);
        physics::advance(&mut self.ball);

        self.tick += 1;

        let mut reward = 0.0;
        if self.ball.x <= self.ball.radius {
            self.opponent_score += 1;
            self.terminal = true;
            reward = REWARD_CONCEDED;
            events.goal = Some(Side::Right);
        } else if self.ball.x >= self.field.width - self.ball.radius {
            self.agent_score += 1;
            reward = REWARD_SCORED;
            events.goal = Some(Side::Left);
        }
        self.last_events = events;

        StepOutcome {
            reward,
            terminal: self.terminal,
            score: self.agent_score,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn field(&self) -> Field {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn new_match(seed: u64) -> MatchState {
        MatchState::new(&PhysicsConfig::default(), ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_reset_layout() {
        let state = new_match(1);

        assert_eq!(state.agent_paddle.x, 40.0);
        assert_eq!(state.opponent_paddle.x, 930.0);
        assert_eq!(state.agent_paddle.y, 240.0);
        assert_eq!(state.opponent_paddle.y, 240.0);
        assert_eq!((state.ball.x, state.ball.y), (485.0, 285.0));
        assert_eq!(state.ball.vx.abs(), 7.0);
        assert_eq!(state.ball.vy.abs(), 7.0);
        assert_eq!(state.tick, 0);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_unintercepted_serve_ends_episode_deterministically() {
        // Serve from (485, 285) at (-7, +7): bottom bounce on tick 44, ball passes
        // the paddle column at y ≈ 450 (paddle spans 240..360) and crosses x <= 15
        // on tick 68.
        let mut state = new_match(3);
        let mut outcome = state.step(Action::Stop);
        while !outcome.terminal {
            assert_eq!(outcome.reward, 0.0);
            outcome = state.step(Action::Stop);
        }

        assert_eq!(state.tick, 68);
        assert_eq!(outcome.reward, REWARD_CONCEDED);
        assert_eq!(outcome.score, 0);
        assert_eq!(state.opponent_score, 1);
        assert_eq!(state.last_events.goal, Some(Side::Right));
    }

    #[test]
    fn test_step_after_termination_is_inert() {
        let mut state = new_match(3);
        while !state.step(Action::Stop).terminal {}
        let tick = state.tick;

        let outcome = state.step(Action::MoveUp);
        assert_eq!(outcome.reward, 0.0);
        assert!(outcome.terminal);
        assert_eq!(state.tick, tick);

        state.reset();
        assert!(!state.is_terminal());
        assert_eq!(state.opponent_score, 0);
    }

    #[test]
    fn test_action_sets_agent_velocity() {
        let mut state = new_match(4);
        state.step(Action::MoveUp);
        assert_eq!(state.agent_paddle.velocity, -5.0);
        assert_eq!(state.agent_paddle.y, 235.0);

        state.step(Action::MoveDown);
        assert_eq!(state.agent_paddle.velocity, 5.0);
        assert_eq!(state.agent_paddle.y, 240.0);

        state.step(Action::Stop);
        assert_eq!(state.agent_paddle.velocity, 0.0);
        assert_eq!(state.agent_paddle.y, 240.0);
    }

    #[test]
    fn test_agent_scores_without_ending_episode() {
        let mut state = new_match(5);
        // Ball about to leave through the opponent's edge
        state.ball = Ball::new(980.0, 300.0, 7.0, 7.0, 15.0);
        state.opponent_paddle.y = 0.0;

        let outcome = state.step(Action::Stop);
        assert_eq!(outcome.reward, REWARD_SCORED);
        assert!(!outcome.terminal);
        assert_eq!(outcome.score, 1);

        // Next tick recentres the ball and pays nothing further
        let outcome = state.step(Action::Stop);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(state.last_events.wall.scored_edge, Some(Side::Right));
        assert_eq!(state.ball.x, 485.0 - 7.0);
    }

    #[test]
    fn test_every_tick_reward_is_one_of_three() {
        let mut state = new_match(6);
        let mut conceded = 0;
        for i in 0..20_000u32 {
            if state.is_terminal() {
                state.reset();
            }
            state.command_opponent(match i % 3 {
                0 => PaddleCommand::Up,
                1 => PaddleCommand::Down,
                _ => PaddleCommand::Stop,
            });
            let action = Action::ALL[(i as usize * 7) % 3];
            let outcome = state.step(action);

            match outcome.reward {
                r if r == REWARD_CONCEDED => {
                    assert!(outcome.terminal);
                    conceded += 1;
                }
                r if r == REWARD_SCORED => assert!(!outcome.terminal),
                r => {
                    assert_eq!(r, 0.0);
                    assert!(!outcome.terminal);
                }
            }
        }
        assert!(conceded > 0);
    }

    #[test]
    fn test_ball_out_of_bounds_only_while_being_resolved() {
        let mut state = new_match(7);
        for _ in 0..20_000 {
            if state.is_terminal() {
                state.reset();
            }
            let field = state.field();
            let r = state.ball.radius;
            let outside_x = state.ball.x < r || state.ball.x > field.width - r;
            let outside_y = state.ball.y < r || state.ball.y > field.height - r;

            state.step(Action::Stop);

            if outside_y {
                assert!(
                    state.last_events.wall.vertical_bounce
                        || state.last_events.wall.scored_edge.is_some()
                );
            }
            if outside_x {
                assert!(state.last_events.wall.scored_edge.is_some());
            }
        }
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = new_match(11);
        let mut b = new_match(11);
        for i in 0..5_000usize {
            let action = Action::ALL[i % 3];
            if a.is_terminal() {
                a.reset();
                b.reset();
            }
            assert_eq!(a.step(action), b.step(action));
            assert_eq!(a.ball, b.ball);
        }
    }
}
