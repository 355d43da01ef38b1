use rand::Rng;

use super::state::{Ball, Field, Paddle, Side};

/// What the wall/scoring-edge resolution did this tick
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WallEvent {
    pub vertical_bounce: bool,
    /// Scoring edge the ball was recentred from
    pub scored_edge: Option<Side>,
}

/// Paddles the ball bounced off this tick
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PaddleContacts {
    pub left: bool,
    pub right: bool,
}

impl PaddleContacts {
    pub fn any(&self) -> bool {
        self.left || self.right
    }
}

/// Everything the physics resolved during one tick, for renderers and logs
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PhysicsEvents {
    pub paddle_contacts: PaddleContacts,
    pub wall: WallEvent,
    /// Side that won the point this tick
    pub goal: Option<Side>,
}

/// Move the ball by one tick of its velocity
pub fn advance(ball: &mut Ball) {
    ball.x += ball.vx;
    ball.y += ball.vy;
}

/// Bounce off the top/bottom walls and recentre after a scoring edge.
///
/// Runs on the position from before this tick's `advance`, so the ball may
/// overshoot a wall by up to one tick of travel before it turns around.
pub fn resolve_wall_bounce(ball: &mut Ball, field: &Field, rng: &mut impl Rng) -> WallEvent {
    let mut event = WallEvent::default();

    if ball.y <= ball.radius || ball.y >= field.height - ball.radius {
        ball.vy = -ball.vy;
        event.vertical_bounce = true;
    }

    let crossed = if ball.x <= ball.radius {
        Some(Side::Left)
    } else if ball.x >= field.width - ball.radius {
        Some(Side::Right)
    } else {
        None
    };

    if let Some(edge) = crossed {
        ball.x = field.width / 2.0 - ball.radius;
        ball.y = rng.gen_range(ball.radius..=field.height - ball.radius);
        ball.vx = -ball.vx;
        ball.vy = -ball.vy;
        event.scored_edge = Some(edge);
    }

    event
}

/// Bounce the ball off any paddle whose rectangle contains its centre.
///
/// Paddles are checked in slice order (left first); if more than one
/// matches, each clamp and inversion applies in turn.
pub fn resolve_paddle_collision(ball: &mut Ball, paddles: &[&Paddle]) -> PaddleContacts {
    let mut contacts = PaddleContacts::default();

    for paddle in paddles {
        let within_x = paddle.x <= ball.x && ball.x <= paddle.x + paddle.width;
        let within_y = paddle.y <= ball.y && ball.y <= paddle.y + paddle.height;
        if !(within_x && within_y) {
            continue;
        }

        // Clamp to the face that looks onto the table
        match paddle.side {
            Side::Left => {
                ball.x = paddle.x + paddle.width;
                contacts.left = true;
            }
            Side::Right => {
                ball.x = paddle.x;
                contacts.right = true;
            }
        }
        ball.vx = -ball.vx;
    }

    contacts
}

/// Move the paddle by its velocity, keeping it on the table
pub fn advance_paddle(paddle: &mut Paddle, field: &Field) {
    paddle.y += paddle.velocity;
    paddle.y = paddle.y.clamp(0.0, field.height - paddle.height);
}
