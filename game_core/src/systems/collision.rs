use crate::{Ball, Config, Events, GameRng, MatchRule, Paddle, Side};
use glam::Vec2;
use hecs::World;
use rand::Rng;

/// Check ball collisions with walls and paddles
pub fn check_collisions(world: &mut World, config: &Config, events: &mut Events, rng: &mut GameRng) {
    // Collect paddle data first so the ball can be borrowed mutably
    let paddles: Vec<(Side, f32)> = world
        .query::<&Paddle>()
        .iter()
        .map(|(_e, paddle)| (paddle.side, paddle.y))
        .collect();

    for (_entity, ball) in world.query_mut::<&mut Ball>() {
        if bounce_off_walls(ball, config, rng) {
            events.ball_hit_wall = true;
        }

        for &(side, paddle_y) in &paddles {
            if bounce_off_paddle(ball, side, paddle_y, config) {
                events.ball_hit_paddle = Some(side);
                break;
            }
        }

        if config.match_rule == MatchRule::Wall {
            let open_sides = Side::BOTH
                .into_iter()
                .filter(|side| paddles.iter().all(|(s, _)| s != side));
            for side in open_sides {
                if bounce_off_back_wall(ball, side, config) {
                    events.ball_hit_back_wall = Some(side);
                }
            }
        }
    }
}

/// Reflect the ball off a side wall that has no paddle in front of it.
/// Returns true if a bounce happened.
pub fn bounce_off_back_wall(ball: &mut Ball, side: Side, config: &Config) -> bool {
    let radius = config.ball_radius;
    let reached = match side {
        Side::Left => ball.dir.x < 0.0 && ball.pos.x - radius <= 0.0,
        Side::Right => ball.dir.x > 0.0 && ball.pos.x + radius >= config.field_width,
    };
    if !reached {
        return false;
    }

    ball.pos.x = match side {
        Side::Left => radius,
        Side::Right => config.field_width - radius,
    };
    ball.dir.x = -ball.dir.x;
    true
}

/// Reflect the ball off the top or bottom wall, with a small angular jitter.
/// Returns true if a bounce happened.
pub fn bounce_off_walls(ball: &mut Ball, config: &Config, rng: &mut GameRng) -> bool {
    let radius = config.ball_radius;
    let heading_down = if ball.pos.y - radius <= 0.0 {
        ball.pos.y = radius;
        true
    } else if ball.pos.y + radius >= config.field_height {
        ball.pos.y = config.field_height - radius;
        false
    } else {
        return false;
    };

    let angle = jittered_angle(ball.angle(), config, rng);
    let sign_x = if ball.dir.x < 0.0 { -1.0 } else { 1.0 };
    let sign_y = if heading_down { 1.0 } else { -1.0 };
    ball.dir = Vec2::new(sign_x * angle.cos(), sign_y * angle.sin());
    true
}

/// Perturb a bounce angle by at most the configured epsilon, never past the
/// configured maximum steepness (or the incoming angle, if already steeper).
pub fn jittered_angle(angle: f32, config: &Config, rng: &mut GameRng) -> f32 {
    let epsilon = config.ball_bouncing_epsilon.abs();
    let jitter = if epsilon > 0.0 {
        rng.0.gen_range(-epsilon..=epsilon)
    } else {
        0.0
    };
    let ceiling = config.ball_angle_max.max(angle);
    (angle + jitter).clamp(0.0, ceiling)
}

/// Swept test of the ball against one paddle. The segment from the previous
/// to the current position is checked against the paddle face plane so a fast
/// ball cannot tunnel through in a single step. Returns true on a hit.
pub fn bounce_off_paddle(ball: &mut Ball, side: Side, paddle_y: f32, config: &Config) -> bool {
    let moving_toward = match side {
        Side::Left => ball.dir.x < 0.0,
        Side::Right => ball.dir.x > 0.0,
    };
    if !moving_toward {
        return false;
    }

    let radius = config.ball_radius;
    let face_x = config.paddle_face_x(side);
    let Some(t) = plane_crossing(ball.prev.x, ball.pos.x, face_x, radius, side) else {
        return false;
    };

    let y_at_impact = (ball.prev.y + (ball.pos.y - ball.prev.y) * t)
        .clamp(radius, config.field_height - radius);
    let half_height = config.paddle_height / 2.0;
    if (y_at_impact - paddle_y).abs() > half_height {
        return false;
    }

    ball.pos = Vec2::new(face_x + side.outward() * radius, y_at_impact);

    // Deflect proportionally to where the paddle was hit: -1 top, 1 bottom
    let impact_ratio = ((y_at_impact - paddle_y) / half_height).clamp(-1.0, 1.0);
    let deflected = Vec2::new(
        side.outward() * ball.dir.x.abs(),
        ball.dir.y + impact_ratio * config.ball_angle_max.sin(),
    );
    ball.dir = clamp_bounce_angle(deflected, config);
    true
}

/// Fraction of the step at which the ball's leading edge reaches the paddle
/// face, or None if the edge did not cross it this step. A degenerate
/// (zero-length) crossing counts as an impact at the end of the step.
pub fn plane_crossing(x0: f32, x1: f32, face_x: f32, radius: f32, side: Side) -> Option<f32> {
    let lead = -side.outward() * radius;
    let (edge0, edge1) = (x0 + lead, x1 + lead);
    let crossed = match side {
        Side::Left => edge0 > face_x && edge1 <= face_x,
        Side::Right => edge0 < face_x && edge1 >= face_x,
    };
    if !crossed {
        return None;
    }

    let travel = edge1 - edge0;
    if travel.abs() <= f32::EPSILON {
        return Some(1.0);
    }
    Some(((face_x - edge0) / travel).clamp(0.0, 1.0))
}

/// Normalize `dir` and clamp its angle from horizontal into the configured
/// band, preserving the sign of both components.
pub fn clamp_bounce_angle(dir: Vec2, config: &Config) -> Vec2 {
    let unit = dir.normalize_or_zero();
    let sign_x = if dir.x < 0.0 { -1.0 } else { 1.0 };
    if unit == Vec2::ZERO {
        return Vec2::new(sign_x, 0.0);
    }

    let angle = unit
        .y
        .abs()
        .clamp(0.0, 1.0)
        .asin()
        .clamp(config.ball_angle_min, config.ball_angle_max);
    let sign_y = if unit.y < 0.0 { -1.0 } else { 1.0 };
    Vec2::new(sign_x * angle.cos(), sign_y * angle.sin())
}
