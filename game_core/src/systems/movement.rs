use crate::{Ball, Config, Paddle, PaddleIntent, Time};
use hecs::World;

/// Apply paddle movement based on intents
pub fn move_paddles(world: &mut World, time: &Time, config: &Config) {
    for (_entity, (paddle, intent)) in world.query_mut::<(&mut Paddle, &PaddleIntent)>() {
        if intent.dir != 0 {
            let delta = intent.dir as f32 * config.paddle_speed * time.dt;
            paddle.y = config.clamp_paddle_y(paddle.y + delta);
        }
    }
}

/// Move ball along its direction, then ramp its speed toward the maximum
pub fn move_ball(world: &mut World, time: &Time, config: &Config) {
    for (_entity, ball) in world.query_mut::<&mut Ball>() {
        ball.prev = ball.pos;
        ball.pos += ball.dir * ball.speed * time.dt;
        ball.speed = (ball.speed + config.ball_acceleration() * time.dt).min(config.ball_speed_max);
        ball.push_trail(config.ball_trail_length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_ball, create_paddle, Side};
    use glam::Vec2;

    #[test]
    fn test_paddle_moves_and_clamps() {
        let mut world = World::new();
        let config = Config::new();
        let paddle = create_paddle(&mut world, Side::Left, 1, 540.0);
        world.get::<&mut PaddleIntent>(paddle).unwrap().dir = 1;

        move_paddles(&mut world, &Time::new(0.1, 0.0), &config);
        assert!((world.get::<&Paddle>(paddle).unwrap().y - 590.0).abs() < 1e-3);

        move_paddles(&mut world, &Time::new(10.0, 0.0), &config);
        assert_eq!(
            world.get::<&Paddle>(paddle).unwrap().y,
            config.field_height - config.paddle_height / 2.0
        );
    }

    #[test]
    fn test_ball_moves_and_remembers_previous_position() {
        let mut world = World::new();
        let config = Config::new();
        let ball = create_ball(&mut world, Vec2::new(720.0, 540.0), Vec2::X, 600.0);

        move_ball(&mut world, &Time::new(0.5, 0.0), &config);

        let ball = world.get::<&Ball>(ball).unwrap();
        assert_eq!(ball.prev, Vec2::new(720.0, 540.0));
        assert!((ball.pos.x - 1020.0).abs() < 1e-3);
        assert_eq!(ball.trail.len(), 1);
    }

    #[test]
    fn test_speed_ramps_linearly_then_holds() {
        let mut world = World::new();
        let config = Config::new();
        let ball = create_ball(&mut world, config.center(), Vec2::X, config.ball_speed_min);

        let half = config.ball_acceleration_duration / 2.0;
        move_ball(&mut world, &Time::new(half, 0.0), &config);
        let midway = (config.ball_speed_min + config.ball_speed_max) / 2.0;
        assert!((world.get::<&Ball>(ball).unwrap().speed - midway).abs() < 0.5);

        move_ball(&mut world, &Time::new(half * 3.0, 0.0), &config);
        assert_eq!(world.get::<&Ball>(ball).unwrap().speed, config.ball_speed_max);
    }
}
