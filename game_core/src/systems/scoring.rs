use crate::{Ball, Config, Events, Side};
use hecs::World;

/// Signal a goal when the ball runs into either outer wall. A ball already
/// heading back into the field is not a goal. Scores are left to the caller.
pub fn check_goal(world: &mut World, config: &Config, events: &mut Events) {
    for (_entity, ball) in world.query_mut::<&Ball>() {
        if ball.dir.x < 0.0 && ball.pos.x - config.ball_radius <= 0.0 {
            events.goal = Some(Side::Left);
        } else if ball.dir.x > 0.0 && ball.pos.x + config.ball_radius >= config.field_width {
            events.goal = Some(Side::Right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_ball;
    use glam::Vec2;

    fn setup_world() -> (World, Config, Events) {
        (World::new(), Config::new(), Events::new())
    }

    #[test]
    fn test_goal_on_left_wall() {
        let (mut world, config, mut events) = setup_world();
        create_ball(&mut world, Vec2::new(10.0, 540.0), -Vec2::X, 600.0);

        check_goal(&mut world, &config, &mut events);

        assert_eq!(events.goal, Some(Side::Left), "Left side lost the ball");
    }

    #[test]
    fn test_goal_on_right_wall() {
        let (mut world, config, mut events) = setup_world();
        create_ball(&mut world, Vec2::new(config.field_width + 3.0, 540.0), Vec2::X, 600.0);

        check_goal(&mut world, &config, &mut events);

        assert_eq!(events.goal, Some(Side::Right), "Right side lost the ball");
    }

    #[test]
    fn test_no_goal_when_ball_in_bounds() {
        let (mut world, config, mut events) = setup_world();
        create_ball(&mut world, config.center(), Vec2::X, 600.0);

        check_goal(&mut world, &config, &mut events);

        assert_eq!(events.goal, None);
    }

    #[test]
    fn test_no_goal_when_leaving_the_wall() {
        let (mut world, config, mut events) = setup_world();
        create_ball(&mut world, Vec2::new(config.ball_radius, 540.0), Vec2::X, 600.0);

        check_goal(&mut world, &config, &mut events);

        assert_eq!(events.goal, None, "Ball bounced back off the wall");
    }

    #[test]
    fn test_goal_does_not_touch_ball() {
        let (mut world, config, mut events) = setup_world();
        let entity = create_ball(&mut world, Vec2::new(-20.0, 300.0), -Vec2::X, 600.0);

        check_goal(&mut world, &config, &mut events);

        let ball = world.get::<&Ball>(entity).unwrap();
        assert_eq!(ball.pos, Vec2::new(-20.0, 300.0));
    }
}
