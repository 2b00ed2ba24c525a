pub mod codec;
pub mod components;
pub mod config;
pub mod controller;
pub mod kinematics;
pub mod params;
pub mod resources;
pub mod round;
pub mod systems;

pub use codec::*;
pub use components::*;
pub use config::*;
pub use controller::*;
pub use kinematics::*;
pub use params::*;
pub use resources::*;
pub use round::*;

use hecs::World;
use systems::*;

/// Run the deterministic Pong simulation for one tick.
///
/// Stepping stops early once a goal is signalled so the ball stays where it
/// left the field.
pub fn step(
    world: &mut World,
    time: &mut Time,
    config: &Config,
    events: &mut Events,
    inputs: &mut InputQueue,
    rng: &mut GameRng,
) {
    // Clamp dt to prevent large jumps
    let clamped_dt = time.dt.min(Params::MAX_DT);

    events.clear();

    // 1. Ingest inputs (apply to paddle intents)
    ingest_inputs(world, inputs);

    // Fixed micro-steps for stable physics
    let mut remaining_dt = clamped_dt;
    while remaining_dt > 0.0 {
        let step_dt = remaining_dt.min(Params::FIXED_DT);
        remaining_dt -= step_dt;

        let step_time = Time {
            dt: step_dt,
            now: time.now + (clamped_dt - remaining_dt),
        };

        // 2. Move paddles based on intents
        move_paddles(world, &step_time, config);

        // 3. Move ball and ramp its speed
        move_ball(world, &step_time, config);

        // 4. Check collisions (walls, then swept paddle test)
        check_collisions(world, config, events, rng);

        // 5. Check whether the ball left the field
        check_goal(world, config, events);
        if events.goal.is_some() {
            break;
        }
    }

    // Update time
    time.now += clamped_dt;
}

/// Helper to create a paddle entity
pub fn create_paddle(world: &mut World, side: Side, player: u8, y: f32) -> hecs::Entity {
    world.spawn((Paddle::new(side, player, y), PaddleIntent::new()))
}

/// Helper to create the ball entity
pub fn create_ball(world: &mut World, pos: glam::Vec2, dir: glam::Vec2, speed: f32) -> hecs::Entity {
    world.spawn((Ball::new(pos, dir, speed),))
}
