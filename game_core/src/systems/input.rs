use hecs::World;

use crate::components::*;
use crate::resources::*;

/// Apply queued inputs to the paddle intents of the matching player slots
pub fn ingest_inputs(world: &mut World, queue: &mut InputQueue) {
    for (player, dir) in queue.pop_inputs() {
        for (_entity, (paddle, intent)) in world.query_mut::<(&Paddle, &mut PaddleIntent)>() {
            if paddle.player == player {
                intent.dir = dir;
            }
        }
    }
}

/// Stop every paddle
pub fn clear_intents(world: &mut World) {
    for (_entity, intent) in world.query_mut::<&mut PaddleIntent>() {
        intent.dir = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_paddle;

    #[test]
    fn test_inputs_reach_matching_slot_only() {
        let mut world = World::new();
        let left = create_paddle(&mut world, Side::Left, 1, 540.0);
        let right = create_paddle(&mut world, Side::Right, 2, 540.0);
        let mut queue = InputQueue::new();
        queue.push_input(2, 1);

        ingest_inputs(&mut world, &mut queue);

        assert_eq!(world.get::<&PaddleIntent>(left).unwrap().dir, 0);
        assert_eq!(world.get::<&PaddleIntent>(right).unwrap().dir, 1);
        assert!(queue.inputs.is_empty());
    }

    #[test]
    fn test_latest_input_wins() {
        let mut world = World::new();
        let left = create_paddle(&mut world, Side::Left, 1, 540.0);
        let mut queue = InputQueue::new();
        queue.push_input(1, 1);
        queue.push_input(1, -1);

        ingest_inputs(&mut world, &mut queue);
        assert_eq!(world.get::<&PaddleIntent>(left).unwrap().dir, -1);

        clear_intents(&mut world);
        assert_eq!(world.get::<&PaddleIntent>(left).unwrap().dir, 0);
    }
}
