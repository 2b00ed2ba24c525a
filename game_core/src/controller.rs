//! Paddle controller capability.
//!
//! Anything that turns ball and paddle kinematics into a discrete move can
//! drive a paddle: a scripted tracker, a replay, or a learned policy.

use glam::Vec2;

/// Discrete paddle move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveDecision {
    Up,
    #[default]
    Stay,
    Down,
}

impl MoveDecision {
    /// Direction understood by the input queue (-1 = up, 1 = down)
    pub fn dir(self) -> i8 {
        match self {
            MoveDecision::Up => -1,
            MoveDecision::Stay => 0,
            MoveDecision::Down => 1,
        }
    }
}

/// What a controller gets to see each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsView {
    pub ball_pos: Vec2,
    pub ball_dir: Vec2,
    pub paddle_x: f32,
    pub paddle_y: f32,
    pub field_height: f32,
}

impl KinematicsView {
    /// True when the ball is heading toward this paddle's plane
    pub fn ball_approaching(&self) -> bool {
        self.ball_dir.x * (self.paddle_x - self.ball_pos.x) > 0.0
    }
}

pub trait PaddleController {
    fn decide(&mut self, view: &KinematicsView) -> MoveDecision;

    /// Forget anything remembered about the previous round
    fn reset(&mut self) {}
}

/// Scripted opponent that follows the ball's predicted arrival point
#[derive(Debug, Clone)]
pub struct Tracker {
    dead_zone: f32,
    prev_dir: Vec2,
    target_y: Option<f32>,
}

impl Tracker {
    pub const DEAD_ZONE: f32 = 25.0;
    const DIR_THRESHOLD: f32 = 0.001;

    pub fn new() -> Self {
        Self::with_dead_zone(Self::DEAD_ZONE)
    }

    pub fn with_dead_zone(dead_zone: f32) -> Self {
        Self {
            dead_zone: dead_zone.max(0.0),
            prev_dir: Vec2::ZERO,
            target_y: None,
        }
    }

    pub fn target_y(&self) -> Option<f32> {
        self.target_y
    }

    fn direction_changed(&self, dir: Vec2) -> bool {
        (dir - self.prev_dir).abs().max_element() > Self::DIR_THRESHOLD
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaddleController for Tracker {
    fn decide(&mut self, view: &KinematicsView) -> MoveDecision {
        let centre = view.field_height / 2.0;

        let goal = if view.ball_approaching() {
            if self.target_y.is_none() || self.direction_changed(view.ball_dir) {
                self.prev_dir = view.ball_dir;
                self.target_y = Some(predict_arrival_y(view));
            }
            self.target_y.unwrap_or(centre)
        } else {
            self.target_y = None;
            centre
        };

        if view.paddle_y < goal - self.dead_zone {
            MoveDecision::Down
        } else if view.paddle_y > goal + self.dead_zone {
            MoveDecision::Up
        } else {
            MoveDecision::Stay
        }
    }

    fn reset(&mut self) {
        self.prev_dir = Vec2::ZERO;
        self.target_y = None;
    }
}

/// Y where the ball will cross the paddle plane, folding wall reflections
pub fn predict_arrival_y(view: &KinematicsView) -> f32 {
    let height = view.field_height;
    if view.ball_dir.x.abs() < f32::EPSILON || height <= 0.0 {
        return view.ball_pos.y;
    }

    let travel = (view.paddle_x - view.ball_pos.x) / view.ball_dir.x;
    let unfolded = view.ball_pos.y + view.ball_dir.y * travel;

    let period = 2.0 * height;
    let folded = unfolded.rem_euclid(period);
    if folded > height {
        period - folded
    } else {
        folded
    }
}
