use glam::Vec2;
use std::collections::VecDeque;

use crate::{Config, GameRng};

/// Field side a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Wire index (0 = left, 1 = right)
    pub fn index(self) -> u8 {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Side::Left),
            1 => Some(Side::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// X sign pointing from this side into the field
    pub fn outward(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Presentation tag for a paddle; has no effect on physics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddleStatus {
    #[default]
    Default,
    Player,
    Friend,
    Ennemy,
}

impl PaddleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaddleStatus::Default => "default",
            PaddleStatus::Player => "player",
            PaddleStatus::Friend => "friend",
            PaddleStatus::Ennemy => "ennemy",
        }
    }
}

/// Paddle component - a player's paddle; x is fixed by its side
#[derive(Debug, Clone, Copy)]
pub struct Paddle {
    pub side: Side,
    pub player: u8, // player slot, 1 or 2
    pub y: f32,     // centre Y (clamped to field)
    pub status: PaddleStatus,
}

impl Paddle {
    pub fn new(side: Side, player: u8, y: f32) -> Self {
        Self {
            side,
            player,
            y,
            status: PaddleStatus::Default,
        }
    }
}

/// Movement intent for paddle
#[derive(Debug, Clone, Copy, Default)]
pub struct PaddleIntent {
    pub dir: i8, // -1 = up, 0 = stop, 1 = down
}

impl PaddleIntent {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Ball component - the pong ball
///
/// `dir` is kept unit length; `prev` is the position before the last move
/// and feeds the swept paddle test.
#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub prev: Vec2,
    pub dir: Vec2,
    pub speed: f32,
    pub trail: VecDeque<Vec2>,
}

impl Ball {
    pub fn new(pos: Vec2, dir: Vec2, speed: f32) -> Self {
        Self {
            pos,
            prev: pos,
            dir: dir.normalize_or_zero(),
            speed,
            trail: VecDeque::new(),
        }
    }

    /// Reset ball to the centre, heading to a random side inside the bounce band
    pub fn launch(&mut self, config: &Config, rng: &mut GameRng) {
        use rand::Rng;

        let angle = if config.ball_angle_max > config.ball_angle_min {
            rng.0.gen_range(config.ball_angle_min..=config.ball_angle_max)
        } else {
            config.ball_angle_min
        };
        let sign_x = if rng.0.gen_bool(0.5) { 1.0 } else { -1.0 };
        let sign_y = if rng.0.gen_bool(0.5) { 1.0 } else { -1.0 };

        self.pos = config.center();
        self.prev = self.pos;
        self.dir = Vec2::new(sign_x * angle.cos(), sign_y * angle.sin());
        self.speed = config.ball_speed_min;
        self.trail.clear();
    }

    /// Record the current position in the bounded trail
    pub fn push_trail(&mut self, max_len: usize) {
        if max_len == 0 {
            return;
        }
        while self.trail.len() >= max_len {
            self.trail.pop_front();
        }
        self.trail.push_back(self.pos);
    }

    /// Bounce angle from horizontal, in radians
    pub fn angle(&self) -> f32 {
        self.dir.y.abs().clamp(0.0, 1.0).asin()
    }
}
