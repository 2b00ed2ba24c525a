use crate::Side;

/// Time resource for tracking simulation time
#[derive(Debug, Clone, Copy)]
pub struct Time {
    pub dt: f32,  // Delta time for this step
    pub now: f32, // Total elapsed time
}

impl Time {
    pub fn new(dt: f32, now: f32) -> Self {
        Self { dt, now }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self {
            dt: crate::Params::FIXED_DT,
            now: 0.0,
        }
    }
}

/// Game score tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub left: u8,  // Left side score
    pub right: u8, // Right side score
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Side) -> u8 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, value: u8) {
        match side {
            Side::Left => self.left = value,
            Side::Right => self.right = value,
        }
    }

    pub fn increment(&mut self, side: Side) {
        let value = self.get(side).saturating_add(1);
        self.set(side, value);
    }

    pub fn has_winner(&self, score_limit: u8) -> Option<Side> {
        if self.left >= score_limit {
            Some(Side::Left)
        } else if self.right >= score_limit {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// Random number generator
pub struct GameRng(pub rand::rngs::StdRng);

impl GameRng {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

/// Events that occurred during a simulation step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Events {
    /// Side whose outer wall the ball reached
    pub goal: Option<Side>,
    /// Side of the paddle the ball bounced off
    pub ball_hit_paddle: Option<Side>,
    pub ball_hit_wall: bool,
    /// Side wall the ball bounced off where no paddle stands
    pub ball_hit_back_wall: Option<Side>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.goal = None;
        self.ball_hit_paddle = None;
        self.ball_hit_wall = false;
        self.ball_hit_back_wall = None;
    }
}

/// Queue of paddle inputs waiting to be applied: (player slot, direction)
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pub inputs: Vec<(u8, i8)>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.inputs.clear();
    }

    pub fn push_input(&mut self, player: u8, dir: i8) {
        self.inputs.push((player, dir.signum()));
    }

    pub fn pop_inputs(&mut self) -> Vec<(u8, i8)> {
        std::mem::take(&mut self.inputs)
    }
}
