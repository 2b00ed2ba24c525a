use crate::{Params, Side};
use glam::Vec2;

/// How points are won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchRule {
    /// A paddle on each side, first to the score limit wins
    #[default]
    Classic,
    /// Player 1 alone against the far wall. Each bounce off that wall
    /// scores; the match ends when the ball gets past the player.
    Wall,
}

impl MatchRule {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchRule::Classic => "classic",
            MatchRule::Wall => "wall",
        }
    }
}

/// Game configuration
///
/// Angles are stored in radians, measured from the horizontal.
#[derive(Debug, Clone)]
pub struct Config {
    pub field_width: f32,
    pub field_height: f32,
    pub paddle_offset: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    pub ball_radius: f32,
    pub ball_speed_min: f32,
    pub ball_speed_max: f32,
    pub ball_acceleration_duration: f32,
    pub ball_angle_min: f32,
    pub ball_angle_max: f32,
    pub ball_bouncing_epsilon: f32,
    pub ball_trail_length: usize,
    pub score_limit: u8,
    pub countdown: Vec<u8>,
    pub countdown_step: f32,
    pub match_rule: MatchRule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            field_width: Params::FIELD_WIDTH,
            field_height: Params::FIELD_HEIGHT,
            paddle_offset: Params::PADDLE_OFFSET,
            paddle_width: Params::PADDLE_WIDTH,
            paddle_height: Params::PADDLE_HEIGHT,
            paddle_speed: Params::PADDLE_SPEED,
            ball_radius: Params::BALL_RADIUS,
            ball_speed_min: Params::BALL_SPEED_MIN,
            ball_speed_max: Params::BALL_SPEED_MAX,
            ball_acceleration_duration: Params::BALL_ACCELERATION_DURATION,
            ball_angle_min: Params::BALL_ANGLE_MIN.to_radians(),
            ball_angle_max: Params::BALL_ANGLE_MAX.to_radians(),
            ball_bouncing_epsilon: Params::BALL_BOUNCING_EPSILON.to_radians(),
            ball_trail_length: Params::BALL_TRAIL_LENGTH,
            score_limit: Params::SCORE_LIMIT,
            countdown: Params::COUNTDOWN.to_vec(),
            countdown_step: Params::COUNTDOWN_STEP,
            match_rule: MatchRule::Classic,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score_limit(mut self, score_limit: u8) -> Self {
        self.score_limit = score_limit.max(1);
        self
    }

    pub fn with_countdown(mut self, countdown: Vec<u8>, step: f32) -> Self {
        self.countdown = countdown;
        self.countdown_step = step;
        self
    }

    pub fn with_match_rule(mut self, rule: MatchRule) -> Self {
        self.match_rule = rule;
        self
    }

    /// Bounce band in degrees, for callers that think in degrees
    pub fn with_angle_band_degrees(mut self, min: f32, max: f32) -> Self {
        self.ball_angle_min = min.min(max).to_radians();
        self.ball_angle_max = max.max(min).to_radians();
        self
    }

    /// Centre X of the paddle on a side
    pub fn paddle_x(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.paddle_offset,
            Side::Right => self.field_width - self.paddle_offset,
        }
    }

    /// X of the paddle face the ball bounces off
    pub fn paddle_face_x(&self, side: Side) -> f32 {
        self.paddle_x(side) + side.outward() * self.paddle_width / 2.0
    }

    /// Clamp paddle Y to field bounds
    pub fn clamp_paddle_y(&self, y: f32) -> f32 {
        let half_height = self.paddle_height / 2.0;
        y.clamp(half_height, self.field_height - half_height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.field_width / 2.0, self.field_height / 2.0)
    }

    /// Speed gained per second while ramping from min to max
    pub fn ball_acceleration(&self) -> f32 {
        if self.ball_acceleration_duration <= 0.0 {
            return f32::INFINITY;
        }
        (self.ball_speed_max - self.ball_speed_min) / self.ball_acceleration_duration
    }
}
