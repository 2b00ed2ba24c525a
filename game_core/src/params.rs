/// Game tuning parameters for Pong
#[derive(Debug, Clone, Copy)]
pub struct Params;

impl Params {
    // Field (pixels, y grows downward)
    pub const FIELD_WIDTH: f32 = 1440.0;
    pub const FIELD_HEIGHT: f32 = 1080.0;

    // Paddle
    pub const PADDLE_OFFSET: f32 = 50.0; // distance from side wall to paddle centre
    pub const PADDLE_HEIGHT: f32 = 120.0;
    pub const PADDLE_WIDTH: f32 = Self::PADDLE_HEIGHT / 6.0;
    pub const PADDLE_SPEED: f32 = 500.0; // pixels per second

    // Ball
    pub const BALL_RADIUS: f32 = 15.0;
    pub const BALL_SPEED_MIN: f32 = 600.0;
    pub const BALL_SPEED_MAX: f32 = 2400.0;
    pub const BALL_ACCELERATION_DURATION: f32 = 64.0; // seconds from min to max speed
    pub const BALL_ANGLE_MIN: f32 = 15.0; // degrees from horizontal
    pub const BALL_ANGLE_MAX: f32 = 30.0;
    pub const BALL_BOUNCING_EPSILON: f32 = 5.0; // degrees of wall bounce jitter
    pub const BALL_TRAIL_LENGTH: usize = 8;

    // Match
    pub const SCORE_LIMIT: u8 = 3;
    pub const COUNTDOWN: [u8; 3] = [3, 2, 1];
    pub const COUNTDOWN_STEP: f32 = 1.0; // seconds per countdown value

    // Physics
    pub const FIXED_DT: f32 = 1.0 / 60.0;
    pub const MAX_DT: f32 = 0.1; // Clamp to prevent large jumps
}
