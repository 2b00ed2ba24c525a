//! Kinematics engine: owns the ball and paddle entities and advances them.
//!
//! No I/O happens here. Goals are reported through [`Events`] and scoring is
//! left to the round state machine.

use glam::Vec2;
use hecs::{Entity, World};

use crate::systems::{clear_intents, ingest_inputs, move_paddles};
use crate::{
    create_paddle, Ball, Config, Events, GameRng, InputQueue, KinematicsView, MatchRule, Paddle,
    PaddleStatus, Params, Side, Time,
};

pub struct Kinematics {
    config: Config,
    world: World,
    time: Time,
    rng: GameRng,
    inputs: InputQueue,
    events: Events,
    ball: Entity,
    paddles: [Option<Entity>; 2], // indexed by side
    p1_side: Side,
}

impl Kinematics {
    /// Spawn a launched ball and the paddles. Player 1 takes `p1_side`; under
    /// the wall rule the other side has no paddle.
    pub fn new(config: Config, seed: u64, p1_side: Side) -> Self {
        let mut world = World::new();
        let mut rng = GameRng::new(seed);

        let mut ball = Ball::new(config.center(), Vec2::X, config.ball_speed_min);
        ball.launch(&config, &mut rng);
        let ball = world.spawn((ball,));

        let y = config.field_height / 2.0;
        let paddles = Side::BOTH.map(|side| {
            if side == p1_side {
                Some(create_paddle(&mut world, side, 1, y))
            } else if config.match_rule == MatchRule::Classic {
                Some(create_paddle(&mut world, side, 2, y))
            } else {
                None
            }
        });

        Self {
            config,
            world,
            time: Time::default(),
            rng,
            inputs: InputQueue::new(),
            events: Events::new(),
            ball,
            paddles,
            p1_side,
        }
    }

    /// Advance ball and paddles by `dt` seconds
    pub fn step(&mut self, dt: f32) -> Events {
        self.time.dt = dt;
        crate::step(
            &mut self.world,
            &mut self.time,
            &self.config,
            &mut self.events,
            &mut self.inputs,
            &mut self.rng,
        );
        self.events
    }

    /// Advance only the paddles, leaving the ball untouched
    pub fn step_paddles(&mut self, dt: f32) {
        ingest_inputs(&mut self.world, &mut self.inputs);
        let time = Time::new(dt.min(Params::MAX_DT), self.time.now);
        move_paddles(&mut self.world, &time, &self.config);
        self.time.now += time.dt;
    }

    /// Relaunch the ball from the centre and recentre both paddles
    pub fn reset_round(&mut self) {
        let (config, rng) = (&self.config, &mut self.rng);
        if let Ok(mut ball) = self.world.get::<&mut Ball>(self.ball) {
            ball.launch(config, rng);
        }
        for side in Side::BOTH {
            self.recentre_paddle(side);
        }
        self.clear_inputs();
        self.events.clear();
    }

    /// Put a paddle back at mid-height
    pub fn recentre_paddle(&mut self, side: Side) {
        let y = self.config.field_height / 2.0;
        self.with_paddle_mut(side, |paddle| paddle.y = y);
    }

    /// Queue a move for a player slot; applied on the next step
    pub fn push_input(&mut self, player: u8, dir: i8) {
        self.inputs.push_input(player, dir);
    }

    /// Drop queued inputs and stop every paddle
    pub fn clear_inputs(&mut self) {
        self.inputs.clear();
        clear_intents(&mut self.world);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> f32 {
        self.time.now
    }

    pub fn ball(&self) -> Option<Ball> {
        self.world.get::<&Ball>(self.ball).ok().map(|ball| (*ball).clone())
    }

    pub fn paddle(&self, side: Side) -> Option<Paddle> {
        let entity = self.paddles[side.index() as usize]?;
        self.world.get::<&Paddle>(entity).ok().map(|paddle| *paddle)
    }

    pub fn paddle_of(&self, player: u8) -> Option<Paddle> {
        Side::BOTH
            .into_iter()
            .filter_map(|side| self.paddle(side))
            .find(|paddle| paddle.player == player)
    }

    /// Side a player slot is playing on
    pub fn side_of(&self, player: u8) -> Option<Side> {
        self.paddle_of(player).map(|paddle| paddle.side)
    }

    /// Player slot on each side, indexed by side
    pub fn side_slots(&self) -> [u8; 2] {
        Side::BOTH.map(|side| if side == self.p1_side { 1 } else { 2 })
    }

    pub fn set_status(&mut self, side: Side, status: PaddleStatus) {
        self.with_paddle_mut(side, |paddle| paddle.status = status);
    }

    /// Ball and paddle kinematics as seen by the paddle on `side`
    pub fn view(&self, side: Side) -> Option<KinematicsView> {
        let ball = self.ball()?;
        let paddle = self.paddle(side)?;
        Some(KinematicsView {
            ball_pos: ball.pos,
            ball_dir: ball.dir,
            paddle_x: self.config.paddle_x(side),
            paddle_y: paddle.y,
            field_height: self.config.field_height,
        })
    }

    pub(crate) fn with_ball_mut<R>(&mut self, f: impl FnOnce(&mut Ball) -> R) -> Option<R> {
        let mut ball = self.world.get::<&mut Ball>(self.ball).ok()?;
        Some(f(&mut *ball))
    }

    pub(crate) fn with_paddle_mut<R>(
        &mut self,
        side: Side,
        f: impl FnOnce(&mut Paddle) -> R,
    ) -> Option<R> {
        let entity = self.paddles[side.index() as usize]?;
        let mut paddle = self.world.get::<&mut Paddle>(entity).ok()?;
        Some(f(&mut *paddle))
    }
}
