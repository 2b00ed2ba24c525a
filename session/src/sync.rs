//! Synchronization session.
//!
//! One `update` per frame: check the link, advance the handshake, then run
//! the role's exchange. The host owns the ball, its own paddle and the round
//! flags; the client owns only its paddle and mirrors everything else.

use game_core::{
    paddle_prefix, Config, Kinematics, MatchResult, PaddleController, PaddleStatus, RoundMachine,
    Side, Tracker,
};
use proto::Message;

use crate::{Environment, HandshakeStatus, Negotiator, SessionConfig, SessionError, Transport};

/// Which peer is the ground truth for shared fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Host,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// One local player against a controller
    Solo,
    /// Two players on one machine
    Local,
    Networked(Authority),
}

impl Role {
    /// True for every role except the networked client
    pub fn is_authoritative(self) -> bool {
        !matches!(self, Role::Networked(Authority::Client))
    }

    pub fn is_networked(self) -> bool {
        matches!(self, Role::Networked(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Lost,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built, `start` not called yet
    Idle,
    Handshaking,
    Running,
    /// Client left the match after losing the host
    Left,
    Closed,
}

pub struct SyncSession {
    role: Role,
    config: SessionConfig,
    kinematics: Kinematics,
    round: RoundMachine,
    transport: Box<dyn Transport>,
    env: Box<dyn Environment>,
    negotiator: Option<Negotiator>,
    controller: Option<Box<dyn PaddleController>>,
    local_side: Side,
    connection: ConnectionStatus,
    state: SessionState,
    initialized: bool,
    peer_name: Option<String>,
    last_error: Option<SessionError>,
    bindings_active: bool,
    tick: u64,
}

impl SyncSession {
    /// Assemble a session from its parts. Player 1 is the local player.
    pub fn new(
        role: Role,
        kinematics: Kinematics,
        round: RoundMachine,
        transport: Box<dyn Transport>,
        env: Box<dyn Environment>,
        config: SessionConfig,
    ) -> Self {
        let local_side = kinematics.side_of(1).unwrap_or(Side::Left);
        let controller: Option<Box<dyn PaddleController>> = match role {
            Role::Solo => Some(Box::new(Tracker::new())),
            _ => None,
        };
        let connection = if role.is_networked() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::NotApplicable
        };

        Self {
            role,
            config,
            kinematics,
            round,
            transport,
            env,
            negotiator: None,
            controller,
            local_side,
            connection,
            state: SessionState::Idle,
            initialized: false,
            peer_name: None,
            last_error: None,
            bindings_active: false,
            tick: 0,
        }
    }

    /// Build the kinematics and round machine for `role` and assemble a session
    pub fn for_role(
        role: Role,
        game: Config,
        seed: u64,
        transport: Box<dyn Transport>,
        env: Box<dyn Environment>,
        config: SessionConfig,
    ) -> Self {
        let local_side = match role {
            Role::Networked(Authority::Client) => config.host_side.opposite(),
            _ => config.host_side,
        };
        let kinematics = Kinematics::new(game, seed, local_side);
        let round = RoundMachine::new(kinematics.config(), kinematics.side_slots());
        Self::new(role, kinematics, round, transport, env, config)
    }

    /// Replace the controller driving the opponent paddle in solo play
    pub fn with_controller(mut self, controller: Box<dyn PaddleController>) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Tag the paddles, bind inputs and begin the handshake or the first round
    pub fn start(&mut self) {
        if self.state != SessionState::Idle {
            return;
        }

        let remote = self.local_side.opposite();
        self.kinematics.set_status(self.local_side, PaddleStatus::Player);
        let remote_status = match self.role {
            Role::Local => PaddleStatus::Player,
            _ => PaddleStatus::Ennemy,
        };
        self.kinematics.set_status(remote, remote_status);
        self.bindings_active = true;

        match self.role {
            Role::Networked(authority) => {
                log::info!("session: handshaking as {authority:?}");
                self.negotiator = Some(Negotiator::new(
                    authority,
                    &self.config.name,
                    self.config.handshake_timeout_ms,
                    self.config.resend_interval_ms,
                ));
                self.state = SessionState::Handshaking;
                self.poll_handshake();
            }
            Role::Solo | Role::Local => {
                log::info!("session: starting {:?} match", self.role);
                self.initialized = true;
                self.round.begin_round();
                self.state = SessionState::Running;
            }
        }
    }

    /// Advance the session by one frame of `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if !matches!(
            self.state,
            SessionState::Handshaking | SessionState::Running
        ) {
            return;
        }
        self.tick += 1;

        self.check_connection();

        match self.state {
            SessionState::Handshaking => self.poll_handshake(),
            SessionState::Running => self.run_tick(dt),
            _ => {}
        }
    }

    fn check_connection(&mut self) {
        if self.connection != ConnectionStatus::Connected || !self.transport.is_connection_lost() {
            return;
        }
        self.connection = ConnectionStatus::Lost;

        let reason = self
            .transport
            .last_error()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "peer went silent".to_string());
        let err = SessionError::ConnectionLost { reason };
        log::warn!("session: {err}");
        self.env.notify(&err);
        self.last_error = Some(err);
        self.transport.disconnect();

        // Nothing to fall back to before the handshake is done
        if self.state == SessionState::Handshaking {
            self.initialized = false;
            self.release_bindings();
            self.state = SessionState::Closed;
            return;
        }

        if self.role.is_authoritative() {
            log::info!("session: peer gone, continuing solo");
            self.role = Role::Solo;
            self.negotiator = None;
            if self.controller.is_none() {
                self.controller = Some(Box::new(Tracker::new()));
            }
        } else {
            self.release_bindings();
            self.state = SessionState::Left;
            self.env.request_menu();
        }
    }

    fn poll_handshake(&mut self) {
        let now = self.env.now();
        let Some(negotiator) = self.negotiator.as_mut() else {
            return;
        };

        match negotiator.poll(self.transport.as_mut(), now) {
            HandshakeStatus::Pending => {}
            HandshakeStatus::Complete => {
                self.initialized = true;
                self.peer_name = negotiator.peer_name().map(str::to_string);
                log::info!(
                    "session: playing against {}",
                    self.peer_name.as_deref().unwrap_or("?")
                );
                self.round.begin_round();
                self.state = SessionState::Running;
            }
            HandshakeStatus::TimedOut => {
                let err = SessionError::HandshakeTimeout {
                    waited_ms: negotiator.elapsed(now),
                };
                log::warn!("session: {err}");
                self.env.notify(&err);
                self.last_error = Some(err);
                self.initialized = false;
                self.release_bindings();
                self.transport.disconnect();
                self.state = SessionState::Closed;
            }
        }
    }

    fn run_tick(&mut self, dt: f32) {
        match self.role {
            Role::Solo | Role::Local => self.advance_authoritative(dt),
            Role::Networked(Authority::Host) => {
                self.receive_as_host();
                self.advance_authoritative(dt);
                let own = paddle_prefix(self.local_side);
                self.send_state(&["ball", own.as_str(), "game"]);
            }
            Role::Networked(Authority::Client) => {
                self.receive_as_client();
                self.advance_mirror(dt);
                let own = paddle_prefix(self.local_side);
                self.send_state(&[own.as_str()]);
            }
        }

        if self.tick % 60 == 0 {
            let score = self.round.round().score;
            log::debug!(
                "session: tick={} phase={:?} score={}-{}",
                self.tick,
                self.round.phase(),
                score.left,
                score.right
            );
        }
    }

    /// Full simulation step: controller, countdown, kinematics, scoring
    fn advance_authoritative(&mut self, dt: f32) {
        self.drive_controller();
        self.round.tick(dt);

        if self.round.round().next_round {
            self.kinematics.reset_round();
            if let Some(controller) = self.controller.as_mut() {
                controller.reset();
            }
            self.round.begin_round();
        }

        if !self.round.is_simulating() {
            self.kinematics.clear_inputs();
            return;
        }

        let events = self.kinematics.step(dt);
        if events.ball_hit_back_wall.is_some() && self.round.on_back_wall() {
            log::debug!("session: wall bounce, score {:?}", self.round.round().score);
        }
        if let Some(side) = events.goal {
            if let Some(outcome) = self.round.on_goal(side) {
                log::info!("session: goal against {side:?}, {outcome:?}");
            }
        }
    }

    /// Client step: only the local paddle responds to input
    fn advance_mirror(&mut self, dt: f32) {
        if self.round.is_simulating() {
            self.kinematics.step_paddles(dt);
        } else {
            self.kinematics.clear_inputs();
        }
    }

    fn drive_controller(&mut self) {
        if self.role != Role::Solo {
            return;
        }
        let remote = self.local_side.opposite();
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let (Some(view), Some(paddle)) = (self.kinematics.view(remote), self.kinematics.paddle(remote))
        else {
            return;
        };
        let decision = controller.decide(&view);
        self.kinematics.push_input(paddle.player, decision.dir());
    }

    fn receive_as_host(&mut self) {
        let remote = paddle_prefix(self.local_side.opposite());
        while let Some(message) = self.transport.receive() {
            if message.kind().is_some() {
                let now = self.env.now();
                if let Some(negotiator) = self.negotiator.as_mut() {
                    negotiator.answer_late(self.transport.as_mut(), &message, now);
                }
                continue;
            }
            self.apply(&message, &[remote.as_str()]);
        }
    }

    fn receive_as_client(&mut self) {
        let remote = paddle_prefix(self.local_side.opposite());
        while let Some(message) = self.transport.receive() {
            if message.kind().is_some() {
                continue;
            }
            let (was_between, score_before) = {
                let round = self.round.round();
                (round.next_round, round.score)
            };
            self.apply(&message, &["ball", remote.as_str(), "game"]);

            // The host reset the field for a new round, ours included
            let round = self.round.round();
            let restarted = !round.next_round
                && !round.ended
                && (was_between || round.score != score_before);
            if restarted {
                self.kinematics.recentre_paddle(self.local_side);
                self.kinematics.clear_inputs();
            }
        }
    }

    fn apply(&mut self, message: &Message, filters: &[&str]) {
        if let Err(err) = game_core::from_dict(&mut self.kinematics, &mut self.round, message, filters) {
            self.record_error(err.into());
        }
    }

    fn send_state(&mut self, filters: &[&str]) {
        if self.tick % u64::from(self.config.send_every.max(1)) != 0 {
            return;
        }
        let message = game_core::to_dict(&self.kinematics, &self.round, filters);
        if message.is_empty() {
            return;
        }
        if let Err(err) = self.transport.send(&message) {
            self.record_error(err.into());
        }
    }

    fn record_error(&mut self, err: SessionError) {
        if self.last_error.as_ref() != Some(&err) {
            log::warn!("session: {err}");
        }
        self.last_error = Some(err);
    }

    fn release_bindings(&mut self) {
        self.bindings_active = false;
        self.kinematics.clear_inputs();
    }

    /// Move a local player's paddle (-1 up, 0 stop, 1 down)
    pub fn set_input(&mut self, player: u8, dir: i8) {
        if !self.bindings_active {
            return;
        }
        let allowed = match self.role {
            Role::Local => true,
            Role::Solo | Role::Networked(_) => player == 1,
        };
        if allowed {
            self.kinematics.push_input(player, dir);
        }
    }

    /// Leave the session, releasing inputs and the transport
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        log::info!("session: disconnecting");
        self.release_bindings();
        self.transport.disconnect();
        self.state = SessionState::Closed;
    }

    pub fn to_dict(&self, filters: &[&str]) -> Message {
        game_core::to_dict(&self.kinematics, &self.round, filters)
    }

    pub fn from_dict(&mut self, data: &Message, filters: &[&str]) -> Result<usize, SessionError> {
        Ok(game_core::from_dict(
            &mut self.kinematics,
            &mut self.round,
            data,
            filters,
        )?)
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected && self.transport.is_connected()
    }

    pub fn is_hosting(&self) -> bool {
        self.transport.is_hosting()
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn pause(&mut self) {
        self.round.pause();
    }

    pub fn unpause(&mut self) {
        self.round.unpause();
    }

    pub fn freeze(&mut self) {
        self.round.freeze();
    }

    pub fn unfreeze(&mut self) {
        self.round.unfreeze();
    }

    pub fn take_result(&mut self) -> Option<MatchResult> {
        self.round.take_result()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn bindings_active(&self) -> bool {
        self.bindings_active
    }

    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    pub fn local_side(&self) -> Side {
        self.local_side
    }

    pub fn handshake(&self) -> Option<&Negotiator> {
        self.negotiator.as_ref()
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn round(&self) -> &RoundMachine {
        &self.round
    }
}
