use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use game_core::{Config, MatchRule, PaddleController, Score, Side, Tracker};
use proto::LobbyEntry;
use session::{
    Authority, Offline, Role, SessionConfig, SessionState, SyncSession, SystemEnv, Transport,
    UdpTransport,
};

const DEFAULT_PORT: u16 = 7878;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Player 1 against the built-in controller
    Solo,
    /// Both paddles on this machine
    Local,
    /// Wait for a peer and own the simulation
    Host,
    /// Connect to a hosting peer
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuleArg {
    Classic,
    /// Solo against the far wall
    Wall,
}

impl From<RuleArg> for MatchRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Classic => MatchRule::Classic,
            RuleArg::Wall => MatchRule::Wall,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "peer")]
#[command(about = "Headless Pong peer driven by the scripted controller")]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Mode::Solo)]
    mode: Mode,

    /// Host address; implies `--mode join`
    #[arg(short, long)]
    join: Option<SocketAddr>,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value = "player")]
    name: String,

    #[arg(short, long, value_enum, default_value_t = RuleArg::Classic)]
    rule: RuleArg,

    #[arg(long, default_value_t = game_core::Params::SCORE_LIMIT)]
    score_limit: u8,

    /// Side the hosting peer plays on
    #[arg(long, value_enum, default_value_t = SideArg::Left)]
    side: SideArg,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, default_value_t = 3_000, help = "Silence before the link counts as lost")]
    silence_ms: u64,

    #[arg(long, default_value_t = 5_000)]
    handshake_ms: u64,

    #[arg(long, default_value_t = 250, help = "Delay before a handshake item is resent")]
    resend_ms: u64,

    #[arg(long, default_value_t = Tracker::DEAD_ZONE, help = "Dead zone of the solo opponent")]
    bot_dead_zone: f32,

    #[arg(long, help = "Seed for the ball launch (defaults to the clock)")]
    seed: Option<u64>,

    #[arg(long, help = "Stop after this many ticks")]
    max_ticks: Option<u64>,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.join.is_some() {
            Mode::Join
        } else {
            self.mode
        }
    }

    fn role(&self) -> Role {
        match self.mode() {
            Mode::Solo => Role::Solo,
            Mode::Local => Role::Local,
            Mode::Host => Role::Networked(Authority::Host),
            Mode::Join => Role::Networked(Authority::Client),
        }
    }

    fn game_config(&self) -> Config {
        Config::new()
            .with_score_limit(self.score_limit)
            .with_match_rule(self.rule.into())
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_name(self.name.clone())
            .with_handshake_timeout(self.handshake_ms)
            .with_resend_interval(self.resend_ms)
            .with_host_side(self.side.into())
    }

    fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }

    fn transport(&self) -> Result<Box<dyn Transport>> {
        let silence = Duration::from_millis(self.silence_ms);
        let transport: Box<dyn Transport> = match self.mode() {
            Mode::Solo | Mode::Local => Box::new(Offline),
            Mode::Host => Box::new(
                UdpTransport::host(("0.0.0.0", self.port), silence)
                    .with_context(|| format!("binding port {}", self.port))?,
            ),
            Mode::Join => {
                let Some(addr) = self.join else {
                    bail!("--mode join needs --join <addr>");
                };
                Box::new(
                    UdpTransport::join("0.0.0.0:0", addr, silence)
                        .with_context(|| format!("joining {addr}"))?,
                )
            }
        };
        Ok(transport)
    }

    /// Directory entry describing a hosted match
    fn lobby_entry(&self) -> LobbyEntry {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let rule = MatchRule::from(self.rule);
        LobbyEntry::new(self.name.clone(), rule.as_str(), Side::from(self.side).index(), time)
    }
}

/// Players this process drives with a tracker each
fn local_players(role: Role) -> Vec<(u8, Tracker)> {
    match role {
        Role::Local => vec![(1, Tracker::new()), (2, Tracker::new())],
        _ => vec![(1, Tracker::new())],
    }
}

fn drive(session: &mut SyncSession, players: &mut [(u8, Tracker)]) {
    for (player, tracker) in players.iter_mut() {
        let view = session
            .kinematics()
            .side_of(*player)
            .and_then(|side| session.kinematics().view(side));
        if let Some(view) = view {
            session.set_input(*player, tracker.decide(&view).dir());
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let role = args.role();
    if args.rule == RuleArg::Wall && role != Role::Solo {
        bail!("the wall rule is single player, use --mode solo");
    }
    let mut session = SyncSession::for_role(
        role,
        args.game_config(),
        args.seed(),
        args.transport()?,
        Box::new(SystemEnv::new()),
        args.session_config(),
    )
    .with_controller(Box::new(Tracker::with_dead_zone(args.bot_dead_zone)));
    if role == Role::Networked(Authority::Host) {
        log::info!("Hosting {:?} on port {}", args.lobby_entry(), args.port);
    }

    let tick_rate = args.tick_rate.max(1);
    let frame = Duration::from_secs_f64(1.0 / f64::from(tick_rate));
    let dt = frame.as_secs_f32();
    let mut players = local_players(role);
    let mut last_score = Score::new();
    let mut ticks = 0u64;

    session.start();
    loop {
        let started = Instant::now();

        drive(&mut session, &mut players);
        session.update(dt);
        ticks += 1;

        match session.state() {
            SessionState::Left => {
                log::warn!("Left the match: host went away");
                return Ok(());
            }
            SessionState::Closed if !session.is_initialized() => {
                let reason = session
                    .last_error()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "closed".to_string());
                bail!("session never started: {reason}");
            }
            SessionState::Closed => return Ok(()),
            _ => {}
        }

        let score = session.round().round().score;
        if score != last_score {
            log::info!("Score {} - {}", score.left, score.right);
            last_score = score;
        }

        if let Some(result) = session.take_result() {
            if args.rule == RuleArg::Wall {
                let bounces = result.score.get(result.winner_side);
                log::info!("Match over: {bounces} wall bounces");
                break;
            }
            let outcome = if result.winner == 1 { "won" } else { "lost" };
            log::info!(
                "Match over: {outcome} ({:?} side wins {} - {})",
                result.winner_side,
                result.score.left,
                result.score.right
            );
            break;
        }

        if args.max_ticks.is_some_and(|max| ticks >= max) {
            log::info!("Stopping after {ticks} ticks");
            break;
        }

        thread::sleep(frame.saturating_sub(started.elapsed()));
    }

    session.disconnect();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    log::info!("Starting {:?} peer as {}", args.mode(), args.name);
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_address_implies_join_mode() {
        let args = Args::try_parse_from(["peer", "--join", "127.0.0.1:7878"]).unwrap();
        assert_eq!(args.mode(), Mode::Join);
        assert_eq!(args.role(), Role::Networked(Authority::Client));
    }

    #[test]
    fn test_defaults_to_solo() {
        let args = Args::try_parse_from(["peer"]).unwrap();
        assert_eq!(args.role(), Role::Solo);
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.session_config().host_side, Side::Left);
    }

    #[test]
    fn test_join_mode_without_address_fails() {
        let args = Args::try_parse_from(["peer", "--mode", "join"]).unwrap();
        assert!(args.transport().is_err());
    }

    #[test]
    fn test_local_drives_both_players() {
        let players: Vec<u8> = local_players(Role::Local).iter().map(|(p, _)| *p).collect();
        assert_eq!(players, vec![1, 2]);
        assert_eq!(local_players(Role::Solo).len(), 1);
    }

    #[test]
    fn test_wall_rule_needs_solo() {
        let args = Args::try_parse_from(["peer", "--mode", "local", "--rule", "wall"]).unwrap();
        assert!(run(&args).is_err());

        let args = Args::try_parse_from(["peer", "--rule", "wall"]).unwrap();
        assert_eq!(args.game_config().match_rule, MatchRule::Wall);
        assert_eq!(args.lobby_entry().mode, "wall");
    }

    #[test]
    fn test_short_solo_run_finishes() {
        let args = Args::try_parse_from([
            "peer",
            "--tick-rate",
            "1000",
            "--max-ticks",
            "20",
            "--seed",
            "7",
        ])
        .unwrap();
        assert!(run(&args).is_ok());
    }
}
