//! Partial state codec.
//!
//! Ball, paddle and round fields are flattened into a [`Message`] under
//! prefixed keys. Callers pick the fields they own with filter prefixes;
//! decoding only touches keys present in the incoming message.
//!
//! | prefix        | keys                                                     |
//! |---------------|----------------------------------------------------------|
//! | `ball`        | `ball_x ball_y ball_dx ball_dy ball_celerity`            |
//! | `paddle_<s>`  | `paddle_<s>_x paddle_<s>_y` (s = 0 left, 1 right)        |
//! | `player_<n>`  | `player_<n>_x player_<n>_y` (n = player slot)            |
//! | `game`        | `game_score_0 game_score_1 game_winner game_frozen`      |
//! |               | `game_paused game_ended game_next_round game_countdown`  |
//!
//! Paddle `x` is fixed by side; it is sent for completeness and ignored on
//! decode.

use glam::Vec2;
use proto::{Message, Value};

use crate::{Kinematics, RoundMachine, Side};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("field `{key}` expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("field `{key}` is out of range")]
    OutOfRange { key: String },
}

/// Prefix of the keys describing the paddle on `side`
pub fn paddle_prefix(side: Side) -> String {
    format!("paddle_{}", side.index())
}

/// Prefix of the keys describing the paddle of a player slot
pub fn player_prefix(player: u8) -> String {
    format!("player_{player}")
}

/// A key matches a filter when it equals it or extends it with `_`
pub fn matches_filter(key: &str, filters: &[&str]) -> bool {
    filters.iter().any(|prefix| {
        key == *prefix
            || (key.len() > prefix.len()
                && key.starts_with(prefix)
                && key.as_bytes()[prefix.len()] == b'_')
    })
}

/// Encode the fields selected by `filters`
pub fn to_dict(kinematics: &Kinematics, machine: &RoundMachine, filters: &[&str]) -> Message {
    let mut out = Message::new();
    if filters.is_empty() {
        return out;
    }

    if let Some(ball) = kinematics.ball() {
        out.insert("ball_x", ball.pos.x);
        out.insert("ball_y", ball.pos.y);
        out.insert("ball_dx", ball.dir.x);
        out.insert("ball_dy", ball.dir.y);
        out.insert("ball_celerity", ball.speed);
    }

    for side in Side::BOTH {
        if let Some(paddle) = kinematics.paddle(side) {
            let x = kinematics.config().paddle_x(side);
            for prefix in [paddle_prefix(side), player_prefix(paddle.player)] {
                out.insert(format!("{prefix}_x"), x);
                out.insert(format!("{prefix}_y"), paddle.y);
            }
        }
    }

    let round = machine.round();
    out.insert("game_score_0", round.score.left);
    out.insert("game_score_1", round.score.right);
    out.insert("game_winner", round.winner.map(Side::index));
    out.insert("game_frozen", round.frozen);
    out.insert("game_paused", round.paused);
    out.insert("game_ended", round.ended);
    out.insert("game_next_round", round.next_round);
    out.insert("game_countdown", round.countdown);

    out.iter()
        .filter(|(key, _)| matches_filter(key, filters))
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Apply the fields of `data` selected by `filters`; returns how many applied.
///
/// The whole message is validated first, so a badly typed field leaves the
/// state untouched. Unknown keys are ignored.
pub fn from_dict(
    kinematics: &mut Kinematics,
    machine: &mut RoundMachine,
    data: &Message,
    filters: &[&str],
) -> Result<usize, CodecError> {
    let patch = StatePatch::parse(data, filters, machine.side_slots())?;
    Ok(patch.apply(kinematics, machine))
}

#[derive(Debug, Default)]
struct StatePatch {
    ball_x: Option<f32>,
    ball_y: Option<f32>,
    ball_dx: Option<f32>,
    ball_dy: Option<f32>,
    ball_speed: Option<f32>,
    paddle_y: [Option<f32>; 2],
    score: [Option<u8>; 2],
    winner: Option<Option<Side>>,
    frozen: Option<bool>,
    paused: Option<bool>,
    ended: Option<bool>,
    next_round: Option<bool>,
    countdown: Option<Option<u8>>,
    applied: usize,
}

impl StatePatch {
    fn parse(data: &Message, filters: &[&str], side_slots: [u8; 2]) -> Result<Self, CodecError> {
        let mut patch = StatePatch::default();

        for (key, value) in data.iter() {
            if !matches_filter(key, filters) {
                continue;
            }
            let known = match key {
                "ball_x" => set(&mut patch.ball_x, float(key, value)?),
                "ball_y" => set(&mut patch.ball_y, float(key, value)?),
                "ball_dx" => set(&mut patch.ball_dx, float(key, value)?),
                "ball_dy" => set(&mut patch.ball_dy, float(key, value)?),
                "ball_celerity" => set(&mut patch.ball_speed, float(key, value)?),
                "game_score_0" => set(&mut patch.score[0], small_int(key, value)?),
                "game_score_1" => set(&mut patch.score[1], small_int(key, value)?),
                "game_winner" => set(&mut patch.winner, optional_side(key, value)?),
                "game_frozen" => set(&mut patch.frozen, boolean(key, value)?),
                "game_paused" => set(&mut patch.paused, boolean(key, value)?),
                "game_ended" => set(&mut patch.ended, boolean(key, value)?),
                "game_next_round" => set(&mut patch.next_round, boolean(key, value)?),
                "game_countdown" => set(&mut patch.countdown, optional_int(key, value)?),
                _ => patch.parse_paddle(key, value, side_slots)?,
            };
            if known {
                patch.applied += 1;
            }
        }

        Ok(patch)
    }

    fn parse_paddle(
        &mut self,
        key: &str,
        value: &Value,
        side_slots: [u8; 2],
    ) -> Result<bool, CodecError> {
        let side = if let Some(rest) = key.strip_prefix("paddle_") {
            rest.strip_suffix("_y")
                .or_else(|| rest.strip_suffix("_x"))
                .and_then(|index| index.parse::<u8>().ok())
                .and_then(Side::from_index)
        } else if let Some(rest) = key.strip_prefix("player_") {
            rest.strip_suffix("_y")
                .or_else(|| rest.strip_suffix("_x"))
                .and_then(|slot| slot.parse::<u8>().ok())
                .and_then(|slot| Side::BOTH.into_iter().find(|s| side_slots[s.index() as usize] == slot))
        } else {
            None
        };

        let Some(side) = side else {
            return Ok(false);
        };
        let y = float(key, value)?;
        if key.ends_with("_y") {
            self.paddle_y[side.index() as usize] = Some(y);
        }
        Ok(true)
    }

    fn apply(self, kinematics: &mut Kinematics, machine: &mut RoundMachine) -> usize {
        let config = kinematics.config();
        let trail_length = config.ball_trail_length;
        let (speed_min, speed_max) = (config.ball_speed_min, config.ball_speed_max);
        let ball_changed = self.ball_x.is_some()
            || self.ball_y.is_some()
            || self.ball_dx.is_some()
            || self.ball_dy.is_some()
            || self.ball_speed.is_some();
        if ball_changed {
            kinematics.with_ball_mut(|ball| {
                let pos = Vec2::new(
                    self.ball_x.unwrap_or(ball.pos.x),
                    self.ball_y.unwrap_or(ball.pos.y),
                );
                if pos != ball.pos {
                    ball.pos = pos;
                    ball.prev = pos;
                    ball.push_trail(trail_length);
                }
                let dir = Vec2::new(
                    self.ball_dx.unwrap_or(ball.dir.x),
                    self.ball_dy.unwrap_or(ball.dir.y),
                );
                ball.dir = dir.try_normalize().unwrap_or(ball.dir);
                if let Some(speed) = self.ball_speed {
                    ball.speed = speed.clamp(speed_min, speed_max);
                }
            });
        }

        for side in Side::BOTH {
            if let Some(y) = self.paddle_y[side.index() as usize] {
                let y = kinematics.config().clamp_paddle_y(y);
                kinematics.with_paddle_mut(side, |paddle| paddle.y = y);
            }
        }

        let round = machine.round_mut();
        for side in Side::BOTH {
            if let Some(score) = self.score[side.index() as usize] {
                round.score.set(side, score);
            }
        }
        if let Some(winner) = self.winner {
            round.winner = winner.or(round.winner);
        }
        if let Some(frozen) = self.frozen {
            round.frozen = frozen;
        }
        if let Some(paused) = self.paused {
            round.paused = paused;
        }
        if let Some(ended) = self.ended {
            round.ended |= ended;
        }
        if let Some(next_round) = self.next_round {
            round.next_round = next_round;
        }
        if let Some(countdown) = self.countdown {
            round.countdown = countdown;
        }

        self.applied
    }
}

fn set<T>(slot: &mut Option<T>, value: T) -> bool {
    *slot = Some(value);
    true
}

fn wrong_type(key: &str, expected: &'static str, value: &Value) -> CodecError {
    CodecError::WrongType {
        key: key.to_string(),
        expected,
        found: value.kind(),
    }
}

fn float(key: &str, value: &Value) -> Result<f32, CodecError> {
    let v = value.as_f64().ok_or_else(|| wrong_type(key, "float", value))?;
    if !v.is_finite() {
        return Err(CodecError::OutOfRange { key: key.to_string() });
    }
    Ok(v as f32)
}

fn boolean(key: &str, value: &Value) -> Result<bool, CodecError> {
    value.as_bool().ok_or_else(|| wrong_type(key, "bool", value))
}

fn small_int(key: &str, value: &Value) -> Result<u8, CodecError> {
    let v = value.as_i64().ok_or_else(|| wrong_type(key, "int", value))?;
    u8::try_from(v).map_err(|_| CodecError::OutOfRange { key: key.to_string() })
}

fn optional_int(key: &str, value: &Value) -> Result<Option<u8>, CodecError> {
    if value.is_nil() {
        return Ok(None);
    }
    small_int(key, value).map(Some)
}

fn optional_side(key: &str, value: &Value) -> Result<Option<Side>, CodecError> {
    match optional_int(key, value)? {
        None => Ok(None),
        Some(index) => Side::from_index(index)
            .map(Some)
            .ok_or_else(|| CodecError::OutOfRange { key: key.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn setup() -> (Kinematics, RoundMachine) {
        let kinematics = Kinematics::new(Config::new(), 7, Side::Left);
        let machine = RoundMachine::new(kinematics.config(), kinematics.side_slots());
        (kinematics, machine)
    }

    #[test]
    fn test_filter_matching() {
        assert!(matches_filter("ball_x", &["ball"]));
        assert!(matches_filter("game", &["game"]));
        assert!(matches_filter("paddle_0_y", &["paddle_0"]));
        assert!(!matches_filter("paddle_0_y", &["paddle_1"]));
        assert!(!matches_filter("balloon", &["ball"]));
        assert!(!matches_filter("ball_x", &[]));
    }

    #[test]
    fn test_empty_filter_encodes_nothing() {
        let (kin, machine) = setup();
        assert!(to_dict(&kin, &machine, &[]).is_empty());
    }

    #[test]
    fn test_encode_ball_and_game() {
        let (kin, machine) = setup();
        let msg = to_dict(&kin, &machine, &["ball", "game"]);

        assert!(msg.contains_key("ball_celerity"));
        assert!(msg.contains_key("game_score_0"));
        assert!(msg.keys().all(|k| k.starts_with("ball_") || k.starts_with("game_")));
        assert_eq!(msg.get("game_winner"), Some(&Value::Nil));
        assert_eq!(msg.get("game_frozen"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_encode_paddle_by_side_and_slot() {
        let kin = Kinematics::new(Config::new(), 7, Side::Right);
        let machine = RoundMachine::new(kin.config(), kin.side_slots());
        let msg = to_dict(&kin, &machine, &["paddle_1", "player_2"]);

        assert_eq!(msg.get("paddle_1_x").and_then(Value::as_f64), Some(1390.0));
        assert_eq!(msg.get("player_2_x").and_then(Value::as_f64), Some(50.0), "Player 2 on the left");
        assert_eq!(msg.len(), 4);
    }

    #[test]
    fn test_full_round_trip_into_fresh_state() {
        let (mut src_kin, mut src_machine) = setup();
        src_machine.begin_round();
        src_machine.unfreeze();
        for _ in 0..30 {
            src_kin.push_input(1, 1);
            src_kin.step(1.0 / 60.0);
        }
        src_machine.on_goal(Side::Right);

        let msg = to_dict(&src_kin, &src_machine, &["ball", "paddle", "game"]);

        let (mut dst_kin, mut dst_machine) = setup();
        let applied = from_dict(&mut dst_kin, &mut dst_machine, &msg, &["ball", "paddle", "game"]).unwrap();
        assert!(applied > 0);

        let (a, b) = (src_kin.ball().unwrap(), dst_kin.ball().unwrap());
        assert!((a.pos - b.pos).length() < 1e-3);
        assert!((a.dir - b.dir).length() < 1e-5);
        assert!((a.speed - b.speed).abs() < 1e-3);
        for side in Side::BOTH {
            assert_eq!(src_kin.paddle(side).unwrap().y, dst_kin.paddle(side).unwrap().y);
        }
        assert_eq!(src_machine.round(), dst_machine.round());
    }

    #[test]
    fn test_decode_leaves_unselected_fields() {
        let (mut src_kin, src_machine) = setup();
        src_kin.push_input(1, -1);
        src_kin.push_input(2, 1);
        src_kin.step(0.1);
        let msg = to_dict(&src_kin, &src_machine, &["ball", "paddle", "game"]);

        let (mut dst_kin, mut dst_machine) = setup();
        let before_left = dst_kin.paddle(Side::Left).unwrap().y;
        let before_right = dst_kin.paddle(Side::Right).unwrap().y;

        from_dict(&mut dst_kin, &mut dst_machine, &msg, &["ball", "game"]).unwrap();

        assert_eq!(dst_kin.ball().unwrap().pos, src_kin.ball().unwrap().pos);
        assert_eq!(dst_kin.paddle(Side::Left).unwrap().y, before_left, "Paddle not selected");
        assert_eq!(dst_kin.paddle(Side::Right).unwrap().y, before_right, "Paddle not selected");
    }

    #[test]
    fn test_absent_keys_keep_local_values() {
        let (mut kin, mut machine) = setup();
        let speed = kin.ball().unwrap().speed;
        let msg = Message::new().with("ball_x", 100.0f32);

        let applied = from_dict(&mut kin, &mut machine, &msg, &["ball"]).unwrap();
        assert_eq!(applied, 1);
        let ball = kin.ball().unwrap();
        assert_eq!(ball.pos.x, 100.0);
        assert_eq!(ball.pos.y, 540.0);
        assert_eq!(ball.speed, speed, "Speed was not sent");
    }

    #[test]
    fn test_wrong_type_applies_nothing() {
        let (mut kin, mut machine) = setup();
        let msg = Message::new()
            .with("ball_x", 100.0f32)
            .with("game_paused", 1.0f32);

        let err = from_dict(&mut kin, &mut machine, &msg, &["ball", "game"]).unwrap_err();
        assert!(matches!(err, CodecError::WrongType { ref key, .. } if key == "game_paused"));
        assert_eq!(kin.ball().unwrap().pos.x, 720.0, "Nothing applied");
    }

    #[test]
    fn test_ended_is_monotonic() {
        let (mut kin, mut machine) = setup();
        let ended = Message::new().with("game_ended", true).with("game_winner", 1u8);
        from_dict(&mut kin, &mut machine, &ended, &["game"]).unwrap();
        assert!(machine.round().ended);
        assert_eq!(machine.round().winner, Some(Side::Right));

        let reverted = Message::new().with("game_ended", false).with("game_winner", Value::Nil);
        from_dict(&mut kin, &mut machine, &reverted, &["game"]).unwrap();
        assert!(machine.round().ended, "ended never reverts");
        assert_eq!(machine.round().winner, Some(Side::Right));
    }

    #[test]
    fn test_player_keys_resolve_to_sides() {
        let kin = Kinematics::new(Config::new(), 7, Side::Right);
        let mut machine = RoundMachine::new(kin.config(), kin.side_slots());
        let mut kin = kin;
        let msg = Message::new().with("player_1_y", 200.0f32);

        from_dict(&mut kin, &mut machine, &msg, &["player_1"]).unwrap();
        assert_eq!(kin.paddle(Side::Right).unwrap().y, 200.0);
        assert_eq!(kin.paddle(Side::Left).unwrap().y, 540.0);
    }

    #[test]
    fn test_paddle_y_is_clamped() {
        let (mut kin, mut machine) = setup();
        let msg = Message::new().with("paddle_0_y", -500.0f32);
        from_dict(&mut kin, &mut machine, &msg, &["paddle_0"]).unwrap();
        assert_eq!(kin.paddle(Side::Left).unwrap().y, 60.0);
    }

    #[test]
    fn test_ball_speed_is_clamped() {
        let (mut kin, mut machine) = setup();
        let msg = Message::new().with("ball_celerity", 1.0e9f32);
        from_dict(&mut kin, &mut machine, &msg, &["ball"]).unwrap();
        assert_eq!(kin.ball().unwrap().speed, kin.config().ball_speed_max);

        let msg = Message::new().with("ball_celerity", 0.0f32);
        from_dict(&mut kin, &mut machine, &msg, &["ball"]).unwrap();
        assert_eq!(kin.ball().unwrap().speed, kin.config().ball_speed_min);
    }

    #[test]
    fn test_unknown_and_out_of_range() {
        let (mut kin, mut machine) = setup();
        let msg = Message::new().with("ball_spin", 3.0f32);
        assert_eq!(from_dict(&mut kin, &mut machine, &msg, &["ball"]), Ok(0));

        let msg = Message::new().with("game_score_0", -1i64);
        assert_eq!(
            from_dict(&mut kin, &mut machine, &msg, &["game"]),
            Err(CodecError::OutOfRange { key: "game_score_0".into() })
        );
    }
}
