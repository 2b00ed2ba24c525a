//! Round and match lifecycle.
//!
//! Entering -> CountingDown -> Playing -> {Paused | RoundEnded | MatchEnded}.
//! A finished round goes back through Entering once the caller has reset the
//! kinematics; a finished match stays finished.
//!
//! Under [`MatchRule::Wall`] there is a single round: every bounce off the far
//! wall scores for player 1, and the ball getting past player 1 ends the match.

use crate::{Config, MatchRule, Score, Side};

/// Lifecycle phase derived from the round flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Entering,
    CountingDown,
    Playing,
    Paused,
    Frozen,
    RoundEnded,
    MatchEnded,
}

/// Score and flags of the match in progress
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub score: Score,
    pub score_limit: u8,
    pub winner: Option<Side>,
    pub frozen: bool,
    pub paused: bool,
    pub ended: bool,
    pub next_round: bool,
    /// Countdown number on display, if one is running
    pub countdown: Option<u8>,
}

impl Round {
    pub fn new(score_limit: u8) -> Self {
        Self {
            score: Score::new(),
            score_limit: score_limit.max(1),
            winner: None,
            frozen: true,
            paused: false,
            ended: false,
            next_round: false,
            countdown: None,
        }
    }
}

/// What a goal did to the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    NextRound,
    MatchEnded { winner: Side },
}

/// Final result, handed out once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// Winning player slot
    pub winner: u8,
    pub winner_side: Side,
    pub score: Score,
}

pub struct RoundMachine {
    round: Round,
    rule: MatchRule,
    side_slots: [u8; 2],
    /// Frozen from outside; outlasts the countdown
    held: bool,
    countdown: Vec<u8>,
    countdown_step: f32,
    countdown_index: usize,
    countdown_timer: f32,
    entering: bool,
    result_taken: bool,
}

impl RoundMachine {
    /// `side_slots[side]` is the player slot playing on that side
    pub fn new(config: &Config, side_slots: [u8; 2]) -> Self {
        Self {
            round: Round::new(config.score_limit),
            rule: config.match_rule,
            side_slots,
            held: false,
            countdown: config.countdown.clone(),
            countdown_step: config.countdown_step,
            countdown_index: 0,
            countdown_timer: 0.0,
            entering: true,
            result_taken: false,
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub(crate) fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    pub fn side_slots(&self) -> [u8; 2] {
        self.side_slots
    }

    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Side player 1 plays on
    fn p1_side(&self) -> Side {
        if self.side_slots[Side::Right.index() as usize] == 1 {
            Side::Right
        } else {
            Side::Left
        }
    }

    pub fn phase(&self) -> RoundPhase {
        let round = &self.round;
        if round.ended {
            RoundPhase::MatchEnded
        } else if round.next_round {
            RoundPhase::RoundEnded
        } else if self.entering {
            RoundPhase::Entering
        } else if round.countdown.is_some() {
            RoundPhase::CountingDown
        } else if round.paused {
            RoundPhase::Paused
        } else if round.frozen {
            RoundPhase::Frozen
        } else {
            RoundPhase::Playing
        }
    }

    /// Whether the kinematics engine may step this tick
    pub fn is_simulating(&self) -> bool {
        self.phase() == RoundPhase::Playing
    }

    pub fn countdown_value(&self) -> Option<u8> {
        self.round.countdown
    }

    /// Start a round once the ball and paddles are in place
    pub fn begin_round(&mut self) {
        if self.round.ended {
            return;
        }
        self.entering = false;
        self.round.next_round = false;
        self.round.frozen = true;
        self.countdown_index = 0;
        self.countdown_timer = 0.0;
        self.round.countdown = self.countdown.first().copied();
        if self.round.countdown.is_none() {
            self.round.frozen = self.held;
        }
        log::debug!("round: begin, score {:?}", self.round.score);
    }

    /// Advance the countdown; nothing moves while paused
    pub fn tick(&mut self, dt: f32) {
        if self.round.ended || self.round.paused || self.round.countdown.is_none() {
            return;
        }
        if self.countdown_step <= 0.0 {
            self.finish_countdown();
            return;
        }

        self.countdown_timer += dt.max(0.0);
        while self.countdown_timer >= self.countdown_step {
            self.countdown_timer -= self.countdown_step;
            self.countdown_index += 1;
            match self.countdown.get(self.countdown_index) {
                Some(&value) => self.round.countdown = Some(value),
                None => {
                    self.finish_countdown();
                    return;
                }
            }
        }
    }

    fn finish_countdown(&mut self) {
        self.round.countdown = None;
        self.round.frozen = self.held;
        self.countdown_timer = 0.0;
    }

    /// Credit the side opposite to `side_lost`.
    ///
    /// Ignored outside play, so a repeated trigger for the same goal is a
    /// no-op.
    pub fn on_goal(&mut self, side_lost: Side) -> Option<GoalOutcome> {
        if self.round.ended || self.round.next_round || self.entering {
            return None;
        }
        if self.rule == MatchRule::Wall {
            return self.on_wall_goal(side_lost);
        }

        let scorer = side_lost.opposite();
        self.round.score.increment(scorer);

        if let Some(winner) = self.round.score.has_winner(self.round.score_limit) {
            Some(self.end_match(winner))
        } else {
            self.round.next_round = true;
            log::debug!("round: goal for {:?}, score {:?}", scorer, self.round.score);
            Some(GoalOutcome::NextRound)
        }
    }

    fn on_wall_goal(&mut self, side_lost: Side) -> Option<GoalOutcome> {
        let player = self.p1_side();
        if side_lost != player {
            return None;
        }
        Some(self.end_match(player))
    }

    /// Score a bounce off the far wall; only counts under the wall rule
    pub fn on_back_wall(&mut self) -> bool {
        if self.rule != MatchRule::Wall || !self.is_simulating() {
            return false;
        }
        self.round.score.increment(self.p1_side());
        true
    }

    fn end_match(&mut self, winner: Side) -> GoalOutcome {
        self.round.winner = Some(winner);
        self.round.ended = true;
        log::info!(
            "round: match ended, {:?} wins {}-{}",
            winner,
            self.round.score.left,
            self.round.score.right
        );
        GoalOutcome::MatchEnded { winner }
    }

    pub fn pause(&mut self) {
        if !self.round.ended {
            self.round.paused = true;
        }
    }

    pub fn unpause(&mut self) {
        if !self.round.ended {
            self.round.paused = false;
        }
    }

    /// Hold the round still until `unfreeze`, even past the countdown
    pub fn freeze(&mut self) {
        self.held = true;
        self.round.frozen = true;
    }

    /// Lift the freeze, cutting any running countdown short
    pub fn unfreeze(&mut self) {
        self.held = false;
        self.round.countdown = None;
        self.round.frozen = false;
    }

    /// Player slot of the winner, once the match is over
    pub fn winner_slot(&self) -> Option<u8> {
        self.round
            .winner
            .map(|side| self.side_slots[side.index() as usize])
    }

    /// The match result, returned exactly once after the match ends
    pub fn take_result(&mut self) -> Option<MatchResult> {
        if !self.round.ended || self.result_taken {
            return None;
        }
        let winner_side = self.round.winner?;
        self.result_taken = true;
        Some(MatchResult {
            winner: self.side_slots[winner_side.index() as usize],
            winner_side,
            score: self.round.score,
        })
    }
}
