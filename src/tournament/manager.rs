//! Tournament controller: the lifecycle state machine.
//!
//! The controller owns the player and match collections and dispatches to
//! the pairing generators and the bracket router according to its format
//! and status. Every operation validates fully before mutating, so an
//! error always leaves the tournament in its prior state.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::constants::{MIN_BRACKET_PLAYERS, MIN_SWISS_PLAYERS};
use crate::ids::{AlphanumericIds, IdSource};
use crate::pairing::{bracket, round_robin, swiss};
use crate::standings;

use super::models::{
    Cut, Format, LateEntry, Match, MatchId, MatchScore, Outcome, Player, PlayerId, Playoffs,
    ResultEntry, Sorting, Status, TournamentConfig,
};

/// Tournament errors, raised before any state is mutated.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("player limit reached")]
    PlayerLimitReached,

    #[error("{operation} is not allowed while the tournament is {status}")]
    InvalidStatus {
        operation: &'static str,
        status: Status,
    },

    #[error("the current round still has active matches")]
    RoundStillOpen,

    #[error("need at least {needed} players, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },

    #[error("late additions are only allowed in active swiss events")]
    LateEntryClosed,

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("duplicate player id: {0}")]
    DuplicatePlayer(PlayerId),

    #[error("unknown match: {0}")]
    UnknownMatch(MatchId),

    #[error("elimination results cannot be drawn")]
    DrawnEliminationResult,

    #[error("a result needs at least one game: {0}")]
    EmptyResult(MatchId),

    #[error("match {0} has no result to erase")]
    MatchStillActive(MatchId),

    #[error("byes cannot be reported or erased: {0}")]
    CannotReportBye(MatchId),

    #[error("downstream match {0} already has a result")]
    DownstreamReported(MatchId),

    #[error("bracket routing invariant violated: {0}")]
    RoutingViolation(&'static str),
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// A tournament and its full mutable state.
///
/// Strictly single-threaded and synchronous: operations never suspend and
/// are atomic from the caller's viewpoint. Matches and players reference
/// one another by id only.
pub struct Tournament {
    pub(crate) config: TournamentConfig,
    pub(crate) players: Vec<Player>,
    pub(crate) matches: Vec<Match>,
    pub(crate) current_round: u32,
    pub(crate) scheduled_rounds: u32,
    pub(crate) status: Status,
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) ids: Box<dyn IdSource>,
}

impl fmt::Debug for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tournament")
            .field("config", &self.config)
            .field("players", &self.players)
            .field("matches", &self.matches)
            .field("current_round", &self.current_round)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Tournament {
    #[must_use]
    pub fn new(config: TournamentConfig) -> Self {
        Self::with_id_source(config, Box::new(AlphanumericIds::default()))
    }

    /// Create a tournament with a host-supplied id source.
    #[must_use]
    pub fn with_id_source(config: TournamentConfig, ids: Box<dyn IdSource>) -> Self {
        Self {
            config,
            players: Vec::new(),
            matches: Vec::new(),
            current_round: 0,
            scheduled_rounds: 0,
            status: Status::Registration,
            start_time: None,
            ids,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Scheduled rounds for Swiss and round-robin events; 0 before start.
    #[must_use]
    pub fn scheduled_rounds(&self) -> u32 {
        self.scheduled_rounds
    }

    #[must_use]
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: &str) -> TournamentResult<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TournamentError::UnknownPlayer(id.to_string()))
    }

    pub(crate) fn match_index(&self, id: &str) -> TournamentResult<usize> {
        self.matches
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| TournamentError::UnknownMatch(id.to_string()))
    }

    /// A fresh match id, regenerated until unique within this tournament.
    pub(crate) fn fresh_match_id(&mut self) -> MatchId {
        loop {
            let id = self.ids.next_id();
            let taken = self.matches.iter().any(|m| m.id == id)
                || self.players.iter().any(|p| p.id == id);
            if !taken {
                return id;
            }
        }
    }

    /// Register a player under a generated id. Returns the new id.
    pub fn register(&mut self, alias: &str) -> TournamentResult<PlayerId> {
        let id = loop {
            let id = self.ids.next_id();
            if self.player(&id).is_none() && !self.matches.iter().any(|m| m.id == id) {
                break id;
            }
        };
        self.add_player(Player::new(&id, alias))?;
        Ok(id)
    }

    /// Add a fully-formed player (host-supplied id, seed, initial byes).
    ///
    /// Rejected when the player limit is reached, the id collides, or the
    /// tournament has moved past the point where entries are possible.
    /// After start, only active Swiss events accept additions; the late
    /// player receives a catch-up entry per played round.
    pub fn add_player(&mut self, player: Player) -> TournamentResult<()> {
        match self.status {
            Status::Registration | Status::Active => {}
            status => {
                return Err(TournamentError::InvalidStatus {
                    operation: "add player",
                    status,
                })
            }
        }
        if self.status == Status::Active && self.config.format != Format::Swiss {
            return Err(TournamentError::LateEntryClosed);
        }
        if self.config.player_limit > 0 && self.players.len() >= self.config.player_limit {
            return Err(TournamentError::PlayerLimitReached);
        }
        if self.player(&player.id).is_some() {
            return Err(TournamentError::DuplicatePlayer(player.id));
        }

        let id = player.id.clone();
        self.players.push(player);

        if self.status == Status::Active {
            self.settle_late_entry(&id)?;
        }
        Ok(())
    }

    /// Record one catch-up entry per already-played round for a late
    /// Swiss addition.
    fn settle_late_entry(&mut self, player_id: &str) -> TournamentResult<()> {
        let mode = self.config.late_entry;
        for round in 1..=self.current_round {
            match mode {
                LateEntry::Byes => self.create_bye(round, player_id, Outcome::Bye, false)?,
                LateEntry::Losses => self.create_bye(round, player_id, Outcome::Loss, false)?,
            }
        }
        info!(
            "late entry {player_id} caught up through round {} as {mode:?}",
            self.current_round
        );
        Ok(())
    }

    /// Start the tournament: order players, schedule or pair the first
    /// round, and materialise its byes.
    pub fn start(&mut self) -> TournamentResult<()> {
        if self.status != Status::Registration {
            return Err(TournamentError::InvalidStatus {
                operation: "start",
                status: self.status,
            });
        }
        let needed = if self.config.format == Format::Swiss {
            MIN_SWISS_PLAYERS
        } else {
            MIN_BRACKET_PLAYERS
        };
        if self.players.len() < needed {
            return Err(TournamentError::NotEnoughPlayers {
                needed,
                have: self.players.len(),
            });
        }

        match self.config.sorting {
            Sorting::None => {}
            // Unseeded players (seed 0) sort after every seeded player.
            Sorting::Ascending => self
                .players
                .sort_by_key(|p| if p.seed == 0 { u32::MAX } else { p.seed }),
            Sorting::Descending => self.players.sort_by_key(|p| std::cmp::Reverse(p.seed)),
        }

        self.status = Status::Active;
        self.current_round = 1;
        self.start_time = Some(Utc::now());

        match self.config.format {
            Format::Swiss => {
                self.scheduled_rounds = if self.config.rounds > 0 {
                    self.config.rounds
                } else {
                    self.players.len().next_power_of_two().trailing_zeros()
                };
                self.deal_swiss_round()?;
            }
            Format::RoundRobin | Format::DoubleRoundRobin => {
                self.build_round_robin()?;
                self.activate_round(1)?;
            }
            Format::SingleElim | Format::DoubleElim => {
                let seeded: Vec<PlayerId> = self.players.iter().map(|p| p.id.clone()).collect();
                let plan = match self.config.format {
                    Format::SingleElim => {
                        bracket::single_elim(seeded.len(), self.config.consolation)
                    }
                    _ => bracket::double_elim(seeded.len()),
                };
                self.instantiate_bracket(&plan, &seeded, 0)?;
            }
        }

        info!(
            "tournament started: {} with {} players",
            self.config.format,
            self.players.len()
        );
        Ok(())
    }

    /// Advance a Swiss or round-robin event to its next round, its playoff
    /// stage, or completion.
    pub fn next_round(&mut self) -> TournamentResult<()> {
        if self.status != Status::Active || self.config.format.is_elimination() {
            return Err(TournamentError::InvalidStatus {
                operation: "next round",
                status: self.status,
            });
        }
        if self.matches.iter().any(|m| m.active) {
            return Err(TournamentError::RoundStillOpen);
        }

        if self.current_round < self.scheduled_rounds {
            self.current_round += 1;
            match self.config.format {
                Format::Swiss => self.deal_swiss_round()?,
                _ => self.activate_round(self.current_round)?,
            }
            return Ok(());
        }

        if self.config.playoffs == Playoffs::None {
            self.status = Status::Finished;
            info!("tournament finished after round {}", self.current_round);
        } else {
            self.enter_playoffs()?;
        }
        Ok(())
    }

    /// Apply the configured cut and seed the playoff bracket from the
    /// final standings.
    fn enter_playoffs(&mut self) -> TournamentResult<()> {
        let order = self.standings_order();
        let qualified: Vec<PlayerId> = match self.config.cut {
            Cut::None => order
                .into_iter()
                .filter(|id| self.player(id).is_some_and(|p| p.active))
                .collect(),
            Cut::Rank(limit) => order
                .into_iter()
                .filter(|id| self.player(id).is_some_and(|p| p.active))
                .take(limit)
                .collect(),
            Cut::Points(threshold) => order
                .into_iter()
                .filter(|id| {
                    self.player(id)
                        .is_some_and(|p| p.active && p.match_points >= threshold)
                })
                .collect(),
        };

        if qualified.len() < 2 {
            warn!("cut left {} players; finishing instead", qualified.len());
            self.status = Status::Finished;
            return Ok(());
        }

        for player in &mut self.players {
            if !qualified.contains(&player.id) {
                player.active = false;
            }
        }

        let plan = match self.config.playoffs {
            Playoffs::SingleElim => bracket::single_elim(qualified.len(), self.config.consolation),
            Playoffs::DoubleElim => bracket::double_elim(qualified.len()),
            Playoffs::None => unreachable!("guarded by caller"),
        };
        self.instantiate_bracket(&plan, &qualified, self.current_round)?;
        self.status = Status::Playoffs;
        info!("playoffs started with {} players", qualified.len());
        Ok(())
    }

    /// Report a match result, replacing any previously recorded one.
    ///
    /// Swiss and round-robin matches take the full `(wins, wins, draws)`
    /// triple; elimination and playoff matches require a decisive
    /// `(wins, wins)` pair (pass `draws = 0`).
    pub fn report_result(
        &mut self,
        match_id: &str,
        player_one_wins: u32,
        player_two_wins: u32,
        draws: u32,
    ) -> TournamentResult<()> {
        match self.status {
            Status::Active | Status::Playoffs => {}
            status => {
                return Err(TournamentError::InvalidStatus {
                    operation: "report result",
                    status,
                })
            }
        }

        let idx = self.match_index(match_id)?;
        {
            let m = &self.matches[idx];
            if m.player_one.is_none() || m.player_two.is_none() {
                return Err(TournamentError::CannotReportBye(m.id.clone()));
            }
        }
        if player_one_wins + player_two_wins + draws == 0 {
            return Err(TournamentError::EmptyResult(match_id.to_string()));
        }
        let elimination = self.is_elimination_match(idx);
        if elimination && player_one_wins == player_two_wins {
            return Err(TournamentError::DrawnEliminationResult);
        }

        if self.matches[idx].is_reported() {
            self.erase_result(match_id)?;
        }

        let score = MatchScore::new(player_one_wins, player_two_wins, draws);
        self.apply_result(idx, score)?;
        if elimination {
            self.route_after_result(idx)?;
        }
        Ok(())
    }

    /// Whether result dispatch for this match follows the elimination path.
    /// Playoff matches are the ones created past the scheduled rounds.
    fn is_elimination_match(&self, idx: usize) -> bool {
        self.config.format.is_elimination()
            || (self.config.playoffs != Playoffs::None
                && self.matches[idx].round > self.scheduled_rounds)
    }

    /// Write the score and both players' history entries.
    pub(crate) fn apply_result(&mut self, idx: usize, score: MatchScore) -> TournamentResult<()> {
        let (match_id, round, one, two) = {
            let m = &self.matches[idx];
            (
                m.id.clone(),
                m.round,
                m.player_one.clone().ok_or(TournamentError::RoutingViolation(
                    "result applied to unfilled match",
                ))?,
                m.player_two.clone().ok_or(TournamentError::RoutingViolation(
                    "result applied to unfilled match",
                ))?,
            )
        };

        let m = &mut self.matches[idx];
        m.result = score;
        m.active = false;

        let entry_one = self.result_entry(
            &match_id,
            round,
            &two,
            score.player_one_wins,
            score.player_two_wins,
            score.draws,
        );
        self.player_mut(&one)?.record(entry_one);
        let entry_two = self.result_entry(
            &match_id,
            round,
            &one,
            score.player_two_wins,
            score.player_one_wins,
            score.draws,
        );
        self.player_mut(&two)?.record(entry_two);
        Ok(())
    }

    fn result_entry(
        &self,
        match_id: &str,
        round: u32,
        opponent: &str,
        wins: u32,
        losses: u32,
        draws: u32,
    ) -> ResultEntry {
        let outcome = match wins.cmp(&losses) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        };
        let match_points = match outcome {
            Outcome::Win => self.config.points_for_win,
            Outcome::Draw => self.config.points_for_draw,
            _ => 0.0,
        };
        ResultEntry {
            match_id: match_id.to_string(),
            round,
            opponent: Some(opponent.to_string()),
            outcome,
            match_points,
            game_points: f64::from(wins) * self.config.points_for_win
                + f64::from(draws) * self.config.points_for_draw,
            games: wins + losses + draws,
        }
    }

    /// Retract a reported result, restoring both players' records and
    /// (in elimination) pulling both participants back out of the matches
    /// they were advanced into.
    pub fn erase_result(&mut self, match_id: &str) -> TournamentResult<()> {
        let idx = self.match_index(match_id)?;
        {
            let m = &self.matches[idx];
            if m.player_one.is_none() || m.player_two.is_none() {
                return Err(TournamentError::CannotReportBye(m.id.clone()));
            }
            if !m.is_reported() {
                return Err(TournamentError::MatchStillActive(m.id.clone()));
            }
        }

        let elimination = self.is_elimination_match(idx);
        if elimination {
            self.pull_back(idx)?;
        }

        let (one, two) = {
            let m = &self.matches[idx];
            let one = m.player_one.clone().ok_or(TournamentError::RoutingViolation(
                "erase on a match without players",
            ))?;
            let two = m.player_two.clone().ok_or(TournamentError::RoutingViolation(
                "erase on a match without players",
            ))?;
            (one, two)
        };
        self.player_mut(&one)?.unrecord(match_id);
        self.player_mut(&two)?.unrecord(match_id);

        let m = &mut self.matches[idx];
        m.result = MatchScore::default();
        m.active = true;

        // Retracting the terminal result reopens the tournament.
        if elimination && self.status == Status::Finished {
            self.status = if self.config.format.is_elimination() {
                Status::Active
            } else {
                Status::Playoffs
            };
        }
        Ok(())
    }

    /// Remove a player, forfeiting or rewiring as the format requires.
    pub fn remove_player(&mut self, player_id: &str) -> TournamentResult<()> {
        self.player_mut(player_id)?;

        match self.status {
            Status::Registration => {
                self.players.retain(|p| p.id != player_id);
                Ok(())
            }
            Status::Active if !self.config.format.is_elimination() => {
                self.withdraw_standard(player_id)
            }
            Status::Active | Status::Playoffs => self.withdraw_from_bracket(player_id),
            status => Err(TournamentError::InvalidStatus {
                operation: "remove player",
                status,
            }),
        }
    }

    /// Swiss and round-robin withdrawal: forfeit the current match and
    /// stop pairing the player.
    fn withdraw_standard(&mut self, player_id: &str) -> TournamentResult<()> {
        if let Some(idx) = self
            .matches
            .iter()
            .position(|m| m.active && m.contains(player_id))
        {
            let fw = self.config.forfeit_wins();
            let score = if self.matches[idx].player_one.as_deref() == Some(player_id) {
                MatchScore::new(0, fw, 0)
            } else {
                MatchScore::new(fw, 0, 0)
            };
            self.apply_result(idx, score)?;
        }

        if self.config.format == Format::DoubleRoundRobin {
            let round = self.current_round;
            for m in &mut self.matches {
                if m.round > round && !m.is_reported() {
                    m.clear_slot(player_id);
                }
            }
        }

        self.player_mut(player_id)?.active = false;
        info!("player {player_id} withdrew");
        Ok(())
    }

    /// Abort the tournament from any non-terminal state.
    pub fn abort(&mut self) -> TournamentResult<()> {
        match self.status {
            Status::Aborted | Status::Finished => Err(TournamentError::InvalidStatus {
                operation: "abort",
                status: self.status,
            }),
            _ => {
                self.status = Status::Aborted;
                warn!("tournament aborted in round {}", self.current_round);
                Ok(())
            }
        }
    }

    /// Recompute tiebreakers and return the ordered standings.
    pub fn standings(&mut self, active_only: bool) -> Vec<Player> {
        let order = self.standings_order();
        order
            .into_iter()
            .filter_map(|id| self.player(&id).cloned())
            .filter(|p| !active_only || p.active)
            .collect()
    }

    fn standings_order(&mut self) -> Vec<PlayerId> {
        standings::compute(&mut self.players, self.config.points_for_win);
        standings::sort(&self.players, &self.config.tiebreaks)
    }

    /// Pair and create the current Swiss round.
    fn deal_swiss_round(&mut self) -> TournamentResult<()> {
        let round = self.current_round;
        let order = self.standings_order();
        let ranked: Vec<&Player> = order
            .iter()
            .filter_map(|id| self.players.iter().find(|p| &p.id == id))
            .filter(|p| p.active)
            .collect();
        let plan = swiss::pair_round(&ranked, round);

        let mut number = 1;
        for (one, two) in &plan.pairs {
            let id = self.fresh_match_id();
            let mut m = Match::new(&id, round, number);
            m.player_one = Some(one.clone());
            m.player_two = Some(two.clone());
            m.active = true;
            self.matches.push(m);
            number += 1;
        }
        if let Some(bye) = &plan.bye {
            self.create_bye(round, bye, Outcome::Bye, true)?;
        }
        for player in &plan.initial_byes {
            self.create_bye(round, player, Outcome::Bye, false)?;
        }
        Ok(())
    }

    /// Create and immediately materialise a bye-shaped match.
    ///
    /// `Outcome::Bye` awards the forfeit score and win points;
    /// `Outcome::Loss` is the catch-up variant that counts the games
    /// without awarding points. Only genuine pairing byes consume the
    /// player's once-per-event bye.
    pub(crate) fn create_bye(
        &mut self,
        round: u32,
        player_id: &str,
        outcome: Outcome,
        pairing_bye: bool,
    ) -> TournamentResult<()> {
        let fw = self.config.forfeit_wins();
        let id = self.fresh_match_id();
        let mut m = Match::new(&id, round, 0);
        m.player_one = Some(player_id.to_string());
        m.result = match outcome {
            Outcome::Loss => MatchScore::new(0, fw, 0),
            _ => MatchScore::new(fw, 0, 0),
        };
        self.matches.push(m);

        let entry = match outcome {
            Outcome::Loss => ResultEntry {
                match_id: id,
                round,
                opponent: None,
                outcome: Outcome::Loss,
                match_points: 0.0,
                game_points: 0.0,
                games: fw,
            },
            _ => ResultEntry {
                match_id: id,
                round,
                opponent: None,
                outcome: Outcome::Bye,
                match_points: self.config.points_for_win,
                game_points: f64::from(fw) * self.config.points_for_win,
                games: fw,
            },
        };
        let player = self.player_mut(player_id)?;
        player.record(entry);
        if pairing_bye {
            player.pairing_bye = true;
        }
        Ok(())
    }

    /// Create the complete round-robin schedule up front.
    fn build_round_robin(&mut self) -> TournamentResult<()> {
        let order: Vec<PlayerId> = self.players.iter().map(|p| p.id.clone()).collect();
        let double = self.config.format == Format::DoubleRoundRobin;
        let schedule = round_robin::schedule(order.len(), double);
        self.scheduled_rounds = schedule.len() as u32;

        for (round_idx, tables) in schedule.iter().enumerate() {
            let round = round_idx as u32 + 1;
            let mut number = 1;
            for &(one, two) in tables {
                let id = self.fresh_match_id();
                let mut m = Match::new(&id, round, 0);
                m.player_one = one.map(|i| order[i].clone());
                m.player_two = two.map(|i| order[i].clone());
                if m.player_one.is_some() && m.player_two.is_some() {
                    m.match_number = number;
                    number += 1;
                }
                self.matches.push(m);
            }
        }
        Ok(())
    }

    /// Activate a round-robin round and materialise its byes.
    fn activate_round(&mut self, round: u32) -> TournamentResult<()> {
        let fw = self.config.forfeit_wins();
        let points = self.config.points_for_win;
        let mut byes: Vec<(MatchId, PlayerId)> = Vec::new();

        for m in &mut self.matches {
            if m.round != round || m.is_reported() {
                continue;
            }
            if m.player_one.is_some() && m.player_two.is_some() {
                m.active = true;
            } else if let Some(player) = m.player_one.clone().or_else(|| m.player_two.clone()) {
                byes.push((m.id.clone(), player));
            }
            // Matches with both slots cleared stay as inert placeholders.
        }

        for (match_id, player_id) in byes {
            // A withdrawn player's leftover bye is not awarded.
            if !self.player(&player_id).is_some_and(|p| p.active) {
                continue;
            }
            let idx = self.match_index(&match_id)?;
            let m = &mut self.matches[idx];
            if m.player_one.is_none() {
                // Normalise schedule byes so the present player sits first.
                m.player_one = Some(player_id.clone());
                m.player_two = None;
            }
            m.result = MatchScore::new(fw, 0, 0);
            let entry = ResultEntry {
                match_id: match_id.clone(),
                round,
                opponent: None,
                outcome: Outcome::Bye,
                match_points: points,
                game_points: f64::from(fw) * points,
                games: fw,
            };
            let player = self.player_mut(&player_id)?;
            player.record(entry);
            player.pairing_bye = true;
        }
        Ok(())
    }
}
