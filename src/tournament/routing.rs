//! Elimination routing: advancement along pre-wired edges, result
//! retraction, and the edge collapse performed on withdrawal.
//!
//! Matches reference their downstream matches by id, so every rewrite here
//! is an edit to a string field. The collapse routine keeps two promises:
//! every non-terminal filled slot has a unique defined source, and no
//! match waits forever on a phantom opponent.

use log::{debug, info};

use crate::pairing::bracket::BracketPlan;

use super::manager::{Tournament, TournamentError, TournamentResult};
use super::models::{Match, MatchScore, Outcome, PlayerId, ResultEntry, Status};

impl Tournament {
    /// Turn a bracket plan into real matches, wire the routing edges, and
    /// materialise the first-round byes.
    pub(crate) fn instantiate_bracket(
        &mut self,
        plan: &BracketPlan,
        seeded: &[PlayerId],
        round_offset: u32,
    ) -> TournamentResult<()> {
        let ids: Vec<String> = (0..plan.matches.len())
            .map(|_| self.fresh_match_id())
            .collect();
        let base = self.matches.len();

        for (i, planned) in plan.matches.iter().enumerate() {
            let mut m = Match::new(&ids[i], planned.round + round_offset, planned.match_number);
            m.player_one = planned.seats[0].map(|s| seeded[s].clone());
            m.player_two = planned.seats[1].map(|s| seeded[s].clone());
            m.winners_path = planned.winners_to.map(|t| ids[t].clone());
            m.losers_path = planned.losers_to.map(|t| ids[t].clone());
            m.active = m.player_one.is_some() && m.player_two.is_some();
            self.matches.push(m);
        }

        // Only round-one nodes can carry construction byes; later rounds
        // fill one slot at a time as results come in.
        for (i, planned) in plan.matches.iter().enumerate() {
            if planned.round != 1 {
                continue;
            }
            let idx = base + i;
            if self.matches[idx].is_bye() && !self.matches[idx].is_reported() {
                self.materialize_bracket_bye(idx)?;
            }
        }
        Ok(())
    }

    /// Award a first-round bye: write the result, advance the player, and
    /// void the loser edge (a bye produces no loser).
    fn materialize_bracket_bye(&mut self, idx: usize) -> TournamentResult<()> {
        let fw = self.config.forfeit_wins();
        let (match_id, round, player_id, first_slot) = {
            let m = &self.matches[idx];
            let (player, first) = match (&m.player_one, &m.player_two) {
                (Some(p), None) => (p.clone(), true),
                (None, Some(p)) => (p.clone(), false),
                _ => {
                    return Err(TournamentError::RoutingViolation(
                        "bye materialisation on a filled match",
                    ))
                }
            };
            (m.id.clone(), m.round, player, first)
        };

        let m = &mut self.matches[idx];
        m.result = if first_slot {
            MatchScore::new(fw, 0, 0)
        } else {
            MatchScore::new(0, fw, 0)
        };
        m.active = false;
        let winners = m.winners_path.clone();
        let losers = m.losers_path.clone();

        let entry = ResultEntry {
            match_id,
            round,
            opponent: None,
            outcome: Outcome::Bye,
            match_points: self.config.points_for_win,
            game_points: f64::from(fw) * self.config.points_for_win,
            games: fw,
        };
        let player = self.player_mut(&player_id)?;
        player.record(entry);
        player.pairing_bye = true;

        if let Some(target) = winners {
            self.advance_into(&target, &player_id)?;
        }
        if let Some(target) = losers {
            let target_idx = self.match_index(&target)?;
            self.reevaluate_node(target_idx)?;
        }
        Ok(())
    }

    /// Move the winner and loser of a just-reported elimination match
    /// along their routing edges.
    pub(crate) fn route_after_result(&mut self, idx: usize) -> TournamentResult<()> {
        let (winner, loser, winners, losers) = {
            let m = &self.matches[idx];
            let one = m.player_one.clone().ok_or(TournamentError::RoutingViolation(
                "routing a match without players",
            ))?;
            let two = m.player_two.clone().ok_or(TournamentError::RoutingViolation(
                "routing a match without players",
            ))?;
            let (winner, loser) = if m.result.player_one_wins > m.result.player_two_wins {
                (one, two)
            } else {
                (two, one)
            };
            (winner, loser, m.winners_path.clone(), m.losers_path.clone())
        };

        match winners {
            Some(target) => self.advance_into(&target, &winner)?,
            None => {
                // Terminal match; the event ends once nothing is left to play.
                if !self.matches.iter().any(|m| m.active) {
                    self.status = Status::Finished;
                    info!("tournament finished");
                }
            }
        }
        match losers {
            Some(target) => self.advance_into(&target, &loser)?,
            None => self.player_mut(&loser)?.active = false,
        }
        Ok(())
    }

    /// Fill the next empty slot of a downstream match, activating it once
    /// both participants have arrived.
    fn advance_into(&mut self, target_id: &str, player_id: &str) -> TournamentResult<()> {
        let idx = self.match_index(target_id)?;
        let m = &mut self.matches[idx];
        if !m.fill_slot(player_id) {
            return Err(TournamentError::RoutingViolation(
                "advanced a player into a full match",
            ));
        }
        if m.player_one.is_some() && m.player_two.is_some() {
            m.active = true;
        }
        Ok(())
    }

    /// Undo the advancement performed when this match was reported: pull
    /// both participants back out of the pending matches they moved into
    /// and reactivate them.
    ///
    /// Refused once either participant has a reported result further down
    /// the bracket.
    pub(crate) fn pull_back(&mut self, idx: usize) -> TournamentResult<()> {
        let (winner, loser, round) = {
            let m = &self.matches[idx];
            let one = m.player_one.clone().ok_or(TournamentError::RoutingViolation(
                "pull-back on a match without players",
            ))?;
            let two = m.player_two.clone().ok_or(TournamentError::RoutingViolation(
                "pull-back on a match without players",
            ))?;
            if m.result.player_one_wins > m.result.player_two_wins {
                (one, two, m.round)
            } else {
                (two, one, m.round)
            }
        };

        for player_id in [&winner, &loser] {
            let player = self
                .player(player_id)
                .ok_or_else(|| TournamentError::UnknownPlayer(player_id.to_string()))?;
            if let Some(later) = player.results.iter().find(|r| r.round > round) {
                return Err(TournamentError::DownstreamReported(later.match_id.clone()));
            }
        }

        for player_id in [&winner, &loser] {
            for m in &mut self.matches {
                if m.round > round && !m.is_reported() && m.clear_slot(player_id) {
                    m.active = false;
                }
            }
        }
        self.player_mut(&winner)?.active = true;
        self.player_mut(&loser)?.active = true;
        Ok(())
    }

    /// Withdraw a player mid-elimination: forfeit their live match (the
    /// opponent advances normally), then vacate every slot still waiting
    /// on them and collapse the orphaned nodes.
    pub(crate) fn withdraw_from_bracket(&mut self, player_id: &str) -> TournamentResult<()> {
        let bracket_start = self.scheduled_rounds;
        if let Some(idx) = self
            .matches
            .iter()
            .position(|m| m.round > bracket_start && m.active && m.contains(player_id))
        {
            let fw = self.config.forfeit_wins();
            let score = if self.matches[idx].player_one.as_deref() == Some(player_id) {
                MatchScore::new(0, fw, 0)
            } else {
                MatchScore::new(fw, 0, 0)
            };
            self.apply_result(idx, score)?;
            self.route_after_result(idx)?;
        }

        let pending: Vec<usize> = self
            .matches
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                m.round > bracket_start && !m.is_reported() && m.contains(player_id)
            })
            .map(|(i, _)| i)
            .collect();
        for idx in pending {
            self.matches[idx].clear_slot(player_id);
            self.matches[idx].active = false;
            self.reevaluate_node(idx)?;
        }

        self.player_mut(player_id)?.active = false;
        info!("player {player_id} withdrew from the bracket");
        Ok(())
    }

    /// Re-examine a node that lost an occupant or a source.
    ///
    /// A node stays viable while occupants plus pending sources cover both
    /// slots. Below that: a lone occupant advances unopposed, a lone
    /// source is rewired straight past the node, and an unreachable node
    /// recursively voids its own outgoing edges.
    fn reevaluate_node(&mut self, idx: usize) -> TournamentResult<()> {
        if self.matches[idx].is_reported() {
            return Ok(());
        }
        let id = self.matches[idx].id.clone();
        let occupant = self.matches[idx]
            .player_one
            .clone()
            .or_else(|| self.matches[idx].player_two.clone());
        let occupant_count = [
            &self.matches[idx].player_one,
            &self.matches[idx].player_two,
        ]
        .iter()
        .filter(|s| s.is_some())
        .count();
        let sources: Vec<usize> = self
            .matches
            .iter()
            .enumerate()
            .filter(|(i, m)| {
                *i != idx
                    && !m.is_reported()
                    && (m.winners_path.as_deref() == Some(id.as_str())
                        || m.losers_path.as_deref() == Some(id.as_str()))
            })
            .map(|(i, _)| i)
            .collect();

        if occupant_count + sources.len() >= 2 {
            return Ok(());
        }

        let winners = self.matches[idx].winners_path.clone();
        let losers = self.matches[idx].losers_path.clone();

        match (occupant, sources.first().copied()) {
            (Some(player), None) => {
                debug!("collapsing {id}: {player} advances unopposed");
                self.kill_node(idx);
                match winners {
                    Some(target) => self.advance_into(&target, &player)?,
                    None => {
                        if !self.matches.iter().any(|m| m.active) {
                            self.status = Status::Finished;
                            info!("tournament finished: {player} is the last player standing");
                        }
                    }
                }
                if let Some(target) = losers {
                    let target_idx = self.match_index(&target)?;
                    self.reevaluate_node(target_idx)?;
                }
            }
            (None, Some(source_idx)) => {
                debug!("collapsing {id}: rewiring its last source past it");
                self.kill_node(idx);
                let source = &mut self.matches[source_idx];
                if source.winners_path.as_deref() == Some(id.as_str()) {
                    source.winners_path = winners.clone();
                }
                if source.losers_path.as_deref() == Some(id.as_str()) {
                    source.losers_path = winners.clone();
                }
                if let Some(target) = losers {
                    let target_idx = self.match_index(&target)?;
                    self.reevaluate_node(target_idx)?;
                }
            }
            (None, None) => {
                debug!("collapsing {id}: unreachable");
                self.kill_node(idx);
                for target in [winners, losers].into_iter().flatten() {
                    let target_idx = self.match_index(&target)?;
                    self.reevaluate_node(target_idx)?;
                }
            }
            (Some(_), Some(_)) => {}
        }
        Ok(())
    }

    /// Clear a collapsed node down to an inert placeholder.
    fn kill_node(&mut self, idx: usize) {
        let m = &mut self.matches[idx];
        m.player_one = None;
        m.player_two = None;
        m.active = false;
        m.winners_path = None;
        m.losers_path = None;
    }
}
