//! Tiebreaker computation and standings ordering.
//!
//! Nine statistics are recomputed from scratch from every player's match
//! history before each standings call; the opponent-derived percentages
//! depend on global state that shifts with every result, so incremental
//! maintenance is not attempted.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::tournament::models::{Outcome, Player, PlayerId, Tiebreak};

/// Percentage floor applied to game- and match-win rates, a convention
/// from Magic-style rulesets that dampens outliers.
const PCT_FLOOR: f64 = 1.0 / 3.0;

/// Per-player intermediates shared by the opponent-derived statistics.
struct BaseStats {
    match_win_pct: f64,
    game_win_pct: f64,
    match_points: f64,
    cumulative: f64,
    /// Contribution of byes to the running cumulative total, subtracted
    /// when this player appears as someone's opponent.
    bye_cumulative: f64,
}

/// Recompute all tiebreaker statistics into each player's `tiebreaks`.
pub fn compute(players: &mut [Player], points_for_win: f64) {
    let base: HashMap<PlayerId, BaseStats> = players
        .iter()
        .map(|p| (p.id.clone(), base_stats(p, points_for_win)))
        .collect();

    // Opponent-derived middle layer, keyed the same way.
    let mut opp_match_pcts: HashMap<PlayerId, f64> = HashMap::new();
    for player in players.iter() {
        opp_match_pcts.insert(
            player.id.clone(),
            opp_match_win_pct(player, players, points_for_win),
        );
    }

    for idx in 0..players.len() {
        let player = &players[idx];

        let opp_match = opp_match_pcts[&player.id];
        let mut opp_game = Mean::default();
        let mut opp_opp_match = Mean::default();
        let mut solkoff = 0.0;
        let mut opp_points = Vec::new();
        let mut sonneborn = 0.0;
        let mut opp_cumulative = 0.0;

        for entry in &player.results {
            let Some(opponent) = &entry.opponent else {
                continue;
            };
            let Some(stats) = base.get(opponent) else {
                continue;
            };
            opp_game.push(stats.game_win_pct);
            opp_opp_match.push(opp_match_pcts[opponent]);
            solkoff += stats.match_points;
            opp_points.push(stats.match_points);
            sonneborn += stats.match_points * outcome_weight(entry.outcome);
            opp_cumulative += stats.cumulative - stats.bye_cumulative;
        }

        let mut median_buchholz = 0.0;
        if opp_points.len() >= 2 {
            let max = opp_points.iter().copied().fold(f64::MIN, f64::max);
            let min = opp_points.iter().copied().fold(f64::MAX, f64::min);
            median_buchholz = solkoff - max - min;
        }

        let own = &base[&player.id];
        let tiebreaks = &mut players[idx].tiebreaks;
        tiebreaks.match_win_pct = own.match_win_pct;
        tiebreaks.game_win_pct = own.game_win_pct;
        tiebreaks.opp_match_win_pct = opp_match;
        tiebreaks.opp_game_win_pct = opp_game.value();
        tiebreaks.opp_opp_match_win_pct = opp_opp_match.value();
        tiebreaks.solkoff = solkoff;
        tiebreaks.median_buchholz = median_buchholz;
        tiebreaks.sonneborn_berger = sonneborn;
        tiebreaks.cumulative = own.cumulative;
        tiebreaks.opp_cumulative = opp_cumulative;
    }
}

/// Order players by match points, then the configured tiebreakers, all
/// descending, with exact ties broken pairwise by head-to-head points
/// within the tied cohort and a stable input-order fallback.
pub fn sort(players: &[Player], tiebreaks: &[Tiebreak]) -> Vec<PlayerId> {
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| compare(&players[a], &players[b], tiebreaks));

    if tiebreaks.contains(&Tiebreak::Versus) {
        resolve_versus(players, tiebreaks, &mut order);
    }

    order.into_iter().map(|i| players[i].id.clone()).collect()
}

fn compare(a: &Player, b: &Player, tiebreaks: &[Tiebreak]) -> Ordering {
    let mut ord = b.match_points.total_cmp(&a.match_points);
    for tb in tiebreaks {
        if ord != Ordering::Equal {
            break;
        }
        let (x, y) = match tb {
            Tiebreak::MatchWinPct => (a.tiebreaks.match_win_pct, b.tiebreaks.match_win_pct),
            Tiebreak::GameWinPct => (a.tiebreaks.game_win_pct, b.tiebreaks.game_win_pct),
            Tiebreak::OppMatchWinPct => {
                (a.tiebreaks.opp_match_win_pct, b.tiebreaks.opp_match_win_pct)
            }
            Tiebreak::OppGameWinPct => {
                (a.tiebreaks.opp_game_win_pct, b.tiebreaks.opp_game_win_pct)
            }
            Tiebreak::OppOppMatchWinPct => (
                a.tiebreaks.opp_opp_match_win_pct,
                b.tiebreaks.opp_opp_match_win_pct,
            ),
            Tiebreak::Solkoff => (a.tiebreaks.solkoff, b.tiebreaks.solkoff),
            Tiebreak::MedianBuchholz => {
                (a.tiebreaks.median_buchholz, b.tiebreaks.median_buchholz)
            }
            Tiebreak::SonnebornBerger => {
                (a.tiebreaks.sonneborn_berger, b.tiebreaks.sonneborn_berger)
            }
            Tiebreak::Cumulative => (a.tiebreaks.cumulative, b.tiebreaks.cumulative),
            Tiebreak::OppCumulative => (a.tiebreaks.opp_cumulative, b.tiebreaks.opp_cumulative),
            // Versus is pairwise within a tied cohort; see resolve_versus.
            Tiebreak::Versus => continue,
        };
        ord = y.total_cmp(&x);
    }
    ord
}

/// Reorder each maximal run of exactly-tied players by the match points
/// each earned head-to-head against the rest of the cohort.
fn resolve_versus(players: &[Player], tiebreaks: &[Tiebreak], order: &mut [usize]) {
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len()
            && compare(&players[order[start]], &players[order[end]], tiebreaks)
                == Ordering::Equal
        {
            end += 1;
        }
        if end - start > 1 {
            let cohort: Vec<&PlayerId> = order[start..end]
                .iter()
                .map(|&i| &players[i].id)
                .collect();
            let run = &mut order[start..end];
            run.sort_by(|&a, &b| {
                let va = versus_points(&players[a], &cohort);
                let vb = versus_points(&players[b], &cohort);
                vb.total_cmp(&va)
            });
        }
        start = end;
    }
}

/// Match points gained against the given cohort.
fn versus_points(player: &Player, cohort: &[&PlayerId]) -> f64 {
    player
        .results
        .iter()
        .filter(|r| {
            r.opponent
                .as_ref()
                .is_some_and(|o| cohort.iter().any(|c| *c == o))
        })
        .map(|r| r.match_points)
        .sum()
}

fn base_stats(player: &Player, points_for_win: f64) -> BaseStats {
    let match_win_pct = floored_pct(
        player.match_points,
        player.match_count as f64 * points_for_win,
    );
    let game_win_pct = floored_pct(
        player.game_points,
        player.game_count as f64 * points_for_win,
    );

    // Running match-point total after each round, summed over rounds.
    let mut entries: Vec<_> = player.results.iter().collect();
    entries.sort_by_key(|r| r.round);
    let rounds = entries.len() as f64;
    let mut running = 0.0;
    let mut cumulative = 0.0;
    let mut bye_cumulative = 0.0;
    for (i, entry) in entries.iter().enumerate() {
        running += entry.match_points;
        cumulative += running;
        if entry.outcome == Outcome::Bye {
            // A bye's points ride every subsequent running total.
            bye_cumulative += entry.match_points * (rounds - i as f64);
        }
    }

    BaseStats {
        match_win_pct,
        game_win_pct,
        match_points: player.match_points,
        cumulative,
        bye_cumulative,
    }
}

/// Mean of opponents' match-win rates, excluding each opponent's results
/// against this player from that opponent's own rate.
fn opp_match_win_pct(player: &Player, players: &[Player], points_for_win: f64) -> f64 {
    let mut mean = Mean::default();
    for entry in &player.results {
        let Some(opponent_id) = &entry.opponent else {
            continue;
        };
        let Some(opponent) = players.iter().find(|p| &p.id == opponent_id) else {
            continue;
        };

        let vs_points: f64 = opponent
            .results
            .iter()
            .filter(|r| r.opponent.as_ref() == Some(&player.id))
            .map(|r| r.match_points)
            .sum();
        let vs_count = opponent
            .results
            .iter()
            .filter(|r| r.opponent.as_ref() == Some(&player.id))
            .count();

        let points = opponent.match_points - vs_points;
        let count = opponent.match_count as usize - vs_count;
        mean.push(floored_pct(points, count as f64 * points_for_win));
    }
    mean.value()
}

fn floored_pct(points: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    (points / scale).max(PCT_FLOOR)
}

fn outcome_weight(outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Win => 1.0,
        Outcome::Draw => 0.5,
        Outcome::Loss | Outcome::Bye => 0.0,
    }
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::ResultEntry;

    fn entry(
        match_id: &str,
        round: u32,
        opponent: Option<&str>,
        outcome: Outcome,
        match_points: f64,
    ) -> ResultEntry {
        ResultEntry {
            match_id: match_id.to_string(),
            round,
            opponent: opponent.map(str::to_string),
            outcome,
            match_points,
            game_points: match_points,
            games: 1,
        }
    }

    fn record(player: &mut Player, entries: Vec<ResultEntry>) {
        for e in entries {
            player.match_count += 1;
            player.match_points += e.match_points;
            player.game_count += e.games;
            player.game_points += e.game_points;
            player.results.push(e);
        }
    }

    #[test]
    fn test_solkoff_sums_opponent_points() {
        let mut a = Player::new("a", "a");
        let mut b = Player::new("b", "b");
        let mut c = Player::new("c", "c");
        record(&mut a, vec![entry("m1", 1, Some("b"), Outcome::Win, 1.0)]);
        record(&mut b, vec![entry("m1", 1, Some("a"), Outcome::Loss, 0.0)]);
        record(&mut c, vec![entry("m2", 1, None, Outcome::Bye, 1.0)]);

        let mut players = vec![a, b, c];
        compute(&mut players, 1.0);

        // a's only opponent is b, on zero points.
        assert_eq!(players[0].tiebreaks.solkoff, 0.0);
        // b's only opponent is a, on one point.
        assert_eq!(players[1].tiebreaks.solkoff, 1.0);
        // Byes contribute nothing as opponents.
        assert_eq!(players[2].tiebreaks.solkoff, 0.0);
    }

    #[test]
    fn test_match_win_pct_is_floored() {
        let mut a = Player::new("a", "a");
        record(
            &mut a,
            vec![
                entry("m1", 1, Some("b"), Outcome::Loss, 0.0),
                entry("m2", 2, Some("c"), Outcome::Loss, 0.0),
            ],
        );
        let mut players = vec![a];
        compute(&mut players, 1.0);
        assert_eq!(players[0].tiebreaks.match_win_pct, PCT_FLOOR);
    }

    #[test]
    fn test_sonneborn_weighs_wins_and_draws() {
        let mut a = Player::new("a", "a");
        let mut b = Player::new("b", "b");
        let mut c = Player::new("c", "c");
        record(
            &mut a,
            vec![
                entry("m1", 1, Some("b"), Outcome::Win, 3.0),
                entry("m2", 2, Some("c"), Outcome::Draw, 1.0),
            ],
        );
        record(&mut b, vec![entry("m1", 1, Some("a"), Outcome::Loss, 0.0)]);
        record(&mut c, vec![entry("m2", 2, Some("a"), Outcome::Draw, 1.0)]);

        let mut players = vec![a, b, c];
        compute(&mut players, 3.0);

        // Win over b (0 pts) counts fully, draw with c (1 pt) counts half.
        assert_eq!(players[0].tiebreaks.sonneborn_berger, 0.5);
    }

    #[test]
    fn test_cumulative_running_totals() {
        let mut a = Player::new("a", "a");
        record(
            &mut a,
            vec![
                entry("m1", 1, Some("b"), Outcome::Win, 1.0),
                entry("m2", 2, Some("c"), Outcome::Loss, 0.0),
                entry("m3", 3, Some("d"), Outcome::Win, 1.0),
            ],
        );
        let mut players = vec![a];
        compute(&mut players, 1.0);
        // Running totals 1, 1, 2 sum to 4.
        assert_eq!(players[0].tiebreaks.cumulative, 4.0);
    }

    #[test]
    fn test_versus_orders_tied_cohort_by_head_to_head() {
        let mut a = Player::new("a", "a");
        let mut b = Player::new("b", "b");
        // Identical points and empty tiebreak columns; b beat a directly.
        record(
            &mut a,
            vec![
                entry("m1", 1, Some("b"), Outcome::Loss, 0.0),
                entry("m2", 2, Some("x"), Outcome::Win, 1.0),
            ],
        );
        record(
            &mut b,
            vec![
                entry("m1", 1, Some("a"), Outcome::Win, 1.0),
                entry("m2b", 2, Some("y"), Outcome::Loss, 0.0),
            ],
        );
        let players = vec![a, b];
        let order = sort(&players, &[Tiebreak::Versus]);
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_sort_is_stable_for_full_ties() {
        let a = Player::new("a", "a");
        let b = Player::new("b", "b");
        let players = vec![a, b];
        let order = sort(&players, &[Tiebreak::Solkoff]);
        assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    }
}

