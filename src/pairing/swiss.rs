//! Swiss pairing: score groups, floats, and minimum-weight matching.

use crate::constants::{REMATCH_PENALTY, SCORE_GAP_WEIGHT};
use crate::tournament::models::{Player, PlayerId};

/// Search budget for the exact matching before settling for the best
/// pairing found so far. The greedy seed pairing guarantees a valid
/// fallback even when the budget trips.
const NODE_BUDGET: usize = 200_000;

/// The proposed pairings for one Swiss round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwissRound {
    /// Paired players, best score group first.
    pub pairs: Vec<(PlayerId, PlayerId)>,
    /// Recipient of this round's pairing bye, when the count is odd.
    pub bye: Option<PlayerId>,
    /// Players consuming a pre-awarded initial bye this round.
    pub initial_byes: Vec<PlayerId>,
}

/// Pair one Swiss round.
///
/// `players` must be the active players in standings order (best first).
/// Players whose remaining `initial_byes` cover this round sit out with a
/// pre-awarded bye; they neither consume the round's single pairing bye
/// nor count against it.
pub fn pair_round(players: &[&Player], round: u32) -> SwissRound {
    let mut out = SwissRound::default();

    let mut candidates: Vec<&Player> = Vec::with_capacity(players.len());
    for player in players {
        if player.initial_byes >= round {
            out.initial_byes.push(player.id.clone());
        } else {
            candidates.push(player);
        }
    }

    if candidates.len() % 2 == 1 {
        let idx = pick_bye(&candidates);
        out.bye = Some(candidates.remove(idx).id.clone());
    }

    if candidates.is_empty() {
        return out;
    }

    let weights = pair_weights(&candidates);
    let matching = min_weight_matching(&weights);
    out.pairs = matching
        .into_iter()
        .map(|(a, b)| (candidates[a].id.clone(), candidates[b].id.clone()))
        .collect();
    out
}

/// The bye goes to the lowest-ranked player who has not yet had one; when
/// everyone has, to the lowest-ranked player outright.
fn pick_bye(candidates: &[&Player]) -> usize {
    candidates
        .iter()
        .rposition(|p| !p.pairing_bye)
        .unwrap_or(candidates.len() - 1)
}

/// Pairwise costs over the candidate list.
///
/// Within a score group the preferred opponent sits half the group away
/// (top half meets bottom half). Crossing groups costs quadratically in
/// the point gap, and every previous meeting adds a penalty large enough
/// that any repeat-free matching wins.
fn pair_weights(candidates: &[&Player]) -> Vec<Vec<f64>> {
    let n = candidates.len();
    let groups = score_groups(candidates);

    let mut weights = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let a = candidates[i];
            let b = candidates[j];
            let mut w = if groups[i].0 == groups[j].0 {
                let (_, len) = groups[i];
                let offset = (j - i) as f64;
                let half = (len as f64) / 2.0;
                (offset - half).abs()
            } else {
                let gap = a.match_points - b.match_points;
                SCORE_GAP_WEIGHT * gap * gap + 8.0
            };
            let meetings = a.opponents().filter(|o| *o == &b.id).count();
            w += meetings as f64 * REMATCH_PENALTY;
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }
    weights
}

/// Map each candidate index to its score group's `(start, len)`.
fn score_groups(candidates: &[&Player]) -> Vec<(usize, usize)> {
    let n = candidates.len();
    let mut groups = vec![(0, 0); n];
    let mut start = 0;
    while start < n {
        let points = candidates[start].match_points;
        let mut end = start + 1;
        while end < n && (candidates[end].match_points - points).abs() < f64::EPSILON {
            end += 1;
        }
        for slot in groups.iter_mut().take(end).skip(start) {
            *slot = (start, end - start);
        }
        start = end;
    }
    groups
}

/// Exact minimum-weight perfect matching by branch and bound, seeded with
/// a greedy matching as the initial bound.
fn min_weight_matching(weights: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let n = weights.len();
    debug_assert!(n % 2 == 0);

    let mut search = MatchingSearch {
        weights,
        partner: vec![usize::MAX; n],
        best: greedy_matching(weights),
        best_cost: 0.0,
        nodes: 0,
    };
    search.best_cost = matching_cost(weights, &search.best);
    search.descend(0.0);
    search.best
}

struct MatchingSearch<'a> {
    weights: &'a [Vec<f64>],
    partner: Vec<usize>,
    best: Vec<(usize, usize)>,
    best_cost: f64,
    nodes: usize,
}

impl MatchingSearch<'_> {
    fn descend(&mut self, cost: f64) {
        if self.nodes >= NODE_BUDGET {
            return;
        }
        self.nodes += 1;

        let Some(first) = self.partner.iter().position(|&p| p == usize::MAX) else {
            if cost < self.best_cost {
                self.best_cost = cost;
                self.best = pairs_from(&self.partner);
            }
            return;
        };

        let mut options: Vec<usize> = ((first + 1)..self.partner.len())
            .filter(|&j| self.partner[j] == usize::MAX)
            .collect();
        options.sort_by(|&a, &b| self.weights[first][a].total_cmp(&self.weights[first][b]));

        for j in options {
            let next = cost + self.weights[first][j];
            if next >= self.best_cost {
                continue;
            }
            self.partner[first] = j;
            self.partner[j] = first;
            self.descend(next);
            self.partner[first] = usize::MAX;
            self.partner[j] = usize::MAX;
        }
    }
}

fn greedy_matching(weights: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let n = weights.len();
    let mut taken = vec![false; n];
    let mut pairs = Vec::with_capacity(n / 2);
    for i in 0..n {
        if taken[i] {
            continue;
        }
        let mut pick = None;
        for j in (i + 1)..n {
            if taken[j] {
                continue;
            }
            match pick {
                None => pick = Some(j),
                Some(k) if weights[i][j] < weights[i][k] => pick = Some(j),
                Some(_) => {}
            }
        }
        if let Some(j) = pick {
            taken[i] = true;
            taken[j] = true;
            pairs.push((i, j));
        }
    }
    pairs
}

fn matching_cost(weights: &[Vec<f64>], pairs: &[(usize, usize)]) -> f64 {
    pairs.iter().map(|&(a, b)| weights[a][b]).sum()
}

fn pairs_from(partner: &[usize]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(partner.len() / 2);
    for (i, &p) in partner.iter().enumerate() {
        if p != usize::MAX && i < p {
            pairs.push((i, p));
        }
    }
    pairs
}
