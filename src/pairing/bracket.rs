//! Seeded elimination bracket construction.
//!
//! Brackets are planned as a flat list of nodes wired by list index; the
//! controller assigns real match ids and copies the wiring into
//! `winners_path`/`losers_path`.

/// One planned bracket node.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedMatch {
    pub round: u32,
    /// Ordinal within the round.
    pub match_number: u32,
    /// Seat indices into the seeded player order; `None` is an open slot
    /// (a first-round bye, or a slot filled later by routing).
    pub seats: [Option<usize>; 2],
    /// Plan index the winner advances to.
    pub winners_to: Option<usize>,
    /// Plan index the loser advances to.
    pub losers_to: Option<usize>,
}

/// A complete bracket plan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BracketPlan {
    pub matches: Vec<PlannedMatch>,
    /// Number of winners'-bracket rounds.
    pub rounds: u32,
}

/// Standard seeding order for a bracket of `size` (a power of two):
/// seat `i` of the first round holds seed `order[i]`, so seed 0 meets
/// seed `size - 1` first and the top seeds meet as late as possible.
fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![0];
    let mut len = 1;
    while len < size {
        len *= 2;
        let mut next = Vec::with_capacity(len);
        for &seed in &order {
            next.push(seed);
            next.push(len - 1 - seed);
        }
        order = next;
    }
    order
}

/// Plan a single-elimination bracket for `n` players.
///
/// Bracket size is the next power of two; the top `size - n` seeds get a
/// first-round bye. With `consolation`, the two semi-final losers feed a
/// third-place match.
pub fn single_elim(n: usize, consolation: bool) -> BracketPlan {
    let size = n.next_power_of_two();
    let rounds = size.trailing_zeros();
    let order = seed_order(size);

    let mut plan = BracketPlan {
        matches: Vec::new(),
        rounds,
    };

    // Index of the first match of each round.
    let mut round_base = Vec::with_capacity(rounds as usize);
    let mut base = 0;
    for round in 1..=rounds {
        round_base.push(base);
        base += size >> round;
    }

    for round in 1..=rounds {
        let count = size >> round;
        for i in 0..count {
            let seats = if round == 1 {
                let a = order[2 * i];
                let b = order[2 * i + 1];
                [seat_for(a, n), seat_for(b, n)]
            } else {
                [None, None]
            };
            let winners_to = if round < rounds {
                Some(round_base[round as usize] + i / 2)
            } else {
                None
            };
            plan.matches.push(PlannedMatch {
                round,
                match_number: i as u32 + 1,
                seats,
                winners_to,
                losers_to: None,
            });
        }
    }

    if consolation && rounds >= 2 {
        let third_place = plan.matches.len();
        let semis_base = round_base[rounds as usize - 2];
        plan.matches[semis_base].losers_to = Some(third_place);
        plan.matches[semis_base + 1].losers_to = Some(third_place);
        plan.matches.push(PlannedMatch {
            round: rounds,
            match_number: 2,
            seats: [None, None],
            winners_to: None,
            losers_to: None,
        });
    }

    plan
}

/// Plan a double-elimination bracket for `n` players.
///
/// The winners' bracket matches `single_elim`; the losers' bracket has
/// `2 * (rounds - 1)` rounds alternating merge rounds (two losers'-side
/// winners) and drop rounds (one losers'-side winner against a fresh
/// winners'-bracket loser), with drop order reversed on alternating
/// winners' rounds to delay rematches. The grand final is terminal.
pub fn double_elim(n: usize) -> BracketPlan {
    let size = n.next_power_of_two();
    let rounds = size.trailing_zeros();
    let mut plan = single_elim(n, false);

    let wb_base = |round: u32| -> usize {
        let mut base = 0;
        for r in 1..round {
            base += size >> r;
        }
        base
    };

    // Losers'-bracket rounds are numbered after the winners' rounds.
    let lb_rounds = 2 * (rounds - 1);
    let mut lb_base = Vec::with_capacity(lb_rounds as usize);
    for l in 1..=lb_rounds {
        lb_base.push(plan.matches.len());
        let count = lb_round_size(size, l);
        for i in 0..count {
            plan.matches.push(PlannedMatch {
                round: rounds + l,
                match_number: i as u32 + 1,
                seats: [None, None],
                winners_to: None,
                losers_to: None,
            });
        }
    }

    let grand_final = plan.matches.len();
    plan.matches.push(PlannedMatch {
        round: rounds + lb_rounds + 1,
        match_number: 1,
        seats: [None, None],
        winners_to: None,
        losers_to: None,
    });

    // Winners'-bracket losers drop in: round 1 pairs feed losers' round 1,
    // later rounds feed the even losers' rounds, reversed on even
    // winners' rounds so players from the same quarter cross sides.
    let wb1 = wb_base(1);
    for i in 0..(size >> 1) {
        plan.matches[wb1 + i].losers_to = Some(lb_base[0] + i / 2);
    }
    for wb_round in 2..=rounds {
        let count = size >> wb_round;
        let target_round = (2 * wb_round - 2) as usize;
        for i in 0..count {
            let slot = if wb_round % 2 == 0 { count - 1 - i } else { i };
            plan.matches[wb_base(wb_round) + i].losers_to =
                Some(lb_base[target_round - 1] + slot);
        }
    }

    // Winners' final advances to the grand final.
    plan.matches[wb_base(rounds)].winners_to = Some(grand_final);

    // Losers'-bracket internal wiring.
    for l in 1..=lb_rounds {
        let count = lb_round_size(size, l);
        for i in 0..count {
            let winners_to = if l == lb_rounds {
                grand_final
            } else if l % 2 == 1 {
                // Merge round into the same-size drop round.
                lb_base[l as usize] + i
            } else {
                // Drop round into the next merge round, halving.
                lb_base[l as usize] + i / 2
            };
            plan.matches[lb_base[l as usize - 1] + i].winners_to = Some(winners_to);
        }
    }

    plan
}

/// Matches in losers'-bracket round `l` (1-based) of a bracket of `size`.
fn lb_round_size(size: usize, l: u32) -> usize {
    let depth = l.div_ceil(2) + 1;
    size >> depth
}

fn seat_for(seed: usize, n: usize) -> Option<usize> {
    if seed < n {
        Some(seed)
    } else {
        None
    }
}
