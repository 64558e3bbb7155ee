//! Circle-method round-robin scheduling.

/// One scheduled table: indices into the start-time player order. `None`
/// is the phantom slot that encodes a bye on odd player counts.
pub type Table = (Option<usize>, Option<usize>);

/// Build the complete schedule for `n` players.
///
/// With `n` even, player 0 is fixed and the remaining `n - 1` rotate; with
/// `n` odd a phantom is inserted, so every player sits out exactly once
/// per cycle. A double round-robin appends a second cycle with the sides
/// swapped.
pub fn schedule(n: usize, double: bool) -> Vec<Vec<Table>> {
    if n < 2 {
        return Vec::new();
    }

    let size = if n % 2 == 0 { n } else { n + 1 };
    let phantom = size - 1;
    let mut ring: Vec<usize> = (1..size).collect();

    let mut rounds = Vec::with_capacity(size - 1);
    for round in 0..size - 1 {
        let mut tables = Vec::with_capacity(size / 2);

        // Alternate the fixed player's side so home/away stays balanced.
        let anchor_opponent = ring[size - 2];
        if round % 2 == 0 {
            tables.push(seat(0, anchor_opponent, phantom, n));
        } else {
            tables.push(seat(anchor_opponent, 0, phantom, n));
        }
        for i in 0..size / 2 - 1 {
            tables.push(seat(ring[i], ring[size - 3 - i], phantom, n));
        }

        rounds.push(tables);
        ring.rotate_right(1);
    }

    if double {
        let rematches: Vec<Vec<Table>> = rounds
            .iter()
            .map(|tables| tables.iter().map(|&(a, b)| (b, a)).collect())
            .collect();
        rounds.extend(rematches);
    }

    rounds
}

/// Translate raw circle positions into a table, mapping the phantom (only
/// present for odd `n`) to an empty slot.
fn seat(a: usize, b: usize, phantom: usize, n: usize) -> Table {
    let hide = |x: usize| {
        if n % 2 == 1 && x == phantom {
            None
        } else {
            Some(x)
        }
    };
    (hide(a), hide(b))
}
