//! Engine-wide constants.

/// Minimum number of players required to start a Swiss event.
pub const MIN_SWISS_PLAYERS: usize = 8;

/// Minimum number of players required to start a round-robin or
/// elimination event.
pub const MIN_BRACKET_PLAYERS: usize = 4;

/// Default length of generated match and player identifiers.
pub const DEFAULT_ID_LENGTH: usize = 12;

/// Default best-of for forfeit and bye scoring.
pub const DEFAULT_BEST_OF: u32 = 1;

/// Weight added to a candidate pairing for every previous meeting between
/// the two players. Large enough that any repeat-free pairing beats any
/// pairing containing a rematch.
pub const REMATCH_PENALTY: f64 = 1_000_000.0;

/// Per-point-of-score-difference weight for pairing across score groups.
pub const SCORE_GAP_WEIGHT: f64 = 16.0;
