//! Tournament data models: configuration, players, matches, and results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BEST_OF;

/// Opaque player identifier.
pub type PlayerId = String;

/// Opaque match identifier.
pub type MatchId = String;

/// Tournament format.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Format {
    SingleElim,
    DoubleElim,
    Swiss,
    RoundRobin,
    DoubleRoundRobin,
}

impl Format {
    #[must_use]
    pub fn is_elimination(self) -> bool {
        matches!(self, Self::SingleElim | Self::DoubleElim)
    }

    #[must_use]
    pub fn is_round_robin(self) -> bool {
        matches!(self, Self::RoundRobin | Self::DoubleRoundRobin)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::SingleElim => "single elimination",
            Self::DoubleElim => "double elimination",
            Self::Swiss => "swiss",
            Self::RoundRobin => "round robin",
            Self::DoubleRoundRobin => "double round robin",
        };
        write!(f, "{repr}")
    }
}

/// How registered players are ordered by seed when the tournament starts.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Sorting {
    #[default]
    None,
    Ascending,
    Descending,
}

/// Optional elimination stage appended to a Swiss or round-robin event.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Playoffs {
    #[default]
    None,
    SingleElim,
    DoubleElim,
}

/// Selection of players carried into the playoff stage.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum Cut {
    /// Everyone still active advances.
    #[default]
    None,
    /// The top `n` players by standings advance.
    Rank(usize),
    /// Players with at least this many match points advance.
    Points(f64),
}

/// How a late addition's missed rounds are recorded (Swiss only).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum LateEntry {
    /// Each missed round is recorded as a bye (awards a win).
    #[default]
    Byes,
    /// Each missed round is recorded as a loss (no points, games counted).
    Losses,
}

/// Tiebreaker statistics available for the standings precedence list.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Tiebreak {
    MatchWinPct,
    GameWinPct,
    OppMatchWinPct,
    OppGameWinPct,
    OppOppMatchWinPct,
    Solkoff,
    MedianBuchholz,
    SonnebornBerger,
    Cumulative,
    OppCumulative,
    /// Head-to-head match points among exactly-tied players. Applied
    /// pairwise within a tied cohort rather than as a column compare.
    Versus,
}

/// Computed tiebreaker statistics for one player.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Tiebreaks {
    pub match_win_pct: f64,
    pub game_win_pct: f64,
    pub opp_match_win_pct: f64,
    pub opp_game_win_pct: f64,
    pub opp_opp_match_win_pct: f64,
    pub solkoff: f64,
    pub median_buchholz: f64,
    pub sonneborn_berger: f64,
    pub cumulative: f64,
    pub opp_cumulative: f64,
}

/// Per-match outcome from one player's point of view.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    Bye,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
            Self::Bye => "bye",
        };
        write!(f, "{repr}")
    }
}

/// One entry in a player's match history.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ResultEntry {
    pub match_id: MatchId,
    pub round: u32,
    /// `None` for byes and forfeit placeholders.
    pub opponent: Option<PlayerId>,
    pub outcome: Outcome,
    /// Match points earned in this match.
    pub match_points: f64,
    /// Game points earned in this match.
    pub game_points: f64,
    /// Games played in this match (wins + losses + draws).
    pub games: u32,
}

/// A registered player and their running record.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub alias: String,
    /// Seed for start-time ordering; 0 means unseeded.
    pub seed: u32,
    /// Pre-awarded byes consumed over the first rounds (Swiss only).
    pub initial_byes: u32,
    pub match_count: u32,
    pub match_points: f64,
    pub game_count: u32,
    pub game_points: f64,
    /// Eligible for future pairing.
    pub active: bool,
    /// Already received a pairing bye this event.
    pub pairing_bye: bool,
    pub results: Vec<ResultEntry>,
    pub tiebreaks: Tiebreaks,
}

impl Player {
    #[must_use]
    pub fn new(id: &str, alias: &str) -> Self {
        Self {
            id: id.to_string(),
            alias: alias.to_string(),
            seed: 0,
            initial_byes: 0,
            match_count: 0,
            match_points: 0.0,
            game_count: 0,
            game_points: 0.0,
            active: true,
            pairing_bye: false,
            results: Vec::new(),
            tiebreaks: Tiebreaks::default(),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_initial_byes(mut self, byes: u32) -> Self {
        self.initial_byes = byes;
        self
    }

    /// Append a history entry and fold it into the scoreboard.
    pub(crate) fn record(&mut self, entry: ResultEntry) {
        self.match_count += 1;
        self.match_points += entry.match_points;
        self.game_count += entry.games;
        self.game_points += entry.game_points;
        self.results.push(entry);
    }

    /// Remove the history entry for a match and reverse its scoreboard
    /// contribution. Returns the removed entry, if any.
    pub(crate) fn unrecord(&mut self, match_id: &str) -> Option<ResultEntry> {
        let idx = self.results.iter().position(|r| r.match_id == match_id)?;
        let entry = self.results.remove(idx);
        self.match_count -= 1;
        self.match_points -= entry.match_points;
        self.game_count -= entry.games;
        self.game_points -= entry.game_points;
        Some(entry)
    }

    /// Opponent ids from this player's history, byes excluded.
    pub fn opponents(&self) -> impl Iterator<Item = &PlayerId> {
        self.results.iter().filter_map(|r| r.opponent.as_ref())
    }

    /// Whether this player has already faced the given opponent.
    #[must_use]
    pub fn has_played(&self, opponent: &str) -> bool {
        self.opponents().any(|o| o == opponent)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = format!("{} ({}-{})", self.alias, self.match_points, self.match_count);
        write!(f, "{repr}")
    }
}

/// Game-win tallies for one match.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchScore {
    pub player_one_wins: u32,
    pub player_two_wins: u32,
    pub draws: u32,
}

impl MatchScore {
    #[must_use]
    pub fn new(player_one_wins: u32, player_two_wins: u32, draws: u32) -> Self {
        Self {
            player_one_wins,
            player_two_wins,
            draws,
        }
    }

    /// Total games recorded in this score.
    #[must_use]
    pub fn games(&self) -> u32 {
        self.player_one_wins + self.player_two_wins + self.draws
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = format!(
            "{}-{}-{}",
            self.player_one_wins, self.player_two_wins, self.draws
        );
        write!(f, "{repr}")
    }
}

/// A scheduled or completed match.
///
/// Matches reference players and other matches by id only, so routing
/// edges survive the rewiring performed on erase and withdrawal.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    /// Ordinal within the round; 0 when not meaningful.
    pub match_number: u32,
    pub player_one: Option<PlayerId>,
    pub player_two: Option<PlayerId>,
    /// Awaiting a result: both slots filled, nothing recorded yet.
    pub active: bool,
    pub result: MatchScore,
    /// Match the winner advances to; `None` marks the grand final.
    pub winners_path: Option<MatchId>,
    /// Match the loser advances to; `None` eliminates the loser.
    pub losers_path: Option<MatchId>,
}

impl Match {
    #[must_use]
    pub fn new(id: &str, round: u32, match_number: u32) -> Self {
        Self {
            id: id.to_string(),
            round,
            match_number,
            player_one: None,
            player_two: None,
            active: false,
            result: MatchScore::default(),
            winners_path: None,
            losers_path: None,
        }
    }

    /// Whether this match has exactly one participant.
    #[must_use]
    pub fn is_bye(&self) -> bool {
        self.player_one.is_some() != self.player_two.is_some()
    }

    /// Whether a result has been recorded.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        self.result.games() > 0
    }

    #[must_use]
    pub fn contains(&self, player: &str) -> bool {
        self.player_one.as_deref() == Some(player) || self.player_two.as_deref() == Some(player)
    }

    /// The other participant, when both slots are filled.
    #[must_use]
    pub fn opponent_of(&self, player: &str) -> Option<&PlayerId> {
        if self.player_one.as_deref() == Some(player) {
            self.player_two.as_ref()
        } else if self.player_two.as_deref() == Some(player) {
            self.player_one.as_ref()
        } else {
            None
        }
    }

    /// Place a player into the first empty slot. Returns false when both
    /// slots are already occupied.
    pub(crate) fn fill_slot(&mut self, player: &str) -> bool {
        if self.player_one.is_none() {
            self.player_one = Some(player.to_string());
            true
        } else if self.player_two.is_none() {
            self.player_two = Some(player.to_string());
            true
        } else {
            false
        }
    }

    /// Empty the slot occupied by the given player. Returns whether a slot
    /// was cleared.
    pub(crate) fn clear_slot(&mut self, player: &str) -> bool {
        if self.player_one.as_deref() == Some(player) {
            self.player_one = None;
            true
        } else if self.player_two.as_deref() == Some(player) {
            self.player_two = None;
            true
        } else {
            false
        }
    }
}

/// Tournament lifecycle status.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
    Registration,
    Active,
    Playoffs,
    Aborted,
    Finished,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Registration => "registration",
            Self::Active => "active",
            Self::Playoffs => "playoffs",
            Self::Aborted => "aborted",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Tournament configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TournamentConfig {
    pub format: Format,
    pub sorting: Sorting,
    /// Add a third-place match in single elimination.
    pub consolation: bool,
    /// Maximum registrations; 0 means unbounded.
    pub player_limit: usize,
    pub points_for_win: f64,
    pub points_for_draw: f64,
    /// Scheduled Swiss rounds; 0 resolves to ceil(log2(players)) at start.
    pub rounds: u32,
    pub playoffs: Playoffs,
    /// Odd match length used only for forfeit and bye scoring.
    pub best_of: u32,
    pub cut: Cut,
    pub tiebreaks: Vec<Tiebreak>,
    pub late_entry: LateEntry,
}

impl TournamentConfig {
    /// A Swiss event with the Magic-style default tiebreaker precedence.
    #[must_use]
    pub fn swiss(points_for_win: f64, points_for_draw: f64) -> Self {
        Self {
            format: Format::Swiss,
            sorting: Sorting::None,
            consolation: false,
            player_limit: 0,
            points_for_win,
            points_for_draw,
            rounds: 0,
            playoffs: Playoffs::None,
            best_of: DEFAULT_BEST_OF,
            cut: Cut::None,
            tiebreaks: vec![
                Tiebreak::OppMatchWinPct,
                Tiebreak::GameWinPct,
                Tiebreak::OppGameWinPct,
            ],
            late_entry: LateEntry::Byes,
        }
    }

    /// A single round-robin event.
    #[must_use]
    pub fn round_robin(points_for_win: f64, points_for_draw: f64) -> Self {
        Self {
            format: Format::RoundRobin,
            tiebreaks: vec![Tiebreak::SonnebornBerger, Tiebreak::Versus],
            ..Self::swiss(points_for_win, points_for_draw)
        }
    }

    /// A double round-robin event (everyone meets twice, sides swapped).
    #[must_use]
    pub fn double_round_robin(points_for_win: f64, points_for_draw: f64) -> Self {
        Self {
            format: Format::DoubleRoundRobin,
            ..Self::round_robin(points_for_win, points_for_draw)
        }
    }

    /// A seeded single-elimination bracket.
    #[must_use]
    pub fn single_elim() -> Self {
        Self {
            format: Format::SingleElim,
            sorting: Sorting::Ascending,
            tiebreaks: Vec::new(),
            ..Self::swiss(1.0, 0.0)
        }
    }

    /// A seeded double-elimination bracket.
    #[must_use]
    pub fn double_elim() -> Self {
        Self {
            format: Format::DoubleElim,
            ..Self::single_elim()
        }
    }

    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_best_of(mut self, best_of: u32) -> Self {
        self.best_of = best_of;
        self
    }

    #[must_use]
    pub fn with_player_limit(mut self, limit: usize) -> Self {
        self.player_limit = limit;
        self
    }

    #[must_use]
    pub fn with_sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = sorting;
        self
    }

    #[must_use]
    pub fn with_consolation(mut self) -> Self {
        self.consolation = true;
        self
    }

    #[must_use]
    pub fn with_playoffs(mut self, playoffs: Playoffs, cut: Cut) -> Self {
        self.playoffs = playoffs;
        self.cut = cut;
        self
    }

    #[must_use]
    pub fn with_tiebreaks(mut self, tiebreaks: Vec<Tiebreak>) -> Self {
        self.tiebreaks = tiebreaks;
        self
    }

    #[must_use]
    pub fn with_late_entry(mut self, late_entry: LateEntry) -> Self {
        self.late_entry = late_entry;
        self
    }

    /// Game wins awarded for a forfeit or bye.
    #[must_use]
    pub fn forfeit_wins(&self) -> u32 {
        self.best_of.div_ceil(2)
    }
}
