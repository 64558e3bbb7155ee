//! Tournament management.
//!
//! This module provides the engine's lifecycle core:
//! - Tournament creation and player registration
//! - Round progression and pairing dispatch per format
//! - Result entry, retraction, and withdrawal handling
//! - Standings with configurable tiebreakers
//!
//! ## Example
//!
//! ```
//! use matchplay::{Tournament, TournamentConfig};
//!
//! let mut event = Tournament::new(TournamentConfig::round_robin(3.0, 1.0));
//! for name in ["Ana", "Ben", "Cal", "Dee"] {
//!     event.register(name).unwrap();
//! }
//! event.start().unwrap();
//! assert_eq!(event.matches().iter().filter(|m| m.active).count(), 2);
//! ```

pub mod manager;
pub mod models;
mod routing;

pub use manager::{Tournament, TournamentError, TournamentResult};
pub use models::{
    Cut, Format, LateEntry, Match, MatchId, MatchScore, Outcome, Player, PlayerId, Playoffs,
    ResultEntry, Sorting, Status, Tiebreak, Tiebreaks, TournamentConfig,
};
