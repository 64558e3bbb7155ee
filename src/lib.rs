//! # Matchplay
//!
//! An embeddable tournament-management engine: an in-memory state machine
//! that ingests player registrations and match results and produces, at
//! every step, the matches to play next, consistent per-player records,
//! and a deterministic ranking under configurable tiebreakers.
//!
//! ## Formats
//!
//! - **Swiss**: score-group pairing with minimum-weight matching, floats,
//!   and at most one pairing bye per player per event
//! - **Round-robin**: circle-method schedules, single or double
//! - **Single/double elimination**: seeded brackets with pre-wired
//!   winners/losers routing, plus optional playoff stages appended to
//!   Swiss or round-robin events
//!
//! ## Core Modules
//!
//! - [`tournament`]: the lifecycle state machine and data model
//! - [`pairing`]: pure pairing generators per format
//! - [`standings`]: tiebreaker computation and standings ordering
//! - [`ids`]: the opaque id supplier consumed by the engine
//!
//! The engine is strictly single-threaded and synchronous; every
//! operation either mutates in place or fails leaving state unchanged.
//! Persistence, transport, and interfaces are the host's business: all
//! data models are serde-serializable and the host picks the format.
//!
//! ## Example
//!
//! ```
//! use matchplay::{Tournament, TournamentConfig};
//!
//! let mut event = Tournament::new(TournamentConfig::swiss(1.0, 0.5));
//! for name in ["Ana", "Ben", "Cal", "Dee", "Eli", "Fay", "Gus", "Hal"] {
//!     event.register(name).unwrap();
//! }
//! event.start().unwrap();
//! assert_eq!(event.current_round(), 1);
//! assert_eq!(event.matches().len(), 4);
//! ```

pub mod constants;
pub mod ids;
pub mod pairing;
pub mod standings;
pub mod tournament;

pub use ids::{AlphanumericIds, IdSource, SequentialIds};
pub use tournament::{
    Cut, Format, LateEntry, Match, MatchId, MatchScore, Outcome, Player, PlayerId, Playoffs,
    ResultEntry, Sorting, Status, Tiebreak, Tiebreaks, Tournament, TournamentConfig,
    TournamentError, TournamentResult,
};
