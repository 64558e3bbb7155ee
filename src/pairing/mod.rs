//! Pairing generators.
//!
//! Pure functions that turn tournament state into the next set of matches:
//! - [`swiss`]: score-group pairing with minimum-weight matching
//! - [`round_robin`]: circle-method schedules, single and double
//! - [`bracket`]: seeded single/double elimination construction
//!
//! Generators never touch the tournament; they return plans the controller
//! turns into [`Match`](crate::Match) records.

pub mod bracket;
pub mod round_robin;
pub mod swiss;
