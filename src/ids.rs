//! Opaque identifier supply.
//!
//! The engine never interprets ids; it only compares them. Hosts that
//! already have an id scheme (database keys, UUIDs) can plug it in through
//! [`IdSource`]; everyone else gets [`AlphanumericIds`]. Uniqueness within
//! a tournament is enforced by the engine itself, which regenerates on
//! collision.

use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::constants::DEFAULT_ID_LENGTH;

/// A supplier of fresh opaque id strings.
pub trait IdSource {
    /// Produce the next id. Ids need not be globally unique; the engine
    /// retries on collision within a tournament.
    fn next_id(&mut self) -> String;
}

/// Default id source: random alphanumeric strings of a fixed length.
#[derive(Clone, Copy, Debug)]
pub struct AlphanumericIds {
    length: usize,
}

impl AlphanumericIds {
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for AlphanumericIds {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl IdSource for AlphanumericIds {
    fn next_id(&mut self) -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Deterministic id source for tests and reproducible hosts: `m1`, `m2`, ...
#[derive(Clone, Debug, Default)]
pub struct SequentialIds {
    counter: u64,
    prefix: String,
}

impl SequentialIds {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            counter: 0,
            prefix: prefix.to_string(),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }
}
