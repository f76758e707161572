//! Employee identity resolution.
//!
//! This module contains the pluggable name-similarity strategies, the
//! per-organization rosters, and the [`EmployeeIdentityIndex`] that searches
//! a roster and propagates name corrections across stored timesheets.

mod index;
mod roster;
mod similarity;

pub use index::{CorrectionOutcome, EmployeeIdentityIndex, EmployeeMatch};
pub use roster::{Roster, RosterRegistry};
pub use similarity::{
    CharacterSimilarity, PhoneticSimilarity, SimilarityStrategy, TokenSimilarity,
    WeightedSimilarity, jaro_winkler, soundex,
};
