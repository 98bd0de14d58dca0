//! ezballot-rs: an in-memory model of a single-constituency election.
//!
//! The crate exposes four independent pieces:
//! - `ElectionSession`: candidates, voter registry, ballots and results
//! - `create_vote_validator`: builds an eligibility check from a rule set
//! - `count_votes_in_regions`: totals a tree of regional vote counts
//! - `tally_pure`: increments a tally without touching the original

mod config;
mod election;
mod error;
mod region;
mod tally;
mod validator;

pub use config::{CandidateSpec, ElectionConfig, RegistrationPolicy};
pub use election::{
    create_election, Candidate, CastError, ElectionSession, Voter, VoterRegistration, VoteReceipt,
};
pub use error::{Error, Result};
pub use region::{count_votes_in_regions, count_votes_in_value, RegionNode};
pub use tally::{tally_pure, tally_pure_value, Tally};
pub use validator::{create_vote_validator, Eligibility, ValidateFn, ValidationRules};
