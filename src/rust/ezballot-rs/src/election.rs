//! The election session: candidates, voter registry and ballots.

use crate::{CandidateSpec, ElectionConfig, RegistrationPolicy, Tally};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A candidate and the votes received so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party: String,
    pub votes: u64,
}

impl From<CandidateSpec> for Candidate {
    fn from(spec: CandidateSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            party: spec.party,
            votes: 0,
        }
    }
}

/// A registered voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub voted: bool,
}

/// A request to register a voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistration {
    pub id: String,
    pub name: String,
    pub age: i64,
}

impl VoterRegistration {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
        }
    }

    /// Extract a registration from an untyped record.
    ///
    /// `id` and `name` must be non-empty strings, `age` an integer. A float
    /// with no fractional part is accepted as an integer.
    pub fn from_value(voter: &Value) -> Option<Self> {
        let fields = voter.as_object()?;

        let id = fields.get("id")?.as_str().filter(|s| !s.is_empty())?;
        let name = fields.get("name")?.as_str().filter(|s| !s.is_empty())?;
        let age = integer(fields.get("age")?)?;

        Some(Self::new(id, name, age))
    }
}

fn integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }

    let f = value.as_f64()?;
    let in_range = f >= i64::MIN as f64 && f <= i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Proof of an accepted vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub voter_id: String,
    pub candidate_id: String,
}

/// Why a vote was refused. Checked in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("Invalid Voter ID")]
    InvalidVoterId,

    #[error("Invalid Candidate ID")]
    InvalidCandidateId,

    #[error("Voter ID not registered!")]
    VoterNotRegistered,

    #[error("Voter has already voted!")]
    AlreadyVoted,

    #[error("Candidate ID not registered!")]
    CandidateNotFound,
}

/// One election's runtime state.
///
/// Candidates keep their construction order for the whole session; that order
/// breaks ties in `results` and `winner`.
#[derive(Debug)]
pub struct ElectionSession {
    id: Uuid,
    candidates: Vec<Candidate>,
    voters: BTreeMap<String, Voter>,
    policy: RegistrationPolicy,
}

/// Open an election over `candidates` with the default registration policy.
pub fn create_election(candidates: Vec<CandidateSpec>) -> ElectionSession {
    ElectionSession::with_config(ElectionConfig::new(candidates))
}

impl ElectionSession {
    /// Create a session from a config. Every candidate starts at zero votes.
    ///
    /// The config is trusted as given; run `ElectionConfig::validate` first
    /// when it was built in code rather than parsed with `from_json`.
    pub fn with_config(config: ElectionConfig) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            candidates: config.candidates.into_iter().map(Candidate::from).collect(),
            voters: BTreeMap::new(),
            policy: config.registration,
        };

        info!(
            session = %session.id,
            candidates = session.candidates.len(),
            "election opened"
        );

        session
    }

    /// Session identifier, used to correlate log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn policy(&self) -> &RegistrationPolicy {
        &self.policy
    }

    /// Candidates in ballot order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn voter(&self, voter_id: &str) -> Option<&Voter> {
        self.voters.get(voter_id)
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.voters.get(voter_id).is_some_and(|v| v.voted)
    }

    /// Register a voter from an untyped record. Returns false on any
    /// malformed field, out-of-policy age, or already registered id.
    pub fn register_voter(&mut self, voter: &Value) -> bool {
        match VoterRegistration::from_value(voter) {
            Some(registration) => self.register(registration),
            None => {
                debug!(session = %self.id, "rejected malformed voter record");
                false
            }
        }
    }

    /// Register a voter. Returns false if the record is incomplete, the age
    /// is outside the policy, or the id is already registered.
    pub fn register(&mut self, registration: VoterRegistration) -> bool {
        if registration.id.is_empty() || registration.name.is_empty() {
            debug!(session = %self.id, "rejected voter with empty id or name");
            return false;
        }

        if !self.policy.admits(registration.age) {
            debug!(
                session = %self.id,
                voter = %registration.id,
                age = registration.age,
                "rejected voter outside age bounds"
            );
            return false;
        }

        if self.voters.contains_key(&registration.id) {
            debug!(session = %self.id, voter = %registration.id, "voter already registered");
            return false;
        }

        debug!(session = %self.id, voter = %registration.id, "voter registered");
        self.voters.insert(
            registration.id.clone(),
            Voter {
                id: registration.id,
                name: registration.name,
                age: registration.age,
                voted: false,
            },
        );

        true
    }

    /// Cast a vote, handing the outcome to exactly one continuation.
    ///
    /// Returns whatever the invoked continuation returns.
    pub fn cast_vote<R>(
        &mut self,
        voter_id: &str,
        candidate_id: &str,
        on_success: impl FnOnce(VoteReceipt) -> R,
        on_error: impl FnOnce(CastError) -> R,
    ) -> R {
        match self.try_cast_vote(voter_id, candidate_id) {
            Ok(receipt) => on_success(receipt),
            Err(e) => on_error(e),
        }
    }

    /// Cast a vote. State changes only when `Ok` is returned.
    pub fn try_cast_vote(
        &mut self,
        voter_id: &str,
        candidate_id: &str,
    ) -> Result<VoteReceipt, CastError> {
        let result = self.record_vote(voter_id, candidate_id);

        match &result {
            Ok(_) => info!(
                session = %self.id,
                voter = voter_id,
                candidate = candidate_id,
                "vote recorded"
            ),
            Err(e) => warn!(
                session = %self.id,
                voter = voter_id,
                candidate = candidate_id,
                "vote refused: {}",
                e
            ),
        }

        result
    }

    fn record_vote(&mut self, voter_id: &str, candidate_id: &str) -> Result<VoteReceipt, CastError> {
        if voter_id.is_empty() {
            return Err(CastError::InvalidVoterId);
        }
        if candidate_id.is_empty() {
            return Err(CastError::InvalidCandidateId);
        }

        let voter = self
            .voters
            .get_mut(voter_id)
            .ok_or(CastError::VoterNotRegistered)?;

        if voter.voted {
            return Err(CastError::AlreadyVoted);
        }

        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)
            .ok_or(CastError::CandidateNotFound)?;

        // Both lookups succeeded; commit together.
        voter.voted = true;
        candidate.votes += 1;

        Ok(VoteReceipt {
            voter_id: voter_id.to_string(),
            candidate_id: candidate_id.to_string(),
        })
    }

    /// Snapshot of the candidates, most votes first. Ties keep ballot order.
    pub fn results(&self) -> Vec<Candidate> {
        self.results_by(|a, b| b.votes.cmp(&a.votes))
    }

    /// Snapshot of the candidates ordered by `compare`. The sort is stable.
    pub fn results_by<F>(&self, compare: F) -> Vec<Candidate>
    where
        F: FnMut(&Candidate, &Candidate) -> Ordering,
    {
        let mut results = self.candidates.clone();
        results.sort_by(compare);
        results
    }

    /// The leading candidate, earliest on the ballot among ties.
    ///
    /// `None` when there are no candidates or no vote has been cast.
    pub fn winner(&self) -> Option<Candidate> {
        let mut leader: Option<&Candidate> = None;

        for candidate in &self.candidates {
            if leader.is_none_or(|l| candidate.votes > l.votes) {
                leader = Some(candidate);
            }
        }

        leader.filter(|c| c.votes > 0).cloned()
    }

    /// Total of all candidate votes; equals the number of accepted ballots.
    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.votes).sum()
    }

    /// Current counts as a tally, one entry per candidate.
    pub fn tally(&self) -> Tally {
        self.candidates
            .iter()
            .map(|c| (c.id.clone(), c.votes))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_candidates() -> ElectionSession {
        create_election(vec![
            CandidateSpec::new("C1", "Sarpanch Ram", "Janata"),
            CandidateSpec::new("C2", "Pradhan Sita", "Lok"),
        ])
    }

    fn votes_of(session: &ElectionSession, id: &str) -> u64 {
        session
            .candidates()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.votes)
            .unwrap()
    }

    #[test]
    fn candidates_start_at_zero() {
        let session = two_candidates();
        assert!(session.candidates().iter().all(|c| c.votes == 0));
        assert_eq!(session.total_votes(), 0);
    }

    #[test]
    fn register_once() {
        let mut session = two_candidates();
        let voter = json!({"id": "V1", "name": "Mohan", "age": 25});

        assert!(session.register_voter(&voter));
        assert!(!session.register_voter(&voter));
        assert_eq!(session.voter_count(), 1);
        assert!(!session.voter("V1").unwrap().voted);
    }

    #[test]
    fn register_age_bounds() {
        let mut session = two_candidates();

        assert!(!session.register_voter(&json!({"id": "A", "name": "a", "age": 17})));
        assert!(session.register_voter(&json!({"id": "B", "name": "b", "age": 18})));
        assert!(session.register_voter(&json!({"id": "C", "name": "c", "age": 122})));
        assert!(!session.register_voter(&json!({"id": "D", "name": "d", "age": 123})));
    }

    #[test]
    fn register_malformed() {
        let mut session = two_candidates();

        let cases = [
            Value::Null,
            json!("V1"),
            json!({"name": "n", "age": 30}),
            json!({"id": "", "name": "n", "age": 30}),
            json!({"id": 7, "name": "n", "age": 30}),
            json!({"id": "V1", "name": "", "age": 30}),
            json!({"id": "V1", "age": 30}),
            json!({"id": "V1", "name": "n"}),
            json!({"id": "V1", "name": "n", "age": "30"}),
            json!({"id": "V1", "name": "n", "age": 30.5}),
        ];

        for case in &cases {
            assert!(!session.register_voter(case), "should reject {case}");
        }
        assert_eq!(session.voter_count(), 0);
    }

    #[test]
    fn register_integral_float_age() {
        let mut session = two_candidates();
        assert!(session.register_voter(&json!({"id": "V1", "name": "n", "age": 30.0})));
        assert_eq!(session.voter("V1").unwrap().age, 30);
    }

    #[test]
    fn register_typed() {
        let mut session = two_candidates();
        assert!(session.register(VoterRegistration::new("V1", "Mohan", 40)));
        assert!(!session.register(VoterRegistration::new("V2", "", 40)));
        assert!(!session.register(VoterRegistration::new("V1", "Other", 40)));
    }

    #[test]
    fn custom_policy() {
        let mut config = ElectionConfig::new(vec![CandidateSpec::new("C1", "a", "x")]);
        config.registration.min_age = 21;
        let mut session = ElectionSession::with_config(config);

        assert!(!session.register(VoterRegistration::new("V1", "n", 20)));
        assert!(session.register(VoterRegistration::new("V2", "n", 21)));
    }

    #[test]
    fn cast_vote_success() {
        let mut session = two_candidates();
        session.register(VoterRegistration::new("V1", "Mohan", 25));

        let outcome = session.cast_vote("V1", "C1", |_| "voted!".to_string(), |e| format!("error: {e}"));

        assert_eq!(outcome, "voted!");
        assert_eq!(votes_of(&session, "C1"), 1);
        assert_eq!(votes_of(&session, "C2"), 0);
        assert!(session.has_voted("V1"));
    }

    #[test]
    fn cast_vote_receipt() {
        let mut session = two_candidates();
        session.register(VoterRegistration::new("V1", "Mohan", 25));

        let receipt = session.try_cast_vote("V1", "C2").unwrap();
        assert_eq!(receipt.voter_id, "V1");
        assert_eq!(receipt.candidate_id, "C2");
    }

    #[test]
    fn cast_vote_error_order() {
        let mut session = two_candidates();
        session.register(VoterRegistration::new("V1", "Mohan", 25));

        assert_eq!(session.try_cast_vote("", ""), Err(CastError::InvalidVoterId));
        assert_eq!(session.try_cast_vote("V9", ""), Err(CastError::InvalidCandidateId));
        assert_eq!(session.try_cast_vote("V9", "C9"), Err(CastError::VoterNotRegistered));
        assert_eq!(session.try_cast_vote("V1", "C9"), Err(CastError::CandidateNotFound));

        // A refused ballot leaves the voter free to vote.
        assert!(!session.has_voted("V1"));
        session.try_cast_vote("V1", "C1").unwrap();
        assert_eq!(session.try_cast_vote("V1", "C9"), Err(CastError::AlreadyVoted));
    }

    #[test]
    fn error_reasons() {
        assert_eq!(CastError::InvalidVoterId.to_string(), "Invalid Voter ID");
        assert_eq!(CastError::InvalidCandidateId.to_string(), "Invalid Candidate ID");
        assert_eq!(CastError::VoterNotRegistered.to_string(), "Voter ID not registered!");
        assert_eq!(CastError::AlreadyVoted.to_string(), "Voter has already voted!");
        assert_eq!(CastError::CandidateNotFound.to_string(), "Candidate ID not registered!");
    }

    #[test]
    fn exactly_one_continuation() {
        let mut session = two_candidates();
        let mut successes = 0;
        let mut errors = 0;

        session.cast_vote("nobody", "C1", |_| successes += 1, |_| errors += 1);

        assert_eq!((successes, errors), (0, 1));
    }

    #[test]
    fn results_default_order() {
        let mut session = create_election(vec![
            CandidateSpec::new("C1", "a", "x"),
            CandidateSpec::new("C2", "b", "y"),
            CandidateSpec::new("C3", "c", "z"),
        ]);
        for id in ["V1", "V2", "V3"] {
            session.register(VoterRegistration::new(id, "n", 30));
        }
        session.try_cast_vote("V1", "C3").unwrap();
        session.try_cast_vote("V2", "C2").unwrap();

        let order: Vec<String> = session.results().into_iter().map(|c| c.id).collect();
        assert_eq!(order, ["C2", "C3", "C1"]);
    }

    #[test]
    fn results_with_comparator() {
        let session = two_candidates();
        let by_name_desc = session.results_by(|a, b| b.name.cmp(&a.name));

        assert_eq!(by_name_desc[0].id, "C1");
        assert_eq!(session.candidates()[0].id, "C1");
    }

    #[test]
    fn results_do_not_alias_state() {
        let mut session = two_candidates();
        let mut snapshot = session.results();
        snapshot[0].votes = 99;

        assert_eq!(session.total_votes(), 0);
        session.register(VoterRegistration::new("V1", "n", 30));
        session.try_cast_vote("V1", "C2").unwrap();
        assert_eq!(snapshot[1].votes, 0);
    }

    #[test]
    fn winner_none_without_votes() {
        assert!(two_candidates().winner().is_none());
        assert!(create_election(Vec::new()).winner().is_none());
    }

    #[test]
    fn winner_tie_goes_to_earliest() {
        let mut session = two_candidates();
        session.register(VoterRegistration::new("V1", "n", 30));
        session.register(VoterRegistration::new("V2", "n", 30));
        session.try_cast_vote("V1", "C2").unwrap();
        session.try_cast_vote("V2", "C1").unwrap();

        assert_eq!(session.winner().unwrap().id, "C1");
    }

    #[test]
    fn with_config_keeps_unvalidated_candidates() {
        let config = ElectionConfig::new(vec![
            CandidateSpec::new("C1", "a", "x"),
            CandidateSpec::new("C1", "b", "y"),
        ]);
        assert!(config.validate().is_err());

        let mut session = ElectionSession::with_config(config);
        session.register(VoterRegistration::new("V1", "n", 30));
        session.try_cast_vote("V1", "C1").unwrap();

        assert_eq!(session.candidates().len(), 2);
        assert_eq!(session.candidates()[0].votes, 1);
        assert_eq!(session.candidates()[1].votes, 0);
    }

    #[test]
    fn tally_snapshot() {
        let mut session = two_candidates();
        session.register(VoterRegistration::new("V1", "n", 30));
        session.try_cast_vote("V1", "C2").unwrap();

        let tally = session.tally();
        assert_eq!(tally.get("C1"), Some(&0));
        assert_eq!(tally.get("C2"), Some(&1));
    }
}
