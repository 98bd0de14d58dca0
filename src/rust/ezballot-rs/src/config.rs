//! Election configuration.
//!
//! An `ElectionConfig` is everything a session needs at construction time:
//! the candidate list and the registration policy.
//!
//! ```text
//! {
//!   "candidates":   [{ "id": "C1", "name": "...", "party": "..." }, ...],
//!   "registration": { "minAge": 18, "maxAge": 122 }
//! }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A candidate as listed before the election opens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub id: String,
    pub name: String,
    pub party: String,
}

impl CandidateSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, party: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            party: party.into(),
        }
    }
}

/// Age bounds enforced at registration, both inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationPolicy {
    pub min_age: i64,
    pub max_age: i64,
}

impl RegistrationPolicy {
    pub const DEFAULT_MIN_AGE: i64 = 18;
    pub const DEFAULT_MAX_AGE: i64 = 122;

    /// Check whether an age falls inside the policy.
    pub fn admits(&self, age: i64) -> bool {
        (self.min_age..=self.max_age).contains(&age)
    }
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            min_age: Self::DEFAULT_MIN_AGE,
            max_age: Self::DEFAULT_MAX_AGE,
        }
    }
}

/// Parameters for creating an election session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElectionConfig {
    /// Candidates in ballot order. Ties in results resolve by this order.
    pub candidates: Vec<CandidateSpec>,
    pub registration: RegistrationPolicy,
}

impl ElectionConfig {
    /// Config with the default registration policy.
    pub fn new(candidates: Vec<CandidateSpec>) -> Self {
        Self {
            candidates,
            registration: RegistrationPolicy::default(),
        }
    }

    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants a session relies on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for candidate in &self.candidates {
            if candidate.id.is_empty() {
                return Err(Error::invalid_config("candidate id must not be empty"));
            }
            if !seen.insert(candidate.id.as_str()) {
                return Err(Error::invalid_config(format!(
                    "duplicate candidate id: {}",
                    candidate.id
                )));
            }
        }

        if self.registration.min_age > self.registration.max_age {
            return Err(Error::invalid_config(format!(
                "minAge {} exceeds maxAge {}",
                self.registration.min_age, self.registration.max_age
            )));
        }

        Ok(())
    }
}
