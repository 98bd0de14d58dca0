//! Voter eligibility checks built from a rule set.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Outcome of an eligibility check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub valid: bool,
    pub reason: String,
}

impl Eligibility {
    fn eligible() -> Self {
        Self {
            valid: true,
            reason: "Voter is eligible".to_string(),
        }
    }

    fn ineligible(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// A standalone eligibility check.
pub type ValidateFn = Box<dyn Fn(&Value) -> Eligibility + Send + Sync>;

/// Rules a voter record is checked against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationRules {
    pub min_age: f64,
    /// Fields that must be present, checked in order.
    pub required_fields: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_age: 18.0,
            required_fields: Vec::new(),
        }
    }
}

impl ValidationRules {
    /// Check a voter record against these rules.
    pub fn validate(&self, voter: &Value) -> Eligibility {
        let Some(fields) = voter.as_object() else {
            return Eligibility::ineligible("Invalid voter object");
        };

        if let Some(missing) = self
            .required_fields
            .iter()
            .find(|field| !fields.contains_key(field.as_str()))
        {
            return Eligibility::ineligible(format!("Missing field: {missing}"));
        }

        match fields.get("age").and_then(Value::as_f64) {
            Some(age) if age >= self.min_age => Eligibility::eligible(),
            _ => Eligibility::ineligible(format!("Age must be at least {}", self.min_age)),
        }
    }

    /// Box these rules into a standalone check.
    pub fn into_validator(self) -> ValidateFn {
        Box::new(move |voter| self.validate(voter))
    }
}

/// Build an eligibility check from untyped rules.
///
/// Rules that are not an object, or whose recognised options have the wrong
/// shape, produce a check that rejects everyone with "Invalid rules".
pub fn create_vote_validator(rules: &Value) -> ValidateFn {
    let parsed = match rules {
        Value::Object(_) => serde_json::from_value::<ValidationRules>(rules.clone()).ok(),
        _ => None,
    };

    match parsed {
        Some(rules) => rules.into_validator(),
        None => {
            debug!("rejecting malformed validator rules");
            Box::new(|_| Eligibility::ineligible("Invalid rules"))
        }
    }
}
