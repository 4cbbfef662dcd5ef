//! Technician skills and their solver identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const US_STATES: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH", "NJ",
    "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA",
    "WI", "WV", "WY",
];

const INITIAL_SKILL_ID: u64 = 1;
const STATE_LICENSE_BASE_ID: u64 = 100;
const PERSONAL_SKILL_BASE_ID: u64 = 1_000_000;

/// A US state (or DC) whose service license a technician holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct StateCode(u8);

impl StateCode {
    /// Parse a two-letter postal code, case-insensitively.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        US_STATES
            .iter()
            .position(|candidate| *candidate == upper)
            .and_then(|index| u8::try_from(index).ok())
            .map(Self)
    }

    /// The upper-case postal code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        US_STATES.get(usize::from(self.0)).copied().unwrap_or("??")
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StateCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown state code {value:?}"))
    }
}

impl From<StateCode> for String {
    fn from(value: StateCode) -> Self {
        value.as_str().to_owned()
    }
}

/// A capability used to match work to technicians.
///
/// # Examples
///
/// ```
/// use fieldroute_core::{Skill, StateCode};
///
/// assert_eq!(Skill::Initial.solver_id(), 1);
/// assert_eq!(Skill::Personal(42).solver_id(), 1_000_042);
/// let texas = Skill::StateLicense(StateCode::parse("tx").unwrap());
/// assert_eq!(texas.to_string(), "license:TX");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value", rename_all = "snake_case"))]
pub enum Skill {
    /// Qualified to perform initial services.
    Initial,
    /// Licensed to service in a state.
    StateLicense(StateCode),
    /// Synthetic skill held only by the technician with this id; used to pin
    /// work to that technician.
    Personal(u64),
}

impl Skill {
    /// Build a state-license skill from a postal code.
    #[must_use]
    pub fn state_license(code: &str) -> Option<Self> {
        StateCode::parse(code).map(Self::StateLicense)
    }

    /// Integer identifier understood by the solver.
    #[must_use]
    pub fn solver_id(self) -> u64 {
        match self {
            Self::Initial => INITIAL_SKILL_ID,
            Self::StateLicense(code) => STATE_LICENSE_BASE_ID + u64::from(code.0),
            Self::Personal(service_pro_id) => PERSONAL_SKILL_BASE_ID.saturating_add(service_pro_id),
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::StateLicense(code) => write!(f, "license:{code}"),
            Self::Personal(id) => write!(f, "personal:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AK", 100)]
    #[case("dc", 107)]
    #[case("WY", 150)]
    fn state_licenses_map_to_stable_ids(#[case] code: &str, #[case] expected: u64) {
        let skill = Skill::state_license(code).expect("known state");
        assert_eq!(skill.solver_id(), expected);
    }

    #[rstest]
    fn unknown_state_is_rejected() {
        assert!(Skill::state_license("XX").is_none());
    }

    #[rstest]
    fn personal_skills_do_not_collide_with_catalog() {
        let catalog_max = Skill::state_license("WY").expect("known state").solver_id();
        assert!(Skill::Personal(0).solver_id() > catalog_max);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn state_code_round_trips_through_json() {
        let skill = Skill::state_license("tx").expect("known state");
        let json = serde_json::to_string(&skill).expect("serialise");
        assert_eq!(json, r#"{"type":"state_license","value":"TX"}"#);
        let parsed: Skill = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(parsed, skill);
    }
}
