//! Field technicians.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Coordinate, Skill, TimeWindow};

/// A technician who works one route per day.
///
/// Every technician implicitly holds a personal skill derived from their id;
/// requiring that skill pins work to them.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use fieldroute_core::{Coordinate, ServicePro, Skill, TimeWindow};
///
/// let hours = TimeWindow::new(
///     DateTime::parse_from_rfc3339("2024-03-05T08:00:00-05:00").unwrap(),
///     DateTime::parse_from_rfc3339("2024-03-05T17:00:00-05:00").unwrap(),
/// )
/// .unwrap();
/// let home = Coordinate::new(30.3, -97.7);
/// let pro = ServicePro::new(12, "Dana", home, home, hours).with_skill(Skill::Initial);
/// assert!(pro.has_skill(Skill::Personal(12)));
/// assert!(pro.has_skill(Skill::Initial));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServicePro {
    /// Upstream employee id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Where the day begins.
    pub start_location: Coordinate,
    /// Where the day ends.
    pub end_location: Coordinate,
    /// Hours the technician is available.
    pub working_hours: TimeWindow,
    /// Identifier in the workforce system, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub external_id: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    skills: BTreeSet<Skill>,
}

impl ServicePro {
    /// A technician holding only their personal skill.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        start_location: Coordinate,
        end_location: Coordinate,
        working_hours: TimeWindow,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            start_location,
            end_location,
            working_hours,
            external_id: None,
            skills: BTreeSet::new(),
        }
    }

    /// Add a skill, builder style.
    #[must_use]
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.add_skill(skill);
        self
    }

    /// Grant a catalog skill. The personal skill is always held and cannot
    /// be granted to another technician.
    pub fn add_skill(&mut self, skill: Skill) {
        if matches!(skill, Skill::Personal(_)) {
            return;
        }
        self.skills.insert(skill);
    }

    /// The synthetic skill only this technician holds.
    #[must_use]
    pub const fn personal_skill(&self) -> Skill {
        Skill::Personal(self.id)
    }

    /// All skills, personal skill included.
    pub fn skills(&self) -> impl Iterator<Item = Skill> + '_ {
        self.skills
            .iter()
            .copied()
            .chain(std::iter::once(self.personal_skill()))
    }

    /// Whether the technician holds `skill`.
    #[must_use]
    pub fn has_skill(&self, skill: Skill) -> bool {
        skill == self.personal_skill() || self.skills.contains(&skill)
    }
}
