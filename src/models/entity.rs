//! Survey entities and identifier arithmetic
//!
//! A household identifier is the survey serial number. Benefit units and
//! persons extend their parent's identifier by one decimal digit, so parents
//! are recovered by integer division.

use std::fmt;

/// Multiplier between an entity identifier and its children's identifiers
pub const ID_RADIX: i64 = 10;

/// The three survey granularities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    /// Individual respondent
    Person,
    /// Adult, partner and dependent children
    Benunit,
    /// Everyone at one address
    Household,
}

impl Entity {
    /// All entities, from finest to coarsest
    pub const ALL: [Entity; 3] = [Entity::Person, Entity::Benunit, Entity::Household];

    /// Key used in store metadata
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Benunit => "benunit",
            Self::Household => "household",
        }
    }

    /// Name of the identifier variable
    #[must_use]
    pub fn id_variable(&self) -> &'static str {
        match self {
            Self::Person => "person_id",
            Self::Benunit => "benunit_id",
            Self::Household => "household_id",
        }
    }

    /// Name of the weight variable
    #[must_use]
    pub fn weight_variable(&self) -> &'static str {
        match self {
            Self::Person => "person_weight",
            Self::Benunit => "benunit_weight",
            Self::Household => "household_weight",
        }
    }

    /// Parse a metadata key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "person" => Some(Self::Person),
            "benunit" => Some(Self::Benunit),
            "household" => Some(Self::Household),
            _ => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Benefit unit identifier from a household and its local benefit unit number
#[must_use]
pub fn benunit_id(household_id: i64, local: i64) -> i64 {
    household_id * ID_RADIX + local
}

/// Person identifier from a benefit unit and the local person number
#[must_use]
pub fn person_id(benunit_id: i64, local: i64) -> i64 {
    benunit_id * ID_RADIX + local
}

/// Benefit unit a person belongs to
#[must_use]
pub fn benunit_of_person(person_id: i64) -> i64 {
    person_id.div_euclid(ID_RADIX)
}

/// Household a person belongs to
#[must_use]
pub fn household_of_person(person_id: i64) -> i64 {
    person_id.div_euclid(ID_RADIX * ID_RADIX)
}

/// Household a benefit unit belongs to
#[must_use]
pub fn household_of_benunit(benunit_id: i64) -> i64 {
    benunit_id.div_euclid(ID_RADIX)
}
