//! Survey code enumerations
//!
//! FRS categorical columns hold integer codes. Each enumeration here maps the
//! codes it knows to a variant and keeps every other code in `Unknown(code)`,
//! so unrecognised values stay visible instead of silently disappearing.

/// Code used when a categorical value is missing in the raw data
pub const MISSING_CODE: i64 = -1;

/// Label written for codes outside a lookup table
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Convert a raw numeric cell into a survey code
#[must_use]
pub fn code_from_f64(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        MISSING_CODE
    }
}

/// A categorical survey variable with a closed set of labels
pub trait SurveyCode: From<i64> + Copy {
    /// Label written to the output dataset
    fn label(&self) -> &'static str;

    /// Whether the code was outside the lookup table
    fn is_unknown(&self) -> bool;
}

/// Recode raw numeric cells into labels
///
/// Returns the labels and the number of unknown codes encountered.
pub fn recode<T: SurveyCode>(values: &[f64]) -> (Vec<T>, usize) {
    let codes: Vec<T> = values
        .iter()
        .map(|&v| T::from(code_from_f64(v)))
        .collect();
    let unknown = codes.iter().filter(|c| c.is_unknown()).count();
    (codes, unknown)
}

/// Labels of a slice of codes
#[must_use]
pub fn labels<T: SurveyCode>(codes: &[T]) -> Vec<String> {
    codes.iter().map(|c| c.label().to_string()).collect()
}

macro_rules! survey_code {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $label:literal : [$($code:literal),+ $(,)?] ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
            /// Code outside the lookup table
            Unknown(i64),
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                match value {
                    $( $($code)|+ => Self::$variant, )+
                    other => Self::Unknown(other),
                }
            }
        }

        impl SurveyCode for $name {
            fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                    Self::Unknown(_) => UNKNOWN_LABEL,
                }
            }

            fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown(_))
            }
        }
    };
}

survey_code! {
    /// Sex (`SEX`)
    Gender {
        Male => "MALE": [1],
        Female => "FEMALE": [2],
    }
}

survey_code! {
    /// Marital status (`MARITAL`)
    MaritalStatus {
        Married => "MARRIED": [1],
        Single => "SINGLE": [2, 3],
        Widowed => "WIDOWED": [4],
        Separated => "SEPARATED": [5],
        Divorced => "DIVORCED": [6],
    }
}

survey_code! {
    /// Government office region (`GVTREGNO`)
    Region {
        NorthEast => "NORTH_EAST": [1],
        NorthWest => "NORTH_WEST": [2, 3],
        Yorkshire => "YORKSHIRE": [4],
        EastMidlands => "EAST_MIDLANDS": [5],
        WestMidlands => "WEST_MIDLANDS": [6],
        EastOfEngland => "EAST_OF_ENGLAND": [7],
        London => "LONDON": [8],
        SouthEast => "SOUTH_EAST": [9],
        SouthWest => "SOUTH_WEST": [10],
        Wales => "WALES": [11],
        Scotland => "SCOTLAND": [12],
        NorthernIreland => "NORTHERN_IRELAND": [13],
    }
}

survey_code! {
    /// Tenure (`PTENTYP2`)
    TenureType {
        RentFromCouncil => "RENT_FROM_COUNCIL": [1],
        RentFromHousingAssociation => "RENT_FROM_HA": [2],
        RentPrivately => "RENT_PRIVATELY": [3, 4],
        OwnedOutright => "OWNED_OUTRIGHT": [5],
        OwnedWithMortgage => "OWNED_WITH_MORTGAGE": [6],
    }
}

survey_code! {
    /// Accommodation type (`TYPEACC`)
    AccommodationType {
        HouseDetached => "HOUSE_DETACHED": [1],
        HouseSemiDetached => "HOUSE_SEMI_DETACHED": [2],
        HouseTerraced => "HOUSE_TERRACED": [3],
        Flat => "FLAT": [4],
        ConvertedHouse => "CONVERTED_HOUSE": [5],
        Mobile => "MOBILE": [6],
        Other => "OTHER": [7],
    }
}

survey_code! {
    /// ILO employment status (`EMPSTATI`)
    EmploymentStatus {
        Child => "CHILD": [0],
        FullTimeEmployed => "FT_EMPLOYED": [1],
        PartTimeEmployed => "PT_EMPLOYED": [2],
        FullTimeSelfEmployed => "FT_SELF_EMPLOYED": [3],
        PartTimeSelfEmployed => "PT_SELF_EMPLOYED": [4],
        Unemployed => "UNEMPLOYED": [5],
        Retired => "RETIRED": [6],
        Student => "STUDENT": [7],
        Carer => "CARER": [8],
        LongTermDisabled => "LONG_TERM_DISABLED": [9],
        ShortTermDisabled => "SHORT_TERM_DISABLED": [10],
    }
}

/// Stage of education currently attended, derived from `FTED`, `TYPEED2` and age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EducationLevel {
    /// Not in full-time education
    NotInEducation,
    /// Nursery or pre-school
    PrePrimary,
    /// Primary school
    Primary,
    /// Lower secondary school
    LowerSecondary,
    /// Upper secondary school or non-advanced further education
    UpperSecondary,
    /// Post-secondary non-tertiary
    PostSecondary,
    /// Higher education
    Tertiary,
}

impl EducationLevel {
    /// Label written to the output dataset
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotInEducation => "NOT_IN_EDUCATION",
            Self::PrePrimary => "PRE_PRIMARY",
            Self::Primary => "PRIMARY",
            Self::LowerSecondary => "LOWER_SECONDARY",
            Self::UpperSecondary => "UPPER_SECONDARY",
            Self::PostSecondary => "POST_SECONDARY",
            Self::Tertiary => "TERTIARY",
        }
    }

    /// Classify one person
    ///
    /// Rules are checked in order and the first match wins. Anyone in
    /// full-time education that no rule places is treated as not in education.
    #[must_use]
    pub fn classify(fted: i64, typeed2: i64, age: f64) -> Self {
        let in_fte = fted == 1;
        let unspecified = typeed2 == 0 && in_fte;

        if matches!(fted, 2 | -1 | 0) {
            Self::NotInEducation
        } else if typeed2 == 1 {
            Self::PrePrimary
        } else if matches!(typeed2, 2 | 4)
            || (matches!(typeed2, 3 | 8) && age < 11.0)
            || (unspecified && age > 5.0 && age < 11.0)
        {
            Self::Primary
        } else if matches!(typeed2, 5 | 6)
            || (matches!(typeed2, 3 | 8) && (11.0..=16.0).contains(&age))
            || (unspecified && age <= 16.0)
        {
            Self::LowerSecondary
        } else if typeed2 == 7
            || (matches!(typeed2, 3 | 8) && age > 16.0)
            || (unspecified && age > 16.0)
        {
            Self::UpperSecondary
        } else if matches!(typeed2, 7 | 8) && age >= 19.0 {
            Self::PostSecondary
        } else if typeed2 == 9 || (unspecified && age >= 19.0) {
            Self::Tertiary
        } else {
            Self::NotInEducation
        }
    }
}

/// Which person table a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Row from the adult table
    Adult,
    /// Row from the child table
    Child,
}

impl Role {
    /// Label written to the output dataset
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Child => "child",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_codes() {
        assert_eq!(Gender::from(1), Gender::Male);
        assert_eq!(Gender::from(7), Gender::Unknown(7));
        assert_eq!(Gender::from(7).label(), UNKNOWN_LABEL);
        assert_eq!(MaritalStatus::from(3).label(), "SINGLE");
        assert_eq!(Region::from(13), Region::NorthernIreland);
        assert_eq!(TenureType::from(4).label(), "RENT_PRIVATELY");
    }

    #[test]
    fn test_recode_counts_unknowns() {
        let (codes, unknown) = recode::<AccommodationType>(&[1.0, 4.0, 99.0, f64::NAN]);
        assert_eq!(unknown, 2);
        assert_eq!(codes[2], AccommodationType::Unknown(99));
        assert_eq!(codes[3], AccommodationType::Unknown(MISSING_CODE));
        assert_eq!(
            labels(&codes),
            vec!["HOUSE_DETACHED", "FLAT", UNKNOWN_LABEL, UNKNOWN_LABEL]
        );
    }

    #[test]
    fn test_education_classification() {
        assert_eq!(EducationLevel::classify(2, 0, 30.0), EducationLevel::NotInEducation);
        assert_eq!(EducationLevel::classify(1, 1, 3.0), EducationLevel::PrePrimary);
        assert_eq!(EducationLevel::classify(1, 2, 8.0), EducationLevel::Primary);
        assert_eq!(EducationLevel::classify(1, 3, 13.0), EducationLevel::LowerSecondary);
        assert_eq!(EducationLevel::classify(1, 0, 17.0), EducationLevel::UpperSecondary);
        assert_eq!(EducationLevel::classify(1, 7, 20.0), EducationLevel::UpperSecondary);
        assert_eq!(EducationLevel::classify(1, 9, 20.0), EducationLevel::Tertiary);
    }
}
