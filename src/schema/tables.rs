//! Raw FRS table definitions
//!
//! Each table declares the columns the transforms read from it. Required
//! columns must exist in every year; optional ones are read as zero when a
//! year's release does not carry them.

use std::fmt;

use crate::models::Entity;

/// Survey serial number, the household identifier in raw tables
pub const SERNUM: &str = "SERNUM";
/// Benefit unit number within a household
pub const BENUNIT: &str = "BENUNIT";
/// Person number within a benefit unit
pub const PERSON: &str = "PERSON";

/// The raw FRS tables used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrsTable {
    /// Adults
    Adult,
    /// Children
    Child,
    /// Bank and investment accounts
    Accounts,
    /// Benefit receipts
    Benefits,
    /// Jobs
    Job,
    /// Odd jobs
    OddJob,
    /// Benefit units
    Benunit,
    /// Households
    Household,
    /// Childcare arrangements
    Childcare,
    /// Pension receipts
    Pension,
    /// Maintenance payments made
    Maintenance,
    /// Mortgages
    Mortgage,
    /// Pension provision
    PensionProvision,
}

impl FrsTable {
    /// Tables read by the base transform
    pub const BASE: [FrsTable; 9] = [
        FrsTable::Adult,
        FrsTable::Child,
        FrsTable::Accounts,
        FrsTable::Benefits,
        FrsTable::Job,
        FrsTable::Benunit,
        FrsTable::Household,
        FrsTable::Childcare,
        FrsTable::Pension,
    ];

    /// Tables read by the variable-mapping transform
    pub const ALL: [FrsTable; 13] = [
        FrsTable::Adult,
        FrsTable::Child,
        FrsTable::Accounts,
        FrsTable::Benefits,
        FrsTable::Job,
        FrsTable::OddJob,
        FrsTable::Benunit,
        FrsTable::Household,
        FrsTable::Childcare,
        FrsTable::Pension,
        FrsTable::Maintenance,
        FrsTable::Mortgage,
        FrsTable::PensionProvision,
    ];

    /// File stem of the table in a survey release
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Child => "child",
            Self::Accounts => "accounts",
            Self::Benefits => "benefits",
            Self::Job => "job",
            Self::OddJob => "oddjob",
            Self::Benunit => "benunit",
            Self::Household => "househol",
            Self::Childcare => "chldcare",
            Self::Pension => "pension",
            Self::Maintenance => "maint",
            Self::Mortgage => "mortgage",
            Self::PensionProvision => "penprov",
        }
    }

    /// Look a table up by file stem
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// The entity whose identifier every row carries
    #[must_use]
    pub fn grain(&self) -> Entity {
        match self {
            Self::Benunit => Entity::Benunit,
            Self::Household | Self::Mortgage => Entity::Household,
            _ => Entity::Person,
        }
    }

    /// Columns that must be present
    #[must_use]
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Adult => &[
                SERNUM, BENUNIT, PERSON, "AGE80", "SEX", "HRPID", "UPERSON", "MARITAL", "FTED",
                "TYPEED2", "EMPSTATI", "INEARNS", "SEINCAM2", "CVPAY", "ROYYR1", "MNTUS1",
                "MNTUSAM1", "MNTAMT1", "MNTUS2", "MNTUSAM2", "MNTAMT2", "ALLPAY1", "ALLPAY2",
                "ALLPAY3", "ALLPAY4", "APAMT", "APDAMT", "PAREAMT", "REDAMT", "SSPADJ", "TUBORR",
            ],
            Self::Child => &[SERNUM, BENUNIT, PERSON, "AGE", "SEX", "FTED", "TYPEED2"],
            Self::Accounts => &[SERNUM, BENUNIT, PERSON, "ACCOUNT", "ACCINT", "INVTAX", "ACCTAX"],
            Self::Benefits => &[SERNUM, BENUNIT, PERSON, "BENEFIT", "BENAMT", "VAR2"],
            Self::Job => &[SERNUM, BENUNIT, PERSON, "SEINCAMT"],
            Self::OddJob => &[SERNUM, BENUNIT, PERSON, "OJAMT", "OJNOW"],
            Self::Benunit => &[SERNUM, BENUNIT, "GROSS4", "BURENT"],
            Self::Household => &[
                SERNUM, "GROSS4", "GVTREGNO", "CTBAND", "CTANNUAL", "PTENTYP2", "TENTYP2",
                "BEDROOM6", "TYPEACC", "SUBRENT", "CTREBAMT", "GBHSCOST", "NIHSCOST", "HHRENT",
                "MORTINT", "WATSEWRT",
            ],
            Self::Childcare => &[SERNUM, BENUNIT, PERSON, "CHAMT", "COST", "REGISTRD"],
            Self::Pension => &[
                SERNUM, BENUNIT, PERSON, "PENPAY", "PTAMT", "PTINC", "PENOTH", "POAMT", "POINC",
            ],
            Self::Maintenance => &[SERNUM, BENUNIT, PERSON, "MRUS", "MRUAMT", "MRAMT"],
            Self::Mortgage => &[SERNUM, "RMORT", "RMAMT", "BORRAMT", "MORTEND"],
            Self::PensionProvision => &[SERNUM, BENUNIT, PERSON, "PENAMT", "STEMPPEN"],
        }
    }

    /// Columns read as zero when absent
    #[must_use]
    pub fn optional_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Adult => &[
                "ROYYR2", "ROYYR3", "ROYYR4", "CHAMTERN", "CHAMTTST", "ADEMAAMT", "CHEMAAMT",
                "ACCSSAMT", "GRTDIR1", "GRTDIR2",
            ],
            Self::Child => &["CHEMAAMT", "CHAMTERN", "CHAMTTST"],
            Self::Household => &[
                "CHRGAMT1", "CHRGAMT2", "CHRGAMT3", "CHRGAMT4", "CHRGAMT5", "CHRGAMT6",
                "CHRGAMT7", "CHRGAMT8", "CHRGAMT9", "CSEWAMT", "CWATAMTD",
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for FrsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
