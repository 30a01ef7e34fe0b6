//! Schemas of the raw survey tables and of the generated variables.

pub mod tables;
pub mod variables;

pub use tables::{BENUNIT, FrsTable, PERSON, SERNUM};
pub use variables::{
    BENEFIT_PROGRAMS, ESA_CODE, JSA_CODE, VariableDefinition, check_against_catalogue,
    frs_variables,
};
