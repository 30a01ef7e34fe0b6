//! Reference datasets from the UKMOD microsimulation model

pub mod ukmod;

pub use ukmod::{
    AggregateTable, MONTHLY_INPUT_VARIABLES, UKMOD_AGG, UKMOD_INPUT, UKMOD_OUTPUT, ukmod_input,
    ukmod_output,
};
