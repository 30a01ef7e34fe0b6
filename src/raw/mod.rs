//! Raw survey table loading.

pub mod source;
pub mod table;

pub use source::{FrsDirectorySource, MemorySource, RawSurveySource, prepare_table};
pub use table::{BENUNIT_ID, HOUSEHOLD_ID, PERSON_ID, RawColumn, RawTable, RawTables};
