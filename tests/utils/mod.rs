//! Synthetic survey used by the integration tests
//!
//! Three households:
//! * household 1 (Scotland): a couple with one child, a mortgage and savings
//! * household 2 (Northern Ireland): a pensioner with missing council tax
//! * household 3 (Northern Ireland): a self-employed adult
//!
//! The serial number of household 3 can be chosen, so that the same survey
//! can carry record-specific corrections.

use frs_data::raw::{MemorySource, RawColumn, RawTable};
use frs_data::schema::FrsTable;

/// Survey year of the fixture
pub const YEAR: i32 = 2019;

/// Serial number of the self-employed household in [`fixture_source`]
pub const SELF_EMPLOYED_SERIAL: f64 = 3.0;

type Row<'a> = &'a [(&'a str, f64)];

/// Build a table with every required column, zero unless given
fn table(kind: FrsTable, rows: &[Row<'_>]) -> RawTable {
    let mut names: Vec<&str> = kind.required_columns().to_vec();
    for row in rows {
        for &(name, _) in row.iter() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let columns = names
        .iter()
        .map(|&name| {
            let values = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .find(|(column, _)| *column == name)
                        .map_or(0.0, |&(_, value)| value)
                })
                .collect();
            (name.to_string(), RawColumn::Numeric(values))
        })
        .collect();
    RawTable::from_columns(kind.name(), columns).unwrap()
}

/// Raw tables of the fixture for [`YEAR`]
pub fn fixture_source() -> MemorySource {
    survey_source(YEAR, SELF_EMPLOYED_SERIAL)
}

/// Raw tables of the fixture for any year and self-employed serial number
pub fn survey_source(year: i32, self_employed_serial: f64) -> MemorySource {
    let se = self_employed_serial;
    let mut source = MemorySource::new();
    let mut add = |kind: FrsTable, rows: &[Row<'_>]| {
        source.insert(year, kind, table(kind, rows));
    };

    add(
        FrsTable::Household,
        &[
            &[
                ("SERNUM", 1.0),
                ("GROSS4", 1000.0),
                ("GVTREGNO", 12.0),
                ("CTBAND", 3.0),
                ("CTANNUAL", 1500.0),
                ("PTENTYP2", 6.0),
                ("TENTYP2", 6.0),
                ("BEDROOM6", 3.0),
                ("TYPEACC", 2.0),
                ("GBHSCOST", 180.0),
                ("MORTINT", 60.0),
                ("WATSEWRT", 8.0),
                ("CSEWAMT", 3.0),
                ("CWATAMTD", 4.0),
                ("CHRGAMT1", 2.0),
            ],
            &[
                ("SERNUM", 2.0),
                ("GROSS4", 2000.0),
                ("GVTREGNO", 13.0),
                ("CTBAND", 2.0),
                ("CTANNUAL", f64::NAN),
                ("PTENTYP2", 5.0),
                ("TENTYP2", 5.0),
                ("BEDROOM6", 2.0),
                ("TYPEACC", 3.0),
                ("NIHSCOST", 40.0),
            ],
            &[
                ("SERNUM", se),
                ("GROSS4", 3000.0),
                ("GVTREGNO", 13.0),
                ("CTBAND", 2.0),
                ("CTANNUAL", 900.0),
                ("PTENTYP2", 3.0),
                ("TENTYP2", 3.0),
                ("BEDROOM6", 1.0),
                ("TYPEACC", 4.0),
                ("HHRENT", 120.0),
                ("GBHSCOST", 120.0),
                ("NIHSCOST", 110.0),
                ("WATSEWRT", 5.0),
                ("CSEWAMT", 9.0),
            ],
        ],
    );
    add(
        FrsTable::Benunit,
        &[
            &[("SERNUM", 1.0), ("BENUNIT", 1.0), ("GROSS4", 1000.0)],
            &[("SERNUM", 2.0), ("BENUNIT", 1.0), ("GROSS4", 2000.0)],
            &[
                ("SERNUM", se),
                ("BENUNIT", 1.0),
                ("GROSS4", 3000.0),
                ("BURENT", 120.0),
            ],
        ],
    );
    add(
        FrsTable::Adult,
        &[
            // Rows out of order on purpose
            &[
                ("SERNUM", se),
                ("BENUNIT", 1.0),
                ("PERSON", 1.0),
                ("AGE", 6.0),
                ("AGE80", 25.0),
                ("SEX", 2.0),
                ("HRPID", 1.0),
                ("UPERSON", 1.0),
                ("MARITAL", 2.0),
                ("EMPSTATI", 2.0),
                ("SEINCAM2", 200.0),
            ],
            &[
                ("SERNUM", 1.0),
                ("BENUNIT", 1.0),
                ("PERSON", 1.0),
                ("AGE", 8.0),
                ("AGE80", 40.0),
                ("SEX", 1.0),
                ("HRPID", 1.0),
                ("UPERSON", 1.0),
                ("MARITAL", 1.0),
                ("EMPSTATI", 1.0),
                ("INEARNS", 500.0),
            ],
            &[
                ("SERNUM", 1.0),
                ("BENUNIT", 1.0),
                ("PERSON", 2.0),
                ("AGE", 8.0),
                ("AGE80", 38.0),
                ("SEX", 2.0),
                ("MARITAL", 1.0),
                ("EMPSTATI", 1.0),
                ("INEARNS", 300.0),
            ],
            &[
                ("SERNUM", 2.0),
                ("BENUNIT", 1.0),
                ("PERSON", 1.0),
                ("AGE", 14.0),
                ("AGE80", 70.0),
                ("SEX", 2.0),
                ("HRPID", 1.0),
                ("UPERSON", 1.0),
                ("MARITAL", 4.0),
                ("EMPSTATI", 5.0),
            ],
        ],
    );
    add(
        FrsTable::Child,
        &[&[
            ("SERNUM", 1.0),
            ("BENUNIT", 1.0),
            ("PERSON", 3.0),
            ("AGE", 8.0),
            ("SEX", 1.0),
            ("FTED", 1.0),
            ("TYPEED2", 3.0),
        ]],
    );
    add(
        FrsTable::Accounts,
        &[
            &[
                ("SERNUM", 1.0),
                ("BENUNIT", 1.0),
                ("PERSON", 1.0),
                ("ACCOUNT", 1.0),
                ("ACCINT", 10.0),
            ],
            &[
                ("SERNUM", 1.0),
                ("BENUNIT", 1.0),
                ("PERSON", 2.0),
                ("ACCOUNT", 7.0),
                ("ACCINT", 3.0),
            ],
        ],
    );
    let benefit = |serial: f64, person: f64, code: f64, amount: f64, var2: f64| {
        [
            ("SERNUM", serial),
            ("BENUNIT", 1.0),
            ("PERSON", person),
            ("BENEFIT", code),
            ("BENAMT", amount),
            ("VAR2", var2),
        ]
    };
    add(
        FrsTable::Benefits,
        &[
            &benefit(1.0, 1.0, 3.0, 20.0, 0.0),
            // Contribution-based JSA
            &benefit(1.0, 1.0, 14.0, 40.0, 1.0),
            // Income-related ESA
            &benefit(1.0, 2.0, 16.0, 30.0, 4.0),
            &benefit(2.0, 1.0, 5.0, 150.0, 0.0),
            // Winter fuel allowance is an annual amount
            &benefit(2.0, 1.0, 62.0, 200.0, 0.0),
            // Income-based JSA
            &benefit(se, 1.0, 14.0, 70.0, 2.0),
        ],
    );
    add(
        FrsTable::Job,
        &[
            &[
                ("SERNUM", se),
                ("BENUNIT", 1.0),
                ("PERSON", 1.0),
                ("SEINCAMT", 210.0),
            ],
            &[
                ("SERNUM", se),
                ("BENUNIT", 1.0),
                ("PERSON", 1.0),
                ("SEINCAMT", 40.0),
            ],
        ],
    );
    add(
        FrsTable::OddJob,
        &[&[
            ("SERNUM", 1.0),
            ("BENUNIT", 1.0),
            ("PERSON", 2.0),
            ("OJAMT", 5.0),
            ("OJNOW", 1.0),
        ]],
    );
    add(
        FrsTable::Childcare,
        &[&[
            ("SERNUM", 1.0),
            ("BENUNIT", 1.0),
            ("PERSON", 3.0),
            ("CHAMT", 50.0),
            ("COST", 1.0),
            ("REGISTRD", 1.0),
        ]],
    );
    add(
        FrsTable::Pension,
        &[&[
            ("SERNUM", 2.0),
            ("BENUNIT", 1.0),
            ("PERSON", 1.0),
            ("PENPAY", 100.0),
        ]],
    );
    add(
        FrsTable::Maintenance,
        &[&[
            ("SERNUM", 1.0),
            ("BENUNIT", 1.0),
            ("PERSON", 1.0),
            ("MRUS", 2.0),
            ("MRUAMT", 10.0),
            ("MRAMT", 12.0),
        ]],
    );
    add(
        FrsTable::Mortgage,
        &[
            &[
                ("SERNUM", 1.0),
                ("RMORT", 1.0),
                ("RMAMT", 100_000.0),
                ("BORRAMT", 120_000.0),
                ("MORTEND", 20.0),
            ],
            // Terms that cannot be divided by are skipped
            &[
                ("SERNUM", 1.0),
                ("RMORT", 2.0),
                ("BORRAMT", 30_000.0),
                ("MORTEND", 0.0),
            ],
            &[
                ("SERNUM", 2.0),
                ("RMORT", 1.0),
                ("RMAMT", 50_000.0),
                ("MORTEND", f64::NAN),
            ],
        ],
    );
    let provision = |serial: f64, person: f64, amount: f64, scheme: f64| {
        [
            ("SERNUM", serial),
            ("BENUNIT", 1.0),
            ("PERSON", person),
            ("PENAMT", amount),
            ("STEMPPEN", scheme),
        ]
    };
    add(
        FrsTable::PensionProvision,
        &[
            &provision(1.0, 1.0, 30.0, 5.0),
            &provision(1.0, 2.0, 900.0, 6.0),
            &provision(1.0, 2.0, 40.0, 2.0),
            &provision(2.0, 1.0, 25.0, 4.0),
            &provision(se, 1.0, 20.0, 7.0),
            &provision(se, 1.0, -5.0, 5.0),
        ],
    );
    source
}

/// Write a donor table with the given header and rows
pub fn write_donor_table(path: &std::path::Path, header: &[&str], rows: &[Vec<f64>]) {
    let mut contents = header.join("\t");
    contents.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        contents.push_str(&cells.join("\t"));
        contents.push('\n');
    }
    std::fs::write(path, contents).unwrap();
}
