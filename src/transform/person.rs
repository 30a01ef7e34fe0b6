//! Person-level building blocks shared by the base and mapping transforms

use crate::error::Result;
use crate::models::types::{Role, code_from_f64};
use crate::raw::{PERSON_ID, RawColumn, RawTable, RawTables};
use crate::schema::{ESA_CODE, FrsTable, JSA_CODE};
use crate::transform::frame::{EntityIndex, group_sum, log_orphans};

/// Column of the person frame holding the role label
pub const ROLE: &str = "role";

/// Offset added to income-related benefit codes in pivoted column names
pub const INCOME_RELATED_OFFSET: i64 = 1000;

/// Adults and children in one frame, sorted by person identifier
///
/// The adult table's banded `AGE` is dropped so that `AGE80 + AGE` gives the
/// age of everyone. A text column `role` records the source table.
pub fn person_frame(tables: &RawTables) -> Result<RawTable> {
    let mut adult = tables.require(FrsTable::Adult)?.clone();
    adult.drop_column("AGE");
    adult.insert(
        ROLE,
        RawColumn::Text(vec![Role::Adult.label().to_string(); adult.num_rows()]),
    )?;

    let mut child = tables.require(FrsTable::Child)?.clone();
    child.insert(
        ROLE,
        RawColumn::Text(vec![Role::Child.label().to_string(); child.num_rows()]),
    )?;

    adult.concat(&child)?.sorted_by(PERSON_ID)
}

/// Benefit program code together with the income-related flag
///
/// Income-related Jobseeker's Allowance and Employment and Support Allowance
/// are separate programs from their contribution-based variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BenefitKey {
    /// `BENEFIT` code
    pub code: i64,
    /// Whether the receipt is income-related
    pub income_related: bool,
}

impl BenefitKey {
    /// Classify a benefit row from its `BENEFIT` and `VAR2` codes
    #[must_use]
    pub fn from_codes(code: i64, var2: i64) -> Self {
        let income_related = matches!(code, JSA_CODE | ESA_CODE) && matches!(var2, 2 | 4);
        Self {
            code,
            income_related,
        }
    }

    /// Code used in pivoted column names
    #[must_use]
    pub fn column_code(&self) -> i64 {
        if self.income_related {
            self.code + INCOME_RELATED_OFFSET
        } else {
            self.code
        }
    }
}

/// Benefit keys of every row of the benefits table
pub fn benefit_keys(benefits: &RawTable) -> Result<Vec<BenefitKey>> {
    let codes = benefits.numeric("BENEFIT")?;
    let var2 = benefits.numeric("VAR2")?;
    Ok(codes
        .iter()
        .zip(var2)
        .map(|(&code, &var2)| {
            BenefitKey::from_codes(code_from_f64(code), code_from_f64(var2))
        })
        .collect())
}

/// Weekly private pension income per person
///
/// Pension payments, positive amounts where tax was deducted, and positive
/// other pension amounts received gross or from another source.
pub fn weekly_pension_income(pension: &RawTable, persons: &EntityIndex) -> Result<Vec<f64>> {
    let keys = pension.ids(PERSON_ID)?;
    let penpay = pension.numeric("PENPAY")?;
    let ptamt = pension.numeric("PTAMT")?;
    let ptinc = pension.numeric("PTINC")?;
    let penoth = pension.numeric("PENOTH")?;
    let poamt = pension.numeric("POAMT")?;
    let poinc = pension.numeric("POINC")?;

    let per_row: Vec<f64> = (0..pension.num_rows())
        .map(|i| {
            let mut total = 0.0;
            if penpay[i] > 0.0 {
                total += penpay[i];
            }
            if ptinc[i] == 2.0 && ptamt[i] > 0.0 {
                total += ptamt[i];
            }
            if (poinc[i] == 2.0 || penoth[i] == 1.0) && poamt[i] > 0.0 {
                total += poamt[i];
            }
            total
        })
        .collect();

    let (sums, orphans) = group_sum(persons, &keys, &per_row, |_| true);
    log_orphans(pension.name(), orphans);
    Ok(sums)
}

/// Weekly registered childcare paid for by the household, per person
pub fn weekly_registered_childcare(
    childcare: &RawTable,
    persons: &EntityIndex,
) -> Result<Vec<f64>> {
    let keys = childcare.ids(PERSON_ID)?;
    let amount = childcare.numeric("CHAMT")?;
    let cost = childcare.numeric("COST")?;
    let registered = childcare.numeric("REGISTRD")?;

    let (sums, orphans) = group_sum(persons, &keys, amount, |row| {
        cost[row] == 1.0 && registered[row] == 1.0
    });
    log_orphans(childcare.name(), orphans);
    Ok(sums)
}
