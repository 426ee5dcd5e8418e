//! The profit and loss summary for one fiscal year.

use crate::model::{Amount, AppDocument, ExpenseCategory, IncomeCategory, Record};
use crate::Result;
use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// The flat mileage allowance per business kilometer driven with a private car, in EUR.
pub const MILEAGE_RATE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// The total of all entries booked under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal<C> {
    pub category: C,
    pub entries: usize,
    pub total: Amount,
}

/// Income and expenses booked in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotal {
    /// 1 for January through 12 for December.
    pub month: u32,
    pub income: Amount,
    pub expenses: Amount,
    pub profit: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLoss {
    pub year: i32,
    pub income: Vec<CategoryTotal<IncomeCategory>>,
    pub expenses: Vec<CategoryTotal<ExpenseCategory>>,
    pub total_income: Amount,
    pub total_expenses: Amount,
    /// Income minus expenses. Negative for a loss.
    pub profit: Amount,
    /// Always twelve entries, January first.
    pub months: Vec<MonthTotal>,
    #[serde(with = "crate::model::number")]
    pub trip_kilometers: Decimal,
    /// `trip_kilometers` at [`MILEAGE_RATE`], rounded to cents.
    pub mileage_allowance: Amount,
}

impl ProfitLoss {
    /// Summarizes the entries of `doc` whose date falls in `year`. Categories appear in
    /// declaration order and categories without entries are left out. Fails if a total does not
    /// fit in a `Decimal`.
    pub fn for_year(doc: &AppDocument, year: i32) -> Result<Self> {
        let income: Vec<_> = doc
            .income_entries
            .iter()
            .filter(|e| e.year() == Some(year))
            .map(|e| (e.date, e.category, e.amount))
            .collect();
        let expenses: Vec<_> = doc
            .expense_entries
            .iter()
            .filter(|e| e.year() == Some(year))
            .map(|e| (e.date, e.category, e.amount))
            .collect();

        let total_income = sum(income.iter().map(|(_, _, a)| *a), "income")?;
        let total_expenses = sum(expenses.iter().map(|(_, _, a)| *a), "expenses")?;
        let profit = total_income
            .checked_sub(total_expenses)
            .ok_or_else(|| anyhow!("The profit for {year} is out of range"))?;

        let trip_kilometers = doc
            .trip_log_entries
            .iter()
            .filter(|t| t.year() == Some(year))
            .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.kilometers))
            .ok_or_else(|| anyhow!("The kilometers driven in {year} are out of range"))?;
        let mileage_allowance = trip_kilometers
            .checked_mul(MILEAGE_RATE)
            .map(|d| Amount::new(d.round_dp(2)))
            .ok_or_else(|| anyhow!("The mileage allowance for {year} is out of range"))?;

        Ok(Self {
            year,
            income: totals(income.iter().map(|(_, c, a)| (*c, *a)))?,
            expenses: totals(expenses.iter().map(|(_, c, a)| (*c, *a)))?,
            total_income,
            total_expenses,
            profit,
            months: months(&income, &expenses)?,
            trip_kilometers,
            mileage_allowance,
        })
    }
}

fn sum(amounts: impl IntoIterator<Item = Amount>, what: &str) -> Result<Amount> {
    Amount::checked_sum(amounts).ok_or_else(|| anyhow!("The {what} total is out of range"))
}

/// Groups `(category, amount)` pairs. The category enums order by declaration, so a `BTreeMap`
/// yields them in that order.
fn totals<C: Ord + Copy>(
    items: impl Iterator<Item = (C, Amount)>,
) -> Result<Vec<CategoryTotal<C>>> {
    let mut groups: BTreeMap<C, (usize, Amount)> = BTreeMap::new();
    for (category, amount) in items {
        let slot = groups.entry(category).or_insert((0, Amount::ZERO));
        slot.0 += 1;
        slot.1 = slot
            .1
            .checked_add(amount)
            .ok_or_else(|| anyhow!("A category total is out of range"))?;
    }
    Ok(groups
        .into_iter()
        .map(|(category, (entries, total))| CategoryTotal {
            category,
            entries,
            total,
        })
        .collect())
}

fn months<I, E>(
    income: &[(NaiveDate, I, Amount)],
    expenses: &[(NaiveDate, E, Amount)],
) -> Result<Vec<MonthTotal>> {
    (1..=12)
        .map(|month| {
            let in_month = |date: &NaiveDate| date.month() == month;
            let income = sum(
                income.iter().filter(|(d, _, _)| in_month(d)).map(|(_, _, a)| *a),
                "monthly income",
            )?;
            let expenses = sum(
                expenses
                    .iter()
                    .filter(|(d, _, _)| in_month(d))
                    .map(|(_, _, a)| *a),
                "monthly expenses",
            )?;
            let profit = income
                .checked_sub(expenses)
                .ok_or_else(|| anyhow!("The profit for month {month} is out of range"))?;
            Ok(MonthTotal {
                month,
                income,
                expenses,
                profit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{expense, income, trip};
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_year() {
        let report = ProfitLoss::for_year(&AppDocument::default(), 2024).unwrap();
        assert!(report.income.is_empty());
        assert!(report.expenses.is_empty());
        assert_eq!(report.profit, Amount::ZERO);
        assert_eq!(report.trip_kilometers, Decimal::ZERO);
    }

    #[test]
    fn test_totals_by_category_in_declaration_order() {
        let doc = AppDocument {
            income_entries: vec![
                income("1", "2024-01-10", "100.00", IncomeCategory::Storage),
                income("2", "2024-02-10", "250.50", IncomeCategory::Transport),
                income("3", "2024-03-10", "49.50", IncomeCategory::Transport),
                income("4", "2023-12-31", "999", IncomeCategory::Transport),
            ],
            expense_entries: vec![
                expense("a", "2024-01-05", "80", ExpenseCategory::Tolls),
                expense("b", "2024-01-06", "120", ExpenseCategory::Fuel),
                expense("c", "2025-01-01", "5", ExpenseCategory::Fuel),
            ],
            trip_log_entries: vec![
                trip("t1", "2024-04-01", "120.5"),
                trip("t2", "2024-04-02", "79.5"),
                trip("t3", "2023-04-02", "1000"),
            ],
            ..AppDocument::default()
        };

        let report = ProfitLoss::for_year(&doc, 2024).unwrap();
        let income: Vec<_> = report.income.iter().map(|t| t.category).collect();
        assert_eq!(
            income,
            vec![IncomeCategory::Transport, IncomeCategory::Storage]
        );
        assert_eq!(report.income[0].total, amount("300.00"));
        assert_eq!(report.income[0].entries, 2);

        let expenses: Vec<_> = report.expenses.iter().map(|t| t.category).collect();
        assert_eq!(expenses, vec![ExpenseCategory::Fuel, ExpenseCategory::Tolls]);

        assert_eq!(report.total_income, amount("400"));
        assert_eq!(report.total_expenses, amount("200"));
        assert_eq!(report.profit, amount("200"));
        assert_eq!(report.trip_kilometers, Decimal::from(200));
        assert_eq!(report.mileage_allowance, amount("60.00"));
    }

    #[test]
    fn test_monthly_breakdown() {
        let doc = AppDocument {
            income_entries: vec![
                income("1", "2024-01-10", "100", IncomeCategory::Transport),
                income("2", "2024-01-20", "50", IncomeCategory::Storage),
                income("3", "2024-12-31", "70", IncomeCategory::Transport),
                income("4", "2023-01-15", "999", IncomeCategory::Transport),
            ],
            expense_entries: vec![
                expense("a", "2024-01-05", "30", ExpenseCategory::Fuel),
                expense("b", "2024-06-01", "45.50", ExpenseCategory::Tolls),
            ],
            ..AppDocument::default()
        };

        let report = ProfitLoss::for_year(&doc, 2024).unwrap();
        assert_eq!(report.months.len(), 12);
        assert_eq!(
            report.months.iter().map(|m| m.month).collect::<Vec<_>>(),
            (1..=12).collect::<Vec<_>>()
        );

        let january = &report.months[0];
        assert_eq!(january.income, amount("150"));
        assert_eq!(january.expenses, amount("30"));
        assert_eq!(january.profit, amount("120"));

        let june = &report.months[5];
        assert_eq!(june.income, Amount::ZERO);
        assert_eq!(june.profit, amount("-45.50"));

        assert_eq!(report.months[11].income, amount("70"));
        assert_eq!(
            report.months[2],
            MonthTotal {
                month: 3,
                income: Amount::ZERO,
                expenses: Amount::ZERO,
                profit: Amount::ZERO,
            }
        );
    }

    #[test]
    fn test_mileage_allowance_rounds_to_cents() {
        let doc = AppDocument {
            trip_log_entries: vec![trip("t", "2024-04-01", "12.345")],
            ..AppDocument::default()
        };
        let report = ProfitLoss::for_year(&doc, 2024).unwrap();
        // 12.345 km * 0.30 = 3.7035
        assert_eq!(report.mileage_allowance, amount("3.70"));
    }

    #[test]
    fn test_overflowing_totals_are_an_error() {
        let doc: AppDocument = serde_json::from_str(
            r#"{"incomeEntries": [
                {"id": "a", "date": "2024-01-01", "description": "a", "amount": 5e28,
                 "category": "transport", "paymentMethod": "cash"},
                {"id": "b", "date": "2024-02-01", "description": "b", "amount": 5e28,
                 "category": "transport", "paymentMethod": "cash"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(doc.income_entries.len(), 2);

        let err = ProfitLoss::for_year(&doc, 2024).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err:#}");
        // The other year has nothing to add up.
        assert!(ProfitLoss::for_year(&doc, 2023).is_ok());
    }

    #[test]
    fn test_loss_is_negative() {
        let doc = AppDocument {
            expense_entries: vec![expense("a", "2024-01-05", "10", ExpenseCategory::Office)],
            ..AppDocument::default()
        };
        let report = ProfitLoss::for_year(&doc, 2024).unwrap();
        assert!(report.profit.is_negative());
    }
}
