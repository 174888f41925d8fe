//! Valuation engine: survival-weighted, discounted payment sums

use super::cashflows::{CashflowRow, ValuationResult};
use super::discount::DiscountCurve;
use super::progression::PaymentAmountModel;
use super::schedule::ScheduleGenerator;
use crate::contract::AnnuityContract;
use crate::error::Result;
use crate::mortality::{GenerationalTable, SurvivalInterpolator};

/// Values contracts against one generational table
pub struct ValuationEngine<'a> {
    table: &'a GenerationalTable,
}

impl<'a> ValuationEngine<'a> {
    pub fn new(table: &'a GenerationalTable) -> Self {
        Self { table }
    }

    /// Value a single contract
    ///
    /// Advance payments at inception are undiscounted by construction of the
    /// curve, so no timing correction is applied to the sum.
    pub fn value(&self, contract: &AnnuityContract) -> Result<ValuationResult> {
        contract.validate()?;

        let epochs = ScheduleGenerator::from_contract(contract)?.generate(self.table.max_age())?;
        let survival = SurvivalInterpolator::new(self.table, contract.initial_age)?;
        let curve = DiscountCurve::new(contract.rate.clone(), contract.frequency)?;
        let payments = PaymentAmountModel::from_contract(contract);

        let mut result = ValuationResult::new();
        for epoch in &epochs {
            let row = CashflowRow::new(
                epoch,
                survival.probability(epoch.t)?,
                curve.discount(epoch.t)?,
                payments.amount(epoch),
            );
            result.add_row(row);
        }
        result.unit_present_value = result.present_value / contract.base_amount;

        log::debug!(
            "Valued {:?} annuity at age {} over {} epochs: unit PV {:.8}, PV {:.2}",
            contract.timing,
            contract.initial_age,
            epochs.len(),
            result.unit_present_value,
            result.present_value
        );
        Ok(result)
    }
}

/// Value a contract on a generational table
pub fn value_annuity(contract: &AnnuityContract, table: &GenerationalTable) -> Result<ValuationResult> {
    ValuationEngine::new(table).value(contract)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{AmountBasis, Timing};
    use crate::error::AnnuityError;
    use crate::mortality::{build_generational_table, fixtures, survival, OMEGA};
    use crate::valuation::{InterestRate, ProgressionRule, StepSchedule};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn table_1958() -> GenerationalTable {
        build_generational_table(&fixtures::provider(), 1958, "PERM2000C", None).unwrap()
    }

    /// sum of v^k * k p_x for k in `range`
    fn direct_sum(table: &GenerationalTable, age: u32, rate: f64, range: std::ops::RangeInclusive<u32>) -> f64 {
        range
            .map(|k| {
                let kpx = table.lx(age + k).unwrap() / table.lx(age).unwrap();
                (1.0 + rate).powf(-(k as f64)) * kpx
            })
            .sum()
    }

    #[test]
    fn test_whole_life_arrears_matches_direct_summation() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Arrears, 48, 15_000.0, InterestRate::Fixed(0.0275));

        let result = value_annuity(&contract, &table).unwrap();
        let reference = 15_000.0 * direct_sum(&table, 48, 0.0275, 1..=(OMEGA - 48 - 1));

        assert_abs_diff_eq!(result.present_value, reference, epsilon = 1e-6);
        assert_relative_eq!(result.unit_present_value * 15_000.0, result.present_value, max_relative = 1e-12);
    }

    #[test]
    fn test_whole_life_advance_adds_initial_payment() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Advance, 48, 1.0, InterestRate::Fixed(0.0275));

        let result = value_annuity(&contract, &table).unwrap();
        let expected = 1.0 + direct_sum(&table, 48, 0.0275, 1..=(OMEGA - 48 - 1));

        assert_abs_diff_eq!(result.unit_present_value, expected, epsilon = 1e-10);
        assert_eq!(result.cashflows[0].discount, 1.0);
        assert_eq!(result.cashflows[0].survival, 1.0);
    }

    #[test]
    fn test_deferred_temporary_arrears_window() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Arrears, 48, 1.0, InterestRate::Fixed(0.03))
            .deferred(2)
            .temporary(10);

        let result = value_annuity(&contract, &table).unwrap();
        assert_eq!(result.cashflows.len(), 10);
        assert!(result.cashflows.iter().all(|r| r.t > 2.0 && r.t <= 12.0));

        let expected = direct_sum(&table, 48, 0.03, 3..=12);
        assert_abs_diff_eq!(result.unit_present_value, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_geometric_progression_in_arrears() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Arrears, 48, 1_000.0, InterestRate::Fixed(0.03))
            .with_progression(ProgressionRule::GeometricFixed { ratio: 1.02 });

        let result = value_annuity(&contract, &table).unwrap();
        assert_relative_eq!(result.cashflows[0].amount, 1_000.0);
        assert_relative_eq!(result.cashflows[1].amount, 1_020.0, max_relative = 1e-12);

        let level = value_annuity(&contract.clone().with_progression(ProgressionRule::Flat), &table).unwrap();
        assert!(result.present_value > level.present_value);
    }

    #[test]
    fn test_monthly_annual_basis_splits_amount() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Advance, 60, 12_000.0, InterestRate::Fixed(0.03))
            .temporary(5)
            .with_frequency(12);

        let result = value_annuity(&contract, &table).unwrap();
        assert_eq!(result.cashflows.len(), 60);
        assert!(result.cashflows.iter().all(|r| (r.amount - 1_000.0).abs() < 1e-9));

        // Five years of level payments, close to five times the annual amount
        assert!(result.present_value < 60_000.0);
        assert!(result.present_value > 50_000.0);

        let per_payment = value_annuity(
            &contract.clone().with_amount_basis(AmountBasis::PerPayment),
            &table,
        )
        .unwrap();
        assert_relative_eq!(per_payment.present_value, 12.0 * result.present_value, max_relative = 1e-12);
    }

    #[test]
    fn test_stepwise_rate_valuation() {
        let table = table_1958();
        let schedule = StepSchedule::from_pairs(&[(0.02, 2), (0.04, 5), (0.05, 6)]).unwrap();
        let contract = AnnuityContract::new(Timing::Arrears, 50, 1.0, InterestRate::Stepwise(schedule))
            .temporary(6);

        let result = value_annuity(&contract, &table).unwrap();
        let rates = [0.02, 0.02, 0.04, 0.04, 0.04, 0.05];
        let mut v = 1.0;
        let mut expected = 0.0;
        for (i, rate) in rates.iter().enumerate() {
            v /= 1.0 + rate;
            expected += v * survival(50, (i + 1) as f64, &table).unwrap();
        }
        assert_abs_diff_eq!(result.unit_present_value, expected, epsilon = 1e-12);

        let short = contract.clone().temporary(7);
        assert!(matches!(value_annuity(&short, &table), Err(AnnuityError::OutOfRange(_))));
    }

    #[test]
    fn test_huge_deferment_fails_without_panicking() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Arrears, 48, 1.0, InterestRate::Fixed(0.03))
            .deferred(u32::MAX)
            .temporary(5);
        assert!(matches!(value_annuity(&contract, &table), Err(AnnuityError::OutOfRange(_))));
    }

    #[test]
    fn test_age_outside_table_fails() {
        let table = table_1958();
        let contract = AnnuityContract::new(Timing::Arrears, 30, 1.0, InterestRate::Fixed(0.03));
        assert!(matches!(value_annuity(&contract, &table), Err(AnnuityError::OutOfRange(_))));
    }
}
