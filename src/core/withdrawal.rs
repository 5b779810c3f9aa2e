use tracing::debug;

use super::rates::{annuity_factor, monthly_rate};
use super::types::{Depletion, ElderCare, WithdrawalInput, WithdrawalOutput, WithdrawalYear};

/// Relative slack below zero before a balance counts as depleted. Solved plans
/// land on zero up to rounding, which must not read as running out.
const DEPLETION_TOLERANCE: f64 = 1e-9;

fn effective_monthly_rate(input: &WithdrawalInput) -> f64 {
    let nominal = monthly_rate(input.annual_return);
    match input.inflation_rate {
        Some(inflation) => (1.0 + nominal) / (1.0 + monthly_rate(inflation)) - 1.0,
        None => nominal,
    }
}

/// Care start age pulled inside the drawdown horizon.
fn bounded_care_start(care: &ElderCare, input: &WithdrawalInput) -> u32 {
    care.start_age
        .clamp(input.start_age, input.end_age.max(input.start_age))
}

/// Present value of the care stream, deferred until care begins.
fn care_present_value(care: &ElderCare, input: &WithdrawalInput, rate: f64) -> f64 {
    let total_months = input.years().saturating_mul(12);
    let care_start_month = (bounded_care_start(care, input) - input.start_age).saturating_mul(12);
    let care_months = total_months.saturating_sub(care_start_month);
    if care_months == 0 {
        return 0.0;
    }

    let deferral = (1.0 + rate).powf(f64::from(care_start_month));
    care.monthly * annuity_factor(rate, care_months) / deferral
}

/// Starting monthly withdrawal that exhausts the lump sum exactly at `end_age`,
/// after reserving the present value of any elder care expenses.
pub fn safe_withdrawal_monthly(input: &WithdrawalInput) -> f64 {
    let total_months = input.years().saturating_mul(12);
    if total_months == 0 {
        return 0.0;
    }

    let rate = effective_monthly_rate(input);
    let available = match &input.elder_care {
        Some(care) => input.retirement_asset - care_present_value(care, input, rate),
        None => input.retirement_asset,
    };
    if available <= 0.0 {
        return 0.0;
    }

    available / annuity_factor(rate, total_months)
}

#[derive(Debug, Clone, Copy)]
struct DepletionPoint {
    months: f64,
}

/// Solves the starting withdrawal, then replays the drawdown month by month.
///
/// The replay compounds at the nominal return while the solve works in real
/// terms, so the final balance can sit slightly off zero when inflation
/// escalation is active.
pub fn simulate_withdrawal(input: &WithdrawalInput) -> WithdrawalOutput {
    let monthly_withdrawal = safe_withdrawal_monthly(input);
    let rate = monthly_rate(input.annual_return);
    let escalation = input.inflation_rate.map(monthly_rate).unwrap_or(0.0);
    let years = input.years();
    let care = input
        .elder_care
        .map(|care| (bounded_care_start(&care, input), care.monthly));
    let tolerance = DEPLETION_TOLERANCE * input.retirement_asset.max(1.0);

    debug!(
        years,
        monthly_withdrawal,
        monthly_rate = rate,
        escalation,
        "simulating withdrawal"
    );

    let mut balance = input.retirement_asset;
    let mut current_withdrawal = monthly_withdrawal;
    let mut depleted_at: Option<DepletionPoint> = None;
    let mut yearly_data = Vec::new();

    for year in 0..years {
        let age = input.start_age + year;
        let start_balance = balance;
        let care_monthly = match care {
            Some((care_start, monthly)) if age >= care_start => monthly,
            _ => 0.0,
        };
        let mut yearly_withdrawal = 0.0;

        for month in 0..12 {
            let grown = balance * (1.0 + rate);
            let outflow = current_withdrawal + care_monthly;
            balance = grown - outflow;
            yearly_withdrawal += outflow;

            if depleted_at.is_none() && balance < -tolerance {
                let elapsed = f64::from(year) * 12.0 + f64::from(month);
                let fraction = if outflow > 0.0 {
                    (grown.max(0.0) / outflow).min(1.0)
                } else {
                    0.0
                };
                depleted_at = Some(DepletionPoint {
                    months: elapsed + fraction,
                });
            }

            current_withdrawal *= 1.0 + escalation;
        }

        yearly_data.push(WithdrawalYear {
            year: year + 1,
            age,
            start_balance: start_balance.max(0.0),
            withdrawal: yearly_withdrawal,
            end_balance: balance.max(0.0),
        });
    }

    WithdrawalOutput {
        monthly_withdrawal,
        yearly_data,
        depletion: depletion_metrics(input, depleted_at),
    }
}

fn depletion_metrics(input: &WithdrawalInput, depleted_at: Option<DepletionPoint>) -> Depletion {
    match depleted_at {
        Some(point) => {
            let years_until_depletion = point.months / 12.0;
            Depletion {
                years_until_depletion,
                depletion_age: f64::from(input.start_age) + years_until_depletion,
                sustained_through_horizon: false,
            }
        }
        None => Depletion {
            years_until_depletion: f64::from(input.years()),
            depletion_age: f64::from(input.end_age.max(input.start_age)),
            sustained_through_horizon: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CareRecipient;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_input() -> WithdrawalInput {
        WithdrawalInput {
            retirement_asset: 30_000_000.0,
            start_age: 65,
            end_age: 95,
            annual_return: 3.0,
            inflation_rate: None,
            elder_care: None,
        }
    }

    #[test]
    fn reference_scenario_solves_the_annuity_payment() {
        let input = sample_input();
        let result = simulate_withdrawal(&input);

        let rate = monthly_rate(3.0);
        let expected = 30_000_000.0 * rate / (1.0 - (1.0 + rate).powi(-360));
        assert_approx_tol(result.monthly_withdrawal, expected, 1e-6);
        assert!(result.monthly_withdrawal > 120_000.0 && result.monthly_withdrawal < 130_000.0);

        assert_eq!(result.yearly_data.len(), 30);
        let last = result.yearly_data.last().expect("non-empty series");
        assert_eq!(last.year, 30);
        assert_eq!(last.age, 94);
        assert_approx_tol(last.end_balance, 0.0, 1e-3);
        assert!(result.depletion.sustained_through_horizon);
        assert_eq!(result.depletion.depletion_age, 95.0);
        assert_eq!(result.depletion.years_until_depletion, 30.0);
    }

    #[test]
    fn zero_return_spreads_the_asset_evenly() {
        let input = WithdrawalInput {
            annual_return: 0.0,
            ..sample_input()
        };
        let monthly = safe_withdrawal_monthly(&input);
        assert_approx_tol(monthly * 360.0, 30_000_000.0, 1e-6);
    }

    #[test]
    fn empty_or_inverted_horizon_gives_zero_result() {
        for end_age in [65, 60] {
            let input = WithdrawalInput {
                end_age,
                ..sample_input()
            };
            let result = simulate_withdrawal(&input);
            assert_eq!(result.monthly_withdrawal, 0.0);
            assert!(result.yearly_data.is_empty());
            assert_eq!(result.depletion.years_until_depletion, 0.0);
        }
    }

    #[test]
    fn start_balances_chain_from_previous_year() {
        let result = simulate_withdrawal(&sample_input());
        assert_eq!(result.yearly_data[0].start_balance, 30_000_000.0);
        for pair in result.yearly_data.windows(2) {
            assert_eq!(pair[1].start_balance, pair[0].end_balance);
            assert_eq!(pair[1].age, pair[0].age + 1);
        }
    }

    #[test]
    fn elder_care_reservation_still_exhausts_at_horizon() {
        let input = WithdrawalInput {
            elder_care: Some(ElderCare {
                monthly: 50_000.0,
                start_age: 85,
                recipient: CareRecipient::Wife,
            }),
            ..sample_input()
        };
        let without_care = safe_withdrawal_monthly(&sample_input());
        let result = simulate_withdrawal(&input);

        assert!(result.monthly_withdrawal < without_care);
        assert_approx_tol(result.yearly_data[19].withdrawal, 12.0 * result.monthly_withdrawal, 1e-6);
        assert_approx_tol(
            result.yearly_data[20].withdrawal,
            12.0 * (result.monthly_withdrawal + 50_000.0),
            1e-6,
        );
        let last = result.yearly_data.last().expect("non-empty series");
        assert_approx_tol(last.end_balance, 0.0, 1e-3);
        assert!(result.depletion.sustained_through_horizon);
    }

    #[test]
    fn care_start_outside_horizon_is_clamped() {
        let early = WithdrawalInput {
            elder_care: Some(ElderCare {
                monthly: 10_000.0,
                start_age: 50,
                recipient: CareRecipient::Husband,
            }),
            ..sample_input()
        };
        let at_start = WithdrawalInput {
            elder_care: Some(ElderCare {
                monthly: 10_000.0,
                start_age: 65,
                recipient: CareRecipient::Husband,
            }),
            ..sample_input()
        };
        assert_eq!(
            safe_withdrawal_monthly(&early),
            safe_withdrawal_monthly(&at_start)
        );

        let late = WithdrawalInput {
            elder_care: Some(ElderCare {
                monthly: 10_000.0,
                start_age: 120,
                recipient: CareRecipient::None,
            }),
            ..sample_input()
        };
        assert_eq!(
            safe_withdrawal_monthly(&late),
            safe_withdrawal_monthly(&sample_input())
        );
    }

    #[test]
    fn care_exceeding_asset_drains_it_mid_year() {
        let input = WithdrawalInput {
            retirement_asset: 1_000.0,
            start_age: 65,
            end_age: 67,
            annual_return: 0.0,
            inflation_rate: None,
            elder_care: Some(ElderCare {
                monthly: 100.0,
                start_age: 65,
                recipient: CareRecipient::None,
            }),
        };
        let result = simulate_withdrawal(&input);

        assert_eq!(result.monthly_withdrawal, 0.0);
        assert!(!result.depletion.sustained_through_horizon);
        assert_approx_tol(result.depletion.years_until_depletion, 10.0 / 12.0, 1e-12);
        assert_approx_tol(result.depletion.depletion_age, 65.0 + 10.0 / 12.0, 1e-12);
        assert_eq!(result.yearly_data[0].end_balance, 0.0);
        assert_eq!(result.yearly_data[1].start_balance, 0.0);
        assert_eq!(result.yearly_data[1].withdrawal, 1_200.0);
    }

    #[test]
    fn depletion_inside_a_month_is_interpolated() {
        let input = WithdrawalInput {
            retirement_asset: 1_050.0,
            start_age: 70,
            end_age: 72,
            annual_return: 0.0,
            inflation_rate: None,
            elder_care: Some(ElderCare {
                monthly: 100.0,
                start_age: 70,
                recipient: CareRecipient::None,
            }),
        };
        let result = simulate_withdrawal(&input);
        assert_approx_tol(result.depletion.years_until_depletion, 10.5 / 12.0, 1e-12);
    }

    #[test]
    fn inflation_escalates_after_the_first_month() {
        let input = WithdrawalInput {
            inflation_rate: Some(2.0),
            ..sample_input()
        };
        let result = simulate_withdrawal(&input);
        let escalation = monthly_rate(2.0);
        let first_year: f64 = (0..12)
            .map(|k| result.monthly_withdrawal * (1.0 + escalation).powi(k))
            .sum();

        assert_approx_tol(result.yearly_data[0].withdrawal, first_year, 1e-6);
        assert_approx_tol(
            result.yearly_data[1].withdrawal / result.yearly_data[0].withdrawal,
            1.02,
            1e-9,
        );
        assert!(result.monthly_withdrawal < safe_withdrawal_monthly(&sample_input()));
        assert!(result.depletion.sustained_through_horizon);
    }

    #[test]
    fn solving_an_extreme_horizon_stays_finite() {
        let input = WithdrawalInput {
            start_age: 0,
            end_age: u32::MAX,
            elder_care: Some(ElderCare {
                monthly: 50_000.0,
                start_age: u32::MAX,
                recipient: CareRecipient::Wife,
            }),
            ..sample_input()
        };
        let monthly = safe_withdrawal_monthly(&input);

        assert!(monthly.is_finite());
        assert_approx_tol(monthly, 30_000_000.0 * monthly_rate(3.0), 1e-3);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_solved_withdrawal_lands_on_zero(
            asset in 1_000_000u32..200_000_000,
            start_age in 50u32..75,
            span in 1u32..45,
            return_bp in 0u32..800
        ) {
            let input = WithdrawalInput {
                retirement_asset: asset as f64,
                start_age,
                end_age: start_age + span,
                annual_return: return_bp as f64 / 100.0,
                inflation_rate: None,
                elder_care: None,
            };
            let result = simulate_withdrawal(&input);

            prop_assert_eq!(result.yearly_data.len(), span as usize);
            prop_assert!(result.monthly_withdrawal > 0.0);
            let last = result.yearly_data.last().expect("non-empty series");
            prop_assert!(last.end_balance <= asset as f64 * 1e-9);
            for year in &result.yearly_data {
                prop_assert!(year.end_balance >= 0.0 && year.start_balance >= 0.0);
            }
        }
    }
}
