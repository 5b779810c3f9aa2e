use tracing::debug;

use super::rates::{loan_monthly_payment, monthly_rate};
use super::types::{AccumulationInput, AccumulationOutput, AccumulationYear};

#[derive(Debug, Clone, Copy)]
struct LoanWindow {
    start_month: u32,
    end_month: u32,
    payment: f64,
}

impl LoanWindow {
    fn payment_for(&self, month: u32) -> f64 {
        if month >= self.start_month && month < self.end_month {
            self.payment
        } else {
            0.0
        }
    }
}

fn first_month_of_year(year: u32) -> u32 {
    year.saturating_sub(1).saturating_mul(12).saturating_add(1)
}

/// Net annual return in percent after costs and, when requested, inflation.
fn net_annual_return(input: &AccumulationInput) -> f64 {
    let net = input.annual_return - input.annual_cost;
    match input.inflation_rate {
        Some(inflation) => net - inflation,
        None => net,
    }
}

/// Projects the saving phase month by month and snapshots every full year.
///
/// Reported assets are floored at zero and gains are always taken against the
/// floored balance, so the last yearly entry matches the terminal figures.
/// A zero-year horizon yields an empty series with the initial asset as the
/// final balance.
pub fn simulate_accumulation(input: &AccumulationInput) -> AccumulationOutput {
    let rate = monthly_rate(net_annual_return(input));
    let total_months = input.years.saturating_mul(12);

    let loan = input.housing_loan.map(|loan| {
        let start_month = first_month_of_year(loan.start_year);
        LoanWindow {
            start_month,
            end_month: start_month.saturating_add(loan.years.saturating_mul(12)),
            payment: loan_monthly_payment(loan.amount, loan.annual_rate, loan.years),
        }
    });
    let partial = input
        .partial_withdrawal
        .map(|w| (first_month_of_year(w.start_year), w.monthly));

    debug!(
        years = input.years,
        monthly_rate = rate,
        loan_payment = loan.map(|l| l.payment),
        "simulating accumulation"
    );

    let mut balance = input.initial_asset;
    let mut total_contribution = input.initial_asset;
    let mut yearly_data = Vec::new();

    for month in 1..=total_months {
        balance = balance * (1.0 + rate) + input.monthly_contribution;
        total_contribution += input.monthly_contribution;

        if let Some(loan) = &loan {
            balance -= loan.payment_for(month);
        }
        if let Some((start_month, monthly)) = partial {
            if month >= start_month {
                balance -= monthly;
            }
        }

        if month % 12 == 0 {
            let asset = balance.max(0.0);
            yearly_data.push(AccumulationYear {
                year: month / 12,
                asset,
                contribution: total_contribution,
                gain: asset - total_contribution,
            });
        }
    }

    let final_asset = balance.max(0.0);
    AccumulationOutput {
        final_asset,
        total_contribution,
        total_gain: final_asset - total_contribution,
        yearly_data,
    }
}
