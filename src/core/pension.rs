use tracing::debug;

use super::types::{Household, IncomePeriod, IncomeSummary, MemberRecord, PensionEstimate};

/// Full flat-rate pension per year after 40 years of enrollment.
pub const FULL_BASIC_PENSION_ANNUAL: f64 = 816_000.0;
pub const MAX_ENROLLMENT_YEARS: f64 = 40.0;
/// Earnings-related accrual per month of enrollment.
pub const EARNINGS_ACCRUAL_RATE: f64 = 0.005481;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Formula {
    EarningsRelated,
    FlatRateOnly,
}

fn capped_years(periods: &[IncomePeriod]) -> f64 {
    let total: f64 = periods.iter().map(|p| p.years.max(0.0)).sum();
    total.min(MAX_ENROLLMENT_YEARS)
}

fn flat_rate_monthly(periods: &[IncomePeriod]) -> f64 {
    capped_years(periods) / MAX_ENROLLMENT_YEARS * FULL_BASIC_PENSION_ANNUAL / 12.0
}

fn earnings_related_monthly(periods: &[IncomePeriod]) -> f64 {
    periods
        .iter()
        .map(|p| {
            let monthly_salary = p.annual_salary.max(0.0) / 12.0;
            let months = p.years.max(0.0) * 12.0;
            monthly_salary * EARNINGS_ACCRUAL_RATE * months / 12.0
        })
        .sum()
}

fn member_pension(record: &MemberRecord, formula: Formula) -> f64 {
    match record {
        MemberRecord::Manual { monthly } => monthly.max(0.0),
        MemberRecord::WorkHistory(periods) if periods.is_empty() => 0.0,
        MemberRecord::WorkHistory(periods) => match formula {
            Formula::EarningsRelated => {
                flat_rate_monthly(periods) + earnings_related_monthly(periods)
            }
            Formula::FlatRateOnly => flat_rate_monthly(periods),
        },
    }
}

/// Monthly public pension for each household member.
pub fn estimate_pension(household: &Household) -> PensionEstimate {
    let (primary_monthly, spouse_monthly) = match household {
        Household::Single { primary } => (member_pension(primary, Formula::EarningsRelated), 0.0),
        Household::DualIncome { primary, spouse } => (
            member_pension(primary, Formula::EarningsRelated),
            member_pension(spouse, Formula::EarningsRelated),
        ),
        Household::PartTime { primary, spouse } | Household::SelfEmployed { primary, spouse } => (
            member_pension(primary, Formula::EarningsRelated),
            member_pension(spouse, Formula::FlatRateOnly),
        ),
    };

    debug!(
        household = ?household.household_type(),
        primary_monthly,
        spouse_monthly,
        "estimated pension"
    );

    PensionEstimate {
        primary_monthly,
        spouse_monthly,
        total_monthly: primary_monthly + spouse_monthly,
    }
}

/// Retirement income: pensions plus the starting monthly drawdown.
pub fn estimate_income(pension: &PensionEstimate, monthly_withdrawal: f64) -> IncomeSummary {
    IncomeSummary {
        primary_pension: pension.primary_monthly,
        spouse_pension: pension.spouse_monthly,
        total_pension: pension.total_monthly,
        withdrawal: monthly_withdrawal,
        total_monthly_income: pension.total_monthly + monthly_withdrawal,
    }
}
