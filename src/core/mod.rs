mod accumulation;
mod pension;
mod plan;
pub mod presets;
mod rates;
mod types;
mod withdrawal;

pub use accumulation::simulate_accumulation;
pub use pension::{estimate_income, estimate_pension};
pub use plan::run_plan;
pub use rates::{horizon_years, loan_monthly_payment, monthly_rate};
pub use types::{
    AccumulationInput, AccumulationOutput, AccumulationYear, CareRecipient, Depletion, ElderCare,
    Household, HouseholdType, HousingLoan, IncomePeriod, IncomeSummary, MemberRecord,
    PartialWithdrawal, PensionEstimate, PlanInput, PlanResult, WithdrawalInput, WithdrawalOutput,
    WithdrawalYear,
};
pub use withdrawal::{safe_withdrawal_monthly, simulate_withdrawal};
