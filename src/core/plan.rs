use tracing::debug;

use super::accumulation::simulate_accumulation;
use super::pension::{estimate_income, estimate_pension};
use super::types::{PlanInput, PlanResult, WithdrawalInput};
use super::withdrawal::simulate_withdrawal;

/// Runs saving, drawdown and pension in sequence.
///
/// The drawdown starts from the projected final asset unless the plan carries
/// an explicit retirement asset.
pub fn run_plan(input: &PlanInput) -> PlanResult {
    let accumulation = simulate_accumulation(&input.accumulation);
    let retirement_asset = input
        .retirement_asset_override
        .unwrap_or(accumulation.final_asset);
    debug!(retirement_asset, "feeding drawdown");

    let withdrawal = simulate_withdrawal(&WithdrawalInput {
        retirement_asset,
        ..input.withdrawal.clone()
    });
    let pension = estimate_pension(&input.household);
    let income = estimate_income(&pension, withdrawal.monthly_withdrawal);

    PlanResult {
        accumulation,
        withdrawal,
        pension,
        income,
    }
}
