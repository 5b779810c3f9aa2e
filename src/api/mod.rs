use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

mod error;

pub use error::{ApiError, ApiResult};
use error::json_response;

use crate::core::presets::{
    self, AccumulationOverlay, PresetSummary, WithdrawalOverlay, apply_preset, preset_by_id,
};
use crate::core::{
    AccumulationInput, Household, HouseholdType, IncomePeriod, MemberRecord, PlanInput,
    WithdrawalInput, estimate_pension, horizon_years, run_plan, simulate_accumulation,
    simulate_withdrawal,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AccumulationPayload {
    #[serde(flatten)]
    overlay: AccumulationOverlay,
    current_year: Option<i32>,
    target_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PensionPayload {
    household_type: Option<HouseholdType>,
    #[serde(rename = "husbandPension", alias = "pension")]
    primary_pension: Option<f64>,
    #[serde(rename = "wifePension")]
    spouse_pension: Option<f64>,
    #[serde(rename = "husbandIncomePeriods")]
    primary_income_periods: Option<Vec<IncomePeriod>>,
    #[serde(rename = "wifeIncomePeriods")]
    spouse_income_periods: Option<Vec<IncomePeriod>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    preset: Option<String>,
    accumulation: AccumulationPayload,
    withdrawal: WithdrawalOverlay,
    #[serde(alias = "income")]
    pension: PensionPayload,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

const MAX_HORIZON_YEARS: u32 = 100;
const MAX_AGE: u32 = 150;

fn at_most(field: &str, value: u32, limit: u32) -> ApiResult<u32> {
    if value > limit {
        return Err(ApiError::validation(field, format!("must be <= {limit}")));
    }
    Ok(value)
}

/// Finite and floored at zero, the way the input forms treat user entries.
fn non_negative(field: &str, value: f64) -> ApiResult<f64> {
    if !value.is_finite() {
        return Err(ApiError::validation(field, "must be a finite number"));
    }
    Ok(value.max(0.0))
}

fn percent_rate(field: &str, value: f64) -> ApiResult<f64> {
    if !value.is_finite() {
        return Err(ApiError::validation(field, "must be a finite number"));
    }
    if value <= -100.0 {
        return Err(ApiError::validation(field, "must be > -100"));
    }
    Ok(value)
}

fn sanitize_accumulation(mut input: AccumulationInput) -> ApiResult<AccumulationInput> {
    input.years = at_most("years", input.years, MAX_HORIZON_YEARS)?;
    input.initial_asset = non_negative("initialAsset", input.initial_asset)?;
    input.monthly_contribution = non_negative("monthlyContribution", input.monthly_contribution)?;
    input.annual_return = percent_rate("annualReturn", input.annual_return)?;
    input.annual_cost = percent_rate("annualCost", input.annual_cost)?;
    if let Some(rate) = input.inflation_rate {
        input.inflation_rate = Some(percent_rate("inflationRate", rate)?);
    }

    let net_return =
        input.annual_return - input.annual_cost - input.inflation_rate.unwrap_or(0.0);
    if net_return <= -100.0 {
        return Err(ApiError::validation(
            "annualCost",
            "net return after costs and inflation must be > -100",
        ));
    }

    if let Some(loan) = input.housing_loan.as_mut() {
        loan.amount = non_negative("loanAmount", loan.amount)?;
        loan.annual_rate = percent_rate("loanAnnualRate", loan.annual_rate)?;
        loan.years = at_most("loanYears", loan.years, MAX_HORIZON_YEARS)?;
        loan.start_year = at_most("loanStartYear", loan.start_year, MAX_HORIZON_YEARS)?.max(1);
    }
    if let Some(withdrawal) = input.partial_withdrawal.as_mut() {
        withdrawal.monthly = non_negative("withdrawalMonthly", withdrawal.monthly)?;
        withdrawal.start_year =
            at_most("withdrawalStartYear", withdrawal.start_year, MAX_HORIZON_YEARS)?.max(1);
    }
    Ok(input)
}

fn sanitize_withdrawal(mut input: WithdrawalInput) -> ApiResult<WithdrawalInput> {
    input.retirement_asset = non_negative("retirementAsset", input.retirement_asset)?;
    input.start_age = at_most("startAge", input.start_age, MAX_AGE)?;
    input.end_age = at_most("endAge", input.end_age, MAX_AGE)?;
    input.annual_return = percent_rate("annualReturn", input.annual_return)?;
    if let Some(rate) = input.inflation_rate {
        input.inflation_rate = Some(percent_rate("inflationRate", rate)?);
    }
    if let Some(care) = input.elder_care.as_mut() {
        care.monthly = non_negative("careMonthly", care.monthly)?;
        care.start_age = at_most("careStartAge", care.start_age, MAX_AGE)?;
    }
    Ok(input)
}

fn accumulation_from_payload(
    payload: &AccumulationPayload,
    base: &AccumulationInput,
) -> ApiResult<AccumulationInput> {
    let mut input = payload.overlay.apply(base);
    if payload.overlay.years.is_none() {
        match (payload.current_year, payload.target_year) {
            (Some(current), Some(target)) => input.years = horizon_years(current, target),
            (None, None) => {}
            _ => {
                return Err(ApiError::validation(
                    "targetYear",
                    "currentYear and targetYear must be supplied together",
                ));
            }
        }
    }
    sanitize_accumulation(input)
}

fn withdrawal_from_payload(
    overlay: &WithdrawalOverlay,
    base: &WithdrawalInput,
) -> ApiResult<WithdrawalInput> {
    sanitize_withdrawal(overlay.apply(base))
}

fn household_members(household: &Household) -> (MemberRecord, MemberRecord) {
    match household {
        Household::Single { primary } => (primary.clone(), MemberRecord::Manual { monthly: 0.0 }),
        Household::DualIncome { primary, spouse }
        | Household::PartTime { primary, spouse }
        | Household::SelfEmployed { primary, spouse } => (primary.clone(), spouse.clone()),
    }
}

/// Work history wins over a manual figure; with neither the base member stays.
fn member_from_payload(
    periods_field: &str,
    periods: Option<&[IncomePeriod]>,
    monthly_field: &str,
    monthly: Option<f64>,
    base: MemberRecord,
) -> ApiResult<MemberRecord> {
    if let Some(periods) = periods {
        let periods = periods
            .iter()
            .map(|period| {
                Ok(IncomePeriod {
                    annual_salary: non_negative(periods_field, period.annual_salary)?,
                    years: non_negative(periods_field, period.years)?,
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;
        return Ok(MemberRecord::WorkHistory(periods));
    }
    if let Some(monthly) = monthly {
        return Ok(MemberRecord::Manual {
            monthly: non_negative(monthly_field, monthly)?,
        });
    }
    Ok(base)
}

fn household_from_payload(payload: &PensionPayload, base: &Household) -> ApiResult<Household> {
    let (base_primary, base_spouse) = household_members(base);
    let primary = member_from_payload(
        "husbandIncomePeriods",
        payload.primary_income_periods.as_deref(),
        "husbandPension",
        payload.primary_pension,
        base_primary,
    )?;
    let spouse = member_from_payload(
        "wifeIncomePeriods",
        payload.spouse_income_periods.as_deref(),
        "wifePension",
        payload.spouse_pension,
        base_spouse,
    )?;
    let household_type = payload
        .household_type
        .unwrap_or_else(|| base.household_type());
    Ok(Household::from_parts(household_type, primary, spouse))
}

fn plan_input_from_payload(
    payload: PlanPayload,
    preset_override: Option<&str>,
) -> ApiResult<PlanInput> {
    let mut accumulation = presets::default_accumulation();
    let mut household = presets::default_household();
    if let Some(id) = preset_override.or(payload.preset.as_deref()) {
        let preset = preset_by_id(id).ok_or_else(|| ApiError::UnknownPreset(id.to_string()))?;
        debug!(preset = preset.id, "applying preset");
        (accumulation, household) = apply_preset(&accumulation, &household, &preset);
    }

    let accumulation = accumulation_from_payload(&payload.accumulation, &accumulation)?;
    let withdrawal = withdrawal_from_payload(&payload.withdrawal, &presets::default_withdrawal())?;
    let household = household_from_payload(&payload.pension, &household)?;
    let retirement_asset_override = payload
        .withdrawal
        .retirement_asset
        .map(|_| withdrawal.retirement_asset);

    Ok(PlanInput {
        accumulation,
        withdrawal,
        household,
        retirement_asset_override,
    })
}

/// Parses a plan request body, optionally forcing a preset over the body's own.
pub fn plan_input_from_json(json: &str, preset_override: Option<&str>) -> ApiResult<PlanInput> {
    let payload = serde_json::from_str::<PlanPayload>(json)?;
    plan_input_from_payload(payload, preset_override)
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/presets", get(presets_handler))
        .route("/api/accumulation", post(accumulation_handler))
        .route("/api/withdrawal", post(withdrawal_handler))
        .route("/api/pension", post(pension_handler))
        .route("/api/plan", post(plan_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "retirement planner API listening");
    info!("local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, router()).await
}

fn reject(rejection: JsonRejection) -> ApiError {
    ApiError::InvalidBody(rejection.body_text())
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn presets_handler() -> Response {
    let summaries: Vec<PresetSummary> = presets::all_presets()
        .iter()
        .map(PresetSummary::from)
        .collect();
    json_response(StatusCode::OK, summaries)
}

async fn accumulation_handler(
    payload: Result<Json<AccumulationPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload.map_err(reject)?;
    let input = accumulation_from_payload(&payload, &presets::default_accumulation())?;
    Ok(json_response(StatusCode::OK, simulate_accumulation(&input)))
}

async fn withdrawal_handler(
    payload: Result<Json<WithdrawalOverlay>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(overlay) = payload.map_err(reject)?;
    let input = withdrawal_from_payload(&overlay, &presets::default_withdrawal())?;
    Ok(json_response(StatusCode::OK, simulate_withdrawal(&input)))
}

async fn pension_handler(
    payload: Result<Json<PensionPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload.map_err(reject)?;
    let household = household_from_payload(&payload, &presets::default_household())?;
    Ok(json_response(StatusCode::OK, estimate_pension(&household)))
}

async fn plan_handler(payload: Result<Json<PlanPayload>, JsonRejection>) -> ApiResult<Response> {
    let Json(payload) = payload.map_err(reject)?;
    let input = plan_input_from_payload(payload, None)?;
    Ok(json_response(StatusCode::OK, run_plan(&input)))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}
