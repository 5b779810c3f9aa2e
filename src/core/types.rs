use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HousingLoan {
    pub amount: f64,
    pub annual_rate: f64,
    pub years: u32,
    /// 1-based year of the accumulation horizon in which repayments begin.
    pub start_year: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialWithdrawal {
    pub monthly: f64,
    pub start_year: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationInput {
    pub initial_asset: f64,
    pub monthly_contribution: f64,
    pub years: u32,
    pub annual_return: f64,
    pub annual_cost: f64,
    /// Annual inflation in percent, subtracted from the net return when set.
    pub inflation_rate: Option<f64>,
    pub housing_loan: Option<HousingLoan>,
    pub partial_withdrawal: Option<PartialWithdrawal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationYear {
    pub year: u32,
    pub asset: f64,
    pub contribution: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationOutput {
    pub final_asset: f64,
    pub total_contribution: f64,
    pub total_gain: f64,
    pub yearly_data: Vec<AccumulationYear>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CareRecipient {
    Husband,
    Wife,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElderCare {
    pub monthly: f64,
    pub start_age: u32,
    pub recipient: CareRecipient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalInput {
    pub retirement_asset: f64,
    pub start_age: u32,
    pub end_age: u32,
    pub annual_return: f64,
    /// Annual inflation in percent; the withdrawal escalates monthly when set.
    pub inflation_rate: Option<f64>,
    pub elder_care: Option<ElderCare>,
}

impl WithdrawalInput {
    pub fn years(&self) -> u32 {
        self.end_age.saturating_sub(self.start_age)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalYear {
    pub year: u32,
    pub age: u32,
    pub start_balance: f64,
    pub withdrawal: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Depletion {
    pub years_until_depletion: f64,
    pub depletion_age: f64,
    pub sustained_through_horizon: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalOutput {
    pub monthly_withdrawal: f64,
    pub yearly_data: Vec<WithdrawalYear>,
    #[serde(flatten)]
    pub depletion: Depletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomePeriod {
    pub annual_salary: f64,
    pub years: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberRecord {
    /// Monthly pension entered directly.
    Manual { monthly: f64 },
    WorkHistory(Vec<IncomePeriod>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HouseholdType {
    Single,
    DualIncome,
    PartTime,
    SelfEmployed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Household {
    Single {
        primary: MemberRecord,
    },
    DualIncome {
        primary: MemberRecord,
        spouse: MemberRecord,
    },
    PartTime {
        primary: MemberRecord,
        spouse: MemberRecord,
    },
    SelfEmployed {
        primary: MemberRecord,
        spouse: MemberRecord,
    },
}

impl Household {
    pub fn household_type(&self) -> HouseholdType {
        match self {
            Household::Single { .. } => HouseholdType::Single,
            Household::DualIncome { .. } => HouseholdType::DualIncome,
            Household::PartTime { .. } => HouseholdType::PartTime,
            Household::SelfEmployed { .. } => HouseholdType::SelfEmployed,
        }
    }

    pub fn from_parts(
        household_type: HouseholdType,
        primary: MemberRecord,
        spouse: MemberRecord,
    ) -> Self {
        match household_type {
            HouseholdType::Single => Household::Single { primary },
            HouseholdType::DualIncome => Household::DualIncome { primary, spouse },
            HouseholdType::PartTime => Household::PartTime { primary, spouse },
            HouseholdType::SelfEmployed => Household::SelfEmployed { primary, spouse },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionEstimate {
    #[serde(rename = "husbandPension")]
    pub primary_monthly: f64,
    #[serde(rename = "wifePension")]
    pub spouse_monthly: f64,
    #[serde(rename = "totalPension")]
    pub total_monthly: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    #[serde(rename = "husbandPension")]
    pub primary_pension: f64,
    #[serde(rename = "wifePension")]
    pub spouse_pension: f64,
    pub total_pension: f64,
    pub withdrawal: f64,
    pub total_monthly_income: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanInput {
    pub accumulation: AccumulationInput,
    pub withdrawal: WithdrawalInput,
    pub household: Household,
    /// Lump sum used for drawdown instead of the projected final asset.
    pub retirement_asset_override: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub accumulation: AccumulationOutput,
    pub withdrawal: WithdrawalOutput,
    pub pension: PensionEstimate,
    pub income: IncomeSummary,
}
