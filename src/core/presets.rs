use serde::{Deserialize, Serialize};

use super::types::{
    AccumulationInput, CareRecipient, ElderCare, Household, HousingLoan, IncomePeriod,
    MemberRecord, PartialWithdrawal, WithdrawalInput,
};

/// Horizon applied whenever a preset is selected.
pub const PRESET_HORIZON_YEARS: u32 = 20;

const DEFAULT_INFLATION_RATE: f64 = 2.0;
const DEFAULT_CARE_START_AGE: u32 = 80;

pub fn default_accumulation() -> AccumulationInput {
    AccumulationInput {
        initial_asset: 0.0,
        monthly_contribution: 100_000.0,
        years: PRESET_HORIZON_YEARS,
        annual_return: 5.0,
        annual_cost: 0.2,
        inflation_rate: None,
        housing_loan: None,
        partial_withdrawal: None,
    }
}

pub fn default_withdrawal() -> WithdrawalInput {
    WithdrawalInput {
        retirement_asset: 0.0,
        start_age: 65,
        end_age: 95,
        annual_return: 3.0,
        inflation_rate: None,
        elder_care: None,
    }
}

pub fn default_household() -> Household {
    Household::Single {
        primary: MemberRecord::Manual { monthly: 150_000.0 },
    }
}

fn default_housing_loan() -> HousingLoan {
    HousingLoan {
        amount: 30_000_000.0,
        annual_rate: 1.0,
        years: 35,
        start_year: 1,
    }
}

/// Partial accumulation parameters merged over a complete input.
///
/// `has_*` and `consider_inflation` flags switch an overlay on or off; the
/// detail fields then fill in over whatever the base already carried.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccumulationOverlay {
    pub initial_asset: Option<f64>,
    pub monthly_contribution: Option<f64>,
    pub years: Option<u32>,
    pub annual_return: Option<f64>,
    pub annual_cost: Option<f64>,
    pub consider_inflation: Option<bool>,
    pub inflation_rate: Option<f64>,
    pub has_housing_loan: Option<bool>,
    #[serde(alias = "housingLoanAmount")]
    pub loan_amount: Option<f64>,
    #[serde(alias = "housingLoanInterestRate")]
    pub loan_annual_rate: Option<f64>,
    #[serde(alias = "housingLoanYears")]
    pub loan_years: Option<u32>,
    #[serde(alias = "housingLoanStartYear")]
    pub loan_start_year: Option<u32>,
    pub has_withdrawal: Option<bool>,
    pub withdrawal_monthly: Option<f64>,
    pub withdrawal_start_year: Option<u32>,
}

impl AccumulationOverlay {
    pub fn apply(&self, base: &AccumulationInput) -> AccumulationInput {
        let inflation_rate = merge_toggle(
            self.consider_inflation,
            base.inflation_rate,
            || DEFAULT_INFLATION_RATE,
            |rate| self.inflation_rate.unwrap_or(rate),
        );

        let housing_loan = merge_toggle(
            self.has_housing_loan,
            base.housing_loan,
            default_housing_loan,
            |loan| HousingLoan {
                amount: self.loan_amount.unwrap_or(loan.amount),
                annual_rate: self.loan_annual_rate.unwrap_or(loan.annual_rate),
                years: self.loan_years.unwrap_or(loan.years),
                start_year: self.loan_start_year.unwrap_or(loan.start_year),
            },
        );

        let partial_withdrawal = merge_toggle(
            self.has_withdrawal,
            base.partial_withdrawal,
            || PartialWithdrawal {
                monthly: 0.0,
                start_year: 1,
            },
            |w| PartialWithdrawal {
                monthly: self.withdrawal_monthly.unwrap_or(w.monthly),
                start_year: self.withdrawal_start_year.unwrap_or(w.start_year),
            },
        );

        AccumulationInput {
            initial_asset: self.initial_asset.unwrap_or(base.initial_asset),
            monthly_contribution: self
                .monthly_contribution
                .unwrap_or(base.monthly_contribution),
            years: self.years.unwrap_or(base.years),
            annual_return: self.annual_return.unwrap_or(base.annual_return),
            annual_cost: self.annual_cost.unwrap_or(base.annual_cost),
            inflation_rate,
            housing_loan,
            partial_withdrawal,
        }
    }
}

/// Partial withdrawal-phase parameters merged over a complete input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WithdrawalOverlay {
    pub retirement_asset: Option<f64>,
    pub start_age: Option<u32>,
    pub end_age: Option<u32>,
    pub annual_return: Option<f64>,
    pub consider_inflation: Option<bool>,
    pub inflation_rate: Option<f64>,
    #[serde(alias = "hasElderCare")]
    pub has_care: Option<bool>,
    #[serde(alias = "elderCareMonthly")]
    pub care_monthly: Option<f64>,
    #[serde(alias = "elderCareStartAge")]
    pub care_start_age: Option<u32>,
    #[serde(alias = "elderCareRecipient")]
    pub care_recipient: Option<CareRecipient>,
}

impl WithdrawalOverlay {
    pub fn apply(&self, base: &WithdrawalInput) -> WithdrawalInput {
        let inflation_rate = merge_toggle(
            self.consider_inflation,
            base.inflation_rate,
            || DEFAULT_INFLATION_RATE,
            |rate| self.inflation_rate.unwrap_or(rate),
        );

        let elder_care = merge_toggle(
            self.has_care,
            base.elder_care,
            || ElderCare {
                monthly: 0.0,
                start_age: DEFAULT_CARE_START_AGE,
                recipient: CareRecipient::None,
            },
            |care| ElderCare {
                monthly: self.care_monthly.unwrap_or(care.monthly),
                start_age: self.care_start_age.unwrap_or(care.start_age),
                recipient: self.care_recipient.unwrap_or(care.recipient),
            },
        );

        WithdrawalInput {
            retirement_asset: self.retirement_asset.unwrap_or(base.retirement_asset),
            start_age: self.start_age.unwrap_or(base.start_age),
            end_age: self.end_age.unwrap_or(base.end_age),
            annual_return: self.annual_return.unwrap_or(base.annual_return),
            inflation_rate,
            elder_care,
        }
    }
}

/// Resolves an optional sub-input from an on/off flag.
///
/// `Some(false)` clears it, `Some(true)` enables it starting from the base (or
/// the default when the base had none), and an absent flag keeps the base's
/// state while still applying detail overrides to an enabled base.
fn merge_toggle<T>(
    flag: Option<bool>,
    base: Option<T>,
    default: impl FnOnce() -> T,
    fill: impl FnOnce(T) -> T,
) -> Option<T> {
    match (flag, base) {
        (Some(false), _) => None,
        (Some(true), base) => Some(fill(base.unwrap_or_else(default))),
        (None, Some(base)) => Some(fill(base)),
        (None, None) => None,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetCategory {
    Lifestyle,
    Risk,
}

#[derive(Debug, Clone)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: PresetCategory,
    pub accumulation: AccumulationOverlay,
    /// Replaces the household when present; risk presets leave it untouched.
    pub household: Option<Household>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: PresetCategory,
}

impl From<&Preset> for PresetSummary {
    fn from(preset: &Preset) -> Self {
        Self {
            id: preset.id,
            name: preset.name,
            description: preset.description,
            category: preset.category,
        }
    }
}

fn career(annual_salary: f64, years: f64) -> MemberRecord {
    MemberRecord::WorkHistory(vec![IncomePeriod {
        annual_salary,
        years,
    }])
}

fn renter(initial_asset: f64, monthly_contribution: f64, annual_return: f64) -> AccumulationOverlay {
    AccumulationOverlay {
        initial_asset: Some(initial_asset),
        monthly_contribution: Some(monthly_contribution),
        annual_return: Some(annual_return),
        annual_cost: Some(0.2),
        has_housing_loan: Some(false),
        consider_inflation: Some(false),
        ..AccumulationOverlay::default()
    }
}

fn homeowner(
    initial_asset: f64,
    monthly_contribution: f64,
    loan_amount: f64,
    loan_annual_rate: f64,
) -> AccumulationOverlay {
    AccumulationOverlay {
        initial_asset: Some(initial_asset),
        monthly_contribution: Some(monthly_contribution),
        annual_return: Some(4.0),
        annual_cost: Some(0.2),
        has_housing_loan: Some(true),
        loan_amount: Some(loan_amount),
        loan_annual_rate: Some(loan_annual_rate),
        loan_years: Some(35),
        loan_start_year: Some(1),
        consider_inflation: Some(false),
        ..AccumulationOverlay::default()
    }
}

fn risk_profile(annual_return: f64, annual_cost: f64, inflation_rate: f64) -> AccumulationOverlay {
    AccumulationOverlay {
        annual_return: Some(annual_return),
        annual_cost: Some(annual_cost),
        consider_inflation: Some(true),
        inflation_rate: Some(inflation_rate),
        ..AccumulationOverlay::default()
    }
}

pub fn lifestyle_presets() -> Vec<Preset> {
    vec![
        Preset {
            id: "single-renter",
            name: "Single, renting",
            description: "Single household living in rented housing",
            category: PresetCategory::Lifestyle,
            accumulation: renter(1_000_000.0, 50_000.0, 4.0),
            household: Some(Household::Single {
                primary: career(4_500_000.0, 40.0),
            }),
        },
        Preset {
            id: "single-homeowner",
            name: "Single, homeowner",
            description: "Single household repaying a housing loan",
            category: PresetCategory::Lifestyle,
            accumulation: homeowner(500_000.0, 80_000.0, 25_000_000.0, 1.2),
            household: Some(Household::Single {
                primary: career(5_500_000.0, 40.0),
            }),
        },
        Preset {
            id: "couple-dualincome",
            name: "Dual-income couple",
            description: "Two earners living in rented housing",
            category: PresetCategory::Lifestyle,
            accumulation: renter(2_000_000.0, 100_000.0, 4.5),
            household: Some(Household::DualIncome {
                primary: career(5_500_000.0, 40.0),
                spouse: career(4_000_000.0, 35.0),
            }),
        },
        Preset {
            id: "couple-homeowner",
            name: "Couple, homeowner",
            description: "Two earners repaying a housing loan",
            category: PresetCategory::Lifestyle,
            accumulation: homeowner(1_500_000.0, 120_000.0, 35_000_000.0, 1.5),
            household: Some(Household::DualIncome {
                primary: career(6_000_000.0, 40.0),
                spouse: career(3_500_000.0, 35.0),
            }),
        },
    ]
}

pub fn risk_presets() -> Vec<Preset> {
    vec![
        Preset {
            id: "conservative",
            name: "Conservative",
            description: "Capital preservation, low-risk allocation",
            category: PresetCategory::Risk,
            accumulation: risk_profile(2.0, 0.1, 1.5),
            household: None,
        },
        Preset {
            id: "moderate",
            name: "Moderate",
            description: "Balanced, medium-risk allocation",
            category: PresetCategory::Risk,
            accumulation: risk_profile(4.0, 0.2, 2.0),
            household: None,
        },
        Preset {
            id: "aggressive",
            name: "Aggressive",
            description: "Growth-oriented, high-risk allocation",
            category: PresetCategory::Risk,
            accumulation: risk_profile(6.0, 0.3, 2.5),
            household: None,
        },
    ]
}

pub fn all_presets() -> Vec<Preset> {
    let mut presets = lifestyle_presets();
    presets.extend(risk_presets());
    presets
}

pub fn preset_by_id(id: &str) -> Option<Preset> {
    all_presets().into_iter().find(|preset| preset.id == id)
}

/// Merges `preset` over the current inputs and resets the horizon.
pub fn apply_preset(
    accumulation: &AccumulationInput,
    household: &Household,
    preset: &Preset,
) -> (AccumulationInput, Household) {
    let mut merged = preset.accumulation.apply(accumulation);
    merged.years = PRESET_HORIZON_YEARS;
    let household = preset
        .household
        .clone()
        .unwrap_or_else(|| household.clone());
    (merged, household)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overlay_is_identity() {
        let mut base = default_accumulation();
        base.housing_loan = Some(default_housing_loan());
        base.inflation_rate = Some(1.0);
        assert_eq!(AccumulationOverlay::default().apply(&base), base);

        let withdrawal = default_withdrawal();
        assert_eq!(WithdrawalOverlay::default().apply(&withdrawal), withdrawal);
    }

    #[test]
    fn false_flags_clear_overlays() {
        let mut base = default_accumulation();
        base.housing_loan = Some(default_housing_loan());
        base.inflation_rate = Some(1.0);
        base.partial_withdrawal = Some(PartialWithdrawal {
            monthly: 10_000.0,
            start_year: 5,
        });

        let merged = AccumulationOverlay {
            has_housing_loan: Some(false),
            consider_inflation: Some(false),
            has_withdrawal: Some(false),
            loan_amount: Some(1.0),
            ..AccumulationOverlay::default()
        }
        .apply(&base);

        assert_eq!(merged.housing_loan, None);
        assert_eq!(merged.inflation_rate, None);
        assert_eq!(merged.partial_withdrawal, None);
    }

    #[test]
    fn true_flags_fill_details_over_defaults() {
        let merged = AccumulationOverlay {
            has_housing_loan: Some(true),
            loan_amount: Some(20_000_000.0),
            consider_inflation: Some(true),
            has_withdrawal: Some(true),
            withdrawal_monthly: Some(40_000.0),
            ..AccumulationOverlay::default()
        }
        .apply(&default_accumulation());

        let loan = merged.housing_loan.expect("loan enabled");
        assert_eq!(loan.amount, 20_000_000.0);
        assert_eq!(loan.years, 35);
        assert_eq!(loan.start_year, 1);
        assert_eq!(merged.inflation_rate, Some(DEFAULT_INFLATION_RATE));
        assert_eq!(
            merged.partial_withdrawal,
            Some(PartialWithdrawal {
                monthly: 40_000.0,
                start_year: 1,
            })
        );
    }

    #[test]
    fn details_without_flag_only_touch_enabled_overlays() {
        let overlay = AccumulationOverlay {
            loan_amount: Some(5_000_000.0),
            inflation_rate: Some(3.0),
            ..AccumulationOverlay::default()
        };
        let untouched = overlay.apply(&default_accumulation());
        assert_eq!(untouched.housing_loan, None);
        assert_eq!(untouched.inflation_rate, None);

        let mut base = default_accumulation();
        base.housing_loan = Some(default_housing_loan());
        base.inflation_rate = Some(1.0);
        let updated = overlay.apply(&base);
        assert_eq!(updated.housing_loan.map(|l| l.amount), Some(5_000_000.0));
        assert_eq!(updated.inflation_rate, Some(3.0));
    }

    #[test]
    fn withdrawal_overlay_enables_care() {
        let merged = WithdrawalOverlay {
            end_age: Some(100),
            has_care: Some(true),
            care_monthly: Some(80_000.0),
            care_recipient: Some(CareRecipient::Husband),
            ..WithdrawalOverlay::default()
        }
        .apply(&default_withdrawal());

        assert_eq!(merged.end_age, 100);
        let care = merged.elder_care.expect("care enabled");
        assert_eq!(care.monthly, 80_000.0);
        assert_eq!(care.start_age, DEFAULT_CARE_START_AGE);
        assert_eq!(care.recipient, CareRecipient::Husband);
    }

    #[test]
    fn lifestyle_preset_replaces_household_and_resets_horizon() {
        let mut current = default_accumulation();
        current.years = 7;
        let preset = preset_by_id("couple-homeowner").expect("known preset");
        let (accumulation, household) = apply_preset(&current, &default_household(), &preset);

        assert_eq!(accumulation.years, PRESET_HORIZON_YEARS);
        assert_eq!(accumulation.monthly_contribution, 120_000.0);
        assert_eq!(
            accumulation.housing_loan,
            Some(HousingLoan {
                amount: 35_000_000.0,
                annual_rate: 1.5,
                years: 35,
                start_year: 1,
            })
        );
        assert!(matches!(household, Household::DualIncome { .. }));
    }

    #[test]
    fn risk_preset_keeps_household_and_contributions() {
        let mut current = default_accumulation();
        current.monthly_contribution = 33_000.0;
        let preset = preset_by_id("aggressive").expect("known preset");
        let (accumulation, household) = apply_preset(&current, &default_household(), &preset);

        assert_eq!(accumulation.monthly_contribution, 33_000.0);
        assert_eq!(accumulation.annual_return, 6.0);
        assert_eq!(accumulation.inflation_rate, Some(2.5));
        assert_eq!(household, default_household());
    }

    #[test]
    fn preset_ids_are_unique_and_resolvable() {
        let presets = all_presets();
        assert_eq!(presets.len(), 7);
        for preset in &presets {
            assert_eq!(presets.iter().filter(|p| p.id == preset.id).count(), 1);
            assert!(preset_by_id(preset.id).is_some());
        }
        assert!(preset_by_id("retire-at-30").is_none());
    }
}
