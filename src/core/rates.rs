/// Monthly rate with the same yearly compounding as `annual_percent`.
pub fn monthly_rate(annual_percent: f64) -> f64 {
    (1.0 + annual_percent / 100.0).powf(1.0 / 12.0) - 1.0
}

/// Fixed monthly payment that fully amortizes `principal` over `term_years`.
///
/// The payment is constant for the whole term; callers decide when the loan
/// is active.
pub fn loan_monthly_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    if principal <= 0.0 || term_years == 0 {
        return 0.0;
    }

    let rate = monthly_rate(annual_rate_percent);
    let months = f64::from(term_years) * 12.0;
    if rate == 0.0 {
        return principal / months;
    }

    let growth = (1.0 + rate).powf(months);
    principal * rate * growth / (growth - 1.0)
}

/// Present value of 1 paid at the end of each of `months` periods.
pub(crate) fn annuity_factor(rate: f64, months: u32) -> f64 {
    let months = f64::from(months);
    if rate == 0.0 {
        return months;
    }
    (1.0 - (1.0 + rate).powf(-months)) / rate
}

/// Accumulation horizon between two calendar years, never shorter than a year.
pub fn horizon_years(current_year: i32, target_year: i32) -> u32 {
    target_year.saturating_sub(current_year).max(1) as u32
}
