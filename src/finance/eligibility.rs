use super::emi::{monthly_emi, principal_for_emi};
use crate::error::CalcError;
use serde::Serialize;

/// Lenders cap fixed obligations at this share of monthly income
pub const FOIR_LIMIT_PCT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityInput {
    pub monthly_income: f64,
    pub existing_emi: f64,
    pub loan_amount: f64,
    pub annual_rate_pct: f64,
    pub tenure_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eligibility {
    pub emi: f64,
    /// (existing EMI + new EMI) / income, in percent
    pub foir_pct: f64,
    pub is_eligible: bool,
    /// EMI headroom left under the FOIR limit
    pub max_affordable_emi: f64,
    pub max_eligible_loan: f64,
}

/// Home-loan affordability check against the FOIR limit
pub fn assess(input: &EligibilityInput) -> Result<Eligibility, CalcError> {
    if !(input.monthly_income.is_finite() && input.monthly_income > 0.0) {
        return Err(CalcError::NotPositive {
            field: "monthly income",
        });
    }
    if !(input.existing_emi.is_finite() && input.existing_emi >= 0.0) {
        return Err(CalcError::Negative {
            field: "existing EMI",
        });
    }

    let tenure_months = input.tenure_years.saturating_mul(12);
    let emi = monthly_emi(input.loan_amount, input.annual_rate_pct, tenure_months)?;
    let foir_pct = (input.existing_emi + emi) / input.monthly_income * 100.0;

    let max_affordable_emi =
        (input.monthly_income * FOIR_LIMIT_PCT / 100.0 - input.existing_emi).max(0.0);
    let max_eligible_loan = principal_for_emi(max_affordable_emi, input.annual_rate_pct, tenure_months);

    Ok(Eligibility {
        emi,
        foir_pct,
        is_eligible: foir_pct <= FOIR_LIMIT_PCT,
        max_affordable_emi,
        max_eligible_loan,
    })
}
