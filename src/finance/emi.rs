use crate::error::CalcError;
use serde::Serialize;

/// One year of the amortization table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmiBreakdown {
    pub emi: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub schedule: Vec<AmortizationYear>,
}

fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 12.0 / 100.0
}

fn validate(principal: f64, annual_rate_pct: f64, tenure_months: u32) -> Result<(), CalcError> {
    if !(principal.is_finite() && principal > 0.0) {
        return Err(CalcError::NotPositive { field: "principal" });
    }
    if tenure_months == 0 {
        return Err(CalcError::NotPositive { field: "tenure" });
    }
    if !(annual_rate_pct.is_finite() && annual_rate_pct >= 0.0) {
        return Err(CalcError::Negative { field: "interest rate" });
    }
    Ok(())
}

/// Equated monthly installment: `P·r·(1+r)^n / ((1+r)^n − 1)`.
/// A zero rate spreads the principal evenly.
pub fn monthly_emi(principal: f64, annual_rate_pct: f64, tenure_months: u32) -> Result<f64, CalcError> {
    validate(principal, annual_rate_pct, tenure_months)?;
    let r = monthly_rate(annual_rate_pct);
    let n = tenure_months as i32;
    if r == 0.0 {
        return Ok(principal / tenure_months as f64);
    }
    let growth = (1.0 + r).powi(n);
    Ok(principal * r * growth / (growth - 1.0))
}

/// Largest principal whose EMI does not exceed `emi`
pub fn principal_for_emi(emi: f64, annual_rate_pct: f64, tenure_months: u32) -> f64 {
    if emi <= 0.0 || tenure_months == 0 || annual_rate_pct < 0.0 {
        return 0.0;
    }
    let r = monthly_rate(annual_rate_pct);
    if r == 0.0 {
        return emi * tenure_months as f64;
    }
    let growth = (1.0 + r).powi(tenure_months as i32);
    emi * (growth - 1.0) / (r * growth)
}

/// EMI plus totals and a yearly amortization table
pub fn calculate_emi(
    principal: f64,
    annual_rate_pct: f64,
    tenure_months: u32,
) -> Result<EmiBreakdown, CalcError> {
    let emi = monthly_emi(principal, annual_rate_pct, tenure_months)?;
    let r = monthly_rate(annual_rate_pct);

    let mut schedule = Vec::new();
    let mut balance = principal;
    let mut year = AmortizationYear {
        year: 1,
        principal_paid: 0.0,
        interest_paid: 0.0,
        closing_balance: principal,
    };

    for month in 1..=tenure_months {
        let interest = balance * r;
        let principal_part = (emi - interest).min(balance);
        balance = (balance - principal_part).max(0.0);

        year.interest_paid += interest;
        year.principal_paid += principal_part;
        year.closing_balance = balance;

        if month % 12 == 0 || month == tenure_months {
            let next = year.year + 1;
            schedule.push(std::mem::replace(
                &mut year,
                AmortizationYear {
                    year: next,
                    principal_paid: 0.0,
                    interest_paid: 0.0,
                    closing_balance: balance,
                },
            ));
        }
    }

    let total_payment = emi * tenure_months as f64;
    Ok(EmiBreakdown {
        emi,
        total_payment,
        total_interest: total_payment - principal,
        schedule,
    })
}
