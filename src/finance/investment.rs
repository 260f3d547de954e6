use crate::error::CalcError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentInput {
    pub purchase_price: f64,
    pub annual_appreciation_pct: f64,
    pub monthly_rent: f64,
    /// Yearly rent increase, in percent
    pub annual_rent_escalation_pct: f64,
    pub holding_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearProjection {
    pub year: u32,
    pub property_value: f64,
    pub rent_collected: f64,
    pub cumulative_rent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentProjection {
    pub future_value: f64,
    pub capital_gain: f64,
    pub total_rental_income: f64,
    /// First-year rent over purchase price, in percent
    pub gross_rental_yield_pct: f64,
    pub total_return: f64,
    pub roi_pct: f64,
    pub yearly: Vec<YearProjection>,
}

pub fn project(input: &InvestmentInput) -> Result<InvestmentProjection, CalcError> {
    if !(input.purchase_price.is_finite() && input.purchase_price > 0.0) {
        return Err(CalcError::NotPositive {
            field: "purchase price",
        });
    }
    if input.holding_years == 0 {
        return Err(CalcError::NotPositive {
            field: "holding period",
        });
    }
    for (value, field) in [
        (input.monthly_rent, "monthly rent"),
        (input.annual_appreciation_pct, "appreciation rate"),
        (input.annual_rent_escalation_pct, "rent escalation"),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(CalcError::Negative { field });
        }
    }

    let appreciation = 1.0 + input.annual_appreciation_pct / 100.0;
    let escalation = 1.0 + input.annual_rent_escalation_pct / 100.0;

    let mut yearly = Vec::with_capacity(input.holding_years as usize);
    let mut value = input.purchase_price;
    let mut annual_rent = input.monthly_rent * 12.0;
    let mut cumulative_rent = 0.0;

    for year in 1..=input.holding_years {
        value *= appreciation;
        cumulative_rent += annual_rent;
        yearly.push(YearProjection {
            year,
            property_value: value,
            rent_collected: annual_rent,
            cumulative_rent,
        });
        annual_rent *= escalation;
    }

    let capital_gain = value - input.purchase_price;
    let total_return = capital_gain + cumulative_rent;
    Ok(InvestmentProjection {
        future_value: value,
        capital_gain,
        total_rental_income: cumulative_rent,
        gross_rental_yield_pct: input.monthly_rent * 12.0 / input.purchase_price * 100.0,
        total_return,
        roi_pct: total_return / input.purchase_price * 100.0,
        yearly,
    })
}
