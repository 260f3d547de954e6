//! Closed-form loan and investment calculators. Pure functions, recomputed
//! on every input change.

pub mod eligibility;
pub mod emi;
pub mod investment;

pub use eligibility::{assess, Eligibility, EligibilityInput, FOIR_LIMIT_PCT};
pub use emi::{calculate_emi, monthly_emi, principal_for_emi, AmortizationYear, EmiBreakdown};
pub use investment::{project, InvestmentInput, InvestmentProjection, YearProjection};
