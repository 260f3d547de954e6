use thiserror::Error;

/// Failure of a call to an external inference or data API.
///
/// Adapters never surface these to the UI directly; they log them and switch
/// to their deterministic fallback. The variants exist so the adapter can
/// tell a cold start (worth one retry) from everything else.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("model is loading, estimated {estimated_secs:.1}s")]
    ColdStart { estimated_secs: f64 },

    #[error("unexpected response from {service}: {detail}")]
    InvalidResponse {
        service: &'static str,
        detail: String,
    },

    #[error("result below confidence threshold: {0}")]
    LowConfidence(String),
}

impl AdapterError {
    pub fn invalid(service: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            detail: detail.into(),
        }
    }
}

/// Rejected calculator input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },
}
