//! Estate Hub: the stateful core of a real-estate marketplace client.
//!
//! Buyer/seller messaging and search history stores with injected
//! persistence, home-loan and investment calculators, and adapters for the
//! external inference services with local fallbacks.

pub mod adapters;
pub mod config;
pub mod error;
pub mod finance;
pub mod identity;
pub mod listings;
pub mod messaging;
pub mod models;
pub mod notice;
pub mod search;
pub mod storage;
