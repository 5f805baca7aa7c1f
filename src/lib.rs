//! Credscope: Credit Default EDA Library
//!
//! Loads a loan application table, cleans it into an analysis-ready table,
//! filters it by applicant profile and computes five dashboard pages of
//! default-risk statistics.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
