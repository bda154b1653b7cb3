//! HIR layer tests
//!
//! End-to-end validation scenarios from source text to diagnostics.

pub mod tests_scenarios;
