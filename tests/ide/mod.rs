//! IDE layer tests
//!
//! Document host flows across several documents.

pub mod tests_host;
