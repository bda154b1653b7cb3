//! Parser layer tests
//!
//! Tree-wide properties checked over well-formed and malformed documents:
//! - Range containment
//! - Closure monotonicity
//! - Idempotent lazy parsing
//! - Recovery determinism

pub mod tests_properties;
pub mod tests_recovery;
