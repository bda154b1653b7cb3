//! Foundation types for the stencil toolchain.
//!
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`AnalysisError`] - The only failure the core ever reports
//! - Identifier character classes shared by the scanner and micro-parsers
//!
//! This module has NO dependencies on other stencil modules.

mod error;
pub mod text;

pub use error::{AnalysisError, check_cancelled};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
pub use text_size;
