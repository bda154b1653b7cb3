//! IDE features: document state and editor-facing queries.
//!
//! This module sits between the validation engine (HIR) and an editor
//! integration. Offsets are UTF-8 byte offsets; converting to line/column is
//! left to the integration.
//!
//! ## Usage
//!
//! ```ignore
//! use stencil::ide::AnalysisHost;
//!
//! let mut host = AnalysisHost::new(provider, namespaces);
//! host.set_document("items.html", "{#for item in items}{item.name}{/for}");
//!
//! let analysis = host.analysis();
//! let diagnostics = analysis.settled_diagnostics("items.html", &cancel).await?;
//! ```

mod analysis;
mod navigation;

pub use analysis::{Analysis, AnalysisHost};
pub use navigation::{HoverResult, PartAt, hover, matching_tag, part_at, resolved_type_at};
