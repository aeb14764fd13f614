//! Library data model
//!
//! Papers are nodes, citations are directed edges between paper ids.

mod citation;
mod paper;

pub use citation::{Citation, CitationInput};
pub use paper::{decade_of, Paper, PaperDraft, PaperPatch, UNKNOWN};

pub(crate) use paper::or_default;
