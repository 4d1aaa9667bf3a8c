//! Tracker event correlation
//!
//! Turns issue and pull request events into graph structure:
//!
//! - **Payloads**: tolerant decoding of tracker event documents
//! - **Extraction**: keyword and pattern rules over free text
//! - **Correlator**: lifecycle handlers that upsert nodes and link them

mod correlator;
mod extraction;
mod payload;

pub use correlator::{CorrelationOutcome, EventCorrelator};
pub use extraction::{
    ConceptRule, ExtractionRules, DEFAULT_DOCUMENT_PATTERN, DEFAULT_FIX_REFERENCE_PATTERN,
};
pub use payload::{ChangedFile, ChangedFiles, IssuePayload, LabelRef, PullRequestPayload};
