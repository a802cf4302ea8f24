//! Bounded analysis pipeline
//!
//! Every candidate is submitted at once; a counting gate admits at most
//! `concurrency` of them into clone, prep and scan at any moment. Results keep
//! the candidate order and each candidate's working tree is removed however
//! its analysis ends, cancellation included.

mod analysis;
mod cancel;
mod processor;
mod state;

pub use analysis::Analyzer;
pub use cancel::{CancelHandle, Cancellation};
pub use processor::BoundedProcessor;
pub use state::AnalysisState;
