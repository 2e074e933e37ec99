//! Data model and HTML rendering for election results reports.
//!
//! The crate owns no I/O and no tabulation: an external loader builds the
//! [model::Election] graph from already-computed totals, the [rcv] module
//! derives per-candidate round views for ranked-choice contests, and the
//! [html] module renders summary and round-by-round tables.

pub mod format;
pub mod html;
pub mod model;
pub mod rcv;

pub use crate::format::{format_number, format_percent, format_signed, percent_of, Phrases};
pub use crate::html::{contest_detail_path, contest_rcv_path, escape, Renderer};
pub use crate::model::{
    Choice, Contest, Election, Header, I18nText, ModelError, ResultStatType, ResultsMapping,
    VotingGroup,
};
pub use crate::rcv::{CandidateRound, RcvResults};
