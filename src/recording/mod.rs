//! Attempt recording for Abacus.
//!
//! The [`Recorder`] runs the atomic recording protocol against a
//! [`LearnerStore`](crate::storage::LearnerStore); [`ProgressApi`] is the
//! contract the session flow consumes.

pub mod api;
pub mod protocol;

pub use api::ProgressApi;
pub use protocol::{RecordOutcome, RecordRequest, Recorder};
