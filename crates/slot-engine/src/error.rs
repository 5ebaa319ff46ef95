//! Error types for slot-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    /// Malformed or out-of-range scheduling input.
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    /// Bound enforcement left fewer candidates than a batch requires.
    #[error("Not enough candidate slots before end date {end_date}")]
    Exhausted { end_date: NaiveDate },

    /// A real-availability source failed.
    #[error("Availability provider error: {0}")]
    Provider(String),

    /// A constraint parser could not turn free text into constraints.
    #[error("Constraint parse error: {0}")]
    Parse(String),

    /// A detail enricher could not describe the chosen slot.
    #[error("Detail enrichment error: {0}")]
    Enrichment(String),
}

pub type Result<T> = std::result::Result<T, SlotError>;
