//! Error types for chart mutations.
//!
//! All errors are synchronous and locally recoverable: a rejected mutation
//! leaves the chart in its prior state. The `Unknown*` variants indicate a
//! caller operating on an identity after it was removed — an
//! internal-consistency bug to log, not a user-facing condition.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{EventId, GroupId, SectionId};

/// Errors produced by chart mutations and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// A scope/child attachment would make a node its own ancestor, or a
    /// recompute encountered a scope cycle. The attempted mutation is
    /// rejected; prior state is retained.
    #[error("scope graph cycle involving event {0}")]
    CyclicScopeGraph(EventId),

    /// A proposed span for a non-checkpoint event has end before start.
    #[error("invalid span: end {end} is before start {start}")]
    InvalidSpan { start: NaiveDate, end: NaiveDate },

    /// Operation referenced an event that no longer exists.
    #[error("unknown event {0}")]
    UnknownEvent(EventId),

    /// Operation referenced a group that no longer exists.
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),

    /// Operation referenced a section that no longer exists.
    #[error("unknown section {0}")]
    UnknownSection(SectionId),

    /// A direct span write was attempted on a scope. Scope spans are
    /// derived from their children and only change through aggregation.
    #[error("span of scope {0} is derived from its children")]
    ScopeSpanDerived(EventId),
}
