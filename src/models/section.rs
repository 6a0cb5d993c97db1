//! Section partitions: named vertical blocks of rows.
//!
//! A [`SectionPartition`] holds an ordered list of row-producing units —
//! bare events (possibly scopes) or group bands. Once any section exists,
//! layout draws only sectioned units; sections are exhaustive by policy,
//! not automatically inclusive. A unit lives in at most one section;
//! the owning [`Chart`](crate::chart::Chart) enforces last-writer-wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventId, GroupId};

/// Opaque section identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SectionId(Uuid);

impl SectionId {
    /// Generates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One row-producing unit in a section (or in the flat top-level list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowUnit {
    /// A bare event or scope occupying one row.
    Event(EventId),
    /// A group band occupying one row shared by all its members.
    Group(GroupId),
}

/// A named partition holding an ordered list of rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionPartition {
    id: SectionId,
    pub name: String,
    pub(crate) rows: Vec<RowUnit>,
}

impl SectionPartition {
    /// Creates an empty named section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// This section's identity.
    #[inline]
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Row units in display order.
    #[inline]
    pub fn rows(&self) -> &[RowUnit] {
        &self.rows
    }

    /// Whether `unit` is one of this section's rows.
    pub fn contains(&self, unit: RowUnit) -> bool {
        self.rows.contains(&unit)
    }
}
