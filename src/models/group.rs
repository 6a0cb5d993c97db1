//! Group bands: several events sharing one display row.
//!
//! A [`GroupBand`] holds an ordered member list; insertion order is display
//! order within the shared row. Membership is exclusive — an event belongs
//! to at most one band — and that invariant is enforced by the owning
//! [`Chart`](crate::chart::Chart), which rewires back-links on every add.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventId, SectionId, VerticalAlignment};

/// Opaque group identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Generates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An ordered set of events drawn on one shared row.
///
/// Each member still draws at its own date position; the band only merges
/// their vertical placement. A band that loses all members stays around as
/// an empty placeholder — callers decide whether to discard it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBand {
    id: GroupId,
    pub(crate) members: Vec<EventId>,
    pub(crate) section: Option<SectionId>,
    /// Fixed height for the shared row; `None` means auto from content.
    pub fixed_row_height: Option<u32>,
    /// Alignment applied to every member inside the shared row.
    pub vertical_alignment: VerticalAlignment,
}

impl GroupBand {
    /// Creates an empty band.
    pub fn new() -> Self {
        Self {
            id: GroupId::new(),
            members: Vec::new(),
            section: None,
            fixed_row_height: None,
            vertical_alignment: VerticalAlignment::default(),
        }
    }

    /// Sets a fixed height for the shared row.
    pub fn with_fixed_row_height(mut self, height: u32) -> Self {
        self.fixed_row_height = Some(height);
        self
    }

    /// Sets the member alignment inside the shared row.
    pub fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    /// This band's identity.
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Member ids in display order.
    #[inline]
    pub fn members(&self) -> &[EventId] {
        &self.members
    }

    /// Whether `event` is a member.
    pub fn contains(&self, event: EventId) -> bool {
        self.members.contains(&event)
    }

    /// Whether the band has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The section this band is partitioned into, if any.
    #[inline]
    pub fn section(&self) -> Option<SectionId> {
        self.section
    }
}

impl Default for GroupBand {
    fn default() -> Self {
        Self::new()
    }
}
