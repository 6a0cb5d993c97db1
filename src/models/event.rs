//! Schedulable event nodes.
//!
//! An [`EventNode`] is a single schedulable unit: a planned span, an
//! optional revised span for variance display, completion percentage,
//! checkpoint flag, locked move bounds, a layer id, and membership links
//! (parent scope, owning group, owning section). A node with children is a
//! *scope*: its span is derived from its children by aggregation and never
//! written directly.
//!
//! Nodes live in a [`Chart`](crate::chart::Chart) arena and reference each
//! other by [`EventId`], never by live pointers — the arena enforces the
//! tree/ownership invariants.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GroupId, SectionId, TimeSpan};

/// Opaque event identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Vertical placement of an event bar inside a row taller than the bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

impl VerticalAlignment {
    /// Draw offset of content of `content_height` inside a row of
    /// `row_height`. Saturates to 0 when the content is taller than the row.
    pub fn offset_within(self, row_height: u32, content_height: u32) -> u32 {
        let free = row_height.saturating_sub(content_height);
        match self {
            VerticalAlignment::Top => 0,
            VerticalAlignment::Center => free / 2,
            VerticalAlignment::Bottom => free,
        }
    }
}

/// A schedulable unit on the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventNode {
    id: EventId,
    /// Display name; also drives auto row height at the rendering layer.
    pub name: String,
    pub(crate) planned_span: TimeSpan,
    pub(crate) revised_span: Option<TimeSpan>,
    pub(crate) percent_complete: u8,
    pub(crate) is_checkpoint: bool,
    /// Earliest instant a move may place the start at.
    pub locked_not_before: Option<NaiveDate>,
    /// Latest instant a move may place the end at.
    pub locked_not_after: Option<NaiveDate>,
    /// Visibility/opacity bucket, independent of scope/group/section.
    pub layer: i32,
    pub(crate) parent_scope: Option<EventId>,
    pub(crate) children: Vec<EventId>,
    pub(crate) group: Option<GroupId>,
    pub(crate) section: Option<SectionId>,
    /// Per-event fixed row height; `None` means auto from content.
    pub fixed_row_height: Option<u32>,
    pub vertical_alignment: VerticalAlignment,
    pub(crate) hidden: bool,
}

impl EventNode {
    /// Creates a standalone event covering `span`.
    pub fn new(name: impl Into<String>, span: TimeSpan) -> Self {
        Self {
            id: EventId::new(),
            name: name.into(),
            planned_span: span,
            revised_span: None,
            percent_complete: 0,
            is_checkpoint: false,
            locked_not_before: None,
            locked_not_after: None,
            layer: 0,
            parent_scope: None,
            children: Vec::new(),
            group: None,
            section: None,
            fixed_row_height: None,
            vertical_alignment: VerticalAlignment::default(),
            hidden: false,
        }
    }

    /// Creates a checkpoint (zero-duration milestone) at `date`.
    pub fn checkpoint(name: impl Into<String>, date: NaiveDate) -> Self {
        let mut node = Self::new(name, TimeSpan::point(date));
        node.is_checkpoint = true;
        node
    }

    /// Sets the revised span shown for planned-vs-actual variance.
    pub fn with_revised_span(mut self, span: TimeSpan) -> Self {
        self.revised_span = Some(span);
        self
    }

    /// Sets the completion percentage (clamped to 0..=100).
    pub fn with_percent_complete(mut self, percent: u8) -> Self {
        self.percent_complete = percent.min(100);
        self
    }

    /// Sets the layer id.
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the locked move window. An inverted pair is normalized so the
    /// earlier bound is always `not_before`.
    pub fn with_locked_window(
        mut self,
        not_before: Option<NaiveDate>,
        not_after: Option<NaiveDate>,
    ) -> Self {
        let (not_before, not_after) = match (not_before, not_after) {
            (Some(a), Some(b)) if b < a => (Some(b), Some(a)),
            pair => pair,
        };
        self.locked_not_before = not_before;
        self.locked_not_after = not_after;
        self
    }

    /// Sets a fixed row height, overriding auto measurement.
    pub fn with_fixed_row_height(mut self, height: u32) -> Self {
        self.fixed_row_height = Some(height);
        self
    }

    /// Sets the vertical alignment inside a fixed-height row.
    pub fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    /// This node's identity.
    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// The planned span. For scopes this is the aggregated bounding span.
    #[inline]
    pub fn planned_span(&self) -> TimeSpan {
        self.planned_span
    }

    /// The revised span, if one was set.
    #[inline]
    pub fn revised_span(&self) -> Option<TimeSpan> {
        self.revised_span
    }

    /// The span a renderer should draw: revised when present, else planned.
    /// The revised span never participates in scope aggregation.
    #[inline]
    pub fn display_span(&self) -> TimeSpan {
        self.revised_span.unwrap_or(self.planned_span)
    }

    /// Completion percentage, 0..=100.
    #[inline]
    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    /// Whether this is a zero-duration milestone.
    #[inline]
    pub fn is_checkpoint(&self) -> bool {
        self.is_checkpoint
    }

    /// Whether this node aggregates children (non-empty child list).
    #[inline]
    pub fn is_scope(&self) -> bool {
        !self.children.is_empty()
    }

    /// The scope this node belongs to, if any.
    #[inline]
    pub fn parent_scope(&self) -> Option<EventId> {
        self.parent_scope
    }

    /// Child ids, in attach order. Non-empty only for scopes.
    #[inline]
    pub fn children(&self) -> &[EventId] {
        &self.children
    }

    /// The group band owning this event's row, if any.
    #[inline]
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// The section this event is partitioned into, if any.
    #[inline]
    pub fn section(&self) -> Option<SectionId> {
        self.section
    }

    /// Whether the event is hidden (e.g. under a collapsed scope).
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Clamps `new_span` into the locked move window, preserving duration
    /// where possible.
    ///
    /// Pure: does not mutate the event. If shifting cannot fit the full
    /// duration inside the window, the result collapses to a zero-width
    /// span at the nearest boundary. Idempotent: clamping a clamped span
    /// returns it unchanged.
    pub fn clamp_move(&self, new_span: TimeSpan) -> TimeSpan {
        let duration = new_span.duration_days();

        if let (Some(not_before), Some(not_after)) =
            (self.locked_not_before, self.locked_not_after)
        {
            let window = (not_after - not_before).num_days();
            if window < duration {
                // Window narrower than the duration: zero-width at the
                // boundary nearest the requested start.
                let at = new_span.start().clamp(not_before, not_after);
                return TimeSpan::point(at);
            }
        }

        let mut span = new_span;
        if let Some(not_before) = self.locked_not_before {
            if span.start() < not_before {
                span = span.shifted_days((not_before - span.start()).num_days());
            }
        }
        if let Some(not_after) = self.locked_not_after {
            if span.end() > not_after {
                // Cannot undershoot not_before: the narrow-window case
                // returned above.
                span = span.shifted_days(-(span.end() - not_after).num_days());
            }
        }
        span
    }
}
