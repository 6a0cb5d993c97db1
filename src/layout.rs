//! Deterministic vertical row layout.
//!
//! The [`LayoutEngine`] turns the chart's row-producing units into an
//! ordered list of [`RowSlot`]s ready for drawing. Row heights come from
//! three competing sources, resolved in a fixed order:
//!
//! 1. the engine-wide fixed override (mirroring an external list widget);
//! 2. the unit's own fixed height (group band first, then event);
//! 3. auto measurement through the host's [`ContentMeasurer`].
//!
//! Offsets accumulate strictly — `next_top = top + height + spacer` — so
//! two passes over an unmutated chart yield identical slot lists. Hidden
//! events and all-hidden bands are skipped entirely, not drawn as empty
//! rows. Layer visibility is a paint concern and does not remove rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::models::{EventId, RowUnit};

/// Content-height collaborator: reports the wrapped label extent of an
/// event at the current column width. Consulted only for rows without a
/// fixed height.
pub trait ContentMeasurer {
    fn measure(&self, event: EventId, available_width: u32) -> u32;
}

/// A measurer returning one constant height, for hosts without text
/// metrics and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedMeasurer(pub u32);

impl ContentMeasurer for FixedMeasurer {
    fn measure(&self, _event: EventId, _available_width: u32) -> u32 {
        self.0
    }
}

/// One drawable row: vertical extent plus the unit occupying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSlot {
    /// Top offset from the chart origin.
    pub top: u32,
    /// Row height, always >= 1.
    pub height: u32,
    /// The event, scope, or group band drawn in this row.
    pub unit: RowUnit,
}

/// Builder-configured row layout pass.
///
/// # Example
///
/// ```
/// use gantt_core::chart::Chart;
/// use gantt_core::layout::{FixedMeasurer, LayoutEngine};
///
/// let chart = Chart::new();
/// let engine = LayoutEngine::new().with_row_spacer(2);
/// let rows = engine.layout_rows(&chart, &FixedMeasurer(24));
/// assert!(rows.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    fixed_row_height: Option<u32>,
    row_spacer: u32,
    available_width: u32,
}

impl LayoutEngine {
    /// Creates an engine with auto heights, a 1px spacer, and an 800px
    /// measuring width.
    pub fn new() -> Self {
        Self {
            fixed_row_height: None,
            row_spacer: 1,
            available_width: 800,
        }
    }

    /// Forces every row to `height`, overriding per-unit heights and auto
    /// measurement. `None` releases the override back to auto, for hosts
    /// that stop mirroring an external widget's row height.
    pub fn with_fixed_row_height(mut self, height: Option<u32>) -> Self {
        self.fixed_row_height = height;
        self
    }

    /// Sets the constant gap between rows, independent of row height.
    pub fn with_row_spacer(mut self, spacer: u32) -> Self {
        self.row_spacer = spacer;
        self
    }

    /// Sets the column width handed to the content measurer.
    pub fn with_available_width(mut self, width: u32) -> Self {
        self.available_width = width;
        self
    }

    /// Produces the ordered drawable row list.
    ///
    /// Sections are walked as whole blocks in registration order; with no
    /// sections the flat top-level list is used. A group band occupies
    /// exactly one row shared by its members; a scope occupies one row for
    /// itself (child nesting is a rendering concern driven by the hidden
    /// flag, which this pass respects).
    pub fn layout_rows(&self, chart: &Chart, measurer: &dyn ContentMeasurer) -> Vec<RowSlot> {
        let mut slots = Vec::new();
        let mut top: u32 = 0;
        for unit in self.row_units(chart) {
            if !Self::unit_visible(chart, unit) {
                continue;
            }
            let height = self.row_height(chart, unit, measurer).max(1);
            slots.push(RowSlot { top, height, unit });
            top += height + self.row_spacer;
        }
        slots
    }

    /// Earliest effective start over the laid-out, non-hidden nodes.
    /// `None` when nothing is laid out.
    pub fn earliest_start(&self, chart: &Chart) -> Option<NaiveDate> {
        self.visible_events(chart)
            .filter_map(|id| chart.effective_span(id).ok())
            .map(|span| span.start())
            .min()
    }

    /// Latest effective end over the laid-out, non-hidden nodes.
    pub fn latest_end(&self, chart: &Chart) -> Option<NaiveDate> {
        self.visible_events(chart)
            .filter_map(|id| chart.effective_span(id).ok())
            .map(|span| span.end())
            .max()
    }

    fn row_units(&self, chart: &Chart) -> Vec<RowUnit> {
        if chart.has_sections() {
            chart
                .sections()
                .flat_map(|section| section.rows().iter().copied())
                .collect()
        } else {
            chart.flat_rows()
        }
    }

    fn unit_visible(chart: &Chart, unit: RowUnit) -> bool {
        match unit {
            RowUnit::Event(event) => chart
                .event(event)
                .map(|node| !node.is_hidden())
                .unwrap_or(false),
            RowUnit::Group(group) => chart
                .group(group)
                .map(|band| {
                    band.members().iter().any(|member| {
                        chart
                            .event(*member)
                            .map(|node| !node.is_hidden())
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false),
        }
    }

    fn row_height(&self, chart: &Chart, unit: RowUnit, measurer: &dyn ContentMeasurer) -> u32 {
        if let Some(height) = self.fixed_row_height {
            return height;
        }
        match unit {
            RowUnit::Event(event) => self.event_height(chart, event, measurer),
            RowUnit::Group(group) => {
                let Ok(band) = chart.group(group) else {
                    return 1;
                };
                if let Some(height) = band.fixed_row_height {
                    return height;
                }
                band.members()
                    .iter()
                    .filter(|member| {
                        chart
                            .event(**member)
                            .map(|node| !node.is_hidden())
                            .unwrap_or(false)
                    })
                    .map(|member| self.event_height(chart, *member, measurer))
                    .max()
                    .unwrap_or(1)
            }
        }
    }

    fn event_height(&self, chart: &Chart, event: EventId, measurer: &dyn ContentMeasurer) -> u32 {
        match chart.event(event).ok().and_then(|node| node.fixed_row_height) {
            Some(height) => height,
            None => measurer.measure(event, self.available_width),
        }
    }

    fn visible_events<'a>(&self, chart: &'a Chart) -> impl Iterator<Item = EventId> + 'a {
        let mut events = Vec::new();
        for unit in self.row_units(chart) {
            match unit {
                RowUnit::Event(event) => events.push(event),
                RowUnit::Group(group) => {
                    if let Ok(band) = chart.group(group) {
                        events.extend(band.members().iter().copied());
                    }
                }
            }
        }
        events.into_iter().filter(move |id| {
            chart
                .event(*id)
                .map(|node| !node.is_hidden())
                .unwrap_or(false)
        })
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}
