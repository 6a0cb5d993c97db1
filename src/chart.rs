//! The chart arena: entity ownership, mutations, and scope aggregation.
//!
//! A [`Chart`] owns every entity of one chart instance — events, group
//! bands, section partitions, the connection graph and the layer table —
//! and is the only place cross-entity invariants are enforced:
//!
//! - scope graphs are strict trees (cycle attempts fail fast with
//!   [`ChartError::CyclicScopeGraph`], prior state retained);
//! - a scope's span is derived from its children and never written
//!   directly;
//! - an event belongs to at most one group band and one section
//!   (last-writer-wins on reassignment);
//! - deleting an event detaches it from every graph before releasing its
//!   identity.
//!
//! Entities are addressed by opaque ids, not live references, so the
//! aggregation pass can guard against cycles with a visited set instead of
//! relying on ownership tricks.
//!
//! Mutations return the list of affected node ids; callers that need to
//! react (repaint, re-layout) consume that list rather than per-field
//! callbacks. A `begin_update`/`end_update` bracket defers aggregation
//! during a mutation burst and runs one deduplicated recompute at the
//! close.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::connections::ConnectionGraph;
use crate::error::ChartError;
use crate::models::{
    EventId, EventNode, GroupBand, GroupId, LayerState, LayerTable, RowUnit, SectionId,
    SectionPartition, TimeSpan,
};

/// One chart instance: the entity graph plus its shared tables.
///
/// Single-threaded by design — all mutations and layout passes run on the
/// thread that owns the chart; there is no cross-instance sharing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chart {
    events: HashMap<EventId, EventNode>,
    /// Insertion order; drives the flat row list when no sections exist.
    event_order: Vec<EventId>,
    groups: HashMap<GroupId, GroupBand>,
    sections: HashMap<SectionId, SectionPartition>,
    /// Registration order; sections stack vertically as whole blocks.
    section_order: Vec<SectionId>,
    connections: ConnectionGraph,
    layers: LayerTable,
    #[serde(skip)]
    batch_depth: u32,
    #[serde(skip)]
    dirty_scopes: Vec<EventId>,
}

impl Chart {
    /// Creates an empty chart.
    pub fn new() -> Self {
        Self::default()
    }

    // ================================
    // Events
    // ================================

    /// Adds an event and returns its identity.
    pub fn add_event(&mut self, node: EventNode) -> EventId {
        let id = node.id();
        self.event_order.push(id);
        self.events.insert(id, node);
        id
    }

    /// Looks up an event.
    pub fn event(&self, id: EventId) -> Result<&EventNode, ChartError> {
        self.events.get(&id).ok_or(ChartError::UnknownEvent(id))
    }

    /// All events in insertion order.
    pub fn events(&self) -> impl Iterator<Item = &EventNode> + '_ {
        self.event_order.iter().filter_map(|id| self.events.get(id))
    }

    /// Number of live events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The span scheduling works with: the planned span, which for scopes
    /// is the aggregated bounding span of their children.
    pub fn effective_span(&self, id: EventId) -> Result<TimeSpan, ChartError> {
        Ok(self.event(id)?.planned_span())
    }

    /// Sets an event's planned span.
    ///
    /// Checkpoint spans collapse to their start instant. Scopes reject the
    /// write — their span only changes through aggregation. Returns the
    /// ids whose spans changed (the event plus any re-aggregated
    /// ancestors).
    pub fn set_event_span(
        &mut self,
        id: EventId,
        span: TimeSpan,
    ) -> Result<Vec<EventId>, ChartError> {
        let node = self.events.get(&id).ok_or(ChartError::UnknownEvent(id))?;
        if node.is_scope() {
            return Err(ChartError::ScopeSpanDerived(id));
        }
        let span = if node.is_checkpoint() {
            TimeSpan::point(span.start())
        } else {
            span
        };
        let parent = node.parent_scope();
        if let Some(node) = self.events.get_mut(&id) {
            node.planned_span = span;
        }
        let mut affected = vec![id];
        affected.extend(self.touch_scope(parent)?);
        Ok(affected)
    }

    /// Sets or clears the revised span. Display-only: never triggers
    /// aggregation.
    pub fn set_revised_span(
        &mut self,
        id: EventId,
        span: Option<TimeSpan>,
    ) -> Result<(), ChartError> {
        let node = self
            .events
            .get_mut(&id)
            .ok_or(ChartError::UnknownEvent(id))?;
        node.revised_span = match (span, node.is_checkpoint) {
            (Some(s), true) => Some(TimeSpan::point(s.start())),
            (s, _) => s,
        };
        Ok(())
    }

    /// Sets the completion percentage, clamped to 0..=100.
    pub fn set_percent_complete(&mut self, id: EventId, percent: u8) -> Result<(), ChartError> {
        let node = self
            .events
            .get_mut(&id)
            .ok_or(ChartError::UnknownEvent(id))?;
        node.percent_complete = percent.min(100);
        Ok(())
    }

    /// Marks or unmarks an event as a checkpoint. Enabling collapses the
    /// planned span to its start instant.
    pub fn set_checkpoint(
        &mut self,
        id: EventId,
        checkpoint: bool,
    ) -> Result<Vec<EventId>, ChartError> {
        let node = self.events.get(&id).ok_or(ChartError::UnknownEvent(id))?;
        let parent = node.parent_scope();
        let collapse = checkpoint && !node.planned_span().is_degenerate();
        if let Some(node) = self.events.get_mut(&id) {
            node.is_checkpoint = checkpoint;
            if collapse {
                node.planned_span = TimeSpan::point(node.planned_span.start());
                if let Some(revised) = node.revised_span {
                    node.revised_span = Some(TimeSpan::point(revised.start()));
                }
            }
        }
        if collapse {
            let mut affected = vec![id];
            affected.extend(self.touch_scope(parent)?);
            Ok(affected)
        } else {
            Ok(Vec::new())
        }
    }

    /// Sets the locked move window (either bound may be `None`). An
    /// inverted pair is rejected with [`ChartError::InvalidSpan`] and the
    /// prior window is retained.
    pub fn set_locked_window(
        &mut self,
        id: EventId,
        not_before: Option<NaiveDate>,
        not_after: Option<NaiveDate>,
    ) -> Result<(), ChartError> {
        if let (Some(nb), Some(na)) = (not_before, not_after) {
            if na < nb {
                return Err(ChartError::InvalidSpan { start: nb, end: na });
            }
        }
        let node = self
            .events
            .get_mut(&id)
            .ok_or(ChartError::UnknownEvent(id))?;
        node.locked_not_before = not_before;
        node.locked_not_after = not_after;
        Ok(())
    }

    /// Sets or clears the per-event fixed row height override.
    pub fn set_fixed_row_height(
        &mut self,
        id: EventId,
        height: Option<u32>,
    ) -> Result<(), ChartError> {
        let node = self
            .events
            .get_mut(&id)
            .ok_or(ChartError::UnknownEvent(id))?;
        node.fixed_row_height = height;
        Ok(())
    }

    /// Clamps a proposed move into the event's locked window, preserving
    /// duration where possible. Pure: the chart is not mutated; the caller
    /// applies the result with [`set_event_span`](Self::set_event_span).
    pub fn propose_move(
        &self,
        id: EventId,
        new_span: TimeSpan,
    ) -> Result<TimeSpan, ChartError> {
        let node = self.event(id)?;
        let wanted = if node.is_checkpoint() {
            TimeSpan::point(new_span.start())
        } else {
            new_span
        };
        Ok(node.clamp_move(wanted))
    }

    /// Hides or shows an event. Hiding a scope hides all its descendants,
    /// so collapse/expand at the tree layer is one call here. Returns the
    /// re-aggregated ancestor ids.
    pub fn set_hidden(&mut self, id: EventId, hidden: bool) -> Result<Vec<EventId>, ChartError> {
        let parent = self.event(id)?.parent_scope();

        let mut stack = vec![id];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.events.get_mut(&current) {
                node.hidden = hidden;
                stack.extend(node.children.iter().copied());
            }
        }

        self.touch_scope(parent)
    }

    /// Deletes an event, detaching it from every graph first: scope
    /// children, group members, section rows, and connection edges.
    /// Children of a deleted scope are orphaned to top level. Returns the
    /// ancestor ids re-aggregated by the removal.
    pub fn remove_event(&mut self, id: EventId) -> Result<Vec<EventId>, ChartError> {
        let node = self.events.remove(&id).ok_or(ChartError::UnknownEvent(id))?;
        self.event_order.retain(|e| *e != id);

        for child in &node.children {
            if let Some(child_node) = self.events.get_mut(child) {
                child_node.parent_scope = None;
            }
        }
        if let Some(parent) = node.parent_scope {
            if let Some(parent_node) = self.events.get_mut(&parent) {
                parent_node.children.retain(|c| *c != id);
            }
        }
        if let Some(group) = node.group {
            if let Some(band) = self.groups.get_mut(&group) {
                band.members.retain(|m| *m != id);
            }
        }
        if let Some(section) = node.section {
            if let Some(partition) = self.sections.get_mut(&section) {
                partition.rows.retain(|u| *u != RowUnit::Event(id));
            }
        }
        self.connections.remove_edges_touching(id);

        self.touch_scope(node.parent_scope)
    }

    // ================================
    // Scope aggregation
    // ================================

    /// Attaches `child` under `scope`, re-parenting from any previous
    /// scope. Rejected with [`ChartError::CyclicScopeGraph`] when the
    /// attachment would make a node its own ancestor; in that case both
    /// nodes' memberships are unchanged. Returns the re-aggregated ids.
    pub fn attach_to_scope(
        &mut self,
        scope: EventId,
        child: EventId,
    ) -> Result<Vec<EventId>, ChartError> {
        if scope == child {
            return Err(ChartError::CyclicScopeGraph(child));
        }
        if self.event(child)?.parent_scope() == Some(scope) {
            return Ok(Vec::new());
        }

        // Walk up from the target scope: finding the child there means the
        // attach would close a cycle.
        let mut visited = HashSet::new();
        let mut current = Some(scope);
        while let Some(ancestor) = current {
            if ancestor == child {
                return Err(ChartError::CyclicScopeGraph(child));
            }
            if !visited.insert(ancestor) {
                return Err(ChartError::CyclicScopeGraph(ancestor));
            }
            current = self
                .events
                .get(&ancestor)
                .ok_or(ChartError::UnknownEvent(ancestor))?
                .parent_scope();
        }

        let mut affected = self.detach_from_scope(child)?;
        if let Some(node) = self.events.get_mut(&child) {
            node.parent_scope = Some(scope);
        }
        if let Some(node) = self.events.get_mut(&scope) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
        affected.extend(self.touch_scope(Some(scope))?);
        Ok(affected)
    }

    /// Detaches `child` from its scope, if it has one, and re-aggregates
    /// the former ancestor chain.
    pub fn detach_from_scope(&mut self, child: EventId) -> Result<Vec<EventId>, ChartError> {
        let parent = self.event(child)?.parent_scope();
        let Some(parent) = parent else {
            return Ok(Vec::new());
        };
        if let Some(node) = self.events.get_mut(&child) {
            node.parent_scope = None;
        }
        if let Some(parent_node) = self.events.get_mut(&parent) {
            parent_node.children.retain(|c| *c != child);
        }
        self.touch_scope(Some(parent))
    }

    /// Recomputes `scope`'s span from scratch as the union of its
    /// non-hidden children's effective spans, then cascades to its parent.
    ///
    /// Policy: a scope with zero non-hidden children keeps its last known
    /// span instead of collapsing to a point while temporarily emptied.
    /// The scope's completion percentage is set to the mean over the same
    /// non-hidden children. A visited set turns scope cycles into
    /// [`ChartError::CyclicScopeGraph`] instead of an infinite walk.
    pub fn recompute_scope(&mut self, scope: EventId) -> Result<Vec<EventId>, ChartError> {
        self.event(scope)?;
        let mut visited = HashSet::new();
        let mut changed = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(ChartError::CyclicScopeGraph(id));
            }
            if self.aggregate_node(id) {
                changed.push(id);
            }
            current = self.events.get(&id).and_then(|n| n.parent_scope());
        }
        Ok(changed)
    }

    /// Recomputes one node from its direct children. Returns whether the
    /// span or percentage actually changed.
    fn aggregate_node(&mut self, id: EventId) -> bool {
        let Some(node) = self.events.get(&id) else {
            return false;
        };
        if node.children.is_empty() {
            return false;
        }

        let children = node.children.clone();
        let mut bounds: Option<TimeSpan> = None;
        let mut percent_sum: u32 = 0;
        let mut counted: u32 = 0;
        for child in children {
            let Some(child_node) = self.events.get(&child) else {
                continue;
            };
            if child_node.is_hidden() {
                continue;
            }
            let span = child_node.planned_span();
            bounds = Some(match bounds {
                Some(b) => b.union(&span),
                None => span,
            });
            percent_sum += u32::from(child_node.percent_complete());
            counted += 1;
        }

        // All children hidden (or none resolvable): keep the last known
        // span rather than degenerating.
        let Some(span) = bounds else {
            return false;
        };
        let percent = (percent_sum / counted) as u8;

        match self.events.get_mut(&id) {
            Some(node) => {
                let changed = node.planned_span != span || node.percent_complete != percent;
                node.planned_span = span;
                node.percent_complete = percent;
                changed
            }
            None => false,
        }
    }

    /// Routes a child-side mutation to its parent scope: immediate
    /// recompute outside a batch, deferred inside one.
    fn touch_scope(&mut self, scope: Option<EventId>) -> Result<Vec<EventId>, ChartError> {
        let Some(scope) = scope else {
            return Ok(Vec::new());
        };
        if self.batch_depth > 0 {
            self.dirty_scopes.push(scope);
            Ok(Vec::new())
        } else {
            self.recompute_scope(scope)
        }
    }

    // ================================
    // Batched updates
    // ================================

    /// Opens an update bracket: aggregation is deferred until the matching
    /// [`end_update`](Self::end_update). Brackets nest.
    pub fn begin_update(&mut self) {
        self.batch_depth += 1;
    }

    /// Closes an update bracket. When the outermost bracket closes, every
    /// scope touched during the batch is recomputed once and the combined
    /// affected-id list is returned.
    pub fn end_update(&mut self) -> Result<Vec<EventId>, ChartError> {
        if self.batch_depth > 0 {
            self.batch_depth -= 1;
        }
        if self.batch_depth > 0 {
            return Ok(Vec::new());
        }

        let pending = std::mem::take(&mut self.dirty_scopes);
        let mut seen = HashSet::new();
        let mut affected = Vec::new();
        for scope in pending {
            if !seen.insert(scope) {
                continue;
            }
            // A scope enqueued during the batch may have been deleted since.
            if !self.events.contains_key(&scope) {
                continue;
            }
            for id in self.recompute_scope(scope)? {
                if !affected.contains(&id) {
                    affected.push(id);
                }
            }
        }
        Ok(affected)
    }

    // ================================
    // Group bands
    // ================================

    /// Registers a group band and returns its identity.
    pub fn add_group(&mut self, band: GroupBand) -> GroupId {
        let id = band.id();
        self.groups.insert(id, band);
        id
    }

    /// Looks up a group band.
    pub fn group(&self, id: GroupId) -> Result<&GroupBand, ChartError> {
        self.groups.get(&id).ok_or(ChartError::UnknownGroup(id))
    }

    /// Adds `event` to `group` at `index` (append when `None`). An event
    /// already in a different band is moved, keeping membership exclusive.
    pub fn add_to_group(
        &mut self,
        group: GroupId,
        event: EventId,
        index: Option<usize>,
    ) -> Result<(), ChartError> {
        if !self.groups.contains_key(&group) {
            return Err(ChartError::UnknownGroup(group));
        }
        self.event(event)?;
        self.remove_from_group(event)?;

        if let Some(band) = self.groups.get_mut(&group) {
            let at = index.unwrap_or(band.members.len()).min(band.members.len());
            band.members.insert(at, event);
        }
        if let Some(node) = self.events.get_mut(&event) {
            node.group = Some(group);
        }
        Ok(())
    }

    /// Removes `event` from its band, if it has one. An emptied band stays
    /// registered as a placeholder.
    pub fn remove_from_group(&mut self, event: EventId) -> Result<(), ChartError> {
        let current = self.event(event)?.group();
        let Some(current) = current else {
            return Ok(());
        };
        if let Some(band) = self.groups.get_mut(&current) {
            band.members.retain(|m| *m != event);
        }
        if let Some(node) = self.events.get_mut(&event) {
            node.group = None;
        }
        Ok(())
    }

    /// Discards a band, clearing its members' back-links and its section
    /// row if it had one.
    pub fn remove_group(&mut self, group: GroupId) -> Result<(), ChartError> {
        let band = self
            .groups
            .remove(&group)
            .ok_or(ChartError::UnknownGroup(group))?;
        for member in &band.members {
            if let Some(node) = self.events.get_mut(member) {
                node.group = None;
            }
        }
        if let Some(section) = band.section() {
            if let Some(partition) = self.sections.get_mut(&section) {
                partition.rows.retain(|u| *u != RowUnit::Group(group));
            }
        }
        Ok(())
    }

    /// The band's time extent: union of its members' effective spans.
    /// `None` for an empty band. Used for scroll-to-earliest style
    /// computations; members still draw at their own date positions.
    pub fn group_span(&self, group: GroupId) -> Result<Option<TimeSpan>, ChartError> {
        let band = self.group(group)?;
        let mut bounds: Option<TimeSpan> = None;
        for member in band.members() {
            if let Some(node) = self.events.get(member) {
                let span = node.planned_span();
                bounds = Some(match bounds {
                    Some(b) => b.union(&span),
                    None => span,
                });
            }
        }
        Ok(bounds)
    }

    // ================================
    // Sections
    // ================================

    /// Creates a named section block. Sections stack vertically in
    /// registration order.
    pub fn add_section(&mut self, name: impl Into<String>) -> SectionId {
        let partition = SectionPartition::new(name);
        let id = partition.id();
        self.section_order.push(id);
        self.sections.insert(id, partition);
        id
    }

    /// Looks up a section.
    pub fn section(&self, id: SectionId) -> Result<&SectionPartition, ChartError> {
        self.sections.get(&id).ok_or(ChartError::UnknownSection(id))
    }

    /// Sections in registration order.
    pub fn sections(&self) -> impl Iterator<Item = &SectionPartition> + '_ {
        self.section_order
            .iter()
            .filter_map(|id| self.sections.get(id))
    }

    /// Whether any section has been registered. Once one exists, layout
    /// draws only sectioned units.
    pub fn has_sections(&self) -> bool {
        !self.section_order.is_empty()
    }

    /// Adds a row unit to `section` at `index` (append when `None`).
    /// A unit already rowed in another section moves here
    /// (last-writer-wins, mirroring the group single-owner rule).
    pub fn add_section_row(
        &mut self,
        section: SectionId,
        unit: RowUnit,
        index: Option<usize>,
    ) -> Result<(), ChartError> {
        if !self.sections.contains_key(&section) {
            return Err(ChartError::UnknownSection(section));
        }
        let previous = match unit {
            RowUnit::Event(event) => self.event(event)?.section(),
            RowUnit::Group(group) => self.group(group)?.section(),
        };
        if let Some(previous) = previous {
            if let Some(partition) = self.sections.get_mut(&previous) {
                partition.rows.retain(|u| *u != unit);
            }
        }

        if let Some(partition) = self.sections.get_mut(&section) {
            let at = index.unwrap_or(partition.rows.len()).min(partition.rows.len());
            partition.rows.insert(at, unit);
        }
        match unit {
            RowUnit::Event(event) => {
                if let Some(node) = self.events.get_mut(&event) {
                    node.section = Some(section);
                }
            }
            RowUnit::Group(group) => {
                if let Some(band) = self.groups.get_mut(&group) {
                    band.section = Some(section);
                }
            }
        }
        Ok(())
    }

    /// Removes a row unit from `section` and clears its back-link.
    pub fn remove_section_row(
        &mut self,
        section: SectionId,
        unit: RowUnit,
    ) -> Result<(), ChartError> {
        let partition = self
            .sections
            .get_mut(&section)
            .ok_or(ChartError::UnknownSection(section))?;
        partition.rows.retain(|u| *u != unit);
        match unit {
            RowUnit::Event(event) => {
                if let Some(node) = self.events.get_mut(&event) {
                    if node.section == Some(section) {
                        node.section = None;
                    }
                }
            }
            RowUnit::Group(group) => {
                if let Some(band) = self.groups.get_mut(&group) {
                    if band.section == Some(section) {
                        band.section = None;
                    }
                }
            }
        }
        Ok(())
    }

    /// The flat top-level row list used when no sections exist: events in
    /// insertion order, with each group band emitted once at its first
    /// member's position.
    pub fn flat_rows(&self) -> Vec<RowUnit> {
        let mut rows = Vec::new();
        let mut seen_groups = HashSet::new();
        for id in &self.event_order {
            let Some(node) = self.events.get(id) else {
                continue;
            };
            match node.group() {
                Some(group) => {
                    if seen_groups.insert(group) {
                        rows.push(RowUnit::Group(group));
                    }
                }
                None => rows.push(RowUnit::Event(*id)),
            }
        }
        rows
    }

    // ================================
    // Connections and layers
    // ================================

    /// Appends a dependency arrow. Duplicates, reverses, self-loops and
    /// cycles are all retained — arrows are a display concern.
    pub fn add_connection(&mut self, source: EventId, target: EventId) -> Result<(), ChartError> {
        self.event(source)?;
        self.event(target)?;
        self.connections.add_edge(source, target);
        Ok(())
    }

    /// The connection graph.
    pub fn connections(&self) -> &ConnectionGraph {
        &self.connections
    }

    /// Targets of arrows leaving `id`, insertion order.
    pub fn edges_from(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        self.connections.edges_from(id)
    }

    /// Sources of arrows arriving at `id`, insertion order.
    pub fn edges_to(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        self.connections.edges_to(id)
    }

    /// The layer table, for render-side visibility/opacity lookups.
    pub fn layers(&self) -> &LayerTable {
        &self.layers
    }

    /// Mutable access to the layer table.
    pub fn layers_mut(&mut self) -> &mut LayerTable {
        &mut self.layers
    }

    /// Render state for `layer` (`{visible: true, opacity: 255}` when
    /// never configured).
    pub fn layer_state(&self, layer: i32) -> LayerState {
        self.layers.state(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerticalAlignment;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn span(a: u32, b: u32) -> TimeSpan {
        TimeSpan::new(d(a), d(b)).unwrap()
    }

    fn chart_with_scope() -> (Chart, EventId, EventId, EventId) {
        let mut chart = Chart::new();
        let scope = chart.add_event(EventNode::new("scope", span(1, 1)));
        let a = chart.add_event(EventNode::new("a", span(1, 10)));
        let b = chart.add_event(EventNode::new("b", span(11, 15)));
        chart.attach_to_scope(scope, a).unwrap();
        chart.attach_to_scope(scope, b).unwrap();
        (chart, scope, a, b)
    }

    #[test]
    fn test_scope_aggregates_children_incrementally() {
        let mut chart = Chart::new();
        let scope = chart.add_event(EventNode::new("scope", span(5, 5)));
        let a = chart.add_event(EventNode::new("a", span(1, 10)));
        chart.attach_to_scope(scope, a).unwrap();
        assert_eq!(chart.effective_span(scope).unwrap(), span(1, 10));

        let b = chart.add_event(EventNode::new("b", span(11, 15)));
        chart.attach_to_scope(scope, b).unwrap();
        assert_eq!(chart.effective_span(scope).unwrap(), span(1, 15));
    }

    #[test]
    fn test_hiding_child_recomputes_over_visible_set() {
        // Recompute-from-scratch policy: hiding a child shrinks the scope
        // to the bounding span of what remains visible.
        let (mut chart, scope, a, _b) = chart_with_scope();
        assert_eq!(chart.effective_span(scope).unwrap(), span(1, 15));

        chart.set_hidden(a, true).unwrap();
        assert_eq!(chart.effective_span(scope).unwrap(), span(11, 15));
    }

    #[test]
    fn test_all_children_hidden_keeps_last_span() {
        let (mut chart, scope, a, b) = chart_with_scope();
        chart.set_hidden(a, true).unwrap();
        chart.set_hidden(b, true).unwrap();
        // Unchanged from the last aggregation over {b}.
        assert_eq!(chart.effective_span(scope).unwrap(), span(11, 15));

        // Idempotent under a no-op recompute.
        let changed = chart.recompute_scope(scope).unwrap();
        assert!(changed.is_empty());
        assert_eq!(chart.effective_span(scope).unwrap(), span(11, 15));
    }

    #[test]
    fn test_nested_scopes_cascade_upward() {
        let mut chart = Chart::new();
        let outer = chart.add_event(EventNode::new("outer", span(1, 1)));
        let inner = chart.add_event(EventNode::new("inner", span(1, 1)));
        let leaf = chart.add_event(EventNode::new("leaf", span(4, 9)));
        chart.attach_to_scope(outer, inner).unwrap();
        chart.attach_to_scope(inner, leaf).unwrap();
        assert_eq!(chart.effective_span(outer).unwrap(), span(4, 9));

        let affected = chart.set_event_span(leaf, span(2, 20)).unwrap();
        assert_eq!(chart.effective_span(inner).unwrap(), span(2, 20));
        assert_eq!(chart.effective_span(outer).unwrap(), span(2, 20));
        assert!(affected.contains(&leaf));
        assert!(affected.contains(&inner));
        assert!(affected.contains(&outer));
    }

    #[test]
    fn test_scope_percent_is_mean_of_visible_children() {
        let (mut chart, scope, a, b) = chart_with_scope();
        chart.set_percent_complete(a, 40).unwrap();
        chart.set_percent_complete(b, 100).unwrap();
        chart.recompute_scope(scope).unwrap();
        assert_eq!(chart.event(scope).unwrap().percent_complete(), 70);

        chart.set_hidden(a, true).unwrap();
        assert_eq!(chart.event(scope).unwrap().percent_complete(), 100);
    }

    #[test]
    fn test_attach_ancestor_as_child_is_rejected() {
        let mut chart = Chart::new();
        let grand = chart.add_event(EventNode::new("grand", span(1, 1)));
        let parent = chart.add_event(EventNode::new("parent", span(1, 1)));
        let child = chart.add_event(EventNode::new("child", span(2, 6)));
        chart.attach_to_scope(grand, parent).unwrap();
        chart.attach_to_scope(parent, child).unwrap();

        // grand is already an ancestor of child.
        let err = chart.attach_to_scope(child, grand).unwrap_err();
        assert_eq!(err, ChartError::CyclicScopeGraph(grand));

        // Memberships unchanged by the rejected attach.
        assert_eq!(chart.event(grand).unwrap().parent_scope(), None);
        assert_eq!(chart.event(child).unwrap().parent_scope(), Some(parent));
        assert_eq!(chart.event(child).unwrap().children(), &[] as &[EventId]);
    }

    #[test]
    fn test_attach_self_is_rejected() {
        let mut chart = Chart::new();
        let e = chart.add_event(EventNode::new("e", span(1, 2)));
        assert_eq!(
            chart.attach_to_scope(e, e).unwrap_err(),
            ChartError::CyclicScopeGraph(e)
        );
    }

    #[test]
    fn test_reattach_moves_between_scopes() {
        let mut chart = Chart::new();
        let s1 = chart.add_event(EventNode::new("s1", span(1, 1)));
        let s2 = chart.add_event(EventNode::new("s2", span(1, 1)));
        let a = chart.add_event(EventNode::new("a", span(3, 7)));
        let b = chart.add_event(EventNode::new("b", span(1, 2)));
        chart.attach_to_scope(s1, a).unwrap();
        chart.attach_to_scope(s1, b).unwrap();
        assert_eq!(chart.effective_span(s1).unwrap(), span(1, 7));

        chart.attach_to_scope(s2, a).unwrap();
        assert_eq!(chart.event(a).unwrap().parent_scope(), Some(s2));
        assert_eq!(chart.event(s1).unwrap().children(), &[b]);
        // Old scope re-aggregates over its remaining child.
        assert_eq!(chart.effective_span(s1).unwrap(), span(1, 2));
        assert_eq!(chart.effective_span(s2).unwrap(), span(3, 7));
    }

    #[test]
    fn test_direct_scope_span_write_rejected() {
        let (mut chart, scope, _a, _b) = chart_with_scope();
        let before = chart.effective_span(scope).unwrap();
        let err = chart.set_event_span(scope, span(1, 2)).unwrap_err();
        assert_eq!(err, ChartError::ScopeSpanDerived(scope));
        assert_eq!(chart.effective_span(scope).unwrap(), before);
    }

    #[test]
    fn test_checkpoint_span_collapses_on_every_mutation() {
        let mut chart = Chart::new();
        let cp = chart.add_event(EventNode::checkpoint("cp", d(5)));

        chart.set_event_span(cp, span(7, 12)).unwrap();
        let got = chart.effective_span(cp).unwrap();
        assert!(got.is_degenerate());
        assert_eq!(got.start(), d(7));

        // Flipping a two-ended event into a checkpoint collapses it too.
        let e = chart.add_event(EventNode::new("e", span(3, 9)));
        chart.set_checkpoint(e, true).unwrap();
        let got = chart.effective_span(e).unwrap();
        assert_eq!(got, TimeSpan::point(d(3)));
    }

    #[test]
    fn test_propose_move_clamps_to_locked_window() {
        let mut chart = Chart::new();
        let e = chart.add_event(EventNode::new("e", span(10, 13)));
        chart.set_locked_window(e, Some(d(5)), Some(d(20))).unwrap();

        // Duration 3 days, pushed below the window: lands at [5, 8].
        let clamped = chart.propose_move(e, span(1, 4)).unwrap();
        assert_eq!(clamped, span(5, 8));

        // Pure: the event still holds its original span.
        assert_eq!(chart.effective_span(e).unwrap(), span(10, 13));

        // Idempotent through the chart API as well.
        assert_eq!(chart.propose_move(e, clamped).unwrap(), clamped);
    }

    #[test]
    fn test_inverted_locked_window_rejected() {
        let mut chart = Chart::new();
        let e = chart.add_event(EventNode::new("e", span(10, 13)));
        let err = chart
            .set_locked_window(e, Some(d(20)), Some(d(5)))
            .unwrap_err();
        assert_eq!(
            err,
            ChartError::InvalidSpan {
                start: d(20),
                end: d(5)
            }
        );
        // Prior (absent) window retained: the move stays unconstrained.
        assert_eq!(chart.propose_move(e, span(1, 4)).unwrap(), span(1, 4));
    }

    #[test]
    fn test_remove_event_prunes_every_graph() {
        let (mut chart, scope, a, b) = chart_with_scope();
        let outsider = chart.add_event(EventNode::new("x", span(20, 22)));
        chart.add_connection(a, outsider).unwrap();
        chart.add_connection(outsider, a).unwrap();
        chart.add_connection(b, outsider).unwrap();

        let band = chart.add_group(GroupBand::new());
        chart.add_to_group(band, a, None).unwrap();
        let sect = chart.add_section("main");
        chart.add_section_row(sect, RowUnit::Event(a), None).unwrap();

        chart.remove_event(a).unwrap();

        assert!(chart.event(a).is_err());
        assert_eq!(chart.edges_from(a).count(), 0);
        assert_eq!(chart.edges_to(a).count(), 0);
        assert_eq!(chart.connections().len(), 1);
        assert!(!chart.group(band).unwrap().contains(a));
        assert!(!chart.section(sect).unwrap().contains(RowUnit::Event(a)));
        assert_eq!(chart.event(scope).unwrap().children(), &[b]);
        // Scope re-aggregated over the survivor.
        assert_eq!(chart.effective_span(scope).unwrap(), span(11, 15));
    }

    #[test]
    fn test_remove_scope_orphans_children() {
        let (mut chart, scope, a, b) = chart_with_scope();
        chart.remove_event(scope).unwrap();
        assert_eq!(chart.event(a).unwrap().parent_scope(), None);
        assert_eq!(chart.event(b).unwrap().parent_scope(), None);
    }

    #[test]
    fn test_group_membership_is_exclusive() {
        let mut chart = Chart::new();
        let e = chart.add_event(EventNode::new("e", span(1, 4)));
        let g1 = chart.add_group(GroupBand::new());
        let g2 = chart.add_group(GroupBand::new());

        chart.add_to_group(g1, e, None).unwrap();
        chart.add_to_group(g2, e, None).unwrap();

        assert!(!chart.group(g1).unwrap().contains(e));
        assert!(chart.group(g2).unwrap().contains(e));
        assert_eq!(chart.event(e).unwrap().group(), Some(g2));
        // The emptied band remains as a placeholder.
        assert!(chart.group(g1).unwrap().is_empty());
    }

    #[test]
    fn test_group_insert_position_and_span() {
        let mut chart = Chart::new();
        let e1 = chart.add_event(EventNode::new("e1", span(5, 9)));
        let e2 = chart.add_event(EventNode::new("e2", span(1, 3)));
        let e3 = chart.add_event(EventNode::new("e3", span(12, 14)));
        let band = chart.add_group(GroupBand::new());
        chart.add_to_group(band, e1, None).unwrap();
        chart.add_to_group(band, e2, Some(0)).unwrap();
        chart.add_to_group(band, e3, Some(99)).unwrap();

        assert_eq!(chart.group(band).unwrap().members(), &[e2, e1, e3]);
        assert_eq!(chart.group_span(band).unwrap(), Some(span(1, 14)));

        let empty = chart.add_group(GroupBand::new());
        assert_eq!(chart.group_span(empty).unwrap(), None);
    }

    #[test]
    fn test_section_rows_are_last_writer_wins() {
        let mut chart = Chart::new();
        let e = chart.add_event(EventNode::new("e", span(1, 4)));
        let s1 = chart.add_section("one");
        let s2 = chart.add_section("two");

        chart.add_section_row(s1, RowUnit::Event(e), None).unwrap();
        chart.add_section_row(s2, RowUnit::Event(e), None).unwrap();

        assert!(!chart.section(s1).unwrap().contains(RowUnit::Event(e)));
        assert!(chart.section(s2).unwrap().contains(RowUnit::Event(e)));
        assert_eq!(chart.event(e).unwrap().section(), Some(s2));
    }

    #[test]
    fn test_batched_mutations_recompute_once_at_close() {
        let (mut chart, scope, a, b) = chart_with_scope();

        chart.begin_update();
        chart.set_event_span(a, span(2, 4)).unwrap();
        chart.set_event_span(b, span(6, 8)).unwrap();
        // Deferred: the scope still shows the pre-batch aggregate.
        assert_eq!(chart.effective_span(scope).unwrap(), span(1, 15));

        let affected = chart.end_update().unwrap();
        assert_eq!(chart.effective_span(scope).unwrap(), span(2, 8));
        assert_eq!(affected, vec![scope]);
    }

    #[test]
    fn test_nested_batches_close_at_outermost() {
        let (mut chart, scope, a, _b) = chart_with_scope();
        chart.begin_update();
        chart.begin_update();
        chart.set_event_span(a, span(1, 20)).unwrap();
        assert!(chart.end_update().unwrap().is_empty());
        assert_eq!(chart.effective_span(scope).unwrap(), span(1, 15));

        let affected = chart.end_update().unwrap();
        assert_eq!(affected, vec![scope]);
        assert_eq!(chart.effective_span(scope).unwrap(), span(1, 20));
    }

    #[test]
    fn test_flat_rows_emit_group_once() {
        let mut chart = Chart::new();
        let e1 = chart.add_event(EventNode::new("e1", span(1, 2)));
        let e2 = chart.add_event(EventNode::new("e2", span(3, 4)));
        let e3 = chart.add_event(EventNode::new("e3", span(5, 6)));
        let band = chart.add_group(GroupBand::new());
        chart.add_to_group(band, e1, None).unwrap();
        chart.add_to_group(band, e3, None).unwrap();

        assert_eq!(
            chart.flat_rows(),
            vec![RowUnit::Group(band), RowUnit::Event(e2)]
        );
    }

    #[test]
    fn test_connection_to_unknown_event_rejected() {
        let mut chart = Chart::new();
        let e = chart.add_event(EventNode::new("e", span(1, 2)));
        let ghost = EventId::new();
        assert_eq!(
            chart.add_connection(e, ghost).unwrap_err(),
            ChartError::UnknownEvent(ghost)
        );
    }

    #[test]
    fn test_unknown_ids_surface_as_errors() {
        let mut chart = Chart::new();
        let ghost = EventId::new();
        assert_eq!(
            chart.set_event_span(ghost, span(1, 2)).unwrap_err(),
            ChartError::UnknownEvent(ghost)
        );
        assert_eq!(
            chart.remove_event(ghost).unwrap_err(),
            ChartError::UnknownEvent(ghost)
        );
        let ghost_group = GroupId::new();
        assert_eq!(
            chart.add_to_group(ghost_group, ghost, None).unwrap_err(),
            ChartError::UnknownGroup(ghost_group)
        );
    }

    #[test]
    fn test_chart_serde_round_trip() {
        let (mut chart, scope, a, _b) = chart_with_scope();
        chart.add_connection(a, scope).unwrap();
        chart.layers_mut().set_opacity(2, 120);
        let e = chart.add_event(
            EventNode::new("aligned", span(2, 3))
                .with_vertical_alignment(VerticalAlignment::Bottom),
        );

        let json = serde_json::to_string(&chart).unwrap();
        let back: Chart = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_count(), chart.event_count());
        assert_eq!(back.effective_span(scope).unwrap(), span(1, 15));
        assert_eq!(back.layer_state(2).opacity, 120);
        assert_eq!(
            back.event(e).unwrap().vertical_alignment,
            VerticalAlignment::Bottom
        );
    }
}
