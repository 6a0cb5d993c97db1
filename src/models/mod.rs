//! Chart domain models.
//!
//! Value types and entities for the scheduling graph: spans, events,
//! group bands, section partitions, and the layer table. Entities
//! reference each other by opaque ids; the [`Chart`](crate::chart::Chart)
//! arena owns them and enforces the cross-entity invariants (scope trees,
//! single-owner groups/sections).

mod event;
mod group;
mod layer;
mod section;
mod span;

pub use event::{EventId, EventNode, VerticalAlignment};
pub use group::{GroupBand, GroupId};
pub use layer::{LayerState, LayerTable};
pub use section::{RowUnit, SectionId, SectionPartition};
pub use span::TimeSpan;
