//! Scheduling data and layout engine for Gantt-style charts.
//!
//! Places events with start/end dates on a time axis, organized into
//! scopes (aggregate parents whose span is derived from children), group
//! bands (several events sharing one display row), sections (independent
//! vertical partitions), layers (z-ordered visibility/opacity buckets),
//! and dependency connections (directed arrows, cycles allowed).
//!
//! This crate is the data/layout core only: painting, input dispatch and
//! widget wiring are host concerns that consume the row list, span and
//! edge queries exposed here.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `TimeSpan`, `EventNode`, `GroupBand`,
//!   `SectionPartition`, `LayerTable`
//! - **`chart`**: The `Chart` arena — entity ownership, mutations, scope
//!   aggregation, move clamping, batched updates
//! - **`connections`**: The dependency-arrow multigraph
//! - **`layout`**: The deterministic row layout pass and its
//!   `ContentMeasurer` collaborator seam
//! - **`error`**: `ChartError`
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use gantt_core::chart::Chart;
//! use gantt_core::layout::{FixedMeasurer, LayoutEngine};
//! use gantt_core::models::{EventNode, TimeSpan};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
//!
//! let mut chart = Chart::new();
//! let scope = chart.add_event(EventNode::new("Release", TimeSpan::point(d(1))));
//! let build = chart.add_event(
//!     EventNode::new("Build", TimeSpan::new(d(1), d(10)).unwrap()),
//! );
//! let test = chart.add_event(
//!     EventNode::new("Test", TimeSpan::new(d(11), d(15)).unwrap()),
//! );
//! chart.attach_to_scope(scope, build).unwrap();
//! chart.attach_to_scope(scope, test).unwrap();
//! chart.add_connection(build, test).unwrap();
//!
//! assert_eq!(
//!     chart.effective_span(scope).unwrap(),
//!     TimeSpan::new(d(1), d(15)).unwrap(),
//! );
//!
//! let engine = LayoutEngine::new().with_row_spacer(2);
//! let rows = engine.layout_rows(&chart, &FixedMeasurer(24));
//! assert_eq!(rows.len(), 3);
//! ```

pub mod chart;
pub mod connections;
pub mod error;
pub mod layout;
pub mod models;

pub use chart::Chart;
pub use connections::{Connection, ConnectionGraph};
pub use error::ChartError;
pub use layout::{ContentMeasurer, FixedMeasurer, LayoutEngine, RowSlot};
pub use models::{
    EventId, EventNode, GroupBand, GroupId, LayerState, LayerTable, RowUnit, SectionId,
    SectionPartition, TimeSpan, VerticalAlignment,
};
