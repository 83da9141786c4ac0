//! Core types for drip branch routing: geometry, zones, parameters,
//! diagnostics and route records.
//!
//! This crate holds the data model shared by the router and its host. It
//! performs no routing itself; see the `drip-route` crate for that.
//!
//! # Overview
//!
//! - **Geometry**: plan-view lines and rectangles ([`Line`], [`Rectangle`])
//! - **Inputs**: zones and source pipes handed over by the host
//!   ([`ZoneDescriptor`], [`SourceLine`])
//! - **Configuration**: offsets, heights and diameters ([`RoutingParameters`], [`Tolerances`])
//! - **Findings**: severity-classified diagnostics ([`Diagnostic`], [`Diagnostics`])
//! - **Results**: segments, valve placement and materialization plans
//!   ([`RouteResult`], [`MaterializationPlan`])
//!
//! # Example
//!
//! ```
//! use drip_types::{RoutingParameters, SourceId, SourceLine, ZoneDescriptor, ZoneId};
//! use nalgebra::{Point3, Vector3};
//!
//! let zone = ZoneDescriptor::rectangle(
//!     ZoneId(1),
//!     Point3::new(-5.0, -3.0, 0.0),
//!     Point3::new(5.0, 3.0, 0.0),
//! )
//! .with_obstacle_points(vec![Point3::new(3.0, 2.0, 0.0)]);
//!
//! let source = SourceLine::new(SourceId(1), Point3::new(-6.0, -1.0, 0.0), Vector3::x(), 12.0);
//!
//! let params = RoutingParameters::default();
//! assert!(params.validate().is_empty());
//! assert!(source.line().is_some());
//! assert_eq!(zone.obstacle_points().len(), 1);
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for all data types

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod geometry;
pub mod route;
pub mod selection;
pub mod zone;

pub use config::{AnchorFallback, RoutingParameters, Tolerances};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{RoutingError, RoutingResult};
pub use geometry::{Line, Rectangle};
pub use route::{
    ConnectorPoint, Junction, JunctionKind, MaterializationPlan, PipeRun, PipeSystem, RouteResult, Segment,
    SegmentPurpose, ValvePlacement, ZoneStage,
};
pub use selection::SystemSelection;
pub use zone::{AnchorSource, SourceId, SourceLine, ValveAnchor, ZoneDescriptor, ZoneId};
