//! Collision-aware drip branch routing.
//!
//! Given a floor zone, the source pipe it is fed from and the columns in
//! the way, this crate computes the complete piping branch: a tap on the
//! source pipe, a shutoff valve hung off a column, the transport line
//! through the zone and the distribution lateral behind it.
//!
//! # Overview
//!
//! Routing one zone runs these steps, each in its own module:
//!
//! - **Axes** ([`axes`]): snap the zone onto the direction it is fed from
//! - **Obstacles** ([`obstacles`]): keep the columns inside the zone
//! - **Anchor** ([`anchor`]): pick the column the valve hangs off
//! - **Connectors** ([`connector`]): place the valve, optionally through the host
//! - **Centerline** ([`centerline`]): move the transport line clear of columns
//! - **Branch** ([`branch`]): build and size the segments
//! - **Validation** ([`validation`]): raise findings and decide preview vs. materialize
//!
//! [`pass`] runs many zones in one generation pass.
//!
//! # Quick Start
//!
//! ```
//! use drip_route::compute_preview;
//! use drip_types::{RoutingParameters, SourceId, SourceLine, ZoneDescriptor, ZoneId};
//! use nalgebra::{Point3, Vector3};
//!
//! let zone = ZoneDescriptor::rectangle(
//!     ZoneId(1),
//!     Point3::new(-5.0, -3.0, 0.0),
//!     Point3::new(5.0, 3.0, 0.0),
//! )
//! .with_obstacle_points(vec![Point3::new(3.0, 2.0, 0.0)]);
//! let source = SourceLine::new(SourceId(1), Point3::new(-6.0, -1.0, 0.0), Vector3::x(), 12.0);
//!
//! let route = compute_preview(&zone, &source, &RoutingParameters::default()).unwrap();
//! assert_eq!(route.transport().len(), 9);
//! assert_eq!(route.distribution().len(), 1);
//! assert!(!route.preview_only());
//! ```
//!
//! # Materialization
//!
//! [`compute_for_materialization`] runs the same computation but lets a
//! [`ValveFitter`] place a real valve so its connectors can be used. The
//! result is still only data; the host inserts pipes from
//! [`RouteResult::materialization_plan`].

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod anchor;
pub mod axes;
pub mod branch;
pub mod centerline;
pub mod connector;
pub mod obstacles;
pub mod pass;
pub mod validation;

pub use connector::{ConnectorPair, StubFitter, ValveConnector, ValveFitter};
pub use pass::{GenerationPass, PassOutcome, PreviewBuffer};

use drip_types::geometry::with_z;
use drip_types::{Diagnostics, Line, RouteResult, RoutingError, RoutingParameters, RoutingResult, SourceLine, ZoneDescriptor, ZoneStage};
use tracing::{debug, warn};

use crate::anchor::ValveAnchorSelector;
use crate::axes::ZoneGeometry;
use crate::branch::BranchGeometryBuilder;
use crate::centerline::CenterlineSearch;
use crate::connector::place_valve;
use crate::obstacles::ObstacleIndex;
use crate::validation::ConstraintValidator;

/// Computes a side-effect free preview of one zone's branch.
///
/// Valve connectors are always stand-in stubs.
///
/// # Errors
///
/// Returns an error when the zone must be abandoned: invalid parameters,
/// malformed zone or source geometry, or no valve anchor.
pub fn compute_preview(
    zone: &ZoneDescriptor,
    source: &SourceLine,
    params: &RoutingParameters,
) -> RoutingResult<RouteResult> {
    route_zone(zone, source, params, None)
}

/// Computes one zone's branch for insertion into the host document.
///
/// `fitter` places the valve at the computed position; connectors it
/// reports are used when they face the transport line.
///
/// # Errors
///
/// Same as [`compute_preview`].
pub fn compute_for_materialization(
    zone: &ZoneDescriptor,
    source: &SourceLine,
    params: &RoutingParameters,
    fitter: &mut impl ValveFitter,
) -> RoutingResult<RouteResult> {
    route_zone(zone, source, params, Some(fitter))
}

fn route_zone(
    zone: &ZoneDescriptor,
    source: &SourceLine,
    params: &RoutingParameters,
    fitter: Option<&mut dyn ValveFitter>,
) -> RoutingResult<RouteResult> {
    let id = zone.id();
    let mut stage = ZoneStage::Pending;
    let result = route_stages(zone, source, params, fitter, &mut stage);
    if let Err(error) = &result {
        if stage.can_transition_to(ZoneStage::Aborted) {
            warn!(zone = %id, ?stage, %error, "zone aborted");
        }
    }
    result
}

fn advance(stage: &mut ZoneStage, to: ZoneStage, zone: &ZoneDescriptor) -> RoutingResult<()> {
    *stage = stage.transition(to)?;
    debug!(zone = %zone.id(), stage = ?to, "zone stage");
    Ok(())
}

fn route_stages(
    zone: &ZoneDescriptor,
    source: &SourceLine,
    params: &RoutingParameters,
    fitter: Option<&mut dyn ValveFitter>,
    stage: &mut ZoneStage,
) -> RoutingResult<RouteResult> {
    let params = params.clone().validated()?;
    let tolerances = params.tolerances();
    let id = zone.id();
    let mut diagnostics = Diagnostics::new();

    let source_line = source
        .line()
        .ok_or_else(|| RoutingError::invalid_input(format!("{} is degenerate", source.id())))?;

    let geometry = ZoneGeometry::toward_zone(zone, &source_line, tolerances, &mut diagnostics)?;
    let obstacles = ObstacleIndex::filter(geometry.rectangle(), zone.obstacle_points(), tolerances.obstacle_margin());

    let anchor = ValveAnchorSelector::new(&geometry, &source_line, tolerances, params.anchor_fallback())
        .with_fallback_offset(params.clearance())
        .select(id, zone.anchor_override(), &obstacles, &mut diagnostics)?;
    advance(stage, ZoneStage::AnchorResolved, zone)?;

    let inward = geometry.inward();
    let fitted = fitter.and_then(|f| {
        let position = connector::valve_position(&anchor, &inward, &params);
        f.fit(&position, &-inward)
    });
    let valve = place_valve(id, anchor, inward, &params, fitted, &mut diagnostics);

    let center = geometry.center();
    let preferred = Line::bound(center, with_z(&source_line.closest_point(&center), 0.0))
        .ok_or_else(|| RoutingError::invalid_input(format!("{id} center lies on {}", source.id())))?;

    let validator = ConstraintValidator::new(&params, id);
    let mut preview_only = false;
    let centerline = match CenterlineSearch::new(&obstacles, &params).search(&valve.outlet.position, &preferred) {
        Ok(found) => found.line,
        Err(error) if error.is_no_clear_line() => {
            validator.report_blocked_centerline(&error, &mut diagnostics);
            preview_only = true;
            preferred
        }
        Err(error) => return Err(error),
    };
    preview_only |= !validator.check_centerline_offset(centerline.distance_to(&center), &mut diagnostics);
    advance(stage, ZoneStage::CenterlineAccepted, zone)?;

    let branch = BranchGeometryBuilder::new(id, &geometry, &source_line, &params).build(
        &centerline,
        &valve,
        &mut diagnostics,
    );
    preview_only |= branch.preview_only;
    advance(stage, ZoneStage::GeometryBuilt, zone)?;

    match validator.decide(&diagnostics, preview_only) {
        ZoneStage::GeometryBuilt => {}
        ZoneStage::Aborted => {
            return Err(RoutingError::invalid_input(format!(
                "{id} raised fatal findings: {}",
                diagnostics.summary()
            )));
        }
        outcome => advance(stage, outcome, zone)?,
    }

    let sorted = diagnostics.sorted().into_iter().cloned().collect();
    Ok(RouteResult::new(id, source.id(), valve)
        .with_transport(branch.transport)
        .with_distribution(branch.distribution)
        .with_centerline(centerline)
        .with_preview_only(preview_only)
        .with_off_center(branch.off_center)
        .with_convert_placeholders(params.convert_placeholders())
        .with_diagnostics(sorted))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use drip_types::{DiagnosticKind, PipeSystem, Severity, SourceId, ZoneId};
    use nalgebra::{Point3, Vector3};

    fn zone() -> ZoneDescriptor {
        ZoneDescriptor::rectangle(
            ZoneId(1),
            Point3::new(-5.0, -3.0, 0.0),
            Point3::new(5.0, 3.0, 0.0),
        )
        .with_obstacle_points(vec![Point3::new(3.0, 2.0, 0.0)])
    }

    fn source() -> SourceLine {
        SourceLine::new(SourceId(1), Point3::new(-6.0, -1.0, 0.0), Vector3::x(), 12.0)
    }

    #[test]
    fn test_preview_result() {
        let route = compute_preview(&zone(), &source(), &RoutingParameters::default()).unwrap();
        assert_eq!(route.stage(), ZoneStage::GeometryBuilt);
        assert!(route.is_chained(PipeSystem::Transport, 1e-9));
        assert!(route.valve().has_dummy_connector());
        assert!(route.diagnostics().is_empty());
        assert!(route.materialization_plan().is_ok());
    }

    #[test]
    fn test_invalid_parameters_abort() {
        let params = RoutingParameters::default().with_diameters(-1.0, 0.075);
        let err = compute_preview(&zone(), &source(), &params).unwrap_err();
        assert!(matches!(err, RoutingError::InvalidConfig(_)));
    }

    #[test]
    fn test_degenerate_source_aborts() {
        let source = SourceLine::new(SourceId(2), Point3::origin(), Vector3::zeros(), 5.0);
        let err = compute_preview(&zone(), &source, &RoutingParameters::default()).unwrap_err();
        assert!(err.to_string().contains("source #2"));
    }

    #[test]
    fn test_fitter_receives_valve_position() {
        let mut seen = None;
        let mut fitter = |at: &Point3<f64>, dir: &Vector3<f64>| -> Option<crate::ConnectorPair> {
            seen = Some((*at, *dir));
            None
        };
        let route = compute_for_materialization(&zone(), &source(), &RoutingParameters::default(), &mut fitter).unwrap();
        let (at, dir) = seen.unwrap();
        assert_eq!(at, route.valve().position);
        assert_eq!(dir, -Vector3::y());
    }

    #[test]
    fn test_blocked_centerline_degrades() {
        // Column right beside the valve outlet cannot be cleared by moving the line.
        let zone = zone()
            .with_anchor_override(Point3::new(3.0, 2.0, 0.0))
            .with_obstacle_points(vec![Point3::new(3.0, 1.1, 0.0)]);
        let params = RoutingParameters::default().with_max_centerline_iterations(3);
        let route = compute_preview(&zone, &source(), &params).unwrap();

        assert!(route.preview_only());
        assert_eq!(route.max_severity(), Some(Severity::Warning));
        assert!(
            route
                .diagnostics()
                .iter()
                .any(|d| d.kind() == DiagnosticKind::ObstacleClearanceViolation)
        );
    }
}
