//! End-to-end routing scenarios.
//!
//! A 10 m x 6 m zone centered on the origin, fed from a source pipe running
//! along y = -1 with one column at (3, 2).

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use drip_route::{
    ConnectorPair, GenerationPass, ValveConnector, compute_for_materialization, compute_preview,
};
use drip_types::{
    AnchorFallback, AnchorSource, DiagnosticKind, JunctionKind, PipeSystem, RoutingError, RoutingParameters,
    SegmentPurpose, Severity, SourceId, SourceLine, ZoneDescriptor, ZoneId, ZoneStage,
};
use nalgebra::{Point3, Vector3};

// =============================================================================
// Fixtures
// =============================================================================

fn bare_zone() -> ZoneDescriptor {
    ZoneDescriptor::rectangle(
        ZoneId(1),
        Point3::new(-5.0, -3.0, 0.0),
        Point3::new(5.0, 3.0, 0.0),
    )
}

fn zone() -> ZoneDescriptor {
    bare_zone().with_obstacle_points(vec![Point3::new(3.0, 2.0, 0.0)])
}

fn source() -> SourceLine {
    SourceLine::new(SourceId(1), Point3::new(-6.0, -1.0, 0.0), Vector3::x(), 12.0)
}

fn params() -> RoutingParameters {
    RoutingParameters::default()
}

fn point(x: f64, y: f64, z: f64) -> Point3<f64> {
    Point3::new(x, y, z)
}

// =============================================================================
// Centered scenario
// =============================================================================

#[test]
fn test_centered_branch() {
    let route = compute_preview(&zone(), &source(), &params()).unwrap();

    assert_eq!(route.valve().anchor.point, point(3.0, 2.0, 0.0));
    assert_eq!(route.valve().anchor.source, AnchorSource::Obstacle);
    assert_eq!(route.transport().len(), 9);
    assert_eq!(route.distribution().len(), 1);
    assert!(!route.preview_only());
    assert!(!route.off_center());
    assert!(route.max_severity().is_none_or(|s| s <= Severity::Warning));

    let t = route.transport();
    let expected = [
        (point(3.5, -1.0, 0.0), point(3.5, -1.0, -0.4)),
        (point(3.5, -1.0, -0.4), point(3.5, 1.7, -0.4)),
        (point(3.5, 1.7, -0.4), point(3.0, 1.7, -0.4)),
        (point(3.0, 1.7, -0.4), point(3.0, 1.7, 0.0)),
        (point(3.0, 1.7, 0.0), point(3.0, 1.3, 0.0)),
        (point(3.0, 1.3, 0.0), point(3.0, 1.3, -0.4)),
        (point(3.0, 1.3, -0.4), point(0.0, 1.3, -0.4)),
        (point(0.0, 1.3, -0.4), point(0.0, 2.0, -0.4)),
        (point(0.0, 2.0, -0.4), point(0.0, 2.0, 0.0)),
    ];
    for (segment, (start, end)) in t.iter().zip(expected) {
        assert_relative_eq!(segment.start(), start, epsilon = 1e-9);
        assert_relative_eq!(segment.end(), end, epsilon = 1e-9);
    }
    assert_eq!(t[4].purpose(), SegmentPurpose::ValveBody);

    let lateral = &route.distribution()[0];
    assert_eq!(lateral.purpose(), SegmentPurpose::Lateral);
    assert_relative_eq!(lateral.start(), point(4.5, 2.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(lateral.end(), point(-4.5, 2.0, 0.0), epsilon = 1e-9);
}

#[test]
fn test_chains_are_continuous() {
    let route = compute_preview(&zone(), &source(), &params()).unwrap();
    assert!(route.is_chained(PipeSystem::Transport, 1e-9));
    assert!(route.is_chained(PipeSystem::Distribution, 1e-9));
    assert_relative_eq!(
        route.transport().last().unwrap().end(),
        route.distribution()[0].line().unwrap().project(&route.transport().last().unwrap().end()),
        epsilon = 1e-9
    );
}

#[test]
fn test_sizing() {
    let params = params().with_diameters(0.125, 0.063);
    let route = compute_preview(&zone(), &source(), &params).unwrap();
    for segment in route.segments() {
        let expected = match segment.system() {
            PipeSystem::Transport => 0.125,
            PipeSystem::Distribution => 0.063,
        };
        assert_eq!(segment.diameter(), Some(expected));
    }
}

#[test]
fn test_determinism() {
    let first = compute_preview(&zone(), &source(), &params()).unwrap();
    let second = compute_preview(&zone(), &source(), &params()).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Off-center and overrides
// =============================================================================

#[test]
fn test_override_precedence() {
    let zone = zone().with_anchor_override(point(-2.0, 1.0, 0.0));
    let route = compute_preview(&zone, &source(), &params()).unwrap();

    assert_eq!(route.valve().anchor.source, AnchorSource::Override);
    assert_eq!(route.valve().anchor.point, point(-2.0, 1.0, 0.0));
    assert_relative_eq!(route.valve().position, point(-2.0, 0.5, 0.0), epsilon = 1e-12);
}

#[test]
fn test_column_on_preferred_line_moves_transport() {
    let zone = zone()
        .with_anchor_override(point(3.0, 2.0, 0.0))
        .with_obstacle_points(vec![point(3.0, 2.0, 0.0), point(0.1, -0.5, 0.0)]);
    let route = compute_preview(&zone, &source(), &params()).unwrap();

    assert!(route.off_center());
    assert!(!route.preview_only());
    assert_eq!(route.transport().len(), 10);
    assert_eq!(route.transport()[8].purpose(), SegmentPurpose::TeeApproach);
    assert_relative_eq!(route.centerline().unwrap().origin().x, -0.5005, epsilon = 1e-12);
    assert!(route.is_chained(PipeSystem::Transport, 1e-9));

    let line = route.centerline().unwrap();
    assert!(line.distance_to(&point(0.1, -0.5, 0.0)) >= params().clearance());
}

#[test]
fn test_column_beside_outlet_degrades_to_preview() {
    let zone = zone()
        .with_anchor_override(point(3.0, 2.0, 0.0))
        .with_obstacle_points(vec![point(3.0, 1.1, 0.0)]);
    let route = compute_preview(&zone, &source(), &params().with_max_centerline_iterations(4)).unwrap();

    assert!(route.preview_only());
    assert_eq!(route.stage(), ZoneStage::Preview);
    assert_eq!(route.max_severity(), Some(Severity::Warning));
    assert!(matches!(
        route.materialization_plan(),
        Err(RoutingError::PreviewOnly { zone: ZoneId(1) })
    ));
}

// =============================================================================
// Zones without columns
// =============================================================================

#[test]
fn test_no_columns_rejected_by_default() {
    let err = compute_preview(&bare_zone(), &source(), &params()).unwrap_err();
    assert!(err.is_no_valve_anchor());
    assert_eq!(err.to_diagnostic().severity(), Severity::Fatal);
}

#[test]
fn test_no_columns_falls_back_to_center() {
    let params = params().with_anchor_fallback(AnchorFallback::ZoneCenter);
    let route = compute_preview(&bare_zone(), &source(), &params).unwrap();

    assert_eq!(route.valve().anchor.source, AnchorSource::ZoneCenter);
    assert_relative_eq!(route.valve().anchor.point, point(0.5, 0.0, 0.0), epsilon = 1e-12);
    assert_eq!(route.max_severity(), Some(Severity::Info));
    assert!(
        route
            .diagnostics()
            .iter()
            .all(|d| d.kind() == DiagnosticKind::ValveAnchorFallback)
    );

    // The outlet sits beside the centerline, so the branch is complete.
    assert!(!route.preview_only());
    assert_eq!(route.transport().len(), 9);
    assert_eq!(route.transport()[2].purpose(), SegmentPurpose::ValveApproach);
    assert_eq!(route.transport()[6].purpose(), SegmentPurpose::OutletRun);
    assert_relative_eq!(route.transport()[0].start(), point(1.0, -1.0, 0.0), epsilon = 1e-9);
    assert!(route.materialization_plan().is_ok());
}

// =============================================================================
// Degradation
// =============================================================================

#[test]
fn test_height_separation_degrades() {
    let params = params().with_transport_height(-0.1);
    let route = compute_preview(&zone(), &source(), &params).unwrap();

    assert!(route.preview_only());
    assert_eq!(route.max_severity(), Some(Severity::Warning));
    assert!(
        route
            .diagnostics()
            .iter()
            .any(|d| d.kind() == DiagnosticKind::HeightSeparationTooSmall)
    );
}

#[test]
fn test_warnings_sorted_before_info() {
    let params = params()
        .with_anchor_fallback(AnchorFallback::ZoneCenter)
        .with_transport_height(-0.1);
    let route = compute_preview(&bare_zone(), &source(), &params).unwrap();
    let severities: Vec<Severity> = route.diagnostics().iter().map(|d| d.severity()).collect();
    let mut sorted = severities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(severities, sorted);
}

// =============================================================================
// Materialization
// =============================================================================

fn facing_down(at: &Point3<f64>, dir: &Vector3<f64>) -> Option<ConnectorPair> {
    Some(ConnectorPair {
        inlet: ValveConnector::new(at - dir * 0.1, -Vector3::z()),
        outlet: ValveConnector::new(at + dir * 0.1, -Vector3::z()),
    })
}

#[test]
fn test_materialize_with_physical_valve() {
    let mut fitter = facing_down;
    let route = compute_for_materialization(&zone(), &source(), &params(), &mut fitter).unwrap();

    assert!(!route.valve().has_dummy_connector());
    assert_relative_eq!(route.valve().inlet.position, point(3.0, 1.6, 0.0), epsilon = 1e-12);
    assert_relative_eq!(route.valve().outlet.position, point(3.0, 1.4, 0.0), epsilon = 1e-12);
    assert!(route.diagnostics().is_empty());

    let plan = route.materialization_plan().unwrap();
    assert_eq!(plan.runs().len(), 9);
    assert!(plan.convert_placeholders());
    let kinds: Vec<JunctionKind> = plan.junctions().iter().map(|j| j.kind).collect();
    assert_eq!(kinds.first(), Some(&JunctionKind::SourceTap));
    assert_eq!(kinds.iter().filter(|k| **k == JunctionKind::Elbow).count(), 6);
    assert_eq!(kinds.iter().filter(|k| **k == JunctionKind::Cap).count(), 2);

    let committed = plan.commit().unwrap();
    assert_eq!(committed.stage(), ZoneStage::Materialized);
}

#[test]
fn test_materialize_with_upward_connector() {
    let mut fitter = |at: &Point3<f64>, dir: &Vector3<f64>| -> Option<ConnectorPair> {
        Some(ConnectorPair {
            inlet: ValveConnector::new(at - dir * 0.1, Vector3::z()),
            outlet: ValveConnector::new(at + dir * 0.1, -Vector3::z()),
        })
    };
    let route = compute_for_materialization(&zone(), &source(), &params(), &mut fitter).unwrap();

    assert!(route.valve().inlet.dummy);
    assert!(!route.valve().outlet.dummy);
    assert!(!route.preview_only());
    assert_eq!(route.max_severity(), Some(Severity::Warning));
}

// =============================================================================
// Generation pass
// =============================================================================

#[test]
fn test_pass_routes_every_zone() {
    let params = params();
    let sources = [
        source(),
        SourceLine::new(SourceId(2), point(14.0, -1.0, 0.0), Vector3::x(), 12.0),
    ];
    let far = ZoneDescriptor::rectangle(ZoneId(2), point(15.0, -3.0, 0.0), point(25.0, 3.0, 0.0))
        .with_obstacle_points(vec![point(18.0, 2.0, 0.0)]);
    let outcome = GenerationPass::new(&params, &sources).preview(&[zone(), far]);

    assert_eq!(outcome.results().len(), 2);
    assert_eq!(outcome.sources(), &[SourceId(1), SourceId(2)]);
    assert_eq!(outcome.results()[1].valve().anchor.point, point(18.0, 2.0, 0.0));
    assert_eq!(outcome.preview().len(), 20);
}
