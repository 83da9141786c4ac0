//! Branch geometry construction.
//!
//! Builds the fixed branch topology from the accepted transport centerline:
//!
//! ```text
//! tap -> p1 -> elbow -> p2 -> inlet => outlet -> p3 -> corner [-> p4] -> p5 -> tee
//!                                                      lateral: tee+half -> tee-half
//! ```
//!
//! `p1`, `p2`, `p3`, `corner`, `p4` and `p5` sit at transport height; the
//! tee and the lateral at distribution height. The `p4` jog only exists when
//! the transport line was pushed off the zone center.

use drip_types::geometry::{flatten, try_normalize, with_z};
use drip_types::{
    Diagnostic, DiagnosticKind, Diagnostics, Line, PipeSystem, RoutingParameters, Segment, SegmentPurpose,
    Severity, ValvePlacement, ZoneId,
};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::axes::ZoneGeometry;
use crate::validation::ConstraintValidator;

/// Segments of one branch before they are wrapped into a route result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchGeometry {
    /// Transport segments in chain order.
    pub transport: Vec<Segment>,
    /// Distribution segments.
    pub distribution: Vec<Segment>,
    /// Set when any check reduced the branch to a preview.
    pub preview_only: bool,
    /// Set when the transport line does not pass through the zone center.
    pub off_center: bool,
}

/// Assembles the segments of one branch.
///
/// # Example
///
/// ```
/// use drip_route::axes::ZoneGeometry;
/// use drip_route::branch::BranchGeometryBuilder;
/// use drip_route::connector::place_valve;
/// use drip_types::{AnchorSource, Diagnostics, Line, RoutingParameters, ValveAnchor, ZoneDescriptor, ZoneId};
/// use nalgebra::{Point3, Vector3};
///
/// let params = RoutingParameters::default();
/// let zone = ZoneDescriptor::rectangle(ZoneId(1), Point3::new(-5.0, -3.0, 0.0), Point3::new(5.0, 3.0, 0.0));
/// let source = Line::bound(Point3::new(-6.0, -1.0, 0.0), Point3::new(6.0, -1.0, 0.0)).unwrap();
/// let mut diagnostics = Diagnostics::new();
/// let axes = ZoneGeometry::toward_zone(&zone, &source, params.tolerances(), &mut diagnostics).unwrap();
///
/// let anchor = ValveAnchor::new(Point3::new(3.0, 2.0, 0.0), AnchorSource::Obstacle);
/// let valve = place_valve(zone.id(), anchor, axes.inward(), &params, None, &mut diagnostics);
/// let centerline = Line::bound(Point3::origin(), Point3::new(0.0, -1.0, 0.0)).unwrap();
///
/// let branch = BranchGeometryBuilder::new(zone.id(), &axes, &source, &params)
///     .build(&centerline, &valve, &mut diagnostics);
/// assert_eq!(branch.transport.len(), 9);
/// assert_eq!(branch.distribution.len(), 1);
/// assert!(!branch.preview_only);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BranchGeometryBuilder<'a> {
    zone: ZoneId,
    geometry: &'a ZoneGeometry,
    source: &'a Line,
    params: &'a RoutingParameters,
}

impl<'a> BranchGeometryBuilder<'a> {
    /// Creates a builder for one zone.
    #[must_use]
    pub const fn new(
        zone: ZoneId,
        geometry: &'a ZoneGeometry,
        source: &'a Line,
        params: &'a RoutingParameters,
    ) -> Self {
        Self {
            zone,
            geometry,
            source,
            params,
        }
    }

    /// Builds, sizes and checks the branch.
    pub fn build(&self, centerline: &Line, valve: &ValvePlacement, diagnostics: &mut Diagnostics) -> BranchGeometry {
        let params = self.params;
        let transport_z = params.transport_height();
        let validator = ConstraintValidator::new(params, self.zone);
        let center = self.geometry.center();
        let inward = self.geometry.inward();

        let inlet = valve.inlet.position;
        let outlet = valve.outlet.position;

        // Valve outlet down to the transport line.
        let p3 = with_z(&outlet, transport_z);
        let foot = centerline.project(&p3);
        let toward_line = try_normalize(&flatten(&(foot - p3))).unwrap_or_else(Vector3::zeros);

        // Source tap over to the valve inlet, kept clear of the anchor column.
        let p2 = with_z(&inlet, transport_z);
        let elbow = p2 - toward_line * params.pipe_to_column_offset();
        let tap = self.source.project(&elbow);
        let p1 = with_z(&tap, transport_z);

        let mut preview_only = !validator.check_height_separation(tap.z, diagnostics);

        // Transport line to the tee.
        let off_center = centerline.distance_to(&center) > params.tolerances().geometry_epsilon();
        let corner = with_z(&foot, transport_z);
        let root = self.geometry.root();
        let tee = with_z(
            &(center + root * 0.5 - inward * params.backwall_offset()),
            params.distribution_height(),
        );
        let p5 = with_z(&tee, transport_z);
        let p4 = Line::unbound(corner, root).map_or(p5, |l| l.project(&p5));

        // Lateral across the zone, inset from both side walls.
        let half = self.geometry.perpendicular() * 0.5 - self.geometry.lateral() * (params.lateral_spacing() * 0.5);

        let mut chain = Chain::new(self.zone, PipeSystem::Transport);
        chain.push(tap, p1, SegmentPurpose::SourceRiser);
        chain.push(p1, elbow, SegmentPurpose::SourceRun);
        chain.push(elbow, p2, SegmentPurpose::ValveApproach);
        chain.push(p2, inlet, SegmentPurpose::InletRiser);
        chain.push(inlet, outlet, SegmentPurpose::ValveBody);
        chain.push(outlet, p3, SegmentPurpose::OutletRiser);
        chain.push(p3, corner, SegmentPurpose::OutletRun);
        if off_center {
            chain.push(corner, p4, SegmentPurpose::TransportLine);
            chain.push(p4, p5, SegmentPurpose::TeeApproach);
        } else {
            chain.push(corner, p5, SegmentPurpose::TransportLine);
        }
        chain.push(p5, tee, SegmentPurpose::TeeRiser);

        let mut lateral = Chain::new(self.zone, PipeSystem::Distribution);
        lateral.push(tee + half, tee - half, SegmentPurpose::Lateral);

        preview_only |= chain.skipped(diagnostics);
        preview_only |= lateral.skipped(diagnostics);

        let mut transport = chain.segments;
        let mut distribution = lateral.segments;
        assign_diameters(&mut transport, params);
        assign_diameters(&mut distribution, params);

        preview_only |= !validator.check_segment_lengths(&transport, diagnostics);
        preview_only |= !validator.check_segment_lengths(&distribution, diagnostics);

        debug!(
            zone = %self.zone,
            transport = transport.len(),
            distribution = distribution.len(),
            off_center,
            preview_only,
            "built branch geometry"
        );

        BranchGeometry {
            transport,
            distribution,
            preview_only,
            off_center,
        }
    }
}

/// Gives every segment the diameter of its system.
pub fn assign_diameters(segments: &mut [Segment], params: &RoutingParameters) {
    for segment in segments.iter_mut() {
        let diameter = match segment.system() {
            PipeSystem::Transport => params.transport_diameter(),
            PipeSystem::Distribution => params.distribution_diameter(),
        };
        *segment = segment.with_diameter(diameter);
    }
}

/// Collects segments, dropping the ones with no length.
struct Chain {
    zone: ZoneId,
    system: PipeSystem,
    segments: Vec<Segment>,
    skipped: Vec<SegmentPurpose>,
}

impl Chain {
    const fn new(zone: ZoneId, system: PipeSystem) -> Self {
        Self {
            zone,
            system,
            segments: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn push(&mut self, start: Point3<f64>, end: Point3<f64>, purpose: SegmentPurpose) {
        let segment = Segment::new(start, end, purpose, self.system);
        if segment.line().is_some() {
            self.segments.push(segment);
        } else {
            self.skipped.push(purpose);
        }
    }

    /// Reports skipped segments; returns `true` if there were any.
    fn skipped(&self, diagnostics: &mut Diagnostics) -> bool {
        for purpose in &self.skipped {
            diagnostics.push(
                Diagnostic::unique(
                    DiagnosticKind::SegmentTooShort,
                    Severity::Warning,
                    format!("The {} has no length and was left out", purpose.label()),
                )
                .with_zone(self.zone),
            );
        }
        !self.skipped.is_empty()
    }
}
