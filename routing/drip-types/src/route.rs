//! Route records: segments, valve placement and the per-zone result.
//!
//! A [`RouteResult`] is produced fresh by every routing call and never
//! changed afterwards. Segments refer to each other only through shared
//! coordinates; [`RouteResult::is_chained`] checks that they line up.
//!
//! Turning a result into document changes is the host's business. The host
//! asks for a [`MaterializationPlan`], which is refused for preview-only
//! results, and calls [`MaterializationPlan::commit`] once its transaction
//! went through.

use nalgebra::{Point3, Vector3};

use crate::diagnostic::{Diagnostic, Severity};
use crate::error::{RoutingError, RoutingResult};
use crate::geometry::Line;
use crate::zone::{SourceId, ValveAnchor, ZoneId};

/// The network a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PipeSystem {
    /// Source tap, valve and transport line up to the tee.
    Transport,
    /// Lateral fed by the tee.
    Distribution,
}

impl PipeSystem {
    /// Get a human-readable name for the system.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "Transport",
            Self::Distribution => "Distribution",
        }
    }
}

/// Role of a segment in the fixed branch topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentPurpose {
    /// Vertical pipe from the source tap to transport height.
    SourceRiser,
    /// Horizontal run from above the tap to the valve elbow.
    SourceRun,
    /// Short run from the elbow to below the valve inlet.
    ValveApproach,
    /// Vertical pipe up to the valve inlet.
    InletRiser,
    /// The valve itself, between its inlet and outlet.
    ValveBody,
    /// Vertical pipe down from the valve outlet.
    OutletRiser,
    /// Run from below the outlet onto the transport line.
    OutletRun,
    /// The long transport line towards the tee.
    TransportLine,
    /// Jog from an off-center transport line back to the tee.
    TeeApproach,
    /// Vertical pipe up to the tee.
    TeeRiser,
    /// Distribution lateral across the zone.
    Lateral,
}

impl SegmentPurpose {
    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SourceRiser => "source riser",
            Self::SourceRun => "source run",
            Self::ValveApproach => "valve approach",
            Self::InletRiser => "inlet riser",
            Self::ValveBody => "valve body",
            Self::OutletRiser => "outlet riser",
            Self::OutletRun => "outlet run",
            Self::TransportLine => "transport line",
            Self::TeeApproach => "tee approach",
            Self::TeeRiser => "tee riser",
            Self::Lateral => "lateral",
        }
    }

    /// Returns `false` for the valve body, which is not a pipe.
    #[must_use]
    pub const fn is_pipe(&self) -> bool {
        !matches!(self, Self::ValveBody)
    }
}

/// A straight piece of the branch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    start: Point3<f64>,
    end: Point3<f64>,
    purpose: SegmentPurpose,
    system: PipeSystem,
    diameter: Option<f64>,
}

impl Segment {
    /// Creates an unsized segment.
    #[must_use]
    pub const fn new(start: Point3<f64>, end: Point3<f64>, purpose: SegmentPurpose, system: PipeSystem) -> Self {
        Self {
            start,
            end,
            purpose,
            system,
            diameter: None,
        }
    }

    /// Sets the pipe diameter.
    #[must_use]
    pub const fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = Some(diameter);
        self
    }

    /// Returns the start point.
    #[must_use]
    pub const fn start(&self) -> Point3<f64> {
        self.start
    }

    /// Returns the end point.
    #[must_use]
    pub const fn end(&self) -> Point3<f64> {
        self.end
    }

    /// Returns the purpose.
    #[must_use]
    pub const fn purpose(&self) -> SegmentPurpose {
        self.purpose
    }

    /// Returns the owning system.
    #[must_use]
    pub const fn system(&self) -> PipeSystem {
        self.system
    }

    /// Returns the diameter, `None` before sizing.
    #[must_use]
    pub const fn diameter(&self) -> Option<f64> {
        self.diameter
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Vector from start to end.
    #[must_use]
    pub fn delta(&self) -> Vector3<f64> {
        self.end - self.start
    }

    /// Bounded line of the segment, `None` if it has zero length.
    #[must_use]
    pub fn line(&self) -> Option<Line> {
        Line::bound(self.start, self.end)
    }

    /// Returns `true` if `next` carries on in the same direction.
    #[must_use]
    pub fn continues_straight(&self, next: &Self) -> bool {
        let (a, b) = (self.delta(), next.delta());
        let scale = a.norm() * b.norm();
        scale > 0.0 && a.dot(&b) > 0.0 && a.cross(&b).norm() <= PARALLEL_TOLERANCE * scale
    }
}

/// Sine of the largest angle still treated as a straight run.
const PARALLEL_TOLERANCE: f64 = 1e-9;

/// One end of the valve where a pipe attaches.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectorPoint {
    /// Attachment point.
    pub position: Point3<f64>,
    /// `true` when this is a stand-in stub rather than a real connector.
    pub dummy: bool,
}

impl ConnectorPoint {
    /// A connector taken from a physical valve.
    #[must_use]
    pub const fn physical(position: Point3<f64>) -> Self {
        Self {
            position,
            dummy: false,
        }
    }

    /// A stand-in stub.
    #[must_use]
    pub const fn dummy(position: Point3<f64>) -> Self {
        Self { position, dummy: true }
    }
}

/// Where the zone's shutoff valve goes and how pipes attach to it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValvePlacement {
    /// Valve insertion point.
    pub position: Point3<f64>,
    /// Horizontal unit vector pointing from the source into the zone.
    pub inward: Vector3<f64>,
    /// Inlet connector (source side).
    pub inlet: ConnectorPoint,
    /// Outlet connector (zone side).
    pub outlet: ConnectorPoint,
    /// Anchor the valve was positioned from.
    pub anchor: ValveAnchor,
}

impl ValvePlacement {
    /// Returns `true` if either connector is a stand-in.
    #[must_use]
    pub const fn has_dummy_connector(&self) -> bool {
        self.inlet.dummy || self.outlet.dummy
    }
}

/// Lifecycle of one zone through a generation pass.
///
/// ```text
/// Pending -> AnchorResolved -> CenterlineAccepted -> GeometryBuilt -> Preview
///                                                                 \-> Materialized
/// any non-terminal stage -> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZoneStage {
    /// Nothing computed yet.
    Pending,
    /// Valve anchor chosen.
    AnchorResolved,
    /// Transport centerline accepted.
    CenterlineAccepted,
    /// Segments built.
    GeometryBuilt,
    /// Result can only be shown, not materialized.
    Preview,
    /// Result was written into the host document.
    Materialized,
    /// Zone was abandoned.
    Aborted,
}

impl ZoneStage {
    /// Returns `true` for stages with no outgoing transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Preview | Self::Materialized | Self::Aborted)
    }

    /// Checks whether moving to `to` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        match (self, to) {
            (from, Self::Aborted) => !from.is_terminal(),
            (Self::Pending, Self::AnchorResolved)
            | (Self::AnchorResolved, Self::CenterlineAccepted)
            | (Self::CenterlineAccepted, Self::GeometryBuilt)
            | (Self::GeometryBuilt, Self::Preview | Self::Materialized) => true,
            _ => false,
        }
    }

    /// Moves to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidTransition`] if the move is not allowed.
    pub fn transition(self, to: Self) -> RoutingResult<Self> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(RoutingError::InvalidTransition { from: self, to })
        }
    }
}

/// Complete routing outcome for one zone.
///
/// # Example
///
/// ```
/// use drip_types::{
///     AnchorSource, ConnectorPoint, RouteResult, SourceId, ValveAnchor, ValvePlacement, ZoneId,
/// };
/// use nalgebra::{Point3, Vector3};
///
/// let valve = ValvePlacement {
///     position: Point3::origin(),
///     inward: Vector3::y(),
///     inlet: ConnectorPoint::dummy(Point3::new(0.0, 0.2, 0.0)),
///     outlet: ConnectorPoint::dummy(Point3::new(0.0, -0.2, 0.0)),
///     anchor: ValveAnchor::new(Point3::origin(), AnchorSource::Override),
/// };
/// let result = RouteResult::new(ZoneId(1), SourceId(2), valve).with_preview_only(true);
///
/// assert!(result.materialization_plan().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteResult {
    zone: ZoneId,
    source: SourceId,
    transport: Vec<Segment>,
    distribution: Vec<Segment>,
    valve: ValvePlacement,
    centerline: Option<Line>,
    preview_only: bool,
    off_center: bool,
    convert_placeholders: bool,
    diagnostics: Vec<Diagnostic>,
}

impl RouteResult {
    /// Creates an empty result for a zone.
    #[must_use]
    pub const fn new(zone: ZoneId, source: SourceId, valve: ValvePlacement) -> Self {
        Self {
            zone,
            source,
            transport: Vec::new(),
            distribution: Vec::new(),
            valve,
            centerline: None,
            preview_only: false,
            off_center: false,
            convert_placeholders: true,
            diagnostics: Vec::new(),
        }
    }

    /// Sets the transport segments, in chain order.
    #[must_use]
    pub fn with_transport(mut self, segments: Vec<Segment>) -> Self {
        self.transport = segments;
        self
    }

    /// Sets the distribution segments.
    #[must_use]
    pub fn with_distribution(mut self, segments: Vec<Segment>) -> Self {
        self.distribution = segments;
        self
    }

    /// Sets the accepted transport centerline.
    #[must_use]
    pub const fn with_centerline(mut self, line: Line) -> Self {
        self.centerline = Some(line);
        self
    }

    /// Marks the result as preview only.
    #[must_use]
    pub const fn with_preview_only(mut self, preview_only: bool) -> Self {
        self.preview_only = preview_only;
        self
    }

    /// Marks the transport line as displaced from the zone center.
    #[must_use]
    pub const fn with_off_center(mut self, off_center: bool) -> Self {
        self.off_center = off_center;
        self
    }

    /// Sets the placeholder conversion flag passed on to the host.
    #[must_use]
    pub const fn with_convert_placeholders(mut self, convert: bool) -> Self {
        self.convert_placeholders = convert;
        self
    }

    /// Sets the diagnostics, already ordered for display.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the zone id.
    #[must_use]
    pub const fn zone(&self) -> ZoneId {
        self.zone
    }

    /// Returns the id of the tapped source line.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.source
    }

    /// Returns the transport segments in chain order.
    #[must_use]
    pub fn transport(&self) -> &[Segment] {
        &self.transport
    }

    /// Returns the distribution segments.
    #[must_use]
    pub fn distribution(&self) -> &[Segment] {
        &self.distribution
    }

    /// Iterates over every segment, transport first.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.transport.iter().chain(self.distribution.iter())
    }

    /// Returns the valve placement.
    #[must_use]
    pub const fn valve(&self) -> &ValvePlacement {
        &self.valve
    }

    /// Returns the accepted transport centerline.
    #[must_use]
    pub const fn centerline(&self) -> Option<&Line> {
        self.centerline.as_ref()
    }

    /// Returns `true` if the result must not be materialized.
    #[must_use]
    pub const fn preview_only(&self) -> bool {
        self.preview_only
    }

    /// Returns `true` if the transport line was moved off the zone center.
    #[must_use]
    pub const fn off_center(&self) -> bool {
        self.off_center
    }

    /// Returns the placeholder conversion flag.
    #[must_use]
    pub const fn convert_placeholders(&self) -> bool {
        self.convert_placeholders
    }

    /// Returns the diagnostics by descending severity.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Highest diagnostic severity, `None` if there are none.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }

    /// Stage the zone reached.
    #[must_use]
    pub const fn stage(&self) -> ZoneStage {
        if self.preview_only {
            ZoneStage::Preview
        } else {
            ZoneStage::GeometryBuilt
        }
    }

    /// Checks that every segment of `system` starts where the previous one
    /// ended, within `tolerance`.
    #[must_use]
    pub fn is_chained(&self, system: PipeSystem, tolerance: f64) -> bool {
        let segments = match system {
            PipeSystem::Transport => &self.transport,
            PipeSystem::Distribution => &self.distribution,
        };
        segments
            .windows(2)
            .all(|pair| (pair[1].start - pair[0].end).norm() <= tolerance)
    }

    /// Total length of the transport pipes (valve body excluded).
    #[must_use]
    pub fn transport_pipe_length(&self) -> f64 {
        self.transport
            .iter()
            .filter(|s| s.purpose.is_pipe())
            .map(Segment::length)
            .sum()
    }

    /// Builds the plan the host follows to insert the branch.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::PreviewOnly`] for preview-only results and
    /// [`RoutingError::InvalidInput`] if a segment was never sized.
    pub fn materialization_plan(&self) -> RoutingResult<MaterializationPlan> {
        if self.preview_only {
            return Err(RoutingError::PreviewOnly { zone: self.zone });
        }

        let mut runs = Vec::with_capacity(self.transport.len() + self.distribution.len());
        for segment in self.segments().filter(|s| s.purpose.is_pipe()) {
            let diameter = segment.diameter.ok_or_else(|| {
                RoutingError::invalid_input(format!("{} has no diameter", segment.purpose.label()))
            })?;
            runs.push(PipeRun {
                start: segment.start,
                end: segment.end,
                purpose: segment.purpose,
                system: segment.system,
                diameter,
            });
        }

        Ok(MaterializationPlan {
            zone: self.zone,
            source: self.source,
            runs,
            valve: self.valve,
            junctions: self.junctions(),
            convert_placeholders: self.convert_placeholders,
            stage: ZoneStage::GeometryBuilt,
        })
    }

    /// Fittings between consecutive pipes.
    fn junctions(&self) -> Vec<Junction> {
        let mut junctions = Vec::new();
        if let Some(first) = self.transport.first() {
            junctions.push(Junction {
                point: first.start,
                kind: JunctionKind::SourceTap,
            });
        }
        for pair in self.transport.windows(2) {
            if pair[0].purpose.is_pipe() && pair[1].purpose.is_pipe() {
                let kind = if pair[0].continues_straight(&pair[1]) {
                    JunctionKind::Coupling
                } else {
                    JunctionKind::Elbow
                };
                junctions.push(Junction {
                    point: pair[0].end,
                    kind,
                });
            }
        }
        if !self.distribution.is_empty() {
            if let Some(last) = self.transport.last() {
                junctions.push(Junction {
                    point: last.end,
                    kind: JunctionKind::Tee,
                });
            }
        }
        for lateral in self.distribution.iter().filter(|s| s.purpose == SegmentPurpose::Lateral) {
            junctions.push(Junction {
                point: lateral.start,
                kind: JunctionKind::Cap,
            });
            junctions.push(Junction {
                point: lateral.end,
                kind: JunctionKind::Cap,
            });
        }
        junctions
    }
}

/// Kind of fitting the host places at a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JunctionKind {
    /// Where the branch leaves the source line.
    SourceTap,
    /// Between two consecutive transport pipes that change direction.
    Elbow,
    /// Between two consecutive transport pipes running straight on.
    Coupling,
    /// Where the transport line feeds the lateral.
    Tee,
    /// Closes an open lateral end.
    Cap,
}

/// A fitting location.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    /// Fitting location.
    pub point: Point3<f64>,
    /// Fitting kind.
    pub kind: JunctionKind,
}

/// A sized pipe to insert.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipeRun {
    /// Start point.
    pub start: Point3<f64>,
    /// End point.
    pub end: Point3<f64>,
    /// Role in the branch.
    pub purpose: SegmentPurpose,
    /// Owning system.
    pub system: PipeSystem,
    /// Pipe diameter.
    pub diameter: f64,
}

/// Everything the host needs to insert one zone's branch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterializationPlan {
    zone: ZoneId,
    source: SourceId,
    runs: Vec<PipeRun>,
    valve: ValvePlacement,
    junctions: Vec<Junction>,
    convert_placeholders: bool,
    stage: ZoneStage,
}

impl MaterializationPlan {
    /// Returns the zone id.
    #[must_use]
    pub const fn zone(&self) -> ZoneId {
        self.zone
    }

    /// Returns the tapped source line.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.source
    }

    /// Returns the pipes in insertion order.
    #[must_use]
    pub fn runs(&self) -> &[PipeRun] {
        &self.runs
    }

    /// Returns the valve placement.
    #[must_use]
    pub const fn valve(&self) -> &ValvePlacement {
        &self.valve
    }

    /// Returns the fitting locations.
    #[must_use]
    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// Returns whether placeholders should be converted to real pipes.
    #[must_use]
    pub const fn convert_placeholders(&self) -> bool {
        self.convert_placeholders
    }

    /// Returns the current stage.
    #[must_use]
    pub const fn stage(&self) -> ZoneStage {
        self.stage
    }

    /// Records that the host committed the plan.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidTransition`] if the plan was already
    /// committed.
    pub fn commit(mut self) -> RoutingResult<Self> {
        self.stage = self.stage.transition(ZoneStage::Materialized)?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::zone::AnchorSource;
    use approx::assert_relative_eq;

    fn valve() -> ValvePlacement {
        ValvePlacement {
            position: Point3::new(0.0, 1.5, 0.0),
            inward: Vector3::y(),
            inlet: ConnectorPoint::dummy(Point3::new(0.0, 1.7, 0.0)),
            outlet: ConnectorPoint::dummy(Point3::new(0.0, 1.3, 0.0)),
            anchor: ValveAnchor::new(Point3::new(0.0, 2.0, 0.0), AnchorSource::Obstacle),
        }
    }

    fn chain() -> Vec<Segment> {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 0.0, -0.4);
        let c = Point3::new(0.0, 2.0, -0.4);
        let d = Point3::new(0.0, 2.0, 0.0);
        vec![
            Segment::new(a, b, SegmentPurpose::SourceRiser, PipeSystem::Transport).with_diameter(0.11),
            Segment::new(b, c, SegmentPurpose::ValveBody, PipeSystem::Transport),
            Segment::new(c, d, SegmentPurpose::TeeRiser, PipeSystem::Transport).with_diameter(0.11),
        ]
    }

    #[test]
    fn test_stage_transitions() {
        let stage = ZoneStage::Pending
            .transition(ZoneStage::AnchorResolved)
            .and_then(|s| s.transition(ZoneStage::CenterlineAccepted))
            .and_then(|s| s.transition(ZoneStage::GeometryBuilt))
            .unwrap();
        assert!(stage.can_transition_to(ZoneStage::Preview));
        assert!(stage.can_transition_to(ZoneStage::Aborted));
        assert!(ZoneStage::Pending.transition(ZoneStage::GeometryBuilt).is_err());
        assert!(ZoneStage::Preview.transition(ZoneStage::Materialized).is_err());
        assert!(ZoneStage::Preview.transition(ZoneStage::Aborted).is_err());
    }

    #[test]
    fn test_is_chained() {
        let result = RouteResult::new(ZoneId(1), SourceId(1), valve()).with_transport(chain());
        assert!(result.is_chained(PipeSystem::Transport, 1e-9));

        let mut broken = chain();
        broken.swap(0, 2);
        let result = RouteResult::new(ZoneId(1), SourceId(1), valve()).with_transport(broken);
        assert!(!result.is_chained(PipeSystem::Transport, 1e-9));
    }

    #[test]
    fn test_plan_skips_valve_body() {
        let lateral = Segment::new(
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(-1.0, 2.0, 0.0),
            SegmentPurpose::Lateral,
            PipeSystem::Distribution,
        )
        .with_diameter(0.075);
        let result = RouteResult::new(ZoneId(1), SourceId(4), valve())
            .with_transport(chain())
            .with_distribution(vec![lateral]);

        let plan = result.materialization_plan().unwrap();
        assert_eq!(plan.runs().len(), 3);
        assert!(plan.runs().iter().all(|r| r.purpose != SegmentPurpose::ValveBody));
        assert_eq!(plan.source(), SourceId(4));
        assert_eq!(plan.junctions().first().unwrap().kind, JunctionKind::SourceTap);
        let kinds: Vec<JunctionKind> = plan.junctions().iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![JunctionKind::SourceTap, JunctionKind::Tee, JunctionKind::Cap, JunctionKind::Cap]
        );
        assert_eq!(plan.junctions()[3].point, Point3::new(-1.0, 2.0, 0.0));
        assert_relative_eq!(result.transport_pipe_length(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_straight_joint_is_a_coupling() {
        let a = Point3::new(0.0, 0.0, -0.4);
        let b = Point3::new(0.0, 1.0, -0.4);
        let c = Point3::new(0.0, 3.0, -0.4);
        let d = Point3::new(1.0, 3.0, -0.4);
        let pipe = |s, e, purpose| Segment::new(s, e, purpose, PipeSystem::Transport).with_diameter(0.11);
        let result = RouteResult::new(ZoneId(1), SourceId(1), valve()).with_transport(vec![
            pipe(a, b, SegmentPurpose::TransportLine),
            pipe(b, c, SegmentPurpose::TeeApproach),
            pipe(c, d, SegmentPurpose::OutletRun),
        ]);

        let plan = result.materialization_plan().unwrap();
        let kinds: Vec<JunctionKind> = plan.junctions().iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![JunctionKind::SourceTap, JunctionKind::Coupling, JunctionKind::Elbow]
        );
        assert_eq!(plan.junctions()[1].point, b);

        // Doubling back is not a straight run.
        let back = pipe(b, a, SegmentPurpose::SourceRun);
        assert!(!pipe(a, b, SegmentPurpose::SourceRun).continues_straight(&back));
    }

    #[test]
    fn test_plan_refused_for_preview() {
        let result = RouteResult::new(ZoneId(9), SourceId(1), valve()).with_preview_only(true);
        assert_eq!(result.stage(), ZoneStage::Preview);
        let err = result.materialization_plan().unwrap_err();
        assert_eq!(err, RoutingError::PreviewOnly { zone: ZoneId(9) });
    }

    #[test]
    fn test_plan_requires_sizing() {
        let unsized_segment = Segment::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            SegmentPurpose::SourceRun,
            PipeSystem::Transport,
        );
        let result = RouteResult::new(ZoneId(1), SourceId(1), valve()).with_transport(vec![unsized_segment]);
        assert!(result.materialization_plan().is_err());
    }

    #[test]
    fn test_commit_once() {
        let plan = RouteResult::new(ZoneId(1), SourceId(1), valve())
            .with_transport(chain())
            .materialization_plan()
            .unwrap();
        let plan = plan.commit().unwrap();
        assert_eq!(plan.stage(), ZoneStage::Materialized);
        assert!(plan.commit().is_err());
    }

    #[test]
    fn test_dummy_connector_flag() {
        assert!(valve().has_dummy_connector());
        let mut physical = valve();
        physical.inlet = ConnectorPoint::physical(physical.inlet.position);
        physical.outlet = ConnectorPoint::physical(physical.outlet.position);
        assert!(!physical.has_dummy_connector());
    }
}
