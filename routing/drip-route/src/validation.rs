//! Constraint checks and the preview-or-materialize decision.
//!
//! Zone-level checks report through the zone's [`Diagnostics`] sink and
//! return `false` when the route must be reduced to a preview. Pass-level
//! checks cover the user's pipe/system/valve selection and the inputs of a
//! whole generation pass.

use drip_types::{
    AnchorFallback, Diagnostic, DiagnosticKind, Diagnostics, PipeSystem, RoutingError, RoutingParameters, Segment, Severity,
    SourceLine, SystemSelection, ZoneDescriptor, ZoneId, ZoneStage,
};
use tracing::debug;

/// Checks routing constraints for one zone.
///
/// # Example
///
/// ```
/// use drip_route::validation::ConstraintValidator;
/// use drip_types::{Diagnostics, RoutingParameters, ZoneId};
///
/// let params = RoutingParameters::default().with_distribution_height(-0.3);
/// let validator = ConstraintValidator::new(&params, ZoneId(1));
/// let mut diagnostics = Diagnostics::new();
///
/// // Transport at -0.4 and distribution at -0.3 are only 0.1 apart.
/// assert!(!validator.check_height_separation(0.0, &mut diagnostics));
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConstraintValidator<'a> {
    params: &'a RoutingParameters,
    zone: ZoneId,
}

impl<'a> ConstraintValidator<'a> {
    /// Creates a validator for one zone.
    #[must_use]
    pub const fn new(params: &'a RoutingParameters, zone: ZoneId) -> Self {
        Self { params, zone }
    }

    /// Raises a warning that is reported once per pass.
    fn warn(&self, diagnostics: &mut Diagnostics, kind: DiagnosticKind, message: String) {
        diagnostics.push(Diagnostic::warning(kind, message).with_zone(self.zone));
    }

    fn warn_unique(&self, diagnostics: &mut Diagnostics, kind: DiagnosticKind, message: String) {
        diagnostics.push(Diagnostic::unique(kind, Severity::Warning, message).with_zone(self.zone));
    }

    /// Checks the vertical gaps between source tap, transport line and
    /// distribution line.
    ///
    /// A gap of zero is not reported here. Any other gap must fit a pipe of
    /// minimum length.
    pub fn check_height_separation(&self, source_height: f64, diagnostics: &mut Diagnostics) -> bool {
        let minimum = self.params.minimum_segment_length();
        let eps = self.params.tolerances().geometry_epsilon();
        let mut ok = true;

        let source_gap = (self.params.transport_height() - source_height).abs();
        if source_gap < minimum && source_gap > eps {
            self.warn(
                diagnostics,
                DiagnosticKind::HeightSeparationTooSmall,
                format!(
                    "Height between source pipe and transport pipe is too small ({source_gap:.3}); no pipes will be generated"
                ),
            );
            ok = false;
        }

        let level_gap = (self.params.transport_height() - self.params.distribution_height()).abs();
        if level_gap < minimum {
            self.warn(
                diagnostics,
                DiagnosticKind::HeightSeparationTooSmall,
                format!(
                    "Height between distribution pipe and transport pipe is too small; it needs to be at least {minimum:.3}"
                ),
            );
            ok = false;
        }
        ok
    }

    /// Checks every pipe against the minimum segment length.
    ///
    /// The valve body is not a pipe and is skipped.
    pub fn check_segment_lengths(&self, segments: &[Segment], diagnostics: &mut Diagnostics) -> bool {
        let minimum = self.params.minimum_segment_length();
        let mut ok = true;
        for segment in segments.iter().filter(|s| s.purpose().is_pipe()) {
            let length = segment.length();
            if length < minimum {
                debug!(zone = %self.zone, purpose = segment.purpose().label(), length, "pipe below minimum length");
                self.warn(
                    diagnostics,
                    DiagnosticKind::SegmentTooShort,
                    "Generated pipe segment is too short; the branch will not be generated".to_string(),
                );
                ok = false;
            }
        }
        ok
    }

    /// Checks how far an off-center transport line ended up from the zone
    /// center.
    pub fn check_centerline_offset(&self, distance_from_center: f64, diagnostics: &mut Diagnostics) -> bool {
        let clearance = self.params.clearance();
        let eps = self.params.tolerances().geometry_epsilon();
        if distance_from_center > eps && distance_from_center < clearance {
            self.warn_unique(
                diagnostics,
                DiagnosticKind::ObstacleClearanceViolation,
                format!(
                    "Transport line is too close to a column or other pipe ({distance_from_center:.3}); no pipes will be generated"
                ),
            );
            return false;
        }
        true
    }

    /// Records a failed centerline search as a warning.
    pub fn report_blocked_centerline(&self, error: &RoutingError, diagnostics: &mut Diagnostics) {
        self.warn_unique(
            diagnostics,
            DiagnosticKind::ObstacleClearanceViolation,
            format!("{error}; the preferred transport line is kept for preview"),
        );
    }

    /// Where a zone ends up once its geometry is built.
    #[must_use]
    pub fn decide(&self, diagnostics: &Diagnostics, preview_forced: bool) -> ZoneStage {
        if diagnostics.has_fatal() {
            ZoneStage::Aborted
        } else if preview_forced {
            ZoneStage::Preview
        } else {
            ZoneStage::GeometryBuilt
        }
    }
}

/// Checks that segments carry the diameter of their system.
#[must_use]
pub fn is_sized(segments: &[Segment], params: &RoutingParameters) -> bool {
    segments.iter().all(|s| {
        let expected = match s.system() {
            PipeSystem::Transport => params.transport_diameter(),
            PipeSystem::Distribution => params.distribution_diameter(),
        };
        s.diameter() == Some(expected)
    })
}

/// Checks the user's selection before anything is materialized.
///
/// Missing pipe or system types and classification mismatches are fatal
/// for the pass; a missing valve family only means stub connectors.
pub fn validate_selection(selection: &SystemSelection, sources: &[SourceLine], diagnostics: &mut Diagnostics) {
    let fatal = |message: String| Diagnostic::unique(DiagnosticKind::SystemSelection, Severity::Fatal, message);

    if selection.pipe_type().is_none() {
        diagnostics.push(fatal("No pipe type selected".to_string()));
    }
    if selection.transport_system().is_none() {
        diagnostics.push(fatal("No transport pipe system type selected".to_string()));
    }
    if selection.distribution_system().is_none() {
        diagnostics.push(fatal("No distribution pipe system type selected".to_string()));
    }
    if selection.valve_family().is_none() {
        diagnostics.push(Diagnostic::unique(
            DiagnosticKind::SystemSelection,
            Severity::Warning,
            "No valve family selected; dummy connections are created instead",
        ));
    }

    let (Some(transport), Some(distribution)) = (selection.transport_system(), selection.distribution_system())
    else {
        return;
    };
    if transport != distribution {
        diagnostics.push(fatal(
            "System classification cannot differ between transport and distribution".to_string(),
        ));
        return;
    }
    for source in sources {
        if let Some(class) = source.classification() {
            if class != transport {
                diagnostics.push(fatal(format!(
                    "Source pipe ({}) is of system classification {class}, but the selected system types are {transport}",
                    source.id()
                )));
            }
        }
    }
}

/// Checks that a pass has something to route.
///
/// Zones without columns only count as missing input when `fallback` is
/// [`AnchorFallback::Reject`].
pub fn validate_inputs(
    zones: &[ZoneDescriptor],
    sources: &[SourceLine],
    fallback: AnchorFallback,
    diagnostics: &mut Diagnostics,
) {
    if zones.is_empty() {
        diagnostics.push(Diagnostic::unique(
            DiagnosticKind::SystemSelection,
            Severity::Fatal,
            "No zones selected",
        ));
    }
    if fallback == AnchorFallback::Reject && zones.iter().all(|z| z.obstacle_points().is_empty()) {
        diagnostics.push(Diagnostic::unique(
            DiagnosticKind::SystemSelection,
            Severity::Fatal,
            "No columns found",
        ));
    }
    if sources.is_empty() {
        diagnostics.push(Diagnostic::unique(
            DiagnosticKind::SystemSelection,
            Severity::Fatal,
            "No source pipes selected",
        ));
    }
}
