//! Severity-classified findings raised while routing.
//!
//! Every recoverable problem the router meets is recorded as a
//! [`Diagnostic`] in a [`Diagnostics`] sink instead of failing the call.
//! Non-unique diagnostics are deduplicated by message text; unique ones are
//! always kept.
//!
//! # Example
//!
//! ```
//! use drip_types::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
//!
//! let mut sink = Diagnostics::new();
//! sink.push(Diagnostic::new(DiagnosticKind::SegmentTooShort, Severity::Warning, "too short"));
//! sink.push(Diagnostic::new(DiagnosticKind::SegmentTooShort, Severity::Warning, "too short"));
//!
//! assert_eq!(sink.len(), 1);
//! assert_eq!(sink.max_severity(), Some(Severity::Warning));
//! assert!(!sink.has_fatal());
//! ```

use std::fmt;

use hashbrown::HashSet;
use tracing::{error, info, warn};

use crate::zone::ZoneId;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Informational only.
    Info,
    /// Recovered locally; the route is usually reduced to a preview.
    Warning,
    /// Aborts the zone (or the pass) before any document change.
    Fatal,
}

impl Severity {
    /// Get a human-readable name for the severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Fatal => "Fatal",
        }
    }

    /// Returns `true` for [`Severity::Fatal`].
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// Zone boundary is degenerate or malformed.
    InvalidZoneGeometry,
    /// No obstacle point available for the valve.
    NoValveAnchor,
    /// Transport line too close to an obstacle or the valve.
    ObstacleClearanceViolation,
    /// A pipe would be shorter than the fittings need.
    SegmentTooShort,
    /// Two network levels are too close vertically.
    HeightSeparationTooSmall,
    /// A valve connector faces away from the transport line.
    ValveConnectorUnusable,
    /// Pass-wide pipe/system/valve selection problem.
    SystemSelection,
    /// The valve was anchored beside the zone center.
    ValveAnchorFallback,
}

impl DiagnosticKind {
    /// Get a human-readable name for the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidZoneGeometry => "Invalid Zone Geometry",
            Self::NoValveAnchor => "No Valve Anchor",
            Self::ObstacleClearanceViolation => "Obstacle Clearance",
            Self::SegmentTooShort => "Segment Too Short",
            Self::HeightSeparationTooSmall => "Height Separation",
            Self::ValveConnectorUnusable => "Valve Connector",
            Self::SystemSelection => "System Selection",
            Self::ValveAnchorFallback => "Valve Anchor Fallback",
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    kind: DiagnosticKind,
    severity: Severity,
    message: String,
    unique: bool,
    zone: Option<ZoneId>,
}

impl Diagnostic {
    /// Creates a non-unique diagnostic (deduplicated by message text).
    #[must_use]
    pub fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            unique: false,
            zone: None,
        }
    }

    /// Creates a unique diagnostic that is never deduplicated.
    #[must_use]
    pub fn unique(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            unique: true,
            ..Self::new(kind, severity, message)
        }
    }

    /// Shorthand for a non-unique warning.
    #[must_use]
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    /// Tags the diagnostic with the zone it was raised for.
    #[must_use]
    pub const fn with_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the diagnostic is never deduplicated.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the zone the diagnostic belongs to, if tagged.
    #[must_use]
    pub const fn zone(&self) -> Option<ZoneId> {
        self.zone
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.zone {
            Some(zone) => write!(f, "[{}] {}: {}", self.severity, zone, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Ordered, deduplicating collection of diagnostics.
///
/// Insertion order is preserved; [`Diagnostics::sorted`] lists by
/// descending severity, stable within a severity.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    seen: HashSet<String>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    ///
    /// Returns `false` if a non-unique diagnostic with the same message was
    /// already recorded and this one was dropped.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        if !diagnostic.unique && !self.seen.insert(diagnostic.message.clone()) {
            return false;
        }
        match diagnostic.severity {
            Severity::Info => info!(kind = diagnostic.kind.as_str(), "{}", diagnostic.message),
            Severity::Warning => warn!(kind = diagnostic.kind.as_str(), "{}", diagnostic.message),
            Severity::Fatal => error!(kind = diagnostic.kind.as_str(), "{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
        true
    }

    /// Moves every diagnostic of `other` into `self`, deduplicating.
    pub fn merge(&mut self, other: Self) {
        for diagnostic in other.entries {
            self.push(diagnostic);
        }
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Highest severity recorded, `None` when empty.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.entries.iter().map(Diagnostic::severity).max()
    }

    /// Returns `true` if a fatal diagnostic was recorded.
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.max_severity() == Some(Severity::Fatal)
    }

    /// Number of diagnostics with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    /// Number of diagnostics of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Diagnostics ordered by descending severity, stable within a severity.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut list: Vec<&Diagnostic> = self.entries.iter().collect();
        list.sort_by(|a, b| b.severity.cmp(&a.severity));
        list
    }

    /// Consumes the sink and returns the diagnostics in insertion order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// One-line summary, e.g. `"2 fatal, 1 warning, 0 info"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} fatal, {} warning, {} info",
            self.count(Severity::Fatal),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        let mut sink = Self::new();
        for diagnostic in iter {
            sink.push(diagnostic);
        }
        sink
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Fatal);
        assert_eq!(Severity::Fatal.as_str(), "Fatal");
    }

    #[test]
    fn test_non_unique_dedupes_by_message() {
        let mut sink = Diagnostics::new();
        assert!(sink.push(Diagnostic::warning(DiagnosticKind::SegmentTooShort, "short")));
        // Same text under another kind still counts as a duplicate.
        assert!(!sink.push(Diagnostic::warning(DiagnosticKind::HeightSeparationTooSmall, "short")));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_unique_never_dedupes() {
        let mut sink = Diagnostics::new();
        for _ in 0..3 {
            sink.push(Diagnostic::unique(
                DiagnosticKind::ValveConnectorUnusable,
                Severity::Warning,
                "connector faces away",
            ));
        }
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.count_kind(DiagnosticKind::ValveConnectorUnusable), 3);
    }

    #[test]
    fn test_sorted_is_stable_by_descending_severity() {
        let sink: Diagnostics = [
            Diagnostic::new(DiagnosticKind::ValveAnchorFallback, Severity::Info, "a"),
            Diagnostic::warning(DiagnosticKind::SegmentTooShort, "b"),
            Diagnostic::new(DiagnosticKind::NoValveAnchor, Severity::Fatal, "c"),
            Diagnostic::warning(DiagnosticKind::SegmentTooShort, "d"),
        ]
        .into_iter()
        .collect();

        let order: Vec<&str> = sink.sorted().iter().map(|d| d.message()).collect();
        assert_eq!(order, ["c", "b", "d", "a"]);
        assert!(sink.has_fatal());
        assert_eq!(sink.summary(), "1 fatal, 2 warning, 1 info");
    }

    #[test]
    fn test_merge_dedupes_across_sinks() {
        let mut pass = Diagnostics::new();
        pass.push(Diagnostic::warning(DiagnosticKind::SegmentTooShort, "short"));

        let mut zone = Diagnostics::new();
        zone.push(Diagnostic::warning(DiagnosticKind::SegmentTooShort, "short"));
        zone.push(Diagnostic::warning(DiagnosticKind::ObstacleClearanceViolation, "close"));

        pass.merge(zone);
        assert_eq!(pass.len(), 2);
    }

    #[test]
    fn test_display_with_zone() {
        let d = Diagnostic::warning(DiagnosticKind::SegmentTooShort, "pipe too short").with_zone(ZoneId(5));
        assert_eq!(d.to_string(), "[Warning] zone #5: pipe too short");
        assert_eq!(d.zone(), Some(ZoneId(5)));
    }

    #[test]
    fn test_empty_sink() {
        let sink = Diagnostics::new();
        assert!(sink.is_empty());
        assert_eq!(sink.max_severity(), None);
        assert!(!sink.has_fatal());
    }
}
