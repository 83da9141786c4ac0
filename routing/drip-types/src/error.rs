//! Error types for routing operations.
//!
//! [`RoutingError`] covers the failures that abort a zone (or a whole
//! generation pass). Recoverable findings are not errors; they travel as
//! [`Diagnostic`](crate::Diagnostic)s inside the route result.

use crate::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::route::ZoneStage;
use crate::zone::ZoneId;

/// Errors that can occur during routing operations.
///
/// # Example
///
/// ```
/// use drip_types::{RoutingError, ZoneId};
///
/// let error = RoutingError::NoValveAnchor { zone: ZoneId(4) };
/// assert!(error.to_string().contains("no valve anchor"));
/// assert!(error.to_diagnostic().severity().is_fatal());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum RoutingError {
    /// The zone or source line handed in cannot be routed.
    ///
    /// Raised for empty boundaries, non-finite coordinates and degenerate
    /// source lines.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An invalid configuration parameter was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The zone contains no obstacle point to anchor the valve on.
    #[error("no valve anchor found for {zone}")]
    NoValveAnchor {
        /// The zone that was aborted.
        zone: ZoneId,
    },

    /// The centerline search ran out of displacements.
    #[error("no clear transport line after {iterations} displacements")]
    NoClearLine {
        /// Displacements attempted before giving up.
        iterations: usize,
    },

    /// A preview-only result was asked to materialize.
    #[error("route for {zone} is preview only and cannot be materialized")]
    PreviewOnly {
        /// The zone whose route was refused.
        zone: ZoneId,
    },

    /// A zone stage transition that the state machine does not allow.
    #[error("invalid stage transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current stage.
        from: ZoneStage,
        /// Requested stage.
        to: ZoneStage,
    },
}

impl RoutingError {
    /// Creates an invalid input error with the given message.
    ///
    /// # Example
    ///
    /// ```
    /// use drip_types::RoutingError;
    ///
    /// let error = RoutingError::invalid_input("zone boundary is empty");
    /// assert!(error.to_string().contains("boundary"));
    /// ```
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an invalid configuration error with the given message.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns `true` if this is a "no valve anchor" error.
    #[must_use]
    pub const fn is_no_valve_anchor(&self) -> bool {
        matches!(self, Self::NoValveAnchor { .. })
    }

    /// Returns `true` if this is a search exhaustion error.
    #[must_use]
    pub const fn is_no_clear_line(&self) -> bool {
        matches!(self, Self::NoClearLine { .. })
    }

    /// Returns `true` if the error stops the whole generation pass rather
    /// than a single zone.
    ///
    /// Only configuration errors do; everything else is zone-local.
    #[must_use]
    pub const fn is_fatal_for_pass(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }

    /// Diagnostic kind this error is reported under.
    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        match self {
            Self::InvalidInput(_) => DiagnosticKind::InvalidZoneGeometry,
            Self::InvalidConfig(_) | Self::InvalidTransition { .. } | Self::PreviewOnly { .. } => {
                DiagnosticKind::SystemSelection
            }
            Self::NoValveAnchor { .. } => DiagnosticKind::NoValveAnchor,
            Self::NoClearLine { .. } => DiagnosticKind::ObstacleClearanceViolation,
        }
    }

    /// Converts the error into a unique fatal diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::unique(self.kind(), Severity::Fatal, self.to_string())
    }
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
