//! Error infrastructure for sight-core.
//!
//! Out-of-bounds lookups are never errors (see [`GridSurface`](crate::GridSurface)).
//! What remains is a missing primary observer, unknown entity ids in queries,
//! and malformed configuration, each classified by [`ErrorSeverity`] so
//! callers can decide between retrying later and rejecting input.

use crate::config::ConfigError;
use crate::state::EntityId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// The caller can trigger again once world state changes.
    Recoverable,

    /// Invalid input that should be rejected without retry.
    Validation,

    /// The engine cannot run with this input at all.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Uniform classification for every error type in this crate.
pub trait ClassifiedError: std::fmt::Display + std::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for logs and tests.
    fn error_code(&self) -> &'static str;
}

/// Errors surfaced by [`SightManager`](crate::SightManager).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SightError {
    /// No entity flagged as primary observer. The recompute was skipped and
    /// the previous visibility state is still being served.
    #[error("no primary observer among the supplied entities")]
    MissingObserver,

    #[error("entity {0} not found")]
    UnknownEntity(EntityId),

    #[error("invalid sight configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl ClassifiedError for SightError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SightError::MissingObserver => ErrorSeverity::Recoverable,
            SightError::UnknownEntity(_) => ErrorSeverity::Validation,
            SightError::InvalidConfig(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SightError::MissingObserver => "SIGHT_MISSING_OBSERVER",
            SightError::UnknownEntity(_) => "SIGHT_UNKNOWN_ENTITY",
            SightError::InvalidConfig(_) => "SIGHT_INVALID_CONFIG",
        }
    }
}

impl ClassifiedError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::OutOfUnitRange { .. } => "CONFIG_OUT_OF_UNIT_RANGE",
            ConfigError::NonPositive { .. } => "CONFIG_NON_POSITIVE",
            ConfigError::DegradationBeyondRange { .. } => "CONFIG_DEGRADATION_BEYOND_RANGE",
            ConfigError::InvalidAngle { .. } => "CONFIG_INVALID_ANGLE",
            ConfigError::NoOcclusionLevels => "CONFIG_NO_OCCLUSION_LEVELS",
            ConfigError::MissChanceLength { .. } => "CONFIG_MISS_CHANCE_LENGTH",
            ConfigError::MissChanceOutOfRange { .. } => "CONFIG_MISS_CHANCE_OUT_OF_RANGE",
            ConfigError::NegativeRadius { .. } => "CONFIG_NEGATIVE_RADIUS",
            ConfigError::ShadowLengthInverted { .. } => "CONFIG_SHADOW_LENGTH_INVERTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(SightError::MissingObserver.severity().is_recoverable());
        assert_eq!(
            SightError::UnknownEntity(EntityId(4)).to_string(),
            "entity #4 not found"
        );
        let err = SightError::from(ConfigError::NoOcclusionLevels);
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.error_code(), "SIGHT_INVALID_CONFIG");
        assert_eq!(err.severity().as_str(), "fatal");
    }
}
