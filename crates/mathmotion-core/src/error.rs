/// Core error types for the mathmotion engine.
use crate::types::ObjectId;

/// A specialized Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error type for tree, animation, matching and timeline failures.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("cycle: {child} is {parent} or one of its ancestors")]
    Cycle { parent: ObjectId, child: ObjectId },

    #[error("{child} already belongs to {parent}")]
    AlreadyParented { parent: ObjectId, child: ObjectId },

    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("incompatible shape: {0}")]
    IncompatibleShape(String),

    #[error("unresolved match for key {key:?} in {side} text")]
    UnresolvedMatch { key: String, side: MatchSide },

    #[error("beat {beat} failed: {source}")]
    TimelineFailed {
        beat: usize,
        #[source]
        source: Box<SceneError>,
    },

    #[error("timeline is failed at beat {beat}; reset it before playing again")]
    TimelineNotIdle { beat: usize },

    #[error("scene aborted before beat {beat}")]
    Aborted { beat: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("tree invariant violated: {0}")]
    Invariant(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which side of a string match an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSide {
    Source,
    Target,
}

impl std::fmt::Display for MatchSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSide::Source => write!(f, "source"),
            MatchSide::Target => write!(f, "target"),
        }
    }
}

impl SceneError {
    /// Create an incompatible-shape error.
    pub fn incompatible(message: impl Into<String>) -> Self {
        SceneError::IncompatibleShape(message.into())
    }

    /// Create an unresolved-match error.
    pub fn unresolved(key: impl Into<String>, side: MatchSide) -> Self {
        SceneError::UnresolvedMatch {
            key: key.into(),
            side,
        }
    }

    /// Wrap an error raised while evaluating beat `beat`.
    pub fn in_beat(beat: usize, source: SceneError) -> Self {
        SceneError::TimelineFailed {
            beat,
            source: Box::new(source),
        }
    }

    /// Index of the beat this error is attributed to, if any.
    pub fn beat(&self) -> Option<usize> {
        match self {
            SceneError::TimelineFailed { beat, .. }
            | SceneError::TimelineNotIdle { beat }
            | SceneError::Aborted { beat } => Some(*beat),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_display() {
        let err = SceneError::unresolved("B^2", MatchSide::Target);
        assert_eq!(err.to_string(), "unresolved match for key \"B^2\" in target text");
    }

    #[test]
    fn test_timeline_failed_carries_beat() {
        let err = SceneError::in_beat(4, SceneError::incompatible("3 points vs 5 points"));
        assert_eq!(err.beat(), Some(4));
        assert!(err.to_string().starts_with("beat 4 failed: incompatible shape"));
        assert_eq!(SceneError::InvalidArgument("x".into()).beat(), None);
    }
}
