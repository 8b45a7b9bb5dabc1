/// Result alias that carries the custom [`FuelMixError`] type.
pub type Result<T> = std::result::Result<T, FuelMixError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum FuelMixError {
    /// Free-form message, mostly used by the command line driver.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed configuration or manifest JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// No periods were handed to the sequencer.
    #[error("no periods supplied; an animation needs at least one period")]
    EmptyInput,
    /// Every pause and transition rounds to zero frames.
    #[error("{periods} period(s) at {fps} fps produce no frames; every pause and transition rounds to zero")]
    EmptySequence { periods: usize, fps: f64 },
    /// A timing parameter is out of range.
    #[error("invalid {parameter}: {reason}")]
    InvalidTiming {
        parameter: &'static str,
        reason: String,
    },
    /// A snapshot does not expose the canonical column set.
    #[error(
        "snapshot `{label}` does not match the canonical columns (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .extra.join(", ")
    )]
    ColumnMismatch {
        label: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },
    /// Two snapshots cannot be blended pointwise.
    #[error("shape mismatch between `{left}` and `{right}`: {detail}")]
    ShapeMismatch {
        left: String,
        right: String,
        detail: String,
    },
    /// A snapshot failed construction-time validation.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl FuelMixError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn timing(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTiming {
            parameter,
            reason: reason.into(),
        }
    }
}
