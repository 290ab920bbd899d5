//! Error types of the partition fast-decision subsystem
//!
//! Classifier and cache errors are recovered locally by falling back to
//! the unpruned candidate list; only invariant violations are fatal to the
//! encode.

use thiserror::Error;

use crate::area::CuArea;

/// Errors raised by the partition controller and its collaborators
#[derive(Error, Debug)]
pub enum PartitionError {
    /// CU exits the picture bounds; the classifier is skipped and the
    /// normal RD enumeration is unchanged
    #[error("coding unit {area} exceeds picture bounds {pic_width}x{pic_height}")]
    InsufficientArea {
        area: CuArea,
        pic_width: u32,
        pic_height: u32,
    },

    /// Zero denominator in a ratio feature; the classifier is skipped at
    /// the affected branch
    #[error("zero denominator in split feature '{feature}'")]
    SingularFeatures {
        /// Name of the feature whose denominator vanished
        feature: &'static str,
    },

    /// No classifier trained for this CU shape
    #[error("no trained classifier for {width}x{height}")]
    UntrainedShape { width: u32, height: u32 },

    /// Cached best encoding does not apply to the current geometry
    #[error("cached result not applicable at {area}: {reason}")]
    ReuseNotApplicable { area: CuArea, reason: String },

    /// Stack imbalance or other broken controller invariant; fatal
    #[error("partition invariant violated: {message}")]
    InvariantViolation { message: String },
}

impl PartitionError {
    pub fn insufficient_area(area: CuArea, pic_width: u32, pic_height: u32) -> Self {
        Self::InsufficientArea {
            area,
            pic_width,
            pic_height,
        }
    }

    pub fn singular(feature: &'static str) -> Self {
        Self::SingularFeatures { feature }
    }

    pub fn untrained(width: u32, height: u32) -> Self {
        Self::UntrainedShape { width, height }
    }

    pub fn reuse_not_applicable(area: CuArea, reason: impl Into<String>) -> Self {
        Self::ReuseNotApplicable {
            area,
            reason: reason.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Whether the error must abort the encode
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

/// Result type alias for partition operations
pub type Result<T> = std::result::Result<T, PartitionError>;
