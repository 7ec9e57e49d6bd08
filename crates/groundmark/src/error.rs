use groundmark_core::FrameError;

/// Reasons a frame yields no pose.
///
/// Every variant flattens to [`crate::Pose::UNKNOWN_SENTINEL`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalizeError {
    #[error("unknown device id {0}")]
    UnknownDevice(u8),

    #[error(transparent)]
    InvalidFrame(#[from] FrameError),

    #[error("too few corners detected ({found}, need 2)")]
    TooFewCorners { found: usize },

    #[error("no identified corner pair of different colors")]
    NoYawSamples,

    #[error("too few identified corners ({found}, need 2)")]
    TooFewIdentified { found: usize },

    #[error("no corner pair far enough apart to estimate the height")]
    NoHeightSamples,
}
