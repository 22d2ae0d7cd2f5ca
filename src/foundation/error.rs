/// Convenience result type used across framestrip.
pub type FramestripResult<T> = Result<T, FramestripError>;

/// Error taxonomy for sampling, compositing and merging.
///
/// Every variant is fatal to the run that produced it; nothing is retried and no partial
/// sequence is published.
#[derive(thiserror::Error, Debug)]
pub enum FramestripError {
    /// Source metadata could not be loaded (or reported an unusable duration).
    #[error("decode error: {0}")]
    Decode(String),

    /// A requested timestamp could not be resolved to a renderable frame.
    #[error("seek error: {0}")]
    Seek(String),

    /// Merge inputs were unusable (for example an empty sequence).
    #[error("merge error: {0}")]
    Merge(String),

    /// A raster surface could not be encoded to image bytes.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid user-provided settings or a source outside the accepted limits.
    #[error("validation error: {0}")]
    Validation(String),

    /// Sampling was cancelled at a frame boundary.
    #[error("cancelled before frame {next_index}")]
    Cancelled {
        /// 1-based index of the frame that was not started.
        next_index: u32,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramestripError {
    /// Build a [`FramestripError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FramestripError::Seek`] value.
    pub fn seek(msg: impl Into<String>) -> Self {
        Self::Seek(msg.into())
    }

    /// Build a [`FramestripError::Merge`] value.
    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge(msg.into())
    }

    /// Build a [`FramestripError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`FramestripError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
