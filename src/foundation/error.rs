/// Crate-wide result type.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Failure taxonomy for one conversion run. Every variant is terminal for the run.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// Animation file missing, unreadable or not JSON.
    #[error("missing source: {0}")]
    MissingSource(String),

    /// Timeline header is unusable (e.g. out-point before in-point).
    #[error("invalid timeline: {0}")]
    InvalidTimeline(String),

    /// Rendering environment did not answer within the bounded wait.
    #[error("render timeout: {0}")]
    RenderTimeout(String),

    /// Still could not be produced or decoded into pixels.
    #[error("rasterize failure: {0}")]
    RasterizeFailure(String),

    /// A frame index was staged twice.
    #[error("duplicate frame: {0}")]
    DuplicateFrame(String),

    /// Frame or stream the encoder cannot represent.
    #[error("encode failure: {0}")]
    EncodeFailure(String),

    /// Destination rejected bytes.
    #[error("sink write error: {0}")]
    SinkWriteError(String),

    /// Staging area could not be created, written or read.
    #[error("staging error: {0}")]
    Staging(String),

    /// Run stopped by its cancel token.
    #[error("conversion cancelled")]
    Cancelled,

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConvertError {
    /// Build [`ConvertError::MissingSource`].
    pub fn missing_source(msg: impl Into<String>) -> Self {
        Self::MissingSource(msg.into())
    }

    /// Build [`ConvertError::InvalidTimeline`].
    pub fn invalid_timeline(msg: impl Into<String>) -> Self {
        Self::InvalidTimeline(msg.into())
    }

    /// Build [`ConvertError::RenderTimeout`].
    pub fn render_timeout(msg: impl Into<String>) -> Self {
        Self::RenderTimeout(msg.into())
    }

    /// Build [`ConvertError::RasterizeFailure`].
    pub fn rasterize(msg: impl Into<String>) -> Self {
        Self::RasterizeFailure(msg.into())
    }

    /// Build [`ConvertError::DuplicateFrame`].
    pub fn duplicate_frame(msg: impl Into<String>) -> Self {
        Self::DuplicateFrame(msg.into())
    }

    /// Build [`ConvertError::EncodeFailure`].
    pub fn encode_failure(msg: impl Into<String>) -> Self {
        Self::EncodeFailure(msg.into())
    }

    /// Build [`ConvertError::SinkWriteError`].
    pub fn sink_write(msg: impl Into<String>) -> Self {
        Self::SinkWriteError(msg.into())
    }

    /// Build [`ConvertError::Staging`].
    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSource(_) => "MissingSource",
            Self::InvalidTimeline(_) => "InvalidTimeline",
            Self::RenderTimeout(_) => "RenderTimeout",
            Self::RasterizeFailure(_) => "RasterizeFailure",
            Self::DuplicateFrame(_) => "DuplicateFrame",
            Self::EncodeFailure(_) => "EncodeFailure",
            Self::SinkWriteError(_) => "SinkWriteError",
            Self::Staging(_) => "Staging",
            Self::Cancelled => "Cancelled",
            Self::Other(_) => "Other",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
