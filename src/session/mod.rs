//! Pipeline Orchestrator: sequences resolve, render, stage, encode and cleanup for one run.

/// Cooperative cancellation flag shared with the caller.
pub mod cancel;
/// Conversion settings.
pub mod options;
/// The conversion state machine.
pub mod pipeline;
/// Progress reporting.
pub mod progress;

pub use cancel::CancelToken;
pub use options::ConvertOptions;
pub use pipeline::{ConversionReport, Converter, EnvironmentFactory, PipelineFailure};
pub use progress::{NoProgress, PipelineState, ProgressObserver, TracingProgress};
