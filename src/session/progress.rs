/// Orchestrator states. Transitions only move forward; `Done` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Loading the document and resolving its timeline.
    ResolvingTimeline,
    /// Rasterizing and staging frames.
    Rendering,
    /// Streaming staged frames into the sink.
    Encoding,
    /// Releasing the staging area.
    Cleanup,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
}

impl PipelineState {
    /// `Done` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingTimeline => "resolving-timeline",
            Self::Rendering => "rendering",
            Self::Encoding => "encoding",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory progress callbacks. Called on the pipeline thread; keep them cheap.
pub trait ProgressObserver: Send {
    /// A new state was entered.
    fn on_state(&mut self, _state: PipelineState) {}

    /// `done` of `total` frames finished within `state` (`Rendering` or `Encoding`).
    fn on_frame(&mut self, _state: PipelineState, _done: u64, _total: u64) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Default observer: logs through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_state(&mut self, state: PipelineState) {
        tracing::info!(%state, "pipeline state");
    }

    fn on_frame(&mut self, state: PipelineState, done: u64, total: u64) {
        tracing::debug!(%state, done, total, "frame progress");
    }
}
