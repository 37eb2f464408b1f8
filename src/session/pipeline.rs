use std::path::{Path, PathBuf};

use crate::encode::{EncodedStream, FrameSink, GifSink, GifSinkOpts, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ConvertError, ConvertResult};
use crate::render::{FrameRasterizer, RenderEnvironment, RenderHandle, SceneEnvironment};
use crate::session::cancel::CancelToken;
use crate::session::options::ConvertOptions;
use crate::session::progress::{PipelineState, ProgressObserver, TracingProgress};
use crate::stage::FrameStore;
use crate::timeline::{Animation, AnimationDescriptor, load_animation};

/// Builds a fresh rendering environment for each run.
pub type EnvironmentFactory = Box<dyn Fn() -> Box<dyn RenderEnvironment> + Send + Sync>;

/// A failed run: the stage that failed and the unchanged originating error.
#[derive(thiserror::Error, Debug)]
#[error("{stage} failed")]
pub struct PipelineFailure {
    /// Stage that was running.
    pub stage: PipelineState,
    /// Originating error, unchanged.
    #[source]
    pub source: ConvertError,
}

/// Outcome of a successful run.
#[derive(Clone, Debug)]
pub struct ConversionReport {
    /// Resolved timeline.
    pub descriptor: AnimationDescriptor,
    /// Encoded output summary.
    pub stream: EncodedStream,
    /// Every state entered, in order, starting at `Idle`.
    pub states: Vec<PipelineState>,
}

impl ConversionReport {
    /// Written file, for file-backed runs.
    pub fn output_path(&self) -> Option<&Path> {
        self.stream.path.as_deref()
    }
}

/// Drives one animation through resolve, render, stage, encode and cleanup.
///
/// Frames are processed strictly one at a time. The staging area is released on every exit
/// path and a failed or cancelled run never leaves a file at the destination.
pub struct Converter {
    options: ConvertOptions,
    environment: EnvironmentFactory,
    observer: Box<dyn ProgressObserver>,
    cancel: CancelToken,
}

impl Converter {
    /// Converter using the built-in scene environment and `tracing` progress.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            environment: Box::new(|| -> Box<dyn RenderEnvironment> {
                Box::new(SceneEnvironment::new())
            }),
            observer: Box::new(TracingProgress),
            cancel: CancelToken::new(),
        }
    }

    /// Use environments built by `make` instead of the built-in scene environment.
    pub fn with_environment<E, F>(mut self, make: F) -> Self
    where
        E: RenderEnvironment + 'static,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.environment = Box::new(move || -> Box<dyn RenderEnvironment> { Box::new(make()) });
        self
    }

    /// Report progress to `observer`.
    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Cancel runs through `cancel`.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Settings in use.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Token that cancels runs of this converter.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Convert the animation file at `input` into a looping GIF at `output`.
    #[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    pub fn run(&mut self, input: &Path, output: &Path) -> Result<ConversionReport, PipelineFailure> {
        let mut sink = GifSink::new(GifSinkOpts {
            out_path: PathBuf::from(output),
            quantize: self.options.quantize(),
        });
        let mut run = Run::new(self.observer.as_mut());
        run.enter(PipelineState::ResolvingTimeline);
        let animation = match self
            .options
            .validate()
            .and_then(|()| load_animation(input))
        {
            Ok(a) => a,
            Err(e) => return Err(run.fail(PipelineState::ResolvingTimeline, e)),
        };
        let res = Self::execute(
            &self.options,
            &self.environment,
            &self.cancel,
            &mut run,
            animation,
            &mut sink,
        );
        if res.is_err() {
            sink.abort();
        }
        res
    }

    /// Run an already loaded animation into an arbitrary sink.
    pub fn run_animation(
        &mut self,
        animation: Animation,
        sink: &mut dyn FrameSink,
    ) -> Result<ConversionReport, PipelineFailure> {
        let mut run = Run::new(self.observer.as_mut());
        run.enter(PipelineState::ResolvingTimeline);
        if let Err(e) = self.options.validate() {
            return Err(run.fail(PipelineState::ResolvingTimeline, e));
        }
        Self::execute(
            &self.options,
            &self.environment,
            &self.cancel,
            &mut run,
            animation,
            sink,
        )
    }

    fn execute(
        options: &ConvertOptions,
        environment: &EnvironmentFactory,
        cancel: &CancelToken,
        run: &mut Run<'_>,
        animation: Animation,
        sink: &mut dyn FrameSink,
    ) -> Result<ConversionReport, PipelineFailure> {
        let descriptor = animation.descriptor;
        tracing::info!(
            width = descriptor.width(),
            height = descriptor.height(),
            frames = descriptor.total_frames,
            fps = descriptor.frame_rate,
            "timeline resolved"
        );

        let sink_cfg = SinkConfig {
            canvas: descriptor.canvas,
            fps: descriptor.frame_rate,
        };
        if let Err(e) = sink.preflight(&sink_cfg) {
            return Err(run.fail(PipelineState::ResolvingTimeline, e));
        }

        run.enter(PipelineState::Rendering);
        let store = match &options.staging_root {
            Some(root) => FrameStore::create_in(root, descriptor.total_frames),
            None => FrameStore::create(descriptor.total_frames),
        };
        let mut store = match store {
            Ok(s) => s,
            Err(e) => {
                run.enter(PipelineState::Cleanup);
                return Err(run.fail(PipelineState::Rendering, e));
            }
        };

        let result = render_all(options, environment, cancel, run, &animation, &mut store)
            .and_then(|()| encode_all(cancel, run, &descriptor, &store, sink));

        run.enter(PipelineState::Cleanup);
        let released = store.release_all();

        match (result, released) {
            (Ok(stream), Ok(())) => {
                run.enter(PipelineState::Done);
                Ok(ConversionReport {
                    descriptor,
                    stream,
                    states: std::mem::take(&mut run.states),
                })
            }
            (Ok(_), Err(e)) => Err(run.fail(PipelineState::Cleanup, e)),
            (Err((stage, e)), released) => {
                if let Err(cleanup) = released {
                    tracing::warn!(error = %cleanup, "staging cleanup failed after error");
                }
                Err(run.fail(stage, e))
            }
        }
    }
}

type StageResult<T> = Result<T, (PipelineState, ConvertError)>;

fn at<T>(stage: PipelineState, res: ConvertResult<T>) -> StageResult<T> {
    res.map_err(|e| (stage, e))
}

fn check_cancel(cancel: &CancelToken, stage: PipelineState) -> StageResult<()> {
    if cancel.is_cancelled() {
        tracing::info!(%stage, "cancellation requested");
        return Err((stage, ConvertError::Cancelled));
    }
    Ok(())
}

fn render_all(
    options: &ConvertOptions,
    environment: &EnvironmentFactory,
    cancel: &CancelToken,
    run: &mut Run<'_>,
    animation: &Animation,
    store: &mut FrameStore,
) -> StageResult<()> {
    const STAGE: PipelineState = PipelineState::Rendering;
    let descriptor = &animation.descriptor;

    check_cancel(cancel, STAGE)?;
    let mut handle = at(
        STAGE,
        RenderHandle::spawn_loaded((environment)(), animation, options.render_timeout()),
    )?;
    let mut raster = at(
        STAGE,
        FrameRasterizer::new(descriptor.canvas, &options.raster()),
    )?;

    let total = descriptor.total_frames;
    for index in descriptor.frames() {
        check_cancel(cancel, STAGE)?;
        let frame = at(STAGE, raster.rasterize(descriptor, index, &mut handle))?;
        at(STAGE, store.stage(&frame))?;
        run.frame(STAGE, index.0 + 1, total);
    }
    Ok(())
}

fn encode_all(
    cancel: &CancelToken,
    run: &mut Run<'_>,
    descriptor: &AnimationDescriptor,
    store: &FrameStore,
    sink: &mut dyn FrameSink,
) -> StageResult<EncodedStream> {
    const STAGE: PipelineState = PipelineState::Encoding;
    run.enter(STAGE);

    at(
        STAGE,
        sink.begin(SinkConfig {
            canvas: descriptor.canvas,
            fps: descriptor.frame_rate,
        }),
    )?;

    let staged = store.list_ordered();
    let total = staged.len() as u64;
    if total != descriptor.total_frames {
        return Err((
            STAGE,
            ConvertError::encode_failure(format!(
                "{total} frames staged, timeline has {}",
                descriptor.total_frames
            )),
        ));
    }
    for (n, entry) in staged.iter().enumerate() {
        check_cancel(cancel, STAGE)?;
        let expected = FrameIndex(n as u64);
        if entry.index != expected {
            return Err((
                STAGE,
                ConvertError::encode_failure(format!(
                    "staged frame {} found where frame {expected} belongs",
                    entry.index
                )),
            ));
        }
        let frame = at(STAGE, entry.load())?;
        at(STAGE, sink.push_frame(&frame))?;
        run.frame(STAGE, n as u64 + 1, total);
    }

    check_cancel(cancel, STAGE)?;
    at(STAGE, sink.end())
}

/// State bookkeeping for one run.
struct Run<'a> {
    observer: &'a mut dyn ProgressObserver,
    states: Vec<PipelineState>,
}

impl<'a> Run<'a> {
    fn new(observer: &'a mut dyn ProgressObserver) -> Self {
        let mut run = Self {
            observer,
            states: Vec::new(),
        };
        run.enter(PipelineState::Idle);
        run
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!(%state, "enter");
        self.states.push(state);
        self.observer.on_state(state);
    }

    fn frame(&mut self, state: PipelineState, done: u64, total: u64) {
        self.observer.on_frame(state, done, total);
    }

    fn fail(&mut self, stage: PipelineState, source: ConvertError) -> PipelineFailure {
        tracing::error!(%stage, kind = source.kind(), error = %source, "conversion failed");
        self.enter(PipelineState::Failed);
        PipelineFailure { stage, source }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/pipeline.rs"]
mod tests;
