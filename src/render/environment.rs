use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::foundation::error::{ConvertError, ConvertResult};
use crate::timeline::Animation;

/// Capability interface over whatever interprets the vector animation.
///
/// An environment is stateful and single-writer: `seek` moves its playhead and `extract_svg`
/// serializes the still at the playhead. Implementations must not blend between seeks.
pub trait RenderEnvironment: Send {
    /// Load animation content sized to `animation.descriptor.canvas`.
    fn load(&mut self, animation: &Animation) -> ConvertResult<()>;
    /// Move the playhead to animation-time frame `frame` and stop there.
    fn seek(&mut self, frame: f64) -> ConvertResult<()>;
    /// Serialize the current still as standalone SVG markup.
    fn extract_svg(&mut self) -> ConvertResult<String>;
}

impl<E: RenderEnvironment + ?Sized> RenderEnvironment for Box<E> {
    fn load(&mut self, animation: &Animation) -> ConvertResult<()> {
        (**self).load(animation)
    }

    fn seek(&mut self, frame: f64) -> ConvertResult<()> {
        (**self).seek(frame)
    }

    fn extract_svg(&mut self) -> ConvertResult<String> {
        (**self).extract_svg()
    }
}

enum Request {
    Load(Animation),
    Still(f64),
}

enum Reply {
    Loaded,
    Still(String),
}

/// Live handle to a rendering environment running on its own worker thread.
///
/// Every call waits at most `timeout` for the environment to answer. A call that times out
/// yields [`ConvertError::RenderTimeout`] and poisons the handle: the worker may still be busy,
/// so later replies could no longer be matched to their requests.
pub struct RenderHandle {
    requests: Option<mpsc::Sender<Request>>,
    replies: mpsc::Receiver<ConvertResult<Reply>>,
    timeout: Duration,
    poisoned: bool,
    worker: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// Move `env` onto a dedicated worker thread.
    pub fn spawn<E>(env: E, timeout: Duration) -> ConvertResult<Self>
    where
        E: RenderEnvironment + 'static,
    {
        if timeout.is_zero() {
            return Err(ConvertError::Other(anyhow::anyhow!(
                "render timeout must be non-zero"
            )));
        }

        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (reply_tx, reply_rx) = mpsc::channel::<ConvertResult<Reply>>();

        let worker = std::thread::Builder::new()
            .name("lottiegif-render".to_string())
            .spawn(move || {
                let mut env = env;
                for req in req_rx {
                    let reply = match req {
                        Request::Load(animation) => env.load(&animation).map(|()| Reply::Loaded),
                        Request::Still(frame) => env
                            .seek(frame)
                            .and_then(|()| env.extract_svg())
                            .map(Reply::Still),
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| {
                ConvertError::Other(anyhow::anyhow!("failed to spawn render worker: {e}"))
            })?;

        Ok(Self {
            requests: Some(req_tx),
            replies: reply_rx,
            timeout,
            poisoned: false,
            worker: Some(worker),
        })
    }

    /// Spawn the worker and load `animation` into it.
    pub fn spawn_loaded<E>(env: E, animation: &Animation, timeout: Duration) -> ConvertResult<Self>
    where
        E: RenderEnvironment + 'static,
    {
        let mut handle = Self::spawn(env, timeout)?;
        handle.load(animation)?;
        Ok(handle)
    }

    /// Bounded wait applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True once a call has timed out.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Load `animation` into the environment.
    pub fn load(&mut self, animation: &Animation) -> ConvertResult<()> {
        match self.call(Request::Load(animation.clone()), "load")? {
            Reply::Loaded => Ok(()),
            Reply::Still(_) => Err(ConvertError::rasterize(
                "render worker answered load with a still",
            )),
        }
    }

    /// Seek to `frame` and extract the still there as SVG markup.
    pub fn still_at(&mut self, frame: f64) -> ConvertResult<String> {
        match self.call(Request::Still(frame), "seek/extract")? {
            Reply::Still(svg) => Ok(svg),
            Reply::Loaded => Err(ConvertError::rasterize(
                "render worker answered seek with a load acknowledgement",
            )),
        }
    }

    fn call(&mut self, req: Request, what: &str) -> ConvertResult<Reply> {
        if self.poisoned {
            return Err(ConvertError::render_timeout(format!(
                "{what}: rendering environment is unresponsive after an earlier timeout"
            )));
        }
        let Some(requests) = self.requests.as_ref() else {
            return Err(ConvertError::rasterize("rendering environment is shut down"));
        };
        if requests.send(req).is_err() {
            return Err(ConvertError::rasterize(format!(
                "{what}: rendering environment stopped"
            )));
        }
        match self.replies.recv_timeout(self.timeout) {
            Ok(reply) => reply,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.poisoned = true;
                Err(ConvertError::render_timeout(format!(
                    "{what} did not complete within {} ms",
                    self.timeout.as_millis()
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ConvertError::rasterize(format!(
                "{what}: rendering environment stopped"
            ))),
        }
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        drop(self.requests.take());
        // A hung worker is detached rather than joined.
        if !self.poisoned
            && let Some(worker) = self.worker.take()
        {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/environment.rs"]
mod tests;
