use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::animation::driver::{AnimationDriver, RunState, Tick};
use crate::capture::export::ExportSink;
use crate::capture::media::{CaptureStream, MediaBackend};
use crate::capture::session::{CaptureSession, StopOutcome};
use crate::foundation::core::{Fps, Millis};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::FrameStyle;
use crate::render::surface::Presentation;
use crate::segment::segment;
use crate::session::pacing::FramePacer;
use crate::source::TextSource;

/// Options for one run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunOpts {
    /// Capture stream frame rate.
    pub fps: Fps,
    /// Frame style.
    pub style: FrameStyle,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            style: FrameStyle::default(),
        }
    }
}

/// Host collaborators a run borrows for its lifetime.
pub struct RunHost {
    /// Where frames are drawn.
    pub presentation: Box<dyn Presentation>,
    /// Media subsystem used to open the recorder.
    pub media: Box<dyn MediaBackend>,
    /// Destination of the finished recording.
    pub exporter: Box<dyn ExportSink>,
    /// Frame scheduling.
    pub pacer: Box<dyn FramePacer>,
}

/// Cross-thread cancellation flag, observed at the top of the next frame.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every unit was shown.
    NaturalEnd,
    /// The user stopped the run.
    Cancelled,
    /// An unrecoverable error stopped the run.
    Failed,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RunReport {
    /// Units in the sequence.
    pub sentences: usize,
    /// Units that fully faded out.
    pub sentences_completed: usize,
    /// Frames drawn.
    pub frames_rendered: u64,
    /// Frames written to the recording.
    pub frames_captured: u64,
    /// Encoded chunks accumulated.
    pub chunks: usize,
    /// Mime type of the recording.
    pub mime_type: String,
    /// How the run ended; `None` while it is still running.
    pub end: Option<EndReason>,
    /// Exported file name, if anything was exported.
    pub exported: Option<String>,
}

/// Owns one run: driver, capture session and presentation, and the single shutdown path all
/// triggers go through.
pub struct RunController {
    driver: AnimationDriver,
    capture: CaptureSession,
    presentation: Box<dyn Presentation>,
    exporter: Box<dyn ExportSink>,
    pacer: Box<dyn FramePacer>,
    end: Option<EndReason>,
    shut_down: bool,
    stop_outcome: Option<StopOutcome>,
    stop_error: Option<ReelError>,
}

impl RunController {
    /// Prepare and start a run.
    ///
    /// Recording is started before the presentation is shown, so an unsupported format or a
    /// recorder that cannot be opened aborts the run with nothing on screen. The first frame is
    /// scheduled on success.
    #[tracing::instrument(skip_all, fields(fps = opts.fps.as_f64()))]
    pub fn start(source: &dyn TextSource, host: RunHost, opts: RunOpts) -> ReelResult<Self> {
        Fps::new(opts.fps.num, opts.fps.den)?;
        opts.style.validate()?;
        let RunHost {
            mut presentation,
            mut media,
            exporter,
            pacer,
        } = host;

        let text = source.extract_visible_text()?;
        let sentences = segment(&text);

        let stream = CaptureStream {
            size: presentation.surface_mut().size(),
            fps: opts.fps,
        };
        let capture = CaptureSession::start(media.as_mut(), stream)?;

        tracing::info!(
            sentences = sentences.len(),
            width = stream.size.width,
            height = stream.size.height,
            "run started"
        );
        let mut run = Self {
            driver: AnimationDriver::new(sentences, opts.style),
            capture,
            presentation,
            exporter,
            pacer,
            end: None,
            shut_down: false,
            stop_outcome: None,
            stop_error: None,
        };

        if let Err(e) = run.presentation.show() {
            run.fail();
            return Err(e);
        }
        run.pacer.request_frame();
        Ok(run)
    }

    /// Driver state.
    pub fn state(&self) -> &RunState {
        self.driver.state()
    }

    /// The capture session.
    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    /// Whether shutdown already ran.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// One frame at `now`: draw, capture, and schedule the next frame or shut down.
    ///
    /// Errors shut the run down before they are returned.
    pub fn tick(&mut self, now: Millis) -> ReelResult<Tick> {
        if let Some(size) = self.presentation.take_resize()
            && let Err(e) = self.presentation.surface_mut().resize(size)
        {
            self.fail();
            return Err(e);
        }

        let rendered_before = self.driver.frames_rendered();
        let tick = match self.driver.tick(now, self.presentation.surface_mut()) {
            Ok(t) => t,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };

        if self.driver.frames_rendered() > rendered_before
            && let Err(e) = self.capture_current(now)
        {
            self.fail();
            return Err(e);
        }

        match tick {
            Tick::Continue => self.pacer.request_frame(),
            Tick::Finished => {
                self.end.get_or_insert(EndReason::NaturalEnd);
                self.shutdown();
            }
            Tick::Stopped => self.shutdown(),
        }
        Ok(tick)
    }

    /// User cancellation: shut down now. The presentation is gone when this returns.
    pub fn cancel(&mut self) {
        if self.end.is_none() {
            tracing::info!(index = self.driver.state().current_index, "run cancelled");
            self.end = Some(EndReason::Cancelled);
        }
        self.shutdown();
    }

    /// Drive frames from the pacer until the run ends, checking `cancel` before each frame.
    pub fn run_to_end(&mut self, cancel: &CancelToken) -> ReelResult<RunReport> {
        while let Some(now) = self.pacer.next_frame() {
            if cancel.is_cancelled() {
                self.cancel();
            }
            self.tick(now)?;
        }
        if !self.shut_down {
            // The pacer ran dry without a terminal tick.
            self.cancel();
        }
        self.finish()
    }

    /// Final report; surfaces a recorder failure that happened during shutdown.
    pub fn finish(&mut self) -> ReelResult<RunReport> {
        if let Some(e) = self.stop_error.take() {
            return Err(e);
        }
        Ok(self.report())
    }

    /// Snapshot of the run so far.
    pub fn report(&self) -> RunReport {
        RunReport {
            sentences: self.driver.sentences().len(),
            sentences_completed: self.driver.completed(),
            frames_rendered: self.driver.frames_rendered(),
            frames_captured: self.capture.frames_written(),
            chunks: self.capture.chunks().len(),
            mime_type: self.capture.encoding().mime_type.to_string(),
            end: self.end,
            exported: match &self.stop_outcome {
                Some(StopOutcome::Exported { filename, .. }) => Some(filename.clone()),
                _ => None,
            },
        }
    }

    fn capture_current(&mut self, now: Millis) -> ReelResult<()> {
        let frame = self.presentation.surface_mut().snapshot()?;
        self.capture.capture_frame(now, &frame)?;
        Ok(())
    }

    fn fail(&mut self) {
        self.end.get_or_insert(EndReason::Failed);
        self.shutdown();
    }

    /// Stop everything exactly once, whichever trigger gets here first.
    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.driver.stop();
        self.presentation.detach_resize_listener();
        self.pacer.cancel_frame();
        match self.capture.stop(self.exporter.as_mut()) {
            Ok(outcome) => self.stop_outcome = Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "stopping the recording failed");
                self.stop_error = Some(e);
            }
        }
        self.presentation.remove();
        self.presentation.restore_global_state();

        tracing::info!(
            end = ?self.end,
            frames = self.driver.frames_rendered(),
            completed = self.driver.completed(),
            "run shut down"
        );
    }
}
