use crate::capture::export::{Artifact, ExportSink};
use crate::capture::media::{CaptureStream, Encoding, MediaBackend, MediaRecorder, select_encoding};
use crate::foundation::core::{FrameRGBA, Millis};
use crate::foundation::error::{ReelError, ReelResult};

/// Base name of exported recordings; the extension comes from the encoding.
pub const EXPORT_BASENAME: &str = "animation";

/// Lifecycle of a [`CaptureSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum CaptureState {
    /// Created, recorder not open yet.
    Idle,
    /// Accepting frames.
    Recording,
    /// Terminal.
    Stopped,
}

/// What a call to [`CaptureSession::stop`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// The session was not recording; nothing happened.
    AlreadyStopped,
    /// Recording stopped without any data; nothing was exported.
    NoData,
    /// Recording stopped and was exported.
    Exported {
        /// Name handed to the export sink.
        filename: String,
        /// Artifact size.
        bytes: usize,
    },
}

/// One recording bound to one run.
pub struct CaptureSession {
    state: CaptureState,
    encoding: &'static Encoding,
    stream: CaptureStream,
    recorder: Option<Box<dyn MediaRecorder>>,
    chunks: Vec<Vec<u8>>,
    started_at: Option<Millis>,
    frames_written: u64,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state)
            .field("mime_type", &self.encoding.mime_type)
            .field("chunks", &self.chunks.len())
            .field("frames_written", &self.frames_written)
            .finish()
    }
}

impl CaptureSession {
    /// Pick an encoding and open a recorder.
    ///
    /// Fails with [`ReelError::UnsupportedFormat`] when no preferred encoding is available and with
    /// [`ReelError::CaptureInit`] when the recorder cannot be opened.
    pub fn start(media: &mut dyn MediaBackend, stream: CaptureStream) -> ReelResult<Self> {
        let encoding = select_encoding(media)?;
        let mut session = Self {
            state: CaptureState::Idle,
            encoding,
            stream,
            recorder: None,
            chunks: Vec::new(),
            started_at: None,
            frames_written: 0,
        };

        let recorder = media.open(&stream, encoding).map_err(|e| match e {
            ReelError::CaptureInit(msg) => ReelError::CaptureInit(msg),
            other => ReelError::capture_init(other.to_string()),
        })?;
        session.recorder = Some(recorder);
        session.state = CaptureState::Recording;
        tracing::info!(mime = encoding.mime_type, fps = stream.fps.as_f64(), "recording started");
        Ok(session)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Chosen encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Accumulated chunks in arrival order.
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Frames handed to the recorder.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Feed the surface frame shown at `now` into the fixed-rate stream.
    ///
    /// The frame is repeated for every stream frame that fell due since the previous call, so the
    /// recording keeps wall-clock timing when rendering runs slower than the stream rate. Returns the
    /// number of stream frames written. A no-op unless recording.
    pub fn capture_frame(&mut self, now: Millis, frame: &FrameRGBA) -> ReelResult<u64> {
        if self.state != CaptureState::Recording {
            return Ok(0);
        }
        let start = *self.started_at.get_or_insert(now);
        let due = self
            .stream
            .fps
            .frames_in_ms_floor(now.saturating_since(start))
            + 1;
        let n = due.saturating_sub(self.frames_written);
        if n > 0 {
            let Some(recorder) = self.recorder.as_mut() else {
                return Err(ReelError::capture("recording has no open recorder"));
            };
            let scaled;
            let frame = if frame.size() == self.stream.size {
                frame
            } else {
                scaled = fit_to_stream(frame, self.stream)?;
                &scaled
            };
            for _ in 0..n {
                recorder.write_frame(frame)?;
            }
            self.frames_written += n;
        }
        self.collect_chunks();
        Ok(n)
    }

    /// Pull whatever chunks the recorder delivered so far.
    pub fn collect_chunks(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            let delivered = recorder.poll_chunks();
            self.append(delivered);
        }
    }

    /// Stop recording and export what was captured.
    ///
    /// Idempotent: calling it when not recording returns [`StopOutcome::AlreadyStopped`]. Chunks the
    /// recorder flushes while finishing are kept. With no chunks nothing is exported.
    pub fn stop(&mut self, exporter: &mut dyn ExportSink) -> ReelResult<StopOutcome> {
        if self.state != CaptureState::Recording {
            tracing::debug!(state = ?self.state, "stop ignored");
            return Ok(StopOutcome::AlreadyStopped);
        }
        self.state = CaptureState::Stopped;

        if let Some(mut recorder) = self.recorder.take() {
            let early = recorder.poll_chunks();
            self.append(early);
            let flushed = recorder.finish()?;
            self.append(flushed);
        }

        if self.chunks.is_empty() {
            tracing::debug!(frames = self.frames_written, "recording produced no data");
            return Ok(StopOutcome::NoData);
        }

        let artifact = self.finalize();
        let filename = format!("{EXPORT_BASENAME}.{}", artifact.extension());
        exporter.export(&artifact, &filename)?;
        tracing::info!(
            %filename,
            bytes = artifact.bytes.len(),
            chunks = self.chunks.len(),
            frames = self.frames_written,
            "recording stopped"
        );
        Ok(StopOutcome::Exported {
            filename,
            bytes: artifact.bytes.len(),
        })
    }

    fn append(&mut self, delivered: Vec<Vec<u8>>) {
        self.chunks
            .extend(delivered.into_iter().filter(|c| !c.is_empty()));
    }

    fn finalize(&self) -> Artifact {
        let total = self.chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in &self.chunks {
            bytes.extend_from_slice(chunk);
        }
        Artifact {
            bytes,
            mime_type: self.encoding.mime_type.to_string(),
        }
    }
}

/// Scale `frame` to the stream size; the surface may have been resized mid-run.
fn fit_to_stream(frame: &FrameRGBA, stream: CaptureStream) -> ReelResult<FrameRGBA> {
    let src = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| ReelError::capture("frame.data size mismatch with width*height*4"))?;
    let scaled = image::imageops::resize(
        &src,
        stream.size.width,
        stream.size.height,
        image::imageops::FilterType::Triangle,
    );
    Ok(FrameRGBA {
        width: stream.size.width,
        height: stream.size.height,
        data: scaled.into_raw(),
        premultiplied: frame.premultiplied,
    })
}
