//! textreel turns the visible text of a document into a timed sentence slideshow and records it
//! as a video.
//!
//! A run goes through these steps:
//!
//! - Extract text from a [`TextSource`] and [`segment`] it into display units
//! - Start a [`CaptureSession`] (fails fast when no encoding is available)
//! - Drive frames with a [`RunController`]: each unit fades in, holds and fades out
//! - Stop recording and hand the result to an [`ExportSink`] when the run ends or is cancelled
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Phase clock and animation driver.
pub mod animation;
/// Recording and export.
pub mod capture;
/// Rendering surfaces and frame composition.
pub mod render;
/// Sentence segmentation.
pub mod segment;
/// Run controller and pacing.
pub mod session;
/// Text sources.
pub mod source;

pub use crate::foundation::core::{Fps, FrameRGBA, Millis, Point, Rgba8, Size};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::clock::{FADE_MS, Phase, PhaseTick, display_duration_ms, tick};
pub use crate::animation::driver::{AnimationDriver, RunState, Tick};
pub use crate::capture::export::{Artifact, DirExport, ExportSink, MemoryExport};
pub use crate::capture::ffmpeg::{FfmpegMedia, FfmpegOpts, is_ffmpeg_on_path};
pub use crate::capture::media::{
    CaptureStream, ENCODING_PREFERENCE, Encoding, MediaBackend, MediaRecorder, select_encoding,
};
pub use crate::capture::session::{CaptureSession, CaptureState, EXPORT_BASENAME, StopOutcome};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::frame::{FrameStyle, draw_frame, wrap_words};
pub use crate::render::surface::{HeadlessPresentation, Presentation, Surface};
pub use crate::segment::{DisplayUnit, SentenceSequence, segment};
pub use crate::session::controller::{
    CancelToken, EndReason, RunController, RunHost, RunOpts, RunReport,
};
pub use crate::session::pacing::{FramePacer, OfflinePacer, RealtimePacer};
pub use crate::source::{HtmlDocument, PlainText, TextSource};
