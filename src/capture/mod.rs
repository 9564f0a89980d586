//! Recording: encoding selection, the capture session lifecycle and export.
//!
//! A [`session::CaptureSession`] consumes surface frames at a fixed rate and accumulates the
//! encoded chunks a [`media::MediaRecorder`] delivers. Stopping concatenates them into one
//! [`export::Artifact`] for an [`export::ExportSink`].

/// Export sinks and the finished artifact.
pub mod export;
/// `ffmpeg`-based media backend.
pub mod ffmpeg;
/// Media backend traits and the encoding preference list.
pub mod media;
/// Capture session lifecycle.
pub mod session;
