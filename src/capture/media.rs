use crate::foundation::core::{Fps, FrameRGBA, Size};
use crate::foundation::error::{ReelError, ReelResult};

/// A recordable encoding: container mime type plus how to produce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoding {
    /// Mime type with codec parameter, e.g. `video/webm; codecs=vp9`.
    pub mime_type: &'static str,
    /// `ffmpeg` encoder name.
    pub encoder: &'static str,
    /// Encoder and muxer arguments placed after the input.
    pub output_args: &'static [&'static str],
}

impl Encoding {
    /// File extension: the mime subtype without parameters (`webm`, `mp4`).
    pub fn extension(&self) -> &'static str {
        extension_for_mime(self.mime_type)
    }
}

/// Mime subtype without parameters; empty if `mime` has no `/`.
pub fn extension_for_mime(mime: &str) -> &str {
    mime.split_once('/')
        .map(|(_, rest)| rest.split(';').next().unwrap_or(rest).trim())
        .unwrap_or("")
}

/// Encodings in preference order, most efficient first.
pub const ENCODING_PREFERENCE: [Encoding; 3] = [
    Encoding {
        mime_type: "video/webm; codecs=vp9",
        encoder: "libvpx-vp9",
        output_args: &[
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-row-mt",
            "1",
            "-f",
            "webm",
        ],
    },
    Encoding {
        mime_type: "video/webm; codecs=vp8",
        encoder: "libvpx",
        output_args: &[
            "-c:v",
            "libvpx",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            "2M",
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-f",
            "webm",
        ],
    },
    Encoding {
        mime_type: "video/mp4; codecs=avc1.42E01E",
        encoder: "libx264",
        output_args: &[
            "-c:v",
            "libx264",
            "-profile:v",
            "baseline",
            "-level",
            "3.0",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "frag_keyframe+empty_moov",
            "-f",
            "mp4",
        ],
    },
];

/// Capturable frame stream bound to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureStream {
    /// Frame size; frames of another size are scaled to it.
    pub size: Size,
    /// Fixed output frame rate.
    pub fps: Fps,
}

/// Platform media subsystem.
pub trait MediaBackend {
    /// Whether `encoding` can be recorded.
    fn is_type_supported(&mut self, encoding: &Encoding) -> bool;
    /// Open a recorder for `stream` producing `encoding`.
    fn open(
        &mut self,
        stream: &CaptureStream,
        encoding: &Encoding,
    ) -> ReelResult<Box<dyn MediaRecorder>>;
}

/// An open recording.
///
/// Encoded data arrives asynchronously as chunks. `poll_chunks` hands over whatever arrived so far;
/// `finish` flushes the encoder and hands over the rest.
pub trait MediaRecorder {
    /// Append one frame to the recording.
    fn write_frame(&mut self, frame: &FrameRGBA) -> ReelResult<()>;
    /// Chunks delivered since the last poll, in arrival order.
    fn poll_chunks(&mut self) -> Vec<Vec<u8>>;
    /// Flush and close; returns the chunks delivered after the last poll.
    fn finish(&mut self) -> ReelResult<Vec<Vec<u8>>>;
}

/// First encoding in [`ENCODING_PREFERENCE`] the backend supports.
pub fn select_encoding(media: &mut dyn MediaBackend) -> ReelResult<&'static Encoding> {
    for enc in ENCODING_PREFERENCE.iter() {
        if media.is_type_supported(enc) {
            return Ok(enc);
        }
        tracing::debug!(mime = enc.mime_type, "encoding not supported");
    }
    Err(ReelError::UnsupportedFormat {
        tried: ENCODING_PREFERENCE
            .iter()
            .map(|e| e.mime_type.to_string())
            .collect(),
    })
}
