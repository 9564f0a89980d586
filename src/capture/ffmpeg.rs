use std::collections::HashSet;
use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::capture::media::{CaptureStream, Encoding, MediaBackend, MediaRecorder};
use crate::foundation::core::{Fps, FrameRGBA, Size};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;

/// Options for [`FfmpegMedia`].
#[derive(Clone, Debug)]
pub struct FfmpegOpts {
    /// `ffmpeg` executable.
    pub program: String,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Read size for encoded output chunks.
    pub chunk_bytes: usize,
}

impl Default for FfmpegOpts {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            bg_rgba: [255, 255, 255, 255],
            chunk_bytes: 64 * 1024,
        }
    }
}

/// Media backend that records through the system `ffmpeg`.
///
/// Raw RGBA frames go to `ffmpeg` stdin; the encoded container is read back from stdout in chunks
/// on a helper thread.
pub struct FfmpegMedia {
    opts: FfmpegOpts,
    encoders: Option<HashSet<String>>,
}

impl FfmpegMedia {
    /// Backend with the given options.
    pub fn new(opts: FfmpegOpts) -> Self {
        Self {
            opts,
            encoders: None,
        }
    }

    fn encoders(&mut self) -> &HashSet<String> {
        let program = self.opts.program.clone();
        self.encoders.get_or_insert_with(|| {
            let listed = list_encoders(&program);
            tracing::debug!(count = listed.len(), "probed ffmpeg encoders");
            listed
        })
    }
}

impl Default for FfmpegMedia {
    fn default() -> Self {
        Self::new(FfmpegOpts::default())
    }
}

impl MediaBackend for FfmpegMedia {
    fn is_type_supported(&mut self, encoding: &Encoding) -> bool {
        self.encoders().contains(encoding.encoder)
    }

    fn open(
        &mut self,
        stream: &CaptureStream,
        encoding: &Encoding,
    ) -> ReelResult<Box<dyn MediaRecorder>> {
        let recorder = FfmpegRecorder::spawn(&self.opts, stream, encoding)?;
        Ok(Box::new(recorder))
    }
}

/// A live `ffmpeg` encoding process.
pub struct FfmpegRecorder {
    size: Size,
    bg_rgba: [u8; 4],

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    chunks: mpsc::Receiver<Vec<u8>>,

    scratch: Vec<u8>,
    frames_written: u64,
}

impl FfmpegRecorder {
    fn spawn(opts: &FfmpegOpts, stream: &CaptureStream, encoding: &Encoding) -> ReelResult<Self> {
        let size = stream.size;
        if size.width == 0 || size.height == 0 {
            return Err(ReelError::capture_init(
                "ffmpeg recorder width/height must be non-zero",
            ));
        }
        if !size.width.is_multiple_of(2) || !size.height.is_multiple_of(2) {
            return Err(ReelError::capture_init(
                "ffmpeg recorder width/height must be even (required for yuv420p output)",
            ));
        }

        let mut cmd = Command::new(&opts.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, alpha flattened in `write_frame`.
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", size.width, size.height),
        ]);
        push_input_fps(&mut cmd, stream.fps);
        cmd.args(["-i", "pipe:0"]);
        cmd.args(encoding.output_args);
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::capture_init(format!("failed to spawn '{}': {e}", opts.program))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stdout), Some(mut stderr)) = (stdin, stdout, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::capture_init("ffmpeg stdio pipes were not captured"));
        };

        let (tx, rx) = mpsc::channel();
        let chunk_bytes = opts.chunk_bytes.max(1);
        let stdout_drain = std::thread::spawn(move || -> std::io::Result<()> {
            let mut buf = vec![0u8; chunk_bytes];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if tx.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        });

        tracing::debug!(
            mime = encoding.mime_type,
            width = size.width,
            height = size.height,
            "ffmpeg recorder started"
        );

        Ok(Self {
            size,
            bg_rgba: opts.bg_rgba,
            child: Some(child),
            stdin: Some(stdin),
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
            chunks: rx,
            scratch: vec![0u8; size.rgba8_len()],
            frames_written: 0,
        })
    }

    fn join_drains(&mut self) -> ReelResult<Vec<u8>> {
        if let Some(handle) = self.stdout_drain.take() {
            handle
                .join()
                .map_err(|_| ReelError::capture("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| ReelError::capture(format!("ffmpeg stdout read failed: {e}")))?;
        }
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::capture("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::capture(format!("ffmpeg stderr read failed: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}

impl MediaRecorder for FfmpegRecorder {
    fn write_frame(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        if frame.width != self.size.width || frame.height != self.size.height {
            return Err(ReelError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.size.width, self.size.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelError::capture(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if frame.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::capture("ffmpeg recorder is already finished"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn poll_chunks(&mut self) -> Vec<Vec<u8>> {
        self.chunks.try_iter().collect()
    }

    fn finish(&mut self) -> ReelResult<Vec<Vec<u8>>> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(Vec::new());
        };

        if self.frames_written == 0 {
            // Nothing was recorded; whatever container header ffmpeg emits is not a video.
            let _ = child.kill();
            let _ = child.wait();
            let _ = self.join_drains();
            let discarded = self.chunks.try_iter().count();
            tracing::debug!(discarded, "ffmpeg recorder finished without frames");
            return Ok(Vec::new());
        }

        let stderr_bytes = self.join_drains()?;
        let status = child
            .wait()
            .map_err(|e| ReelError::capture(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let rest: Vec<Vec<u8>> = self.chunks.try_iter().collect();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::capture(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(rest)
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn list_encoders(program: &str) -> HashSet<String> {
    let out = Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match out {
        Ok(out) if out.status.success() => parse_encoder_list(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::warn!(status = %out.status, "ffmpeg -encoders failed");
            HashSet::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, program, "ffmpeg not available");
            HashSet::new()
        }
    }
}

/// Encoder names from `ffmpeg -encoders` output.
///
/// Entries look like ` V....D libx264   H.264 ...`; the legend above the `------` separator is
/// skipped.
fn parse_encoder_list(listing: &str) -> HashSet<String> {
    listing
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (s[0] as u16 + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (s[1] as u16 + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (s[2] as u16 + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
