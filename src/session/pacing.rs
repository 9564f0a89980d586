use std::time::{Duration, Instant};

use crate::foundation::core::{Fps, Millis};

/// Host frame pacing: one frame is requested at a time and delivered when due.
pub trait FramePacer {
    /// Schedule the next frame.
    fn request_frame(&mut self);
    /// Drop the scheduled frame, if any.
    fn cancel_frame(&mut self);
    /// Wait for the scheduled frame and return its timestamp; `None` when nothing is scheduled.
    fn next_frame(&mut self) -> Option<Millis>;
}

/// Paces frames against the wall clock at a fixed rate.
///
/// Timestamps are milliseconds since the pacer was created. Frames that fall behind are not
/// replayed; the next frame is delivered immediately.
#[derive(Debug)]
pub struct RealtimePacer {
    interval: Duration,
    origin: Instant,
    next_due: Instant,
    requested: bool,
}

impl RealtimePacer {
    /// Pacer at `fps`, starting now.
    pub fn new(fps: Fps) -> Self {
        let origin = Instant::now();
        Self {
            interval: Duration::from_secs_f64(fps.frame_interval_ms() / 1000.0),
            origin,
            next_due: origin,
            requested: false,
        }
    }
}

impl FramePacer for RealtimePacer {
    fn request_frame(&mut self) {
        self.requested = true;
    }

    fn cancel_frame(&mut self) {
        self.requested = false;
    }

    fn next_frame(&mut self) -> Option<Millis> {
        if !std::mem::take(&mut self.requested) {
            return None;
        }
        let now = Instant::now();
        if self.next_due > now {
            std::thread::sleep(self.next_due - now);
        }
        let now = Instant::now();
        self.next_due = (self.next_due + self.interval).max(now);
        Some(Millis(now.duration_since(self.origin).as_millis() as u64))
    }
}

/// Virtual clock advancing exactly one frame interval per frame, without sleeping.
///
/// Frame `k` is stamped `ceil(k * 1000 / fps)` ms, so a stream at the same rate sees exactly one
/// new frame per tick.
#[derive(Debug)]
pub struct OfflinePacer {
    fps: Fps,
    frame: u64,
    requested: bool,
}

impl OfflinePacer {
    /// Virtual pacer at `fps`, starting at 0 ms.
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            frame: 0,
            requested: false,
        }
    }

    /// Frames delivered so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }
}

impl FramePacer for OfflinePacer {
    fn request_frame(&mut self) {
        self.requested = true;
    }

    fn cancel_frame(&mut self) {
        self.requested = false;
    }

    fn next_frame(&mut self) -> Option<Millis> {
        if !std::mem::take(&mut self.requested) {
            return None;
        }
        let num = 1000u128 * u128::from(self.fps.den) * u128::from(self.frame);
        let den = u128::from(self.fps.num);
        self.frame += 1;
        Some(Millis(num.div_ceil(den) as u64))
    }
}
