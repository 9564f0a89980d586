use crate::foundation::core::{FrameRGBA, Point, Rgba8, Size};
use crate::foundation::error::ReelResult;

/// 2D drawing surface the animation renders into.
///
/// Drawing is immediate-mode: `clear`, `fill` and `draw_text` accumulate into the current frame and
/// `snapshot` reads it back.
pub trait Surface {
    /// Current pixel size.
    fn size(&self) -> Size;
    /// Resize the surface; the next frame starts blank.
    fn resize(&mut self, size: Size) -> ReelResult<()>;
    /// Reset the frame to transparent.
    fn clear(&mut self);
    /// Fill the whole frame with `color`.
    fn fill(&mut self, color: Rgba8);
    /// Advance width of `text` set at `font_size_px`.
    fn measure_text(&mut self, text: &str, font_size_px: f32) -> ReelResult<f32>;
    /// Draw one line of text centred (horizontally and vertically) on `center`.
    fn draw_text(
        &mut self,
        text: &str,
        center: Point,
        font_size_px: f32,
        color: Rgba8,
        opacity: f32,
    ) -> ReelResult<()>;
    /// Read back the current frame.
    fn snapshot(&mut self) -> ReelResult<FrameRGBA>;
}

/// The on-screen chrome around a surface for the lifetime of one run.
pub trait Presentation {
    /// Mount the surface, start listening for viewport changes and take over global UI state.
    fn show(&mut self) -> ReelResult<()>;
    /// Surface to draw into.
    fn surface_mut(&mut self) -> &mut dyn Surface;
    /// Pending viewport size change, if the resize listener saw one.
    fn take_resize(&mut self) -> Option<Size>;
    /// Stop listening for viewport changes.
    fn detach_resize_listener(&mut self);
    /// Unmount the surface.
    fn remove(&mut self);
    /// Give back global UI state taken in `show`.
    fn restore_global_state(&mut self);
}

/// Presentation without any on-screen chrome, used for offscreen and CLI runs.
///
/// Viewport changes can be injected with [`HeadlessPresentation::notify_resize`].
pub struct HeadlessPresentation<S> {
    surface: S,
    shown: bool,
    listening: bool,
    pending_resize: Option<Size>,
}

impl<S: Surface> HeadlessPresentation<S> {
    /// Wrap `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            shown: false,
            listening: false,
            pending_resize: None,
        }
    }

    /// Queue a viewport change; ignored unless the resize listener is attached.
    pub fn notify_resize(&mut self, size: Size) {
        if self.listening {
            self.pending_resize = Some(size);
        }
    }

    /// Whether the surface is currently mounted.
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Unwrap the surface.
    pub fn into_surface(self) -> S {
        self.surface
    }
}

impl<S: Surface> Presentation for HeadlessPresentation<S> {
    fn show(&mut self) -> ReelResult<()> {
        self.shown = true;
        self.listening = true;
        tracing::debug!(size = ?self.surface.size(), "headless presentation shown");
        Ok(())
    }

    fn surface_mut(&mut self) -> &mut dyn Surface {
        &mut self.surface
    }

    fn take_resize(&mut self) -> Option<Size> {
        self.pending_resize.take()
    }

    fn detach_resize_listener(&mut self) {
        self.listening = false;
        self.pending_resize = None;
    }

    fn remove(&mut self) {
        self.shown = false;
    }

    fn restore_global_state(&mut self) {}
}
