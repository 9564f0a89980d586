//! Host doubles shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use textreel::{
    CaptureStream, Encoding, FrameRGBA, MediaBackend, MediaRecorder, Point, Presentation,
    ReelError, ReelResult, Rgba8, Size, Surface,
};

/// Ordered log of host calls, shared between doubles.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }
}

/// Surface that paints nothing; text is measured at 8 px per char.
pub struct RecordingSurface {
    size: Size,
    drawn: Rc<RefCell<Vec<(String, f32)>>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height).unwrap(),
            drawn: Rc::default(),
        }
    }

    pub fn drawn(&self) -> Rc<RefCell<Vec<(String, f32)>>> {
        self.drawn.clone()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) -> ReelResult<()> {
        self.size = size;
        Ok(())
    }

    fn clear(&mut self) {}

    fn fill(&mut self, _color: Rgba8) {}

    fn measure_text(&mut self, text: &str, _font_size_px: f32) -> ReelResult<f32> {
        Ok(text.chars().count() as f32 * 8.0)
    }

    fn draw_text(
        &mut self,
        text: &str,
        _center: Point,
        _font_size_px: f32,
        _color: Rgba8,
        opacity: f32,
    ) -> ReelResult<()> {
        self.drawn.borrow_mut().push((text.to_string(), opacity));
        Ok(())
    }

    fn snapshot(&mut self) -> ReelResult<FrameRGBA> {
        Ok(FrameRGBA::solid(self.size, Rgba8::WHITE))
    }
}

/// Presentation that logs lifecycle calls; viewport changes are injected through `resize`.
pub struct RecordingPresentation {
    pub surface: RecordingSurface,
    pub log: CallLog,
    pub resize: Rc<Cell<Option<Size>>>,
    listening: bool,
}

impl RecordingPresentation {
    pub fn new(surface: RecordingSurface, log: CallLog) -> Self {
        Self {
            surface,
            log,
            resize: Rc::default(),
            listening: false,
        }
    }
}

impl Presentation for RecordingPresentation {
    fn show(&mut self) -> ReelResult<()> {
        self.listening = true;
        self.log.push("show");
        Ok(())
    }

    fn surface_mut(&mut self) -> &mut dyn Surface {
        &mut self.surface
    }

    fn take_resize(&mut self) -> Option<Size> {
        if self.listening { self.resize.take() } else { None }
    }

    fn detach_resize_listener(&mut self) {
        self.listening = false;
        self.log.push("detach");
    }

    fn remove(&mut self) {
        self.log.push("remove");
    }

    fn restore_global_state(&mut self) {
        self.log.push("restore");
    }
}

/// Media backend supporting a fixed set of mime types.
pub struct ScriptedMedia {
    pub supported: Vec<&'static str>,
    pub open_fails: bool,
    pub log: CallLog,
}

impl ScriptedMedia {
    pub fn supporting(supported: &[&'static str], log: CallLog) -> Self {
        Self {
            supported: supported.to_vec(),
            open_fails: false,
            log,
        }
    }
}

impl MediaBackend for ScriptedMedia {
    fn is_type_supported(&mut self, encoding: &Encoding) -> bool {
        self.supported.contains(&encoding.mime_type)
    }

    fn open(
        &mut self,
        stream: &CaptureStream,
        encoding: &Encoding,
    ) -> ReelResult<Box<dyn MediaRecorder>> {
        if self.open_fails {
            return Err(ReelError::capture_init("recorder refused to start"));
        }
        self.log.push(format!("open:{}", encoding.mime_type));
        Ok(Box::new(ScriptedRecorder {
            stream: *stream,
            pending: Vec::new(),
            log: self.log.clone(),
        }))
    }
}

/// Emits one 4-byte chunk per frame; logs `finish`.
pub struct ScriptedRecorder {
    stream: CaptureStream,
    pending: Vec<Vec<u8>>,
    log: CallLog,
}

impl MediaRecorder for ScriptedRecorder {
    fn write_frame(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        assert_eq!(frame.size(), self.stream.size, "frames must match the stream size");
        self.pending.push(frame.data[..4].to_vec());
        Ok(())
    }

    fn poll_chunks(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.pending)
    }

    fn finish(&mut self) -> ReelResult<Vec<Vec<u8>>> {
        self.log.push("finish");
        Ok(std::mem::take(&mut self.pending))
    }
}

/// A usable TrueType font for tests that rasterise text, if one can be found.
///
/// `TEXTREEL_TEST_FONT` wins; otherwise a few common system locations are tried.
pub fn find_test_font() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os("TEXTREEL_TEST_FONT") {
        return Some(PathBuf::from(p));
    }
    [
        "tests/data/fonts/Inconsolata-Regular.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}
