use crate::animation::clock::{self, Phase, display_duration_ms};
use crate::foundation::core::Millis;
use crate::foundation::error::ReelResult;
use crate::render::frame::{FrameStyle, draw_frame};
use crate::render::surface::Surface;
use crate::segment::SentenceSequence;

/// Mutable state of one run, advanced only by [`AnimationDriver::tick`].
///
/// While `stopped` is false, `current_index` is a valid index into the sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunState {
    /// Index of the unit on screen.
    pub current_index: usize,
    /// Phase of the unit on screen.
    pub phase: Phase,
    /// Start of `phase`; unset until the first tick.
    pub phase_start: Option<Millis>,
    /// Terminal flag. Once set nothing else changes.
    pub stopped: bool,
}

/// Result of one driver tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// A frame was drawn and another one should be scheduled.
    Continue,
    /// The last unit finished (or there was nothing to show). Do not schedule another frame.
    Finished,
    /// The run had already been stopped; nothing was drawn.
    Stopped,
}

/// Frame-by-frame state machine over a [`SentenceSequence`].
#[derive(Debug)]
pub struct AnimationDriver {
    sentences: SentenceSequence,
    style: FrameStyle,
    state: RunState,
    completed: usize,
    frames_rendered: u64,
}

impl AnimationDriver {
    /// Driver positioned on the first unit, fading in.
    pub fn new(sentences: SentenceSequence, style: FrameStyle) -> Self {
        Self {
            sentences,
            style,
            state: RunState::default(),
            completed: 0,
            frames_rendered: 0,
        }
    }

    /// Current run state.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The sequence being narrated.
    pub fn sentences(&self) -> &SentenceSequence {
        &self.sentences
    }

    /// Units that fully faded out.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Frames drawn so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Mark the run stopped. Observed by the next tick.
    pub fn stop(&mut self) {
        self.state.stopped = true;
    }

    /// Draw the frame for `now` and advance the state.
    pub fn tick(&mut self, now: Millis, surface: &mut dyn Surface) -> ReelResult<Tick> {
        if self.state.stopped {
            return Ok(Tick::Stopped);
        }
        let Some(unit) = self.sentences.get(self.state.current_index) else {
            tracing::debug!("nothing to narrate");
            self.state.stopped = true;
            return Ok(Tick::Finished);
        };

        let phase_start = self.state.phase_start.unwrap_or(now);
        let step = clock::tick(
            now,
            phase_start,
            self.state.phase,
            display_duration_ms(unit.char_len()),
        );

        draw_frame(surface, unit.as_str(), step.opacity, &self.style)?;
        self.frames_rendered += 1;

        if step.phase != self.state.phase && !step.advance {
            tracing::debug!(
                index = self.state.current_index,
                from = ?self.state.phase,
                to = ?step.phase,
                at_ms = now.0,
                "phase change"
            );
        }
        self.state.phase = step.phase;
        self.state.phase_start = Some(step.phase_start);

        if step.advance {
            self.completed += 1;
            if self.state.current_index + 1 >= self.sentences.len() {
                self.state.stopped = true;
                return Ok(Tick::Finished);
            }
            self.state.current_index += 1;
            tracing::debug!(index = self.state.current_index, at_ms = now.0, "next unit");
        }
        Ok(Tick::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{FrameRGBA, Point, Rgba8, Size};
    use crate::segment::segment;

    #[derive(Default)]
    struct TextLog {
        drawn: Vec<(String, f32)>,
    }

    impl Surface for TextLog {
        fn size(&self) -> Size {
            Size {
                width: 400,
                height: 200,
            }
        }
        fn resize(&mut self, _size: Size) -> ReelResult<()> {
            Ok(())
        }
        fn clear(&mut self) {}
        fn fill(&mut self, _color: Rgba8) {}
        fn measure_text(&mut self, text: &str, _font_size_px: f32) -> ReelResult<f32> {
            Ok(text.len() as f32 * 8.0)
        }
        fn draw_text(
            &mut self,
            text: &str,
            _center: Point,
            _font_size_px: f32,
            _color: Rgba8,
            opacity: f32,
        ) -> ReelResult<()> {
            self.drawn.push((text.to_string(), opacity));
            Ok(())
        }
        fn snapshot(&mut self) -> ReelResult<FrameRGBA> {
            Ok(FrameRGBA::solid(self.size(), Rgba8::WHITE))
        }
    }

    fn run_until_done(driver: &mut AnimationDriver, surface: &mut TextLog, step_ms: u64) -> u64 {
        let mut now = 0u64;
        loop {
            match driver.tick(Millis(now), surface).unwrap() {
                Tick::Continue => now += step_ms,
                Tick::Finished | Tick::Stopped => return now,
            }
        }
    }

    #[test]
    fn empty_sequence_finishes_without_drawing() {
        let mut d = AnimationDriver::new(segment("   "), FrameStyle::default());
        let mut s = TextLog::default();
        assert_eq!(d.tick(Millis(0), &mut s).unwrap(), Tick::Finished);
        assert!(d.state().stopped);
        assert_eq!(d.frames_rendered(), 0);
        assert!(s.drawn.is_empty());
        assert_eq!(d.tick(Millis(16), &mut s).unwrap(), Tick::Stopped);
    }

    #[test]
    fn first_tick_starts_the_phase_clock() {
        let mut d = AnimationDriver::new(segment("Hello."), FrameStyle::default());
        let mut s = TextLog::default();
        assert_eq!(d.tick(Millis(5000), &mut s).unwrap(), Tick::Continue);
        assert_eq!(d.state().phase_start, Some(Millis(5000)));
        assert_eq!(s.drawn, vec![("Hello.".to_string(), 0.0)]);
    }

    #[test]
    fn walks_every_unit_in_order() {
        let mut d = AnimationDriver::new(segment("One. Two. Three."), FrameStyle::default());
        let mut s = TextLog::default();
        let end = run_until_done(&mut d, &mut s, 10);

        // Three short units: fade in + one second hold + fade out each.
        assert!(end >= 3 * 2000, "ended at {end}");
        assert!(end <= 3 * 2000 + 3 * 30, "ended at {end}");
        assert_eq!(d.completed(), 3);
        assert!(d.state().stopped);
        assert_eq!(d.state().current_index, 2);

        let mut order: Vec<&str> = s.drawn.iter().map(|(t, _)| t.as_str()).collect();
        order.dedup();
        assert_eq!(order, vec!["One.", "Two.", "Three."]);
        assert!(s.drawn.iter().all(|(_, o)| (0.0..=1.0).contains(o)));
    }

    #[test]
    fn stop_is_observed_on_the_next_tick() {
        let mut d = AnimationDriver::new(segment("One. Two."), FrameStyle::default());
        let mut s = TextLog::default();
        assert_eq!(d.tick(Millis(0), &mut s).unwrap(), Tick::Continue);
        d.stop();
        let before = *d.state();
        assert_eq!(d.tick(Millis(16), &mut s).unwrap(), Tick::Stopped);
        assert_eq!(*d.state(), before);
        assert_eq!(d.frames_rendered(), 1);
    }
}
