mod support;

use textreel::{CpuSurface, FrameStyle, Size, Surface, draw_frame};

fn surface() -> Option<CpuSurface> {
    let Some(font) = support::find_test_font() else {
        eprintln!("skipping: no test font found (set TEXTREEL_TEST_FONT)");
        return None;
    };
    Some(CpuSurface::from_font_file(Size::new(320, 120).unwrap(), &font).unwrap())
}

fn ink(data: &[u8]) -> usize {
    data.chunks_exact(4)
        .filter(|px| px[0] < 128 && px[1] < 128 && px[2] < 128)
        .count()
}

#[test]
fn font_family_is_resolved_from_bytes() {
    let Some(s) = surface() else { return };
    assert!(!s.font_family().trim().is_empty());
    assert!(!s.font_bytes().is_empty());
}

#[test]
fn text_is_measured_wider_for_longer_strings() {
    let Some(mut s) = surface() else { return };
    let short = s.measure_text("Hi", 24.0).unwrap();
    let long = s.measure_text("Hi there, longer text", 24.0).unwrap();
    assert!(short > 0.0);
    assert!(long > short);
}

#[test]
fn opacity_controls_how_much_text_shows() {
    let Some(mut s) = surface() else { return };
    let style = FrameStyle::default();

    draw_frame(&mut s, "Hello world.", 0.0, &style).unwrap();
    let blank = s.snapshot().unwrap();
    assert_eq!(ink(&blank.data), 0);
    assert!(blank.data.chunks_exact(4).all(|px| px == [255, 255, 255, 255]));

    draw_frame(&mut s, "Hello world.", 1.0, &style).unwrap();
    let full = s.snapshot().unwrap();
    assert!(ink(&full.data) > 0);
    assert_eq!(full.data.len(), 320 * 120 * 4);
}

#[test]
fn resize_changes_snapshot_size() {
    let Some(mut s) = surface() else { return };
    s.resize(Size::new(64, 32).unwrap()).unwrap();
    draw_frame(&mut s, "Hi.", 1.0, &FrameStyle::default()).unwrap();
    let f = s.snapshot().unwrap();
    assert_eq!((f.width, f.height), (64, 32));
    assert_eq!(f.data.len(), 64 * 32 * 4);
}
