mod support;

use textreel::{
    CancelToken, CaptureSession, CaptureStream, EndReason, FfmpegMedia, Fps, FrameRGBA,
    MemoryExport, Millis, OfflinePacer, PlainText, Rgba8, RunController, RunHost, RunOpts, Size,
    StopOutcome, is_ffmpeg_on_path,
};

fn looks_like_container(mime: &str, bytes: &[u8]) -> bool {
    if mime.starts_with("video/webm") {
        bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3])
    } else {
        bytes.len() > 8 && &bytes[4..8] == b"ftyp"
    }
}

#[test]
fn ffmpeg_session_records_and_exports() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }

    let mut media = FfmpegMedia::default();
    let stream = CaptureStream {
        size: Size::new(64, 64).unwrap(),
        fps: Fps::new(10, 1).unwrap(),
    };
    let mut session = match CaptureSession::start(&mut media, stream) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("skipping: no usable encoder: {e}");
            return;
        }
    };

    for (i, t) in (0..1000u64).step_by(100).enumerate() {
        let shade = (i * 25) as u8;
        let frame = FrameRGBA::solid(stream.size, Rgba8::rgb(shade, 0, 255 - shade));
        session.capture_frame(Millis(t), &frame).unwrap();
    }
    assert_eq!(session.frames_written(), 10);

    let mut export = MemoryExport::new();
    let outcome = session.stop(&mut export).unwrap();
    let StopOutcome::Exported { filename, bytes } = outcome else {
        panic!("expected an export, got {outcome:?}");
    };
    assert!(filename.starts_with("animation."));
    assert!(bytes > 0);

    let (_, artifact) = &export.exported()[0];
    assert!(
        looks_like_container(&artifact.mime_type, &artifact.bytes),
        "unexpected container header for {}",
        artifact.mime_type
    );
    assert_eq!(session.stop(&mut export).unwrap(), StopOutcome::AlreadyStopped);
    assert_eq!(export.count(), 1);
}

#[test]
fn ffmpeg_session_without_frames_exports_nothing() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let mut media = FfmpegMedia::default();
    let stream = CaptureStream {
        size: Size::new(32, 32).unwrap(),
        fps: Fps::new(10, 1).unwrap(),
    };
    let Ok(mut session) = CaptureSession::start(&mut media, stream) else {
        eprintln!("skipping: no usable encoder");
        return;
    };
    let mut export = MemoryExport::new();
    assert_eq!(session.stop(&mut export).unwrap(), StopOutcome::NoData);
    assert_eq!(export.count(), 0);
}

#[test]
fn full_run_through_ffmpeg() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let log = support::CallLog::default();
    let presentation =
        support::RecordingPresentation::new(support::RecordingSurface::new(96, 54), log.clone());
    let export = MemoryExport::new();
    let fps = Fps::new(15, 1).unwrap();
    let host = RunHost {
        presentation: Box::new(presentation),
        media: Box::new(FfmpegMedia::default()),
        exporter: Box::new(export.clone()),
        pacer: Box::new(OfflinePacer::new(fps)),
    };
    let opts = RunOpts {
        fps,
        ..RunOpts::default()
    };
    let Ok(mut run) = RunController::start(&PlainText::new("Short. Run."), host, opts) else {
        eprintln!("skipping: no usable encoder");
        return;
    };
    let report = run.run_to_end(&CancelToken::new()).unwrap();
    assert_eq!(report.end, Some(EndReason::NaturalEnd));
    assert_eq!(export.count(), 1);
    assert!(report.exported.unwrap().starts_with("animation."));
    assert_eq!(log.count("remove"), 1);
}
