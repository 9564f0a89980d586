mod support;

use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_textreel")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "textreel.exe"
            } else {
                "textreel"
            });
            p
        })
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn cli_segment_prints_json() {
    let dir = scratch_dir("segment");
    let in_path = dir.join("list.txt");
    std::fs::write(&in_path, "Item 1. Buy milk. 2. Buy eggs.\n").unwrap();

    let out = std::process::Command::new(exe())
        .args(["segment", "--in"])
        .arg(&in_path)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let units: Vec<String> = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(units, vec!["Item 1. Buy milk.", "2. Buy eggs."]);
}

#[test]
fn cli_segment_reads_html_visible_text() {
    let dir = scratch_dir("segment_html");
    let in_path = dir.join("page.html");
    std::fs::write(
        &in_path,
        "<html><body><p>Visible text.</p><script>hidden();</script>\
         <p style=\"display:none\">Not shown.</p><p>More text.</p></body></html>",
    )
    .unwrap();

    let out = std::process::Command::new(exe())
        .args(["segment", "--in"])
        .arg(&in_path)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let units: Vec<String> = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(units, vec!["Visible text.", "More text."]);
}

#[test]
fn cli_frame_writes_png() {
    let Some(font) = support::find_test_font() else {
        eprintln!("skipping: no test font found (set TEXTREEL_TEST_FONT)");
        return;
    };
    let dir = scratch_dir("frame");
    let in_path = dir.join("text.txt");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);
    std::fs::write(&in_path, "Hello there. General Kenobi.").unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--in"])
        .arg(&in_path)
        .arg("--font")
        .arg(&font)
        .args(["--width", "160", "--height", "90", "--at-ms", "1000", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap();
    assert_eq!((img.width(), img.height()), (160, 90));
}

#[test]
fn cli_rejects_missing_input() {
    let status = std::process::Command::new(exe())
        .args(["segment", "--in", "target/cli_smoke/does-not-exist.txt"])
        .status()
        .unwrap();
    assert!(!status.success());
}
