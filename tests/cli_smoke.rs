use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_framestrip")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "framestrip.exe"
            } else {
                "framestrip"
            });
            p
        })
}

#[test]
fn cli_rejects_invalid_fill_color() {
    let dir = PathBuf::from("target").join("cli_smoke");
    let status = std::process::Command::new(exe())
        .args(["sample", "--in", "clip.mp4", "--fill", "teal", "--out"])
        .arg(&dir)
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn cli_rejects_non_video_input() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let notes = dir.join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();

    let output = std::process::Command::new(exe())
        .args(["sample", "--in"])
        .arg(&notes)
        .arg("--out")
        .arg(dir.join("frames"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a supported video file"), "{stderr}");
}

#[cfg(feature = "media-ffmpeg")]
#[test]
fn cli_sample_writes_frames_and_manifest() {
    if !framestrip::is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }

    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let clip = dir.join("clip.mp4");
    let status = std::process::Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x64:rate=30",
            "-t",
            "2",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&clip)
        .status()
        .unwrap();
    assert!(status.success());

    let out = dir.join("frames");
    let _ = std::fs::remove_dir_all(&out);
    let status = std::process::Command::new(exe())
        .args(["sample", "--frames", "4", "--scale", "2", "--fill", "white", "--in"])
        .arg(&clip)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    for i in 1..=4 {
        assert!(out.join(format!("frame-{i}.jpg")).exists());
    }
    assert!(out.join("frames.json").exists());
}
