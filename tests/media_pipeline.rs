#[cfg(feature = "media-ffmpeg")]
mod media_pipeline {
    use std::{path::Path, process::Command};

    use framestrip::{
        CropSettings, DecodeSession, FfmpegSession, FillColor, FramestripError, JobConfig,
        NoProgress, Pipeline, is_ffmpeg_on_path,
    };

    fn synth_clip(path: &Path, size: &str, seconds: u32) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let status = Command::new("ffmpeg")
            .args([
                "-v",
                "error",
                "-y",
                "-f",
                "lavfi",
                "-i",
                &format!("testsrc=size={size}:rate=30"),
                "-t",
                &seconds.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-c:v",
                "libx264",
            ])
            .arg(path)
            .status()?;
        anyhow::ensure!(status.success(), "ffmpeg failed creating {}", path.display());
        Ok(())
    }

    fn rotate_clip(src: &Path, dst: &Path) -> anyhow::Result<()> {
        let display_matrix = Command::new("ffmpeg")
            .args(["-v", "error", "-y", "-display_rotation", "90", "-i"])
            .arg(src)
            .args(["-c", "copy"])
            .arg(dst)
            .status()?;
        if display_matrix.success() {
            return Ok(());
        }
        let legacy_tag = Command::new("ffmpeg")
            .args(["-v", "error", "-y", "-i"])
            .arg(src)
            .args(["-c", "copy", "-metadata:s:v:0", "rotate=90"])
            .arg(dst)
            .status()?;
        anyhow::ensure!(legacy_tag.success(), "ffmpeg failed rotating {}", dst.display());
        Ok(())
    }

    #[test]
    fn rotated_clip_reports_and_decodes_display_size() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = Path::new("target").join("media_pipeline");
        let plain = dir.join("landscape.mp4");
        let rotated = dir.join("portrait.mp4");
        synth_clip(&plain, "64x48", 2).unwrap();
        rotate_clip(&plain, &rotated).unwrap();

        let cfg = JobConfig {
            frame_count: 2,
            ..JobConfig::default()
        };
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        let mut session = pipeline.open_source(&rotated).unwrap();
        assert_eq!((session.info().width, session.info().height), (48, 64));

        let frame = session.seek_frame(0.5).unwrap();
        assert_eq!(frame.dimensions(), (48, 64));
        let seq = pipeline.sample_single(&mut session, &mut NoProgress).unwrap();
        for frame in &seq {
            assert_eq!(frame.image.decode().unwrap().dimensions(), (48, 64));
        }
    }

    #[test]
    fn ffmpeg_session_samples_real_clip() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let clip = Path::new("target").join("media_pipeline").join("clip_a.mp4");
        synth_clip(&clip, "64x48", 3).unwrap();

        let cfg = JobConfig {
            frame_count: 3,
            ..JobConfig::default()
        };
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        let mut session = pipeline.open_source(&clip).unwrap();
        assert_eq!((session.info().width, session.info().height), (64, 48));
        assert!((session.info().duration_sec - 3.0).abs() < 0.1);

        let seq = pipeline.sample_single(&mut session, &mut NoProgress).unwrap();
        assert_eq!(seq.len(), 3);
        let step = session.info().duration_sec / 3.0;
        for (i, frame) in seq.frames().iter().enumerate() {
            assert!((frame.timestamp_sec - i as f64 * step).abs() < 1e-9);
            assert_eq!(frame.image.decode().unwrap().dimensions(), (64, 48));
        }
    }

    #[test]
    fn dual_real_clips_merge_to_print_canvas() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = Path::new("target").join("media_pipeline");
        let a = dir.join("dual_a.mp4");
        let b = dir.join("dual_b.mp4");
        synth_clip(&a, "80x60", 2).unwrap();
        synth_clip(&b, "60x80", 1).unwrap();

        let cfg = JobConfig {
            frame_count: 4,
            crop: Some(CropSettings {
                scale: 0.5,
                fill: FillColor::White,
                ..CropSettings::default()
            }),
            ..JobConfig::default()
        };
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        let mut sa = pipeline.open_source(&a).unwrap();
        let mut sb = pipeline.open_source(&b).unwrap();
        let outcome = pipeline.sample_dual(&mut sa, &mut sb, |_, _| {}).unwrap();

        assert_eq!(outcome.merged.len(), 4);
        for frame in &outcome.merged {
            assert_eq!(frame.image.decode().unwrap().dimensions(), (576, 384));
        }
    }

    #[test]
    fn garbage_file_fails_with_decode_error() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let path = Path::new("target").join("media_pipeline").join("garbage.mp4");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not a video").unwrap();

        let err = FfmpegSession::open(&path).unwrap_err();
        assert!(matches!(err, FramestripError::Decode(_)), "{err}");
    }
}
