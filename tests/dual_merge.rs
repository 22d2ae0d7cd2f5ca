use framestrip::{
    Canvas, DualMerger, FrameSampler, FrameSequence, FramestripError, JobConfig, MergerOpts,
    NoProgress, PRINT_CANVAS, Pipeline, ScriptedSession, SourceSlot,
};

fn sequence(frames: usize, fps: f64, frame_count: u32, w: u32, h: u32) -> FrameSequence {
    let mut s = ScriptedSession::solid_frames(frames, w, h, fps).unwrap();
    FrameSampler::default()
        .sample(&mut s, frame_count, None, &mut NoProgress)
        .unwrap()
}

#[test]
fn unequal_lengths_truncate_to_shorter_and_keep_first_timestamps() {
    let a = sequence(100, 10.0, 10, 32, 24);
    let b = sequence(35, 5.0, 7, 32, 24);

    let merged = DualMerger::default().merge(&a, &b).unwrap();
    assert_eq!(merged.len(), 7);
    for (m, fa) in merged.frames().iter().zip(a.frames()) {
        assert_eq!(m.index, fa.index);
        assert_eq!(m.timestamp_sec, fa.timestamp_sec);
    }

    let last = &merged.frames()[6];
    assert_eq!(last.index, 7);
    assert_eq!(last.timestamp_sec, a.frames()[6].timestamp_sec);
    assert_ne!(last.timestamp_sec, b.frames()[6].timestamp_sec);
}

#[test]
fn merged_frames_use_print_canvas() {
    let a = sequence(10, 10.0, 2, 64, 36);
    let b = sequence(10, 10.0, 2, 40, 30);
    let merged = DualMerger::default().merge(&a, &b).unwrap();
    for frame in &merged {
        assert_eq!(frame.image.canvas(), PRINT_CANVAS);
        let img = frame.image.decode().unwrap();
        assert_eq!(img.dimensions(), (576, 384));
    }
}

#[test]
fn custom_output_canvas_is_honored() {
    let a = sequence(4, 4.0, 1, 16, 8);
    let merger = DualMerger::new(MergerOpts {
        canvas: Canvas {
            width: 100,
            height: 50,
        },
        jpeg_quality: 80,
    });
    let merged = merger.merge(&a, &a).unwrap();
    let canvas = merged.frames()[0].image.canvas();
    assert_eq!((canvas.width, canvas.height), (100, 50));
}

#[test]
fn rotated_halves_sit_side_by_side() {
    // Two sources of different colors: after rotation + concat, the left half of every merged
    // frame comes from the first source and the right half from the second.
    let red = image::RgbaImage::from_pixel(40, 30, image::Rgba([230, 20, 20, 255]));
    let blue = image::RgbaImage::from_pixel(40, 30, image::Rgba([20, 20, 230, 255]));
    let mut sa = ScriptedSession::new(vec![red], 1.0).unwrap();
    let mut sb = ScriptedSession::new(vec![blue], 1.0).unwrap();
    let a = FrameSampler::default()
        .sample(&mut sa, 1, None, &mut NoProgress)
        .unwrap();
    let b = FrameSampler::default()
        .sample(&mut sb, 1, None, &mut NoProgress)
        .unwrap();

    let merged = DualMerger::default().merge(&a, &b).unwrap();
    let img = merged.frames()[0].image.decode().unwrap();
    let left = img.get_pixel(100, 192).0;
    let right = img.get_pixel(476, 192).0;
    assert!(left[0] > 180 && left[2] < 80, "{left:?}");
    assert!(right[2] > 180 && right[0] < 80, "{right:?}");
}

#[test]
fn empty_input_is_merge_error() {
    let a = sequence(10, 10.0, 3, 8, 8);
    let empty = FrameSequence::from_frames(Vec::new()).unwrap();

    for (x, y) in [(&a, &empty), (&empty, &a), (&empty, &empty)] {
        let err = DualMerger::default().merge(x, y).unwrap_err();
        assert!(matches!(err, FramestripError::Merge(_)), "{err}");
    }
}

#[test]
fn dual_pipeline_waits_for_both_then_merges() {
    let cfg = JobConfig {
        frame_count: 6,
        ..JobConfig::default()
    };
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let mut first = ScriptedSession::solid_frames(60, 32, 18, 30.0).unwrap();
    let mut second = ScriptedSession::solid_frames(90, 24, 24, 30.0).unwrap();

    let mut reports: Vec<(SourceSlot, u8)> = Vec::new();
    let outcome = pipeline
        .sample_dual(&mut first, &mut second, |slot, pct| reports.push((slot, pct)))
        .unwrap();

    assert_eq!(outcome.sources.first.len(), 6);
    assert_eq!(outcome.sources.second.len(), 6);
    assert_eq!(outcome.merged.len(), 6);
    assert_eq!(
        outcome.merged.frames()[3].timestamp_sec,
        outcome.sources.get(SourceSlot::First).frames()[3].timestamp_sec
    );
    assert!((outcome.merged.frames()[3].timestamp_sec - 1.0).abs() < 1e-9);

    for slot in [SourceSlot::First, SourceSlot::Second] {
        let per_slot: Vec<u8> = reports
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, p)| *p)
            .collect();
        assert_eq!(per_slot.len(), 6);
        assert_eq!(per_slot.last(), Some(&100));
        assert!(per_slot.windows(2).all(|w| w[0] <= w[1]));
    }
    assert_eq!(first.seek_log().len(), 6);
    assert_eq!(second.seek_log().len(), 6);
}

#[test]
fn dual_pipeline_fails_when_either_source_fails() {
    let cfg = JobConfig {
        frame_count: 4,
        ..JobConfig::default()
    };
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let mut first = ScriptedSession::solid_frames(40, 8, 8, 10.0).unwrap();
    let mut second = ScriptedSession::solid_frames(40, 8, 8, 10.0)
        .unwrap()
        .fail_seek_at(3);

    let err = pipeline
        .sample_dual(&mut first, &mut second, |_, _| {})
        .unwrap_err();
    assert!(matches!(err, FramestripError::Seek(_)), "{err}");
    // The healthy source still ran to completion before the barrier released.
    assert_eq!(first.seek_log().len(), 4);
}
