//! Uniform-in-time frame sampling over a decode session.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    composite::composite_crop,
    export::{ExportFrame, ExportNaming, timestamp_label},
    foundation::{
        core::{CANONICAL_CANVAS, Canvas, CropSettings, DEFAULT_JPEG_QUALITY, FillColor},
        error::{FramestripError, FramestripResult},
    },
    media::session::DecodeSession,
    raster::{ImageHandle, Surface},
};

/// One sampled still.
#[derive(Clone, Debug)]
pub struct Frame {
    /// 1-based position in its sequence.
    pub index: u32,
    pub timestamp_sec: f64,
    pub image: ImageHandle,
    /// Fill used when the frame was composited, `None` for native draws.
    pub fill: Option<FillColor>,
}

impl Frame {
    /// Seconds with two decimals, as shown next to a thumbnail.
    pub fn timestamp_label(&self) -> String {
        timestamp_label(self.timestamp_sec)
    }

    /// File name used when a single frame is downloaded.
    pub fn download_name(&self) -> String {
        self.file_name(ExportNaming::Download)
    }

    /// Entry name used inside a bulk archive.
    pub fn archive_entry_name(&self) -> String {
        self.file_name(ExportNaming::Archive)
    }
}

/// Complete, immutable result of one sampling run.
///
/// Indices run `1..=len` without gaps, timestamps increase with them.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Rebuild a sequence from frames, checking that indices run `1..=len` and timestamps do
    /// not decrease. An empty sequence is valid but cannot be merged or previewed.
    pub fn from_frames(frames: Vec<Frame>) -> FramestripResult<Self> {
        for (pos, frame) in frames.iter().enumerate() {
            if frame.index as usize != pos + 1 {
                return Err(FramestripError::validation(format!(
                    "frame at position {pos} has index {}, expected {}",
                    frame.index,
                    pos + 1
                )));
            }
        }
        if frames
            .windows(2)
            .any(|w| w[1].timestamp_sec < w[0].timestamp_sec)
        {
            return Err(FramestripError::validation(
                "frame timestamps must not decrease",
            ));
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Frame> {
        self.frames.get(i)
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.timestamp_sec).collect()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Receives sampling progress as a whole percentage, once per captured frame.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Progress sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// `round(100 * done / total)`.
pub fn progress_percent(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    ((f64::from(done) * 100.0 / f64::from(total)).round() as u32).min(100) as u8
}

/// Timestamp of 0-based sample `i` out of `frame_count` over `duration_sec`.
pub fn sample_time(i: u32, frame_count: u32, duration_sec: f64) -> f64 {
    f64::from(i) * (duration_sec / f64::from(frame_count))
}

/// Shared flag that stops a sampling run at the next frame boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Sampler configuration shared by every run.
#[derive(Clone, Debug)]
pub struct SamplerOpts {
    /// Canvas used when crop settings are supplied.
    pub canvas: Canvas,
    pub jpeg_quality: u8,
    pub cancel: Option<CancelToken>,
}

impl Default for SamplerOpts {
    fn default() -> Self {
        Self {
            canvas: CANONICAL_CANVAS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            cancel: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameSampler {
    opts: SamplerOpts,
}

impl FrameSampler {
    pub fn new(opts: SamplerOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &SamplerOpts {
        &self.opts
    }

    /// Capture `frame_count` frames evenly spaced from `t = 0` over the session's duration.
    ///
    /// Captures run strictly one after another on the session's single timeline. Any failure
    /// aborts the run and discards what was captured so far.
    #[tracing::instrument(
        skip(self, session, crop, progress),
        fields(duration_sec = tracing::field::Empty)
    )]
    pub fn sample<S, P>(
        &self,
        session: &mut S,
        frame_count: u32,
        crop: Option<&CropSettings>,
        progress: &mut P,
    ) -> FramestripResult<FrameSequence>
    where
        S: DecodeSession + ?Sized,
        P: ProgressSink + ?Sized,
    {
        if frame_count == 0 {
            return Err(FramestripError::validation("frame count must be > 0"));
        }
        if let Some(crop) = crop {
            crop.validate()?;
            self.opts.canvas.validate()?;
        }

        let info = session.info().clone();
        info.ensure_sampleable()?;
        tracing::Span::current().record("duration_sec", info.duration_sec);

        let mut frames = Vec::with_capacity(frame_count as usize);
        for i in 0..frame_count {
            if let Some(cancel) = &self.opts.cancel
                && cancel.is_cancelled()
            {
                tracing::info!(next_index = i + 1, "sampling cancelled");
                return Err(FramestripError::Cancelled { next_index: i + 1 });
            }

            let timestamp_sec = sample_time(i, frame_count, info.duration_sec);
            let raw = session.seek_frame(timestamp_sec)?;

            let surface = match crop {
                Some(crop) => composite_crop(&raw, crop, self.opts.canvas)?,
                None => Surface::from_image(raw)?,
            };
            let image = surface.encode_jpeg(self.opts.jpeg_quality)?;

            tracing::debug!(index = i + 1, timestamp_sec, "captured frame");
            frames.push(Frame {
                index: i + 1,
                timestamp_sec,
                image,
                fill: crop.map(|c| c.fill),
            });
            progress.report(progress_percent(i + 1, frame_count));
        }

        tracing::info!(frames = frames.len(), "sampled sequence");
        Ok(FrameSequence { frames })
    }
}
