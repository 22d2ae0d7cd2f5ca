use image::RgbaImage;

use crate::{
    foundation::error::{FramestripError, FramestripResult},
    media::session::{DecodeSession, VideoInfo},
};

/// In-memory decode session over pre-rendered frames at a fixed frame rate.
///
/// Seeking to `t` yields frame `floor(t * fps)`, clamped to the last frame. Every seek is
/// recorded so callers can check the order positions were visited in.
#[derive(Debug)]
pub struct ScriptedSession {
    info: VideoInfo,
    frames: Vec<RgbaImage>,
    fail_seek_at: Option<usize>,
    seek_log: Vec<f64>,
}

impl ScriptedSession {
    /// Build a session from frames that all share the first frame's dimensions.
    pub fn new(frames: Vec<RgbaImage>, fps: f64) -> FramestripResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(FramestripError::validation(format!(
                "scripted fps must be finite and > 0, got {fps}"
            )));
        }
        let (width, height) = frames
            .first()
            .map(|f| f.dimensions())
            .ok_or_else(|| FramestripError::decode("scripted source has no frames"))?;
        if frames.iter().any(|f| f.dimensions() != (width, height)) {
            return Err(FramestripError::decode(
                "scripted frames must share one frame size",
            ));
        }

        let info = VideoInfo {
            source_path: None,
            width,
            height,
            duration_sec: frames.len() as f64 / fps,
            fps: Some(fps),
        };
        Ok(Self {
            info,
            frames,
            fail_seek_at: None,
            seek_log: Vec::new(),
        })
    }

    /// `count` frames of `width`x`height`, each a solid color derived from its position.
    pub fn solid_frames(count: usize, width: u32, height: u32, fps: f64) -> FramestripResult<Self> {
        let frames = (0..count)
            .map(|i| RgbaImage::from_pixel(width, height, image::Rgba(position_color(i))))
            .collect();
        Self::new(frames, fps)
    }

    /// Override the reported duration, for sources whose container lies about it.
    pub fn with_duration(mut self, duration_sec: f64) -> Self {
        self.info.duration_sec = duration_sec;
        self
    }

    /// Make the `n`-th seek (0-based) fail with a seek error.
    pub fn fail_seek_at(mut self, n: usize) -> Self {
        self.fail_seek_at = Some(n);
        self
    }

    /// Timestamps requested so far, in call order.
    pub fn seek_log(&self) -> &[f64] {
        &self.seek_log
    }
}

/// Distinct opaque color for frame position `i`.
pub fn position_color(i: usize) -> [u8; 4] {
    let i = i as u32;
    [
        (i.wrapping_mul(53) % 256) as u8,
        (i.wrapping_mul(97).wrapping_add(40) % 256) as u8,
        (i.wrapping_mul(193).wrapping_add(80) % 256) as u8,
        255,
    ]
}

impl DecodeSession for ScriptedSession {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn seek_frame(&mut self, time_sec: f64) -> FramestripResult<RgbaImage> {
        let attempt = self.seek_log.len();
        self.seek_log.push(time_sec);

        if self.fail_seek_at == Some(attempt) {
            return Err(FramestripError::seek(format!(
                "scripted failure at {time_sec:.3}s"
            )));
        }
        if !time_sec.is_finite() || time_sec < 0.0 {
            return Err(FramestripError::seek(format!(
                "cannot seek to {time_sec}s"
            )));
        }

        let fps = self.info.fps.unwrap_or(1.0);
        let idx = ((time_sec * fps).floor() as usize).min(self.frames.len() - 1);
        Ok(self.frames[idx].clone())
    }
}
