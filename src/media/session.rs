use std::path::PathBuf;

use image::RgbaImage;

use crate::foundation::{
    core::Canvas,
    error::{FramestripError, FramestripResult},
};

/// Metadata of a loaded video source.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VideoInfo {
    /// Where the bytes came from, if they live on disk.
    pub source_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub duration_sec: f64,
    /// Nominal frame rate, when the container reports one.
    pub fps: Option<f64>,
}

impl VideoInfo {
    pub fn native_canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Reject sources whose metadata cannot drive uniform sampling.
    pub fn ensure_sampleable(&self) -> FramestripResult<()> {
        if !self.duration_sec.is_finite() || self.duration_sec <= 0.0 {
            return Err(FramestripError::decode(format!(
                "source duration must be finite and > 0, got {}",
                self.duration_sec
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(FramestripError::decode(format!(
                "source has empty frame size {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Exclusive handle on one decode timeline.
///
/// A session has exactly one current position. `seek_frame` takes `&mut self`, so a caller cannot
/// issue a second seek while one is outstanding; sampling over a session is sequential by
/// construction. Metadata is loaded when the session is opened.
pub trait DecodeSession: Send {
    /// Metadata loaded when the session was opened.
    fn info(&self) -> &VideoInfo;

    /// Move the timeline to `time_sec` and return the frame that is current there.
    ///
    /// Failing to produce a frame is a [`FramestripError::Seek`].
    fn seek_frame(&mut self, time_sec: f64) -> FramestripResult<RgbaImage>;
}

impl<S: DecodeSession + ?Sized> DecodeSession for Box<S> {
    fn info(&self) -> &VideoInfo {
        (**self).info()
    }

    fn seek_frame(&mut self, time_sec: f64) -> FramestripResult<RgbaImage> {
        (**self).seek_frame(time_sec)
    }
}
