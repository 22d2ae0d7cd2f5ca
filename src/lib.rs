//! framestrip turns short video clips into evenly spaced still frames.
//!
//! - Open a [`DecodeSession`] over a source ([`FfmpegSession`] for files)
//! - Sample it into a [`FrameSequence`] with a [`FrameSampler`], optionally repositioning each
//!   frame on a fixed canvas via [`CropSettings`]
//! - For two sources, join both sequences with a [`DualMerger`] into side-by-side composites
//! - Loop the result with a [`PreviewPlayer`] or write it out with [`export_frames`]
#![forbid(unsafe_code)]

mod foundation;
mod media;

pub mod composite;
pub mod config;
pub mod export;
pub mod merge;
pub mod pipeline;
pub mod preview;
pub mod raster;
pub mod sample;
pub mod validate;

pub use crate::foundation::core::{
    Affine, CANONICAL_CANVAS, Canvas, CropSettings, DEFAULT_JPEG_QUALITY, FRAME_COUNT_PRESETS,
    FillColor, PRINT_CANVAS, Point, Rect, Size, Vec2,
};
pub use crate::foundation::error::{FramestripError, FramestripResult};

pub use crate::composite::{composite_crop, crop_dest_rect};
pub use crate::config::JobConfig;
pub use crate::export::{
    ExportFrame, ExportNaming, archive_entries, export_frames, timestamp_label, write_manifest,
};
pub use crate::media::ffmpeg::{FfmpegSession, is_ffmpeg_on_path, probe_video};
pub use crate::media::scripted::{ScriptedSession, position_color};
pub use crate::media::session::{DecodeSession, VideoInfo};
pub use crate::merge::{
    DualMerger, MergedFrame, MergedFrameSequence, MergerOpts, concat_horizontal, rotate_quarter_cw,
};
pub use crate::pipeline::{DualOutcome, DualSlots, Pipeline, SourceSlot};
pub use crate::preview::{
    PlaybackState, PreviewClock, PreviewPlayer, PreviewSnapshot, preview_duration,
};
pub use crate::raster::{ImageHandle, Surface};
pub use crate::sample::{
    CancelToken, Frame, FrameSampler, FrameSequence, NoProgress, ProgressSink, SamplerOpts,
    progress_percent, sample_time,
};
pub use crate::validate::SourceLimits;
