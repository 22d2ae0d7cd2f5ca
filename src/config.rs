//! JSON job configuration.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{CANONICAL_CANVAS, Canvas, CropSettings, DEFAULT_JPEG_QUALITY, PRINT_CANVAS},
        error::{FramestripError, FramestripResult},
    },
    merge::MergerOpts,
    sample::SamplerOpts,
    validate::SourceLimits,
};

/// Everything a sampling or dual-merge job needs besides its sources.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct JobConfig {
    pub frame_count: u32,
    /// Absent means frames are drawn at native resolution.
    pub crop: Option<CropSettings>,
    pub canvas: Canvas,
    pub merge_canvas: Canvas,
    pub jpeg_quality: u8,
    pub limits: SourceLimits,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            frame_count: 30,
            crop: None,
            canvas: CANONICAL_CANVAS,
            merge_canvas: PRINT_CANVAS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            limits: SourceLimits::default(),
        }
    }
}

impl JobConfig {
    pub fn from_json_path(path: &Path) -> FramestripResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FramestripResult<()> {
        if self.frame_count == 0 {
            return Err(FramestripError::validation("frame_count must be > 0"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FramestripError::validation(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        self.canvas.validate()?;
        self.merge_canvas.validate()?;
        if let Some(crop) = &self.crop {
            crop.validate()?;
        }
        self.limits.validate()
    }

    pub fn sampler_opts(&self) -> SamplerOpts {
        SamplerOpts {
            canvas: self.canvas,
            jpeg_quality: self.jpeg_quality,
            cancel: None,
        }
    }

    pub fn merger_opts(&self) -> MergerOpts {
        MergerOpts {
            canvas: self.merge_canvas,
            jpeg_quality: self.jpeg_quality,
        }
    }
}
