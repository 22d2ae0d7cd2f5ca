//! Writing sampled or merged frames to disk.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::FramestripResult,
    merge::MergedFrame,
    raster::ImageHandle,
    sample::Frame,
};

/// File naming used when frames are written out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportNaming {
    /// `frame-{index}.jpg`, as for a single download.
    #[default]
    Download,
    /// `{index}.jpg`, as inside a bulk archive.
    Archive,
}

/// Anything with an index, a timestamp and an encoded image.
pub trait ExportFrame {
    fn index(&self) -> u32;
    fn timestamp_sec(&self) -> f64;
    fn image(&self) -> &ImageHandle;

    fn file_name(&self, naming: ExportNaming) -> String {
        match naming {
            ExportNaming::Download => format!("frame-{}.jpg", self.index()),
            ExportNaming::Archive => format!("{}.jpg", self.index()),
        }
    }
}

impl ExportFrame for Frame {
    fn index(&self) -> u32 {
        self.index
    }

    fn timestamp_sec(&self) -> f64 {
        self.timestamp_sec
    }

    fn image(&self) -> &ImageHandle {
        &self.image
    }
}

impl ExportFrame for MergedFrame {
    fn index(&self) -> u32 {
        self.index
    }

    fn timestamp_sec(&self) -> f64 {
        self.timestamp_sec
    }

    fn image(&self) -> &ImageHandle {
        &self.image
    }
}

/// Seconds with two decimals, halves rounded away from zero (`0.125` reads `0.13`).
pub fn timestamp_label(timestamp_sec: f64) -> String {
    format!("{:.2}", (timestamp_sec * 100.0).round() / 100.0)
}

/// `(name, bytes)` pairs ready for an external archiver.
pub fn archive_entries<F: ExportFrame>(frames: &[F]) -> Vec<(String, &[u8])> {
    frames
        .iter()
        .map(|f| (f.file_name(ExportNaming::Archive), f.image().bytes()))
        .collect()
}

/// Write every frame's encoded bytes into `dir`, creating it when missing.
pub fn export_frames<F: ExportFrame>(
    dir: &Path,
    frames: &[F],
    naming: ExportNaming,
) -> FramestripResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;

    let mut written = Vec::with_capacity(frames.len());
    for frame in frames {
        let path = dir.join(frame.file_name(naming));
        std::fs::write(&path, frame.image().bytes())
            .with_context(|| format!("write frame '{}'", path.display()))?;
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), frames = written.len(), "exported frames");
    Ok(written)
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    index: u32,
    timestamp_sec: f64,
    timestamp: String,
    file: String,
    width: u32,
    height: u32,
}

/// Write `frames.json` describing the exported files.
pub fn write_manifest<F: ExportFrame>(
    dir: &Path,
    frames: &[F],
    naming: ExportNaming,
) -> FramestripResult<PathBuf> {
    let entries: Vec<ManifestEntry> = frames
        .iter()
        .map(|f| ManifestEntry {
            index: f.index(),
            timestamp_sec: f.timestamp_sec(),
            timestamp: timestamp_label(f.timestamp_sec()),
            file: f.file_name(naming),
            width: f.image().canvas().width,
            height: f.image().canvas().height,
        })
        .collect();

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    let path = dir.join("frames.json");
    let json = serde_json::to_vec_pretty(&entries).context("serialize frame manifest")?;
    std::fs::write(&path, json).with_context(|| format!("write '{}'", path.display()))?;
    Ok(path)
}
