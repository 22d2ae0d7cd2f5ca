use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::{
    foundation::error::{FramestripError, FramestripResult},
    media::session::{DecodeSession, VideoInfo},
};

/// Decode session backed by the system `ffprobe`/`ffmpeg` binaries.
///
/// Opening probes metadata once; each seek spawns one `ffmpeg` process that decodes exactly the
/// frame current at the requested time.
#[derive(Debug)]
pub struct FfmpegSession {
    path: PathBuf,
    info: VideoInfo,
}

impl FfmpegSession {
    pub fn open(path: impl AsRef<Path>) -> FramestripResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path)?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration_sec = info.duration_sec,
            "probed video source"
        );
        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DecodeSession for FfmpegSession {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn seek_frame(&mut self, time_sec: f64) -> FramestripResult<RgbaImage> {
        let rgba = decode_frame_rgba8(&self.path, &self.info, time_sec)?;
        RgbaImage::from_raw(self.info.width, self.info.height, rgba).ok_or_else(|| {
            FramestripError::seek(format!(
                "decoded frame at {time_sec:.3}s does not match {}x{}",
                self.info.width, self.info.height
            ))
        })
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> FramestripResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
        #[serde(default)]
        side_data_list: Vec<ProbeSideData>,
        tags: Option<ProbeTags>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeTags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| FramestripError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(FramestripError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| FramestripError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| FramestripError::decode("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| FramestripError::decode("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| FramestripError::decode("missing video height from ffprobe"))?;
    // ffmpeg autorotates on decode, so report the displayed orientation.
    let rotation = video_stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| {
            video_stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
        });
    let (width, height) = display_dimensions(width, height, rotation);

    let fps = video_stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .map(|(num, den)| f64::from(num) / f64::from(den));
    // Container duration first; some muxers only report it per stream.
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN);

    let info = VideoInfo {
        source_path: Some(source_path.to_path_buf()),
        width,
        height,
        duration_sec,
        fps,
    };
    info.ensure_sampleable()?;
    Ok(info)
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> FramestripResult<VideoInfo> {
    Err(FramestripError::decode(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn decode_frame_rgba8(
    source_path: &Path,
    info: &VideoInfo,
    time_sec: f64,
) -> FramestripResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{time_sec:.9}")])
        .arg("-i")
        .arg(source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| FramestripError::seek(format!("failed to run ffmpeg for seek: {e}")))?;

    if !out.status.success() {
        return Err(FramestripError::seek(format!(
            "ffmpeg seek to {time_sec:.3}s failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = info.width as usize * info.height as usize * 4;
    if out.stdout.is_empty() {
        return Err(FramestripError::seek(format!(
            "no frame rendered at {time_sec:.3}s in '{}'",
            source_path.display()
        )));
    }
    if out.stdout.len() < expected_len {
        return Err(FramestripError::seek(format!(
            "decoded frame has invalid size: got {} bytes, expected {expected_len}",
            out.stdout.len()
        )));
    }

    let mut frame = out.stdout;
    frame.truncate(expected_len);
    Ok(frame)
}

#[cfg(not(feature = "media-ffmpeg"))]
fn decode_frame_rgba8(
    _source_path: &Path,
    _info: &VideoInfo,
    _time_sec: f64,
) -> FramestripResult<Vec<u8>> {
    Err(FramestripError::seek(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

/// Coded size as displayed after applying a rotation in degrees.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn display_dimensions(width: u32, height: u32, rotation_deg: Option<f64>) -> (u32, u32) {
    let quarter_turns = rotation_deg
        .filter(|r| r.is_finite())
        .map(|r| (r / 90.0).round().rem_euclid(4.0))
        .unwrap_or(0.0);
    if quarter_turns == 1.0 || quarter_turns == 3.0 {
        (height, width)
    } else {
        (width, height)
    }
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}
