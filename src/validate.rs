//! Limits a video source must satisfy before it is handed to a sampler.

use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::{FramestripError, FramestripResult},
    media::session::VideoInfo,
};

/// File extensions accepted as video.
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mov", "m4v", "webm", "mkv", "avi", "ogv"];

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceLimits {
    pub max_duration_sec: f64,
    pub max_file_bytes: u64,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            max_duration_sec: 120.0,
            max_file_bytes: 500 * 1024 * 1024,
        }
    }
}

impl SourceLimits {
    pub fn validate(&self) -> FramestripResult<()> {
        if !self.max_duration_sec.is_finite() || self.max_duration_sec <= 0.0 {
            return Err(FramestripError::validation(
                "limits.max_duration_sec must be finite and > 0",
            ));
        }
        if self.max_file_bytes == 0 {
            return Err(FramestripError::validation(
                "limits.max_file_bytes must be > 0",
            ));
        }
        Ok(())
    }

    /// Type and size checks that need no decoding. Returns the file length.
    pub fn check_file(&self, path: &Path) -> FramestripResult<u64> {
        let is_video = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(e)));
        if !is_video {
            return Err(FramestripError::validation(format!(
                "'{}' is not a supported video file",
                path.display()
            )));
        }

        let len = std::fs::metadata(path)
            .with_context(|| format!("stat video '{}'", path.display()))?
            .len();
        if len > self.max_file_bytes {
            return Err(FramestripError::validation(format!(
                "video file is too large (max {}MB)",
                self.max_file_bytes / (1024 * 1024)
            )));
        }
        Ok(len)
    }

    /// Duration check against loaded metadata.
    pub fn check_info(&self, info: &VideoInfo) -> FramestripResult<()> {
        if info.duration_sec > self.max_duration_sec {
            return Err(FramestripError::validation(format!(
                "video duration exceeds {} ({}s)",
                describe_secs(self.max_duration_sec),
                info.duration_sec.round()
            )));
        }
        Ok(())
    }
}

fn describe_secs(secs: f64) -> String {
    if secs >= 60.0 && secs % 60.0 == 0.0 {
        let minutes = secs / 60.0;
        if minutes == 1.0 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else {
        format!("{secs} seconds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(duration_sec: f64) -> VideoInfo {
        VideoInfo {
            source_path: None,
            width: 4,
            height: 4,
            duration_sec,
            fps: None,
        }
    }

    #[test]
    fn duration_limit_reports_rounded_seconds() {
        let limits = SourceLimits::default();
        assert!(limits.check_info(&info(120.0)).is_ok());
        let err = limits.check_info(&info(130.4)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: video duration exceeds 2 minutes (130s)"
        );
    }

    #[test]
    fn rejects_non_video_extension_before_touching_disk() {
        let err = SourceLimits::default()
            .check_file(Path::new("notes.txt"))
            .unwrap_err();
        assert!(matches!(err, FramestripError::Validation(_)));
    }

    #[test]
    fn size_limit_applies_to_file_length() {
        let dir = std::path::PathBuf::from("target").join("validate_size");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tiny.MP4");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let roomy = SourceLimits::default();
        assert_eq!(roomy.check_file(&path).unwrap(), 64);

        let tight = SourceLimits {
            max_file_bytes: 32,
            ..SourceLimits::default()
        };
        assert!(tight.check_file(&path).is_err());
    }

    #[test]
    fn limits_validation() {
        assert!(SourceLimits::default().validate().is_ok());
        let bad = SourceLimits {
            max_duration_sec: 0.0,
            ..SourceLimits::default()
        };
        assert!(bad.validate().is_err());
    }
}
