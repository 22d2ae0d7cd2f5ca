use std::{fmt, str::FromStr};

use crate::foundation::error::{FramestripError, FramestripResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Canvas the crop compositor draws sampled frames onto.
pub const CANONICAL_CANVAS: Canvas = Canvas {
    width: 480,
    height: 360,
};

/// Output canvas of the dual merger: a 6"x4" print at 96 DPI.
pub const PRINT_CANVAS: Canvas = Canvas {
    width: 576,
    height: 384,
};

/// JPEG quality used for every encoded frame.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Frame counts offered to users, in display order.
pub const FRAME_COUNT_PRESETS: [u32; 3] = [30, 20, 40];

/// Raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated, non-empty canvas.
    pub fn new(width: u32, height: u32) -> FramestripResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    pub fn validate(self) -> FramestripResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FramestripError::validation(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Swap width and height.
    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn as_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Background color painted behind a repositioned frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FillColor {
    #[default]
    Black,
    White,
    /// Arbitrary opaque color, written as `#rrggbb`.
    Rgb(u8, u8, u8),
}

impl FillColor {
    /// Opaque RGBA8 value of this color.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Self::Black => [0, 0, 0, 255],
            Self::White => [255, 255, 255, 255],
            Self::Rgb(r, g, b) => [r, g, b, 255],
        }
    }
}

impl FromStr for FillColor {
    type Err = FramestripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("black") {
            return Ok(Self::Black);
        }
        if s.eq_ignore_ascii_case("white") {
            return Ok(Self::White);
        }

        let bad = || {
            FramestripError::validation(format!(
                "fill color must be 'black', 'white' or '#rrggbb', got '{s}'"
            ))
        };
        let hex = s.strip_prefix('#').ok_or_else(bad)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        Ok(Self::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for FillColor {
    type Error = FramestripError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FillColor> for String {
    fn from(value: FillColor) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => f.write_str("black"),
            Self::White => f.write_str("white"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// How a raw frame is repositioned onto the canonical canvas.
///
/// The frame is centered, scaled by `scale`, then nudged by `(offset_x, offset_y)` pixels. Areas
/// the frame does not cover are painted with `fill`. No source pixels are cut away.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CropSettings {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub fill: FillColor,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            fill: FillColor::Black,
        }
    }
}

impl CropSettings {
    pub fn validate(&self) -> FramestripResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(FramestripError::validation(format!(
                "crop scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        if !self.offset_x.is_finite() || !self.offset_y.is_finite() {
            return Err(FramestripError::validation("crop offsets must be finite"));
        }
        Ok(())
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x, self.offset_y)
    }
}
