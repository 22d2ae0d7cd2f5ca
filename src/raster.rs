//! Off-screen raster surfaces and the encoded-image handles they produce.

use std::{fmt, io::Cursor, sync::Arc};

use anyhow::Context as _;
use image::{
    ImageFormat, Pixel as _, RgbImage, Rgba, RgbaImage, codecs::jpeg::JpegEncoder, imageops,
};

use crate::foundation::{
    core::{Affine, Canvas, Point, Rect},
    error::{FramestripError, FramestripResult},
};

/// Straight-alpha RGBA8 drawing target.
#[derive(Clone, Debug)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(canvas: Canvas) -> FramestripResult<Self> {
        canvas.validate()?;
        Ok(Self {
            pixels: RgbaImage::new(canvas.width, canvas.height),
        })
    }

    /// Wrap existing pixels without copying.
    pub fn from_image(pixels: RgbaImage) -> FramestripResult<Self> {
        Canvas {
            width: pixels.width(),
            height: pixels.height(),
        }
        .validate()?;
        Ok(Self { pixels })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Overwrite every pixel with `rgba`.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.pixels_mut() {
            px.0 = rgba;
        }
    }

    /// Draw `src` stretched into `dest` (surface pixel coordinates) with source-over blending.
    ///
    /// The destination rectangle is snapped to whole pixels; parts falling outside the surface
    /// are clipped. A rectangle that rounds to zero area draws nothing. Rectangles larger than
    /// both the source and the surface are sampled only over their visible part.
    pub fn draw_image(&mut self, src: &RgbaImage, dest: Rect) {
        let (sw, sh) = src.dimensions();
        if sw == 0 || sh == 0 {
            return;
        }
        let x0 = dest.x0.round();
        let y0 = dest.y0.round();
        let w = (dest.x1.round() - x0).max(0.0);
        let h = (dest.y1.round() - y0).max(0.0);
        if w < 1.0 || h < 1.0 || !w.is_finite() || !h.is_finite() {
            return;
        }

        let budget = (u64::from(sw) * u64::from(sh))
            .max(u64::from(self.pixels.width()) * u64::from(self.pixels.height()));
        let max_side = f64::from(u32::MAX);
        if w * h > budget as f64 || w > max_side || h > max_side {
            self.draw_sampled(src, Rect::new(x0, y0, x0 + w, y0 + h));
            return;
        }

        let (w, h) = (w as u32, h as u32);
        if (w, h) == src.dimensions() {
            imageops::overlay(&mut self.pixels, src, x0 as i64, y0 as i64);
        } else {
            let scaled = imageops::resize(src, w, h, imageops::FilterType::Triangle);
            imageops::overlay(&mut self.pixels, &scaled, x0 as i64, y0 as i64);
        }
    }

    /// Inverse-map every covered surface pixel into `src` and blend a bilinear sample.
    fn draw_sampled(&mut self, src: &RgbaImage, dest: Rect) {
        let (cw, ch) = (f64::from(self.pixels.width()), f64::from(self.pixels.height()));
        let vx0 = dest.x0.clamp(0.0, cw) as u32;
        let vx1 = dest.x1.clamp(0.0, cw) as u32;
        let vy0 = dest.y0.clamp(0.0, ch) as u32;
        let vy1 = dest.y1.clamp(0.0, ch) as u32;
        if vx0 >= vx1 || vy0 >= vy1 {
            return;
        }

        let to_src = Affine::scale_non_uniform(
            f64::from(src.width()) / dest.width(),
            f64::from(src.height()) / dest.height(),
        ) * Affine::translate((-dest.x0, -dest.y0));
        for y in vy0..vy1 {
            for x in vx0..vx1 {
                let p = to_src * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let sample = sample_bilinear(src, p.x - 0.5, p.y - 0.5);
                self.pixels.get_pixel_mut(x, y).blend(&sample);
            }
        }
    }

    /// Stretch the whole surface into a new surface of `canvas` size.
    pub fn resized(&self, canvas: Canvas) -> FramestripResult<Self> {
        canvas.validate()?;
        if canvas == self.canvas() {
            return Ok(self.clone());
        }
        Ok(Self {
            pixels: imageops::resize(
                &self.pixels,
                canvas.width,
                canvas.height,
                imageops::FilterType::Triangle,
            ),
        })
    }

    /// Encode as baseline JPEG, flattening any transparency over black.
    pub fn encode_jpeg(&self, quality: u8) -> FramestripResult<ImageHandle> {
        if !(1..=100).contains(&quality) {
            return Err(FramestripError::encode(format!(
                "jpeg quality must be in 1..=100, got {quality}"
            )));
        }

        let rgb = flatten_over_black(&self.pixels);
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality)
            .encode_image(&rgb)
            .map_err(|e| FramestripError::encode(format!("jpeg encode failed: {e}")))?;

        Ok(ImageHandle::new(EncodedImage {
            bytes,
            canvas: self.canvas(),
            format: ImageFormat::Jpeg,
        }))
    }
}

/// Bilinear sample at pixel-space `(x, y)`, clamping to the edge pixels.
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let x = x.clamp(0.0, f64::from(src.width() - 1));
    let y = y.clamp(0.0, f64::from(src.height() - 1));
    let (fx, fy) = (x.floor(), y.floor());
    let (tx, ty) = (x - fx, y - fy);
    let (x0, y0) = (fx as u32, fy as u32);
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);

    let (a, b) = (src.get_pixel(x0, y0).0, src.get_pixel(x1, y0).0);
    let (c, d) = (src.get_pixel(x0, y1).0, src.get_pixel(x1, y1).0);
    let mut out = [0u8; 4];
    for (i, v) in out.iter_mut().enumerate() {
        let top = f64::from(a[i]) * (1.0 - tx) + f64::from(b[i]) * tx;
        let bottom = f64::from(c[i]) * (1.0 - tx) + f64::from(d[i]) * tx;
        *v = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

fn flatten_over_black(src: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b, a] = src.get_pixel(x, y).0;
        if a == 255 {
            return image::Rgb([r, g, b]);
        }
        let a = u16::from(a);
        image::Rgb([mul_div255(r, a), mul_div255(g, a), mul_div255(b, a)])
    })
}

fn mul_div255(c: u8, a: u16) -> u8 {
    ((u32::from(c) * u32::from(a) + 127) / 255) as u8
}

/// Compressed still image bytes plus their dimensions.
pub struct EncodedImage {
    bytes: Vec<u8>,
    canvas: Canvas,
    format: ImageFormat,
}

/// Shared, reference-counted handle to an encoded image.
///
/// Cloning shares the bytes; the allocation is released when the last handle is dropped, so a
/// sequence releases its images exactly once by being dropped.
#[derive(Clone)]
pub struct ImageHandle(Arc<EncodedImage>);

impl ImageHandle {
    fn new(encoded: EncodedImage) -> Self {
        Self(Arc::new(encoded))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0.bytes
    }

    pub fn canvas(&self) -> Canvas {
        self.0.canvas
    }

    pub fn format(&self) -> ImageFormat {
        self.0.format
    }

    /// Number of live handles sharing these bytes.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Decode back to a drawable raster.
    pub fn decode(&self) -> FramestripResult<RgbaImage> {
        let img = image::load_from_memory_with_format(&self.0.bytes, self.0.format)
            .context("decode encoded frame")?;
        Ok(img.to_rgba8())
    }

    /// Re-encode in another container format (for example PNG for lossless export).
    pub fn transcode(&self, format: ImageFormat) -> FramestripResult<Vec<u8>> {
        if format == self.0.format {
            return Ok(self.0.bytes.clone());
        }
        let img = self.decode()?;
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), format)
            .with_context(|| format!("transcode frame to {format:?}"))?;
        Ok(out)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("format", &self.0.format)
            .field("canvas", &self.0.canvas)
            .field("len", &self.0.bytes.len())
            .finish()
    }
}
