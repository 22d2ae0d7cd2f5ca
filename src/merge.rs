//! Dual merger: pair two sequences frame by frame into rotated side-by-side composites.

use std::f64::consts::FRAC_PI_2;

use image::RgbaImage;

use crate::{
    export::{ExportFrame, ExportNaming, timestamp_label},
    foundation::{
        core::{Affine, Canvas, DEFAULT_JPEG_QUALITY, PRINT_CANVAS, Point, Rect, Vec2},
        error::{FramestripError, FramestripResult},
    },
    raster::{ImageHandle, Surface},
    sample::{Frame, FrameSequence},
};

/// One side-by-side composite. Index and timestamp come from the first source.
#[derive(Clone, Debug)]
pub struct MergedFrame {
    pub index: u32,
    pub timestamp_sec: f64,
    pub image: ImageHandle,
}

impl MergedFrame {
    pub fn timestamp_label(&self) -> String {
        timestamp_label(self.timestamp_sec)
    }

    pub fn download_name(&self) -> String {
        self.file_name(ExportNaming::Download)
    }

    pub fn archive_entry_name(&self) -> String {
        self.file_name(ExportNaming::Archive)
    }
}

#[derive(Clone, Debug)]
pub struct MergedFrameSequence {
    frames: Vec<MergedFrame>,
}

impl MergedFrameSequence {
    pub fn frames(&self) -> &[MergedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<MergedFrame> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a MergedFrameSequence {
    type Item = &'a MergedFrame;
    type IntoIter = std::slice::Iter<'a, MergedFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MergerOpts {
    /// Final size every composite is stretched to.
    pub canvas: Canvas,
    pub jpeg_quality: u8,
}

impl Default for MergerOpts {
    fn default() -> Self {
        Self {
            canvas: PRINT_CANVAS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DualMerger {
    opts: MergerOpts,
}

impl DualMerger {
    pub fn new(opts: MergerOpts) -> Self {
        Self { opts }
    }

    /// Merge `first` and `second` pair by pair.
    ///
    /// Pairs beyond the shorter sequence are dropped without error.
    #[tracing::instrument(skip_all, fields(first = first.len(), second = second.len()))]
    pub fn merge(
        &self,
        first: &FrameSequence,
        second: &FrameSequence,
    ) -> FramestripResult<MergedFrameSequence> {
        if first.is_empty() || second.is_empty() {
            return Err(FramestripError::merge(format!(
                "both sequences must be non-empty (got {} and {})",
                first.len(),
                second.len()
            )));
        }
        self.opts.canvas.validate()?;
        if first.len() != second.len() {
            tracing::warn!(
                first = first.len(),
                second = second.len(),
                "sequence lengths differ, truncating to the shorter one"
            );
        }

        let frames = first
            .frames()
            .iter()
            .zip(second.frames())
            .map(|(a, b)| self.merge_pair(a, b))
            .collect::<FramestripResult<Vec<_>>>()?;

        tracing::info!(frames = frames.len(), "merged sequence");
        Ok(MergedFrameSequence { frames })
    }

    fn merge_pair(&self, a: &Frame, b: &Frame) -> FramestripResult<MergedFrame> {
        let (raw_a, raw_b) = decode_both(&a.image, &b.image)?;

        let joined = concat_horizontal(&rotate_quarter_cw(&raw_a), &rotate_quarter_cw(&raw_b))?;
        let image = joined
            .resized(self.opts.canvas)?
            .encode_jpeg(self.opts.jpeg_quality)?;

        tracing::debug!(index = a.index, "merged frame pair");
        Ok(MergedFrame {
            index: a.index,
            timestamp_sec: a.timestamp_sec,
            image,
        })
    }
}

/// Decode both handles, the second on a scoped worker while the first decodes here.
fn decode_both(a: &ImageHandle, b: &ImageHandle) -> FramestripResult<(RgbaImage, RgbaImage)> {
    std::thread::scope(|scope| -> FramestripResult<(RgbaImage, RgbaImage)> {
        let worker = scope.spawn(|| b.decode());
        let raw_a = a.decode();
        let raw_b = worker
            .join()
            .map_err(|_| FramestripError::merge("frame decode worker panicked"))?;
        Ok((raw_a?, raw_b?))
    })
}

/// Rotate 90 degrees clockwise; the result is `height x width`.
///
/// Maps through translate-to-new-center, rotate by pi/2, offset by minus half the source size,
/// sampling each destination pixel center from the source.
pub fn rotate_quarter_cw(src: &RgbaImage) -> RgbaImage {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return RgbaImage::new(h, w);
    }

    let forward = Affine::translate(Vec2::new(f64::from(h) / 2.0, f64::from(w) / 2.0))
        * Affine::rotate(FRAC_PI_2)
        * Affine::translate(Vec2::new(-f64::from(w) / 2.0, -f64::from(h) / 2.0));
    let inverse = forward.inverse();

    let max_x = f64::from(w - 1);
    let max_y = f64::from(h - 1);
    RgbaImage::from_fn(h, w, |x, y| {
        let p = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        let sx = p.x.floor().clamp(0.0, max_x) as u32;
        let sy = p.y.floor().clamp(0.0, max_y) as u32;
        *src.get_pixel(sx, sy)
    })
}

/// Place `left` at the origin and `right` directly beside it.
///
/// The surface is as tall as the taller input; uncovered pixels stay transparent.
pub fn concat_horizontal(left: &RgbaImage, right: &RgbaImage) -> FramestripResult<Surface> {
    let canvas = Canvas {
        width: left.width() + right.width(),
        height: left.height().max(right.height()),
    };
    let mut surface = Surface::new(canvas)?;

    let lw = f64::from(left.width());
    surface.draw_image(left, Rect::new(0.0, 0.0, lw, f64::from(left.height())));
    surface.draw_image(
        right,
        Rect::new(
            lw,
            0.0,
            lw + f64::from(right.width()),
            f64::from(right.height()),
        ),
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::imageops;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8 * 10, y as u8 * 10, 7, 255]))
    }

    #[test]
    fn rotation_swaps_dimensions_and_twice_restores_them() {
        let src = gradient(7, 3);
        let once = rotate_quarter_cw(&src);
        assert_eq!(once.dimensions(), (3, 7));
        let twice = rotate_quarter_cw(&once);
        assert_eq!(twice.dimensions(), (7, 3));
    }

    #[test]
    fn rotation_is_clockwise() {
        let src = gradient(5, 4);
        let rotated = rotate_quarter_cw(&src);
        assert_eq!(rotated, imageops::rotate90(&src));
        // Top-left of the source ends up top-right.
        assert_eq!(rotated.get_pixel(3, 0), src.get_pixel(0, 0));
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let src = gradient(6, 9);
        let mut img = src.clone();
        for _ in 0..4 {
            img = rotate_quarter_cw(&img);
        }
        assert_eq!(img, src);
    }

    #[test]
    fn concat_places_right_image_after_left() {
        let left = RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let right = RgbaImage::from_pixel(2, 4, image::Rgba([0, 0, 255, 255]));
        let joined = concat_horizontal(&left, &right).unwrap();
        let img = joined.image();
        assert_eq!(img.dimensions(), (5, 4));
        assert_eq!(img.get_pixel(2, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 3).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(3, 3).0, [0, 0, 255, 255]);
    }
}
