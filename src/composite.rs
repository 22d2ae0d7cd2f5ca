//! Crop compositor: reposition a raw frame on a fixed canvas over a solid fill.

use image::RgbaImage;

use crate::{
    foundation::{
        core::{Canvas, CropSettings, Point, Rect, Size},
        error::FramestripResult,
    },
    raster::Surface,
};

/// Where a `native`-sized frame lands on `canvas` under `crop`.
///
/// The frame is scaled about its own size, centered on the canvas, then shifted by the crop
/// offset. The rectangle may extend past the canvas edges.
pub fn crop_dest_rect(native: Canvas, crop: &CropSettings, canvas: Canvas) -> Rect {
    let scaled = Size::new(
        f64::from(native.width) * crop.scale,
        f64::from(native.height) * crop.scale,
    );
    let canvas = canvas.as_size();
    let origin = Point::new(
        (canvas.width - scaled.width) / 2.0,
        (canvas.height - scaled.height) / 2.0,
    ) + crop.offset();
    Rect::from_origin_size(origin, scaled)
}

/// Draw `frame` onto a fresh `canvas`-sized surface filled with `crop.fill`.
pub fn composite_crop(
    frame: &RgbaImage,
    crop: &CropSettings,
    canvas: Canvas,
) -> FramestripResult<Surface> {
    crop.validate()?;
    let mut surface = Surface::new(canvas)?;
    surface.fill(crop.fill.rgba());

    let native = Canvas {
        width: frame.width(),
        height: frame.height(),
    };
    surface.draw_image(frame, crop_dest_rect(native, crop, canvas));
    Ok(surface)
}
