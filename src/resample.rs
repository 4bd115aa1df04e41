//! Cropping a square out of a source raster and scaling it to an icon size.

use crate::config::ResampleFilter;
use crate::crop::CropRegion;
use crate::error::{Error, Result};
use crate::raster::RasterImage;
use crate::sizes::validate_size;
use fast_image_resize as fr;
use std::fmt;

//===========================================================================//

/// Renders the `crop` region of `source` as a `target_side`x`target_side`
/// image using bilinear filtering.
pub fn render(
    source: &RasterImage,
    crop: CropRegion,
    target_side: u32,
) -> Result<RasterImage> {
    render_with_filter(source, crop, target_side, ResampleFilter::default())
}

/// Renders the `crop` region of `source` as a `target_side`x`target_side`
/// image.  Color channels are weighted by alpha while filtering, so
/// transparent pixels don't bleed their color into their neighbors.
///
/// The crop must already lie inside the source; it is never clamped here.
pub fn render_with_filter(
    source: &RasterImage,
    crop: CropRegion,
    target_side: u32,
    filter: ResampleFilter,
) -> Result<RasterImage> {
    crop.validate(source.width(), source.height())?;
    validate_size(target_side)?;
    let src_image = fr::images::ImageRef::new(
        source.width(),
        source.height(),
        source.rgba_data(),
        fr::PixelType::U8x4,
    )
    .map_err(|error| resampler_error("source buffer", error))?;
    let mut dst_image =
        fr::images::Image::new(target_side, target_side, fr::PixelType::U8x4);
    let options = fr::ResizeOptions::new()
        .resize_alg(filter.resize_alg())
        .crop(
            crop.x as f64,
            crop.y as f64,
            crop.side as f64,
            crop.side as f64,
        );
    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|error| resampler_error("resize", error))?;
    Ok(RasterImage::from_rgba_data(
        target_side,
        target_side,
        dst_image.into_vec(),
    ))
}

fn resampler_error<E: fmt::Display>(stage: &str, error: E) -> Error {
    Error::Resample(format!("Resampler {} failed: {}", stage, error))
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{render, render_with_filter, resampler_error};
    use crate::config::ResampleFilter;
    use crate::crop::CropRegion;
    use crate::error::Error;
    use crate::raster::RasterImage;

    // A 4x4 image whose left half is red and right half is blue.
    fn split_image() -> RasterImage {
        let mut rgba = Vec::new();
        for _ in 0..4 {
            for col in 0..4 {
                if col < 2 {
                    rgba.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    rgba.extend_from_slice(&[0, 0, 255, 255]);
                }
            }
        }
        RasterImage::from_rgba_data(4, 4, rgba)
    }

    #[test]
    fn render_rejects_crop_outside_source() {
        let source = RasterImage::filled(40, 100, [0, 0, 0, 255]);
        match render(&source, CropRegion::new(10, 0, 50), 16) {
            Err(Error::InvalidCrop(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn render_rejects_bad_target_size() {
        let source = RasterImage::filled(8, 8, [0, 0, 0, 255]);
        let crop = CropRegion::centered(8, 8);
        assert!(matches!(render(&source, crop, 0), Err(Error::InvalidSize(0))));
        assert!(matches!(
            render(&source, crop, 512),
            Err(Error::InvalidSize(512))
        ));
    }

    #[test]
    fn render_produces_requested_size() {
        let source = RasterImage::filled(300, 200, [9, 8, 7, 255]);
        let crop = CropRegion::centered(300, 200);
        for &side in &[1, 16, 48, 256] {
            let output = render(&source, crop, side).unwrap();
            assert_eq!(output.width(), side);
            assert_eq!(output.height(), side);
        }
    }

    #[test]
    fn render_crops_before_scaling() {
        let source = split_image();
        let left = render_with_filter(
            &source,
            CropRegion::new(0, 0, 2),
            2,
            ResampleFilter::Nearest,
        )
        .unwrap();
        assert_eq!(left, RasterImage::filled(2, 2, [255, 0, 0, 255]));
        let right = render_with_filter(
            &source,
            CropRegion::new(2, 2, 2),
            1,
            ResampleFilter::Nearest,
        )
        .unwrap();
        assert_eq!(right.pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn render_keeps_transparency() {
        let source = RasterImage::filled(64, 64, [0, 0, 0, 0]);
        let output = render(&source, CropRegion::centered(64, 64), 16).unwrap();
        assert!(output.rgba_data().chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn resampler_failures_are_resample_errors() {
        let error = resampler_error("resize", "pixel type mismatch");
        assert!(matches!(error, Error::Resample(_)));
        assert_eq!(
            error.to_string(),
            "Failed to resample image: \
             Resampler resize failed: pixel type mismatch"
        );
    }

    #[test]
    fn render_is_deterministic() {
        let source = split_image();
        let crop = CropRegion::centered(4, 4);
        let first = render(&source, crop, 3).unwrap();
        let second = render(&source, crop, 3).unwrap();
        assert_eq!(first, second);
    }
}

//===========================================================================//
