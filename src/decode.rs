//! Turning user-supplied image bytes into a [`RasterImage`].

use crate::config::IconConfig;
use crate::error::Result;
use crate::raster::RasterImage;
use image::ImageReader;
use log::{debug, info};
use std::io::Cursor;

//===========================================================================//

/// Returns true if `mime` names an image type (`image/*`).  Callers use this
/// to reject non-image files before attempting to decode them.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Reads just enough of the encoded image to determine its size.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    probe_with_config(bytes, &IconConfig::default())
}

/// Decodes PNG, JPEG, WEBP, GIF, BMP or ICO bytes into an RGBA raster using
/// the default limits.
pub fn decode(bytes: &[u8]) -> Result<RasterImage> {
    decode_with_config(bytes, &IconConfig::default())
}

/// Decodes image bytes into an RGBA raster, enforcing the size limits in
/// `config`.  Returns an error if the bytes are not a supported image, if
/// they are malformed, or if the image is empty or too large.
pub fn decode_with_config(
    bytes: &[u8],
    config: &IconConfig,
) -> Result<RasterImage> {
    let (header_width, header_height) = probe_with_config(bytes, config)?;
    debug!(
        "Source header reports {}x{} ({} bytes)",
        header_width,
        header_height,
        bytes.len()
    );
    let decoded = match open_reader(bytes, config)?.decode() {
        Ok(decoded) => decoded,
        Err(error) => decode_error!("Malformed image data: {}", error),
    };
    let rgba = decoded.into_rgba8();
    let (width, height) = rgba.dimensions();
    check_dimensions(width, height, config)?;
    info!("Decoded {}x{} source image", width, height);
    Ok(RasterImage::from_rgba_data(width, height, rgba.into_raw()))
}

fn probe_with_config(bytes: &[u8], config: &IconConfig) -> Result<(u32, u32)> {
    let (width, height) = match open_reader(bytes, config)?.into_dimensions()
    {
        Ok(dimensions) => dimensions,
        Err(error) => decode_error!("Unable to read image size: {}", error),
    };
    check_dimensions(width, height, config)?;
    Ok((width, height))
}

fn open_reader<'a>(
    bytes: &'a [u8],
    config: &IconConfig,
) -> Result<ImageReader<Cursor<&'a [u8]>>> {
    if bytes.is_empty() {
        decode_error!("Source image is empty");
    }
    if (bytes.len() as u64) > config.max_file_size {
        decode_error!(
            "Source image is too large (was {} bytes, but max is {})",
            bytes.len(),
            config.max_file_size
        );
    }
    let mut reader = match ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
    {
        Ok(reader) => reader,
        Err(error) => decode_error!("Unable to read image header: {}", error),
    };
    if reader.format().is_none() {
        decode_error!("Unrecognized image format");
    }
    let mut limits = image::Limits::default();
    limits.max_image_width = Some(config.max_dimension);
    limits.max_image_height = Some(config.max_dimension);
    reader.limits(limits);
    Ok(reader)
}

fn check_dimensions(width: u32, height: u32, config: &IconConfig) -> Result<()> {
    if width == 0 || height == 0 {
        decode_error!("Image has zero area ({}x{})", width, height);
    }
    if width > config.max_dimension || height > config.max_dimension {
        decode_error!(
            "Image is too large ({}x{}, but max side is {})",
            width,
            height,
            config.max_dimension
        );
    }
    let num_pixels = (width as u64) * (height as u64);
    if num_pixels > config.max_decoded_pixels {
        decode_error!(
            "Image has too many pixels (was {}, but max is {})",
            num_pixels,
            config.max_decoded_pixels
        );
    }
    Ok(())
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{decode, decode_with_config, is_image_mime, probe_dimensions};
    use crate::config::IconConfig;
    use crate::error::Error;
    use crate::raster::RasterImage;

    #[test]
    fn mime_prefilter() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime(" Image/WEBP"));
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn decode_png_bytes() {
        let source = RasterImage::filled(7, 5, [10, 20, 30, 40]);
        let png = source.to_png().unwrap();
        assert_eq!(probe_dimensions(&png).unwrap(), (7, 5));
        let decoded = decode(&png).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn decode_rejects_empty_and_garbage_input() {
        assert!(matches!(decode(b""), Err(Error::Decode(_))));
        assert!(matches!(
            decode(b"this is a text file, not a picture"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_truncated_png() {
        let png = RasterImage::filled(32, 32, [1, 2, 3, 255]).to_png().unwrap();
        let truncated = &png[..png.len() / 2];
        assert!(matches!(decode(truncated), Err(Error::Decode(_))));
    }

    #[test]
    fn decode_enforces_limits() {
        let png = RasterImage::filled(40, 10, [0, 0, 0, 255]).to_png().unwrap();
        let mut config = IconConfig::default();
        config.max_dimension = 32;
        assert!(matches!(
            decode_with_config(&png, &config),
            Err(Error::Decode(_))
        ));
        let mut config = IconConfig::default();
        config.max_decoded_pixels = 399;
        assert!(matches!(
            decode_with_config(&png, &config),
            Err(Error::Decode(_))
        ));
        let mut config = IconConfig::default();
        config.max_file_size = 8;
        assert!(matches!(
            decode_with_config(&png, &config),
            Err(Error::Decode(_))
        ));
    }
}

//===========================================================================//
