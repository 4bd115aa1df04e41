use crate::config::PngCompression;
use crate::error::Result;
use std::fmt;
use std::io::{Read, Write};

//===========================================================================//

// Size limits for a raster:
const MIN_WIDTH: u32 = 1;
const MIN_HEIGHT: u32 = 1;

//===========================================================================//

/// A decoded RGBA image with 8 bits per channel.
#[derive(Clone, Eq, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba_data: Vec<u8>,
}

impl RasterImage {
    /// Creates a new image with the given dimensions and RGBA data.  The
    /// `width` and `height` must be nonzero, and `rgba_data` must have `4 *
    /// width * height` bytes and be in row-major order from top to bottom.
    /// Panics if the dimensions are out of range or if `rgba_data` is the
    /// wrong length.
    pub fn from_rgba_data(
        width: u32,
        height: u32,
        rgba_data: Vec<u8>,
    ) -> RasterImage {
        if width < MIN_WIDTH {
            panic!(
                "Invalid width (was {}, but must be at least {})",
                width, MIN_WIDTH
            );
        }
        if height < MIN_HEIGHT {
            panic!(
                "Invalid height (was {}, but must be at least {})",
                height, MIN_HEIGHT
            );
        }
        let expected_data_len = (width as u64) * (height as u64) * 4;
        if (rgba_data.len() as u64) != expected_data_len {
            panic!(
                "Invalid data length (was {}, but must be {} for {}x{} image)",
                rgba_data.len(),
                expected_data_len,
                width,
                height
            );
        }
        RasterImage { width, height, rgba_data }
    }

    /// Creates a new image where every pixel has the given RGBA color.
    /// Panics if either dimension is zero.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> RasterImage {
        let num_pixels = (width as usize) * (height as usize);
        let mut rgba_data = Vec::with_capacity(num_pixels * 4);
        for _ in 0..num_pixels {
            rgba_data.extend_from_slice(&rgba);
        }
        RasterImage::from_rgba_data(width, height, rgba_data)
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the RGBA data for this image, in row-major order from top to
    /// bottom.
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Consumes the image and returns its RGBA data.
    pub fn into_rgba_data(self) -> Vec<u8> {
        self.rgba_data
    }

    /// Returns the RGBA value of the pixel at (`x`, `y`), or `None` if the
    /// coordinates are outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = 4 * ((y as usize) * (self.width as usize) + (x as usize));
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.rgba_data[start..][..4]);
        Some(rgba)
    }

    /// Returns true if any pixel is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.rgba_data.chunks_exact(4).any(|pixel| pixel[3] != u8::MAX)
    }

    /// Decodes an image from a PNG file.  Palette, sub-byte and 16-bit PNGs
    /// are converted to 8-bit RGBA.  Returns an error if the PNG data is
    /// malformed or can't be decoded.
    pub fn read_png<R: Read>(reader: R) -> Result<RasterImage> {
        let mut decoder = png::Decoder::new(reader);
        decoder.set_transformations(
            png::Transformations::EXPAND | png::Transformations::STRIP_16,
        );
        let mut png_reader = match decoder.read_info() {
            Ok(png_reader) => png_reader,
            Err(error) => decode_error!("Malformed PNG data: {}", error),
        };
        let (width, height) = {
            let info = png_reader.info();
            (info.width, info.height)
        };
        if width < MIN_WIDTH {
            decode_error!(
                "Invalid PNG width (was {}, but must be at least {})",
                width,
                MIN_WIDTH
            );
        }
        if height < MIN_HEIGHT {
            decode_error!(
                "Invalid PNG height (was {}, but must be at least {})",
                height,
                MIN_HEIGHT
            );
        }
        let mut buffer = vec![0u8; png_reader.output_buffer_size()];
        let frame = match png_reader.next_frame(&mut buffer) {
            Ok(frame) => frame,
            Err(error) => decode_error!("Malformed PNG data: {}", error),
        };
        if frame.bit_depth != png::BitDepth::Eight {
            decode_error!("Unsupported PNG bit depth: {:?}", frame.bit_depth);
        }
        buffer.truncate(frame.buffer_size());
        let rgba_data = match frame.color_type {
            png::ColorType::Rgba => buffer,
            png::ColorType::Rgb => {
                let mut rgba = Vec::with_capacity(buffer.len() / 3 * 4);
                for rgb in buffer.chunks_exact(3) {
                    rgba.extend_from_slice(rgb);
                    rgba.push(u8::MAX);
                }
                rgba
            }
            png::ColorType::GrayscaleAlpha => {
                let mut rgba = Vec::with_capacity(buffer.len() * 2);
                for pair in buffer.chunks_exact(2) {
                    let (gray, alpha) = (pair[0], pair[1]);
                    rgba.extend_from_slice(&[gray, gray, gray, alpha]);
                }
                rgba
            }
            png::ColorType::Grayscale => {
                let mut rgba = Vec::with_capacity(buffer.len() * 4);
                for gray in buffer.into_iter() {
                    rgba.extend_from_slice(&[gray, gray, gray, u8::MAX]);
                }
                rgba
            }
            png::ColorType::Indexed => {
                // EXPAND should have resolved the palette already.
                decode_error!("Unexpanded indexed PNG data");
            }
        };
        let expected_len = (width as usize) * (height as usize) * 4;
        if rgba_data.len() != expected_len {
            decode_error!(
                "PNG frame has {} bytes, but a {}x{} image needs {}",
                rgba_data.len(),
                width,
                height,
                expected_len
            );
        }
        Ok(RasterImage::from_rgba_data(width, height, rgba_data))
    }

    /// Encodes the image as an 8-bit RGBA PNG file.
    pub fn write_png<W: Write>(&self, writer: W) -> Result<()> {
        self.write_png_with_compression(PngCompression::default(), writer)
    }

    /// Encodes the image as an 8-bit RGBA PNG file using the given
    /// compression level.
    pub fn write_png_with_compression<W: Write>(
        &self,
        compression: PngCompression,
        writer: W,
    ) -> Result<()> {
        match self.write_png_internal(compression, writer) {
            Ok(()) => Ok(()),
            Err(png::EncodingError::IoError(error)) => Err(error.into()),
            Err(png::EncodingError::Format(error)) => {
                encode_error!("PNG format error: {}", error);
            }
            Err(png::EncodingError::LimitsExceeded) => {
                encode_error!("PNG limits exceeded");
            }
            Err(png::EncodingError::Parameter(error)) => {
                encode_error!("PNG parameter error: {}", error);
            }
        }
    }

    /// Encodes the image into a new PNG byte buffer.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.to_png_with_compression(PngCompression::default())
    }

    /// Encodes the image into a new PNG byte buffer using the given
    /// compression level.
    pub fn to_png_with_compression(
        &self,
        compression: PngCompression,
    ) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.write_png_with_compression(compression, &mut data)?;
        Ok(data)
    }

    fn write_png_internal<W: Write>(
        &self,
        compression: PngCompression,
        writer: W,
    ) -> std::result::Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_compression(compression.to_png());
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.rgba_data)?;
        writer.finish()
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgba_len", &self.rgba_data.len())
            .finish()
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::RasterImage;
    use crate::config::PngCompression;

    #[test]
    fn filled_image_has_uniform_pixels() {
        let image = RasterImage::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(image.rgba_data().len(), 24);
        assert_eq!(image.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(image.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.pixel(0, 2), None);
        assert!(image.has_alpha());
    }

    #[test]
    #[should_panic(expected = "Invalid width")]
    fn zero_width_panics() {
        RasterImage::from_rgba_data(0, 1, Vec::new());
    }

    #[test]
    #[should_panic(expected = "Invalid data length")]
    fn wrong_data_length_panics() {
        RasterImage::from_rgba_data(2, 2, vec![0; 15]);
    }

    #[test]
    fn png_starts_with_signature() {
        let image = RasterImage::filled(4, 4, [255, 0, 0, 255]);
        let png = image.to_png().unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn png_round_trip_preserves_alpha() {
        let width = 11;
        let height = 13;
        let mut rgba = Vec::new();
        for index in 0..(width * height) {
            rgba.push(if index % 2 == 0 { 0 } else { 255 });
            rgba.push(if index % 3 == 0 { 0 } else { 255 });
            rgba.push(if index % 5 == 0 { 0 } else { 255 });
            rgba.push(if index % 7 == 0 { 128 } else { 255 });
        }
        let image = RasterImage::from_rgba_data(width, height, rgba.clone());
        for &compression in &[
            PngCompression::Fast,
            PngCompression::Default,
            PngCompression::Best,
        ] {
            let png = image.to_png_with_compression(compression).unwrap();
            let decoded = RasterImage::read_png(png.as_slice()).unwrap();
            assert_eq!(decoded.width(), width);
            assert_eq!(decoded.height(), height);
            assert_eq!(decoded.rgba_data(), rgba.as_slice());
        }
    }

    #[test]
    fn read_png_grayscale() {
        let input: &[u8] = b"\
            \x89\x50\x4e\x47\x0d\x0a\x1a\x0a\x00\x00\x00\x0d\x49\x48\x44\x52\
            \x00\x00\x00\x02\x00\x00\x00\x02\x08\x00\x00\x00\x00\x57\xdd\x52\
            \xf8\x00\x00\x00\x0e\x49\x44\x41\x54\x78\x9c\x63\xb4\x77\x60\xdc\
            \xef\x00\x00\x04\x08\x01\x81\x86\x2e\xc9\x8d\x00\x00\x00\x00\x49\
            \x45\x4e\x44\xae\x42\x60\x82";
        let image = RasterImage::read_png(input).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        let rgba: &[u8] = b"\
            \x3f\x3f\x3f\xff\x7f\x7f\x7f\xff\
            \xbf\xbf\xbf\xff\xff\xff\xff\xff";
        assert_eq!(image.rgba_data(), rgba);
    }

    #[test]
    fn read_png_rejects_garbage() {
        let input: &[u8] = b"definitely not a png";
        assert!(RasterImage::read_png(input).is_err());
    }
}

//===========================================================================//
