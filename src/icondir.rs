use crate::error::Result;
use crate::raster::RasterImage;
use crate::sizes::MAX_ICON_SIZE;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

//===========================================================================//

// The signature that all PNG files start with.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

// Sizes of the ICONDIR header and of each ICONDIRENTRY, in bytes.
const ICONDIR_LEN: u32 = 6;
const ICONDIRENTRY_LEN: u32 = 16;

// The ICONDIR type field of an icon (as opposed to a cursor, which is 2).
const ICON_RESOURCE_TYPE: u16 = 1;

// Fixed ICONDIRENTRY fields for true-color PNG payloads.
const COLOR_PLANES: u16 = 1;
const BITS_PER_PIXEL: u16 = 32;

//===========================================================================//

/// One rendered icon resolution: its side length and the PNG bytes that
/// will be embedded in the ICO file.
#[derive(Clone, Eq, PartialEq)]
pub struct IconImageEntry {
    size: u32,
    png_data: Vec<u8>,
}

impl IconImageEntry {
    /// Creates an entry from already-encoded PNG data.  The size is checked
    /// when the entry is encoded into a container.
    pub fn new(size: u32, png_data: Vec<u8>) -> IconImageEntry {
        IconImageEntry { size, png_data }
    }

    /// PNG-encodes a square raster into a new entry.
    pub fn encode(image: &RasterImage) -> Result<IconImageEntry> {
        if image.width() != image.height() {
            invalid_entries!(
                "Icon images must be square (was {}x{})",
                image.width(),
                image.height()
            );
        }
        Ok(IconImageEntry::new(image.width(), image.to_png()?))
    }

    /// Returns the side length of the image, in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the encoded PNG data.
    pub fn png_data(&self) -> &[u8] {
        &self.png_data
    }

    /// Consumes the entry and returns its PNG data.
    pub fn into_png_data(self) -> Vec<u8> {
        self.png_data
    }
}

impl fmt::Debug for IconImageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconImageEntry")
            .field("size", &self.size)
            .field("png_len", &self.png_data.len())
            .finish()
    }
}

//===========================================================================//

/// The bytes of a complete ICO file, along with the sizes of the images it
/// holds (in directory order).
#[derive(Clone, Eq, PartialEq)]
pub struct IcoContainer {
    sizes: Vec<u32>,
    data: Vec<u8>,
}

impl IcoContainer {
    /// Encodes the entries, in order, into a single ICO file whose images are
    /// all stored as PNG.
    ///
    /// Returns an error if `entries` is empty or holds more than 65535
    /// images, if any size is outside of `1..=256`, if any PNG payload is
    /// empty, or if the file would exceed 4 GiB.
    pub fn encode(entries: &[IconImageEntry]) -> Result<IcoContainer> {
        if entries.is_empty() {
            invalid_entries!("An ICO file needs at least one image");
        }
        if entries.len() > (u16::MAX as usize) {
            invalid_entries!(
                "Too many entries (was {}, but max is {})",
                entries.len(),
                u16::MAX
            );
        }
        // Every offset depends on the lengths of all earlier payloads, so
        // lay them all out before writing the directory.
        let mut data_offset =
            ICONDIR_LEN + ICONDIRENTRY_LEN * (entries.len() as u32);
        let mut spans = Vec::<(u32, u32)>::with_capacity(entries.len());
        for entry in entries.iter() {
            if entry.size == 0 || entry.size > MAX_ICON_SIZE {
                invalid_entries!(
                    "Invalid icon size (was {}, but must be between 1 and {})",
                    entry.size,
                    MAX_ICON_SIZE
                );
            }
            if entry.png_data.is_empty() {
                invalid_entries!("Empty PNG data for {}px entry", entry.size);
            }
            let data_size = match u32::try_from(entry.png_data.len()) {
                Ok(data_size) => data_size,
                Err(_) => invalid_entries!(
                    "PNG data for {}px entry is too large ({} bytes)",
                    entry.size,
                    entry.png_data.len()
                ),
            };
            spans.push((data_offset, data_size));
            data_offset = match data_offset.checked_add(data_size) {
                Some(next_offset) => next_offset,
                None => invalid_entries!("ICO file would exceed 4 GiB"),
            };
        }
        let mut data = Vec::<u8>::with_capacity(data_offset as usize);
        data.write_u16::<LittleEndian>(0)?; // reserved
        data.write_u16::<LittleEndian>(ICON_RESOURCE_TYPE)?;
        data.write_u16::<LittleEndian>(entries.len() as u16)?;
        for (entry, &(offset, size)) in entries.iter().zip(spans.iter()) {
            let dimension = dimension_byte(entry.size);
            data.write_u8(dimension)?; // width
            data.write_u8(dimension)?; // height
            data.write_u8(0)?; // no palette
            data.write_u8(0)?; // reserved
            data.write_u16::<LittleEndian>(COLOR_PLANES)?;
            data.write_u16::<LittleEndian>(BITS_PER_PIXEL)?;
            data.write_u32::<LittleEndian>(size)?;
            data.write_u32::<LittleEndian>(offset)?;
        }
        for entry in entries.iter() {
            data.write_all(&entry.png_data)?;
        }
        debug_assert_eq!(data.len(), data_offset as usize);
        debug!(
            "Encoded ICO with {} entries ({} bytes)",
            entries.len(),
            data.len()
        );
        let sizes = entries.iter().map(IconImageEntry::size).collect();
        Ok(IcoContainer { sizes, data })
    }

    /// Returns the encoded ICO file.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the container and returns the encoded ICO file.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the length of the encoded file, in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a container holds at least one image.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of images in the file.
    pub fn entry_count(&self) -> usize {
        self.sizes.len()
    }

    /// Returns the side length of each image, in directory order.
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Writes the ICO file out.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl fmt::Debug for IcoContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IcoContainer")
            .field("sizes", &self.sizes)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Encodes the entries, in order, into a single ICO file.  See
/// [`IcoContainer::encode`].
pub fn encode_ico(entries: &[IconImageEntry]) -> Result<IcoContainer> {
    IcoContainer::encode(entries)
}

/// The ICONDIRENTRY width/height byte for a side length.  A byte of zero
/// stands for 256.
pub(crate) fn dimension_byte(size: u32) -> u8 {
    if size >= MAX_ICON_SIZE {
        0
    } else {
        size as u8
    }
}

//===========================================================================//

/// The parsed directory of an ICO file.
#[derive(Clone, Debug)]
pub struct IconDir {
    entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Returns the entries in this file, in directory order.
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Reads an ICO file into memory.  Cursor files are rejected, as is any
    /// entry whose payload lies outside the file.
    pub fn read<R: Read + Seek>(mut reader: R) -> Result<IconDir> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        if file_len < (ICONDIR_LEN as u64) {
            malformed_ico!("File is too short ({} bytes)", file_len);
        }
        let reserved = reader.read_u16::<LittleEndian>()?;
        if reserved != 0 {
            malformed_ico!(
                "Invalid reserved field value in ICONDIR \
                 (was {}, but must be 0)",
                reserved
            );
        }
        let restype = reader.read_u16::<LittleEndian>()?;
        if restype != ICON_RESOURCE_TYPE {
            malformed_ico!(
                "Invalid resource type (was {}, but must be {})",
                restype,
                ICON_RESOURCE_TYPE
            );
        }
        let num_entries = reader.read_u16::<LittleEndian>()? as usize;
        let directory_end = (ICONDIR_LEN as u64)
            + (ICONDIRENTRY_LEN as u64) * (num_entries as u64);
        if directory_end > file_len {
            malformed_ico!(
                "Directory of {} entries runs past end of file",
                num_entries
            );
        }
        let mut entries = Vec::<IconDirEntry>::with_capacity(num_entries);
        for _ in 0..num_entries {
            let width_byte = reader.read_u8()?;
            let height_byte = reader.read_u8()?;
            let num_colors = reader.read_u8()?;
            let reserved = reader.read_u8()?;
            if reserved != 0 {
                malformed_ico!(
                    "Invalid reserved field value in ICONDIRENTRY \
                     (was {}, but must be 0)",
                    reserved
                );
            }
            let color_planes = reader.read_u16::<LittleEndian>()?;
            let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
            let data_size = reader.read_u32::<LittleEndian>()?;
            let data_offset = reader.read_u32::<LittleEndian>()?;
            let data_end = (data_offset as u64) + (data_size as u64);
            if data_end > file_len {
                malformed_ico!(
                    "Entry data at {}..{} runs past end of file ({} bytes)",
                    data_offset,
                    data_end,
                    file_len
                );
            }
            entries.push(IconDirEntry {
                width_byte,
                height_byte,
                num_colors,
                color_planes,
                bits_per_pixel,
                data_offset,
                data: vec![0u8; data_size as usize],
            });
        }
        for entry in entries.iter_mut() {
            reader.seek(SeekFrom::Start(entry.data_offset as u64))?;
            reader.read_exact(&mut entry.data)?;
        }
        Ok(IconDir { entries })
    }
}

//===========================================================================//

/// One parsed ICONDIRENTRY together with its payload.
#[derive(Clone)]
pub struct IconDirEntry {
    width_byte: u8,
    height_byte: u8,
    num_colors: u8,
    color_planes: u16,
    bits_per_pixel: u16,
    data_offset: u32,
    data: Vec<u8>,
}

impl IconDirEntry {
    /// Returns the width recorded in the directory, in pixels (a zero byte
    /// reads as 256).
    pub fn width(&self) -> u32 {
        dimension_from_byte(self.width_byte)
    }

    /// Returns the height recorded in the directory, in pixels (a zero byte
    /// reads as 256).
    pub fn height(&self) -> u32 {
        dimension_from_byte(self.height_byte)
    }

    /// Returns the raw width byte of the directory entry.
    pub fn width_byte(&self) -> u8 {
        self.width_byte
    }

    /// Returns the raw height byte of the directory entry.
    pub fn height_byte(&self) -> u8 {
        self.height_byte
    }

    /// Returns the palette size (zero for true-color images).
    pub fn num_colors(&self) -> u8 {
        self.num_colors
    }

    /// Returns the color plane count.
    pub fn color_planes(&self) -> u16 {
        self.color_planes
    }

    /// Returns the bits-per-pixel (color depth) of the image.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns the absolute offset of the payload within the file.
    pub fn data_offset(&self) -> u32 {
        self.data_offset
    }

    /// Returns the raw, encoded image data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if the image is encoded as a PNG.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Decodes this entry's PNG payload.  Returns an error if the payload is
    /// not a PNG, can't be decoded, or has the wrong dimensions.
    pub fn decode(&self) -> Result<RasterImage> {
        if !self.is_png() {
            malformed_ico!("Only PNG-encoded entries can be decoded");
        }
        let image = RasterImage::read_png(self.data.as_slice())?;
        if dimension_byte(image.width()) != self.width_byte
            || dimension_byte(image.height()) != self.height_byte
        {
            malformed_ico!(
                "Encoded image has wrong dimensions \
                 (was {}x{}, but should be {}x{})",
                image.width(),
                image.height(),
                self.width(),
                self.height()
            );
        }
        Ok(image)
    }
}

impl fmt::Debug for IconDirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconDirEntry")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("bits_per_pixel", &self.bits_per_pixel)
            .field("data_offset", &self.data_offset)
            .field("data_len", &self.data.len())
            .finish()
    }
}

fn dimension_from_byte(byte: u8) -> u32 {
    if byte == 0 {
        MAX_ICON_SIZE
    } else {
        byte as u32
    }
}

//===========================================================================//


//===========================================================================//
