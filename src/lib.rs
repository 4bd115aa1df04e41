//! A library for turning an arbitrary image into ICO icon files.
//!
//! A source image is decoded into a [`RasterImage`], a square
//! [`CropRegion`] of it is resampled to each requested icon size, every size
//! is PNG-encoded, and the PNGs are packaged into ICO files: one file per
//! size, plus one bundle holding every size.
//!
//! # Generating icons
//!
//! ```no_run
//! let bytes = std::fs::read("logo.png").unwrap();
//! let source = icogen::decode(&bytes).unwrap();
//! let crop = icogen::CropRegion::centered(source.width(), source.height());
//! let sizes = icogen::IconSizeSet::from_sizes(vec![16, 32, 48]).unwrap();
//! let icons = icogen::generate(&source, crop, &sizes).unwrap();
//! for icon in icons.per_size() {
//!     let name = icogen::per_size_file_name("logo", icon.size());
//!     std::fs::write(name, icon.container().as_bytes()).unwrap();
//! }
//! std::fs::write("logo.ico", icons.bundle().as_bytes()).unwrap();
//! ```
//!
//! # Building an ICO file from PNG data
//!
//! ```
//! let image = icogen::RasterImage::filled(32, 32, [255, 0, 0, 255]);
//! let entry = icogen::IconImageEntry::encode(&image).unwrap();
//! let container = icogen::encode_ico(&[entry]).unwrap();
//! assert_eq!(&container.as_bytes()[..6], b"\x00\x00\x01\x00\x01\x00");
//! ```
//!
//! # Reading an ICO file
//!
//! ```no_run
//! let file = std::fs::File::open("favicon.ico").unwrap();
//! let icon_dir = icogen::IconDir::read(file).unwrap();
//! for entry in icon_dir.entries() {
//!     println!("{}x{}", entry.width(), entry.height());
//! }
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod config;
mod crop;
mod decode;
mod error;
mod generate;
mod icondir;
mod naming;
mod raster;
mod resample;
mod session;
mod sizes;

pub use crate::config::{IconConfig, PngCompression, ResampleFilter};
pub use crate::crop::CropRegion;
pub use crate::decode::{
    decode, decode_with_config, is_image_mime, probe_dimensions,
};
pub use crate::error::{Error, Result};
pub use crate::generate::{
    generate, generate_with_config, GeneratedIcons, SizedIcon,
};
pub use crate::icondir::{
    encode_ico, IcoContainer, IconDir, IconDirEntry, IconImageEntry,
};
pub use crate::naming::{base_file_name, bundle_file_name, per_size_file_name};
pub use crate::raster::RasterImage;
pub use crate::resample::{render, render_with_filter};
pub use crate::session::{
    BlobHandle, BlobKey, BlobStore, GenerationRequest, GenerationToken,
    IconSession, MemoryBlobStore, PublishedIcons,
};
pub use crate::sizes::{
    IconSizeSet, DEFAULT_SELECTION, MAX_ICON_SIZE, STANDARD_SIZES,
};
