//! Tunable knobs for decoding, resampling and encoding.

use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//===========================================================================//

/// Settings shared by every stage of a generation pass.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IconConfig {
    /// Largest encoded source file accepted by the decoder, in bytes.
    pub max_file_size: u64,
    /// Largest width or height accepted by the decoder, in pixels.
    pub max_dimension: u32,
    /// Largest `width * height` accepted by the decoder.
    pub max_decoded_pixels: u64,
    /// Resampling filter used for every size of a pass.
    pub filter: ResampleFilter,
    /// Compression level of the embedded PNG payloads.
    pub compression: PngCompression,
    /// Render sizes in parallel.  Only has an effect when the crate is built
    /// with the `multithreading` feature.
    pub multithreaded: bool,
}

impl Default for IconConfig {
    fn default() -> Self {
        IconConfig {
            max_file_size: 50 * 1024 * 1024,
            max_dimension: 16_384,
            max_decoded_pixels: 100_000_000,
            filter: ResampleFilter::default(),
            compression: PngCompression::default(),
            multithreaded: true,
        }
    }
}

impl IconConfig {
    /// Returns a copy of this config using the given resampling filter.
    pub fn with_filter(mut self, filter: ResampleFilter) -> IconConfig {
        self.filter = filter;
        self
    }

    /// Returns a copy of this config using the given PNG compression level.
    pub fn with_compression(mut self, compression: PngCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Returns a copy of this config with parallel rendering switched on or
    /// off.
    pub fn with_multithreading(mut self, enabled: bool) -> IconConfig {
        self.multithreaded = enabled;
        self
    }
}

//===========================================================================//

/// The convolution filter used to scale a crop to an icon size.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ResampleFilter {
    /// Nearest-neighbor sampling; keeps hard pixel edges.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Bilinear,
    /// Catmull-Rom cubic interpolation.
    CatmullRom,
    /// Lanczos with a window of 3.
    Lanczos3,
}

impl ResampleFilter {
    /// Returns the stable lowercase name of this filter.
    pub fn as_str(self) -> &'static str {
        match self {
            ResampleFilter::Nearest => "nearest",
            ResampleFilter::Bilinear => "bilinear",
            ResampleFilter::CatmullRom => "catmullrom",
            ResampleFilter::Lanczos3 => "lanczos3",
        }
    }

    pub(crate) fn resize_alg(self) -> fast_image_resize::ResizeAlg {
        use fast_image_resize::{FilterType, ResizeAlg};
        match self {
            ResampleFilter::Nearest => ResizeAlg::Nearest,
            ResampleFilter::Bilinear => {
                ResizeAlg::Convolution(FilterType::Bilinear)
            }
            ResampleFilter::CatmullRom => {
                ResizeAlg::Convolution(FilterType::CatmullRom)
            }
            ResampleFilter::Lanczos3 => {
                ResizeAlg::Convolution(FilterType::Lanczos3)
            }
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = Error;

    fn from_str(name: &str) -> Result<ResampleFilter> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResampleFilter::Nearest),
            "bilinear" | "triangle" => Ok(ResampleFilter::Bilinear),
            "catmullrom" | "catmull-rom" => Ok(ResampleFilter::CatmullRom),
            "lanczos3" | "lanczos" => Ok(ResampleFilter::Lanczos3),
            other => Err(Error::InvalidConfig(format!(
                "Unknown resample filter {:?} \
                 (expected nearest, bilinear, catmullrom or lanczos3)",
                other
            ))),
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//===========================================================================//

/// Compression level of the PNG payloads stored in an ICO file.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PngCompression {
    /// Fastest encoding, larger files.
    Fast,
    /// The `png` crate's default balance.
    #[default]
    Default,
    /// Smallest files, slowest encoding.
    Best,
}

impl PngCompression {
    /// Returns the stable lowercase name of this level.
    pub fn as_str(self) -> &'static str {
        match self {
            PngCompression::Fast => "fast",
            PngCompression::Default => "default",
            PngCompression::Best => "best",
        }
    }

    pub(crate) fn to_png(self) -> png::Compression {
        match self {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::Default,
            PngCompression::Best => png::Compression::Best,
        }
    }
}

impl FromStr for PngCompression {
    type Err = Error;

    fn from_str(name: &str) -> Result<PngCompression> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(PngCompression::Fast),
            "default" => Ok(PngCompression::Default),
            "best" => Ok(PngCompression::Best),
            other => Err(Error::InvalidConfig(format!(
                "Unknown PNG compression level {:?} \
                 (expected fast, default or best)",
                other
            ))),
        }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{IconConfig, PngCompression, ResampleFilter};

    #[test]
    fn filter_name_round_trip() {
        let filters = &[
            ResampleFilter::Nearest,
            ResampleFilter::Bilinear,
            ResampleFilter::CatmullRom,
            ResampleFilter::Lanczos3,
        ];
        for &filter in filters.iter() {
            assert_eq!(filter.as_str().parse::<ResampleFilter>().unwrap(), filter);
        }
        assert_eq!(
            " Triangle ".parse::<ResampleFilter>().unwrap(),
            ResampleFilter::Bilinear
        );
        assert!("bicubic".parse::<ResampleFilter>().is_err());
    }

    #[test]
    fn compression_name_round_trip() {
        let levels =
            &[PngCompression::Fast, PngCompression::Default, PngCompression::Best];
        for &level in levels.iter() {
            assert_eq!(level.as_str().parse::<PngCompression>().unwrap(), level);
        }
        assert!("max".parse::<PngCompression>().is_err());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = IconConfig::default()
            .with_filter(ResampleFilter::Lanczos3)
            .with_compression(PngCompression::Best)
            .with_multithreading(false);
        assert_eq!(config.filter, ResampleFilter::Lanczos3);
        assert_eq!(config.compression, PngCompression::Best);
        assert!(!config.multithreaded);
        assert_eq!(config.max_dimension, IconConfig::default().max_dimension);
    }
}

//===========================================================================//
