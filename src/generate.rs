//! The multi-size generation pass: one crop, many icon sizes, one ICO file
//! per size plus a bundle holding all of them.

use crate::config::IconConfig;
use crate::crop::CropRegion;
use crate::error::{Error, Result};
use crate::icondir::{IcoContainer, IconImageEntry};
use crate::raster::RasterImage;
use crate::resample::render_with_filter;
use crate::sizes::IconSizeSet;
use log::{debug, info};

//===========================================================================//

/// A single-resolution ICO file tagged with its side length.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SizedIcon {
    size: u32,
    container: IcoContainer,
}

impl SizedIcon {
    /// Returns the side length of the icon, in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the single-entry ICO file.
    pub fn container(&self) -> &IcoContainer {
        &self.container
    }

    /// Consumes the icon and returns its ICO file.
    pub fn into_container(self) -> IcoContainer {
        self.container
    }
}

/// The output of a successful generation pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratedIcons {
    per_size: Vec<SizedIcon>,
    bundle: IcoContainer,
}

impl GeneratedIcons {
    /// Returns one single-resolution ICO file per requested size, in
    /// ascending size order.
    pub fn per_size(&self) -> &[SizedIcon] {
        &self.per_size
    }

    /// Returns the ICO file holding every requested size.
    pub fn bundle(&self) -> &IcoContainer {
        &self.bundle
    }

    /// Splits the output into its per-size files and the bundle.
    pub fn into_parts(self) -> (Vec<SizedIcon>, IcoContainer) {
        (self.per_size, self.bundle)
    }
}

//===========================================================================//

/// Renders `crop` of `source` at every size in `sizes` with the default
/// configuration.  See [`generate_with_config`].
pub fn generate(
    source: &RasterImage,
    crop: CropRegion,
    sizes: &IconSizeSet,
) -> Result<GeneratedIcons> {
    generate_with_config(source, crop, sizes, &IconConfig::default())
}

/// Renders `crop` of `source` at every size in `sizes`, then packages each
/// size into its own ICO file and all of them into one bundle.
///
/// Returns [`Error::EmptySelection`] if `sizes` is empty.  Any other failure
/// is reported as [`Error::GenerationFailed`], and no output is produced.
pub fn generate_with_config(
    source: &RasterImage,
    crop: CropRegion,
    sizes: &IconSizeSet,
    config: &IconConfig,
) -> Result<GeneratedIcons> {
    if sizes.is_empty() {
        return Err(Error::EmptySelection);
    }
    let entries = render_entries(source, crop, sizes, config)
        .map_err(Error::generation_failed)?;
    package(entries).map_err(Error::generation_failed)
}

fn package(entries: Vec<IconImageEntry>) -> Result<GeneratedIcons> {
    let mut per_size = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        let container = IcoContainer::encode(std::slice::from_ref(entry))?;
        per_size.push(SizedIcon { size: entry.size(), container });
    }
    let bundle = IcoContainer::encode(&entries)?;
    info!(
        "Generated {} icon sizes {:?} ({} byte bundle)",
        per_size.len(),
        bundle.sizes(),
        bundle.len()
    );
    Ok(GeneratedIcons { per_size, bundle })
}

fn render_entry(
    source: &RasterImage,
    crop: CropRegion,
    size: u32,
    config: &IconConfig,
) -> Result<IconImageEntry> {
    let raster = render_with_filter(source, crop, size, config.filter)?;
    let png_data = raster.to_png_with_compression(config.compression)?;
    debug!("Rendered {}x{} icon ({} PNG bytes)", size, size, png_data.len());
    Ok(IconImageEntry::new(size, png_data))
}

#[cfg(feature = "multithreading")]
fn render_entries(
    source: &RasterImage,
    crop: CropRegion,
    sizes: &IconSizeSet,
    config: &IconConfig,
) -> Result<Vec<IconImageEntry>> {
    use rayon::prelude::*;
    let sizes = sizes.to_vec();
    if config.multithreaded && sizes.len() > 1 {
        // Collecting an indexed parallel iterator keeps ascending order.
        sizes
            .par_iter()
            .map(|&size| render_entry(source, crop, size, config))
            .collect()
    } else {
        sizes
            .iter()
            .map(|&size| render_entry(source, crop, size, config))
            .collect()
    }
}

#[cfg(not(feature = "multithreading"))]
fn render_entries(
    source: &RasterImage,
    crop: CropRegion,
    sizes: &IconSizeSet,
    config: &IconConfig,
) -> Result<Vec<IconImageEntry>> {
    sizes.iter().map(|size| render_entry(source, crop, size, config)).collect()
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::generate;
    use crate::crop::CropRegion;
    use crate::error::Error;
    use crate::raster::RasterImage;
    use crate::sizes::IconSizeSet;

    #[test]
    fn empty_selection_is_not_wrapped() {
        let source = RasterImage::filled(8, 8, [0, 0, 0, 255]);
        let result =
            generate(&source, CropRegion::centered(8, 8), &IconSizeSet::new());
        assert!(matches!(result, Err(Error::EmptySelection)));
    }

    #[test]
    fn invalid_crop_fails_the_whole_pass() {
        let source = RasterImage::filled(40, 100, [0, 0, 0, 255]);
        let sizes = IconSizeSet::from_sizes(vec![16, 32]).unwrap();
        match generate(&source, CropRegion::new(10, 0, 50), &sizes) {
            Err(Error::GenerationFailed(cause)) => {
                assert!(matches!(*cause, Error::InvalidCrop(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn per_size_files_follow_size_order() {
        let source = RasterImage::filled(64, 48, [1, 2, 3, 255]);
        let sizes = IconSizeSet::from_sizes(vec![48, 16, 24]).unwrap();
        let icons = generate(&source, CropRegion::centered(64, 48), &sizes)
            .unwrap();
        let per_size: Vec<u32> =
            icons.per_size().iter().map(|icon| icon.size()).collect();
        assert_eq!(per_size, vec![16, 24, 48]);
        for icon in icons.per_size() {
            assert_eq!(icon.container().sizes(), &[icon.size()]);
        }
        assert_eq!(icons.bundle().sizes(), &[16, 24, 48]);
    }

    #[cfg(feature = "multithreading")]
    #[test]
    fn parallel_pass_matches_sequential_pass() {
        use super::generate_with_config;
        use crate::config::IconConfig;

        let mut rgba = Vec::new();
        for y in 0..50u32 {
            for x in 0..70u32 {
                rgba.extend_from_slice(&[
                    (x * 3) as u8,
                    (y * 5) as u8,
                    ((x + y) * 2) as u8,
                    255,
                ]);
            }
        }
        let source = RasterImage::from_rgba_data(70, 50, rgba);
        let sizes =
            IconSizeSet::from_sizes(vec![256, 16, 48, 24, 32, 64]).unwrap();
        let crop = CropRegion::new(5, 3, 40);
        let parallel = generate_with_config(
            &source,
            crop,
            &sizes,
            &IconConfig::default().with_multithreading(true),
        )
        .unwrap();
        let sequential = generate_with_config(
            &source,
            crop,
            &sizes,
            &IconConfig::default().with_multithreading(false),
        )
        .unwrap();
        assert_eq!(parallel.bundle().sizes(), &[16, 24, 32, 48, 64, 256]);
        assert_eq!(parallel, sequential);
    }
}

//===========================================================================//
