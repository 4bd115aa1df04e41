use crate::error::Result;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

//===========================================================================//

// Smallest crop side offered by the interactive controls, unless the source
// itself is smaller than this.
const PREFERRED_MIN_SIDE: u32 = 16;

//===========================================================================//

/// A square region of a source image, given by its top-left corner and side
/// length in pixels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct CropRegion {
    /// Pixels from the left edge of the source.
    pub x: u32,
    /// Pixels from the top edge of the source.
    pub y: u32,
    /// Side length of the square.
    pub side: u32,
}

impl CropRegion {
    /// Creates a crop region.  No validation happens here; see
    /// [`CropRegion::validate`].
    pub fn new(x: u32, y: u32, side: u32) -> CropRegion {
        CropRegion { x, y, side }
    }

    /// Returns the largest square that fits in a `width`x`height` source,
    /// centered along the longer axis.
    pub fn centered(width: u32, height: u32) -> CropRegion {
        let side = width.min(height);
        CropRegion::new((width - side) / 2, (height - side) / 2, side)
    }

    /// Returns the smallest side length the controls should allow for a
    /// `width`x`height` source.
    pub fn min_side(width: u32, height: u32) -> u32 {
        let max_side = CropRegion::max_side(width, height);
        if max_side > 0 {
            PREFERRED_MIN_SIDE.min(max_side)
        } else {
            1
        }
    }

    /// Returns the largest side length that fits in a `width`x`height`
    /// source.
    pub fn max_side(width: u32, height: u32) -> u32 {
        width.min(height)
    }

    /// Returns this region with its side changed to `side` (clamped to the
    /// allowed range) and its offsets pulled back inside the source.
    pub fn with_side(self, side: u32, width: u32, height: u32) -> CropRegion {
        CropRegion { side, ..self }.clamped(width, height)
    }

    /// Returns this region moved to (`x`, `y`), clamped so that it stays
    /// inside the source.
    pub fn with_offset(
        self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> CropRegion {
        CropRegion { x, y, ..self }.clamped(width, height)
    }

    /// Returns this region, keeping its side, centered in the source.
    pub fn recentered(self, width: u32, height: u32) -> CropRegion {
        let side = self.clamped(width, height).side;
        CropRegion::new(
            width.saturating_sub(side) / 2,
            height.saturating_sub(side) / 2,
            side,
        )
    }

    /// Returns the closest region to this one that satisfies
    /// [`CropRegion::validate`] for a `width`x`height` source.
    pub fn clamped(self, width: u32, height: u32) -> CropRegion {
        let side = self.side.clamp(
            CropRegion::min_side(width, height),
            CropRegion::max_side(width, height).max(1),
        );
        CropRegion {
            x: self.x.min(width.saturating_sub(side)),
            y: self.y.min(height.saturating_sub(side)),
            side,
        }
    }

    /// Checks that this region lies entirely inside a `width`x`height`
    /// source.
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        if self.side < 1 {
            invalid_crop!("Crop side must be at least 1");
        }
        let right = (self.x as u64) + (self.side as u64);
        if right > (width as u64) {
            invalid_crop!(
                "Crop x + side is {}, but source width is {}",
                right,
                width
            );
        }
        let bottom = (self.y as u64) + (self.side as u64);
        if bottom > (height as u64) {
            invalid_crop!(
                "Crop y + side is {}, but source height is {}",
                bottom,
                height
            );
        }
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
