use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

//===========================================================================//

/// Largest icon side length that can be stored in an ICO file.  The
/// directory records it as a zero byte.
pub const MAX_ICON_SIZE: u32 = 256;

/// The icon sizes offered for selection.
pub const STANDARD_SIZES: [u32; 7] = [16, 24, 32, 48, 64, 128, 256];

/// The icon sizes selected before the user changes anything.
pub const DEFAULT_SELECTION: [u32; 6] = [16, 32, 48, 64, 128, 256];

//===========================================================================//

/// A deduplicated set of icon side lengths, iterated in ascending order.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<u32>", into = "Vec<u32>"))]
pub struct IconSizeSet {
    sizes: BTreeSet<u32>,
}

impl IconSizeSet {
    /// Creates an empty selection.
    pub fn new() -> IconSizeSet {
        IconSizeSet { sizes: BTreeSet::new() }
    }

    /// Creates a selection from a list of sizes, dropping duplicates.
    /// Returns an error if any size is outside of `1..=256`.
    pub fn from_sizes<I>(sizes: I) -> Result<IconSizeSet>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut set = IconSizeSet::new();
        for size in sizes {
            set.insert(size)?;
        }
        Ok(set)
    }

    /// Returns every size in [`STANDARD_SIZES`].
    pub fn standard() -> IconSizeSet {
        IconSizeSet { sizes: STANDARD_SIZES.iter().copied().collect() }
    }

    /// Returns the sizes in [`DEFAULT_SELECTION`].
    pub fn default_selection() -> IconSizeSet {
        IconSizeSet { sizes: DEFAULT_SELECTION.iter().copied().collect() }
    }

    /// Adds a size.  Returns whether it was newly added.
    pub fn insert(&mut self, size: u32) -> Result<bool> {
        validate_size(size)?;
        Ok(self.sizes.insert(size))
    }

    /// Removes a size.  Returns whether it was present.
    pub fn remove(&mut self, size: u32) -> bool {
        self.sizes.remove(&size)
    }

    /// Adds the size if it is missing, or removes it if present, the way a
    /// checkbox does.  Returns whether the size is selected afterwards.
    pub fn toggle(&mut self, size: u32) -> Result<bool> {
        if self.sizes.remove(&size) {
            return Ok(false);
        }
        self.insert(size)
    }

    /// Returns true if `size` is selected.
    pub fn contains(&self, size: u32) -> bool {
        self.sizes.contains(&size)
    }

    /// Returns true if no size is selected.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Returns the number of selected sizes.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Iterates over the selected sizes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.sizes.iter().copied()
    }

    /// Returns the selected sizes in ascending order.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

/// Checks that `size` can be rendered and stored in an ICO directory.
pub(crate) fn validate_size(size: u32) -> Result<()> {
    if size == 0 || size > MAX_ICON_SIZE {
        return Err(Error::InvalidSize(size));
    }
    Ok(())
}

impl FromStr for IconSizeSet {
    type Err = Error;

    /// Parses a comma- or whitespace-separated list such as `"16,32 48"`.
    /// Entries may also be written as `32x32`.
    fn from_str(text: &str) -> Result<IconSizeSet> {
        let mut set = IconSizeSet::new();
        let items = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty());
        for item in items {
            let size = match item.split_once(['x', 'X']) {
                Some((width, height)) if width == height => width,
                Some(_) => {
                    return Err(Error::InvalidConfig(format!(
                        "Icon size {:?} is not square",
                        item
                    )))
                }
                None => item,
            };
            let size = size.parse::<u32>().map_err(|error| {
                Error::InvalidConfig(format!(
                    "Invalid icon size {:?}: {}",
                    item, error
                ))
            })?;
            set.insert(size)?;
        }
        Ok(set)
    }
}

impl TryFrom<Vec<u32>> for IconSizeSet {
    type Error = Error;

    fn try_from(sizes: Vec<u32>) -> Result<IconSizeSet> {
        IconSizeSet::from_sizes(sizes)
    }
}

impl From<IconSizeSet> for Vec<u32> {
    fn from(set: IconSizeSet) -> Vec<u32> {
        set.to_vec()
    }
}

impl<'a> IntoIterator for &'a IconSizeSet {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sizes.iter().copied()
    }
}

//===========================================================================//


//===========================================================================//
