use std::io;

//===========================================================================//

/// Everything that can go wrong while turning a source image into ICO files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source bytes are not a decodable image, or the decoded image is
    /// empty or too large.
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    /// A crop region does not fit inside the source image.
    #[error("Invalid crop region: {0}")]
    InvalidCrop(String),

    /// The list of entries handed to the ICO encoder can't be encoded.
    #[error("Invalid ICO entries: {0}")]
    InvalidEntries(String),

    /// An icon side length outside of `1..=256`.
    #[error("Invalid icon size (was {0}, but must be between 1 and 256)")]
    InvalidSize(u32),

    /// Generation was requested with no icon sizes selected.
    #[error("No icon sizes selected")]
    EmptySelection,

    /// Generation was requested before any source image was loaded.
    #[error("No source image loaded")]
    MissingSource,

    /// The resampler could not scale a crop to an icon size.
    #[error("Failed to resample image: {0}")]
    Resample(String),

    /// The PNG encoder rejected a raster.
    #[error("Failed to encode PNG: {0}")]
    Encode(String),

    /// An ICO byte stream could not be parsed.
    #[error("Malformed ICO data: {0}")]
    MalformedIco(String),

    /// A multi-size generation pass failed; no output was produced.
    #[error("Icon generation failed: {0}")]
    GenerationFailed(#[source] Box<Error>),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An underlying reader or writer failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if the error is caused by user input (a bad file, an
    /// empty selection) rather than by a defect in the calling code.
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            Error::Decode(_)
            | Error::EmptySelection
            | Error::InvalidSize(_)
            | Error::MissingSource => true,
            Error::GenerationFailed(cause) => cause.is_user_recoverable(),
            _ => false,
        }
    }

    pub(crate) fn generation_failed(cause: Error) -> Error {
        match cause {
            Error::GenerationFailed(_) => cause,
            cause => Error::GenerationFailed(Box::new(cause)),
        }
    }
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn generation_failure_is_not_nested() {
        let error = Error::generation_failed(Error::generation_failed(
            Error::Encode("boom".to_string()),
        ));
        match error {
            Error::GenerationFailed(cause) => {
                assert!(matches!(*cause, Error::Encode(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn user_recoverable_classification() {
        assert!(Error::EmptySelection.is_user_recoverable());
        assert!(Error::Decode("bad".to_string()).is_user_recoverable());
        assert!(!Error::InvalidEntries("empty".to_string())
            .is_user_recoverable());
        assert!(!Error::generation_failed(Error::InvalidCrop(
            "too wide".to_string()
        ))
        .is_user_recoverable());
    }
}

//===========================================================================//
