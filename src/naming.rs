//! File names for generated downloads.

// Base name used when the source file name has nothing usable left.
const FALLBACK_BASE_NAME: &str = "icon";

//===========================================================================//

/// Strips the last extension from an uploaded file's name, falling back to
/// `"icon"` when nothing remains.  Any directory components are dropped.
pub fn base_file_name(file_name: &str) -> String {
    let file_name = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let stem = match file_name.rfind('.') {
        Some(index) if index + 1 < file_name.len() => &file_name[..index],
        _ => file_name,
    };
    if stem.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// Returns the download name of a single-size ICO file, such as
/// `logo-32x32.ico`.
pub fn per_size_file_name(base_name: &str, size: u32) -> String {
    format!("{}-{}x{}.ico", base_name, size, size)
}

/// Returns the download name of the multi-size bundle, such as `logo.ico`.
pub fn bundle_file_name(base_name: &str) -> String {
    format!("{}.ico", base_name)
}

//===========================================================================//


//===========================================================================//
