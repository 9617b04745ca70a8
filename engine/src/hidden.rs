//! Hidden-item classification.
//!
//! Root-level hidden entries (OS housekeeping folders, device metadata) are
//! left out of the comparison. How "hidden" is decided depends on the host:
//! Windows exposes attribute bits, everything else uses the dot-prefix
//! convention. The choice is made once, by `platform_classifier`.

use std::path::Path;

/// Decides whether a filesystem entry is hidden.
pub trait HiddenClassifier {
    /// Returns true if the entry should be treated as hidden.
    ///
    /// Never fails: an unreadable entry is reported as not hidden.
    fn is_hidden(&self, path: &Path) -> bool;
}

/// Hidden if the final path component begins with a dot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotPrefixClassifier;

impl HiddenClassifier for DotPrefixClassifier {
    fn is_hidden(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }
}

/// Hidden if the hidden or system attribute bit is set.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeClassifier;

#[cfg(windows)]
impl AttributeClassifier {
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
}

#[cfg(windows)]
impl HiddenClassifier for AttributeClassifier {
    fn is_hidden(&self, path: &Path) -> bool {
        use std::os::windows::fs::MetadataExt;

        match std::fs::metadata(path) {
            Ok(metadata) => {
                metadata.file_attributes()
                    & (Self::FILE_ATTRIBUTE_HIDDEN | Self::FILE_ATTRIBUTE_SYSTEM)
                    != 0
            }
            Err(_) => false,
        }
    }
}

/// The classifier for the host platform.
#[cfg(windows)]
pub fn platform_classifier() -> Box<dyn HiddenClassifier> {
    Box::new(AttributeClassifier)
}

/// The classifier for the host platform.
#[cfg(not(windows))]
pub fn platform_classifier() -> Box<dyn HiddenClassifier> {
    Box::new(DotPrefixClassifier)
}
