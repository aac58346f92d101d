//! Local validation of the packages selected for analysis.
//!
//! Validation runs before any network call. It only looks at the file name and the size, so it
//! is cheap and can be repeated as many times as needed.

use crate::error::Kind;
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Maximum accepted package size: 100 MiB.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// A package selected for analysis.
///
/// The path is the handle to the raw bytes. They are only read when the package is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    size: u64,
    path: PathBuf,
}

impl SelectedFile {
    /// Creates a new selected file description.
    pub fn new<N: Into<String>, P: Into<PathBuf>>(name: N, size: u64, path: P) -> Self {
        Self {
            name: name.into(),
            size,
            path: path.into(),
        }
    }

    /// Selects the package at the given path, reading its size from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Kind> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Kind::Io {
                message: format!("`{}` is not a file", path.display()),
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(name, metadata.len(), path))
    }

    /// Gets the file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the file size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Gets the path to the raw bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the lowercase extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Gets the file name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(i) if i > 0 => &self.name[..i],
            _ => &self.name,
        }
    }
}

/// Set of package extensions accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionSet {
    /// Only plain `.apk` packages.
    Standard,
    /// `.apk`, `.apks` split bundles and `.xapk` archives.
    Extended,
}

impl ExtensionSet {
    /// Returns whether the file name ends with one of the accepted extensions.
    pub fn accepts(self, file_name: &str) -> bool {
        lazy_static! {
            static ref STANDARD: Regex = Regex::new(r"(?i)\.apk$").unwrap();
            static ref EXTENDED: Regex = Regex::new(r"(?i)\.(apk|apks|xapk)$").unwrap();
        }

        match self {
            ExtensionSet::Standard => STANDARD.is_match(file_name),
            ExtensionSet::Extended => EXTENDED.is_match(file_name),
        }
    }

    /// Human readable list of the accepted extensions.
    pub fn describe(self) -> &'static str {
        match self {
            ExtensionSet::Standard => ".apk",
            ExtensionSet::Extended => ".apk, .apks, .xapk",
        }
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        ExtensionSet::Standard
    }
}

/// Outcome of a validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    is_valid: bool,
    error: Option<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn invalid<S: Into<String>>(error: S) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }

    /// Returns whether the file can be analyzed.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Gets the validation error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Converts the validation into a result, so that it can be propagated with `?`.
    pub fn into_result(self) -> Result<(), Kind> {
        match self.error {
            None if self.is_valid => Ok(()),
            Some(message) => Err(Kind::Validation { message }),
            None => Err(Kind::Parse),
        }
    }
}

/// Validates the selected file against the accepted extensions and the size limit.
pub fn validate(file: Option<&SelectedFile>, extensions: ExtensionSet) -> ValidationResult {
    let file = match file {
        Some(f) => f,
        None => return ValidationResult::invalid("No file selected"),
    };

    if !extensions.accepts(file.name()) {
        return ValidationResult::invalid(format!(
            "Invalid file type. Please select an APK file ({})",
            extensions.describe()
        ));
    }

    if file.size() == 0 {
        return ValidationResult::invalid("File is empty");
    }

    if file.size() > MAX_FILE_SIZE {
        return ValidationResult::invalid("File size exceeds the 100MB limit");
    }

    ValidationResult::valid()
}
