//! In-archive file names.
//!
//! An [`ArchivePath`] is the name recorded for an entry: well-formed UTF-8,
//! non-empty, and short enough for the 16-bit name length field of the ZIP
//! headers. Names are recorded verbatim. Choosing forward-slash delimited
//! relative names without `..` segments is left to the caller.
//!
//! ```rust
//! use zipstream::ArchivePath;
//!
//! let path = ArchivePath::try_from("docs/readme.txt")?;
//! assert_eq!(path.len(), 15);
//!
//! assert!(ArchivePath::try_from(&b"bad\xff"[..]).is_err());
//! # Ok::<(), zipstream::Error>(())
//! ```

use crate::Error;
use std::borrow::Cow;

/// Largest name, in bytes, that the ZIP name length field can describe.
pub const MAX_PATH_LEN: usize = u16::MAX as usize;

/// A validated entry name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchivePath<'a> {
    data: Cow<'a, str>,
}

impl<'a> ArchivePath<'a> {
    fn validate(data: Cow<'a, str>) -> Result<Self, Error> {
        if data.is_empty() {
            return Err(Error::invalid_input("file name is empty"));
        }

        if data.len() > MAX_PATH_LEN {
            return Err(Error::invalid_input(format!(
                "file name is {} bytes, the limit is {}",
                data.len(),
                MAX_PATH_LEN
            )));
        }

        Ok(ArchivePath { data })
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.data.as_ref()
    }

    /// Returns the raw UTF-8 bytes written to the headers.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Returns the length of the name in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a validated name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an owned version of this path.
    pub fn into_owned(self) -> ArchivePath<'static> {
        ArchivePath {
            data: Cow::Owned(self.data.into_owned()),
        }
    }

    /// The length as it is written to the 16-bit name length fields.
    #[inline]
    pub(crate) fn len_u16(&self) -> u16 {
        // Bounded by validate
        self.data.len() as u16
    }
}

impl<'a> TryFrom<&'a str> for ArchivePath<'a> {
    type Error = Error;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        ArchivePath::validate(Cow::Borrowed(value))
    }
}

impl<'a> TryFrom<&'a [u8]> for ArchivePath<'a> {
    type Error = Error;

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        let data = std::str::from_utf8(value)
            .map_err(|e| Error::invalid_input(format!("file name is not UTF-8: {e}")))?;
        ArchivePath::validate(Cow::Borrowed(data))
    }
}

impl TryFrom<String> for ArchivePath<'static> {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ArchivePath::validate(Cow::Owned(value))
    }
}

impl AsRef<str> for ArchivePath<'_> {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ArchivePath<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
