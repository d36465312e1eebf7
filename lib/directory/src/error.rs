//! Error types for the directory crate.

use std::fmt;

/// Errors from directory lookups.
///
/// Missing records are reported as `Ok(None)` by the lookup methods; these
/// variants describe failures of the backing store itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The backing store could not be reached.
    Unavailable { reason: String },
    /// A stored record could not be decoded.
    CorruptRecord { id: String, reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "directory unavailable: {reason}")
            }
            Self::CorruptRecord { id, reason } => {
                write!(f, "corrupt directory record {id}: {reason}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}
