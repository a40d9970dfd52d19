//! The error taxonomy surfaced to callers of the reader, writer, and database facade.

use std::fmt;
use std::io;

/// A specialized `Result` for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds produced while reading or writing a V3 safe.
#[derive(Debug)]
pub enum Error {
    /// The first four bytes are not `"PWS3"`.
    InvalidTag,
    /// Premature EOF, a length that doesn't fit the remaining data, a missing header VERSION
    /// field, or any other internal inconsistency in an otherwise well-tagged file.
    MalformedFile,
    /// The stored passphrase hash does not match the recomputed value.
    InvalidPassword,
    /// The target file could not be opened for reading.
    FileNotFound(io::Error),
    /// The HMAC tag did not match after a successful decryption.
    HmacMismatch,
    /// The temporary file for an atomic write could not be created.
    CannotWriteFile(io::Error),
    /// An I/O error occurred while writing the encrypted image.
    WriteError(io::Error),
    /// An unexpected OS error, captured at the failure site.
    Unspecified(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTag => write!(f, "not a Password Safe V3 database file"),
            Error::MalformedFile => write!(f, "malformed Password Safe V3 file"),
            Error::InvalidPassword => write!(f, "invalid password"),
            Error::FileNotFound(e) => write!(f, "cannot open database file: {e}"),
            Error::HmacMismatch => write!(f, "integrity check failed (HMAC mismatch)"),
            Error::CannotWriteFile(e) => write!(f, "cannot create temporary file: {e}"),
            Error::WriteError(e) => write!(f, "write error: {e}"),
            Error::Unspecified(e) => write!(f, "unexpected error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FileNotFound(e)
            | Error::CannotWriteFile(e)
            | Error::WriteError(e)
            | Error::Unspecified(e) => Some(e),
            _ => None,
        }
    }
}

/// Internal signal raised by [`crate::field::FieldHolder::get_first`] when no field of the
/// requested type is present. Never surfaced to callers directly: typed accessors on
/// [`crate::header::Header`] and [`crate::record::Record`] translate it into a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldNotFound;

impl fmt::Display for FieldNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field not found")
    }
}
