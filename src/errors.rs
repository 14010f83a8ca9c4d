//! Error types for ELF decoding.

use std::fmt;

use thiserror::Error;

/// Why a bounds-checked read was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFailure {
    /// The requested range starts or ends outside the file window.
    OutOfRange,

    /// `element_size * count` (or `offset + size`) does not fit in 64 bits.
    Overflow,

    /// The window claims more bytes than the backing buffer holds.
    /// Only happens for archive members whose header lies about their size.
    ShortRead,
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReadFailure::OutOfRange => "read extends past end of file",
            ReadFailure::Overflow => "size computation overflowed",
            ReadFailure::ShortRead => "short read",
        })
    }
}

/// Errors that can occur while decoding an ELF object.
#[derive(Error, Debug)]
pub enum ElfError {
    /// The file is too small to contain even the basic ELF identification bytes,
    /// or too small for the full file header its class requires.
    #[error("File too small: expected at least {expected} bytes, got {actual}")]
    FileTooSmall { expected: usize, actual: usize },

    /// The magic bytes at the start of the file don't match "\x7fELF".
    /// `hint` names a recognised foreign format when there is one.
    #[error(
        "Not an ELF file - it has the wrong magic bytes at the start ({found:02x?}){}",
        hint.map(|h| format!("; {h}")).unwrap_or_default()
    )]
    InvalidMagic {
        found: [u8; 4],
        hint: Option<&'static str>,
    },

    /// The ELF class (32-bit vs 64-bit) is not recognized.
    #[error("Unsupported ELF class: {0} (expected 1=32-bit or 2=64-bit)")]
    UnsupportedClass(u8),

    /// The endianness marker is not recognized.
    #[error("Unsupported data encoding: {0} (expected 1=LSB or 2=MSB)")]
    UnsupportedEndianness(u8),

    /// A bounds-checked read was refused.
    #[error("{kind}: {size:#x} bytes at offset {offset:#x} for {purpose}")]
    Read {
        kind: ReadFailure,
        purpose: String,
        offset: u64,
        size: u64,
    },

    /// A table's declared entry size is smaller than the record it must hold.
    #[error("{what} entry size {size} is smaller than the expected {minimum}")]
    InvalidEntrySize {
        what: &'static str,
        size: u64,
        minimum: u64,
    },

    /// An index pulled from the file does not address an existing entry.
    #[error("{what} index {index} is out of range (limit {limit})")]
    BadIndex {
        what: &'static str,
        index: u64,
        limit: u64,
    },

    /// A string-table offset lies outside the table.
    #[error("string offset {offset:#x} is outside the string table ({size:#x} bytes)")]
    BadStringOffset { offset: u64, size: u64 },

    /// A substructure is internally inconsistent beyond safe repair.
    #[error("corrupt {what}: {detail}")]
    Corrupt { what: &'static str, detail: String },

    /// A compressed section could not be expanded.
    #[error("unable to decompress section {section}: {reason}")]
    Decompress { section: String, reason: String },

    /// The requested operation has no decoder for this machine or format.
    #[error("{0} is not supported")]
    Unsupported(String),
}

impl ElfError {
    /// Shorthand for [`ElfError::Corrupt`].
    pub fn corrupt(what: &'static str, detail: impl Into<String>) -> Self {
        ElfError::Corrupt {
            what,
            detail: detail.into(),
        }
    }
}

/// Result alias using `ElfError`.
pub type Result<T> = std::result::Result<T, ElfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_message_includes_hint() {
        let err = ElfError::InvalidMagic {
            found: *b"BC\xc0\xde",
            hint: Some("this is an LLVM bitcode file"),
        };
        let text = err.to_string();
        assert!(text.contains("wrong magic bytes"));
        assert!(text.ends_with("this is an LLVM bitcode file"));
    }

    #[test]
    fn test_read_message_names_purpose() {
        let err = ElfError::Read {
            kind: ReadFailure::OutOfRange,
            purpose: "section headers".into(),
            offset: 0x1000,
            size: 0x40,
        };
        assert_eq!(
            err.to_string(),
            "read extends past end of file: 0x40 bytes at offset 0x1000 for section headers"
        );
    }
}
