//! String table access.
//!
//! String-table offsets come straight from the file, so every lookup is
//! validated against the table length. [`StringTable::get`] is the hard form
//! (used when the name locates further data); [`resolve_or_placeholder`] is
//! the soft form for purely cosmetic output.

use std::borrow::Cow;

use crate::errors::{ElfError, Result};

/// Shown when a string offset lies outside its table.
pub const CORRUPT: &str = "<corrupt>";

/// Shown when there is no string table to look in.
pub const NO_STRINGS: &str = "<no-strings>";

/// A loaded string table (`SHT_STRTAB` or the `DT_STRTAB` area).
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes of the string at `offset`, without its terminator.
    ///
    /// A string running to the end of the table without a NUL is returned
    /// as-is (truncated at the table end).
    pub fn get_bytes(&self, offset: u64) -> Result<&'a [u8]> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&o| o < self.data.len())
            .ok_or(ElfError::BadStringOffset {
                offset,
                size: self.data.len() as u64,
            })?;
        let rest = &self.data[start..];
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        Ok(&rest[..end])
    }

    /// The string at `offset`. Invalid UTF-8 is replaced.
    pub fn get(&self, offset: u64) -> Result<Cow<'a, str>> {
        self.get_bytes(offset).map(String::from_utf8_lossy)
    }
}

/// Resolve `offset` for display, substituting a placeholder on failure.
pub fn resolve_or_placeholder<'a>(table: Option<&StringTable<'a>>, offset: u64) -> Cow<'a, str> {
    match table {
        None => Cow::Borrowed(NO_STRINGS),
        Some(table) => table.get(offset).unwrap_or(Cow::Borrowed(CORRUPT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_lookup() {
        let table = StringTable::new(b"\0main\0printf\0tail");
        assert_eq!(table.get(1).unwrap(), "main");
        assert_eq!(table.get(0).unwrap(), "");
        assert_eq!(table.get(9).unwrap(), "ntf");
        assert_eq!(table.get(13).unwrap(), "tail");
        assert!(matches!(
            table.get(17),
            Err(ElfError::BadStringOffset { offset: 17, size: 17 })
        ));
        assert!(table.get(u64::MAX).is_err());
    }

    #[test]
    fn test_soft_lookup() {
        let table = StringTable::new(b"\0abc\0");
        assert_eq!(resolve_or_placeholder(Some(&table), 1), "abc");
        assert_eq!(resolve_or_placeholder(Some(&table), 99), CORRUPT);
        assert_eq!(resolve_or_placeholder(None, 1), NO_STRINGS);
    }
}
