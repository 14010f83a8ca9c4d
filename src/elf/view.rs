//! Bounds-checked access to the bytes of one object.
//!
//! A [`FileView`] is a window over a backing buffer: the whole file for a
//! plain object, or one member's byte range for an archive member. All
//! offsets handed to it are relative to the start of the window, and every
//! read is validated against the window before any byte is touched. This is
//! the single place a refused read is reported.

use crate::diag::Diagnostics;
use crate::errors::{ElfError, ReadFailure, Result};

/// The bytes of the object under inspection.
#[derive(Debug, Clone, Copy)]
pub struct FileView<'a> {
    /// The complete backing buffer (file or archive).
    data: &'a [u8],

    /// Start of this object within `data`.
    archive_offset: u64,

    /// Claimed size of the object. For archive members this comes from the
    /// member header and may exceed what `data` actually holds.
    size: u64,

    diag: &'a Diagnostics,
}

impl<'a> FileView<'a> {
    /// A view over a whole file.
    pub fn new(data: &'a [u8], diag: &'a Diagnostics) -> Self {
        Self {
            data,
            archive_offset: 0,
            size: data.len() as u64,
            diag,
        }
    }

    /// A view over an archive member occupying `[archive_offset, archive_offset + archive_size)`.
    pub fn member(
        data: &'a [u8],
        archive_offset: u64,
        archive_size: u64,
        diag: &'a Diagnostics,
    ) -> Self {
        Self {
            data,
            archive_offset,
            size: archive_size,
            diag,
        }
    }

    /// Size of the object, as far as offsets inside it are concerned.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn archive_offset(&self) -> u64 {
        self.archive_offset
    }

    /// The diagnostics collector this view reports refused reads to.
    #[inline]
    pub fn diag(&self) -> &'a Diagnostics {
        self.diag
    }

    /// Validate a read of `count` elements of `element_size` bytes at `offset`.
    ///
    /// Returns the absolute range within the backing buffer.
    fn check(
        &self,
        offset: u64,
        element_size: u64,
        count: u64,
    ) -> std::result::Result<(usize, usize), (ReadFailure, u64)> {
        let total = element_size
            .checked_mul(count)
            .ok_or((ReadFailure::Overflow, u64::MAX))?;

        // The window itself may start beyond the buffer (a lying archive header).
        if self.archive_offset > self.data.len() as u64 {
            return Err((ReadFailure::OutOfRange, total));
        }

        let end = offset
            .checked_add(total)
            .ok_or((ReadFailure::Overflow, total))?;
        if end > self.size {
            return Err((ReadFailure::OutOfRange, total));
        }

        let abs_start = self
            .archive_offset
            .checked_add(offset)
            .ok_or((ReadFailure::Overflow, total))?;
        let abs_end = abs_start
            .checked_add(total)
            .ok_or((ReadFailure::Overflow, total))?;
        if abs_end > self.data.len() as u64 {
            return Err((ReadFailure::ShortRead, total));
        }

        Ok((abs_start as usize, abs_end as usize))
    }

    /// Read `count` records of `element_size` bytes starting at `offset`.
    ///
    /// A zero `element_size` or `count` is an empty success. On failure the
    /// refusal is reported once, naming `purpose`, and an error is returned.
    pub fn read(
        &self,
        offset: u64,
        element_size: u64,
        count: u64,
        purpose: &str,
    ) -> Result<&'a [u8]> {
        if element_size == 0 || count == 0 {
            return Ok(&[]);
        }
        match self.check(offset, element_size, count) {
            Ok((start, end)) => Ok(&self.data[start..end]),
            Err((kind, size)) => {
                match kind {
                    ReadFailure::Overflow => self.diag.warn(format_args!(
                        "Size overflow prevents reading {count:#x} elements of size {element_size:#x} for {purpose}"
                    )),
                    ReadFailure::OutOfRange => self.diag.warn(format_args!(
                        "Reading {size:#x} bytes at offset {offset:#x} extends past end of file for {purpose}"
                    )),
                    ReadFailure::ShortRead => self.diag.warn(format_args!(
                        "Unable to read in {size:#x} bytes of {purpose}"
                    )),
                }
                Err(ElfError::Read {
                    kind,
                    purpose: purpose.to_string(),
                    offset,
                    size,
                })
            }
        }
    }

    /// Read `size` bytes at `offset`.
    #[inline]
    pub fn read_bytes(&self, offset: u64, size: u64, purpose: &str) -> Result<&'a [u8]> {
        self.read(offset, 1, size, purpose)
    }

    /// Fill a caller-supplied buffer from `offset`.
    pub fn read_into(&self, offset: u64, dest: &mut [u8], purpose: &str) -> Result<()> {
        let src = self.read(offset, 1, dest.len() as u64, purpose)?;
        dest.copy_from_slice(src);
        Ok(())
    }

    /// Read into a freshly allocated buffer.
    pub fn read_vec(
        &self,
        offset: u64,
        element_size: u64,
        count: u64,
        purpose: &str,
    ) -> Result<Vec<u8>> {
        self.read(offset, element_size, count, purpose)
            .map(<[u8]>::to_vec)
    }

    /// Whether `[offset, offset + size)` lies inside the object, without reporting.
    pub fn contains(&self, offset: u64, size: u64) -> bool {
        self.check(offset, 1, size).is_ok()
    }

    /// Everything from `offset` to the end of the object (possibly empty).
    pub fn tail(&self, offset: u64, purpose: &str) -> Result<&'a [u8]> {
        let available = self.size.checked_sub(offset).ok_or_else(|| {
            self.diag.warn(format_args!(
                "Offset {offset:#x} is beyond the end of the file for {purpose}"
            ));
            ElfError::Read {
                kind: ReadFailure::OutOfRange,
                purpose: purpose.to_string(),
                offset,
                size: 0,
            }
        })?;
        self.read(offset, 1, available, purpose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_read_is_empty_success() {
        let diag = Diagnostics::new();
        let view = FileView::new(&[1, 2, 3], &diag);
        assert_eq!(view.read(100, 0, 5, "nothing").unwrap(), &[] as &[u8]);
        assert_eq!(view.read(100, 5, 0, "nothing").unwrap(), &[] as &[u8]);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_in_range_read() {
        let diag = Diagnostics::new();
        let view = FileView::new(&[1, 2, 3, 4, 5], &diag);
        assert_eq!(view.read(1, 2, 2, "pairs").unwrap(), &[2, 3, 4, 5]);
        let mut buf = [0u8; 2];
        view.read_into(3, &mut buf, "tail").unwrap();
        assert_eq!(buf, [4, 5]);
        assert_eq!(view.read_vec(0, 1, 2, "head").unwrap(), vec![1, 2]);
        assert!(view.read(2, 0, 5, "nothing").unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_read_reports_purpose() {
        let diag = Diagnostics::new();
        let view = FileView::new(&[0; 16], &diag);
        let err = view.read(8, 4, 3, "symbols").unwrap_err();
        assert!(matches!(
            err,
            ElfError::Read {
                kind: ReadFailure::OutOfRange,
                ..
            }
        ));
        assert!(diag.mentions("symbols"));
    }

    #[test]
    fn test_overflowing_size_is_refused() {
        let diag = Diagnostics::new();
        let view = FileView::new(&[0; 16], &diag);
        let err = view.read(0, u64::MAX, 2, "huge table").unwrap_err();
        assert!(matches!(
            err,
            ElfError::Read {
                kind: ReadFailure::Overflow,
                ..
            }
        ));
        assert!(view.read(u64::MAX, 1, 2, "wrapping offset").is_err());
    }

    #[test]
    fn test_member_window_is_relative() {
        let diag = Diagnostics::new();
        let data: Vec<u8> = (0..32).collect();
        let view = FileView::member(&data, 10, 4, &diag);
        assert_eq!(view.read_bytes(0, 4, "member").unwrap(), &[10, 11, 12, 13]);
        assert!(view.read_bytes(2, 4, "member").is_err());
    }

    #[test]
    fn test_lying_member_header() {
        let diag = Diagnostics::new();
        let data = [0u8; 8];
        let short = FileView::member(&data, 4, 100, &diag);
        assert!(matches!(
            short.read_bytes(0, 8, "member body"),
            Err(ElfError::Read {
                kind: ReadFailure::ShortRead,
                ..
            })
        ));
        let beyond = FileView::member(&data, 64, 4, &diag);
        assert!(beyond.read_bytes(0, 1, "member body").is_err());
    }
}
