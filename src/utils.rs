//! Utility functions for decoding primitive values from byte slices.
//!
//! Everything that turns file bytes into numbers goes through here. The
//! [`Codec`] pairs a file's word size with its byte order; it is chosen once
//! when the file header is decoded and then passed alongside every read.

use crate::errors::{ElfError, Result};

/// Endianness of the ELF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Little-endian: least-significant byte first.
    Little,

    /// Big-endian: most-significant byte first.
    Big,
}

/// ELF class (32-bit or 64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    /// 32-bit ELF: addresses are 4 bytes
    Elf32,
    /// 64-bit ELF: addresses are 8 bytes
    Elf64,
}

impl ElfClass {
    /// Returns the size of an address/offset in bytes for this class.
    #[inline]
    pub const fn addr_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 4,
            ElfClass::Elf64 => 8,
        }
    }

    /// Returns true for 64-bit objects.
    #[inline]
    pub const fn is_64(self) -> bool {
        matches!(self, ElfClass::Elf64)
    }
}

/// Read a `u16` from `data` using `endian`.
#[inline]
pub fn read_u16(data: &[u8], endian: Endianness) -> Result<u16> {
    let bytes: [u8; 2] = take(data)?;
    Ok(match endian {
        Endianness::Little => u16::from_le_bytes(bytes),
        Endianness::Big => u16::from_be_bytes(bytes),
    })
}

/// Read a `u32` from `data` using `endian`.
#[inline]
pub fn read_u32(data: &[u8], endian: Endianness) -> Result<u32> {
    let bytes: [u8; 4] = take(data)?;
    Ok(match endian {
        Endianness::Little => u32::from_le_bytes(bytes),
        Endianness::Big => u32::from_be_bytes(bytes),
    })
}

/// Read a `u64` from `data` using `endian`.
#[inline]
pub fn read_u64(data: &[u8], endian: Endianness) -> Result<u64> {
    let bytes: [u8; 8] = take(data)?;
    Ok(match endian {
        Endianness::Little => u64::from_le_bytes(bytes),
        Endianness::Big => u64::from_be_bytes(bytes),
    })
}

/// Read an address-sized value based on `class` (returns `u64`).
#[inline]
pub fn read_addr(data: &[u8], endian: Endianness, class: ElfClass) -> Result<u64> {
    match class {
        ElfClass::Elf32 => read_u32(data, endian).map(u64::from),
        ElfClass::Elf64 => read_u64(data, endian),
    }
}

/// Copy the first `N` bytes of `data` into an array.
#[inline]
fn take<const N: usize>(data: &[u8]) -> Result<[u8; N]> {
    data.get(..N)
        .and_then(|s| s.try_into().ok())
        .ok_or(ElfError::FileTooSmall {
            expected: N,
            actual: data.len(),
        })
}

/// Round `value` up to the next multiple of `align` (a power of two, or 0/1).
///
/// Returns `None` on overflow.
#[inline]
pub fn align_up(value: u64, align: u64) -> Option<u64> {
    if align <= 1 {
        return Some(value);
    }
    let mask = align - 1;
    value.checked_add(mask).map(|v| v & !mask)
}

// ============================================================================
// Numeric codec
// ============================================================================

/// Word size and byte order of one particular file.
///
/// Decided by the header decoder and never changed for the lifetime of the
/// file view it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    pub class: ElfClass,
    pub endian: Endianness,
}

impl Codec {
    pub const fn new(class: ElfClass, endian: Endianness) -> Self {
        Self { class, endian }
    }

    /// Size of an address-sized word.
    #[inline]
    pub const fn word_size(&self) -> usize {
        self.class.addr_size()
    }

    #[inline]
    pub fn u16_at(&self, data: &[u8], offset: usize) -> Result<u16> {
        read_u16(data.get(offset..).unwrap_or(&[]), self.endian)
    }

    #[inline]
    pub fn u32_at(&self, data: &[u8], offset: usize) -> Result<u32> {
        read_u32(data.get(offset..).unwrap_or(&[]), self.endian)
    }

    #[inline]
    pub fn u64_at(&self, data: &[u8], offset: usize) -> Result<u64> {
        read_u64(data.get(offset..).unwrap_or(&[]), self.endian)
    }

    /// Read an address-sized word.
    #[inline]
    pub fn word_at(&self, data: &[u8], offset: usize) -> Result<u64> {
        read_addr(data.get(offset..).unwrap_or(&[]), self.endian, self.class)
    }

    /// Read an unsigned value of 1, 2, 3, 4 or 8 bytes.
    pub fn uint_at(&self, data: &[u8], offset: usize, width: usize) -> Result<u64> {
        let bytes = data
            .get(offset..)
            .and_then(|d| d.get(..width))
            .ok_or(ElfError::FileTooSmall {
                expected: offset.saturating_add(width),
                actual: data.len(),
            })?;
        let mut value = 0u64;
        match self.endian {
            Endianness::Little => {
                for &b in bytes.iter().rev() {
                    value = (value << 8) | u64::from(b);
                }
            }
            Endianness::Big => {
                for &b in bytes {
                    value = (value << 8) | u64::from(b);
                }
            }
        }
        Ok(value)
    }

    /// Store the low `width` bytes of `value` at `offset`.
    pub fn put_uint(&self, buf: &mut [u8], offset: usize, width: usize, value: u64) -> Result<()> {
        let len = buf.len();
        let dest = buf
            .get_mut(offset..)
            .and_then(|d| d.get_mut(..width))
            .ok_or(ElfError::FileTooSmall {
                expected: offset.saturating_add(width),
                actual: len,
            })?;
        for (i, byte) in dest.iter_mut().enumerate() {
            let shift = match self.endian {
                Endianness::Little => i,
                Endianness::Big => width - 1 - i,
            };
            *byte = (value >> (shift * 8)) as u8;
        }
        Ok(())
    }

    #[inline]
    pub fn put_u16(&self, buf: &mut [u8], offset: usize, value: u16) -> Result<()> {
        self.put_uint(buf, offset, 2, u64::from(value))
    }

    #[inline]
    pub fn put_u32(&self, buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
        self.put_uint(buf, offset, 4, u64::from(value))
    }

    #[inline]
    pub fn put_u64(&self, buf: &mut [u8], offset: usize, value: u64) -> Result<()> {
        self.put_uint(buf, offset, 8, value)
    }

    /// Store an address-sized word.
    #[inline]
    pub fn put_word(&self, buf: &mut [u8], offset: usize, value: u64) -> Result<()> {
        self.put_uint(buf, offset, self.word_size(), value)
    }
}

// ============================================================================
// Sequential cursor
// ============================================================================

/// A forward-only reader over a byte slice, used by the self-delimited
/// sub-decoders (notes, attributes, unwind byte-code).
///
/// Every accessor returns `None` instead of reading past the end.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes not yet consumed.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub fn bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let out = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(out)
    }

    pub fn skip(&mut self, len: usize) -> Option<()> {
        self.bytes(len).map(|_| ())
    }

    pub fn u16(&mut self, codec: Codec) -> Option<u16> {
        let v = codec.u16_at(self.data, self.pos).ok()?;
        self.pos += 2;
        Some(v)
    }

    pub fn u32(&mut self, codec: Codec) -> Option<u32> {
        let v = codec.u32_at(self.data, self.pos).ok()?;
        self.pos += 4;
        Some(v)
    }

    pub fn u64(&mut self, codec: Codec) -> Option<u64> {
        let v = codec.u64_at(self.data, self.pos).ok()?;
        self.pos += 8;
        Some(v)
    }

    /// Read an address-sized word.
    pub fn word(&mut self, codec: Codec) -> Option<u64> {
        let v = codec.word_at(self.data, self.pos).ok()?;
        self.pos += codec.word_size();
        Some(v)
    }

    /// Read a NUL-terminated byte string, consuming the terminator.
    ///
    /// Returns `None` if no terminator is found before the end.
    pub fn cstr(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest();
        let nul = rest.iter().position(|&b| b == 0)?;
        self.pos += nul + 1;
        Some(&rest[..nul])
    }

    /// Read an unsigned LEB128 value.
    ///
    /// Bits beyond 64 are discarded; the encoding is still consumed up to its
    /// terminating byte so the stream stays in sync.
    pub fn uleb128(&mut self) -> Option<u64> {
        let (value, len) = decode_uleb128(self.rest())?;
        self.pos += len;
        Some(value)
    }
}

/// Decode an unsigned LEB128 value, returning it and the encoded length.
///
/// Returns `None` if the input ends before the terminating byte.
pub fn decode_uleb128(data: &[u8]) -> Option<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        if shift < 64 {
            result |= u64::from(byte & 0x7f) << shift;
        }
        shift = shift.saturating_add(7);
        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
    }
    None
}

/// Encode `value` as unsigned LEB128, padded to at least `min_len` bytes.
pub fn encode_uleb128(mut value: u64, min_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        let more = value != 0 || out.len() + 1 < min_len;
        if more {
            byte |= 0x80;
        }
        out.push(byte);
        if !more {
            return out;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const BE32: Codec = Codec::new(ElfClass::Elf32, Endianness::Big);

    #[test]
    fn test_read_u16_little_endian() {
        let data = [0x34, 0x12];
        assert_eq!(read_u16(&data, Endianness::Little).unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u16_big_endian() {
        let data = [0x12, 0x34];
        assert_eq!(read_u16(&data, Endianness::Big).unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u32_little_endian() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32(&data, Endianness::Little).unwrap(), 0x12345678);
    }

    #[test]
    fn test_short_input_is_an_error() {
        assert!(read_u32(&[1, 2, 3], Endianness::Little).is_err());
        assert!(LE64.word_at(&[0; 7], 0).is_err());
        assert!(LE64.u16_at(&[0; 4], 10).is_err());
    }

    #[test]
    fn test_word_follows_class() {
        let data = [0, 0, 0, 1, 0, 0, 0, 2];
        assert_eq!(BE32.word_at(&data, 0).unwrap(), 1);
        assert_eq!(BE32.word_at(&data, 4).unwrap(), 2);
        assert_eq!(LE64.word_at(&data, 0).unwrap(), 0x0200_0000_0100_0000);
    }

    #[test]
    fn test_put_uint_matches_read() {
        let mut buf = [0u8; 8];
        BE32.put_uint(&mut buf, 1, 3, 0x00ab_cdef).unwrap();
        assert_eq!(buf[..4], [0, 0xab, 0xcd, 0xef]);
        assert_eq!(BE32.uint_at(&buf, 1, 3).unwrap(), 0xab_cdef);
        LE64.put_u16(&mut buf, 6, 0x1234).unwrap();
        assert_eq!(buf[6..], [0x34, 0x12]);
        assert!(LE64.put_u32(&mut buf, 6, 0).is_err());
    }

    #[test]
    fn test_leb128() {
        assert_eq!(decode_uleb128(&[0xe5, 0x8e, 0x26]), Some((624_485, 3)));
        assert_eq!(decode_uleb128(&[0x80, 0x80]), None);
        assert_eq!(encode_uleb128(624_485, 0), vec![0xe5, 0x8e, 0x26]);
        assert_eq!(encode_uleb128(1, 3), vec![0x81, 0x80, 0x00]);
    }

    #[test]
    fn test_cursor_stops_at_end() {
        let mut c = Cursor::new(b"ab\0\x01\x02");
        assert_eq!(c.cstr(), Some(&b"ab"[..]));
        assert_eq!(c.u8(), Some(1));
        assert_eq!(c.u16(LE64), None);
        assert_eq!(c.remaining(), 1);
        assert_eq!(c.cstr(), None);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(5, 4), Some(8));
        assert_eq!(align_up(8, 8), Some(8));
        assert_eq!(align_up(3, 0), Some(3));
        assert_eq!(align_up(u64::MAX, 8), None);
    }
}
