//! Compressed section bodies.
//!
//! Two conventions exist: `SHF_COMPRESSED` sections start with an
//! `Elf{32,64}_Chdr` naming the codec and the expanded size, and the older
//! `.zdebug*` sections start with the ASCII magic `ZLIB` followed by the
//! expanded size as an 8-byte big-endian number. Either way the result is a
//! fresh buffer; the bytes in the file are never touched.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::errors::{ElfError, Result};
use crate::utils::Codec;

/// `ch_type` for zlib (deflate) payloads.
pub const ELFCOMPRESS_ZLIB: u32 = 1;

/// `ch_type` for zstd payloads.
pub const ELFCOMPRESS_ZSTD: u32 = 2;

/// Magic of the legacy `.zdebug` convention.
const LEGACY_MAGIC: &[u8; 4] = b"ZLIB";

/// Largest expansion accepted, relative to the compressed size.
const MAX_RATIO: u64 = 1 << 12;

/// A decoded compression header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionHeader {
    pub ch_type: u32,
    pub size: u64,
    pub addralign: u64,

    /// Bytes occupied by the header itself.
    pub header_size: usize,
}

impl CompressionHeader {
    /// Parse the `Elf_Chdr` at the start of `data`.
    pub fn parse(data: &[u8], codec: Codec) -> Result<Self> {
        let short = || ElfError::corrupt("compression header", "section is too small");
        let header = if codec.class.is_64() {
            CompressionHeader {
                ch_type: codec.u32_at(data, 0).map_err(|_| short())?,
                size: codec.u64_at(data, 8).map_err(|_| short())?,
                addralign: codec.u64_at(data, 16).map_err(|_| short())?,
                header_size: 24,
            }
        } else {
            CompressionHeader {
                ch_type: codec.u32_at(data, 0).map_err(|_| short())?,
                size: u64::from(codec.u32_at(data, 4).map_err(|_| short())?),
                addralign: u64::from(codec.u32_at(data, 8).map_err(|_| short())?),
                header_size: 12,
            }
        };
        Ok(header)
    }

    pub fn type_name(&self) -> String {
        match self.ch_type {
            ELFCOMPRESS_ZLIB => "ZLIB".to_string(),
            ELFCOMPRESS_ZSTD => "ZSTD".to_string(),
            other => format!("[<unknown>: {other:#x}]"),
        }
    }
}

/// True if `data` uses the legacy `ZLIB` + size prefix.
pub fn is_legacy_compressed(name: &str, data: &[u8]) -> bool {
    name.starts_with(".zdebug") && data.len() >= 12 && data.starts_with(LEGACY_MAGIC)
}

/// Expand a section body if it is compressed, otherwise borrow it.
///
/// `flagged` is the section's `SHF_COMPRESSED` bit. Any failure is reported
/// as [`ElfError::Decompress`] naming `section`; the caller abandons only
/// the dump in progress.
pub fn maybe_decompress<'a>(
    section: &str,
    data: &'a [u8],
    flagged: bool,
    codec: Codec,
) -> Result<Cow<'a, [u8]>> {
    let fail = |reason: String| ElfError::Decompress {
        section: section.to_string(),
        reason,
    };

    if flagged {
        let chdr = CompressionHeader::parse(data, codec).map_err(|e| fail(e.to_string()))?;
        let payload = &data[chdr.header_size..];
        return match chdr.ch_type {
            ELFCOMPRESS_ZLIB => inflate(payload, chdr.size).map(Cow::Owned).map_err(fail),
            ELFCOMPRESS_ZSTD => Err(fail("zstd compression is not supported".to_string())),
            other => Err(fail(format!("unknown compression type {other:#x}"))),
        };
    }

    if is_legacy_compressed(section, data) {
        let mut size = [0u8; 8];
        size.copy_from_slice(&data[4..12]);
        return inflate(&data[12..], u64::from_be_bytes(size))
            .map(Cow::Owned)
            .map_err(fail);
    }

    Ok(Cow::Borrowed(data))
}

/// Inflate a zlib stream that must expand to exactly `expected` bytes.
fn inflate(payload: &[u8], expected: u64) -> std::result::Result<Vec<u8>, String> {
    let limit = (payload.len() as u64).saturating_mul(MAX_RATIO).max(4096);
    if expected > limit {
        return Err(format!(
            "claimed size {expected:#x} is implausible for {:#x} compressed bytes",
            payload.len()
        ));
    }
    let mut out = Vec::with_capacity(expected as usize);
    ZlibDecoder::new(payload)
        .take(expected + 1)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 != expected {
        return Err(format!(
            "expanded to {:#x} bytes, header says {expected:#x}",
            out.len()
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{ElfClass, Endianness};
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const BE32: Codec = Codec::new(ElfClass::Elf32, Endianness::Big);

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_chdr_zlib() {
        let body = b"hello, compressed world".repeat(4);
        let mut section = vec![0u8; 24];
        LE64.put_u32(&mut section, 0, ELFCOMPRESS_ZLIB).unwrap();
        LE64.put_u64(&mut section, 8, body.len() as u64).unwrap();
        LE64.put_u64(&mut section, 16, 1).unwrap();
        section.extend(deflate(&body));
        let out = maybe_decompress(".debug_info", &section, true, LE64).unwrap();
        assert_eq!(out.as_ref(), body.as_slice());
    }

    #[test]
    fn test_legacy_prefix() {
        let body = b"legacy zdebug".to_vec();
        let mut section = b"ZLIB".to_vec();
        section.extend((body.len() as u64).to_be_bytes());
        section.extend(deflate(&body));
        let out = maybe_decompress(".zdebug_str", &section, false, BE32).unwrap();
        assert_eq!(out.as_ref(), body.as_slice());

        let plain = maybe_decompress(".debug_str", &section, false, BE32).unwrap();
        assert!(matches!(plain, Cow::Borrowed(_)));
    }

    #[test]
    fn test_failures_name_the_section() {
        let mut section = vec![0u8; 12];
        BE32.put_u32(&mut section, 0, ELFCOMPRESS_ZSTD).unwrap();
        let err = maybe_decompress(".debug_line", &section, true, BE32).unwrap_err();
        assert!(err.to_string().contains(".debug_line"));
        assert!(err.to_string().contains("zstd"));

        BE32.put_u32(&mut section, 0, ELFCOMPRESS_ZLIB).unwrap();
        BE32.put_u32(&mut section, 4, 10).unwrap();
        section.extend_from_slice(b"not zlib at all");
        assert!(matches!(
            maybe_decompress(".debug_line", &section, true, BE32),
            Err(ElfError::Decompress { .. })
        ));

        assert!(maybe_decompress(".x", &[1, 2], true, LE64).is_err());
    }

    #[test]
    fn test_size_mismatch() {
        let body = b"abcdef";
        let mut section = vec![0u8; 24];
        LE64.put_u32(&mut section, 0, ELFCOMPRESS_ZLIB).unwrap();
        LE64.put_u64(&mut section, 8, 3).unwrap();
        section.extend(deflate(body));
        let err = maybe_decompress(".debug_abbrev", &section, true, LE64).unwrap_err();
        assert!(err.to_string().contains("header says"));
    }
}
