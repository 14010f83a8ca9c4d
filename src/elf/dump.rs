//! # Section Dumps
//!
//! Raw renderings of section bytes: a hex and ASCII listing, extraction of
//! the printable strings, and a simulated application of the section's
//! relocations to a scratch copy before it is listed.

use std::fmt::Write as _;

use crate::arch::{MachineCaps, RelocEffect};
use crate::diag::Diagnostics;
use crate::utils::{decode_uleb128, encode_uleb128, Codec};

// ============================================================================
// Hex dump
// ============================================================================

/// Bytes per hex dump line.
const HEX_LINE: usize = 16;

/// One line per 16 bytes: address, four groups of four bytes, ASCII.
pub fn hex_lines(data: &[u8], base: u64) -> Vec<String> {
    data.chunks(HEX_LINE)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("  0x{:08x} ", base.wrapping_add((i * HEX_LINE) as u64));
            for j in 0..HEX_LINE {
                match chunk.get(j) {
                    Some(b) => {
                        let _ = write!(line, "{b:02x}");
                    }
                    None => line.push_str("  "),
                }
                if j % 4 == 3 {
                    line.push(' ');
                }
            }
            line.extend(chunk.iter().map(|&b| {
                if (0x20..0x7f).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            }));
            line
        })
        .collect()
}

// ============================================================================
// String dump
// ============================================================================

/// How multibyte characters are shown in a string dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnicodePolicy {
    /// Print the character as-is.
    #[default]
    Locale,
    /// `\uXXXX`.
    Escape,
    /// `<e2><82><ac>`.
    Hex,
    /// Escaped, in reverse video.
    Highlight,
}

/// A printable string found in a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    pub offset: usize,
    pub text: String,
}

/// Extract the strings of `data`.
///
/// A NUL ends a string; a newline ends the displayed run and the text after
/// it is listed as its own entry. Other control characters are shown as
/// `^X`, invalid UTF-8 bytes as `<xx>`. Strings shorter than `min_len`
/// characters are dropped.
pub fn strings(data: &[u8], policy: UnicodePolicy, min_len: usize) -> Vec<StringEntry> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        if matches!(data[pos], 0 | b'\n') {
            pos += 1;
            continue;
        }
        let start = pos;
        let mut text = String::new();
        let mut chars = 0usize;
        while pos < data.len() && !matches!(data[pos], 0 | b'\n') {
            let b = data[pos];
            if b < 0x80 {
                if b.is_ascii_control() {
                    text.push('^');
                    text.push((b ^ 0x40) as char);
                } else {
                    text.push(b as char);
                }
                pos += 1;
            } else {
                let len = utf8_len(&data[pos..]);
                if len == 0 {
                    let _ = write!(text, "<{b:02x}>");
                    pos += 1;
                } else {
                    render_multibyte(&data[pos..pos + len], policy, &mut text);
                    pos += len;
                }
            }
            chars += 1;
        }
        if chars >= min_len.max(1) {
            out.push(StringEntry {
                offset: start,
                text,
            });
        }
    }
    out
}

/// Length of the valid UTF-8 sequence at the start of `data`, or 0.
fn utf8_len(data: &[u8]) -> usize {
    let want = match data[0] {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return 0,
    };
    match data.get(..want).map(std::str::from_utf8) {
        Some(Ok(_)) => want,
        _ => 0,
    }
}

fn render_multibyte(seq: &[u8], policy: UnicodePolicy, out: &mut String) {
    let Some(ch) = std::str::from_utf8(seq).ok().and_then(|s| s.chars().next()) else {
        return;
    };
    match policy {
        UnicodePolicy::Locale => out.push(ch),
        UnicodePolicy::Escape => {
            let _ = write!(out, "\\u{:04x}", ch as u32);
        }
        UnicodePolicy::Hex => {
            for b in seq {
                let _ = write!(out, "<{b:02x}>");
            }
        }
        UnicodePolicy::Highlight => {
            let _ = write!(out, "\x1b[7m\\u{:04x}\x1b[0m", ch as u32);
        }
    }
}

// ============================================================================
// Relocation application
// ============================================================================

/// One relocation to apply to a section copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    /// Offset within the section.
    pub offset: u64,
    pub rtype: u32,
    /// Value of the referenced symbol (`S`).
    pub symbol_value: u64,
    /// Explicit addend; `None` for REL, whose addend is the bytes in place.
    pub addend: Option<i64>,
}

/// Apply `patches` to a copy of `data` and return the copy.
///
/// `address` is the section's load address, used for PC-relative kinds.
/// Relocation types the machine does not list as safe to simulate, and
/// offsets outside the section, are reported and skipped.
pub fn apply_relocations(
    data: &[u8],
    address: u64,
    patches: &[Patch],
    codec: Codec,
    caps: &MachineCaps,
    section: &str,
    diag: &Diagnostics,
) -> Vec<u8> {
    let mut out = data.to_vec();
    for patch in patches {
        let Some(effect) = caps.reloc_effect(patch.rtype) else {
            diag.warn(format_args!(
                "unable to apply unsupported reloc type {} to section {section}",
                patch.rtype
            ));
            continue;
        };
        if apply_one(&mut out, address, patch, effect, codec).is_none() {
            diag.warn(format_args!(
                "skipping invalid relocation offset {:#x} in section {section}",
                patch.offset
            ));
        }
    }
    out
}

/// Apply one relocation; `None` if it does not fit in the buffer.
fn apply_one(
    buf: &mut [u8],
    address: u64,
    patch: &Patch,
    effect: RelocEffect,
    codec: Codec,
) -> Option<()> {
    let off = usize::try_from(patch.offset).ok()?;
    let in_place = |buf: &[u8], width: u8| codec.uint_at(buf, off, usize::from(width)).ok();
    let addend = |buf: &[u8], width: u8| -> Option<u64> {
        match patch.addend {
            Some(a) => Some(a as u64),
            None => in_place(buf, width),
        }
    };
    let value = |a: u64| patch.symbol_value.wrapping_add(a);
    let store = |buf: &mut [u8], width: u8, v: u64| {
        codec.put_uint(buf, off, usize::from(width), v).ok()
    };

    match effect {
        RelocEffect::None => {
            buf.get(off)?;
        }
        RelocEffect::Abs(w) | RelocEffect::Set(w) => {
            let a = addend(buf, w)?;
            store(buf, w, value(a))?;
        }
        RelocEffect::PcRel(w) => {
            let a = addend(buf, w)?;
            let place = address.wrapping_add(patch.offset);
            store(buf, w, value(a).wrapping_sub(place))?;
        }
        RelocEffect::Add(w) => {
            let old = in_place(buf, w)?;
            let a = patch.addend.unwrap_or(0) as u64;
            store(buf, w, old.wrapping_add(value(a)))?;
        }
        RelocEffect::Sub(w) => {
            let old = in_place(buf, w)?;
            let a = patch.addend.unwrap_or(0) as u64;
            store(buf, w, old.wrapping_sub(value(a)))?;
        }
        RelocEffect::Add6 | RelocEffect::Sub6 | RelocEffect::Set6 => {
            let byte = buf.get_mut(off)?;
            let v = value(patch.addend.unwrap_or(0) as u64) as u8;
            let low = match effect {
                RelocEffect::Add6 => (*byte).wrapping_add(v),
                RelocEffect::Sub6 => (*byte).wrapping_sub(v),
                _ => v,
            };
            *byte = (*byte & 0xc0) | (low & 0x3f);
        }
        RelocEffect::UlebSet | RelocEffect::UlebAdd | RelocEffect::UlebSub => {
            let (old, len) = decode_uleb128(buf.get(off..)?)?;
            let v = value(patch.addend.unwrap_or(0) as u64);
            let new = match effect {
                RelocEffect::UlebAdd => old.wrapping_add(v),
                RelocEffect::UlebSub => old.wrapping_sub(v),
                _ => v,
            };
            let bits = (7 * len).min(64);
            let masked = if bits == 64 { new } else { new & ((1u64 << bits) - 1) };
            let encoded = encode_uleb128(masked, len);
            buf.get_mut(off..off + len)?.copy_from_slice(&encoded[..len]);
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{self, EM_RISCV, EM_X86_64};
    use crate::utils::{ElfClass, Endianness};

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);

    #[test]
    fn test_hex_lines() {
        let data: Vec<u8> = (0x41..0x41 + 20).collect();
        let lines = hex_lines(&data, 0x1000);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "  0x00001000 41424344 45464748 494a4b4c 4d4e4f50 ABCDEFGHIJKLMNOP"
        );
        assert_eq!(lines[1], format!("  0x00001010 51525354{}QRST", " ".repeat(28)));
        assert_eq!(hex_lines(&[0, 0x7f], 0)[0].trim_end().rsplit(' ').next(), Some(".."));
    }

    #[test]
    fn test_strings() {
        let data = b"\0GCC: (GNU) 12\0\0a\x01b\nnext\0caf\xc3\xa9\0\xff";
        let found = strings(data, UnicodePolicy::Locale, 1);
        let texts: Vec<&str> = found.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["GCC: (GNU) 12", "a^Ab", "next", "café", "<ff>"]);
        assert_eq!(found[0].offset, 1);
        assert_eq!(found[2].offset, 20);

        let escaped = strings(b"caf\xc3\xa9", UnicodePolicy::Escape, 1);
        assert_eq!(escaped[0].text, "caf\\u00e9");
        let hex = strings(b"caf\xc3\xa9", UnicodePolicy::Hex, 1);
        assert_eq!(hex[0].text, "caf<c3><a9>");

        let long = strings(b"ab\0abcd\0", UnicodePolicy::Locale, 3);
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].text, "abcd");
    }

    #[test]
    fn test_apply_abs_and_pcrel() {
        let caps = arch::caps(EM_X86_64);
        let data = vec![0u8; 16];
        let patches = [
            Patch {
                offset: 0,
                rtype: 1,
                symbol_value: 0x1000,
                addend: Some(8),
            },
            Patch {
                offset: 8,
                rtype: 2,
                symbol_value: 0x20,
                addend: Some(-4),
            },
            Patch {
                offset: 14,
                rtype: 1,
                symbol_value: 0,
                addend: Some(0),
            },
            Patch {
                offset: 0,
                rtype: 9999,
                symbol_value: 0,
                addend: None,
            },
        ];
        let diag = Diagnostics::new();
        let out = apply_relocations(&data, 0, &patches, LE64, caps, ".data", &diag);
        assert_eq!(LE64.u64_at(&out, 0).unwrap(), 0x1008);
        assert_eq!(LE64.u32_at(&out, 8).unwrap(), 0x20 - 4 - 8);
        assert_eq!(data, vec![0u8; 16]);
        assert!(diag.mentions("skipping invalid relocation offset 0xe"));
        assert!(diag.mentions("unsupported reloc type 9999"));
    }

    #[test]
    fn test_apply_riscv_in_place_idioms() {
        let caps = arch::caps(EM_RISCV);
        let mut data = vec![0u8; 8];
        LE64.put_u32(&mut data, 0, 100).unwrap();
        data[4] = 0xc5;
        data[5] = 0x80 | 0x05;
        data[6] = 0x00;
        let patches = [
            Patch {
                offset: 0,
                rtype: 35,
                symbol_value: 10,
                addend: Some(2),
            },
            Patch {
                offset: 4,
                rtype: 53,
                symbol_value: 0x3f,
                addend: Some(0),
            },
            Patch {
                offset: 5,
                rtype: 61,
                symbol_value: 3,
                addend: Some(0),
            },
        ];
        let diag = Diagnostics::new();
        let out = apply_relocations(&data, 0, &patches, LE64, caps, ".text", &diag);
        assert_eq!(LE64.u32_at(&out, 0).unwrap(), 112);
        assert_eq!(out[4], 0xff);
        assert_eq!((out[5], out[6]), (0x82, 0x00));
        assert!(diag.is_empty());
    }
}
