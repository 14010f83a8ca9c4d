//! # Build Attributes
//!
//! Decoder for `SHT_GNU_ATTRIBUTES` and the processor attribute sections
//! (`.ARM.attributes`, `.riscv.attributes`, `.c6xabi.attributes`, ...).
//!
//! Layout: a format byte `'A'`, then vendor blocks (`u32` length, vendor
//! name, sub-sections). Each sub-section is a ULEB128 scope tag (file,
//! section or symbol), a `u32` length, for section/symbol scope a
//! zero-terminated list of indices, and then tag/value pairs. How a value is
//! encoded depends on the vendor's tag table; tags missing from the table
//! follow the generic convention.

use crate::arch::{EM_MIPS, EM_MIPS_RS3_LE, EM_PPC, EM_PPC64, EM_SPARC, EM_SPARC32PLUS, EM_SPARCV9};
use crate::diag::Diagnostics;
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, Cursor};

/// The only attribute format version in use.
pub const FORMAT_VERSION: u8 = b'A';

const TAG_FILE: u64 = 1;
const TAG_SECTION: u64 = 2;
const TAG_SYMBOL: u64 = 3;

// ============================================================================
// Tag tables
// ============================================================================

/// How a tag's value is encoded and shown.
#[derive(Debug, Clone, Copy)]
pub enum AttrKind {
    Uleb,
    /// ULEB128 shown in hex.
    Hex,
    Str,
    /// ULEB128 indexing a list of display names.
    Enum(&'static [&'static str]),
    /// ULEB128 byte count shown as `N-bytes`.
    Bytes,
    /// A single architecture profile character (ARM `Tag_CPU_arch_profile`).
    Profile,
    /// ULEB128 flag followed by a vendor string.
    Compat,
    /// A nested tag/value pair (ARM `Tag_also_compatible_with`).
    Nested,
}

struct AttrTag {
    tag: u64,
    name: &'static str,
    kind: AttrKind,
}

const fn t(tag: u64, name: &'static str, kind: AttrKind) -> AttrTag {
    AttrTag { tag, name, kind }
}

use AttrKind::{Bytes, Compat, Enum, Hex, Nested, Profile, Str, Uleb};

const NOT_ALLOWED: &[&str] = &["Not Allowed", "Allowed"];
const UNUSED_NEEDED: &[&str] = &["Unused", "Needed"];

static ARM_TAGS: &[AttrTag] = &[
    t(4, "Tag_CPU_raw_name", Str),
    t(5, "Tag_CPU_name", Str),
    t(6, "Tag_CPU_arch", Enum(&[
        "Pre-v4", "v4", "v4T", "v5T", "v5TE", "v5TEJ", "v6", "v6KZ", "v6T2", "v6K", "v7",
        "v6-M", "v6S-M", "v7E-M", "v8", "v8-R", "v8-M.baseline", "v8-M.mainline", "v8.1-A",
        "v8.2-A", "v8.3-A", "v8.1-M.mainline", "v9",
    ])),
    t(7, "Tag_CPU_arch_profile", Profile),
    t(8, "Tag_ARM_ISA_use", Enum(&["No", "Yes"])),
    t(9, "Tag_THUMB_ISA_use", Enum(&["No", "Thumb-1", "Thumb-2", "Yes"])),
    t(10, "Tag_FP_arch", Enum(&[
        "No", "VFPv1", "VFPv2", "VFPv3", "VFPv3-D16", "VFPv4", "VFPv4-D16", "FP for ARMv8",
        "FPv5/FP-D16 for ARMv8",
    ])),
    t(11, "Tag_WMMX_arch", Enum(&["No", "WMMXv1", "WMMXv2"])),
    t(12, "Tag_Advanced_SIMD_arch", Enum(&[
        "No", "NEONv1", "NEONv1 with Fused-MAC", "NEON for ARMv8", "NEON for ARMv8.1",
    ])),
    t(13, "Tag_PCS_config", Enum(&[
        "None", "Bare platform", "Linux application", "Linux DSO", "PalmOS 2004",
        "PalmOS (reserved)", "SymbianOS 2004", "SymbianOS (reserved)",
    ])),
    t(14, "Tag_ABI_PCS_R9_use", Enum(&["V6", "SB", "TLS", "Unused"])),
    t(15, "Tag_ABI_PCS_RW_data", Enum(&["Absolute", "PC-relative", "SB-relative", "None"])),
    t(16, "Tag_ABI_PCS_RO_data", Enum(&["Absolute", "PC-relative", "None"])),
    t(17, "Tag_ABI_PCS_GOT_use", Enum(&["None", "direct", "GOT-indirect"])),
    t(18, "Tag_ABI_PCS_wchar_t", Enum(&["None", "??? 1", "2", "??? 3", "4"])),
    t(19, "Tag_ABI_FP_rounding", Enum(&["Unused", "Needed"])),
    t(20, "Tag_ABI_FP_denormal", Enum(&["Unused", "Needed", "Sign only"])),
    t(21, "Tag_ABI_FP_exceptions", Enum(UNUSED_NEEDED)),
    t(22, "Tag_ABI_FP_user_exceptions", Enum(UNUSED_NEEDED)),
    t(23, "Tag_ABI_FP_number_model", Enum(&["Unused", "Finite", "RTABI", "IEEE 754"])),
    t(24, "Tag_ABI_align_needed", Enum(&["None", "8-byte", "4-byte", "??? 3"])),
    t(25, "Tag_ABI_align_preserved", Enum(&["None", "8-byte, except leaf SP", "8-byte", "??? 3"])),
    t(26, "Tag_ABI_enum_size", Enum(&["Unused", "small", "int", "forced to int"])),
    t(27, "Tag_ABI_HardFP_use", Enum(&["As Tag_FP_arch", "SP only", "Reserved", "Deprecated"])),
    t(28, "Tag_ABI_VFP_args", Enum(&["AAPCS", "VFP registers", "custom", "compatible"])),
    t(29, "Tag_ABI_WMMX_args", Enum(&["AAPCS", "WMMX registers", "custom"])),
    t(30, "Tag_ABI_optimization_goals", Enum(&[
        "None", "Prefer Speed", "Aggressive Speed", "Prefer Size", "Aggressive Size",
        "Prefer Debug", "Aggressive Debug",
    ])),
    t(31, "Tag_ABI_FP_optimization_goals", Enum(&[
        "None", "Prefer Speed", "Aggressive Speed", "Prefer Size", "Aggressive Size",
        "Prefer Accuracy", "Aggressive Accuracy",
    ])),
    t(32, "Tag_compatibility", Compat),
    t(34, "Tag_CPU_unaligned_access", Enum(&["None", "v6"])),
    t(36, "Tag_FP_HP_extension", Enum(&["Not Allowed", "Allowed"])),
    t(38, "Tag_ABI_FP_16bit_format", Enum(&["None", "IEEE 754", "Alternative Format"])),
    t(42, "Tag_MPextension_use", Enum(NOT_ALLOWED)),
    t(44, "Tag_DIV_use", Enum(&[
        "Allowed in Thumb-ISA, v7-R or v7-M", "Not allowed",
        "Allowed in v7-A with integer division extension",
    ])),
    t(46, "Tag_DSP_extension", Enum(&["Follow architecture", "Allowed"])),
    t(48, "Tag_MVE_arch", Enum(&["No MVE", "MVE Integer only", "MVE Integer and FP"])),
    t(50, "Tag_PAC_extension", Enum(&["No PAC/AUT instructions", "PAC/AUT instructions permitted in the NOP space", "PAC/AUT instructions permitted in the NOP and in the non-NOP space"])),
    t(52, "Tag_BTI_extension", Enum(&["BTI instructions not permitted", "BTI instructions permitted in the NOP space", "BTI instructions permitted in the NOP and in the non-NOP space"])),
    t(64, "Tag_nodefaults", Uleb),
    t(65, "Tag_also_compatible_with", Nested),
    t(66, "Tag_T2EE_use", Enum(NOT_ALLOWED)),
    t(67, "Tag_conformance", Str),
    t(68, "Tag_Virtualization_use", Enum(&[
        "Not Allowed", "TrustZone", "Virtualization Extensions",
        "TrustZone and Virtualization Extensions",
    ])),
    t(70, "Tag_MPextension_use_legacy", Enum(NOT_ALLOWED)),
    t(74, "Tag_BTI_use", Enum(&["Not Used", "Used"])),
    t(76, "Tag_PACRET_use", Enum(&["Not Used", "Used"])),
];

static RISCV_TAGS: &[AttrTag] = &[
    t(4, "Tag_RISCV_stack_align", Bytes),
    t(5, "Tag_RISCV_arch", Str),
    t(6, "Tag_RISCV_unaligned_access", Enum(&["No unaligned access", "Unaligned access"])),
    t(8, "Tag_RISCV_priv_spec", Uleb),
    t(10, "Tag_RISCV_priv_spec_minor", Uleb),
    t(12, "Tag_RISCV_priv_spec_revision", Uleb),
    t(14, "Tag_RISCV_atomic_abi", Enum(&["UNKNOWN", "A6C", "A6S", "A7"])),
    t(16, "Tag_RISCV_x3_reg_usage", Uleb),
];

static C6000_TAGS: &[AttrTag] = &[
    t(4, "Tag_ISA", Enum(&["None", "C62x", "C67x", "C67x+", "C64x", "C64x+", "C674x"])),
    t(6, "Tag_ABI_wchar_t", Enum(&["Not used", "2 bytes", "4 bytes"])),
    t(8, "Tag_ABI_stack_align_needed", Enum(&["8-byte", "16-byte"])),
    t(10, "Tag_ABI_stack_align_preserved", Enum(&["8-byte", "16-byte"])),
    t(12, "Tag_ABI_DSBT", Enum(&["DSBT addressing not used", "DSBT addressing used"])),
    t(14, "Tag_ABI_PID", Enum(&[
        "Data addressing position-dependent",
        "Data addressing position-independent, GOT near DP",
        "Data addressing position-independent, GOT far from DP",
    ])),
    t(16, "Tag_ABI_PIC", Enum(&["Code addressing position-dependent", "Code addressing position-independent"])),
    t(18, "Tag_ABI_array_object_alignment", Enum(&["8-byte", "4-byte", "16-byte"])),
    t(20, "Tag_ABI_array_object_align_expected", Enum(&["8-byte", "4-byte", "16-byte"])),
    t(32, "Tag_ABI_compatibility", Compat),
    t(65, "Tag_ABI_conformance", Str),
];

static GNU_TAGS: &[AttrTag] = &[t(32, "Tag_compatibility", Compat)];

static GNU_POWER_TAGS: &[AttrTag] = &[
    t(4, "Tag_GNU_Power_ABI_FP", Enum(&[
        "Hard or soft float", "Hard float", "Soft float", "Single-precision hard float",
    ])),
    t(8, "Tag_GNU_Power_ABI_Vector", Enum(&["Any", "Generic", "AltiVec", "SPE"])),
    t(12, "Tag_GNU_Power_ABI_Struct_Return", Enum(&["Any", "r3/r4", "Memory"])),
];

static GNU_MIPS_TAGS: &[AttrTag] = &[
    t(4, "Tag_GNU_MIPS_ABI_FP", Enum(&[
        "Hard or soft float", "Hard float (double precision)", "Hard float (single precision)",
        "Soft float", "Hard float (MIPS32r2 64-bit FPU 12 callee-saved)",
        "Hard float (32-bit CPU, Any FPU)", "Hard float (32-bit CPU, 64-bit FPU)",
        "Hard float compat (32-bit CPU, 64-bit FPU)", "NaN 2008 compatibility",
    ])),
    t(8, "Tag_GNU_MIPS_ABI_MSA", Enum(&["Any MSA or not", "128-bit MSA"])),
];

static GNU_SPARC_TAGS: &[AttrTag] = &[
    t(4, "Tag_GNU_Sparc_HWCAPS", Hex),
    t(8, "Tag_GNU_Sparc_HWCAPS2", Hex),
];

/// The tag tables that apply to `vendor` in a file for `machine`.
fn vendor_tables(vendor: &str, machine: u16) -> (&'static [AttrTag], &'static [AttrTag]) {
    match vendor {
        "aeabi" => (ARM_TAGS, &[]),
        "riscv" => (RISCV_TAGS, &[]),
        "c6xabi" => (C6000_TAGS, &[]),
        "gnu" => {
            let proc_tags: &'static [AttrTag] = match machine {
                EM_PPC | EM_PPC64 => GNU_POWER_TAGS,
                EM_MIPS | EM_MIPS_RS3_LE => GNU_MIPS_TAGS,
                EM_SPARC | EM_SPARC32PLUS | EM_SPARCV9 => GNU_SPARC_TAGS,
                _ => &[],
            };
            (GNU_TAGS, proc_tags)
        }
        _ => (&[], &[]),
    }
}

// ============================================================================
// Decoded form
// ============================================================================

/// What a sub-section's attributes apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    File,
    Section(Vec<u64>),
    Symbol(Vec<u64>),
    Unknown(u64),
}

/// One decoded attribute: its display name and value text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub tag: u64,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubSection {
    pub scope: Scope,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorBlock {
    pub vendor: String,
    pub subsections: Vec<SubSection>,
}

/// Parse a whole attribute section.
///
/// A length that runs past the data is reported and truncated to what is
/// there; a block that cannot be parsed further ends the walk.
pub fn parse_attributes(
    data: &[u8],
    codec: Codec,
    machine: u16,
    diag: &Diagnostics,
) -> Result<Vec<VendorBlock>> {
    let mut c = Cursor::new(data);
    match c.u8() {
        Some(FORMAT_VERSION) => {}
        Some(other) => {
            return Err(ElfError::Unsupported(format!(
                "attribute section version {:?} ({other:#x})",
                other as char
            )))
        }
        None => return Ok(Vec::new()),
    }

    let mut blocks = Vec::new();
    while !c.is_empty() {
        let Some(len) = c.u32(codec) else {
            diag.warn("Corrupt attribute section: truncated vendor block length");
            break;
        };
        let body_len = len as usize;
        if body_len < 4 {
            diag.warn(format_args!("Tag section ends prematurely (length {len:#x})"));
            break;
        }
        let available = c.remaining();
        let body_len = if body_len - 4 > available {
            diag.warn(format_args!(
                "Bad attribute length ({len:#x} > {:#x})",
                available + 4
            ));
            available
        } else {
            body_len - 4
        };
        let Some(body) = c.bytes(body_len) else {
            break;
        };
        let mut b = Cursor::new(body);
        let vendor = match b.cstr() {
            Some(name) => String::from_utf8_lossy(name).into_owned(),
            None => {
                diag.warn("Corrupt attribute section: unterminated vendor name");
                break;
            }
        };
        let (tags, proc_tags) = vendor_tables(&vendor, machine);
        let mut subsections = Vec::new();
        while !b.is_empty() {
            match parse_subsection(&mut b, codec, tags, proc_tags, diag) {
                Some(sub) => subsections.push(sub),
                None => break,
            }
        }
        blocks.push(VendorBlock {
            vendor,
            subsections,
        });
    }
    Ok(blocks)
}

fn parse_subsection(
    c: &mut Cursor<'_>,
    codec: Codec,
    tags: &[AttrTag],
    proc_tags: &[AttrTag],
    diag: &Diagnostics,
) -> Option<SubSection> {
    let start = c.position();
    let scope_tag = c.uleb128()?;
    let Some(size) = c.u32(codec) else {
        diag.warn("Corrupt attribute sub-section: truncated length");
        return None;
    };
    let header = c.position() - start;
    let size = size as usize;
    if size < header {
        diag.warn(format_args!("Bad sub-section length {size:#x}"));
        return None;
    }
    let body_len = (size - header).min(c.remaining());
    if body_len < size - header {
        diag.warn(format_args!(
            "Bad sub-section length ({size:#x} > {:#x})",
            c.remaining() + header
        ));
    }
    let mut b = Cursor::new(c.bytes(body_len)?);

    let scope = match scope_tag {
        TAG_FILE => Scope::File,
        TAG_SECTION | TAG_SYMBOL => {
            let mut indices = Vec::new();
            loop {
                match b.uleb128() {
                    Some(0) | None => break,
                    Some(i) => indices.push(i),
                }
            }
            if scope_tag == TAG_SECTION {
                Scope::Section(indices)
            } else {
                Scope::Symbol(indices)
            }
        }
        other => {
            diag.warn(format_args!("Unknown attribute sub-section tag {other}"));
            return Some(SubSection {
                scope: Scope::Unknown(other),
                attributes: Vec::new(),
            });
        }
    };

    let mut attributes = Vec::new();
    while !b.is_empty() {
        match parse_attribute(&mut b, tags, proc_tags) {
            Some(attr) => attributes.push(attr),
            None => {
                diag.warn("Corrupt attribute: value runs past the end of the sub-section");
                break;
            }
        }
    }
    Some(SubSection { scope, attributes })
}

fn parse_attribute(c: &mut Cursor<'_>, tags: &[AttrTag], proc_tags: &[AttrTag]) -> Option<Attribute> {
    let tag = c.uleb128()?;
    let known = tags.iter().chain(proc_tags).find(|a| a.tag == tag);
    let (name, kind) = match known {
        Some(a) => (a.name.to_string(), a.kind),
        None => (format!("Tag_unknown_{tag}"), generic_kind(tag)),
    };
    let value = read_value(c, kind, tags)?;
    Some(Attribute { tag, name, value })
}

/// Tags below 32 default to integers; above that, odd tags are strings.
fn generic_kind(tag: u64) -> AttrKind {
    if tag >= 32 && tag & 1 == 1 {
        Str
    } else {
        Uleb
    }
}

fn read_value(c: &mut Cursor<'_>, kind: AttrKind, tags: &[AttrTag]) -> Option<String> {
    let string = |c: &mut Cursor<'_>| c.cstr().map(|s| String::from_utf8_lossy(s).into_owned());
    Some(match kind {
        Uleb => c.uleb128()?.to_string(),
        Hex => format!("{:#x}", c.uleb128()?),
        Str => format!("\"{}\"", string(c)?),
        Bytes => format!("{}-bytes", c.uleb128()?),
        Enum(names) => {
            let v = c.uleb128()?;
            usize::try_from(v)
                .ok()
                .and_then(|i| names.get(i))
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("??? ({v})"))
        }
        Profile => match c.uleb128()? {
            0 => "None".to_string(),
            0x41 => "Application".to_string(),
            0x52 => "Realtime".to_string(),
            0x4d => "Microcontroller".to_string(),
            0x53 => "Application or Realtime".to_string(),
            v => format!("??? ({v})"),
        },
        Compat => {
            let flag = c.uleb128()?;
            let vendor = string(c)?;
            format!("flag = {flag}, vendor = {vendor}")
        }
        Nested => {
            let inner_tag = c.uleb128()?;
            let inner = tags.iter().find(|a| a.tag == inner_tag);
            let inner_kind = inner.map_or_else(|| generic_kind(inner_tag), |a| a.kind);
            if matches!(inner_kind, Nested) {
                return None;
            }
            let name = inner.map_or_else(|| format!("Tag_unknown_{inner_tag}"), |a| a.name.to_string());
            let value = read_value(c, inner_kind, tags)?;
            format!("{name}: {value}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::EM_ARM;
    use crate::utils::{ElfClass, Endianness};

    const LE32: Codec = Codec::new(ElfClass::Elf32, Endianness::Little);

    /// Wrap attribute bytes in a file-scope sub-section and a vendor block.
    fn section(vendor: &str, attrs: &[u8]) -> Vec<u8> {
        let mut sub = vec![TAG_FILE as u8];
        sub.extend_from_slice(&((attrs.len() + 5) as u32).to_le_bytes());
        sub.extend_from_slice(attrs);
        let mut block = Vec::new();
        block.extend_from_slice(vendor.as_bytes());
        block.push(0);
        block.extend(sub);
        let mut out = vec![b'A'];
        out.extend_from_slice(&((block.len() + 4) as u32).to_le_bytes());
        out.extend(block);
        out
    }

    #[test]
    fn test_arm_attributes() {
        let diag = Diagnostics::new();
        let mut attrs = vec![5];
        attrs.extend_from_slice(b"cortex-a9\0");
        attrs.extend_from_slice(&[6, 10, 7, b'A', 26, 2, 98, 4, 101]);
        attrs.extend_from_slice(b"x\0");
        let blocks = parse_attributes(&section("aeabi", &attrs), LE32, EM_ARM, &diag).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].vendor, "aeabi");
        let sub = &blocks[0].subsections[0];
        assert_eq!(sub.scope, Scope::File);
        let values: Vec<_> = sub
            .attributes
            .iter()
            .map(|a| format!("{}: {}", a.name, a.value))
            .collect();
        assert_eq!(
            values,
            vec![
                "Tag_CPU_name: \"cortex-a9\"",
                "Tag_CPU_arch: v7",
                "Tag_CPU_arch_profile: Application",
                "Tag_ABI_enum_size: int",
                "Tag_unknown_98: 4",
                "Tag_unknown_101: \"x\"",
            ]
        );
        assert!(diag.is_empty());
    }

    #[test]
    fn test_gnu_vendor_uses_machine_table() {
        let diag = Diagnostics::new();
        let blocks = parse_attributes(&section("gnu", &[4, 1, 8, 2]), LE32, EM_PPC, &diag).unwrap();
        let attrs = &blocks[0].subsections[0].attributes;
        assert_eq!(attrs[0].name, "Tag_GNU_Power_ABI_FP");
        assert_eq!(attrs[0].value, "Hard float");
        assert_eq!(attrs[1].value, "AltiVec");
        let blocks = parse_attributes(&section("gnu", &[4, 3]), LE32, EM_MIPS, &diag).unwrap();
        assert_eq!(blocks[0].subsections[0].attributes[0].value, "Soft float");
    }

    #[test]
    fn test_riscv_and_truncation() {
        let diag = Diagnostics::new();
        let mut attrs = vec![4, 16, 5];
        attrs.extend_from_slice(b"rv64i2p1_m2p0\0");
        let blocks = parse_attributes(&section("riscv", &attrs), LE32, 243, &diag).unwrap();
        let attrs = &blocks[0].subsections[0].attributes;
        assert_eq!(attrs[0].value, "16-bytes");
        assert_eq!(attrs[1].value, "\"rv64i2p1_m2p0\"");

        // Unterminated string at the end of the sub-section.
        let blocks = parse_attributes(&section("aeabi", &[5, b'a', b'b']), LE32, EM_ARM, &diag).unwrap();
        assert!(blocks[0].subsections[0].attributes.is_empty());
        assert!(diag.mentions("Corrupt attribute"));

        // Vendor length larger than the section.
        let mut data = section("aeabi", &[8, 1]);
        data[1..5].copy_from_slice(&0x1000u32.to_le_bytes());
        let diag = Diagnostics::new();
        let blocks = parse_attributes(&data, LE32, EM_ARM, &diag).unwrap();
        assert_eq!(blocks[0].subsections[0].attributes[0].value, "Yes");
        assert!(diag.mentions("Bad attribute length"));

        assert!(matches!(
            parse_attributes(b"B", LE32, EM_ARM, &diag),
            Err(ElfError::Unsupported(_))
        ));
    }
}
