//! # Program Header Parsing
//!
//! Program headers describe segments loaded at runtime (execution view).
//! Besides listing them, they are the only way to translate a virtual
//! address taken from the dynamic section back into a file offset, and the
//! independent source for the location of the dynamic array.

use crate::arch::{lookup, MachineCaps, Quirk};
use crate::diag::Diagnostics;
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, ElfClass};

use super::header::ElfHeader;
use super::view::FileView;

// ============================================================================
// Program Header Type Constants
// ============================================================================

/// Null entry (ignored).
pub const PT_NULL: u32 = 0;

/// Loadable segment.
pub const PT_LOAD: u32 = 1;

/// Dynamic linking information.
pub const PT_DYNAMIC: u32 = 2;

/// Interpreter path.
pub const PT_INTERP: u32 = 3;

/// Auxiliary information.
pub const PT_NOTE: u32 = 4;

/// Reserved (unused).
const PT_SHLIB: u32 = 5;

/// Program header table itself.
pub const PT_PHDR: u32 = 6;

/// Thread-local storage.
const PT_TLS: u32 = 7;

const PT_LOOS: u32 = 0x6000_0000;
const PT_HIOS: u32 = 0x6fff_ffff;
const PT_LOPROC: u32 = 0x7000_0000;
const PT_HIPROC: u32 = 0x7fff_ffff;

/// GNU extension: EH frame header.
const PT_GNU_EH_FRAME: u32 = 0x6474_e550;

/// GNU extension: stack executability.
const PT_GNU_STACK: u32 = 0x6474_e551;

/// GNU extension: read-only after relocation.
const PT_GNU_RELRO: u32 = 0x6474_e552;

/// GNU property notes.
const PT_GNU_PROPERTY: u32 = 0x6474_e553;

/// GNU SFrame stack trace information.
const PT_GNU_SFRAME: u32 = 0x6474_e554;

const PT_OPENBSD_MUTABLE: u32 = 0x65a3_dbe5;
const PT_OPENBSD_RANDOMIZE: u32 = 0x65a3_dbe6;
const PT_OPENBSD_WXNEEDED: u32 = 0x65a3_dbe7;
const PT_OPENBSD_NOBTCFI: u32 = 0x65a3_dbe8;
const PT_OPENBSD_BOOTDATA: u32 = 0x65a4_1be6;

/// Sun/illumos unwind segment (same value as the GNU EH frame on those systems).
const PT_SUNW_UNWIND: u32 = 0x6464_e550;

// ============================================================================
// Program Header Flags
// ============================================================================

/// Segment is executable.
pub const PF_X: u32 = 1;

/// Segment is writable.
pub const PF_W: u32 = 2;

/// Segment is readable.
pub const PF_R: u32 = 4;

/// Minimum on-disk size of a 32-bit program header.
pub const PHDR32_SIZE: u64 = 32;

/// Minimum on-disk size of a 64-bit program header.
pub const PHDR64_SIZE: u64 = 56;

// ============================================================================
// Types
// ============================================================================

/// Type of program header segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramType {
    /// Unused entry.
    Null,
    /// Loadable segment - will be mapped into memory.
    Load,
    /// Dynamic linking tables.
    Dynamic,
    /// Interpreter path (null-terminated string).
    Interp,
    /// Note segments (auxiliary information).
    Note,
    /// Reserved.
    Shlib,
    /// Program header table.
    Phdr,
    /// Thread-local storage template.
    Tls,
    /// GNU extension: stack executability hint.
    GnuStack,
    /// GNU extension: read-only after relocation.
    GnuRelro,
    /// GNU extension: exception handling frame.
    GnuEhFrame,
    /// GNU extension: property notes.
    GnuProperty,
    /// GNU extension: SFrame section.
    GnuSframe,
    /// OS or processor-specific, or unknown.
    Other(u32),
}

impl ProgramType {
    /// Converts a raw p_type value to a ProgramType.
    pub fn from_raw(value: u32) -> Self {
        match value {
            PT_NULL => ProgramType::Null,
            PT_LOAD => ProgramType::Load,
            PT_DYNAMIC => ProgramType::Dynamic,
            PT_INTERP => ProgramType::Interp,
            PT_NOTE => ProgramType::Note,
            PT_SHLIB => ProgramType::Shlib,
            PT_PHDR => ProgramType::Phdr,
            PT_TLS => ProgramType::Tls,
            PT_GNU_STACK => ProgramType::GnuStack,
            PT_GNU_RELRO => ProgramType::GnuRelro,
            PT_GNU_EH_FRAME => ProgramType::GnuEhFrame,
            PT_GNU_PROPERTY => ProgramType::GnuProperty,
            PT_GNU_SFRAME => ProgramType::GnuSframe,
            other => ProgramType::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            ProgramType::Null => PT_NULL,
            ProgramType::Load => PT_LOAD,
            ProgramType::Dynamic => PT_DYNAMIC,
            ProgramType::Interp => PT_INTERP,
            ProgramType::Note => PT_NOTE,
            ProgramType::Shlib => PT_SHLIB,
            ProgramType::Phdr => PT_PHDR,
            ProgramType::Tls => PT_TLS,
            ProgramType::GnuStack => PT_GNU_STACK,
            ProgramType::GnuRelro => PT_GNU_RELRO,
            ProgramType::GnuEhFrame => PT_GNU_EH_FRAME,
            ProgramType::GnuProperty => PT_GNU_PROPERTY,
            ProgramType::GnuSframe => PT_GNU_SFRAME,
            ProgramType::Other(v) => v,
        }
    }

    /// Returns a human-readable name for this segment type.
    pub fn name(&self) -> &'static str {
        match self {
            ProgramType::Null => "NULL",
            ProgramType::Load => "LOAD",
            ProgramType::Dynamic => "DYNAMIC",
            ProgramType::Interp => "INTERP",
            ProgramType::Note => "NOTE",
            ProgramType::Shlib => "SHLIB",
            ProgramType::Phdr => "PHDR",
            ProgramType::Tls => "TLS",
            ProgramType::GnuStack => "GNU_STACK",
            ProgramType::GnuRelro => "GNU_RELRO",
            ProgramType::GnuEhFrame => "GNU_EH_FRAME",
            ProgramType::GnuProperty => "GNU_PROPERTY",
            ProgramType::GnuSframe => "GNU_SFRAME",
            ProgramType::Other(_) => "UNKNOWN",
        }
    }

    /// Name for display, consulting the machine tables for reserved ranges.
    pub fn describe(&self, caps: &MachineCaps) -> String {
        let ProgramType::Other(value) = *self else {
            return self.name().to_string();
        };
        if let Some(name) = lookup(caps.segment_types, value) {
            return name.to_string();
        }
        match value {
            PT_OPENBSD_MUTABLE => "OPENBSD_MUTABLE".to_string(),
            PT_OPENBSD_RANDOMIZE => "OPENBSD_RANDOMIZE".to_string(),
            PT_OPENBSD_WXNEEDED => "OPENBSD_WXNEEDED".to_string(),
            PT_OPENBSD_NOBTCFI => "OPENBSD_NOBTCFI".to_string(),
            PT_OPENBSD_BOOTDATA => "OPENBSD_BOOTDATA".to_string(),
            PT_SUNW_UNWIND => "SUNW_UNWIND".to_string(),
            PT_LOPROC..=PT_HIPROC => format!("LOPROC+{:#x}", value - PT_LOPROC),
            PT_LOOS..=PT_HIOS => format!("LOOS+{:#x}", value - PT_LOOS),
            _ => format!("<unknown>: {value:x}"),
        }
    }
}

/// A parsed program header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramHeader {
    /// Segment type (what this segment is for).
    pub segment_type: ProgramType,

    /// Segment flags (Read, Write, Execute permissions).
    pub flags: u32,

    /// Offset in the file where segment data begins.
    pub offset: u64,

    /// Virtual address where segment should be loaded.
    pub virtual_address: u64,

    /// Physical address (rarely used, often same as virtual).
    pub physical_address: u64,

    /// Size of segment data in the file.
    /// May be less than memory_size (the difference is zero-filled).
    pub file_size: u64,

    /// Size of segment in memory.
    pub memory_size: u64,

    /// Alignment requirement for this segment.
    pub alignment: u64,
}

impl ProgramHeader {
    /// Returns true if this segment is readable.
    #[inline]
    pub fn is_readable(&self) -> bool {
        self.flags & PF_R != 0
    }

    /// Returns true if this segment is writable.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.flags & PF_W != 0
    }

    /// Returns true if this segment is executable.
    #[inline]
    pub fn is_executable(&self) -> bool {
        self.flags & PF_X != 0
    }

    /// Returns a string representation of the flags (like "R E" for read+execute).
    pub fn flags_string(&self) -> String {
        let mut s = String::with_capacity(3);
        s.push(if self.is_readable() { 'R' } else { ' ' });
        s.push(if self.is_writable() { 'W' } else { ' ' });
        s.push(if self.is_executable() { 'E' } else { ' ' });
        s
    }

    /// True if `[vaddr, vaddr + size)` lies within this segment's memory image.
    pub fn contains_vaddr(&self, vaddr: u64, size: u64) -> bool {
        vaddr >= self.virtual_address
            && vaddr
                .checked_add(size)
                .zip(self.virtual_address.checked_add(self.memory_size))
                .is_some_and(|(end, seg_end)| end <= seg_end)
    }

    /// Parses one program header from at least 32 (ELF32) or 56 (ELF64) bytes.
    ///
    /// Note: in 64-bit ELF, flags come BEFORE offset (at byte 4), for alignment.
    pub fn parse(data: &[u8], codec: Codec) -> Result<Self> {
        let header = match codec.class {
            ElfClass::Elf32 => ProgramHeader {
                segment_type: ProgramType::from_raw(codec.u32_at(data, 0)?),
                offset: u64::from(codec.u32_at(data, 4)?),
                virtual_address: u64::from(codec.u32_at(data, 8)?),
                physical_address: u64::from(codec.u32_at(data, 12)?),
                file_size: u64::from(codec.u32_at(data, 16)?),
                memory_size: u64::from(codec.u32_at(data, 20)?),
                flags: codec.u32_at(data, 24)?,
                alignment: u64::from(codec.u32_at(data, 28)?),
            },
            ElfClass::Elf64 => ProgramHeader {
                segment_type: ProgramType::from_raw(codec.u32_at(data, 0)?),
                flags: codec.u32_at(data, 4)?,
                offset: codec.u64_at(data, 8)?,
                virtual_address: codec.u64_at(data, 16)?,
                physical_address: codec.u64_at(data, 24)?,
                file_size: codec.u64_at(data, 32)?,
                memory_size: codec.u64_at(data, 40)?,
                alignment: codec.u64_at(data, 48)?,
            },
        };
        Ok(header)
    }
}

/// Load the program header table.
///
/// `count` is the already-resolved number of entries (which may come from
/// section 0 when `e_phnum` holds `PN_XNUM`). Entries larger than the known
/// record are accepted and only their known prefix is decoded.
pub fn load_program_headers(
    view: &FileView<'_>,
    header: &ElfHeader,
    count: u64,
) -> Result<Vec<ProgramHeader>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let codec = header.codec();
    let minimum = if codec.class.is_64() {
        PHDR64_SIZE
    } else {
        PHDR32_SIZE
    };
    let entsize = u64::from(header.program_header_entry_size);
    if entsize < minimum {
        return Err(ElfError::InvalidEntrySize {
            what: "program header",
            size: entsize,
            minimum,
        });
    }

    let table = view.read(header.program_header_offset, entsize, count, "program headers")?;
    table
        .chunks_exact(entsize as usize)
        .map(|entry| ProgramHeader::parse(entry, codec))
        .collect()
}

/// Translate a virtual address to a file offset through the PT_LOAD segments.
///
/// `size` bytes starting at `vaddr` must be backed by file contents of a
/// single segment.
pub fn offset_from_vaddr(segments: &[ProgramHeader], vaddr: u64, size: u64) -> Option<u64> {
    segments
        .iter()
        .filter(|seg| seg.segment_type == ProgramType::Load)
        .find(|seg| {
            vaddr >= seg.virtual_address
                && (vaddr - seg.virtual_address)
                    .checked_add(size)
                    .is_some_and(|end| end <= seg.file_size)
        })
        .map(|seg| vaddr - seg.virtual_address + seg.offset)
}

/// Facts the rest of the decoder needs from the program headers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SegmentSummary {
    /// Program interpreter path from PT_INTERP.
    pub interpreter: Option<String>,

    /// `(offset, size)` of the first usable PT_DYNAMIC segment.
    pub dynamic: Option<(u64, u64)>,
}

/// Run the per-segment sanity checks and extract the interpreter and the
/// dynamic segment location.
pub fn summarize_segments(
    view: &FileView<'_>,
    header: &ElfHeader,
    caps: &MachineCaps,
    segments: &[ProgramHeader],
) -> SegmentSummary {
    let diag: &Diagnostics = view.diag();
    let mut summary = SegmentSummary::default();
    let mut seen_load = false;
    let mut dynamic_count = 0usize;

    for (index, seg) in segments.iter().enumerate() {
        match seg.segment_type {
            ProgramType::Load => {
                seen_load = true;
                if seg.file_size > seg.memory_size {
                    diag.warn(format_args!(
                        "the segment's file size is larger than its memory size (segment {index})"
                    ));
                }
            }
            ProgramType::Phdr => {
                if seen_load {
                    diag.warn("the PHDR segment must occur before any LOAD segment");
                }
                let covered = segments.iter().any(|s| {
                    s.segment_type == ProgramType::Load
                        && s.contains_vaddr(seg.virtual_address, seg.file_size)
                });
                if !covered {
                    diag.warn("the PHDR segment is not covered by a LOAD segment");
                }
            }
            ProgramType::Dynamic => {
                dynamic_count += 1;
                if dynamic_count > 1 {
                    diag.warn("more than one dynamic segment");
                    continue;
                }
                if seg.file_size == 0 {
                    if !caps.has_quirk(header.os_abi(), Quirk::ZeroSizeDynamicSegment) {
                        diag.warn("the dynamic segment has a zero file size");
                    }
                    continue;
                }
                if !view.contains(seg.offset, seg.file_size) {
                    diag.warn("the dynamic segment offset + size exceeds the size of the file");
                    continue;
                }
                summary.dynamic = Some((seg.offset, seg.file_size));
            }
            ProgramType::Interp => {
                summary.interpreter = read_interpreter(view, seg);
            }
            _ => {}
        }
        if seg.segment_type != ProgramType::Dynamic
            && seg.file_size > 0
            && !view.contains(seg.offset, seg.file_size)
        {
            diag.warn(format_args!("segment {index} extends beyond the end of the file"));
        }
    }
    summary
}

fn read_interpreter(view: &FileView<'_>, seg: &ProgramHeader) -> Option<String> {
    if seg.offset >= view.size() {
        view.diag().warn("Unable to find program interpreter name");
        return None;
    }
    let available = (view.size() - seg.offset).min(seg.file_size);
    let bytes = view
        .read_bytes(seg.offset, available, "program interpreter")
        .ok()?;
    let Some(nul) = bytes.iter().position(|&b| b == 0) else {
        view.diag().warn("the program interpreter name is not NUL terminated");
        return Some(String::from_utf8_lossy(bytes).into_owned());
    };
    Some(String::from_utf8_lossy(&bytes[..nul]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch;
    use crate::utils::Endianness;

    fn seg(segment_type: ProgramType, offset: u64, vaddr: u64, size: u64) -> ProgramHeader {
        ProgramHeader {
            segment_type,
            flags: PF_R,
            offset,
            virtual_address: vaddr,
            physical_address: vaddr,
            file_size: size,
            memory_size: size,
            alignment: 0x1000,
        }
    }

    #[test]
    fn test_program_type_names() {
        assert_eq!(ProgramType::Load.name(), "LOAD");
        assert_eq!(ProgramType::GnuRelro.name(), "GNU_RELRO");
        assert_eq!(ProgramType::Other(0x12345).name(), "UNKNOWN");
        let generic = &arch::GENERIC;
        assert_eq!(ProgramType::Other(0x12345).describe(generic), "<unknown>: 12345");
        assert_eq!(ProgramType::Other(0x7000_0005).describe(generic), "LOPROC+0x5");
        assert_eq!(
            ProgramType::Other(0x7000_0001).describe(arch::caps(arch::EM_ARM)),
            "EXIDX"
        );
    }

    #[test]
    fn test_flags_string() {
        let mut ph = seg(ProgramType::Load, 0, 0, 0);
        ph.flags = PF_R | PF_X;
        assert_eq!(ph.flags_string(), "R E");
        assert!(ph.is_executable());
        assert!(!ph.is_writable());
    }

    #[test]
    fn test_parse_both_classes() {
        let le64 = Codec::new(ElfClass::Elf64, Endianness::Little);
        let mut raw = vec![0u8; 56];
        le64.put_u32(&mut raw, 0, PT_LOAD).unwrap();
        le64.put_u32(&mut raw, 4, PF_R | PF_W).unwrap();
        le64.put_u64(&mut raw, 8, 0x1000).unwrap();
        le64.put_u64(&mut raw, 16, 0x40_1000).unwrap();
        le64.put_u64(&mut raw, 32, 0x200).unwrap();
        let ph = ProgramHeader::parse(&raw, le64).unwrap();
        assert_eq!(ph.segment_type, ProgramType::Load);
        assert_eq!(ph.flags_string(), "RW ");
        assert_eq!(ph.file_size, 0x200);

        let be32 = Codec::new(ElfClass::Elf32, Endianness::Big);
        let mut raw = vec![0u8; 32];
        be32.put_u32(&mut raw, 0, PT_DYNAMIC).unwrap();
        be32.put_u32(&mut raw, 4, 0x80).unwrap();
        be32.put_u32(&mut raw, 24, PF_R).unwrap();
        let ph = ProgramHeader::parse(&raw, be32).unwrap();
        assert_eq!(ph.segment_type, ProgramType::Dynamic);
        assert_eq!(ph.offset, 0x80);
        assert_eq!(ph.flags, PF_R);
        assert!(ProgramHeader::parse(&raw[..20], be32).is_err());
    }

    #[test]
    fn test_offset_from_vaddr() {
        let segments = [
            seg(ProgramType::Phdr, 0x40, 0x40_0040, 0x100),
            seg(ProgramType::Load, 0, 0x40_0000, 0x1000),
            seg(ProgramType::Load, 0x1000, 0x60_0000, 0x200),
        ];
        assert_eq!(offset_from_vaddr(&segments, 0x40_0100, 8), Some(0x100));
        assert_eq!(offset_from_vaddr(&segments, 0x60_01f8, 8), Some(0x11f8));
        assert_eq!(offset_from_vaddr(&segments, 0x60_01fc, 8), None);
        assert_eq!(offset_from_vaddr(&segments, 0x50_0000, 1), None);
    }

    #[test]
    fn test_zero_size_dynamic_segment_quirk() {
        let mut bytes = vec![0u8; 0x100];
        bytes[0x80..0x8c].copy_from_slice(b"/lib/ld.so\0\0");
        let mut ident = [0u8; 16];
        ident[..4].copy_from_slice(&super::super::header::ELF_MAGIC);
        ident[4] = 2;
        ident[5] = 1;
        ident[7] = arch::ELFOSABI_HPUX;
        bytes[..16].copy_from_slice(&ident);
        let header = ElfHeader::parse_bytes(&{
            let mut h = bytes[..64].to_vec();
            h[18] = arch::EM_PARISC as u8;
            h
        })
        .unwrap();
        let segments = [
            seg(ProgramType::Interp, 0x80, 0x80, 0x10),
            seg(ProgramType::Dynamic, 0, 0, 0),
        ];

        let diag = Diagnostics::new();
        let view = FileView::new(&bytes, &diag);
        let summary = summarize_segments(&view, &header, arch::caps(arch::EM_PARISC), &segments);
        assert_eq!(summary.interpreter.as_deref(), Some("/lib/ld.so"));
        assert_eq!(summary.dynamic, None);
        assert!(diag.is_empty());

        let diag = Diagnostics::new();
        let view = FileView::new(&bytes, &diag);
        summarize_segments(&view, &header, arch::caps(arch::EM_X86_64), &segments);
        assert!(diag.mentions("zero file size"));
    }

    #[test]
    fn test_phdr_checks() {
        let bytes = vec![0u8; 0x2000];
        let diag = Diagnostics::new();
        let view = FileView::new(&bytes, &diag);
        let header = ElfHeader::parse_bytes(&{
            let mut h = vec![0u8; 64];
            h[..4].copy_from_slice(&super::super::header::ELF_MAGIC);
            h[4] = 2;
            h[5] = 1;
            h
        })
        .unwrap();
        let segments = [
            seg(ProgramType::Load, 0, 0x40_0000, 0x1000),
            seg(ProgramType::Phdr, 0x40, 0x90_0000, 0x38),
            seg(ProgramType::Dynamic, 0x100, 0x40_0100, 0x20),
            seg(ProgramType::Dynamic, 0x100, 0x40_0100, 0x20),
        ];
        let summary = summarize_segments(&view, &header, &arch::GENERIC, &segments);
        assert!(diag.mentions("must occur before any LOAD"));
        assert!(diag.mentions("not covered by a LOAD"));
        assert!(diag.mentions("more than one dynamic segment"));
        assert_eq!(summary.dynamic, Some((0x100, 0x20)));
    }
}
