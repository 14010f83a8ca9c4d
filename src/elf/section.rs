//! # Section Header Parsing
//!
//! Section headers describe the file for linking and inspection. A handful
//! of their fields are cross-references (`sh_link`, `sh_info`, group member
//! lists) whose meaning depends on the section type; none of them is trusted
//! until it has been checked against the section count.

use std::borrow::Cow;

use bitflags::bitflags;

use crate::arch::{lookup, MachineCaps, EM_X86_64, EM_ARM};
use crate::diag::Diagnostics;
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, ElfClass};

use super::header::ElfHeader;
use super::strtab::StringTable;
use super::view::FileView;

// ============================================================================
// Section Type Constants
// ============================================================================

pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_HASH: u32 = 5;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_SHLIB: u32 = 10;
pub const SHT_DYNSYM: u32 = 11;
pub const SHT_INIT_ARRAY: u32 = 14;
pub const SHT_FINI_ARRAY: u32 = 15;
pub const SHT_PREINIT_ARRAY: u32 = 16;
pub const SHT_GROUP: u32 = 17;
pub const SHT_SYMTAB_SHNDX: u32 = 18;
pub const SHT_RELR: u32 = 19;

pub const SHT_GNU_SFRAME: u32 = 0x6fff_fff4;
pub const SHT_GNU_ATTRIBUTES: u32 = 0x6fff_fff5;
pub const SHT_GNU_HASH: u32 = 0x6fff_fff6;
pub const SHT_GNU_LIBLIST: u32 = 0x6fff_fff7;
pub const SHT_CHECKSUM: u32 = 0x6fff_fff8;
pub const SHT_GNU_VERDEF: u32 = 0x6fff_fffd;
pub const SHT_GNU_VERNEED: u32 = 0x6fff_fffe;
pub const SHT_GNU_VERSYM: u32 = 0x6fff_ffff;

const SHT_LOOS: u32 = 0x6000_0000;
const SHT_HIOS: u32 = 0x6fff_ffff;
const SHT_LOPROC: u32 = 0x7000_0000;
const SHT_HIPROC: u32 = 0x7fff_ffff;
const SHT_LOUSER: u32 = 0x8000_0000;

/// Processor-specific attribute section types (ARM, RISC-V, C6000, ...).
pub const SHT_PROC_ATTRIBUTES: u32 = 0x7000_0003;

/// Unwind table types that share one value across IA-64, ARM EXIDX and C6000.
pub const SHT_PROC_UNWIND: u32 = 0x7000_0001;

// ============================================================================
// Reserved Section Indices
// ============================================================================

pub const SHN_UNDEF: u16 = 0;
pub const SHN_LORESERVE: u16 = 0xff00;
pub const SHN_LOPROC: u16 = 0xff00;
pub const SHN_HIPROC: u16 = 0xff1f;
pub const SHN_LOOS: u16 = 0xff20;
pub const SHN_HIOS: u16 = 0xff3f;
pub const SHN_ABS: u16 = 0xfff1;
pub const SHN_COMMON: u16 = 0xfff2;
pub const SHN_XINDEX: u16 = 0xffff;

/// `e_phnum` value meaning "the real count is in section 0's sh_info".
pub const PN_XNUM: u16 = 0xffff;

/// Minimum on-disk size of a 32-bit section header.
pub const SHDR32_SIZE: u64 = 40;

/// Minimum on-disk size of a 64-bit section header.
pub const SHDR64_SIZE: u64 = 64;

/// Section group flag: COMDAT group.
pub const GRP_COMDAT: u32 = 0x1;

bitflags! {
    /// `sh_flags` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        const WRITE = 0x1;
        const ALLOC = 0x2;
        const EXECINSTR = 0x4;
        const MERGE = 0x10;
        const STRINGS = 0x20;
        const INFO_LINK = 0x40;
        const LINK_ORDER = 0x80;
        const OS_NONCONFORMING = 0x100;
        const GROUP = 0x200;
        const TLS = 0x400;
        const COMPRESSED = 0x800;
        const GNU_RETAIN = 0x0020_0000;
        const EXCLUDE = 0x8000_0000;
    }
}

const SHF_MASKOS: u64 = 0x0ff0_0000;
const SHF_MASKPROC: u64 = 0xf000_0000;
const SHF_X86_64_LARGE: u64 = 0x1000_0000;
const SHF_ARM_PURECODE: u64 = 0x2000_0000;

impl SectionFlags {
    /// The one-letter-per-flag form used in section listings.
    pub fn key_letters(self, machine: u16) -> String {
        const LETTERS: &[(SectionFlags, char)] = &[
            (SectionFlags::WRITE, 'W'),
            (SectionFlags::ALLOC, 'A'),
            (SectionFlags::EXECINSTR, 'X'),
            (SectionFlags::MERGE, 'M'),
            (SectionFlags::STRINGS, 'S'),
            (SectionFlags::INFO_LINK, 'I'),
            (SectionFlags::LINK_ORDER, 'L'),
            (SectionFlags::OS_NONCONFORMING, 'O'),
            (SectionFlags::GROUP, 'G'),
            (SectionFlags::TLS, 'T'),
            (SectionFlags::COMPRESSED, 'C'),
            (SectionFlags::GNU_RETAIN, 'R'),
            (SectionFlags::EXCLUDE, 'E'),
        ];
        let mut out: String = LETTERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|&(_, c)| c)
            .collect();

        let mut rest = self.bits() & !Self::all().bits();
        if machine == EM_X86_64 && rest & SHF_X86_64_LARGE != 0 {
            out.push('l');
            rest &= !SHF_X86_64_LARGE;
        }
        if machine == EM_ARM && rest & SHF_ARM_PURECODE != 0 {
            out.push('y');
            rest &= !SHF_ARM_PURECODE;
        }
        if rest & SHF_MASKOS != 0 {
            out.push('o');
        }
        if rest & SHF_MASKPROC != 0 {
            out.push('p');
        }
        if rest & !(SHF_MASKOS | SHF_MASKPROC) != 0 {
            out.push('x');
        }
        out
    }
}

// ============================================================================
// Types
// ============================================================================

/// A parsed section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Position in the section header table.
    pub index: usize,

    /// Offset of the name in the section-name string table.
    pub name_offset: u32,

    /// Resolved name (a placeholder when it could not be resolved).
    pub name: String,

    pub sh_type: u32,
    pub flags: SectionFlags,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

impl SectionHeader {
    /// Parses one section header from at least 40 (ELF32) or 64 (ELF64) bytes.
    pub fn parse(data: &[u8], codec: Codec, index: usize) -> Result<Self> {
        let w = codec.word_size();
        let word = |off: usize| codec.word_at(data, off);
        // ELF32: name type flags addr offset size link info align entsize (all 4 bytes)
        // ELF64: name type (4) then flags addr offset size (8), link info (4), align entsize (8)
        let after_size = 8 + 4 * w;
        Ok(SectionHeader {
            index,
            name_offset: codec.u32_at(data, 0)?,
            name: String::new(),
            sh_type: codec.u32_at(data, 4)?,
            flags: SectionFlags::from_bits_retain(word(8)?),
            addr: word(8 + w)?,
            offset: word(8 + 2 * w)?,
            size: word(8 + 3 * w)?,
            link: codec.u32_at(data, after_size)?,
            info: codec.u32_at(data, after_size + 4)?,
            addralign: word(after_size + 8)?,
            entsize: word(after_size + 8 + w)?,
        })
    }

    /// True when the section occupies no bytes in the file.
    pub fn is_nobits(&self) -> bool {
        self.sh_type == SHT_NOBITS
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.contains(SectionFlags::COMPRESSED)
    }

    /// The section's bytes, or an empty slice for SHT_NOBITS.
    pub fn data<'a>(&self, view: &FileView<'a>) -> Result<&'a [u8]> {
        if self.is_nobits() {
            return Ok(&[]);
        }
        view.read_bytes(
            self.offset,
            self.size,
            &format!("section {} ({})", self.index, self.name),
        )
    }

    /// Number of entries, for sections holding fixed-size records.
    pub fn entry_count(&self) -> u64 {
        if self.entsize == 0 {
            0
        } else {
            self.size / self.entsize
        }
    }
}

/// Minimum section header record size for `class`.
pub fn min_entry_size(class: ElfClass) -> u64 {
    if class.is_64() {
        SHDR64_SIZE
    } else {
        SHDR32_SIZE
    }
}

/// The counts the file header may defer to section 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub sections: u64,
    pub string_table_index: u32,
    pub segments: u64,
}

/// Read section 0 on its own, for the extended-count escape hatch.
///
/// Returns `None` when there is no section header table or it cannot be
/// read (the read failure has already been reported).
pub fn read_section_zero(view: &FileView<'_>, header: &ElfHeader) -> Option<SectionHeader> {
    if header.section_header_offset == 0 {
        return None;
    }
    let codec = header.codec();
    let entsize = u64::from(header.section_header_entry_size);
    if entsize < min_entry_size(codec.class) {
        return None;
    }
    let bytes = view
        .read_bytes(header.section_header_offset, entsize, "section 0 header")
        .ok()?;
    SectionHeader::parse(bytes, codec, 0).ok()
}

/// Resolve the real section count, string table index and segment count.
///
/// A zero `e_shnum` with a non-zero `e_shoff` means the count is in section
/// 0's `sh_size`; `SHN_XINDEX` in `e_shstrndx` means the index is in its
/// `sh_link`; `PN_XNUM` in `e_phnum` means the count is in its `sh_info`.
pub fn resolve_counts(header: &ElfHeader, section_zero: Option<&SectionHeader>) -> TableCounts {
    let mut counts = TableCounts {
        sections: u64::from(header.section_header_count),
        string_table_index: u32::from(header.section_name_string_table_index),
        segments: u64::from(header.program_header_count),
    };
    if let Some(zero) = section_zero {
        if counts.sections == 0 && header.section_header_offset != 0 {
            counts.sections = zero.size;
        }
        if header.section_name_string_table_index == SHN_XINDEX {
            counts.string_table_index = zero.link;
        }
        if header.program_header_count == PN_XNUM && zero.info != 0 {
            counts.segments = u64::from(zero.info);
        }
    }
    counts
}

/// Load the section header table (names are filled in by the caller).
pub fn load_section_headers(
    view: &FileView<'_>,
    header: &ElfHeader,
    count: u64,
) -> Result<Vec<SectionHeader>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let codec = header.codec();
    let minimum = min_entry_size(codec.class);
    let entsize = u64::from(header.section_header_entry_size);
    if entsize < minimum {
        return Err(ElfError::InvalidEntrySize {
            what: "section header",
            size: entsize,
            minimum,
        });
    }

    let table = view.read(header.section_header_offset, entsize, count, "section headers")?;
    table
        .chunks_exact(entsize as usize)
        .enumerate()
        .map(|(index, entry)| SectionHeader::parse(entry, codec, index))
        .collect()
}

/// Display name of a section type.
pub fn section_type_name(sh_type: u32, caps: &MachineCaps) -> String {
    let fixed = match sh_type {
        SHT_NULL => "NULL",
        SHT_PROGBITS => "PROGBITS",
        SHT_SYMTAB => "SYMTAB",
        SHT_STRTAB => "STRTAB",
        SHT_RELA => "RELA",
        SHT_HASH => "HASH",
        SHT_DYNAMIC => "DYNAMIC",
        SHT_NOTE => "NOTE",
        SHT_NOBITS => "NOBITS",
        SHT_REL => "REL",
        SHT_SHLIB => "SHLIB",
        SHT_DYNSYM => "DYNSYM",
        SHT_INIT_ARRAY => "INIT_ARRAY",
        SHT_FINI_ARRAY => "FINI_ARRAY",
        SHT_PREINIT_ARRAY => "PREINIT_ARRAY",
        SHT_GROUP => "GROUP",
        SHT_SYMTAB_SHNDX => "SYMTAB SECTION INDICES",
        SHT_RELR => "RELR",
        SHT_GNU_SFRAME => "GNU_SFRAME",
        SHT_GNU_ATTRIBUTES => "GNU_ATTRIBUTES",
        SHT_GNU_HASH => "GNU_HASH",
        SHT_GNU_LIBLIST => "GNU_LIBLIST",
        SHT_CHECKSUM => "CHECKSUM",
        SHT_GNU_VERDEF => "VERDEF",
        SHT_GNU_VERNEED => "VERNEED",
        SHT_GNU_VERSYM => "VERSYM",
        0x6fff_4c00 => "LLVM_ODRTAB",
        0x6fff_4c01 => "LLVM_LINKER_OPTIONS",
        0x6fff_4c02 => "LLVM_CALL_GRAPH_PROFILE",
        0x6fff_4c03 => "LLVM_ADDRSIG",
        0x6fff_4c04 => "LLVM_DEPENDENT_LIBRARIES",
        0x6fff_4c05 => "LLVM_SYMPART",
        0x6fff_4c0a => "LLVM_BB_ADDR_MAP",
        _ => "",
    };
    if !fixed.is_empty() {
        return fixed.to_string();
    }
    if let Some(name) = lookup(caps.section_types, sh_type) {
        return name.to_string();
    }
    match sh_type {
        SHT_LOPROC..=SHT_HIPROC => format!("LOPROC+{:#x}", sh_type - SHT_LOPROC),
        SHT_LOOS..=SHT_HIOS => format!("LOOS+{:#x}", sh_type - SHT_LOOS),
        SHT_LOUSER..=u32::MAX => format!("LOUSER+{:#x}", sh_type - SHT_LOUSER),
        _ => format!("<unknown>: {sh_type:x}"),
    }
}

/// The name of `sec` looked up strictly in the section-name table.
///
/// Used wherever the name selects further data, so a bad `sh_name` is an
/// error rather than a placeholder that could accidentally match.
pub fn strict_name<'a>(sec: &SectionHeader, names: Option<&StringTable<'a>>) -> Result<Cow<'a, str>> {
    let offset = u64::from(sec.name_offset);
    match names {
        Some(table) => table.get(offset),
        None => Err(ElfError::BadStringOffset { offset, size: 0 }),
    }
}

/// The first section called `name`.
///
/// Sections whose name cannot be resolved are reported and skipped.
pub fn find_by_name<'s>(
    sections: &'s [SectionHeader],
    names: Option<&StringTable<'_>>,
    name: &str,
    diag: &Diagnostics,
) -> Option<&'s SectionHeader> {
    let names = names?;
    sections.iter().find(|s| match names.get(u64::from(s.name_offset)) {
        Ok(n) => n == name,
        Err(e) => {
            diag.warn(format_args!("section [{}] has a corrupt name: {e}", s.index));
            false
        }
    })
}

// ============================================================================
// Section groups
// ============================================================================

/// One decoded SHT_GROUP section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionGroup {
    /// Index of the SHT_GROUP section itself.
    pub section: usize,

    /// The group flag word (`GRP_COMDAT`).
    pub flags: u32,

    /// Member section indices, in file order, already validated.
    pub members: Vec<u32>,
}

/// Decode every SHT_GROUP section.
///
/// Members outside the section table are reported and dropped; a section
/// that appears in two groups is reported and kept in the first.
pub fn parse_groups(
    view: &FileView<'_>,
    sections: &[SectionHeader],
    codec: Codec,
) -> Vec<SectionGroup> {
    let diag = view.diag();
    let mut owner: Vec<Option<usize>> = vec![None; sections.len()];
    let mut groups = Vec::new();

    for sec in sections.iter().filter(|s| s.sh_type == SHT_GROUP) {
        if sec.entsize != 0 && sec.entsize != 4 {
            diag.warn(format_args!(
                "section group [{:5}] has an unexpected entry size {:#x}",
                sec.index, sec.entsize
            ));
        }
        let Ok(data) = sec.data(view) else {
            continue;
        };
        let mut words = data
            .chunks_exact(4)
            .filter_map(|w| codec.u32_at(w, 0).ok());
        let Some(flags) = words.next() else {
            diag.warn(format_args!(
                "section group [{:5}] is too small to hold its flag word",
                sec.index
            ));
            continue;
        };

        let mut members = Vec::new();
        for member in words {
            let Some(slot) = owner.get_mut(member as usize) else {
                diag.warn(format_args!(
                    "section [{member:5}] in group section [{:5}] > maximum section [{:5}]",
                    sec.index,
                    sections.len().saturating_sub(1)
                ));
                continue;
            };
            match *slot {
                Some(previous) => diag.warn(format_args!(
                    "section [{member:5}] in group section [{:5}] already in group section [{previous:5}]",
                    sec.index
                )),
                None => *slot = Some(sec.index),
            }
            members.push(member);
        }
        groups.push(SectionGroup {
            section: sec.index,
            flags,
            members,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch;
    use crate::diag::Diagnostics;
    use crate::utils::Endianness;

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const BE32: Codec = Codec::new(ElfClass::Elf32, Endianness::Big);

    #[test]
    fn test_parse_64_and_32() {
        let mut raw = vec![0u8; 64];
        LE64.put_u32(&mut raw, 0, 7).unwrap();
        LE64.put_u32(&mut raw, 4, SHT_PROGBITS).unwrap();
        LE64.put_u64(&mut raw, 8, 0x6).unwrap();
        LE64.put_u64(&mut raw, 16, 0x401000).unwrap();
        LE64.put_u64(&mut raw, 24, 0x1000).unwrap();
        LE64.put_u64(&mut raw, 32, 0x20).unwrap();
        LE64.put_u32(&mut raw, 40, 3).unwrap();
        LE64.put_u32(&mut raw, 44, 4).unwrap();
        LE64.put_u64(&mut raw, 48, 16).unwrap();
        let sec = SectionHeader::parse(&raw, LE64, 1).unwrap();
        assert_eq!(sec.flags, SectionFlags::ALLOC | SectionFlags::EXECINSTR);
        assert_eq!((sec.addr, sec.offset, sec.size), (0x401000, 0x1000, 0x20));
        assert_eq!((sec.link, sec.info, sec.addralign), (3, 4, 16));

        let mut raw = vec![0u8; 40];
        BE32.put_u32(&mut raw, 4, SHT_SYMTAB).unwrap();
        BE32.put_u32(&mut raw, 20, 0x30).unwrap();
        BE32.put_u32(&mut raw, 24, 5).unwrap();
        BE32.put_u32(&mut raw, 36, 16).unwrap();
        let sec = SectionHeader::parse(&raw, BE32, 2).unwrap();
        assert_eq!(sec.sh_type, SHT_SYMTAB);
        assert_eq!((sec.size, sec.link, sec.entsize), (0x30, 5, 16));
        assert_eq!(sec.entry_count(), 3);
    }

    #[test]
    fn test_flag_letters() {
        let flags = SectionFlags::WRITE | SectionFlags::ALLOC | SectionFlags::TLS;
        assert_eq!(flags.key_letters(0), "WAT");
        let large = SectionFlags::from_bits_retain(0x1000_0002);
        assert_eq!(large.key_letters(EM_X86_64), "Al");
        assert_eq!(large.key_letters(arch::EM_386), "Ap");
        assert_eq!(SectionFlags::from_bits_retain(0x0001_0000).key_letters(0), "x");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(section_type_name(SHT_GNU_HASH, &arch::GENERIC), "GNU_HASH");
        assert_eq!(
            section_type_name(0x7000_0001, arch::caps(arch::EM_ARM)),
            "ARM_EXIDX"
        );
        assert_eq!(section_type_name(0x7000_0001, &arch::GENERIC), "LOPROC+0x1");
        assert_eq!(section_type_name(0x8000_0002, &arch::GENERIC), "LOUSER+0x2");
        assert_eq!(section_type_name(0x99, &arch::GENERIC), "<unknown>: 99");
    }

    fn header_with(shnum: u16, shstrndx: u16, phnum: u16) -> ElfHeader {
        let mut h = vec![0u8; 64];
        h[..4].copy_from_slice(&super::super::header::ELF_MAGIC);
        h[4] = 2;
        h[5] = 1;
        LE64.put_u64(&mut h, 40, 0x1000).unwrap();
        LE64.put_u16(&mut h, 56, phnum).unwrap();
        LE64.put_u16(&mut h, 60, shnum).unwrap();
        LE64.put_u16(&mut h, 62, shstrndx).unwrap();
        ElfHeader::parse_bytes(&h).unwrap()
    }

    #[test]
    fn test_extended_counts() {
        let zero = SectionHeader {
            index: 0,
            name_offset: 0,
            name: String::new(),
            sh_type: SHT_NULL,
            flags: SectionFlags::empty(),
            addr: 0,
            offset: 0,
            size: 70_000,
            link: 69_999,
            info: 80_000,
            addralign: 0,
            entsize: 0,
        };
        let counts = resolve_counts(&header_with(0, SHN_XINDEX, PN_XNUM), Some(&zero));
        assert_eq!(counts.sections, 70_000);
        assert_eq!(counts.string_table_index, 69_999);
        assert_eq!(counts.segments, 80_000);

        let plain = resolve_counts(&header_with(5, 4, 2), Some(&zero));
        assert_eq!((plain.sections, plain.string_table_index, plain.segments), (5, 4, 2));
    }

    fn group_section(index: usize, offset: u64, size: u64) -> SectionHeader {
        SectionHeader {
            index,
            name_offset: 0,
            name: ".group".into(),
            sh_type: SHT_GROUP,
            flags: SectionFlags::empty(),
            addr: 0,
            offset,
            size,
            link: 0,
            info: 0,
            addralign: 4,
            entsize: 4,
        }
    }

    #[test]
    fn test_groups_validate_members() {
        let mut bytes = vec![0u8; 32];
        for (i, w) in [GRP_COMDAT, 2, 3].iter().enumerate() {
            LE64.put_u32(&mut bytes, i * 4, *w).unwrap();
        }
        for (i, w) in [0, 3, 40].iter().enumerate() {
            LE64.put_u32(&mut bytes, 16 + i * 4, *w).unwrap();
        }
        let mut sections: Vec<SectionHeader> =
            (0..5).map(|i| group_section(i, 0, 0)).collect();
        for s in &mut sections {
            s.sh_type = SHT_PROGBITS;
        }
        sections[1] = group_section(1, 0, 12);
        sections[4] = group_section(4, 16, 12);

        let diag = Diagnostics::new();
        let view = FileView::new(&bytes, &diag);
        let groups = parse_groups(&view, &sections, LE64);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].flags, GRP_COMDAT);
        assert_eq!(groups[0].members, vec![2, 3]);
        assert_eq!(groups[1].members, vec![3]);
        assert!(diag.mentions("already in group section"));
        assert!(diag.mentions("> maximum section"));
    }

    #[test]
    fn test_strict_names_reject_bad_offsets() {
        let names = StringTable::new(b"\0.text\0.dynstr\0");
        let mut sections: Vec<SectionHeader> =
            (0..3).map(|i| group_section(i, 0, 0)).collect();
        sections[1].name_offset = 0x4000;
        sections[2].name_offset = 7;

        let err = strict_name(&sections[1], Some(&names)).unwrap_err();
        assert!(matches!(err, ElfError::BadStringOffset { offset: 0x4000, size: 15 }));
        assert_eq!(strict_name(&sections[2], Some(&names)).unwrap(), ".dynstr");
        assert!(strict_name(&sections[2], None).is_err());

        let diag = Diagnostics::new();
        let found = find_by_name(&sections, Some(&names), ".dynstr", &diag);
        assert_eq!(found.map(|s| s.index), Some(2));
        assert!(diag.mentions("section [1] has a corrupt name"));
        assert!(diag.mentions("0x4000"));
        assert!(find_by_name(&sections, None, ".dynstr", &diag).is_none());
    }
}
