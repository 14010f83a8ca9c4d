//! # Dynamic Section
//!
//! Loads the `PT_DYNAMIC` / `.dynamic` tag array and interprets it: the tags
//! locate the dynamic string table, symbol table, hash tables, version
//! tables and relocation tables by virtual address. Every such address is
//! translated to a file offset and bounds-checked before anything is read.
//!
//! When section headers also describe `.dynamic`, `.dynstr` and `.dynsym`,
//! the two views are cross-checked. Disagreement is a warning; the
//! tag-derived locations are the ones used to resolve dynamic-linking data.

use bitflags::bitflags;

use crate::arch::{lookup, name_table, MachineCaps};
use crate::diag::Diagnostics;
use crate::errors::Result;
use crate::utils::Codec;

use super::hash::{sysv_entry_size, GnuHash, SysvHash};
use super::program::{offset_from_vaddr, ProgramHeader};
use super::reloc::{RelocKind, RelocTable};
use super::section::{find_by_name, SectionHeader, SHT_DYNAMIC, SHT_DYNSYM, SHT_STRTAB};
use super::strtab::StringTable;
use super::symbol::symbol_size;
use super::view::FileView;

// ============================================================================
// Tag constants
// ============================================================================

pub const DT_NULL: u64 = 0;
pub const DT_NEEDED: u64 = 1;
pub const DT_PLTRELSZ: u64 = 2;
pub const DT_PLTGOT: u64 = 3;
pub const DT_HASH: u64 = 4;
pub const DT_STRTAB: u64 = 5;
pub const DT_SYMTAB: u64 = 6;
pub const DT_RELA: u64 = 7;
pub const DT_RELASZ: u64 = 8;
pub const DT_RELAENT: u64 = 9;
pub const DT_STRSZ: u64 = 10;
pub const DT_SYMENT: u64 = 11;
pub const DT_SONAME: u64 = 14;
pub const DT_RPATH: u64 = 15;
pub const DT_REL: u64 = 17;
pub const DT_RELSZ: u64 = 18;
pub const DT_RELENT: u64 = 19;
pub const DT_PLTREL: u64 = 20;
pub const DT_JMPREL: u64 = 23;
pub const DT_RUNPATH: u64 = 29;
pub const DT_FLAGS: u64 = 30;
pub const DT_RELRSZ: u64 = 35;
pub const DT_RELR: u64 = 36;
pub const DT_RELRENT: u64 = 37;
pub const DT_GNU_HASH: u64 = 0x6fff_fef5;
pub const DT_VERSYM: u64 = 0x6fff_fff0;
pub const DT_FLAGS_1: u64 = 0x6fff_fffb;
pub const DT_VERDEF: u64 = 0x6fff_fffc;
pub const DT_VERDEFNUM: u64 = 0x6fff_fffd;
pub const DT_VERNEED: u64 = 0x6fff_fffe;
pub const DT_VERNEEDNUM: u64 = 0x6fff_ffff;

const DT_LOOS: u64 = 0x6000_000d;
const DT_HIOS: u64 = 0x6fff_f000;
const DT_LOPROC: u64 = 0x7000_0000;
const DT_HIPROC: u64 = 0x7fff_ffff;

/// Generic tag names, checked before any range-based naming.
static TAG_NAMES: &[(u64, &str)] = name_table! {
    NULL = 0, NEEDED = 1, PLTRELSZ = 2, PLTGOT = 3, HASH = 4, STRTAB = 5,
    SYMTAB = 6, RELA = 7, RELASZ = 8, RELAENT = 9, STRSZ = 10, SYMENT = 11,
    INIT = 12, FINI = 13, SONAME = 14, RPATH = 15, SYMBOLIC = 16, REL = 17,
    RELSZ = 18, RELENT = 19, PLTREL = 20, DEBUG = 21, TEXTREL = 22,
    JMPREL = 23, BIND_NOW = 24, INIT_ARRAY = 25, FINI_ARRAY = 26,
    INIT_ARRAYSZ = 27, FINI_ARRAYSZ = 28, RUNPATH = 29, FLAGS = 30,
    PREINIT_ARRAY = 32, PREINIT_ARRAYSZ = 33, SYMTAB_SHNDX = 34,
    RELRSZ = 35, RELR = 36, RELRENT = 37,
    GNU_PRELINKED = 0x6fff_fdf5, GNU_CONFLICTSZ = 0x6fff_fdf6,
    GNU_LIBLISTSZ = 0x6fff_fdf7, CHECKSUM = 0x6fff_fdf8, PLTPADSZ = 0x6fff_fdf9,
    MOVEENT = 0x6fff_fdfa, MOVESZ = 0x6fff_fdfb, FEATURE = 0x6fff_fdfc,
    POSFLAG_1 = 0x6fff_fdfd, SYMINSZ = 0x6fff_fdfe, SYMINENT = 0x6fff_fdff,
    GNU_HASH = 0x6fff_fef5, TLSDESC_PLT = 0x6fff_fef6, TLSDESC_GOT = 0x6fff_fef7,
    GNU_CONFLICT = 0x6fff_fef8, GNU_LIBLIST = 0x6fff_fef9, CONFIG = 0x6fff_fefa,
    DEPAUDIT = 0x6fff_fefb, AUDIT = 0x6fff_fefc, PLTPAD = 0x6fff_fefd,
    MOVETAB = 0x6fff_fefe, SYMINFO = 0x6fff_feff, VERSYM = 0x6fff_fff0,
    RELACOUNT = 0x6fff_fff9, RELCOUNT = 0x6fff_fffa, FLAGS_1 = 0x6fff_fffb,
    VERDEF = 0x6fff_fffc, VERDEFNUM = 0x6fff_fffd, VERNEED = 0x6fff_fffe,
    VERNEEDNUM = 0x6fff_ffff, AUXILIARY = 0x7fff_fffd, USED = 0x7fff_fffe,
    FILTER = 0x7fff_ffff,
};

/// Display name of a dynamic tag.
pub fn tag_name(tag: u64, caps: &MachineCaps) -> String {
    if let Some(name) = lookup(TAG_NAMES, tag) {
        return name.to_string();
    }
    match tag {
        DT_LOPROC..=DT_HIPROC => lookup(caps.dynamic_tags, tag)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Processor Specific: ({tag:x})")),
        DT_LOOS..=DT_HIOS => format!("Operating System specific: {tag:x}"),
        _ => format!("<unknown>: {tag:x}"),
    }
}

bitflags! {
    /// `DT_FLAGS` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DynFlags: u64 {
        const ORIGIN = 0x1;
        const SYMBOLIC = 0x2;
        const TEXTREL = 0x4;
        const BIND_NOW = 0x8;
        const STATIC_TLS = 0x10;
    }
}

bitflags! {
    /// `DT_FLAGS_1` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DynFlags1: u64 {
        const NOW = 0x1;
        const GLOBAL = 0x2;
        const GROUP = 0x4;
        const NODELETE = 0x8;
        const LOADFLTR = 0x10;
        const INITFIRST = 0x20;
        const NOOPEN = 0x40;
        const ORIGIN = 0x80;
        const DIRECT = 0x100;
        const TRANS = 0x200;
        const INTERPOSE = 0x400;
        const NODEFLIB = 0x800;
        const NODUMP = 0x1000;
        const CONFALT = 0x2000;
        const ENDFILTEE = 0x4000;
        const DISPRELDNE = 0x8000;
        const DISPRELPND = 0x10000;
        const NODIRECT = 0x20000;
        const IGNMULDEF = 0x40000;
        const NOKSYMS = 0x80000;
        const NOHDR = 0x100000;
        const EDITED = 0x200000;
        const NORELOC = 0x400000;
        const SYMINTPOSE = 0x800000;
        const GLOBAUDIT = 0x1000000;
        const SINGLETON = 0x2000000;
        const STUB = 0x4000000;
        const PIE = 0x8000000;
        const KMOD = 0x10000000;
        const WEAKFILTER = 0x20000000;
        const NOCOMMON = 0x40000000;
    }
}

/// Space-separated flag names, with any unnamed bits appended in hex.
pub fn flag_names(value: u64, tag: u64) -> String {
    let (mut names, unknown): (Vec<String>, u64) = if tag == DT_FLAGS_1 {
        let flags = DynFlags1::from_bits_retain(value);
        (
            flags.iter_names().map(|(n, _)| n.to_string()).collect(),
            value & !DynFlags1::all().bits(),
        )
    } else {
        let flags = DynFlags::from_bits_retain(value);
        (
            flags.iter_names().map(|(n, _)| n.to_string()).collect(),
            value & !DynFlags::all().bits(),
        )
    };
    if unknown != 0 {
        names.push(format!("{unknown:#x}"));
    }
    names.join(" ")
}

/// How a tag's value should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// An offset into the dynamic string table, shown as `label: [string]`.
    Str(&'static str),
    Bytes,
    Decimal,
    Flags,
    PltRel,
    Hex,
}

pub fn value_kind(tag: u64) -> ValueKind {
    match tag {
        DT_NEEDED => ValueKind::Str("Shared library"),
        DT_SONAME => ValueKind::Str("Library soname"),
        DT_RPATH => ValueKind::Str("Library rpath"),
        DT_RUNPATH => ValueKind::Str("Library runpath"),
        0x7fff_fffd => ValueKind::Str("Auxiliary library"),
        0x7fff_ffff => ValueKind::Str("Filter library"),
        0x6fff_fefa => ValueKind::Str("Configuration file"),
        0x6fff_fefb => ValueKind::Str("Dependency audit library"),
        0x6fff_fefc => ValueKind::Str("Audit library"),
        DT_PLTRELSZ | DT_RELASZ | DT_RELAENT | DT_STRSZ | DT_SYMENT | DT_RELSZ | DT_RELENT
        | 27 | 28 | 33 | DT_RELRSZ | DT_RELRENT | 0x6fff_fdf6 | 0x6fff_fdf7 | 0x6fff_fdf9..=0x6fff_fdfb
        | 0x6fff_fdfe | 0x6fff_fdff => ValueKind::Bytes,
        DT_VERDEFNUM | DT_VERNEEDNUM | 0x6fff_fff9 | 0x6fff_fffa => ValueKind::Decimal,
        DT_FLAGS | DT_FLAGS_1 => ValueKind::Flags,
        DT_PLTREL => ValueKind::PltRel,
        _ => ValueKind::Hex,
    }
}

// ============================================================================
// Loading
// ============================================================================

/// One `(d_tag, d_val)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicEntry {
    pub tag: u64,
    pub value: u64,
}

/// Read the tag array at `offset`, stopping after the first `DT_NULL`.
///
/// Trailing bytes that do not form a whole entry are ignored.
pub fn load_dynamic(
    view: &FileView<'_>,
    codec: Codec,
    offset: u64,
    size: u64,
) -> Result<Vec<DynamicEntry>> {
    let entry_size = 2 * codec.word_size() as u64;
    let data = view.read(offset, entry_size, size / entry_size, "dynamic section")?;
    let mut entries = Vec::new();
    for chunk in data.chunks_exact(entry_size as usize) {
        let entry = DynamicEntry {
            tag: codec.word_at(chunk, 0)?,
            value: codec.word_at(chunk, codec.word_size())?,
        };
        entries.push(entry);
        if entry.tag == DT_NULL {
            break;
        }
    }
    Ok(entries)
}

/// Translate a virtual address to a file offset: through the loadable
/// segments first, and failing that through the allocated sections.
pub fn vaddr_to_offset(
    segments: &[ProgramHeader],
    sections: Option<&[SectionHeader]>,
    vaddr: u64,
    size: u64,
) -> Option<u64> {
    offset_from_vaddr(segments, vaddr, size).or_else(|| {
        sections?
            .iter()
            .filter(|s| s.addr != 0 && !s.is_nobits())
            .find(|s| {
                vaddr >= s.addr
                    && (vaddr - s.addr)
                        .checked_add(size)
                        .is_some_and(|end| end <= s.size)
            })
            .map(|s| vaddr - s.addr + s.offset)
    })
}

// ============================================================================
// Interpretation
// ============================================================================

/// The tables the dynamic section locates, as file offsets.
#[derive(Debug, Clone, Default)]
pub struct DynamicInfo<'a> {
    pub entries: Vec<DynamicEntry>,

    /// File location the entries were read from.
    pub offset: u64,
    pub size: u64,

    /// The dynamic string table located by the first `DT_STRTAB` and `DT_STRSZ`.
    pub strings: Option<StringTable<'a>>,
    pub strtab_offset: Option<u64>,

    pub symtab_offset: Option<u64>,
    pub syment: u64,

    /// Number of dynamic symbols, derived from a hash table.
    pub symbol_count: Option<u64>,

    pub sysv_hash: Option<SysvHash>,
    pub gnu_hash: Option<GnuHash>,

    pub versym_offset: Option<u64>,
    pub verdef: Option<(u64, u64)>,
    pub verneed: Option<(u64, u64)>,

    /// Relocation tables named by `DT_REL`, `DT_RELA`, `DT_RELR` and `DT_JMPREL`.
    pub relocs: Vec<(&'static str, RelocTable)>,
}

impl DynamicInfo<'_> {
    /// The last value of `tag`, if present.
    pub fn value(&self, tag: u64) -> Option<u64> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.tag == tag)
            .map(|e| e.value)
    }

    /// The string `value` refers to, or a placeholder.
    pub fn string(&self, value: u64) -> std::borrow::Cow<'_, str> {
        super::strtab::resolve_or_placeholder(self.strings.as_ref(), value)
    }
}

/// Everything [`interpret`] needs besides the entries.
pub struct DynamicContext<'v, 'a> {
    pub view: &'v FileView<'a>,
    pub codec: Codec,
    pub machine: u16,
    pub segments: &'v [ProgramHeader],
    pub sections: Option<&'v [SectionHeader]>,
    pub section_names: Option<StringTable<'a>>,
}

/// Resolve the tables the entries point to and cross-check them against
/// the section headers.
pub fn interpret<'a>(
    cx: &DynamicContext<'_, 'a>,
    entries: Vec<DynamicEntry>,
    offset: u64,
    size: u64,
) -> DynamicInfo<'a> {
    let diag: &Diagnostics = cx.view.diag();
    let translate = |vaddr: u64, len: u64| vaddr_to_offset(cx.segments, cx.sections, vaddr, len);

    let mut info = DynamicInfo {
        offset,
        size,
        syment: symbol_size(cx.codec.class),
        ..DynamicInfo::default()
    };

    // The first DT_STRTAB establishes the primary string table.
    let strtab_addr = entries.iter().find(|e| e.tag == DT_STRTAB).map(|e| e.value);
    info.entries = entries;
    let strsz = info.value(DT_STRSZ).unwrap_or(0);

    if let Some(addr) = strtab_addr {
        match translate(addr, strsz) {
            Some(off) => {
                info.strtab_offset = Some(off);
                info.strings = cx
                    .view
                    .read_bytes(off, strsz, "dynamic string table")
                    .ok()
                    .map(StringTable::new);
            }
            None => diag.warn(format_args!(
                "Unable to locate the dynamic string table at address {addr:#x}"
            )),
        }
    }

    if let Some(syment) = info.value(DT_SYMENT) {
        info.syment = syment;
    }
    if let Some(addr) = info.value(DT_SYMTAB) {
        info.symtab_offset = translate(addr, 0);
        if info.symtab_offset.is_none() {
            diag.warn(format_args!(
                "Unable to locate the dynamic symbol table at address {addr:#x}"
            ));
        }
    }

    load_hash_tables(cx, &mut info, &translate);

    info.versym_offset = info.value(DT_VERSYM).and_then(|a| translate(a, 0));
    info.verdef = info
        .value(DT_VERDEF)
        .and_then(|a| translate(a, 0))
        .map(|o| (o, info.value(DT_VERDEFNUM).unwrap_or(0)));
    info.verneed = info
        .value(DT_VERNEED)
        .and_then(|a| translate(a, 0))
        .map(|o| (o, info.value(DT_VERNEEDNUM).unwrap_or(0)));

    collect_reloc_tables(&mut info, diag, &translate);
    if let Some(sections) = cx.sections {
        cross_check(&info, sections, cx.section_names.as_ref(), diag);
    }
    info
}

fn load_hash_tables(
    cx: &DynamicContext<'_, '_>,
    info: &mut DynamicInfo<'_>,
    translate: &dyn Fn(u64, u64) -> Option<u64>,
) {
    let diag = cx.view.diag();
    if let Some(off) = info.value(DT_HASH).and_then(|a| translate(a, 8)) {
        let parsed = cx.view.tail(off, "hash table").and_then(|data| {
            SysvHash::parse(data, cx.codec, sysv_entry_size(cx.machine, cx.codec.class))
        });
        match parsed {
            Ok(hash) => info.sysv_hash = Some(hash),
            Err(e) => diag.warn(format_args!("Failed to read the hash table: {e}")),
        }
    }
    if let Some(off) = info.value(DT_GNU_HASH).and_then(|a| translate(a, 16)) {
        let parsed = cx
            .view
            .tail(off, "GNU hash table")
            .and_then(|data| GnuHash::parse(data, cx.codec));
        match parsed {
            Ok(hash) => info.gnu_hash = Some(hash),
            Err(e) => diag.warn(format_args!("Failed to read the GNU hash table: {e}")),
        }
    }

    info.symbol_count = match (&info.sysv_hash, &info.gnu_hash) {
        (Some(sysv), _) => Some(sysv.symbol_count()),
        (None, Some(gnu)) => match gnu.symbol_count() {
            Ok(count) => Some(count),
            Err(e) => {
                diag.warn(format_args!(
                    "Unable to determine the number of dynamic symbols: {e}"
                ));
                None
            }
        },
        (None, None) => None,
    };
}

fn collect_reloc_tables(
    info: &mut DynamicInfo<'_>,
    diag: &Diagnostics,
    translate: &dyn Fn(u64, u64) -> Option<u64>,
) {
    let plt_kind = match info.value(DT_PLTREL) {
        Some(DT_RELA) => RelocKind::Rela,
        _ => RelocKind::Rel,
    };
    let specs: [(&'static str, u64, u64, Option<u64>, RelocKind); 4] = [
        ("REL", DT_REL, DT_RELSZ, Some(DT_RELENT), RelocKind::Rel),
        ("RELA", DT_RELA, DT_RELASZ, Some(DT_RELAENT), RelocKind::Rela),
        ("RELR", DT_RELR, DT_RELRSZ, Some(DT_RELRENT), RelocKind::Relr),
        ("PLT", DT_JMPREL, DT_PLTRELSZ, None, plt_kind),
    ];
    for (label, addr_tag, size_tag, ent_tag, kind) in specs {
        let (Some(addr), Some(size)) = (info.value(addr_tag), info.value(size_tag)) else {
            continue;
        };
        if size == 0 {
            continue;
        }
        match translate(addr, size) {
            Some(offset) => info.relocs.push((
                label,
                RelocTable {
                    kind,
                    offset,
                    size,
                    entsize: ent_tag.and_then(|t| info.value(t)).unwrap_or(0),
                },
            )),
            None => diag.warn(format_args!(
                "Unable to locate the {label} relocations at address {addr:#x}"
            )),
        }
    }
}

/// Compare the tag-derived tables with the section headers describing the same data.
fn cross_check(
    info: &DynamicInfo<'_>,
    sections: &[SectionHeader],
    names: Option<&StringTable<'_>>,
    diag: &Diagnostics,
) {
    let dynstr = sections
        .iter()
        .find(|s| s.sh_type == SHT_DYNAMIC)
        .and_then(|d| sections.get(d.link as usize))
        .filter(|s| s.sh_type == SHT_STRTAB)
        .or_else(|| find_by_name(sections, names, ".dynstr", diag));
    if let (Some(sec), Some(off)) = (dynstr, info.strtab_offset) {
        let strsz = info.value(DT_STRSZ).unwrap_or(0);
        if sec.offset != off || sec.size != strsz {
            diag.warn(format_args!(
                "the {} section (offset {:#x}, size {:#x}) doesn't match the DT_STRTAB and DT_STRSZ tags (offset {off:#x}, size {strsz:#x})",
                sec.name, sec.offset, sec.size
            ));
        }
    }

    let dynsym = sections.iter().find(|s| s.sh_type == SHT_DYNSYM);
    if let (Some(sec), Some(off)) = (dynsym, info.symtab_offset) {
        if sec.offset != off {
            diag.warn(format_args!(
                "the {} section offset {:#x} doesn't match the DT_SYMTAB tag (offset {off:#x})",
                sec.name, sec.offset
            ));
        }
        if let Some(count) = info.symbol_count {
            let entsize = if sec.entsize == 0 { info.syment } else { sec.entsize };
            if entsize != 0 && sec.size / entsize != count {
                diag.warn(format_args!(
                    "the {} section holds {} symbols but the hash table implies {count}",
                    sec.name,
                    sec.size / entsize
                ));
            }
        }
    }
}
