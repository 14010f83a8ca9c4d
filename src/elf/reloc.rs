//! # Relocations
//!
//! REL, RELA and RELR records. REL/RELA entries are decoded one record at a
//! time with their packed `r_info` split into symbol index and type; RELR
//! streams are expanded into the explicit list of offsets they encode.

use crate::arch::{MachineCaps, EM_MIPS};
use crate::diag::Diagnostics;
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, ElfClass, Endianness};

use super::symbol::{Symbol, SymbolTable};
use super::view::FileView;

// ============================================================================
// Types
// ============================================================================

/// Which on-disk relocation layout a table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocKind {
    Rel,
    Rela,
    Relr,
}

impl RelocKind {
    /// On-disk record size for this layout.
    pub fn entry_size(self, class: ElfClass) -> u64 {
        let word = class.addr_size() as u64;
        match self {
            RelocKind::Rel => 2 * word,
            RelocKind::Rela => 3 * word,
            RelocKind::Relr => word,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RelocKind::Rel => "REL",
            RelocKind::Rela => "RELA",
            RelocKind::Relr => "RELR",
        }
    }
}

/// One decoded relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub offset: u64,

    /// `r_info` as it appears after any byte-order correction.
    pub info: u64,
    pub sym_index: u64,
    pub rtype: u32,

    /// Explicit addend (RELA only).
    pub addend: Option<i64>,

    /// Secondary and tertiary types plus the special symbol of a MIPS64 record.
    pub mips64: Option<Mips64Types>,
}

/// The extra fields packed into a 64-bit MIPS `r_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mips64Types {
    pub ssym: u8,
    pub type2: u8,
    pub type3: u8,
}

/// Split `info` into `(symbol index, type)` for the given layout.
///
/// Little-endian MIPS64 stores the symbol index followed by four single
/// byte fields, so a plain 64-bit load puts them in the wrong places; the
/// value is reshuffled into the big-endian arrangement before splitting.
pub fn decode_info(info: u64, codec: Codec, machine: u16) -> (u64, u64, u32) {
    match codec.class {
        ElfClass::Elf32 => (info, info >> 8, (info & 0xff) as u32),
        ElfClass::Elf64 => {
            let info = if machine == EM_MIPS && codec.endian == Endianness::Little {
                ((info & 0xffff_ffff) << 32)
                    | ((info >> 56) & 0xff)
                    | ((info >> 40) & 0xff00)
                    | ((info >> 24) & 0x00ff_0000)
                    | ((info >> 8) & 0xff00_0000)
            } else {
                info
            };
            (info, info >> 32, (info & 0xffff_ffff) as u32)
        }
    }
}

impl Relocation {
    fn parse(data: &[u8], codec: Codec, machine: u16, with_addend: bool) -> Result<Self> {
        let word = codec.word_size();
        let offset = codec.word_at(data, 0)?;
        let raw_info = codec.word_at(data, word)?;
        let addend = if with_addend {
            let raw = codec.word_at(data, 2 * word)?;
            Some(match codec.class {
                ElfClass::Elf32 => i64::from(raw as u32 as i32),
                ElfClass::Elf64 => raw as i64,
            })
        } else {
            None
        };

        let (info, sym_index, mut rtype) = decode_info(raw_info, codec, machine);
        let mut mips64 = None;
        if machine == EM_MIPS && codec.class.is_64() {
            mips64 = Some(Mips64Types {
                ssym: ((rtype >> 24) & 0xff) as u8,
                type3: ((rtype >> 16) & 0xff) as u8,
                type2: ((rtype >> 8) & 0xff) as u8,
            });
            rtype &= 0xff;
        }

        Ok(Relocation {
            offset,
            info,
            sym_index,
            rtype,
            addend,
            mips64,
        })
    }

    /// A relative relocation produced by RELR expansion.
    pub fn relative(offset: u64) -> Self {
        Relocation {
            offset,
            info: 0,
            sym_index: 0,
            rtype: 0,
            addend: None,
            mips64: None,
        }
    }
}

/// Display name of a relocation type.
pub fn type_name(rtype: u32, caps: &MachineCaps) -> String {
    caps.reloc_name(rtype)
        .map(str::to_string)
        .unwrap_or_else(|| format!("unrecognized: {rtype:x}"))
}

// ============================================================================
// Loading
// ============================================================================

/// Location of one relocation table, from a section header or dynamic tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocTable {
    pub kind: RelocKind,
    pub offset: u64,
    pub size: u64,
    pub entsize: u64,
}

/// Read the relocation table described by `table`.
///
/// An `entsize` of zero means the natural record size; a non-zero value
/// below it is refused, a larger one is used as the stride.
pub fn load_relocations(
    view: &FileView<'_>,
    codec: Codec,
    machine: u16,
    table: &RelocTable,
    purpose: &str,
) -> Result<Vec<Relocation>> {
    let RelocTable {
        kind,
        offset,
        size,
        entsize,
    } = *table;
    let natural = kind.entry_size(codec.class);
    let stride = if entsize == 0 { natural } else { entsize };
    if stride < natural {
        return Err(ElfError::InvalidEntrySize {
            what: "relocation",
            size: stride,
            minimum: natural,
        });
    }
    if kind == RelocKind::Relr {
        let words = load_relr_words(view, codec, offset, size, purpose)?;
        return Ok(expand_relr(&words, codec.word_size() as u64)
            .into_iter()
            .map(Relocation::relative)
            .collect());
    }

    let data = view.read(offset, stride, size / stride, purpose)?;
    data.chunks_exact(stride as usize)
        .map(|entry| Relocation::parse(entry, codec, machine, kind == RelocKind::Rela))
        .collect()
}

/// The raw words of a RELR table.
pub fn load_relr_words(
    view: &FileView<'_>,
    codec: Codec,
    offset: u64,
    size: u64,
    purpose: &str,
) -> Result<Vec<u64>> {
    let word = codec.word_size() as u64;
    let data = view.read(offset, word, size / word, purpose)?;
    data.chunks_exact(word as usize)
        .map(|chunk| codec.word_at(chunk, 0))
        .collect()
}

/// Expand a RELR stream into the offsets it relocates, in ascending order.
pub fn expand_relr(words: &[u64], word_size: u64) -> Vec<u64> {
    relr_runs(words, word_size).into_iter().flatten().collect()
}

/// The offsets each RELR word relocates, one list per word.
///
/// An even word is an address: it is relocated itself and starts a new run.
/// An odd word is a bitmap over the `8 * word_size - 1` words following the
/// current run; bit `i` (counting from bit 1) marks `base + (i - 1) * word_size`.
pub fn relr_runs(words: &[u64], word_size: u64) -> Vec<Vec<u64>> {
    let bits_per_map = 8 * word_size - 1;
    let mut base = 0u64;
    words
        .iter()
        .map(|&entry| {
            if entry & 1 == 0 {
                base = entry.wrapping_add(word_size);
                return vec![entry];
            }
            let mut run = Vec::new();
            let mut bitmap = entry >> 1;
            let mut addr = base;
            while bitmap != 0 {
                if bitmap & 1 != 0 {
                    run.push(addr);
                }
                bitmap >>= 1;
                addr = addr.wrapping_add(word_size);
            }
            base = base.wrapping_add(bits_per_map * word_size);
            run
        })
        .collect()
}

// ============================================================================
// Symbol resolution
// ============================================================================

/// The symbol a relocation refers to, as far as it can be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocTarget<'s> {
    /// Symbol index 0.
    None,
    Symbol(&'s Symbol),
    /// No symbol table is associated with the relocation table.
    NoTable(u64),
    /// The index lies outside the symbol table.
    Corrupt(u64),
}

/// Look up the symbol of `rel`, reporting an out-of-range index once.
pub fn resolve_target<'s>(
    rel: &Relocation,
    record: usize,
    symbols: Option<&'s SymbolTable>,
    diag: &Diagnostics,
    context: &str,
) -> RelocTarget<'s> {
    if rel.sym_index == 0 {
        return RelocTarget::None;
    }
    let Some(table) = symbols else {
        return RelocTarget::NoTable(rel.sym_index);
    };
    match table.get(rel.sym_index) {
        Ok(sym) => RelocTarget::Symbol(sym),
        Err(_) => {
            diag.warn(format_args!(
                "{context}: relocation {record} has a bad symbol index: {:#x} (table has {} entries)",
                rel.sym_index,
                table.len()
            ));
            RelocTarget::Corrupt(rel.sym_index)
        }
    }
}
