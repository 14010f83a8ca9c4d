//! # Unwind Tables
//!
//! Machine-specific unwind index tables: IA-64 (`.IA_64.unwind` plus the
//! byte-coded `.IA_64.unwind_info`), PA-RISC (`.PARISC.unwind`) and the ARM
//! EHABI / TI C6000 index tables (`.ARM.exidx`, `.c6xabi.exidx`).
//!
//! Addresses in these tables are final virtual addresses in a linked image,
//! but in a relocatable object they are filled in by relocations. Both cases
//! are represented by [`AbsAddr`]: a section index (for the relocated case)
//! plus an offset.

pub mod arm;
pub mod hppa;
pub mod ia64;

use crate::arch::{EM_ARM, EM_IA_64, EM_PARISC, EM_TI_C6000};

use super::reloc::Relocation;
use super::symbol::{Symbol, SymbolTable, STT_FUNC, STT_NOTYPE, STT_OBJECT};
use super::ElfFile;

/// An address that is either final or relative to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsAddr {
    /// Set when the address came from a relocation against that section.
    pub section: Option<usize>,
    pub offset: u64,
}

impl AbsAddr {
    pub const fn raw(offset: u64) -> Self {
        Self {
            section: None,
            offset,
        }
    }
}

/// One decoded unwind table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwindTable {
    pub section: usize,
    pub name: String,
    pub offset: u64,
    pub entries: Vec<UnwindEntry>,
}

/// One table entry: a heading naming the function, then detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnwindEntry {
    pub heading: String,
    pub lines: Vec<String>,
}

/// Decode every unwind table of `file`.
///
/// Returns `None` when the machine has no unwind decoder.
pub fn decode(file: &ElfFile<'_>) -> Option<Vec<UnwindTable>> {
    match file.header.machine {
        EM_IA_64 => Some(ia64::decode(file)),
        EM_PARISC => Some(hppa::decode(file)),
        EM_ARM | EM_TI_C6000 => Some(arm::decode(file)),
        _ => None,
    }
}

/// The address a relocation against a table word stands for.
///
/// `in_place` is the word's current contents, which is the addend of a
/// REL-style relocation.
pub fn relocated(rel: &Relocation, symbol: Option<&Symbol>, in_place: u64) -> AbsAddr {
    let addend = rel.addend.map_or(in_place, |a| a as u64);
    match symbol {
        Some(sym) => AbsAddr {
            section: sym.section_index().map(|s| s as usize),
            offset: sym.value.wrapping_add(addend),
        },
        None => AbsAddr::raw(addend),
    }
}

/// The symbol an address falls in: the closest preceding function, object
/// or untyped symbol (in the same section, for a section-relative address).
pub fn symbolize<'s>(addr: AbsAddr, symbols: Option<&'s SymbolTable>) -> Option<(&'s str, u64)> {
    symbols?
        .symbols
        .iter()
        .filter(|s| !s.name.is_empty() && matches!(s.sym_type(), STT_FUNC | STT_OBJECT | STT_NOTYPE))
        .filter(|s| s.section_index().is_some())
        .filter(|s| match addr.section {
            Some(sec) => s.section_index() == Some(sec as u32),
            None => true,
        })
        .filter(|s| s.value <= addr.offset)
        .max_by_key(|s| (s.value, s.sym_type() == STT_FUNC))
        .map(|s| (s.name.as_str(), addr.offset - s.value))
}

/// `0x1234 <name+0x10>`, or just the address when no symbol covers it.
pub fn format_addr(addr: AbsAddr, symbols: Option<&SymbolTable>) -> String {
    match symbolize(addr, symbols) {
        Some((name, 0)) => format!("{:#x} <{name}>", addr.offset),
        Some((name, off)) => format!("{:#x} <{name}+{off:#x}>", addr.offset),
        None => format!("{:#x}", addr.offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::symbol::STB_GLOBAL;

    fn sym(name: &str, value: u64, shndx: u16, sym_type: u8) -> Symbol {
        Symbol {
            index: 0,
            name_offset: 0,
            name: name.to_string(),
            value,
            size: 0,
            info: (STB_GLOBAL << 4) | sym_type,
            other: 0,
            shndx,
            extended_shndx: None,
        }
    }

    #[test]
    fn test_symbolize() {
        let table = SymbolTable {
            section: Some(3),
            symbols: vec![
                sym("", 0, 0, STT_NOTYPE),
                sym("start", 0x100, 1, STT_FUNC),
                sym("helper", 0x180, 1, STT_FUNC),
                sym("other_section", 0x150, 2, STT_FUNC),
            ],
        };
        assert_eq!(format_addr(AbsAddr::raw(0x190), Some(&table)), "0x190 <helper+0x10>");
        assert_eq!(format_addr(AbsAddr::raw(0x180), Some(&table)), "0x180 <helper>");
        assert_eq!(format_addr(AbsAddr::raw(0x10), Some(&table)), "0x10");
        let in_one = AbsAddr {
            section: Some(1),
            offset: 0x160,
        };
        assert_eq!(symbolize(in_one, Some(&table)), Some(("start", 0x60)));
        assert_eq!(format_addr(in_one, None), "0x160");
    }

    #[test]
    fn test_relocated() {
        let target = sym(".text", 0x40, 2, STT_FUNC);
        let rela = Relocation {
            offset: 0,
            info: 0,
            sym_index: 1,
            rtype: 0,
            addend: Some(8),
            mips64: None,
        };
        assert_eq!(
            relocated(&rela, Some(&target), 0x999),
            AbsAddr {
                section: Some(2),
                offset: 0x48
            }
        );
        let rel = Relocation { addend: None, ..rela };
        assert_eq!(relocated(&rel, None, 0x20), AbsAddr::raw(0x20));
    }
}
