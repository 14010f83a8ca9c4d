//! # Symbol Tables
//!
//! Decoding of SHT_SYMTAB / SHT_DYNSYM entries and the display names of
//! their packed fields. Names are resolved softly at load time: a bad name
//! offset becomes a placeholder, it never drops the symbol.

use crate::arch::{lookup, MachineCaps, ELFOSABI_FREEBSD, ELFOSABI_GNU};
use crate::diag::Diagnostics;
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, ElfClass};

use super::section::{
    SHN_ABS, SHN_COMMON, SHN_HIOS, SHN_HIPROC, SHN_LOOS, SHN_LOPROC, SHN_LORESERVE, SHN_UNDEF,
    SHN_XINDEX,
};
use super::strtab::{resolve_or_placeholder, StringTable};
use super::view::FileView;

// ============================================================================
// Symbol Constants
// ============================================================================

pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;
pub const STT_COMMON: u8 = 5;
pub const STT_TLS: u8 = 6;
/// GNU indirect function (shares its value with STT_LOOS).
pub const STT_GNU_IFUNC: u8 = 10;
const STT_LOOS: u8 = 10;
const STT_HIOS: u8 = 12;
const STT_LOPROC: u8 = 13;
const STT_HIPROC: u8 = 15;

pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;
const STB_GNU_UNIQUE: u8 = 10;
const STB_LOOS: u8 = 10;
const STB_HIOS: u8 = 12;
const STB_LOPROC: u8 = 13;
const STB_HIPROC: u8 = 15;

pub const STV_DEFAULT: u8 = 0;
pub const STV_INTERNAL: u8 = 1;
pub const STV_HIDDEN: u8 = 2;
pub const STV_PROTECTED: u8 = 3;

/// On-disk size of an ELF32 symbol.
pub const SYM32_SIZE: u64 = 16;

/// On-disk size of an ELF64 symbol.
pub const SYM64_SIZE: u64 = 24;

// ============================================================================
// Types
// ============================================================================

/// One decoded symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Position in its table; symbol 0 is the null symbol.
    pub index: usize,
    pub name_offset: u32,
    pub name: String,
    pub value: u64,
    pub size: u64,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,

    /// The real section index, when `shndx` is `SHN_XINDEX` and an extended
    /// index table supplied it.
    pub extended_shndx: Option<u32>,
}

impl Symbol {
    #[inline]
    pub fn sym_type(&self) -> u8 {
        self.info & 0xf
    }

    #[inline]
    pub fn binding(&self) -> u8 {
        self.info >> 4
    }

    #[inline]
    pub fn visibility(&self) -> u8 {
        self.other & 0x3
    }

    pub fn is_ifunc(&self) -> bool {
        self.sym_type() == STT_GNU_IFUNC
    }

    /// Index of the section this symbol is defined in, if it names one.
    pub fn section_index(&self) -> Option<u32> {
        match self.shndx {
            SHN_UNDEF => None,
            SHN_XINDEX => self.extended_shndx,
            idx if idx >= SHN_LORESERVE => None,
            idx => Some(u32::from(idx)),
        }
    }

    fn parse(data: &[u8], codec: Codec, index: usize) -> Result<Self> {
        let (name_offset, value, size, info, other, shndx) = match codec.class {
            ElfClass::Elf32 => (
                codec.u32_at(data, 0)?,
                u64::from(codec.u32_at(data, 4)?),
                u64::from(codec.u32_at(data, 8)?),
                byte_at(data, 12)?,
                byte_at(data, 13)?,
                codec.u16_at(data, 14)?,
            ),
            ElfClass::Elf64 => (
                codec.u32_at(data, 0)?,
                codec.u64_at(data, 8)?,
                codec.u64_at(data, 16)?,
                byte_at(data, 4)?,
                byte_at(data, 5)?,
                codec.u16_at(data, 6)?,
            ),
        };
        Ok(Symbol {
            index,
            name_offset,
            name: String::new(),
            value,
            size,
            info,
            other,
            shndx,
            extended_shndx: None,
        })
    }
}

fn byte_at(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset).copied().ok_or(ElfError::FileTooSmall {
        expected: offset + 1,
        actual: data.len(),
    })
}

/// Minimum symbol record size for `class`.
pub fn symbol_size(class: ElfClass) -> u64 {
    if class.is_64() {
        SYM64_SIZE
    } else {
        SYM32_SIZE
    }
}

/// Where a symbol table lives and what it needs to be decoded.
#[derive(Debug, Clone, Copy)]
pub struct SymbolSource<'a> {
    pub offset: u64,
    pub count: u64,
    pub entsize: u64,
    pub strings: Option<StringTable<'a>>,

    /// Contents of the companion SHT_SYMTAB_SHNDX section.
    pub extended_indices: Option<&'a [u8]>,
}

/// A loaded symbol table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    /// The section the table came from; `None` when located via dynamic tags.
    pub section: Option<usize>,
    pub symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol `index`, validated against the table length.
    pub fn get(&self, index: u64) -> Result<&Symbol> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .ok_or(ElfError::BadIndex {
                what: "symbol",
                index,
                limit: self.symbols.len() as u64,
            })
    }
}

/// Named symbols ordered by value, for address lookups.
///
/// Section and file symbols never name an address range and are left out.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    by_value: Vec<Symbol>,
}

impl SymbolIndex {
    pub fn new(table: &SymbolTable) -> Self {
        let mut by_value: Vec<Symbol> = table
            .symbols
            .iter()
            .filter(|s| !s.name.is_empty() && !matches!(s.sym_type(), STT_SECTION | STT_FILE))
            .cloned()
            .collect();
        by_value.sort_by_key(|s| s.value);
        Self { by_value }
    }

    /// A symbol whose value is exactly `addr`, global ones first.
    pub fn at(&self, addr: u64) -> Option<&Symbol> {
        let rest = &self.by_value[self.by_value.partition_point(|s| s.value < addr)..];
        let same = &rest[..rest.partition_point(|s| s.value == addr)];
        same.iter()
            .find(|s| s.binding() == STB_GLOBAL)
            .or(same.first())
    }

    /// The nearest function starting at or covering `addr`.
    pub fn function_containing(&self, addr: u64) -> Option<&Symbol> {
        let end = self.by_value.partition_point(|s| s.value <= addr);
        self.by_value[..end]
            .iter()
            .rev()
            .filter(|s| s.sym_type() == STT_FUNC)
            .find(|s| s.value == addr || addr < s.value.saturating_add(s.size))
    }
}

/// Decode `source.count` symbols.
pub fn load_symbols(
    view: &FileView<'_>,
    codec: Codec,
    source: &SymbolSource<'_>,
    purpose: &str,
) -> Result<Vec<Symbol>> {
    let minimum = symbol_size(codec.class);
    if source.entsize < minimum {
        return Err(ElfError::InvalidEntrySize {
            what: "symbol",
            size: source.entsize,
            minimum,
        });
    }
    let table = view.read(source.offset, source.entsize, source.count, purpose)?;
    let diag: &Diagnostics = view.diag();

    let mut symbols = Vec::with_capacity(source.count as usize);
    for (index, entry) in table.chunks_exact(source.entsize as usize).enumerate() {
        let mut sym = Symbol::parse(entry, codec, index)?;
        sym.name = resolve_or_placeholder(source.strings.as_ref(), u64::from(sym.name_offset))
            .into_owned();
        if sym.shndx == SHN_XINDEX {
            sym.extended_shndx = source
                .extended_indices
                .and_then(|ext| codec.u32_at(ext, index * 4).ok());
            if sym.extended_shndx.is_none() {
                diag.warn(format_args!(
                    "{purpose}: symbol {index} uses SHN_XINDEX but has no extended section index"
                ));
            }
        }
        symbols.push(sym);
    }
    Ok(symbols)
}

// ============================================================================
// Display names
// ============================================================================

/// Display name of a symbol type.
pub fn type_name(sym_type: u8, caps: &MachineCaps, osabi: u8) -> String {
    match sym_type {
        STT_NOTYPE => "NOTYPE".to_string(),
        STT_OBJECT => "OBJECT".to_string(),
        STT_FUNC => "FUNC".to_string(),
        STT_SECTION => "SECTION".to_string(),
        STT_FILE => "FILE".to_string(),
        STT_COMMON => "COMMON".to_string(),
        STT_TLS => "TLS".to_string(),
        STT_GNU_IFUNC if osabi == ELFOSABI_GNU || osabi == ELFOSABI_FREEBSD => {
            "IFUNC".to_string()
        }
        STT_LOPROC..=STT_HIPROC => lookup(caps.symbol_types, sym_type)
            .map(str::to_string)
            .unwrap_or_else(|| format!("<processor specific>: {sym_type}")),
        STT_LOOS..=STT_HIOS => format!("<OS specific>: {sym_type}"),
        _ => format!("<unknown>: {sym_type}"),
    }
}

/// Display name of a symbol binding.
pub fn binding_name(binding: u8, osabi: u8) -> String {
    match binding {
        STB_LOCAL => "LOCAL".to_string(),
        STB_GLOBAL => "GLOBAL".to_string(),
        STB_WEAK => "WEAK".to_string(),
        STB_GNU_UNIQUE if osabi == ELFOSABI_GNU => "UNIQUE".to_string(),
        STB_LOPROC..=STB_HIPROC => format!("<processor specific>: {binding}"),
        STB_LOOS..=STB_HIOS => format!("<OS specific>: {binding}"),
        _ => format!("<unknown>: {binding}"),
    }
}

/// Display name of a symbol's visibility, with any processor-specific
/// `st_other` bits appended in brackets.
pub fn visibility_name(other: u8, caps: &MachineCaps) -> String {
    let base = match other & 0x3 {
        STV_DEFAULT => "DEFAULT",
        STV_INTERNAL => "INTERNAL",
        STV_HIDDEN => "HIDDEN",
        _ => "PROTECTED",
    };
    let extra: Vec<&str> = caps
        .symbol_other
        .iter()
        .filter(|&&(mask, _)| other & mask == mask)
        .map(|&(_, name)| name)
        .collect();
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{base} [{}]", extra.join(", "))
    }
}

/// Display form of a symbol's section index (`UND`, `ABS`, `COM`, a number, ...).
pub fn section_index_name(sym: &Symbol, caps: &MachineCaps) -> String {
    match sym.shndx {
        SHN_UNDEF => "UND".to_string(),
        SHN_ABS => "ABS".to_string(),
        SHN_COMMON => "COM".to_string(),
        SHN_XINDEX => match sym.extended_shndx {
            Some(real) => real.to_string(),
            None => "XINDEX".to_string(),
        },
        idx => {
            if let Some(name) = lookup(caps.section_indices, idx) {
                return name.to_string();
            }
            match idx {
                SHN_LOPROC..=SHN_HIPROC => format!("PRC[0x{idx:04x}]"),
                SHN_LOOS..=SHN_HIOS => format!("OS [0x{idx:04x}]"),
                SHN_LORESERVE..=u16::MAX => format!("RSV[0x{idx:04x}]"),
                _ => idx.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch;
    use crate::utils::Endianness;

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const BE32: Codec = Codec::new(ElfClass::Elf32, Endianness::Big);

    fn sym(shndx: u16) -> Symbol {
        Symbol {
            index: 1,
            name_offset: 0,
            name: String::new(),
            value: 0,
            size: 0,
            info: 0,
            other: 0,
            shndx,
            extended_shndx: None,
        }
    }

    #[test]
    fn test_names() {
        let x86 = arch::caps(arch::EM_X86_64);
        assert_eq!(type_name(STT_FUNC, x86, 0), "FUNC");
        assert_eq!(type_name(STT_GNU_IFUNC, x86, ELFOSABI_GNU), "IFUNC");
        assert_eq!(type_name(STT_GNU_IFUNC, x86, 0), "<OS specific>: 10");
        assert_eq!(type_name(13, arch::caps(arch::EM_ARM), 0), "THUMB_FUNC");
        assert_eq!(type_name(13, x86, 0), "<processor specific>: 13");
        assert_eq!(type_name(8, x86, 0), "<unknown>: 8");
        assert_eq!(binding_name(STB_GLOBAL, 0), "GLOBAL");
        assert_eq!(binding_name(10, ELFOSABI_GNU), "UNIQUE");
        assert_eq!(visibility_name(STV_HIDDEN, x86), "HIDDEN");
        assert_eq!(
            visibility_name(0x80, arch::caps(arch::EM_AARCH64)),
            "DEFAULT [VARIANT_PCS]"
        );
    }

    #[test]
    fn test_section_index_names() {
        let x86 = arch::caps(arch::EM_X86_64);
        assert_eq!(section_index_name(&sym(SHN_UNDEF), x86), "UND");
        assert_eq!(section_index_name(&sym(SHN_ABS), x86), "ABS");
        assert_eq!(section_index_name(&sym(SHN_COMMON), x86), "COM");
        assert_eq!(section_index_name(&sym(0xff02), x86), "LARGE_COM");
        assert_eq!(section_index_name(&sym(0xff02), &arch::GENERIC), "PRC[0xff02]");
        assert_eq!(section_index_name(&sym(0xff25), x86), "OS [0xff25]");
        assert_eq!(section_index_name(&sym(7), x86), "7");
        let mut ext = sym(SHN_XINDEX);
        ext.extended_shndx = Some(70_000);
        assert_eq!(section_index_name(&ext, x86), "70000");
        assert_eq!(ext.section_index(), Some(70_000));
        assert_eq!(sym(SHN_ABS).section_index(), None);
    }

    #[test]
    fn test_load_symbols_both_layouts() {
        let strings = StringTable::new(b"\0main\0data\0");
        let diag = Diagnostics::new();

        let mut raw = vec![0u8; 48];
        LE64.put_u32(&mut raw, 24, 1).unwrap();
        raw[24 + 4] = (STB_GLOBAL << 4) | STT_FUNC;
        LE64.put_u16(&mut raw, 24 + 6, 1).unwrap();
        LE64.put_u64(&mut raw, 24 + 8, 0x401000).unwrap();
        LE64.put_u64(&mut raw, 24 + 16, 0x20).unwrap();
        let view = FileView::new(&raw, &diag);
        let source = SymbolSource {
            offset: 0,
            count: 2,
            entsize: 24,
            strings: Some(strings),
            extended_indices: None,
        };
        let syms = load_symbols(&view, LE64, &source, "symtab").unwrap();
        assert_eq!(syms.len(), 2);
        assert_eq!(syms[1].name, "main");
        assert_eq!(syms[1].binding(), STB_GLOBAL);
        assert_eq!(syms[1].sym_type(), STT_FUNC);
        assert_eq!((syms[1].value, syms[1].size, syms[1].shndx), (0x401000, 0x20, 1));

        let mut raw = vec![0u8; 16];
        BE32.put_u32(&mut raw, 0, 99).unwrap();
        BE32.put_u32(&mut raw, 4, 0x8000).unwrap();
        raw[12] = (STB_LOCAL << 4) | STT_OBJECT;
        raw[13] = STV_HIDDEN;
        BE32.put_u16(&mut raw, 14, SHN_XINDEX).unwrap();
        let ext = [0u8, 1, 0x11, 0x70];
        let view = FileView::new(&raw, &diag);
        let source = SymbolSource {
            offset: 0,
            count: 1,
            entsize: 16,
            strings: Some(strings),
            extended_indices: Some(&ext),
        };
        let syms = load_symbols(&view, BE32, &source, "symtab").unwrap();
        assert_eq!(syms[0].name, "<corrupt>");
        assert_eq!(syms[0].visibility(), STV_HIDDEN);
        assert_eq!(syms[0].extended_shndx, Some(0x0001_1170));
    }

    #[test]
    fn test_bad_entry_size_and_index() {
        let diag = Diagnostics::new();
        let view = FileView::new(&[0u8; 64], &diag);
        let source = SymbolSource {
            offset: 0,
            count: 2,
            entsize: 8,
            strings: None,
            extended_indices: None,
        };
        assert!(matches!(
            load_symbols(&view, LE64, &source, "symtab"),
            Err(ElfError::InvalidEntrySize { .. })
        ));
        let table = SymbolTable {
            section: None,
            symbols: vec![sym(0)],
        };
        assert!(table.get(0).is_ok());
        assert!(matches!(
            table.get(5),
            Err(ElfError::BadIndex { index: 5, limit: 1, .. })
        ));
    }

    #[test]
    fn test_symbol_index_lookups() {
        let named = |name: &str, value: u64, size: u64, info: u8| Symbol {
            name: name.to_string(),
            value,
            size,
            info,
            ..sym(1)
        };
        let table = SymbolTable {
            section: Some(3),
            symbols: vec![
                named("crt.c", 0x1000, 0, STT_FILE),
                named("local_start", 0x1000, 0, STT_NOTYPE),
                named("_start", 0x1000, 0x10, (STB_GLOBAL << 4) | STT_FUNC),
                named("helper", 0x1010, 0x30, STT_FUNC),
                named("data", 0x1020, 8, STT_OBJECT),
            ],
        };
        let index = SymbolIndex::new(&table);
        assert_eq!(index.at(0x1000).map(|s| s.name.as_str()), Some("_start"));
        assert_eq!(index.at(0x1020).map(|s| s.name.as_str()), Some("data"));
        assert!(index.at(0x1001).is_none());
        assert_eq!(
            index.function_containing(0x1028).map(|s| s.name.as_str()),
            Some("helper")
        );
        assert!(index.function_containing(0x1040).is_none());
    }
}
