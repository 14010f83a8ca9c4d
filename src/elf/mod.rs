//! # ELF Module Root
//!
//! [`ElfFile`] owns everything decoded from one object. [`ElfFile::load`]
//! runs the loaders in dependency order (header, section headers, program
//! headers, groups, symbol tables, dynamic section, dynamic symbols, version
//! tables) and keeps each result, so later displays reuse the tables instead
//! of reading the file again. A loader that fails leaves its slot empty and
//! the failure reported; displays that depend on it check for that.

pub mod attributes;
pub mod compress;
pub mod dump;
pub mod dynamic;
pub mod hash;
pub mod header;
pub mod note;
pub mod program;
pub mod reloc;
pub mod section;
pub mod strtab;
pub mod symbol;
pub mod unwind;
pub mod version;
pub mod view;

pub use header::ElfHeader;
pub use program::{ProgramHeader, ProgramType};
pub use section::SectionHeader;
pub use view::FileView;

use std::borrow::Cow;
use std::cell::OnceCell;

use crate::arch::{self, MachineCaps};
use crate::diag::Diagnostics;
use crate::errors::Result;
use crate::utils::Codec;

use dynamic::{DynamicContext, DynamicInfo};
use program::SegmentSummary;
use reloc::{RelocKind, RelocTable, Relocation};
use section::{SectionGroup, TableCounts, SHN_UNDEF, SHT_DYNAMIC, SHT_DYNSYM, SHT_NULL};
use strtab::{resolve_or_placeholder, StringTable};
use symbol::{Symbol, SymbolIndex, SymbolSource, SymbolTable};
use version::VersionTables;

/// One decoded object and every table derived from it.
pub struct ElfFile<'a> {
    pub view: FileView<'a>,
    pub header: ElfHeader,
    pub codec: Codec,
    pub caps: &'static MachineCaps,
    pub counts: TableCounts,

    /// `None` when the section header table could not be read.
    pub sections: Option<Vec<SectionHeader>>,

    /// `None` when the program header table could not be read.
    pub segments: Option<Vec<ProgramHeader>>,
    pub segment_summary: SegmentSummary,

    pub groups: Vec<SectionGroup>,

    /// Symbol tables loaded from SHT_SYMTAB and SHT_DYNSYM sections.
    pub symbol_tables: Vec<SymbolTable>,

    pub dynamic: Option<DynamicInfo<'a>>,

    /// The dynamic symbol table as located by `DT_SYMTAB`, or the `.dynsym`
    /// section when there are no usable dynamic tags.
    pub dynamic_symbols: Option<SymbolTable>,

    /// Version tables used to decorate dynamic symbol names.
    pub versions: VersionTables,

    /// The `e_shstrndx` string table, for lookups that must not fall back
    /// to a placeholder.
    pub section_names: Option<StringTable<'a>>,

    /// Address-ordered symbols for naming note ranges, built on first use.
    note_symbols: OnceCell<Option<SymbolIndex>>,
}

impl<'a> ElfFile<'a> {
    /// Decode `view`. Only a bad or truncated file header is an error; every
    /// later failure is reported to the view's diagnostics and leaves the
    /// affected table empty.
    pub fn load(view: FileView<'a>) -> Result<Self> {
        let header = ElfHeader::parse(&view)?;
        let codec = header.codec();
        let caps = arch::caps(header.machine);
        let zero = section::read_section_zero(&view, &header);
        let counts = section::resolve_counts(&header, zero.as_ref());

        let mut file = ElfFile {
            view,
            header,
            codec,
            caps,
            counts,
            sections: None,
            segments: None,
            segment_summary: SegmentSummary::default(),
            groups: Vec::new(),
            symbol_tables: Vec::new(),
            dynamic: None,
            dynamic_symbols: None,
            versions: VersionTables::default(),
            section_names: None,
            note_symbols: OnceCell::new(),
        };

        (file.sections, file.section_names) = file.load_sections();
        file.segments = file.load_segments();
        if let Some(segments) = &file.segments {
            file.segment_summary =
                program::summarize_segments(&file.view, &file.header, caps, segments);
        }
        if let Some(sections) = &file.sections {
            file.groups = section::parse_groups(&file.view, sections, codec);
        }
        file.symbol_tables = file.load_symbol_tables();
        file.dynamic = file.load_dynamic();
        file.dynamic_symbols = file.load_dynamic_symbols();
        file.versions = file.load_versions();
        Ok(file)
    }

    #[inline]
    pub fn diag(&self) -> &'a Diagnostics {
        self.view.diag()
    }

    pub fn is_relocatable(&self) -> bool {
        self.header.elf_type == header::ElfType::Relocatable
    }

    /// The section headers, or an empty slice when they could not be read.
    pub fn sections(&self) -> &[SectionHeader] {
        self.sections.as_deref().unwrap_or(&[])
    }

    pub fn segments(&self) -> &[ProgramHeader] {
        self.segments.as_deref().unwrap_or(&[])
    }

    pub fn section(&self, index: u64) -> Option<&SectionHeader> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.sections().get(i))
    }

    /// Display name of section `index`.
    pub fn section_name(&self, index: u64) -> Cow<'_, str> {
        match self.section(index) {
            Some(sec) => Cow::Borrowed(sec.name.as_str()),
            None => Cow::Owned(format!("<section {index}>")),
        }
    }

    /// The name of `sec` from the section name table, failing instead of
    /// substituting a placeholder when the name offset is bad.
    pub fn strict_section_name(&self, sec: &SectionHeader) -> Result<Cow<'a, str>> {
        section::strict_name(sec, self.section_names.as_ref())
    }

    /// Symbols by address for naming build-attribute note ranges. Built
    /// once per object from [`Self::address_symbols`].
    pub fn note_symbols(&self) -> Option<&SymbolIndex> {
        self.note_symbols
            .get_or_init(|| self.address_symbols().map(SymbolIndex::new))
            .as_ref()
    }

    /// The bytes of `sec`, or an empty slice for SHT_NOBITS.
    pub fn section_data(&self, sec: &SectionHeader) -> Result<&'a [u8]> {
        sec.data(&self.view)
    }

    /// The symbol table loaded from section `index`.
    pub fn symbol_table(&self, index: u64) -> Option<&SymbolTable> {
        self.symbol_tables
            .iter()
            .find(|t| t.section.map(|s| s as u64) == Some(index))
    }

    /// The best table for naming addresses: `.symtab`, else the dynamic symbols.
    pub fn address_symbols(&self) -> Option<&SymbolTable> {
        self.symbol_tables
            .iter()
            .find(|t| {
                t.section
                    .and_then(|s| self.sections().get(s))
                    .is_some_and(|s| s.sh_type == section::SHT_SYMTAB)
            })
            .or(self.dynamic_symbols.as_ref())
    }

    /// The section whose address range covers `addr`.
    pub fn section_containing(&self, addr: u64) -> Option<&SectionHeader> {
        self.sections().iter().find(|s| {
            s.sh_type != SHT_NULL && addr >= s.addr && addr - s.addr < s.size.max(1)
        })
    }

    /// Every relocation whose section applies to section `target`, with
    /// the symbol it names (if any and if valid).
    pub fn relocations_against(&self, target: usize) -> Vec<(Relocation, Option<&Symbol>)> {
        let mut out = Vec::new();
        for sec in self.sections() {
            let kind = match sec.sh_type {
                section::SHT_REL => RelocKind::Rel,
                section::SHT_RELA => RelocKind::Rela,
                _ => continue,
            };
            if sec.info as usize != target {
                continue;
            }
            let Some(relocs) = self.load_section_relocations(sec, kind) else {
                continue;
            };
            let symbols = self.symbol_table(u64::from(sec.link));
            let context = format!("section [{}] ({})", sec.index, sec.name);
            for (i, rel) in relocs.into_iter().enumerate() {
                let sym = match reloc::resolve_target(&rel, i, symbols, self.diag(), &context) {
                    reloc::RelocTarget::Symbol(sym) => Some(sym),
                    _ => None,
                };
                out.push((rel, sym));
            }
        }
        out
    }

    /// Load the relocations of relocation section `sec`, reporting failure.
    pub fn load_section_relocations(
        &self,
        sec: &SectionHeader,
        kind: RelocKind,
    ) -> Option<Vec<Relocation>> {
        let table = RelocTable {
            kind,
            offset: sec.offset,
            size: sec.size,
            entsize: sec.entsize,
        };
        let purpose = format!("relocation section [{}] ({})", sec.index, sec.name);
        match reloc::load_relocations(&self.view, self.codec, self.header.machine, &table, &purpose)
        {
            Ok(relocs) => Some(relocs),
            Err(e) => {
                self.diag().warn(format_args!("Unable to load {purpose}: {e}"));
                None
            }
        }
    }

    // ========================================================================
    // Loaders
    // ========================================================================

    fn load_sections(&self) -> (Option<Vec<SectionHeader>>, Option<StringTable<'a>>) {
        let diag = self.diag();
        if self.header.section_header_offset == 0 {
            if self.counts.sections != 0 {
                diag.warn("the file has a section count but no section header table");
            }
            return (Some(Vec::new()), None);
        }
        let mut sections =
            match section::load_section_headers(&self.view, &self.header, self.counts.sections) {
                Ok(sections) => sections,
                Err(e) => {
                    diag.error(format_args!("Unable to read the section headers: {e}"));
                    return (None, None);
                }
            };

        if let Some(zero) = sections.first() {
            if zero.sh_type != SHT_NULL {
                diag.warn(format_args!(
                    "Section 0 has an unexpected type {:#x}",
                    zero.sh_type
                ));
            }
            if zero.size != 0 && self.header.section_header_count != 0 {
                diag.warn("Section 0 has a non-zero size but the extended count is not in use");
            }
        }

        let names = self.section_name_table(&sections);
        for sec in &mut sections {
            sec.name = resolve_or_placeholder(names.as_ref(), u64::from(sec.name_offset)).into_owned();
        }

        let count = sections.len() as u64;
        for sec in &sections {
            if !sec.is_nobits() && sec.size != 0 && !self.view.contains(sec.offset, sec.size) {
                diag.warn(format_args!(
                    "section [{:2}] ({}) extends beyond the end of the file",
                    sec.index, sec.name
                ));
            }
            if uses_link(sec.sh_type) && u64::from(sec.link) >= count {
                diag.warn(format_args!(
                    "section [{:2}] ({}) has an invalid sh_link value {}",
                    sec.index, sec.name, sec.link
                ));
            }
        }
        (Some(sections), names)
    }

    fn section_name_table(&self, sections: &[SectionHeader]) -> Option<StringTable<'a>> {
        let index = self.counts.string_table_index;
        if index == u32::from(SHN_UNDEF) {
            return None;
        }
        let Some(strtab) = sections.get(index as usize) else {
            self.diag().warn(format_args!(
                "The e_shstrndx field ({index}) is larger than the number of sections"
            ));
            return None;
        };
        self.view
            .read_bytes(strtab.offset, strtab.size, "section name string table")
            .ok()
            .map(StringTable::new)
    }

    fn load_segments(&self) -> Option<Vec<ProgramHeader>> {
        if self.header.program_header_offset == 0 || self.counts.segments == 0 {
            return Some(Vec::new());
        }
        match program::load_program_headers(&self.view, &self.header, self.counts.segments) {
            Ok(segments) => Some(segments),
            Err(e) => {
                self.diag()
                    .error(format_args!("Unable to read the program headers: {e}"));
                None
            }
        }
    }

    fn load_symbol_tables(&self) -> Vec<SymbolTable> {
        let sections = self.sections();
        let mut tables = Vec::new();
        for sec in sections {
            if sec.sh_type != section::SHT_SYMTAB && sec.sh_type != SHT_DYNSYM {
                continue;
            }
            if sec.entsize == 0 {
                self.diag().warn(format_args!(
                    "Section [{:2}] ({}) has an entry size of zero",
                    sec.index, sec.name
                ));
                continue;
            }
            let strings = sections
                .get(sec.link as usize)
                .filter(|s| s.sh_type == section::SHT_STRTAB)
                .and_then(|s| s.data(&self.view).ok())
                .map(StringTable::new);
            let extended_indices = sections
                .iter()
                .find(|s| s.sh_type == section::SHT_SYMTAB_SHNDX && s.link as usize == sec.index)
                .and_then(|s| s.data(&self.view).ok());
            let source = SymbolSource {
                offset: sec.offset,
                count: sec.size / sec.entsize,
                entsize: sec.entsize,
                strings,
                extended_indices,
            };
            let purpose = format!("symbol table [{}] ({})", sec.index, sec.name);
            match symbol::load_symbols(&self.view, self.codec, &source, &purpose) {
                Ok(symbols) => tables.push(SymbolTable {
                    section: Some(sec.index),
                    symbols,
                }),
                Err(e) => self.diag().warn(format_args!("Unable to load {purpose}: {e}")),
            }
        }
        tables
    }

    /// Entries come from the SHT_DYNAMIC section when section headers are
    /// available, otherwise from PT_DYNAMIC.
    fn load_dynamic(&self) -> Option<DynamicInfo<'a>> {
        let from_section = self
            .sections()
            .iter()
            .find(|s| s.sh_type == SHT_DYNAMIC)
            .filter(|s| !s.is_nobits())
            .map(|s| (s.offset, s.size));
        let from_segment = self.segment_summary.dynamic;
        if let (Some((sec_off, sec_size)), Some((seg_off, seg_size))) = (from_section, from_segment) {
            if sec_off < seg_off || sec_off.saturating_add(sec_size) > seg_off.saturating_add(seg_size)
            {
                self.diag()
                    .warn("the .dynamic section is not contained within the dynamic segment");
            } else if sec_off != seg_off {
                self.diag()
                    .warn("the .dynamic section is not the same as the dynamic segment");
            }
        }
        let (offset, size) = from_section.or(from_segment)?;

        let entries = match dynamic::load_dynamic(&self.view, self.codec, offset, size) {
            Ok(entries) => entries,
            Err(e) => {
                self.diag()
                    .warn(format_args!("Unable to read the dynamic section: {e}"));
                return None;
            }
        };
        if entries.last().map(|e| e.tag) != Some(dynamic::DT_NULL) {
            self.diag()
                .warn("the dynamic section is not terminated by a DT_NULL entry");
        }
        let cx = DynamicContext {
            view: &self.view,
            codec: self.codec,
            machine: self.header.machine,
            segments: self.segments(),
            sections: self.sections.as_deref(),
            section_names: self.section_names,
        };
        Some(dynamic::interpret(&cx, entries, offset, size))
    }

    fn dynsym_section_table(&self) -> Option<&SymbolTable> {
        self.symbol_tables.iter().find(|t| {
            t.section
                .and_then(|s| self.sections().get(s))
                .is_some_and(|s| s.sh_type == SHT_DYNSYM)
        })
    }

    fn load_dynamic_symbols(&self) -> Option<SymbolTable> {
        let from_sections = self.dynsym_section_table();
        let Some(info) = &self.dynamic else {
            return from_sections.cloned();
        };
        let Some(offset) = info.symtab_offset else {
            return from_sections.cloned();
        };
        let count = info.symbol_count.or_else(|| {
            from_sections.map(|t| t.len() as u64)
        });
        let Some(count) = count else {
            self.diag()
                .warn("Unable to determine the number of symbols to load");
            return from_sections.cloned();
        };
        let source = SymbolSource {
            offset,
            count,
            entsize: info.syment,
            strings: info.strings,
            extended_indices: None,
        };
        match symbol::load_symbols(&self.view, self.codec, &source, "dynamic symbols") {
            Ok(symbols) => Some(SymbolTable {
                section: None,
                symbols,
            }),
            Err(e) => {
                self.diag()
                    .warn(format_args!("Unable to load the dynamic symbols: {e}"));
                from_sections.cloned()
            }
        }
    }

    /// Version tables: from the dynamic tags when they locate them, else
    /// from the SHT_GNU_verdef/verneed/versym sections.
    fn load_versions(&self) -> VersionTables {
        let diag = self.diag();
        let symbol_count = self.dynamic_symbols.as_ref().map_or(0, |t| t.len() as u64);
        let mut tables = VersionTables::default();

        if let Some(info) = &self.dynamic {
            let strings = info.strings.as_ref();
            if let Some((off, num)) = info.verdef {
                if let Ok(data) = self.view.tail(off, "version definitions") {
                    tables.defs = version::walk_verdef(data, self.codec, num, strings, diag);
                }
            }
            if let Some((off, num)) = info.verneed {
                if let Ok(data) = self.view.tail(off, "version requirements") {
                    tables.needs = version::walk_verneed(data, self.codec, num, strings, diag);
                }
            }
            if let Some(off) = info.versym_offset {
                if let Ok(data) = self.view.read(off, 2, symbol_count, "version symbol table") {
                    tables.versym = version::parse_versym(data, self.codec);
                }
            }
            if !tables.is_empty() || !tables.versym.is_empty() {
                return tables;
            }
        }

        let sections = self.sections();
        let strings_of = |sec: &SectionHeader| {
            sections
                .get(sec.link as usize)
                .and_then(|s| s.data(&self.view).ok())
                .map(StringTable::new)
        };
        for sec in sections {
            let Ok(data) = sec.data(&self.view) else {
                continue;
            };
            match sec.sh_type {
                section::SHT_GNU_VERDEF => {
                    let strings = strings_of(sec);
                    tables.defs =
                        version::walk_verdef(data, self.codec, u64::from(sec.info), strings.as_ref(), diag);
                }
                section::SHT_GNU_VERNEED => {
                    let strings = strings_of(sec);
                    tables.needs =
                        version::walk_verneed(data, self.codec, u64::from(sec.info), strings.as_ref(), diag);
                }
                section::SHT_GNU_VERSYM => tables.versym = version::parse_versym(data, self.codec),
                _ => {}
            }
        }
        tables
    }
}

/// Section types whose `sh_link` names another section.
fn uses_link(sh_type: u32) -> bool {
    matches!(
        sh_type,
        section::SHT_SYMTAB
            | SHT_DYNSYM
            | SHT_DYNAMIC
            | section::SHT_REL
            | section::SHT_RELA
            | section::SHT_HASH
            | section::SHT_GNU_HASH
            | section::SHT_GROUP
            | section::SHT_SYMTAB_SHNDX
            | section::SHT_GNU_VERDEF
            | section::SHT_GNU_VERNEED
            | section::SHT_GNU_VERSYM
    )
}
