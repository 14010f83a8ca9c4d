//! Synthetic ELF images for tests.
//!
//! [`ElfBuilder`] lays out a file header, an optional program header table,
//! the section bodies, a generated `.shstrtab` and the section header table,
//! in that order. Segments are described by the range of sections they
//! cover, so their offsets follow the layout automatically.

use crate::utils::{Codec, ElfClass, Endianness};

pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;

/// One section to emit. `link` and `info` are raw header values.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub data: Vec<u8>,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

impl Section {
    pub fn new(name: &str, sh_type: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            sh_type,
            data,
            addralign: 1,
            ..Self::default()
        }
    }
}

/// A segment covering sections `first..=last` (1-based section indices).
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub p_type: u32,
    pub flags: u32,
    pub first: usize,
    pub last: usize,
}

pub struct ElfBuilder {
    pub codec: Codec,
    pub elf_type: u16,
    pub machine: u16,
    pub entry: u64,
    pub sections: Vec<Section>,
    pub segments: Vec<Segment>,
}

/// A NUL-separated string table under construction.
#[derive(Debug, Clone)]
pub struct Strings(pub Vec<u8>);

impl Strings {
    pub fn new() -> Self {
        Strings(vec![0])
    }

    /// Append `s` and return its offset.
    pub fn add(&mut self, s: &str) -> u32 {
        let at = self.0.len() as u32;
        self.0.extend_from_slice(s.as_bytes());
        self.0.push(0);
        at
    }
}

impl ElfBuilder {
    pub fn new(class: ElfClass, endian: Endianness, elf_type: u16, machine: u16) -> Self {
        Self {
            codec: Codec::new(class, endian),
            elf_type,
            machine,
            entry: 0,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Add a section and return its index (section 0 is the null section).
    pub fn section(&mut self, section: Section) -> usize {
        self.sections.push(section);
        self.sections.len()
    }

    fn is_64(&self) -> bool {
        self.codec.class.is_64()
    }

    fn header_size(&self) -> u64 {
        if self.is_64() {
            64
        } else {
            52
        }
    }

    fn phdr_size(&self) -> u64 {
        if self.is_64() {
            56
        } else {
            32
        }
    }

    fn shdr_size(&self) -> u64 {
        if self.is_64() {
            64
        } else {
            40
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let c = self.codec;
        let mut names = Strings::new();
        let name_offsets: Vec<u32> = self.sections.iter().map(|s| names.add(&s.name)).collect();
        let shstrtab_name = names.add(".shstrtab");

        let phoff = if self.segments.is_empty() { 0 } else { self.header_size() };
        let mut pos = self.header_size() + self.phdr_size() * self.segments.len() as u64;
        let mut offsets = Vec::new();
        for sec in &self.sections {
            pos = (pos + 7) & !7;
            offsets.push(pos);
            if sec.sh_type != crate::elf::section::SHT_NOBITS {
                pos += sec.data.len() as u64;
            }
        }
        let shstrtab_offset = pos;
        pos += names.0.len() as u64;
        let shoff = (pos + 7) & !7;
        let shnum = self.sections.len() as u64 + 2;
        let total = shoff + shnum * self.shdr_size();
        let mut out = vec![0u8; total as usize];

        // File header.
        out[..4].copy_from_slice(b"\x7fELF");
        out[4] = if self.is_64() { 2 } else { 1 };
        out[5] = match c.endian {
            Endianness::Little => 1,
            Endianness::Big => 2,
        };
        out[6] = 1;
        let w = c.word_size();
        let tail = 24 + 3 * w;
        c.put_u16(&mut out, 16, self.elf_type).unwrap();
        c.put_u16(&mut out, 18, self.machine).unwrap();
        c.put_u32(&mut out, 20, 1).unwrap();
        c.put_word(&mut out, 24, self.entry).unwrap();
        c.put_word(&mut out, 24 + w, phoff).unwrap();
        c.put_word(&mut out, 24 + 2 * w, shoff).unwrap();
        c.put_u16(&mut out, tail + 4, self.header_size() as u16).unwrap();
        c.put_u16(&mut out, tail + 6, self.phdr_size() as u16).unwrap();
        c.put_u16(&mut out, tail + 8, self.segments.len() as u16).unwrap();
        c.put_u16(&mut out, tail + 10, self.shdr_size() as u16).unwrap();
        c.put_u16(&mut out, tail + 12, shnum as u16).unwrap();
        c.put_u16(&mut out, tail + 14, (shnum - 1) as u16).unwrap();

        // Program headers.
        for (i, seg) in self.segments.iter().enumerate() {
            let at = (phoff + i as u64 * self.phdr_size()) as usize;
            let first = &self.sections[seg.first - 1];
            let offset = offsets[seg.first - 1];
            let end = offsets[seg.last - 1] + self.sections[seg.last - 1].data.len() as u64;
            let (vaddr, size) = (first.addr, end - offset);
            if self.is_64() {
                c.put_u32(&mut out, at, seg.p_type).unwrap();
                c.put_u32(&mut out, at + 4, seg.flags).unwrap();
                c.put_u64(&mut out, at + 8, offset).unwrap();
                c.put_u64(&mut out, at + 16, vaddr).unwrap();
                c.put_u64(&mut out, at + 24, vaddr).unwrap();
                c.put_u64(&mut out, at + 32, size).unwrap();
                c.put_u64(&mut out, at + 40, size).unwrap();
                c.put_u64(&mut out, at + 48, 0x1000).unwrap();
            } else {
                c.put_u32(&mut out, at, seg.p_type).unwrap();
                c.put_u32(&mut out, at + 4, offset as u32).unwrap();
                c.put_u32(&mut out, at + 8, vaddr as u32).unwrap();
                c.put_u32(&mut out, at + 12, vaddr as u32).unwrap();
                c.put_u32(&mut out, at + 16, size as u32).unwrap();
                c.put_u32(&mut out, at + 20, size as u32).unwrap();
                c.put_u32(&mut out, at + 24, seg.flags).unwrap();
                c.put_u32(&mut out, at + 28, 0x1000).unwrap();
            }
        }

        // Section bodies and the name table.
        for (sec, &off) in self.sections.iter().zip(&offsets) {
            if sec.sh_type != crate::elf::section::SHT_NOBITS {
                let off = off as usize;
                out[off..off + sec.data.len()].copy_from_slice(&sec.data);
            }
        }
        let at = shstrtab_offset as usize;
        out[at..at + names.0.len()].copy_from_slice(&names.0);

        // Section headers; index 0 stays zeroed.
        let shstrtab = Section {
            name: ".shstrtab".to_string(),
            sh_type: crate::elf::section::SHT_STRTAB,
            addralign: 1,
            ..Section::default()
        };
        let rows = self
            .sections
            .iter()
            .zip(offsets.iter().copied().zip(name_offsets))
            .map(|(s, (off, name))| (s, off, name, s.data.len() as u64))
            .chain(std::iter::once((
                &shstrtab,
                shstrtab_offset,
                shstrtab_name,
                names.0.len() as u64,
            )));
        for (i, (sec, offset, name, size)) in rows.enumerate() {
            let at = (shoff + (i as u64 + 1) * self.shdr_size()) as usize;
            c.put_u32(&mut out, at, name).unwrap();
            c.put_u32(&mut out, at + 4, sec.sh_type).unwrap();
            if self.is_64() {
                c.put_u64(&mut out, at + 8, sec.flags).unwrap();
                c.put_u64(&mut out, at + 16, sec.addr).unwrap();
                c.put_u64(&mut out, at + 24, offset).unwrap();
                c.put_u64(&mut out, at + 32, size).unwrap();
                c.put_u32(&mut out, at + 40, sec.link).unwrap();
                c.put_u32(&mut out, at + 44, sec.info).unwrap();
                c.put_u64(&mut out, at + 48, sec.addralign).unwrap();
                c.put_u64(&mut out, at + 56, sec.entsize).unwrap();
            } else {
                c.put_u32(&mut out, at + 8, sec.flags as u32).unwrap();
                c.put_u32(&mut out, at + 12, sec.addr as u32).unwrap();
                c.put_u32(&mut out, at + 16, offset as u32).unwrap();
                c.put_u32(&mut out, at + 20, size as u32).unwrap();
                c.put_u32(&mut out, at + 24, sec.link).unwrap();
                c.put_u32(&mut out, at + 28, sec.info).unwrap();
                c.put_u32(&mut out, at + 32, sec.addralign as u32).unwrap();
                c.put_u32(&mut out, at + 36, sec.entsize as u32).unwrap();
            }
        }
        out
    }
}

/// Encode one symbol.
pub fn symbol(codec: Codec, name: u32, value: u64, size: u64, info: u8, shndx: u16) -> Vec<u8> {
    if codec.class.is_64() {
        let mut out = vec![0u8; 24];
        codec.put_u32(&mut out, 0, name).unwrap();
        out[4] = info;
        codec.put_u16(&mut out, 6, shndx).unwrap();
        codec.put_u64(&mut out, 8, value).unwrap();
        codec.put_u64(&mut out, 16, size).unwrap();
        out
    } else {
        let mut out = vec![0u8; 16];
        codec.put_u32(&mut out, 0, name).unwrap();
        codec.put_u32(&mut out, 4, value as u32).unwrap();
        codec.put_u32(&mut out, 8, size as u32).unwrap();
        out[12] = info;
        codec.put_u16(&mut out, 14, shndx).unwrap();
        out
    }
}

/// Encode one RELA record.
pub fn rela(codec: Codec, offset: u64, sym: u32, rtype: u32, addend: i64) -> Vec<u8> {
    if codec.class.is_64() {
        let mut out = vec![0u8; 24];
        codec.put_u64(&mut out, 0, offset).unwrap();
        codec.put_u64(&mut out, 8, (u64::from(sym) << 32) | u64::from(rtype)).unwrap();
        codec.put_u64(&mut out, 16, addend as u64).unwrap();
        out
    } else {
        let mut out = vec![0u8; 12];
        codec.put_u32(&mut out, 0, offset as u32).unwrap();
        codec.put_u32(&mut out, 4, (sym << 8) | (rtype & 0xff)).unwrap();
        codec.put_u32(&mut out, 8, addend as u32).unwrap();
        out
    }
}

/// Encode a dynamic array.
pub fn dynamic(codec: Codec, entries: &[(u64, u64)]) -> Vec<u8> {
    let w = codec.word_size();
    let mut out = vec![0u8; entries.len() * 2 * w];
    for (i, &(tag, value)) in entries.iter().enumerate() {
        codec.put_word(&mut out, i * 2 * w, tag).unwrap();
        codec.put_word(&mut out, i * 2 * w + w, value).unwrap();
    }
    out
}

/// Encode one note record with 4-byte padding.
pub fn note(codec: Codec, name: &str, note_type: u32, desc: &[u8]) -> Vec<u8> {
    let pad = |n: usize| (n + 3) & !3;
    let namesz = name.len() + 1;
    let mut out = vec![0u8; 12 + pad(namesz) + pad(desc.len())];
    codec.put_u32(&mut out, 0, namesz as u32).unwrap();
    codec.put_u32(&mut out, 4, desc.len() as u32).unwrap();
    codec.put_u32(&mut out, 8, note_type).unwrap();
    out[12..12 + name.len()].copy_from_slice(name.as_bytes());
    let at = 12 + pad(namesz);
    out[at..at + desc.len()].copy_from_slice(desc);
    out
}

/// Encode a SysV hash table with 4-byte entries.
pub fn sysv_hash(codec: Codec, buckets: &[u32], chains: &[u32]) -> Vec<u8> {
    let words: Vec<u32> = [buckets.len() as u32, chains.len() as u32]
        .into_iter()
        .chain(buckets.iter().copied())
        .chain(chains.iter().copied())
        .collect();
    let mut out = vec![0u8; words.len() * 4];
    for (i, w) in words.into_iter().enumerate() {
        codec.put_u32(&mut out, i * 4, w).unwrap();
    }
    out
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{EM_386, EM_X86_64};
    use crate::config::{DumpTarget, Options};
    use crate::diag::Diagnostics;
    use crate::display;
    use crate::elf::dynamic::{DT_HASH, DT_NEEDED, DT_NULL, DT_STRSZ, DT_STRTAB};
    use crate::elf::header::ElfHeader;
    use crate::elf::section::{
        SectionFlags, SHT_DYNAMIC, SHT_HASH, SHT_NOTE, SHT_PROGBITS, SHT_RELA, SHT_RELR, SHT_STRTAB,
        SHT_SYMTAB,
    };
    use crate::elf::symbol::{STB_GLOBAL, STB_LOCAL, STT_FUNC, STT_OBJECT};
    use crate::elf::{ElfFile, FileView};

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const PT_LOAD: u32 = 1;

    fn render(data: &[u8], opts: &Options) -> (String, Diagnostics) {
        let diag = Diagnostics::new();
        let text = {
            let file = ElfFile::load(FileView::new(data, &diag)).unwrap();
            let mut out = Vec::new();
            display::render(&file, opts, &mut out).unwrap();
            String::from_utf8(out).unwrap()
        };
        (text, diag)
    }

    /// A 64-bit little-endian executable: `.text`, `.symtab`, `.strtab`,
    /// one PT_LOAD over `.text`, and the symbols `counter` (LOCAL OBJECT)
    /// and `main` (GLOBAL FUNC).
    fn scenario_a() -> ElfBuilder {
        let mut b = ElfBuilder::new(ElfClass::Elf64, Endianness::Little, ET_EXEC, EM_X86_64);
        b.entry = 0x401000;
        let text = b.section(Section {
            flags: SectionFlags::ALLOC.bits() | SectionFlags::EXECINSTR.bits(),
            addr: 0x401000,
            addralign: 16,
            ..Section::new(".text", SHT_PROGBITS, vec![0xc3; 16])
        });
        let mut strings = Strings::new();
        let counter = strings.add("counter");
        let main = strings.add("main");
        let mut syms = symbol(LE64, 0, 0, 0, 0, 0);
        syms.extend(symbol(LE64, counter, 0x401008, 4, (STB_LOCAL << 4) | STT_OBJECT, text as u16));
        syms.extend(symbol(LE64, main, 0x401000, 8, (STB_GLOBAL << 4) | STT_FUNC, text as u16));
        b.section(Section {
            link: 3,
            info: 2,
            addralign: 8,
            entsize: 24,
            ..Section::new(".symtab", SHT_SYMTAB, syms)
        });
        b.section(Section::new(".strtab", SHT_STRTAB, strings.0));
        b.segments.push(Segment {
            p_type: PT_LOAD,
            flags: 5,
            first: text,
            last: text,
        });
        b
    }

    #[test]
    fn test_header_round_trip() {
        for class in [ElfClass::Elf32, ElfClass::Elf64] {
            for endian in [Endianness::Little, Endianness::Big] {
                let mut b = ElfBuilder::new(class, endian, ET_EXEC, EM_X86_64);
                b.entry = 0x8048000;
                b.section(Section::new(".data", SHT_PROGBITS, vec![1, 2, 3]));
                let data = b.build();
                let header = ElfHeader::parse_bytes(&data).unwrap();
                let size = ElfHeader::size_for(class);
                assert_eq!(header.encode().unwrap(), data[..size].to_vec());
            }
        }
    }

    #[test]
    fn test_scenario_a_well_formed_executable() {
        let data = scenario_a().build();
        let opts = Options {
            file_header: true,
            sections: true,
            symbols: true,
            ..Options::default()
        };
        let (text, diag) = render(&data, &opts);
        assert!(!diag.has_errors(), "{:?}", diag.entries());

        assert!(text.contains("ELF64"));
        assert!(text.contains("2's complement, little endian"));

        let order: Vec<usize> = [".text", ".symtab", ".strtab", ".shstrtab"]
            .iter()
            .map(|name| text.find(&format!("] {name} ")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("There are 5 section headers"));

        assert!(text.contains("Symbol table '.symtab' contains 3 entries:"));
        let counter = text.lines().find(|l| l.ends_with(" counter")).unwrap();
        assert!(counter.contains("OBJECT  LOCAL  DEFAULT"));
        let main = text.lines().find(|l| l.ends_with(" main")).unwrap();
        assert!(main.contains("FUNC    GLOBAL DEFAULT"));
        assert!(main.starts_with("     2: 0000000000401000     8"));
    }

    #[test]
    fn test_scenario_b_bad_section_offset() {
        let mut data = scenario_a().build();
        // e_shoff of a 64-bit header lives at byte 40.
        let bogus = data.len() as u64 + 0x1000;
        LE64.put_u64(&mut data, 40, bogus).unwrap();

        let opts = Options {
            file_header: true,
            symbols: true,
            relocs: true,
            dynamic: true,
            ..Options::default()
        };
        let (text, diag) = render(&data, &opts);
        assert!(text.contains(&format!("{bogus} (bytes into file)")));
        assert!(diag.mentions("Unable to read the section headers"));
        assert!(diag.mentions("Cannot display the symbol tables"));
        assert!(diag.mentions("Cannot display the relocations"));
        assert!(diag.mentions("Cannot display the dynamic section"));
        assert!(!text.contains("Symbol table"));
    }

    #[test]
    fn test_scenario_c_bad_symbol_index() {
        let mut b = ElfBuilder::new(ElfClass::Elf64, Endianness::Little, ET_REL, EM_X86_64);
        let text = b.section(Section::new(".text", SHT_PROGBITS, vec![0; 0x30]));
        let mut strings = Strings::new();
        let foo = strings.add("foo");
        let bar = strings.add("bar");
        let mut syms = symbol(LE64, 0, 0, 0, 0, 0);
        syms.extend(symbol(LE64, foo, 0x10, 0, (STB_GLOBAL << 4) | STT_FUNC, text as u16));
        syms.extend(symbol(LE64, bar, 0x20, 0, (STB_GLOBAL << 4) | STT_OBJECT, text as u16));
        let symtab = b.section(Section {
            link: 3,
            info: 1,
            entsize: 24,
            ..Section::new(".symtab", SHT_SYMTAB, syms)
        });
        b.section(Section::new(".strtab", SHT_STRTAB, strings.0));

        let mut relocs = rela(LE64, 0x4, 1, 2, -4);
        relocs.extend(rela(LE64, 0x14, 5, 2, -4));
        relocs.extend(rela(LE64, 0x28, 2, 1, 8));
        b.section(Section {
            link: symtab as u32,
            info: text as u32,
            entsize: 24,
            ..Section::new(".rela.text", SHT_RELA, relocs)
        });

        let opts = Options {
            relocs: true,
            ..Options::default()
        };
        let (out, diag) = render(&b.build(), &opts);
        assert!(diag.mentions("bad symbol index: 0x5 (table has 3 entries)"));
        assert!(out.contains("Relocation section '.rela.text' at offset"));
        assert!(out.contains("contains 3 entries:"));

        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with("0000000000000")).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("R_X86_64_PC32") && rows[0].ends_with("foo - 4"));
        assert!(rows[1].starts_with("0000000000000014  0000000500000002 R_X86_64_PC32"));
        assert!(rows[1].contains("<corrupt symbol index: 5>"));
        assert!(rows[2].contains("R_X86_64_64") && rows[2].ends_with("bar + 8"));
    }

    #[test]
    fn test_scenario_d_dynstr_disagrees_with_tags() {
        let mut b = ElfBuilder::new(ElfClass::Elf64, Endianness::Little, ET_EXEC, EM_X86_64);
        let mut fake = Strings::new();
        fake.add("libfake.so");
        let mut real = Strings::new();
        let needed = real.add("libreal.so");
        let dynstr = b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x1000,
            ..Section::new(".dynstr", SHT_STRTAB, fake.0)
        });
        b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x2000,
            ..Section::new(".rodata", SHT_PROGBITS, real.0.clone())
        });
        let entries = [
            (DT_NEEDED, u64::from(needed)),
            (DT_STRTAB, 0x2000),
            (DT_STRSZ, real.0.len() as u64),
            (DT_NULL, 0),
        ];
        b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x3000,
            link: dynstr as u32,
            entsize: 16,
            addralign: 8,
            ..Section::new(".dynamic", SHT_DYNAMIC, dynamic(LE64, &entries))
        });

        let opts = Options {
            dynamic: true,
            ..Options::default()
        };
        let (out, diag) = render(&b.build(), &opts);
        assert!(diag.mentions("doesn't match the DT_STRTAB and DT_STRSZ tags"));
        assert!(out.contains("Dynamic section at offset"));
        assert!(out.contains("contains 4 entries:"));
        assert!(out.contains("Shared library: [libreal.so]"));
        assert!(!out.contains("libfake.so"));
    }

    #[test]
    fn test_big_endian_32_bit_symbols() {
        let be32 = Codec::new(ElfClass::Elf32, Endianness::Big);
        let mut b = ElfBuilder::new(ElfClass::Elf32, Endianness::Big, ET_REL, EM_386);
        let data = b.section(Section::new(".data", SHT_PROGBITS, vec![0; 8]));
        let mut strings = Strings::new();
        let answer = strings.add("answer");
        let mut syms = symbol(be32, 0, 0, 0, 0, 0);
        syms.extend(symbol(be32, answer, 4, 4, (STB_GLOBAL << 4) | STT_OBJECT, data as u16));
        b.section(Section {
            link: 3,
            info: 1,
            entsize: 16,
            ..Section::new(".symtab", SHT_SYMTAB, syms)
        });
        b.section(Section::new(".strtab", SHT_STRTAB, strings.0));

        let opts = Options {
            file_header: true,
            symbols: true,
            ..Options::default()
        };
        let (out, diag) = render(&b.build(), &opts);
        assert!(!diag.has_errors(), "{:?}", diag.entries());
        assert!(out.contains("ELF32"));
        assert!(out.contains("2's complement, big endian"));
        let row = out.lines().find(|l| l.ends_with(" answer")).unwrap();
        assert!(row.starts_with("     1: 00000004     4 OBJECT  GLOBAL DEFAULT    1"));
    }

    #[test]
    fn test_build_id_note_and_hash_histogram() {
        let mut b = ElfBuilder::new(ElfClass::Elf64, Endianness::Little, ET_EXEC, EM_X86_64);
        b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x400,
            addralign: 4,
            ..Section::new(".note.gnu.build-id", SHT_NOTE, note(LE64, "GNU", 3, &[0xde, 0xad, 0xbe, 0xef]))
        });
        // Bucket 0 chains 1 -> 2, bucket 1 holds 3 alone.
        b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x1000,
            addralign: 8,
            entsize: 4,
            ..Section::new(".hash", SHT_HASH, sysv_hash(LE64, &[1, 3], &[0, 2, 0, 0]))
        });
        b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x3000,
            entsize: 16,
            addralign: 8,
            ..Section::new(".dynamic", SHT_DYNAMIC, dynamic(LE64, &[(DT_HASH, 0x1000), (DT_NULL, 0)]))
        });

        let opts = Options {
            notes: true,
            histogram: true,
            ..Options::default()
        };
        let (out, _diag) = render(&b.build(), &opts);
        assert!(out.contains("Displaying notes found in: .note.gnu.build-id"));
        assert!(out.contains("  GNU                  0x00000004\tNT_GNU_BUILD_ID"));
        assert!(out.contains("    Build ID: deadbeef"));

        assert!(out.contains("Histogram for bucket list length (total of 2 buckets):"));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.contains(&"      0  0            0.0%"));
        assert!(lines.contains(&"      1  1           50.0%     33.3%"));
        assert!(lines.contains(&"      2  1           50.0%    100.0%"));
    }

    #[test]
    fn test_build_attribute_notes_name_their_ranges() {
        let mut b = scenario_a();
        let range = |start: u64, end: u64| {
            let mut desc = start.to_le_bytes().to_vec();
            desc.extend_from_slice(&end.to_le_bytes());
            desc
        };
        let mut notes = note(LE64, "GA$\x013p1", 0x100, &range(0x401000, 0x401010));
        notes.extend(note(LE64, "GA*\x02\x03", 0x100, &[]));
        notes.extend(note(LE64, "GA+\x03", 0x101, &range(0x401000, 0)));
        b.section(Section {
            addralign: 4,
            ..Section::new(".gnu.build.attributes", SHT_NOTE, notes)
        });

        let opts = Options {
            notes: true,
            ..Options::default()
        };
        let (out, diag) = render(&b.build(), &opts);
        assert!(!diag.has_errors(), "{:?}", diag.entries());
        assert!(out.contains("Displaying notes found in: .gnu.build.attributes"));
        assert!(out.contains("  GA$<version>3p1      0x00000010\tOPEN"));
        assert!(out.contains("  GA*<stack prot>strong 0x00000000\tOPEN"));
        assert!(out.contains("  GA+<relro>true       0x00000010\tfunc"));

        let regions: Vec<&str> = out
            .lines()
            .filter_map(|l| l.strip_prefix("    Applies to region from "))
            .collect();
        assert_eq!(
            regions,
            vec!["0x401000 to 0x401010 (main)", "0x401000 to 0x401010", "0x401000 to 0x401008 (main)"]
        );
    }

    #[test]
    fn test_corrupt_section_name_only_dumps_by_index() {
        let mut data = scenario_a().build();
        // Point the sh_name of section 1 (.text) past the end of .shstrtab.
        let shoff = LE64.u64_at(&data, 40).unwrap() as usize;
        LE64.put_u32(&mut data, shoff + 64, 0xffff).unwrap();

        let opts = Options {
            hex_dumps: vec![
                DumpTarget::Index(1),
                DumpTarget::Name("<corrupt>".into()),
                DumpTarget::Name(".strtab".into()),
            ],
            ..Options::default()
        };
        let (out, diag) = render(&data, &opts);
        assert!(diag.mentions("Section [ 1] has a corrupt name"));
        assert!(diag.mentions("string offset 0xffff is outside the string table"));
        assert!(diag.mentions("Section '<corrupt>' was not dumped because it does not exist"));
        assert_eq!(out.matches("Hex dump of section '<corrupt>':").count(), 1);
        assert!(out.contains("Hex dump of section '.strtab':"));
    }

    #[test]
    fn test_relr_listing_groups_addresses_by_word() {
        let mut b = scenario_a();
        let mut words = vec![0u8; 24];
        for (i, w) in [0x401000u64, 0b111, 0b1].into_iter().enumerate() {
            LE64.put_u64(&mut words, i * 8, w).unwrap();
        }
        b.section(Section {
            flags: SectionFlags::ALLOC.bits(),
            addr: 0x402000,
            addralign: 8,
            entsize: 8,
            ..Section::new(".relr.dyn", SHT_RELR, words)
        });

        let opts = Options {
            relocs: true,
            ..Options::default()
        };
        let (out, _diag) = render(&b.build(), &opts);
        assert!(out.contains("section '.relr.dyn' at offset"));
        assert!(out.contains("contains 3 entries which relocate 3 locations:"));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.iter().any(|l| l.starts_with("0000:  0000000000401000 0000000000401000")));
        assert!(lines.iter().any(|l| l.starts_with("0001:  0000000000000007 0000000000401008")));
        let continuation = format!("{:24}0000000000401010", "");
        assert!(lines.iter().any(|l| l.starts_with(&continuation)));
        assert!(lines.contains(&"0002:  0000000000000001"));
    }
}
