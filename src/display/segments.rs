//! `-l`: program headers and the section to segment mapping.

use std::io::{self, Write};

use crate::elf::program::ProgramType;
use crate::elf::section::{SectionFlags, SHT_NULL};
use crate::elf::{ElfFile, ProgramHeader, SectionHeader};

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let Some(segments) = file.segments.as_deref() else {
        file.diag()
            .warn("Cannot display the program headers: they could not be read");
        return Ok(());
    };
    if segments.is_empty() {
        writeln!(out, "\nThere are no program headers in this file.")?;
        return Ok(());
    }

    writeln!(out, "\nElf file type is {}", file.header.elf_type.describe())?;
    writeln!(out, "Entry point {:#x}", file.header.entry_point)?;
    writeln!(
        out,
        "There are {} program headers, starting at offset {}\n",
        segments.len(),
        file.header.program_header_offset
    )?;
    writeln!(out, "Program Headers:")?;
    let is_64 = file.header.class.is_64();
    if is_64 {
        writeln!(
            out,
            "  Type           Offset   VirtAddr           PhysAddr           FileSiz  MemSiz   Flg Align"
        )?;
    } else {
        writeln!(
            out,
            "  Type           Offset   VirtAddr   PhysAddr   FileSiz MemSiz  Flg Align"
        )?;
    }

    for seg in segments {
        let name = seg.segment_type.describe(file.caps);
        if is_64 {
            writeln!(
                out,
                "  {name:<14} {:#08x} {:#018x} {:#018x} {:#08x} {:#08x} {} {:#x}",
                seg.offset,
                seg.virtual_address,
                seg.physical_address,
                seg.file_size,
                seg.memory_size,
                seg.flags_string(),
                seg.alignment
            )?;
        } else {
            writeln!(
                out,
                "  {name:<14} {:#08x} {:#010x} {:#010x} {:#07x} {:#07x} {} {:#x}",
                seg.offset,
                seg.virtual_address,
                seg.physical_address,
                seg.file_size,
                seg.memory_size,
                seg.flags_string(),
                seg.alignment
            )?;
        }
        if seg.segment_type == ProgramType::Interp {
            if let Some(interp) = &file.segment_summary.interpreter {
                writeln!(out, "      [Requesting program interpreter: {interp}]")?;
            }
        }
    }

    let Some(sections) = file.sections.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    writeln!(out, "\n Section to Segment mapping:")?;
    writeln!(out, "  Segment Sections...")?;
    for (i, seg) in segments.iter().enumerate() {
        write!(out, "   {i:02}     ")?;
        for sec in sections.iter().filter(|s| section_in_segment(s, seg)) {
            write!(out, "{} ", sec.name)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// True if `sec` belongs to `seg`: by address for allocated sections, by
/// file offset for anything with file contents.
pub fn section_in_segment(sec: &SectionHeader, seg: &ProgramHeader) -> bool {
    if sec.sh_type == SHT_NULL {
        return false;
    }
    let tls = sec.flags.contains(SectionFlags::TLS);
    let is_tls_segment = seg.segment_type == ProgramType::Tls;
    // .tbss occupies no memory outside PT_TLS.
    if tls && sec.is_nobits() && !is_tls_segment {
        return false;
    }
    if is_tls_segment && !tls {
        return false;
    }

    let alloc = sec.flags.contains(SectionFlags::ALLOC);
    let within = |start: u64, size: u64, base: u64, extent: u64| {
        let end = base.saturating_add(extent);
        if size == 0 {
            start >= base && (start < end || (extent == 0 && start == base))
        } else {
            start >= base && start.saturating_add(size) <= end
        }
    };
    if alloc && !within(sec.addr, sec.size, seg.virtual_address, seg.memory_size) {
        return false;
    }
    if sec.is_nobits() {
        return alloc;
    }
    if !alloc && seg.segment_type == ProgramType::Load {
        return false;
    }
    within(sec.offset, sec.size, seg.offset, seg.file_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(name: &str, sh_type: u32, flags: SectionFlags, addr: u64, offset: u64, size: u64) -> SectionHeader {
        SectionHeader {
            index: 1,
            name_offset: 0,
            name: name.to_string(),
            sh_type,
            flags,
            addr,
            offset,
            size,
            link: 0,
            info: 0,
            addralign: 1,
            entsize: 0,
        }
    }

    fn load(vaddr: u64, offset: u64, filesz: u64, memsz: u64) -> ProgramHeader {
        ProgramHeader {
            segment_type: ProgramType::Load,
            flags: 5,
            offset,
            virtual_address: vaddr,
            physical_address: vaddr,
            file_size: filesz,
            memory_size: memsz,
            alignment: 0x1000,
        }
    }

    #[test]
    fn test_section_in_segment() {
        use crate::elf::section::{SHT_NOBITS, SHT_PROGBITS};
        let seg = load(0x400000, 0, 0x200, 0x300);
        let text = sec(".text", SHT_PROGBITS, SectionFlags::ALLOC, 0x400100, 0x100, 0x80);
        let bss = sec(".bss", SHT_NOBITS, SectionFlags::ALLOC | SectionFlags::WRITE, 0x400200, 0x200, 0x100);
        let comment = sec(".comment", SHT_PROGBITS, SectionFlags::empty(), 0, 0x180, 0x10);
        let outside = sec(".data", SHT_PROGBITS, SectionFlags::ALLOC, 0x500000, 0x400, 0x10);
        assert!(section_in_segment(&text, &seg));
        assert!(section_in_segment(&bss, &seg));
        assert!(!section_in_segment(&comment, &seg));
        assert!(!section_in_segment(&outside, &seg));

        let tbss = sec(".tbss", SHT_NOBITS, SectionFlags::ALLOC | SectionFlags::TLS, 0x400100, 0x100, 8);
        assert!(!section_in_segment(&tbss, &seg));
        let tls = ProgramHeader {
            segment_type: ProgramType::Tls,
            ..load(0x400100, 0x100, 0, 8)
        };
        assert!(section_in_segment(&tbss, &tls));
        assert!(!section_in_segment(&text, &tls));
    }
}
