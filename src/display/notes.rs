//! `-n`: note sections, or note segments when there are no sections.

use std::io::{self, Write};

use crate::elf::header::ElfType;
use crate::elf::note::{describe, walk_notes, BuildRanges, NoteContext};
use crate::elf::program::ProgramType;
use crate::elf::section::SHT_NOTE;
use crate::elf::ElfFile;

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let cx = NoteContext {
        codec: file.codec,
        machine: file.header.machine,
        is_core: file.header.elf_type == ElfType::Core,
        symbols: file.note_symbols(),
    };
    let mut ranges = BuildRanges::default();

    let sections = file.sections();
    if !sections.is_empty() {
        let mut found = false;
        for sec in sections.iter().filter(|s| s.sh_type == SHT_NOTE) {
            found = true;
            let data = match file.section_data(sec) {
                Ok(data) => data,
                Err(e) => {
                    file.diag()
                        .warn(format_args!("Unable to read note section {}: {e}", sec.name));
                    continue;
                }
            };
            writeln!(out, "\nDisplaying notes found in: {}", sec.name)?;
            render_area(file, data, sec.addralign, &cx, &mut ranges, out)?;
        }
        if !found {
            writeln!(out, "\nThere are no notes in this file.")?;
        }
        return Ok(());
    }

    let mut found = false;
    for seg in file.segments().iter().filter(|s| s.segment_type == ProgramType::Note) {
        found = true;
        let data = match file
            .view
            .read_bytes(seg.offset, seg.file_size, "note segment")
        {
            Ok(data) => data,
            Err(e) => {
                file.diag()
                    .warn(format_args!("Unable to read note segment at {:#x}: {e}", seg.offset));
                continue;
            }
        };
        writeln!(
            out,
            "\nDisplaying notes found at file offset {:#010x} with length {:#010x}:",
            seg.offset, seg.file_size
        )?;
        render_area(file, data, seg.alignment, &cx, &mut ranges, out)?;
    }
    if !found {
        writeln!(out, "\nThere are no notes in this file.")?;
    }
    Ok(())
}

fn render_area(
    file: &ElfFile<'_>,
    data: &[u8],
    align: u64,
    cx: &NoteContext<'_>,
    ranges: &mut BuildRanges,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(out, "  Owner                Data size \tDescription")?;
    for note in walk_notes(data, file.codec, align, file.diag()) {
        let description = describe(&note, cx, ranges);
        writeln!(
            out,
            "  {:<20} {:#010x}\t{}",
            description.owner.as_deref().unwrap_or(&note.name),
            note.desc.len(),
            description.type_name
        )?;
        for line in &description.lines {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}
