//! `-V`: version definitions, requirements and the per-symbol version array.

use std::io::{self, Write};

use crate::elf::section::{SHT_GNU_VERDEF, SHT_GNU_VERNEED, SHT_GNU_VERSYM};
use crate::elf::version::{flag_names, VERSYM_HIDDEN};
use crate::elf::{ElfFile, SectionHeader};

/// Heading for one of the version tables: the section when there is one,
/// otherwise a note that the table was found through the dynamic tags.
fn heading(
    file: &ElfFile<'_>,
    sh_type: u32,
    what: &str,
    count: usize,
    out: &mut dyn Write,
) -> io::Result<()> {
    let entries = if count == 1 { "entry" } else { "entries" };
    match find(file, sh_type) {
        Some(sec) => {
            writeln!(
                out,
                "\n{what} section '{}' contains {count} {entries}:",
                sec.name
            )?;
            writeln!(
                out,
                " Addr: {:#018x}  Offset: {:#08x}  Link: {} ({})",
                sec.addr,
                sec.offset,
                sec.link,
                file.section_name(u64::from(sec.link))
            )
        }
        None => writeln!(
            out,
            "\n{what} from the dynamic section contains {count} {entries}:"
        ),
    }
}

fn find<'f>(file: &'f ElfFile<'_>, sh_type: u32) -> Option<&'f SectionHeader> {
    file.sections().iter().find(|s| s.sh_type == sh_type)
}

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let tables = &file.versions;
    if tables.is_empty() && tables.versym.is_empty() {
        writeln!(out, "\nNo version information found in this file.")?;
        return Ok(());
    }

    if !tables.versym.is_empty() {
        heading(file, SHT_GNU_VERSYM, "Version symbols", tables.versym.len(), out)?;
        for (row, chunk) in tables.versym.chunks(4).enumerate() {
            write!(out, "  {:03x}:", row * 4)?;
            for &raw in chunk {
                let text = match tables.index_name(raw) {
                    Some(name) => format!("({name})"),
                    None => "(*invalid*)".to_string(),
                };
                let hidden = if raw & VERSYM_HIDDEN != 0 { 'h' } else { ' ' };
                write!(out, " {:3x}{hidden}{text:<14}", raw & !VERSYM_HIDDEN)?;
            }
            writeln!(out)?;
        }
    }

    if !tables.defs.is_empty() {
        heading(file, SHT_GNU_VERDEF, "Version definition", tables.defs.len(), out)?;
        for def in &tables.defs {
            let name = def.names.first().map_or("<none>", |n| n.name.as_str());
            writeln!(
                out,
                "  {:#06x}: Rev: {}  Flags: {}  Index: {}  Cnt: {}  Name: {name}",
                def.offset,
                def.version,
                flag_names(def.flags),
                def.index,
                def.names.len()
            )?;
            for (i, parent) in def.names.iter().enumerate().skip(1) {
                writeln!(out, "  {:#06x}: Parent {i}: {}", parent.offset, parent.name)?;
            }
        }
    }

    if !tables.needs.is_empty() {
        heading(file, SHT_GNU_VERNEED, "Version needs", tables.needs.len(), out)?;
        for need in &tables.needs {
            writeln!(
                out,
                "  {:#06x}: Version: {}  File: {}  Cnt: {}",
                need.offset,
                need.version,
                need.file,
                need.entries.len()
            )?;
            for aux in &need.entries {
                writeln!(
                    out,
                    "  {:#06x}:   Name: {}  Flags: {}  Version: {}",
                    aux.offset,
                    aux.name,
                    flag_names(aux.flags),
                    aux.other
                )?;
            }
        }
    }
    Ok(())
}
