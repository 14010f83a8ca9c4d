//! `-u`: machine-specific unwind tables.

use std::io::{self, Write};

use crate::elf::unwind;
use crate::elf::ElfFile;

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let Some(tables) = unwind::decode(file) else {
        writeln!(
            out,
            "\nThe decoding of unwind sections for machine type {} is not currently supported.",
            file.header.machine_name()
        )?;
        return Ok(());
    };
    if tables.is_empty() {
        writeln!(out, "\nThere are no unwind sections in this file.")?;
        return Ok(());
    }
    for table in tables {
        writeln!(
            out,
            "\nUnwind section '{}' at offset {:#x} contains {} entries:",
            table.name,
            table.offset,
            table.entries.len()
        )?;
        for entry in table.entries {
            writeln!(out, "\n{}", entry.heading)?;
            for line in entry.lines {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}
