//! `-A`: build attribute sections.

use std::io::{self, Write};

use crate::elf::attributes::{parse_attributes, Scope};
use crate::elf::section::{SHT_GNU_ATTRIBUTES, SHT_PROC_ATTRIBUTES};
use crate::elf::ElfFile;

fn list(values: &[u64]) -> String {
    values
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let attribute_sections = file
        .sections()
        .iter()
        .filter(|s| matches!(s.sh_type, SHT_PROC_ATTRIBUTES | SHT_GNU_ATTRIBUTES));

    for sec in attribute_sections {
        let blocks = file
            .section_data(sec)
            .and_then(|data| parse_attributes(data, file.codec, file.header.machine, file.diag()));
        let blocks = match blocks {
            Ok(blocks) => blocks,
            Err(e) => {
                file.diag()
                    .warn(format_args!("Unable to decode attribute section {}: {e}", sec.name));
                continue;
            }
        };
        for block in blocks {
            writeln!(out, "Attribute Section: {}", block.vendor)?;
            for sub in block.subsections {
                match &sub.scope {
                    Scope::File => writeln!(out, "File Attributes")?,
                    Scope::Section(indices) => writeln!(out, "Section Attributes: {}", list(indices))?,
                    Scope::Symbol(indices) => writeln!(out, "Symbol Attributes: {}", list(indices))?,
                    Scope::Unknown(tag) => writeln!(out, "Unknown tag: {tag}")?,
                }
                for attr in &sub.attributes {
                    writeln!(out, "  {}: {}", attr.name, attr.value)?;
                }
            }
        }
    }
    Ok(())
}
