//! `-d`: the dynamic section.

use std::io::{self, Write};

use crate::elf::dynamic::{flag_names, tag_name, value_kind, ValueKind, DT_FLAGS_1, DT_REL, DT_RELA};
use crate::elf::ElfFile;

use super::sections_or_skip;

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let Some(info) = &file.dynamic else {
        if sections_or_skip(file, "the dynamic section").is_some() {
            writeln!(out, "\nThere is no dynamic section in this file.")?;
        }
        return Ok(());
    };

    writeln!(
        out,
        "\nDynamic section at offset {:#x} contains {} {}:",
        info.offset,
        info.entries.len(),
        if info.entries.len() == 1 { "entry" } else { "entries" }
    )?;
    writeln!(out, "  Tag        Type                         Name/Value")?;
    let tag_width = 2 * file.codec.word_size();
    for entry in &info.entries {
        let value = match value_kind(entry.tag) {
            ValueKind::Str(label) => format!("{label}: [{}]", info.string(entry.value)),
            ValueKind::Bytes => format!("{} (bytes)", entry.value),
            ValueKind::Decimal => entry.value.to_string(),
            ValueKind::Flags if entry.tag == DT_FLAGS_1 => {
                format!("Flags: {}", flag_names(entry.value, entry.tag))
            }
            ValueKind::Flags => flag_names(entry.value, entry.tag),
            ValueKind::PltRel => match entry.value {
                DT_RELA => "RELA".to_string(),
                DT_REL => "REL".to_string(),
                other => format!("{other:#x}"),
            },
            ValueKind::Hex => format!("{:#x}", entry.value),
        };
        let name = format!("({})", tag_name(entry.tag, file.caps));
        writeln!(out, " 0x{:0tag_width$x} {name:<20} {value}", entry.tag)?;
    }
    Ok(())
}
