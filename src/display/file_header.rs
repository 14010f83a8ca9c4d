//! `-h`: the file header.

use std::fmt::Display;
use std::io::{self, Write};

use crate::elf::section::{PN_XNUM, SHN_XINDEX};
use crate::elf::ElfFile;

fn field(out: &mut dyn Write, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(out, "  {label:<35}{value}")
}

pub fn render(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let h = &file.header;
    writeln!(out, "ELF Header:")?;
    write!(out, "  Magic:  ")?;
    for b in h.ident {
        write!(out, " {b:02x}")?;
    }
    writeln!(out, " ")?;
    field(out, "Class:", h.class_name())?;
    field(out, "Data:", h.data_name())?;
    let ident_version = match h.ident_version() {
        1 => "1 (current)".to_string(),
        v => format!("{v} <unknown>"),
    };
    field(out, "Version:", ident_version)?;
    field(out, "OS/ABI:", h.os_abi_name())?;
    field(out, "ABI Version:", h.abi_version())?;
    field(out, "Type:", h.elf_type.describe())?;
    field(out, "Machine:", h.machine_name())?;
    field(out, "Version:", format_args!("{:#x}", h.version))?;
    field(out, "Entry point address:", format_args!("{:#x}", h.entry_point))?;
    field(
        out,
        "Start of program headers:",
        format_args!("{} (bytes into file)", h.program_header_offset),
    )?;
    field(
        out,
        "Start of section headers:",
        format_args!("{} (bytes into file)", h.section_header_offset),
    )?;

    let flag_names = (file.caps.decode_flags)(h.flags);
    let flags: String = flag_names.iter().map(|f| format!(", {f}")).collect();
    field(out, "Flags:", format_args!("{:#x}{flags}", h.flags))?;
    field(out, "Size of this header:", format_args!("{} (bytes)", h.header_size))?;
    field(
        out,
        "Size of program headers:",
        format_args!("{} (bytes)", h.program_header_entry_size),
    )?;

    let segments = if h.program_header_count == PN_XNUM {
        format!("{} ({})", h.program_header_count, file.counts.segments)
    } else {
        h.program_header_count.to_string()
    };
    field(out, "Number of program headers:", segments)?;
    field(
        out,
        "Size of section headers:",
        format_args!("{} (bytes)", h.section_header_entry_size),
    )?;

    let sections = if h.section_header_count == 0 && file.counts.sections != 0 {
        format!("0 ({})", file.counts.sections)
    } else {
        h.section_header_count.to_string()
    };
    field(out, "Number of section headers:", sections)?;

    let strndx = file.counts.string_table_index;
    let strndx_text = if h.section_name_string_table_index == SHN_XINDEX {
        format!("{} ({strndx})", h.section_name_string_table_index)
    } else if file.counts.sections != 0 && u64::from(strndx) >= file.counts.sections {
        format!("{strndx} <corrupt: out of range>")
    } else {
        strndx.to_string()
    };
    field(out, "Section header string table index:", strndx_text)
}
