//! `-S` and `-g`: section headers and section groups.

use std::io::{self, Write};

use crate::config::Options;
use crate::elf::compress::CompressionHeader;
use crate::elf::section::{section_type_name, GRP_COMDAT};
use crate::elf::ElfFile;

use super::{addr_width, fit, sections_or_skip};

const FLAG_KEY: &str = "\
Key to Flags:
  W (write), A (alloc), X (execute), M (merge), S (strings), I (info),
  L (link order), O (extra OS processing required), G (group), T (TLS),
  C (compressed), x (unknown), o (OS specific), E (exclude),
  R (retain), l (large), y (purecode), p (processor specific)";

pub fn render(file: &ElfFile<'_>, opts: &Options, out: &mut dyn Write) -> io::Result<()> {
    let Some(sections) = sections_or_skip(file, "the section headers") else {
        return Ok(());
    };
    if sections.is_empty() {
        writeln!(out, "\nThere are no sections in this file.")?;
        return Ok(());
    }
    writeln!(
        out,
        "There are {} section headers, starting at offset {:#x}:\n",
        sections.len(),
        file.header.section_header_offset
    )?;
    writeln!(
        out,
        "Section Header{}:",
        if sections.len() > 1 { "s" } else { "" }
    )?;

    let aw = addr_width(file);
    writeln!(
        out,
        "  [Nr] Name              Type            {:<aw$} Off    Size   ES Flg Lk Inf Al",
        if aw == 16 { "Address" } else { "Addr" }
    )?;
    for sec in sections {
        writeln!(
            out,
            "  [{:2}] {:<17} {:<15} {:0aw$x} {:06x} {:06x} {:02x} {:>3} {:2} {:3} {:2}",
            sec.index,
            fit(&sec.name, 17, opts.wide),
            fit(&section_type_name(sec.sh_type, file.caps), 15, opts.wide),
            sec.addr,
            sec.offset,
            sec.size,
            sec.entsize,
            sec.flags.key_letters(file.header.machine),
            sec.link,
            sec.info,
            sec.addralign,
        )?;
        if sec.is_compressed() {
            let chdr = file
                .section_data(sec)
                .and_then(|data| CompressionHeader::parse(data, file.codec));
            match chdr {
                Ok(c) => writeln!(
                    out,
                    "       [{:#x}]: {}, {:#x}, {}",
                    c.ch_type,
                    c.type_name(),
                    c.size,
                    c.addralign
                )?,
                Err(_) => writeln!(out, "       [<corrupt>]")?,
            }
        }
    }
    writeln!(out, "{FLAG_KEY}")
}

pub fn render_groups(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    if sections_or_skip(file, "the section groups").is_none() {
        return Ok(());
    }
    if file.groups.is_empty() {
        writeln!(out, "\nThere are no section groups in this file.")?;
        return Ok(());
    }
    for group in &file.groups {
        let Some(sec) = file.sections().get(group.section) else {
            continue;
        };
        let signature = file
            .symbol_table(u64::from(sec.link))
            .and_then(|t| t.get(u64::from(sec.info)).ok())
            .map_or_else(|| "<corrupt>".to_string(), |s| s.name.clone());
        writeln!(
            out,
            "\n{}group section [{:5}] `{}' [{signature}] contains {} sections:",
            if group.flags & GRP_COMDAT != 0 { "COMDAT " } else { "" },
            sec.index,
            sec.name,
            group.members.len()
        )?;
        writeln!(out, "   [Index]    Name")?;
        for &member in &group.members {
            writeln!(out, "   [{member:5}]   {}", file.section_name(u64::from(member)))?;
        }
    }
    Ok(())
}
