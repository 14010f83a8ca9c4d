//! `-r`: relocation listings, from the relocation sections or (with `-D`)
//! from the tables the dynamic section names.

use std::io::{self, Write};

use crate::config::Options;
use crate::elf::reloc::{self, RelocKind, RelocTable, RelocTarget, Relocation};
use crate::elf::section::{SHT_REL, SHT_RELA, SHT_RELR};
use crate::elf::symbol::SymbolTable;
use crate::elf::unwind::{symbolize, AbsAddr};
use crate::elf::ElfFile;

use super::sections_or_skip;
use super::symbols::display_name;

pub fn render(file: &ElfFile<'_>, opts: &Options, out: &mut dyn Write) -> io::Result<()> {
    if opts.use_dynamic {
        return render_dynamic(file, opts, out);
    }
    let Some(sections) = sections_or_skip(file, "the relocations") else {
        return Ok(());
    };
    let mut found = false;
    for sec in sections {
        let kind = match sec.sh_type {
            SHT_REL => RelocKind::Rel,
            SHT_RELA => RelocKind::Rela,
            SHT_RELR => RelocKind::Relr,
            _ => continue,
        };
        found = true;
        if kind == RelocKind::Relr {
            let table = RelocTable {
                kind,
                offset: sec.offset,
                size: sec.size,
                entsize: sec.entsize,
            };
            render_relr(file, &format!("section '{}'", sec.name), &table, out)?;
            continue;
        }
        let Some(relocs) = file.load_section_relocations(sec, kind) else {
            continue;
        };
        writeln!(
            out,
            "\nRelocation section '{}' at offset {:#x} contains {} {}:",
            sec.name,
            sec.offset,
            relocs.len(),
            if relocs.len() == 1 { "entry" } else { "entries" }
        )?;
        let symbols = (sec.link != 0)
            .then(|| file.symbol_table(u64::from(sec.link)))
            .flatten();
        let context = format!("relocation section [{}] ({})", sec.index, sec.name);
        render_table(file, opts, &relocs, kind, symbols, &context, out)?;
    }
    if !found {
        writeln!(out, "\nThere are no relocations in this file.")?;
    }
    Ok(())
}

fn render_dynamic(file: &ElfFile<'_>, opts: &Options, out: &mut dyn Write) -> io::Result<()> {
    let Some(info) = file.dynamic.as_ref().filter(|i| !i.relocs.is_empty()) else {
        writeln!(out, "\nThere are no dynamic relocations in this file.")?;
        return Ok(());
    };
    for (label, table) in &info.relocs {
        if table.kind == RelocKind::Relr {
            render_relr(file, &format!("'{label}' relocation section"), table, out)?;
            continue;
        }
        let purpose = format!("{label} dynamic relocations");
        let relocs = match reloc::load_relocations(
            &file.view,
            file.codec,
            file.header.machine,
            table,
            &purpose,
        ) {
            Ok(relocs) => relocs,
            Err(e) => {
                file.diag().warn(format_args!("Unable to load the {purpose}: {e}"));
                continue;
            }
        };
        writeln!(
            out,
            "\n'{label}' relocation section at offset {:#x} contains {} bytes:",
            table.offset, table.size
        )?;
        render_table(
            file,
            opts,
            &relocs,
            table.kind,
            file.dynamic_symbols.as_ref(),
            &purpose,
            out,
        )?;
    }
    Ok(())
}

fn render_table(
    file: &ElfFile<'_>,
    opts: &Options,
    relocs: &[Relocation],
    kind: RelocKind,
    symbols: Option<&SymbolTable>,
    context: &str,
    out: &mut dyn Write,
) -> io::Result<()> {
    let is_64 = file.header.class.is_64();
    let w = if is_64 { 16 } else { 8 };
    let rela = kind == RelocKind::Rela;
    writeln!(
        out,
        "{:<w2$} {:<w2$} {:<22} {:<w$}  Sym. Name{}",
        " Offset",
        " Info",
        "Type",
        "Sym. Value",
        if rela { " + Addend" } else { "" },
        w2 = w + 1,
    )?;

    for (i, rel) in relocs.iter().enumerate() {
        let type_name = reloc::type_name(rel.rtype, file.caps);
        let mut line = format!("{:0w$x}  {:0w$x} {type_name:<22}", rel.offset, rel.info);
        match reloc::resolve_target(rel, i, symbols, file.diag(), context) {
            RelocTarget::None => {
                if let Some(addend) = rel.addend {
                    line.push_str(&format!(" {:w$}  {}", "", signed_hex(addend, false)));
                }
            }
            RelocTarget::Symbol(sym) => {
                let name = symbols
                    .map(|t| display_name(file, t, sym, opts))
                    .unwrap_or_default();
                if sym.is_ifunc() {
                    line.push_str(&format!(" {name}()"));
                } else {
                    line.push_str(&format!(" {:0w$x}  {name}", sym.value));
                }
                if let Some(addend) = rel.addend {
                    line.push_str(&signed_hex(addend, true));
                }
            }
            RelocTarget::NoTable(index) => {
                line.push_str(&format!(" <no symbol table for symbol index {index}>"));
            }
            RelocTarget::Corrupt(index) => {
                line.push_str(&format!(" <corrupt symbol index: {index}>"));
                if let Some(addend) = rel.addend {
                    line.push_str(&signed_hex(addend, true));
                }
            }
        }
        writeln!(out, "{}", line.trim_end())?;

        if let Some(mips) = rel.mips64 {
            writeln!(out, "{:w$}  Type2: {}", "", reloc::type_name(u32::from(mips.type2), file.caps))?;
            writeln!(out, "{:w$}  Type3: {}", "", reloc::type_name(u32::from(mips.type3), file.caps))?;
        }
    }
    Ok(())
}

/// ` + 1f` / ` - 4` after a symbol name, or the bare value when `after_name` is false.
fn signed_hex(value: i64, after_name: bool) -> String {
    match (after_name, value < 0) {
        (true, false) => format!(" + {value:x}"),
        (true, true) => format!(" - {:x}", value.unsigned_abs()),
        (false, false) => format!("{value:x}"),
        (false, true) => format!("-{:x}", value.unsigned_abs()),
    }
}

fn render_relr(
    file: &ElfFile<'_>,
    title: &str,
    table: &RelocTable,
    out: &mut dyn Write,
) -> io::Result<()> {
    let words = match reloc::load_relr_words(&file.view, file.codec, table.offset, table.size, title) {
        Ok(words) => words,
        Err(e) => {
            file.diag()
                .warn(format_args!("Unable to load the RELR relocations of {title}: {e}"));
            return Ok(());
        }
    };
    let ws = file.codec.word_size() as u64;
    let runs = reloc::relr_runs(&words, ws);
    writeln!(
        out,
        "\nRelocation {title} at offset {:#x} contains {} entries which relocate {} locations:",
        table.offset,
        words.len(),
        runs.iter().map(Vec::len).sum::<usize>()
    )?;
    let w = 2 * ws as usize;
    writeln!(out, "Index: Entry{:pad$}Address{:pad2$}Symbolic Address", "", "", pad = w - 4, pad2 = w - 6)?;

    let symbols = file.address_symbols();
    let symbolic = |addr: u64| match symbolize(AbsAddr::raw(addr), symbols) {
        Some((name, 0)) => name.to_string(),
        Some((name, off)) => format!("{name} + {off:#x}"),
        None => String::new(),
    };
    for (i, (word, run)) in words.iter().zip(&runs).enumerate() {
        let Some((first, rest)) = run.split_first() else {
            writeln!(out, "{i:04}:  {word:0w$x}")?;
            continue;
        };
        writeln!(out, "{i:04}:  {word:0w$x} {first:0w$x}  {}", symbolic(*first))?;
        for addr in rest {
            writeln!(out, "{:w2$} {addr:0w$x}  {}", "", symbolic(*addr), w2 = w + 7)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_hex() {
        assert_eq!(signed_hex(0x1f, true), " + 1f");
        assert_eq!(signed_hex(-4, true), " - 4");
        assert_eq!(signed_hex(-4, false), "-4");
        assert_eq!(signed_hex(i64::MIN, true), " - 8000000000000000");
    }
}
