//! `-x`, `-p` and `-R`: hex, string and relocated hex dumps of sections.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::config::{DumpTarget, Options};
use crate::elf::compress::maybe_decompress;
use crate::elf::dump::{apply_relocations, hex_lines, strings, Patch};
use crate::elf::section::{SHT_REL, SHT_RELA};
use crate::elf::{ElfFile, SectionHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpKind {
    Hex,
    Strings,
    Relocated,
}

pub fn render(file: &ElfFile<'_>, opts: &Options, out: &mut dyn Write) -> io::Result<()> {
    let requests = [
        (DumpKind::Hex, &opts.hex_dumps),
        (DumpKind::Strings, &opts.string_dumps),
        (DumpKind::Relocated, &opts.reloc_dumps),
    ];
    if requests.iter().all(|(_, targets)| targets.is_empty()) {
        return Ok(());
    }
    let sections = file.sections();
    let names = strict_names(file, opts);

    // Section order, then request order, as readelf does.
    for (sec, name) in sections.iter().zip(&names) {
        for (kind, targets) in &requests {
            if targets.iter().any(|t| t.matches(sec.index, name.as_deref())) {
                dump(file, opts, sec, name.as_deref(), *kind, out)?;
            }
        }
    }

    for target in opts.dump_targets() {
        let found = sections
            .iter()
            .zip(&names)
            .any(|(s, name)| target.matches(s.index, name.as_deref()));
        if !found {
            file.diag()
                .warn(format_args!("Section {target} was not dumped because it does not exist"));
        }
    }
    Ok(())
}

/// Section names resolved strictly, since a name picks what gets dumped.
/// Only looked up when some target is given by name.
fn strict_names<'a>(file: &ElfFile<'a>, opts: &Options) -> Vec<Option<Cow<'a, str>>> {
    let by_name = opts
        .dump_targets()
        .any(|t| matches!(t, DumpTarget::Name(_)));
    file.sections()
        .iter()
        .map(|sec| {
            if !by_name {
                return None;
            }
            match file.strict_section_name(sec) {
                Ok(name) => Some(name),
                Err(e) => {
                    file.diag().warn(format_args!(
                        "Section [{:2}] has a corrupt name ({e}); it can only be dumped by index",
                        sec.index
                    ));
                    None
                }
            }
        })
        .collect()
}

fn dump(
    file: &ElfFile<'_>,
    opts: &Options,
    sec: &SectionHeader,
    name: Option<&str>,
    kind: DumpKind,
    out: &mut dyn Write,
) -> io::Result<()> {
    if sec.is_nobits() || sec.size == 0 {
        writeln!(out, "\nSection '{}' has no data to dump.", sec.name)?;
        return Ok(());
    }
    let raw = match file.section_data(sec) {
        Ok(raw) => raw,
        Err(e) => {
            file.diag()
                .warn(format_args!("Unable to read section '{}': {e}", sec.name));
            return Ok(());
        }
    };
    let data: Cow<'_, [u8]> = if opts.decompress {
        // `.zdebug` detection goes by name, so it needs the real one.
        let zname = match name {
            Some(n) => Cow::Borrowed(n),
            None => file.strict_section_name(sec).unwrap_or_default(),
        };
        match maybe_decompress(&zname, raw, sec.is_compressed(), file.codec) {
            Ok(data) => data,
            Err(e) => {
                file.diag().warn(e);
                return Ok(());
            }
        }
    } else {
        Cow::Borrowed(raw)
    };

    match kind {
        DumpKind::Strings => {
            writeln!(out, "\nString dump of section '{}':", sec.name)?;
            let found = strings(&data, opts.unicode, opts.string_min_len.max(1));
            if found.is_empty() {
                writeln!(out, "  No strings found in this section.")?;
            }
            for entry in found {
                writeln!(out, "  [{:6x}]  {}", entry.offset, entry.text)?;
            }
            writeln!(out)
        }
        DumpKind::Hex => {
            writeln!(out, "\nHex dump of section '{}':", sec.name)?;
            if file.is_relocatable() && has_relocations(file, sec) {
                writeln!(
                    out,
                    " NOTE: This section has relocations against it, but these have NOT been applied to this dump."
                )?;
            }
            for line in hex_lines(&data, sec.addr) {
                writeln!(out, "{line}")?;
            }
            writeln!(out)
        }
        DumpKind::Relocated => {
            writeln!(out, "\nHex dump of section '{}':", sec.name)?;
            let patched = if file.is_relocatable() {
                let patches: Vec<Patch> = file
                    .relocations_against(sec.index)
                    .into_iter()
                    .map(|(rel, sym)| Patch {
                        offset: rel.offset,
                        rtype: rel.rtype,
                        symbol_value: sym.map_or(0, |s| s.value),
                        addend: rel.addend,
                    })
                    .collect();
                Cow::Owned(apply_relocations(
                    &data,
                    sec.addr,
                    &patches,
                    file.codec,
                    file.caps,
                    &sec.name,
                    file.diag(),
                ))
            } else {
                data
            };
            for line in hex_lines(&patched, sec.addr) {
                writeln!(out, "{line}")?;
            }
            writeln!(out)
        }
    }
}

/// True if some SHT_REL/SHT_RELA section applies to `sec`.
fn has_relocations(file: &ElfFile<'_>, sec: &SectionHeader) -> bool {
    file.sections()
        .iter()
        .any(|r| matches!(r.sh_type, SHT_REL | SHT_RELA) && r.info as usize == sec.index)
}
