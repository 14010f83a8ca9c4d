//! `-s`, `--dyn-syms` and `-I`: symbol tables and hash bucket histograms.

use std::io::{self, Write};

use crate::config::{Options, SizeBase};
use crate::demangle;
use crate::elf::hash;
use crate::elf::section::{SHN_UNDEF, SHT_DYNSYM, SHT_SYMTAB};
use crate::elf::symbol::{
    binding_name, section_index_name, type_name, visibility_name, Symbol, SymbolTable,
    STT_SECTION,
};
use crate::elf::version;
use crate::elf::ElfFile;

use super::{fit, sections_or_skip};

/// True for the dynamic symbol table, whether it came from `.dynsym` or
/// from the dynamic tags.
fn is_dynamic(file: &ElfFile<'_>, table: &SymbolTable) -> bool {
    match table.section {
        None => true,
        Some(index) => file
            .sections()
            .get(index)
            .is_some_and(|s| s.sh_type == SHT_DYNSYM),
    }
}

/// The name a listing shows for `sym`: section symbols take their section's
/// name, dynamic symbols carry their version, and `-C` demangles.
pub(super) fn display_name(
    file: &ElfFile<'_>,
    table: &SymbolTable,
    sym: &Symbol,
    opts: &Options,
) -> String {
    let base = if sym.name.is_empty() && sym.sym_type() == STT_SECTION {
        sym.section_index()
            .map(|s| file.section_name(u64::from(s)).into_owned())
            .unwrap_or_default()
    } else {
        demangle::maybe(&sym.name, opts.demangle).into_owned()
    };
    if !is_dynamic(file, table) {
        return base;
    }
    let defined = sym.shndx != SHN_UNDEF;
    let version = file.versions.symbol_version(sym.index, defined);
    version::decorate(&base, version.as_ref())
}

pub fn render(file: &ElfFile<'_>, opts: &Options, out: &mut dyn Write) -> io::Result<()> {
    if opts.use_dynamic {
        return match &file.dynamic_symbols {
            Some(table) => render_table(file, opts, table, "Symbol table for image", out),
            None => {
                writeln!(out, "\nDynamic symbol information is not available for displaying symbols.")
            }
        };
    }

    if file.sections.is_none() {
        return match &file.dynamic_symbols {
            Some(table) => render_table(file, opts, table, "Symbol table for image", out),
            None => {
                sections_or_skip(file, "the symbol tables");
                Ok(())
            }
        };
    }

    let mut shown = false;
    for table in &file.symbol_tables {
        let Some(sec) = table.section.and_then(|s| file.sections().get(s)) else {
            continue;
        };
        let wanted = match sec.sh_type {
            SHT_SYMTAB => opts.symbols,
            SHT_DYNSYM => opts.symbols || opts.dyn_syms,
            _ => false,
        };
        if !wanted {
            continue;
        }
        shown = true;
        render_table(file, opts, table, &format!("Symbol table '{}'", sec.name), out)?;
    }

    // No section headers: fall back to the table the dynamic tags locate.
    if !shown && file.sections().is_empty() {
        if let Some(table) = &file.dynamic_symbols {
            render_table(file, opts, table, "Symbol table for image", out)?;
        }
    }
    Ok(())
}

fn render_table(
    file: &ElfFile<'_>,
    opts: &Options,
    table: &SymbolTable,
    title: &str,
    out: &mut dyn Write,
) -> io::Result<()> {
    let is_64 = file.header.class.is_64();
    let w = if is_64 { 16 } else { 8 };
    let osabi = file.header.os_abi();
    writeln!(
        out,
        "\n{title} contains {} {}:",
        table.len(),
        if table.len() == 1 { "entry" } else { "entries" }
    )?;
    if is_64 {
        writeln!(out, "   Num:    Value          Size Type    Bind   Vis      Ndx Name")?;
    } else {
        writeln!(out, "   Num:    Value  Size Type    Bind   Vis      Ndx Name")?;
    }
    for sym in &table.symbols {
        let size = match opts.sym_base {
            SizeBase::Decimal => format!("{:5}", sym.size),
            SizeBase::Hex => format!("{:#5x}", sym.size),
        };
        let name = display_name(file, table, sym, opts);
        let name = fit(&name, 21, opts.wide);
        writeln!(
            out,
            "{:6}: {:0w$x} {size} {:<7} {:<6} {:<8} {:>3} {name}",
            sym.index,
            sym.value,
            type_name(sym.sym_type(), file.caps, osabi),
            binding_name(sym.binding(), osabi),
            visibility_name(sym.other, file.caps),
            section_index_name(sym, file.caps),
        )?;
    }
    Ok(())
}

// ============================================================================
// Histogram
// ============================================================================

pub fn render_histogram(file: &ElfFile<'_>, out: &mut dyn Write) -> io::Result<()> {
    let Some(info) = &file.dynamic else {
        writeln!(out, "\nNo hash tables to display histograms for.")?;
        return Ok(());
    };
    let mut shown = false;
    if let Some(sysv) = &info.sysv_hash {
        shown = true;
        writeln!(
            out,
            "\nHistogram for bucket list length (total of {} {}):",
            sysv.buckets.len(),
            if sysv.buckets.len() == 1 { "bucket" } else { "buckets" }
        )?;
        render_counts(&sysv.bucket_lengths(), out)?;
    }
    if let Some(gnu) = &info.gnu_hash {
        shown = true;
        writeln!(
            out,
            "\nHistogram for `.gnu.hash' bucket list length (total of {} {}):",
            gnu.buckets.len(),
            if gnu.buckets.len() == 1 { "bucket" } else { "buckets" }
        )?;
        render_counts(&gnu.bucket_lengths(), out)?;
    }
    if !shown {
        writeln!(out, "\nNo hash tables to display histograms for.")?;
    }
    Ok(())
}

/// One row per chain length: how many buckets have it, their share of the
/// buckets, and the cumulative share of symbols covered.
fn render_counts(lengths: &[u64], out: &mut dyn Write) -> io::Result<()> {
    let counts = hash::histogram(lengths);
    let buckets = lengths.len() as u64;
    let symbols: u64 = lengths.iter().sum();
    writeln!(out, " Length  Number     % of total  Coverage")?;
    let mut covered = 0u64;
    for (len, &count) in counts.iter().enumerate() {
        covered += len as u64 * count;
        let share = percent(count, buckets);
        if len == 0 {
            writeln!(out, "{len:7}  {count:<10} {share:5.1}%")?;
        } else {
            let coverage = percent(covered, symbols);
            writeln!(out, "{len:7}  {count:<10} {share:5.1}%    {coverage:5.1}%")?;
        }
    }
    Ok(())
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_counts() {
        let mut out = Vec::new();
        render_counts(&[0, 1, 2, 1], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "      0  1           25.0%");
        assert_eq!(lines[2], "      1  2           50.0%     50.0%");
        assert_eq!(lines[3], "      2  1           25.0%    100.0%");
    }

    #[test]
    fn test_percent_of_nothing() {
        assert_eq!(percent(3, 0), 0.0);
    }
}
