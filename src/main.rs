//! elfdecode - CLI
//!
//! readelf-style front end: parses the command line into [`Options`],
//! reads each named file (plain object, regular archive or thin archive)
//! and renders the requested views of every object it contains.

mod arch;
mod archive;
mod config;
mod demangle;
mod diag;
mod display;
mod elf;
mod errors;
mod utils;

#[cfg(test)]
mod testutil;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use archive::Archive;
use config::{DumpTarget, Options, SizeBase};
use diag::Diagnostics;
use elf::dump::UnicodePolicy;
use elf::{ElfFile, FileView};

/// Display information about the contents of ELF format files.
#[derive(Debug, Parser)]
#[command(name = "elfdecode", disable_help_flag = true)]
struct Cli {
    /// Equivalent to -h -l -S -s -r -d -V -A -I -g -n -u
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Equivalent to -h -l -S
    #[arg(short = 'e', long = "headers")]
    headers: bool,

    /// Display the ELF file header
    #[arg(short = 'h', long = "file-header")]
    file_header: bool,

    /// Display the program headers
    #[arg(short = 'l', long = "program-headers", visible_alias = "segments")]
    program_headers: bool,

    /// Display the section headers
    #[arg(short = 'S', long = "section-headers", visible_alias = "sections")]
    section_headers: bool,

    /// Display the section groups
    #[arg(short = 'g', long = "section-groups")]
    section_groups: bool,

    /// Display the symbol table
    #[arg(short = 's', long = "syms", visible_alias = "symbols")]
    symbols: bool,

    /// Display the dynamic symbol table
    #[arg(long = "dyn-syms")]
    dyn_syms: bool,

    /// Display the dynamic section
    #[arg(short = 'd', long = "dynamic")]
    dynamic: bool,

    /// Display the relocations
    #[arg(short = 'r', long = "relocs")]
    relocs: bool,

    /// Display the version sections
    #[arg(short = 'V', long = "version-info")]
    version_info: bool,

    /// Display a histogram of bucket list lengths
    #[arg(short = 'I', long = "histogram")]
    histogram: bool,

    /// Display the core notes
    #[arg(short = 'n', long = "notes")]
    notes: bool,

    /// Display architecture specific information
    #[arg(short = 'A', long = "arch-specific")]
    arch_specific: bool,

    /// Display the unwind info
    #[arg(short = 'u', long = "unwind")]
    unwind: bool,

    /// Display the symbol/file index in an archive
    #[arg(short = 'c', long = "archive-index")]
    archive_index: bool,

    /// Dump the contents of a section as bytes
    #[arg(short = 'x', long = "hex-dump", value_name = "NUMBER|NAME")]
    hex_dump: Vec<String>,

    /// Dump the contents of a section as strings
    #[arg(short = 'p', long = "string-dump", value_name = "NUMBER|NAME")]
    string_dump: Vec<String>,

    /// Dump the relocated contents of a section
    #[arg(short = 'R', long = "relocated-dump", value_name = "NUMBER|NAME")]
    relocated_dump: Vec<String>,

    /// Decompress a section before dumping it
    #[arg(short = 'z', long = "decompress")]
    decompress: bool,

    /// Use the dynamic section info when displaying symbols and relocations
    #[arg(short = 'D', long = "use-dynamic")]
    use_dynamic: bool,

    /// Decode mangled symbol names
    #[arg(short = 'C', long = "demangle")]
    demangle: bool,

    /// Allow output width to exceed 80 characters
    #[arg(short = 'W', long = "wide")]
    wide: bool,

    /// Force base for symbol sizes
    #[arg(long = "sym-base", value_enum, default_value_t = SymBase::Decimal)]
    sym_base: SymBase,

    /// Display multibyte characters in string dumps
    #[arg(short = 'U', long = "unicode", value_enum, default_value_t = Unicode::Locale)]
    unicode: Unicode,

    /// Shortest string to show in a string dump
    #[arg(long = "string-min-len", default_value_t = 1)]
    string_min_len: usize,

    /// Use the named section as the CTF symbol table
    #[arg(long = "ctf-symbols", value_name = "NUMBER|NAME")]
    ctf_symbols: Option<String>,

    /// Use the named section as the CTF string table
    #[arg(long = "ctf-strings", value_name = "NUMBER|NAME")]
    ctf_strings: Option<String>,

    /// Print help
    #[arg(short = 'H', long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// ELF objects or archives to examine
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SymBase {
    #[value(name = "10", alias = "0")]
    Decimal,
    #[value(name = "16")]
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Unicode {
    #[value(alias = "default")]
    Locale,
    Escape,
    Hex,
    Highlight,
}

impl Cli {
    fn options(&self) -> Options {
        let all = self.all;
        let headers = all || self.headers;
        let targets = |args: &[String]| -> Vec<DumpTarget> { args.iter().map(|a| DumpTarget::parse(a)).collect() };
        Options {
            file_header: headers || self.file_header,
            segments: headers || self.program_headers,
            sections: headers || self.section_headers,
            section_groups: all || self.section_groups,
            symbols: all || self.symbols,
            dyn_syms: self.dyn_syms,
            dynamic: all || self.dynamic,
            relocs: all || self.relocs,
            version_info: all || self.version_info,
            histogram: all || self.histogram,
            notes: all || self.notes,
            arch_specific: all || self.arch_specific,
            unwind: all || self.unwind,
            archive_index: self.archive_index,
            use_dynamic: self.use_dynamic,
            wide: self.wide,
            demangle: self.demangle,
            decompress: self.decompress,
            sym_base: match self.sym_base {
                SymBase::Decimal => SizeBase::Decimal,
                SymBase::Hex => SizeBase::Hex,
            },
            unicode: match self.unicode {
                Unicode::Locale => UnicodePolicy::Locale,
                Unicode::Escape => UnicodePolicy::Escape,
                Unicode::Hex => UnicodePolicy::Hex,
                Unicode::Highlight => UnicodePolicy::Highlight,
            },
            string_min_len: self.string_min_len,
            hex_dumps: targets(&self.hex_dump),
            string_dumps: targets(&self.string_dump),
            reloc_dumps: targets(&self.relocated_dump),
            ctf_symbols: self.ctf_symbols.clone(),
            ctf_strings: self.ctf_strings.clone(),
        }
    }
}

/// Main entry point.
fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => "Error",
                log::Level::Warn => "Warning",
                _ => "Note",
            };
            writeln!(buf, "elfdecode: {level}: {}", record.args())
        })
        .init();

    let cli = Cli::parse();
    let opts = cli.options();
    if !opts.any_display() {
        log::warn!("Nothing to do.");
        return ExitCode::FAILURE;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ok = true;
    for path in &cli.files {
        match process_path(path, &opts, cli.files.len() > 1, &mut out) {
            Ok(clean) => ok &= clean,
            Err(e) => {
                log::error!("{e:#}");
                ok = false;
            }
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Display one command-line file. Returns `Ok(false)` when some object in
/// it could not be fully decoded.
fn process_path(path: &Path, opts: &Options, several: bool, out: &mut dyn Write) -> Result<bool> {
    let data = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path.display().to_string();

    if Archive::is_archive(&data) {
        return process_archive(path, &data, opts, out);
    }
    if opts.archive_index {
        log::warn!("{name} is not an archive");
    }
    if several {
        writeln!(out, "\nFile: {name}")?;
    }
    let diag = Diagnostics::new();
    let view = FileView::new(&data, &diag);
    Ok(process_object(&name, view, opts, out))
}

/// Decode and display one object. Returns false on a fatal decode error or
/// when an error-level diagnostic was raised.
fn process_object(name: &str, view: FileView<'_>, opts: &Options, out: &mut dyn Write) -> bool {
    let diag = view.diag();
    let file = match ElfFile::load(view) {
        Ok(file) => file,
        Err(e) => {
            diag.error(format_args!("{name}: {e}"));
            return false;
        }
    };
    if let Err(e) = display::render(&file, opts, out) {
        diag.error(format_args!("{name}: failed to write output: {e}"));
    }
    !diag.has_errors()
}

fn process_archive(path: &Path, data: &[u8], opts: &Options, out: &mut dyn Write) -> Result<bool> {
    let name = path.display().to_string();
    let diag = Diagnostics::new();
    let archive = Archive::parse(data, &diag)
        .with_context(|| format!("Failed to read archive: {name}"))?;

    if opts.archive_index {
        render_index(&name, &archive, out)?;
    }
    let members = archive.members(&diag);
    let mut ok = !diag.has_errors();

    let wants_members = Options {
        archive_index: false,
        ..opts.clone()
    }
    .any_display();
    if !wants_members {
        return Ok(ok);
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for member in &members {
        writeln!(out, "\nFile: {name}({})", member.name)?;
        let member_diag = Diagnostics::new();
        if member.external {
            let member_path = base.join(&member.name);
            let bytes = match fs::read(&member_path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("{name}: cannot open thin member {}: {e}", member_path.display());
                    ok = false;
                    continue;
                }
            };
            let view = FileView::new(&bytes, &member_diag);
            ok &= process_object(&member.name, view, opts, out);
        } else {
            let view = FileView::member(archive.data(), member.data_offset, member.size, &member_diag);
            ok &= process_object(&member.name, view, opts, out);
        }
    }
    Ok(ok)
}

/// `-c`: the archive's symbol index, grouped by defining member.
fn render_index(name: &str, archive: &Archive<'_>, out: &mut dyn Write) -> io::Result<()> {
    if archive.index.is_empty() {
        writeln!(out, "\nFile {name} has no archive index")?;
        return Ok(());
    }
    writeln!(
        out,
        "Index of archive {name}: ({} entries, {:#x} bytes in the symbol table)",
        archive.index.len(),
        archive.index_size.unwrap_or(0)
    )?;
    let mut current = None;
    for entry in &archive.index {
        if current != Some(entry.member_offset) {
            current = Some(entry.member_offset);
            match archive.name_at(entry.member_offset) {
                Some(member) => writeln!(out, "Contents of binary {name}({member}) at offset {:#x}", entry.member_offset)?,
                None => writeln!(out, "Contents of unreadable member at offset {:#x}", entry.member_offset)?,
            }
        }
        writeln!(out, "\t{}", entry.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_expands() {
        let cli = Cli::try_parse_from(["elfdecode", "-a", "x.o"]).unwrap();
        let opts = cli.options();
        assert!(opts.file_header && opts.segments && opts.sections);
        assert!(opts.symbols && opts.relocs && opts.unwind && opts.histogram);
        assert!(!opts.dyn_syms && !opts.archive_index);
    }

    #[test]
    fn test_dump_targets_and_values() {
        let cli = Cli::try_parse_from([
            "elfdecode", "-x", ".text", "-x", "3", "-p", ".rodata", "--sym-base=16", "-U", "escape", "x.o",
        ])
        .unwrap();
        let opts = cli.options();
        assert_eq!(
            opts.hex_dumps,
            vec![DumpTarget::Name(".text".into()), DumpTarget::Index(3)]
        );
        assert_eq!(opts.string_dumps, vec![DumpTarget::Name(".rodata".into())]);
        assert_eq!(opts.sym_base, SizeBase::Hex);
        assert_eq!(opts.unicode, UnicodePolicy::Escape);
        assert_eq!(opts.string_min_len, 1);
    }

    #[test]
    fn test_file_header_is_not_help() {
        let cli = Cli::try_parse_from(["elfdecode", "-h", "x.o"]).unwrap();
        assert!(cli.options().file_header);
    }

    #[test]
    fn test_requires_a_file() {
        assert!(Cli::try_parse_from(["elfdecode", "-h"]).is_err());
    }
}
